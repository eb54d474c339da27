use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// URL prefix the upload directory is served under.
pub const UPLOADS_ROUTE: &str = "/uploads";

#[async_trait]
pub trait Storage: Send + Sync {
    async fn upload(&self, key: &str, data: Vec<u8>) -> io::Result<()>;
    async fn download(&self, key: &str) -> io::Result<Vec<u8>>;
    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> io::Result<()>;

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", UPLOADS_ROUTE, key)
    }
}

/// Files on local disk under `uploads/<category>/...`.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> io::Result<Self> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve(&self, key: &str) -> io::Result<PathBuf> {
        let relative = Path::new(key);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid storage key: {}", key),
            ));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(&self, key: &str, data: Vec<u8>) -> io::Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, data).await
    }

    async fn download(&self, key: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(key)?).await
    }

    async fn delete(&self, key: &str) -> io::Result<()> {
        let path = self.resolve(key)?;
        match fs::remove_file(path).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Lower-cased extension of an uploaded file name, if it has a sane one.
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
}

/// Storage key `<dir>/<stem>[.<ext>]` for an upload.
pub fn storage_key(dir: &str, stem: &str, original_name: &str) -> String {
    match extension_of(original_name) {
        Some(ext) => format!("{}/{}.{}", dir, stem, ext),
        None => format!("{}/{}", dir, stem),
    }
}
