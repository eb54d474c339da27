use super::repository::{Filter, FilterValue, Repository, StoreError};
use crate::models::{
    Booking, Broker, DeletedContact, Enquiry, Entity, Expense, Invoice, LayoutResource, Other,
    PasswordResetToken, Plot, User,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    /// Creates the unique indexes every collection declares.
    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for booking-service");

        self.ensure_unique_indexes::<Plot>().await?;
        self.ensure_unique_indexes::<Broker>().await?;
        self.ensure_unique_indexes::<Booking>().await?;
        self.ensure_unique_indexes::<Invoice>().await?;
        self.ensure_unique_indexes::<DeletedContact>().await?;
        self.ensure_unique_indexes::<Expense>().await?;
        self.ensure_unique_indexes::<Other>().await?;
        self.ensure_unique_indexes::<Enquiry>().await?;
        self.ensure_unique_indexes::<LayoutResource>().await?;
        self.ensure_unique_indexes::<User>().await?;
        self.ensure_unique_indexes::<PasswordResetToken>().await?;

        Ok(())
    }

    async fn ensure_unique_indexes<T: Entity>(&self) -> Result<(), AppError> {
        for key in T::UNIQUE_KEYS {
            let mut keys = Document::new();
            for field in key.iter() {
                keys.insert(*field, 1);
            }
            let name = format!("{}_unique", key.join("_"));
            let index = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(name.clone())
                        .unique(true)
                        .build(),
                )
                .build();

            self.collection::<T>()
                .create_index(index, None)
                .await
                .map_err(|e| {
                    tracing::error!(
                        collection = T::COLLECTION,
                        "Failed to create index {}: {}",
                        name,
                        e
                    );
                    AppError::from(e)
                })?;
            tracing::info!("Created unique index on {}.({})", T::COLLECTION, key.join(", "));
        }
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn collection<T: Entity>(&self) -> Collection<T> {
        self.db.collection(T::COLLECTION)
    }
}

pub struct MongoRepository<T> {
    collection: Collection<T>,
}

impl<T: Entity> MongoRepository<T> {
    pub fn new(db: &MongoDb) -> Self {
        Self {
            collection: db.collection::<T>(),
        }
    }
}

fn to_document(filter: &Filter) -> Document {
    let mut query = Document::new();
    for (field, value) in filter.clauses() {
        let value = match value {
            FilterValue::Str(s) => Bson::String(s.clone()),
            FilterValue::Int(i) => Bson::Int64(*i),
        };
        query.insert(field.clone(), value);
    }
    query
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

fn map_write_error<T: Entity>(err: mongodb::error::Error) -> StoreError {
    if is_duplicate_key(&err) {
        StoreError::Duplicate {
            collection: T::COLLECTION,
            detail: err.to_string(),
        }
    } else {
        StoreError::Database(err)
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for MongoRepository<T> {
    async fn insert(&self, item: &T) -> Result<(), StoreError> {
        self.collection
            .insert_one(item, None)
            .await
            .map_err(map_write_error::<T>)?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find(&self, filter: Filter) -> Result<Vec<T>, StoreError> {
        let cursor = self.collection.find(to_document(&filter), None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn replace(&self, item: &T, expected_version: Option<i64>) -> Result<bool, StoreError> {
        let mut query = doc! { "_id": item.id() };
        if let Some(version) = expected_version {
            query.insert("version", version);
        }
        let result = self
            .collection
            .replace_one(query, item, None)
            .await
            .map_err(map_write_error::<T>)?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }
}
