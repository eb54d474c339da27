pub mod auth;
pub mod bookings;
pub mod brokers;
pub mod deleted_contacts;
pub mod health;
pub mod invoices;
pub mod metrics;
pub mod plots;
pub mod records;

pub use health::health_check;

use crate::dtos::UploadedFile;
use axum::extract::multipart::{Field, MultipartError};
use service_core::error::AppError;

pub(crate) fn multipart_error(e: MultipartError) -> AppError {
    AppError::BadRequest(anyhow::anyhow!("Failed to read multipart body: {}", e))
}

/// Buffers one file part.
pub(crate) async fn read_file(field: Field<'_>) -> Result<UploadedFile, AppError> {
    let file_name = field.file_name().unwrap_or("unnamed").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = field.bytes().await.map_err(multipart_error)?.to_vec();

    if data.is_empty() {
        return Err(AppError::invalid_field(
            "file",
            format!("Uploaded file {} is empty", file_name),
        ));
    }

    Ok(UploadedFile {
        file_name,
        content_type,
        data,
    })
}
