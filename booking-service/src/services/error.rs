use super::repository::StoreError;
use service_core::error::{AppError, FieldError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation error: {0:?}")]
    Validation(Vec<FieldError>),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Email error: {0}")]
    EmailError(String),
}

impl ServiceError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        ServiceError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Store(StoreError::Duplicate { collection, .. }) => AppError::Conflict(
                anyhow::anyhow!("A matching record already exists in {}", collection),
            ),
            ServiceError::Store(e) => AppError::DatabaseError(e.into()),
            ServiceError::Storage(e) => AppError::InternalError(e.into()),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::NotFound(what) => AppError::NotFound(anyhow::anyhow!("{} not found", what)),
            ServiceError::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            ServiceError::Validation(fields) => AppError::InvalidFields(fields),
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid email or password"))
            }
            ServiceError::InvalidToken => {
                AppError::BadRequest(anyhow::anyhow!("Invalid or expired token"))
            }
            ServiceError::EmailError(e) => AppError::EmailError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_becomes_conflict() {
        let err: AppError = ServiceError::Store(StoreError::Duplicate {
            collection: "plots",
            detail: "layout, plotNumber".into(),
        })
        .into();
        assert!(matches!(err, AppError::Conflict(_)));

        let err: AppError = ServiceError::invalid("phone", "Phone must be exactly 10 digits").into();
        match err {
            AppError::InvalidFields(fields) => assert_eq!(fields[0].field, "phone"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
