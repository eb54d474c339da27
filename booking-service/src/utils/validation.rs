use axum::{
    extract::{FromRequest, Request},
    Json,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// JSON body that has passed its `Validate` rules. Malformed JSON is a 400
/// `bad_request`; rule failures are a 400 `validation_error` with the field
/// list.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Letters and spaces only.
pub fn validate_person_name(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid("required", "Name is required"));
    }
    if !trimmed.chars().all(|c| c.is_alphabetic() || c == ' ') {
        return Err(invalid(
            "name_format",
            "Name must contain only letters and spaces",
        ));
    }
    Ok(())
}

/// Exactly ten digits.
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if value.len() != 10 || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("phone_format", "Phone must be exactly 10 digits"));
    }
    Ok(())
}

pub fn validate_percentage(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        return Err(invalid("percentage_range", "Must be between 0 and 100"));
    }
    Ok(())
}

pub fn validate_positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(invalid("positive_amount", "Amount must be greater than zero"));
    }
    Ok(())
}
