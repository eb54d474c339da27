use crate::dtos::{invoices::InvoiceResponse, UploadedFile};
use crate::models::{Booking, DocumentKind, Gender, PaymentType};
use crate::utils::validation::{validate_person_name, validate_phone, validate_positive_amount};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// New booking. Sent as the JSON body, or as the `booking` part of a
/// multipart form alongside the identity documents.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_person_name"))]
    pub name: String,

    #[serde(default)]
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,

    pub dob: Option<NaiveDate>,

    #[validate(required(message = "Gender is required"))]
    pub gender: Option<Gender>,

    #[serde(default, deserialize_with = "super::empty_as_none")]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, message = "Plot is required"))]
    pub plot_id: String,

    #[serde(default, deserialize_with = "super::empty_as_none")]
    pub broker_id: Option<String>,

    #[validate(
        required(message = "Total cost is required"),
        custom(function = "validate_positive_amount")
    )]
    pub total_cost: Option<Decimal>,

    #[validate(
        required(message = "Rate per sq-ft is required"),
        custom(function = "validate_positive_amount")
    )]
    pub rate_per_sq_ft: Option<Decimal>,

    #[validate(
        required(message = "First payment is required"),
        custom(function = "validate_positive_amount")
    )]
    pub first_payment: Option<Decimal>,

    #[validate(required(message = "Payment type is required"))]
    pub payment_type: Option<PaymentType>,

    #[serde(default, deserialize_with = "super::empty_as_none")]
    pub narration: Option<String>,

    pub booking_date: Option<NaiveDate>,
}

/// Partial update. `brokerId: ""` unlinks the broker.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    #[validate(custom(function = "validate_person_name"))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,

    #[validate(length(min = 1, message = "Address cannot be empty"))]
    pub address: Option<String>,

    /// `null` or `""` clears the date of birth.
    #[serde(default, deserialize_with = "super::clearable")]
    pub dob: Option<Option<NaiveDate>>,

    pub gender: Option<Gender>,

    /// `null` or `""` clears the email; checked for format in the service.
    #[serde(default, deserialize_with = "super::clearable")]
    pub email: Option<Option<String>>,

    pub plot_id: Option<String>,

    pub broker_id: Option<String>,

    #[validate(custom(function = "validate_positive_amount"))]
    pub total_cost: Option<Decimal>,

    #[validate(custom(function = "validate_positive_amount"))]
    pub rate_per_sq_ft: Option<Decimal>,

    #[validate(custom(function = "validate_positive_amount"))]
    pub first_payment: Option<Decimal>,

    pub payment_type: Option<PaymentType>,

    pub narration: Option<String>,

    pub booking_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct BookingDocumentUpload {
    pub kind: DocumentKind,
    pub file: UploadedFile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub booking: Booking,
    pub invoice: InvoiceResponse,
}
