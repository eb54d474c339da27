use crate::models::EnquiryStatus;
use crate::utils::validation::{
    validate_percentage, validate_person_name, validate_phone, validate_positive_amount,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

/// Body for both expenses and others; they share a shape.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    #[validate(
        required(message = "Amount is required"),
        custom(function = "validate_positive_amount")
    )]
    pub amount: Option<Decimal>,

    #[validate(custom(function = "validate_percentage"))]
    pub tds: Option<Decimal>,

    pub date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "super::empty_as_none")]
    pub layout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLedgerEntryRequest {
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,

    #[validate(length(min = 1, message = "Category cannot be empty"))]
    pub category: Option<String>,

    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Option<Decimal>,

    #[validate(custom(function = "validate_percentage"))]
    pub tds: Option<Decimal>,

    pub date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "super::empty_as_none")]
    pub layout: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEnquiryRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_person_name"))]
    pub name: String,

    #[serde(default)]
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,

    #[serde(default, deserialize_with = "super::empty_as_none")]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[serde(default)]
    pub message: String,

    #[serde(default, deserialize_with = "super::empty_as_none")]
    pub layout: Option<String>,

    pub follow_up_date: Option<NaiveDate>,

    pub status: Option<EnquiryStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEnquiryRequest {
    #[validate(custom(function = "validate_person_name"))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub message: Option<String>,

    #[serde(default, deserialize_with = "super::empty_as_none")]
    pub layout: Option<String>,

    pub follow_up_date: Option<NaiveDate>,

    pub status: Option<EnquiryStatus>,
}
