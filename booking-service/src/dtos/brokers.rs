use crate::models::{Broker, CommissionBreakdown};
use crate::utils::validation::{validate_percentage, validate_person_name, validate_phone};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrokerRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_person_name"))]
    pub name: String,

    #[serde(default)]
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,

    #[validate(
        required(message = "Commission is required"),
        custom(function = "validate_percentage")
    )]
    pub commission: Option<Decimal>,

    #[validate(custom(function = "validate_percentage"))]
    pub tds: Option<Decimal>,

    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBrokerRequest {
    #[validate(custom(function = "validate_person_name"))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,

    #[validate(custom(function = "validate_percentage"))]
    pub commission: Option<Decimal>,

    #[validate(custom(function = "validate_percentage"))]
    pub tds: Option<Decimal>,

    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerBookingCommission {
    pub booking_id: String,
    pub buyer_name: String,
    pub plot_id: String,
    pub plot_number: Option<u32>,
    pub layout: String,
    pub total_cost: Decimal,
    pub booking_date: NaiveDate,
    #[serde(flatten)]
    pub commission: CommissionBreakdown,
}

/// Commission owed to a broker across the bookings they referred.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerFinancialsResponse {
    pub broker: Broker,
    pub bookings: Vec<BrokerBookingCommission>,
    pub total: CommissionBreakdown,
}
