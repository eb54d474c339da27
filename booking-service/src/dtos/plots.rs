use crate::models::{Plot, PlotStatus};
use crate::utils::validation::validate_positive_amount;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlotRequest {
    #[validate(
        required(message = "Plot number is required"),
        range(min = 1, message = "Plot number must be at least 1")
    )]
    pub plot_number: Option<u32>,

    #[serde(default, deserialize_with = "super::empty_as_none")]
    pub layout: Option<String>,

    #[validate(custom(function = "validate_positive_amount"))]
    pub area_sq_m: Option<Decimal>,

    #[validate(custom(function = "validate_positive_amount"))]
    pub area_sq_ft: Option<Decimal>,

    #[validate(
        required(message = "Rate per sq-ft is required"),
        custom(function = "validate_positive_amount")
    )]
    pub rate_per_sq_ft: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlotRequest {
    #[validate(range(min = 1, message = "Plot number must be at least 1"))]
    pub plot_number: Option<u32>,

    #[serde(default, deserialize_with = "super::empty_as_none")]
    pub layout: Option<String>,

    #[validate(custom(function = "validate_positive_amount"))]
    pub area_sq_m: Option<Decimal>,

    #[validate(custom(function = "validate_positive_amount"))]
    pub area_sq_ft: Option<Decimal>,

    #[validate(custom(function = "validate_positive_amount"))]
    pub rate_per_sq_ft: Option<Decimal>,
}

/// A plot with its sale status derived from bookings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub plot_number: u32,
    pub layout: String,
    pub area_sq_m: Decimal,
    pub area_sq_ft: Decimal,
    pub rate_per_sq_ft: Decimal,
    pub value: Decimal,
    pub status: PlotStatus,
    pub booking_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlotResponse {
    pub fn new(plot: Plot, booking_id: Option<String>) -> Self {
        let status = if booking_id.is_some() {
            PlotStatus::Sold
        } else {
            PlotStatus::Available
        };
        Self {
            value: plot.value(),
            id: plot.id,
            plot_number: plot.plot_number,
            layout: plot.layout,
            area_sq_m: plot.area_sq_m,
            area_sq_ft: plot.area_sq_ft,
            rate_per_sq_ft: plot.rate_per_sq_ft,
            status,
            booking_id,
            created_at: plot.created_at,
            updated_at: plot.updated_at,
        }
    }
}
