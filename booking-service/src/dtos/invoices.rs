use crate::models::{ordinal_label, InvoiceStatement, Payment, PaymentKind, PaymentType};
use crate::utils::validation::validate_positive_amount;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Booking is required"))]
    pub booking_id: String,
}

/// Body of `add-payment` and of a payment edit. Without `paymentId` the
/// payment is appended.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    #[serde(default, deserialize_with = "super::empty_as_none")]
    pub payment_id: Option<String>,

    pub expected_version: Option<i64>,

    #[validate(
        required(message = "Amount is required"),
        custom(function = "validate_positive_amount")
    )]
    pub amount: Option<Decimal>,

    pub payment_date: Option<NaiveDate>,

    #[validate(required(message = "Payment type is required"))]
    pub payment_type: Option<PaymentType>,

    #[serde(default, deserialize_with = "super::empty_as_none")]
    pub narration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceQuery {
    pub booking_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionQuery {
    pub expected_version: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: String,
    pub sequence: u32,
    /// Position label: 1st, 2nd, ...
    pub ordinal: String,
    pub kind: PaymentKind,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_type: PaymentType,
    pub narration: Option<String>,
}

impl PaymentResponse {
    fn at(position: usize, payment: Payment) -> Self {
        Self {
            id: payment.id,
            sequence: payment.sequence,
            ordinal: ordinal_label(position + 1),
            kind: payment.kind,
            amount: payment.amount,
            payment_date: payment.payment_date,
            payment_type: payment.payment_type,
            narration: payment.narration,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub booking_id: String,
    pub version: i64,
    pub payments: Vec<PaymentResponse>,
    pub total_paid: Decimal,
    pub total_cost: Decimal,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<InvoiceStatement> for InvoiceResponse {
    fn from(statement: InvoiceStatement) -> Self {
        let total_paid = statement.total_paid();
        let balance = statement.balance();
        let invoice = statement.invoice;
        Self {
            id: invoice.id,
            booking_id: invoice.booking_id,
            version: invoice.version,
            payments: invoice
                .payments
                .into_iter()
                .enumerate()
                .map(|(i, p)| PaymentResponse::at(i, p))
                .collect(),
            total_paid,
            total_cost: statement.total_cost,
            balance,
            created_at: invoice.created_at,
            updated_at: invoice.updated_at,
        }
    }
}
