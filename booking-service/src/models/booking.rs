use super::Entity;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentType {
    Cash,
    Cheque,
    Online,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Identity documents a buyer may attach to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    AadharCardFront,
    AadharCardBack,
    PanCard,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::AadharCardFront,
        DocumentKind::AadharCardBack,
        DocumentKind::PanCard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::AadharCardFront => "aadharCardFront",
            DocumentKind::AadharCardBack => "aadharCardBack",
            DocumentKind::PanCard => "panCard",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDocument {
    pub kind: DocumentKind,
    pub url: String,
    pub file_name: String,
    pub storage_key: String,
}

/// A buyer's purchase commitment against one plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub dob: Option<NaiveDate>,
    pub gender: Gender,
    pub email: Option<String>,
    pub plot_id: String,
    pub layout: String,
    pub broker_id: Option<String>,
    pub total_cost: Decimal,
    pub rate_per_sq_ft: Decimal,
    pub first_payment: Decimal,
    pub payment_type: PaymentType,
    pub narration: Option<String>,
    #[serde(default)]
    pub documents: Vec<BookingDocument>,
    pub booking_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Booking {
    const COLLECTION: &'static str = "bookings";
    // One booking per plot.
    const UNIQUE_KEYS: &'static [&'static [&'static str]] = &[&["plotId"]];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Booking {
    /// Adds or replaces the document of the given kind, returning the one it
    /// displaced.
    pub fn attach_document(&mut self, document: BookingDocument) -> Option<BookingDocument> {
        let previous = self
            .documents
            .iter()
            .position(|d| d.kind == document.kind)
            .map(|i| self.documents.remove(i));
        self.documents.push(document);
        previous
    }
}
