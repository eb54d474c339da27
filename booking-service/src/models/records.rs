use super::Entity;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A file written to upload storage and the URL it is served under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub url: String,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    pub storage_key: String,
}

/// Amount left after deducting `tds` percent at source.
pub fn net_amount(amount: Decimal, tds: Decimal) -> Decimal {
    (amount - amount * tds / Decimal::ONE_HUNDRED).round_dp(2)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(rename = "_id")]
    pub id: String,
    pub description: String,
    pub category: String,
    pub amount: Decimal,
    pub tds: Decimal,
    pub net_amount: Decimal,
    pub date: NaiveDate,
    pub layout: String,
    pub document: Option<StoredFile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Expense {
    const COLLECTION: &'static str = "expenses";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Miscellaneous ledger entry. Same shape as an expense without attachments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Other {
    #[serde(rename = "_id")]
    pub id: String,
    pub description: String,
    pub category: String,
    pub amount: Decimal,
    pub tds: Decimal,
    pub net_amount: Decimal,
    pub date: NaiveDate,
    pub layout: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Other {
    const COLLECTION: &'static str = "others";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnquiryStatus {
    #[default]
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enquiry {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub message: String,
    pub layout: String,
    pub follow_up_date: Option<NaiveDate>,
    pub status: EnquiryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Enquiry {
    const COLLECTION: &'static str = "enquiries";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Brochure, map or other file published for a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResource {
    #[serde(rename = "_id")]
    pub id: String,
    pub layout: String,
    pub title: String,
    pub file: StoredFile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for LayoutResource {
    const COLLECTION: &'static str = "layout_resources";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_amount_deducts_tds_percentage() {
        assert_eq!(
            net_amount(Decimal::from(10_000), Decimal::from(10)),
            Decimal::from(9_000)
        );
        assert_eq!(
            net_amount(Decimal::from(2_500), Decimal::ZERO),
            Decimal::from(2_500)
        );
        assert_eq!(
            net_amount(Decimal::from(1_999), Decimal::from(2)),
            Decimal::new(195_902, 2)
        );
    }
}
