use super::{new_id, Booking, Entity, Invoice};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Archive entry written when a booking is deleted. Never updated.
///
/// The identity fields are kept flat for listing; the full booking and its
/// invoice are kept so a restore loses nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedContact {
    #[serde(rename = "_id")]
    pub id: String,
    pub original_id: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub email: Option<String>,
    pub plot_id: String,
    pub layout: String,
    pub deleted_at: DateTime<Utc>,
    pub deleted_by: String,
    pub booking: Booking,
    pub invoice: Option<Invoice>,
}

impl Entity for DeletedContact {
    const COLLECTION: &'static str = "deleted_contacts";

    fn id(&self) -> &str {
        &self.id
    }
}

impl DeletedContact {
    pub fn snapshot(booking: &Booking, invoice: Option<&Invoice>, deleted_by: &str) -> Self {
        Self {
            id: new_id(),
            original_id: booking.id.clone(),
            name: booking.name.clone(),
            phone: booking.phone.clone(),
            address: booking.address.clone(),
            email: booking.email.clone(),
            plot_id: booking.plot_id.clone(),
            layout: booking.layout.clone(),
            deleted_at: Utc::now(),
            deleted_by: deleted_by.to_string(),
            booking: booking.clone(),
            invoice: invoice.cloned(),
        }
    }
}
