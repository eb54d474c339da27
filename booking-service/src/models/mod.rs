pub mod booking;
pub mod broker;
pub mod deleted_contact;
pub mod invoice;
pub mod plot;
pub mod records;
pub mod user;

pub use booking::{Booking, BookingDocument, DocumentKind, Gender, PaymentType};
pub use broker::{Broker, CommissionBreakdown};
pub use deleted_contact::DeletedContact;
pub use invoice::{ordinal_label, Invoice, InvoiceStatement, Payment, PaymentKind};
pub use plot::{Plot, PlotStatus};
pub use records::{Enquiry, EnquiryStatus, Expense, LayoutResource, Other, StoredFile};
pub use user::{PasswordResetToken, Role, User};

use serde::{de::DeserializeOwned, Serialize};

/// A document persisted in its own collection.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    const COLLECTION: &'static str;

    /// Serialized field groups that must be unique together.
    const UNIQUE_KEYS: &'static [&'static [&'static str]] = &[];

    fn id(&self) -> &str;
}

pub const DEFAULT_LAYOUT: &str = "layout1";

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
