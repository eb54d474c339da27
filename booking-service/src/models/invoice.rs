use super::{new_id, Booking, Entity, PaymentType};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    /// The first payment taken with the booking.
    Booking,
    Installment,
}

/// One payment on an invoice. `id` and `sequence` never change once assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub sequence: u32,
    pub kind: PaymentKind,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_type: PaymentType,
    pub narration: Option<String>,
}

/// Payment ledger for one booking. Payments are kept in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(rename = "_id")]
    pub id: String,
    pub booking_id: String,
    pub payments: Vec<Payment>,
    pub version: i64,
    pub next_sequence: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Invoice {
    const COLLECTION: &'static str = "invoices";
    const UNIQUE_KEYS: &'static [&'static [&'static str]] = &[&["bookingId"]];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Invoice {
    /// A new invoice whose first entry is the booking payment.
    pub fn seeded_from(booking: &Booking) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            booking_id: booking.id.clone(),
            payments: vec![Payment {
                id: new_id(),
                sequence: 1,
                kind: PaymentKind::Booking,
                amount: booking.first_payment,
                payment_date: booking.booking_date,
                payment_type: booking.payment_type,
                narration: booking.narration.clone(),
            }],
            version: 0,
            next_sequence: 2,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_paid(&self) -> Decimal {
        self.payments.iter().map(|p| p.amount).sum()
    }

    pub fn position_of(&self, payment_id: &str) -> Option<usize> {
        self.payments.iter().position(|p| p.id == payment_id)
    }

    pub fn booking_payment_mut(&mut self) -> Option<&mut Payment> {
        self.payments
            .iter_mut()
            .find(|p| p.kind == PaymentKind::Booking)
    }
}

/// An invoice read together with the cost it is paying down.
#[derive(Debug, Clone)]
pub struct InvoiceStatement {
    pub invoice: Invoice,
    pub total_cost: Decimal,
}

impl InvoiceStatement {
    pub fn total_paid(&self) -> Decimal {
        self.invoice.total_paid()
    }

    pub fn balance(&self) -> Decimal {
        self.total_cost - self.total_paid()
    }
}

/// Positional label used on receipts: 1st, 2nd, 3rd, 4th, ..., 11th, 21st.
pub fn ordinal_label(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_labels() {
        let labels: Vec<String> = [1, 2, 3, 4, 11, 12, 13, 21, 22, 23, 101, 111]
            .into_iter()
            .map(ordinal_label)
            .collect();
        assert_eq!(
            labels,
            [
                "1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "22nd", "23rd",
                "101st", "111th"
            ]
        );
    }
}
