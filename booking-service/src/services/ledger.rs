//! Invoice payment ledger.
//!
//! Payments are addressed by their stable id, never by position. Every write
//! is a compare-and-swap on the invoice `version`, so two edits racing on the
//! same invoice surface as a conflict instead of one silently winning.

use super::metrics;
use super::repository::{Filter, StoreError, Stores};
use super::ServiceError;
use crate::dtos::invoices::PaymentRequest;
use crate::models::{Booking, Invoice, InvoiceStatement, Payment, PaymentKind};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Clone)]
pub struct InvoiceService {
    stores: Stores,
}

impl InvoiceService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// For bookings that have no invoice yet.
    pub async fn create(&self, booking_id: &str) -> Result<InvoiceStatement, ServiceError> {
        let booking = self.load_booking(booking_id).await?;
        if self.find_for_booking(booking_id).await?.is_some() {
            return Err(invoice_exists());
        }

        let invoice = Invoice::seeded_from(&booking);
        self.stores.invoices.insert(&invoice).await.map_err(|e| match e {
            StoreError::Duplicate { .. } => invoice_exists(),
            other => other.into(),
        })?;

        tracing::info!(invoice_id = %invoice.id, booking_id = %booking_id, "Invoice created");
        Ok(InvoiceStatement {
            invoice,
            total_cost: booking.total_cost,
        })
    }

    pub async fn get(&self, id: &str) -> Result<InvoiceStatement, ServiceError> {
        let invoice = self.load(id).await?;
        let booking = self.load_booking(&invoice.booking_id).await?;
        Ok(InvoiceStatement {
            invoice,
            total_cost: booking.total_cost,
        })
    }

    pub async fn list(&self, booking_id: Option<&str>) -> Result<Vec<InvoiceStatement>, ServiceError> {
        let invoices = self
            .stores
            .invoices
            .find(Filter::new().eq_opt("bookingId", booking_id))
            .await?;

        let costs: HashMap<String, rust_decimal::Decimal> = self
            .stores
            .bookings
            .find(Filter::new().eq_opt("_id", booking_id))
            .await?
            .into_iter()
            .map(|b| (b.id, b.total_cost))
            .collect();

        let mut statements: Vec<InvoiceStatement> = invoices
            .into_iter()
            .filter_map(|invoice| match costs.get(&invoice.booking_id) {
                Some(total_cost) => Some(InvoiceStatement {
                    total_cost: *total_cost,
                    invoice,
                }),
                None => {
                    tracing::warn!(invoice_id = %invoice.id, booking_id = %invoice.booking_id, "Skipping invoice without booking");
                    None
                }
            })
            .collect();
        statements.sort_by(|a, b| b.invoice.created_at.cmp(&a.invoice.created_at));
        Ok(statements)
    }

    /// Appends a payment, or overwrites the one named by `payment_id` in
    /// place keeping its id, sequence and position.
    pub async fn add_or_edit_payment(
        &self,
        invoice_id: &str,
        req: PaymentRequest,
        payment_id: Option<&str>,
    ) -> Result<InvoiceStatement, ServiceError> {
        let amount = req
            .amount
            .ok_or_else(|| ServiceError::invalid("amount", "Amount is required"))?;
        let payment_type = req
            .payment_type
            .ok_or_else(|| ServiceError::invalid("paymentType", "Payment type is required"))?;
        let payment_date = req.payment_date.unwrap_or_else(|| Utc::now().date_naive());

        let mut invoice = self.load(invoice_id).await?;
        check_version(&invoice, req.expected_version)?;
        let booking = self.load_booking(&invoice.booking_id).await?;

        let action = match payment_id {
            None => {
                let payment = Payment {
                    id: crate::models::new_id(),
                    sequence: invoice.next_sequence,
                    kind: PaymentKind::Installment,
                    amount,
                    payment_date,
                    payment_type,
                    narration: req.narration,
                };
                invoice.next_sequence += 1;
                invoice.payments.push(payment);
                "added"
            }
            Some(payment_id) => {
                let position = invoice
                    .position_of(payment_id)
                    .ok_or(ServiceError::NotFound("Payment"))?;
                let payment = &mut invoice.payments[position];
                payment.amount = amount;
                payment.payment_date = payment_date;
                payment.payment_type = payment_type;
                payment.narration = req.narration;
                "edited"
            }
        };

        let paid = invoice.total_paid();
        if paid > booking.total_cost {
            return Err(ServiceError::invalid(
                "amount",
                format!(
                    "Payments would total {} which exceeds the booking's total cost of {}",
                    paid.normalize(),
                    booking.total_cost.normalize()
                ),
            ));
        }

        // The booking payment is mirrored on the booking itself.
        let mirrored = invoice
            .payments
            .iter()
            .find(|p| p.kind == PaymentKind::Booking)
            .filter(|p| p.amount != booking.first_payment)
            .map(|p| p.amount);

        self.commit(&mut invoice).await?;

        if let Some(first_payment) = mirrored {
            self.mirror_first_payment(&booking.id, first_payment).await?;
        }

        metrics::record_payment(action);
        tracing::info!(
            invoice_id = %invoice_id,
            version = invoice.version,
            payments = invoice.payments.len(),
            "Payment {}", action
        );

        Ok(InvoiceStatement {
            invoice,
            total_cost: booking.total_cost,
        })
    }

    /// Removes exactly one installment; the others keep their ids and order.
    pub async fn delete_payment(
        &self,
        invoice_id: &str,
        payment_id: &str,
        expected_version: Option<i64>,
    ) -> Result<InvoiceStatement, ServiceError> {
        let mut invoice = self.load(invoice_id).await?;
        check_version(&invoice, expected_version)?;
        let booking = self.load_booking(&invoice.booking_id).await?;

        let position = invoice
            .position_of(payment_id)
            .ok_or(ServiceError::NotFound("Payment"))?;
        if invoice.payments[position].kind == PaymentKind::Booking {
            return Err(ServiceError::invalid(
                "paymentId",
                "The booking payment cannot be deleted; delete the booking instead",
            ));
        }
        let removed = invoice.payments.remove(position);

        self.commit(&mut invoice).await?;

        metrics::record_payment("deleted");
        tracing::info!(
            invoice_id = %invoice_id,
            payment_id = %removed.id,
            sequence = removed.sequence,
            "Payment deleted"
        );

        Ok(InvoiceStatement {
            invoice,
            total_cost: booking.total_cost,
        })
    }

    async fn commit(&self, invoice: &mut Invoice) -> Result<(), ServiceError> {
        let expected = invoice.version;
        invoice.version += 1;
        invoice.updated_at = Utc::now();

        if !self.stores.invoices.replace(invoice, Some(expected)).await? {
            metrics::record_version_conflict();
            tracing::warn!(invoice_id = %invoice.id, expected_version = expected, "Invoice version conflict");
            return Err(stale_invoice());
        }
        Ok(())
    }

    /// Re-reads the booking so an edit committed after it was loaded survives.
    async fn mirror_first_payment(
        &self,
        booking_id: &str,
        amount: Decimal,
    ) -> Result<(), ServiceError> {
        let Some(mut booking) = self.stores.bookings.get(booking_id).await? else {
            tracing::warn!(booking_id, "Booking gone before its first payment could be mirrored");
            return Ok(());
        };
        booking.first_payment = amount;
        booking.updated_at = Utc::now();

        if !self.stores.bookings.replace(&booking, None).await? {
            tracing::warn!(booking_id, "Booking gone before its first payment could be mirrored");
        }
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Invoice, ServiceError> {
        self.stores
            .invoices
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound("Invoice"))
    }

    async fn load_booking(&self, booking_id: &str) -> Result<Booking, ServiceError> {
        self.stores
            .bookings
            .get(booking_id)
            .await?
            .ok_or(ServiceError::NotFound("Booking"))
    }

    async fn find_for_booking(&self, booking_id: &str) -> Result<Option<Invoice>, ServiceError> {
        Ok(self
            .stores
            .invoices
            .find_one(Filter::new().eq("bookingId", booking_id))
            .await?)
    }
}

fn check_version(invoice: &Invoice, expected: Option<i64>) -> Result<(), ServiceError> {
    match expected {
        Some(v) if v != invoice.version => {
            metrics::record_version_conflict();
            Err(stale_invoice())
        }
        _ => Ok(()),
    }
}

fn stale_invoice() -> ServiceError {
    ServiceError::conflict("The invoice was changed by another request; reload and try again")
}

fn invoice_exists() -> ServiceError {
    ServiceError::conflict("An invoice already exists for this booking")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, PaymentType};
    use crate::services::repository::Repository;
    use async_trait::async_trait;
    use std::sync::Arc;
    use chrono::NaiveDate;

    async fn seeded(stores: &Stores) -> Invoice {
        let now = Utc::now();
        let booking = Booking {
            id: "bk-1".into(),
            name: "Asha Rao".into(),
            phone: "9876543210".into(),
            address: "12 MG Road".into(),
            dob: None,
            gender: Gender::Female,
            email: None,
            plot_id: "plot-5".into(),
            layout: "layout1".into(),
            broker_id: None,
            total_cost: Decimal::from(500_000),
            rate_per_sq_ft: Decimal::from(500),
            first_payment: Decimal::from(100_000),
            payment_type: PaymentType::Cash,
            narration: None,
            documents: vec![],
            booking_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            created_at: now,
            updated_at: now,
        };
        stores.bookings.insert(&booking).await.unwrap();
        let invoice = Invoice::seeded_from(&booking);
        stores.invoices.insert(&invoice).await.unwrap();
        invoice
    }

    fn payment(amount: i64) -> PaymentRequest {
        PaymentRequest {
            payment_id: None,
            expected_version: None,
            amount: Some(Decimal::from(amount)),
            payment_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            payment_type: Some(PaymentType::Online),
            narration: None,
        }
    }

    #[tokio::test]
    async fn sequences_are_never_reused_after_a_delete() {
        let stores = Stores::in_memory();
        let invoice = seeded(&stores).await;
        let service = InvoiceService::new(stores);

        let s = service.add_or_edit_payment(&invoice.id, payment(1_000), None).await.unwrap();
        let second = s.invoice.payments[1].id.clone();
        service.delete_payment(&invoice.id, &second, None).await.unwrap();

        let s = service.add_or_edit_payment(&invoice.id, payment(2_000), None).await.unwrap();
        let sequences: Vec<u32> = s.invoice.payments.iter().map(|p| p.sequence).collect();
        assert_eq!(sequences, [1, 3]);
        assert_eq!(s.invoice.version, 3);
    }

    #[tokio::test]
    async fn stale_expected_version_is_a_conflict() {
        let stores = Stores::in_memory();
        let invoice = seeded(&stores).await;
        let service = InvoiceService::new(stores);

        service.add_or_edit_payment(&invoice.id, payment(1_000), None).await.unwrap();

        let mut stale = payment(2_000);
        stale.expected_version = Some(0);
        let err = service
            .add_or_edit_payment(&invoice.id, stale, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn payments_cannot_exceed_total_cost() {
        let stores = Stores::in_memory();
        let invoice = seeded(&stores).await;
        let service = InvoiceService::new(stores);

        service.add_or_edit_payment(&invoice.id, payment(400_000), None).await.unwrap();
        let err = service
            .add_or_edit_payment(&invoice.id, payment(1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn editing_the_booking_payment_updates_the_booking() {
        let stores = Stores::in_memory();
        let invoice = seeded(&stores).await;
        let service = InvoiceService::new(stores.clone());
        let first = invoice.payments[0].id.clone();

        let s = service
            .add_or_edit_payment(&invoice.id, payment(150_000), Some(&first))
            .await
            .unwrap();
        assert_eq!(s.invoice.payments[0].kind, PaymentKind::Booking);
        assert_eq!(s.invoice.payments[0].id, first);

        let booking = stores.bookings.get("bk-1").await.unwrap().unwrap();
        assert_eq!(booking.first_payment, Decimal::from(150_000));

        let err = service.delete_payment(&invoice.id, &first, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    /// Invoice store that lets a booking edit land just as the invoice commits.
    struct BookingEditedOnCommit {
        invoices: Arc<dyn Repository<Invoice>>,
        bookings: Arc<dyn Repository<Booking>>,
    }

    #[async_trait]
    impl Repository<Invoice> for BookingEditedOnCommit {
        async fn insert(&self, item: &Invoice) -> Result<(), StoreError> {
            self.invoices.insert(item).await
        }

        async fn get(&self, id: &str) -> Result<Option<Invoice>, StoreError> {
            self.invoices.get(id).await
        }

        async fn find(&self, filter: Filter) -> Result<Vec<Invoice>, StoreError> {
            self.invoices.find(filter).await
        }

        async fn replace(
            &self,
            item: &Invoice,
            expected_version: Option<i64>,
        ) -> Result<bool, StoreError> {
            if let Some(mut booking) = self.bookings.get(&item.booking_id).await? {
                booking.address = "34 Brigade Road".into();
                self.bookings.replace(&booking, None).await?;
            }
            self.invoices.replace(item, expected_version).await
        }

        async fn delete(&self, id: &str) -> Result<bool, StoreError> {
            self.invoices.delete(id).await
        }
    }

    #[tokio::test]
    async fn mirroring_the_booking_payment_keeps_concurrent_booking_edits() {
        let mut stores = Stores::in_memory();
        let invoice = seeded(&stores).await;
        stores.invoices = Arc::new(BookingEditedOnCommit {
            invoices: stores.invoices.clone(),
            bookings: stores.bookings.clone(),
        });
        let service = InvoiceService::new(stores.clone());
        let first = invoice.payments[0].id.clone();

        service
            .add_or_edit_payment(&invoice.id, payment(150_000), Some(&first))
            .await
            .unwrap();

        let booking = stores.bookings.get("bk-1").await.unwrap().unwrap();
        assert_eq!(booking.first_payment, Decimal::from(150_000));
        assert_eq!(booking.address, "34 Brigade Road");
    }
}
