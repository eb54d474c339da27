//! Booking lifecycle: creation saga, edits, documents and archival delete.

use super::archive::ArchiveService;
use super::metrics;
use super::repository::{Filter, StoreError, Stores};
use super::storage::{storage_key, Storage};
use super::ServiceError;
use crate::dtos::bookings::{BookingDocumentUpload, CreateBookingRequest, UpdateBookingRequest};
use crate::dtos::UploadedFile;
use crate::models::{
    Booking, BookingDocument, DeletedContact, DocumentKind, Invoice, InvoiceStatement, Plot,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use validator::ValidateEmail;

#[derive(Clone)]
pub struct BookingService {
    stores: Stores,
    storage: Arc<dyn Storage>,
    archive: ArchiveService,
}

impl BookingService {
    pub fn new(stores: Stores, storage: Arc<dyn Storage>, archive: ArchiveService) -> Self {
        Self {
            stores,
            storage,
            archive,
        }
    }

    /// Writes the documents, then the booking, then its invoice seeded with
    /// the booking payment. A failed step undoes the earlier ones.
    pub async fn create(
        &self,
        req: CreateBookingRequest,
        uploads: Vec<BookingDocumentUpload>,
    ) -> Result<(Booking, InvoiceStatement), ServiceError> {
        let gender = req
            .gender
            .ok_or_else(|| ServiceError::invalid("gender", "Gender is required"))?;
        let payment_type = req
            .payment_type
            .ok_or_else(|| ServiceError::invalid("paymentType", "Payment type is required"))?;
        let total_cost = req
            .total_cost
            .ok_or_else(|| ServiceError::invalid("totalCost", "Total cost is required"))?;
        let rate_per_sq_ft = req
            .rate_per_sq_ft
            .ok_or_else(|| ServiceError::invalid("ratePerSqFt", "Rate per sq-ft is required"))?;
        let first_payment = req
            .first_payment
            .ok_or_else(|| ServiceError::invalid("firstPayment", "First payment is required"))?;

        if first_payment > total_cost {
            return Err(ServiceError::invalid(
                "firstPayment",
                "First payment cannot exceed the total cost",
            ));
        }

        let plot = self.load_plot(&req.plot_id).await?;
        if self.booking_on_plot(&plot.id).await?.is_some() {
            return Err(plot_taken(&plot));
        }
        if let Some(broker_id) = &req.broker_id {
            self.ensure_broker(broker_id).await?;
        }
        ensure_cost_matches(&plot, rate_per_sq_ft, total_cost)?;

        let now = Utc::now();
        let mut booking = Booking {
            id: crate::models::new_id(),
            name: req.name.trim().to_string(),
            phone: req.phone,
            address: req.address.trim().to_string(),
            dob: req.dob,
            gender,
            email: req.email,
            plot_id: plot.id.clone(),
            layout: plot.layout.clone(),
            broker_id: req.broker_id,
            total_cost,
            rate_per_sq_ft,
            first_payment,
            payment_type,
            narration: req.narration,
            documents: Vec::new(),
            booking_date: req.booking_date.unwrap_or_else(|| now.date_naive()),
            created_at: now,
            updated_at: now,
        };

        for upload in uploads {
            match self.store_document(&booking.id, upload.kind, upload.file).await {
                Ok(document) => {
                    booking.attach_document(document);
                }
                Err(e) => {
                    self.remove_documents(&booking.documents).await;
                    return Err(e);
                }
            }
        }

        if let Err(e) = self.stores.bookings.insert(&booking).await {
            self.remove_documents(&booking.documents).await;
            return Err(match e {
                StoreError::Duplicate { .. } => plot_taken(&plot),
                other => other.into(),
            });
        }

        let invoice = Invoice::seeded_from(&booking);
        if let Err(e) = self.stores.invoices.insert(&invoice).await {
            tracing::error!(booking_id = %booking.id, error = %e, "Invoice creation failed; rolling back booking");
            if let Err(rollback) = self.stores.bookings.delete(&booking.id).await {
                tracing::error!(booking_id = %booking.id, error = %rollback, "Booking rollback failed");
            }
            self.remove_documents(&booking.documents).await;
            return Err(e.into());
        }

        metrics::record_booking_created(&booking.layout);
        tracing::info!(
            booking_id = %booking.id,
            plot_id = %booking.plot_id,
            invoice_id = %invoice.id,
            documents = booking.documents.len(),
            "Booking created"
        );

        Ok((
            booking,
            InvoiceStatement {
                invoice,
                total_cost,
            },
        ))
    }

    pub async fn get(&self, id: &str) -> Result<Booking, ServiceError> {
        self.stores
            .bookings
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound("Booking"))
    }

    /// Newest first.
    pub async fn list(&self, layout: Option<&str>) -> Result<Vec<Booking>, ServiceError> {
        let mut bookings = self
            .stores
            .bookings
            .find(Filter::new().eq_opt("layout", layout))
            .await?;
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    /// Merges the given fields. A rate change without a total recomputes the
    /// total from the plot area; a supplied total must agree with it.
    pub async fn update(
        &self,
        id: &str,
        req: UpdateBookingRequest,
    ) -> Result<Booking, ServiceError> {
        let mut booking = self.get(id).await?;

        if let Some(plot_id) = &req.plot_id {
            if *plot_id != booking.plot_id {
                return Err(ServiceError::invalid(
                    "plotId",
                    "A booking cannot be moved to another plot",
                ));
            }
        }

        if let Some(broker_id) = req.broker_id {
            let broker_id = broker_id.trim().to_string();
            if broker_id.is_empty() {
                booking.broker_id = None;
            } else {
                self.ensure_broker(&broker_id).await?;
                booking.broker_id = Some(broker_id);
            }
        }

        if req.rate_per_sq_ft.is_some() || req.total_cost.is_some() {
            let plot = self.load_plot(&booking.plot_id).await?;
            let rate = req.rate_per_sq_ft.unwrap_or(booking.rate_per_sq_ft);
            let total = req.total_cost.unwrap_or_else(|| plot.cost_at(rate));
            ensure_cost_matches(&plot, rate, total)?;
            booking.rate_per_sq_ft = rate;
            booking.total_cost = total;
        }

        if let Some(name) = req.name {
            booking.name = name.trim().to_string();
        }
        if let Some(phone) = req.phone {
            booking.phone = phone;
        }
        if let Some(address) = req.address {
            booking.address = address.trim().to_string();
        }
        if let Some(dob) = req.dob {
            booking.dob = dob;
        }
        if let Some(gender) = req.gender {
            booking.gender = gender;
        }
        if let Some(email) = req.email {
            if let Some(value) = &email {
                if !value.validate_email() {
                    return Err(ServiceError::invalid("email", "Invalid email format"));
                }
            }
            booking.email = email;
        }
        if let Some(payment_type) = req.payment_type {
            booking.payment_type = payment_type;
        }
        if let Some(narration) = req.narration {
            booking.narration = Some(narration).filter(|n| !n.trim().is_empty());
        }
        if let Some(booking_date) = req.booking_date {
            booking.booking_date = booking_date;
        }
        if let Some(first_payment) = req.first_payment {
            booking.first_payment = first_payment;
        }

        if booking.first_payment > booking.total_cost {
            return Err(ServiceError::invalid(
                "firstPayment",
                "First payment cannot exceed the total cost",
            ));
        }

        let invoice = self
            .stores
            .invoices
            .find_one(Filter::new().eq("bookingId", id))
            .await?;

        if let Some(mut invoice) = invoice {
            let expected_version = invoice.version;
            let mut mirrored = false;
            if let Some(payment) = invoice.booking_payment_mut() {
                if payment.amount != booking.first_payment {
                    payment.amount = booking.first_payment;
                    mirrored = true;
                }
            }

            let paid = invoice.total_paid();
            if booking.total_cost < paid {
                return Err(ServiceError::invalid(
                    "totalCost",
                    format!("Total cost cannot be less than the amount already paid ({})", paid),
                ));
            }

            if mirrored {
                invoice.version += 1;
                invoice.updated_at = Utc::now();
                if !self
                    .stores
                    .invoices
                    .replace(&invoice, Some(expected_version))
                    .await?
                {
                    metrics::record_version_conflict();
                    return Err(ServiceError::conflict(
                        "The invoice was changed by another request; reload and try again",
                    ));
                }
            }
        }

        booking.updated_at = Utc::now();
        if !self.stores.bookings.replace(&booking, None).await? {
            return Err(ServiceError::NotFound("Booking"));
        }

        tracing::info!(booking_id = %id, "Booking updated");
        Ok(booking)
    }

    /// Attaches or replaces one identity document.
    pub async fn upload_document(
        &self,
        id: &str,
        upload: BookingDocumentUpload,
    ) -> Result<Booking, ServiceError> {
        let mut booking = self.get(id).await?;

        let document = self.store_document(id, upload.kind, upload.file).await?;
        let new_key = document.storage_key.clone();
        let previous = booking.attach_document(document);
        booking.updated_at = Utc::now();

        match self.stores.bookings.replace(&booking, None).await {
            Ok(true) => {}
            Ok(false) => {
                self.discard_file(&new_key, previous.as_ref()).await;
                return Err(ServiceError::NotFound("Booking"));
            }
            Err(e) => {
                self.discard_file(&new_key, previous.as_ref()).await;
                return Err(e.into());
            }
        }

        if let Some(previous) = previous {
            if previous.storage_key != new_key {
                if let Err(e) = self.storage.delete(&previous.storage_key).await {
                    tracing::warn!(key = %previous.storage_key, error = %e, "Failed to delete replaced document");
                }
            }
        }

        tracing::info!(booking_id = %id, kind = upload.kind.as_str(), "Booking document uploaded");
        Ok(booking)
    }

    /// Archives the booking with its invoice, then removes both. Uploaded
    /// documents stay on disk so a restored booking keeps working links.
    pub async fn delete(&self, id: &str, deleted_by: &str) -> Result<DeletedContact, ServiceError> {
        let booking = self.get(id).await?;
        let invoice = self
            .stores
            .invoices
            .find_one(Filter::new().eq("bookingId", id))
            .await?;

        let entry = self
            .archive
            .archive(&booking, invoice.as_ref(), deleted_by)
            .await?;

        if let Some(invoice) = &invoice {
            if let Err(e) = self.stores.invoices.delete(&invoice.id).await {
                self.abandon_archive(&entry).await;
                return Err(e.into());
            }
        }

        match self.stores.bookings.delete(id).await {
            Ok(_) => {}
            Err(e) => {
                if let Some(invoice) = &invoice {
                    if let Err(restore) = self.stores.invoices.insert(invoice).await {
                        tracing::error!(invoice_id = %invoice.id, error = %restore, "Failed to reinstate invoice after aborted delete");
                    }
                }
                self.abandon_archive(&entry).await;
                return Err(e.into());
            }
        }

        metrics::record_booking_deleted();
        tracing::info!(booking_id = %id, deleted_contact_id = %entry.id, "Booking deleted");
        Ok(entry)
    }

    async fn abandon_archive(&self, entry: &DeletedContact) {
        if let Err(e) = self.archive.discard(&entry.id).await {
            tracing::error!(deleted_contact_id = %entry.id, error = %e, "Failed to discard archive entry");
        }
    }

    async fn load_plot(&self, plot_id: &str) -> Result<Plot, ServiceError> {
        self.stores
            .plots
            .get(plot_id)
            .await?
            .ok_or(ServiceError::NotFound("Plot"))
    }

    async fn booking_on_plot(&self, plot_id: &str) -> Result<Option<Booking>, ServiceError> {
        Ok(self
            .stores
            .bookings
            .find_one(Filter::new().eq("plotId", plot_id))
            .await?)
    }

    async fn ensure_broker(&self, broker_id: &str) -> Result<(), ServiceError> {
        match self.stores.brokers.get(broker_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound("Broker")),
        }
    }

    async fn store_document(
        &self,
        booking_id: &str,
        kind: DocumentKind,
        file: UploadedFile,
    ) -> Result<BookingDocument, ServiceError> {
        let key = storage_key(&format!("bookings/{}", booking_id), kind.as_str(), &file.file_name);
        self.storage.upload(&key, file.data).await?;
        Ok(BookingDocument {
            kind,
            url: self.storage.url_for(&key),
            file_name: file.file_name,
            storage_key: key,
        })
    }

    async fn remove_documents(&self, documents: &[BookingDocument]) {
        for document in documents {
            if let Err(e) = self.storage.delete(&document.storage_key).await {
                tracing::warn!(key = %document.storage_key, error = %e, "Failed to remove orphaned document");
            }
        }
    }

    /// Removes a freshly written file unless it overwrote the previous one.
    async fn discard_file(&self, key: &str, previous: Option<&BookingDocument>) {
        if previous.is_some_and(|p| p.storage_key == key) {
            return;
        }
        if let Err(e) = self.storage.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to remove orphaned document");
        }
    }
}

fn plot_taken(plot: &Plot) -> ServiceError {
    ServiceError::conflict(format!("Plot {} is already booked", plot.plot_number))
}

fn ensure_cost_matches(
    plot: &Plot,
    rate_per_sq_ft: Decimal,
    total_cost: Decimal,
) -> Result<(), ServiceError> {
    let expected = plot.cost_at(rate_per_sq_ft);
    if total_cost.round_dp(2) != expected {
        return Err(ServiceError::invalid(
            "totalCost",
            format!(
                "Total cost must equal plot area × rate ({} sq-ft × {} = {})",
                plot.area_sq_ft.normalize(),
                rate_per_sq_ft.normalize(),
                expected.normalize()
            ),
        ));
    }
    Ok(())
}
