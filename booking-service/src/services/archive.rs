use super::repository::{Filter, StoreError, Stores};
use super::ServiceError;
use crate::models::{Booking, DeletedContact, Invoice};

/// Snapshots of deleted bookings and the way back.
#[derive(Clone)]
pub struct ArchiveService {
    stores: Stores,
}

impl ArchiveService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn archive(
        &self,
        booking: &Booking,
        invoice: Option<&Invoice>,
        deleted_by: &str,
    ) -> Result<DeletedContact, ServiceError> {
        let entry = DeletedContact::snapshot(booking, invoice, deleted_by);
        self.stores.deleted_contacts.insert(&entry).await?;
        tracing::info!(
            deleted_contact_id = %entry.id,
            booking_id = %booking.id,
            deleted_by = %deleted_by,
            "Booking archived"
        );
        Ok(entry)
    }

    /// Drops an entry written by a delete that could not complete.
    pub(crate) async fn discard(&self, id: &str) -> Result<(), ServiceError> {
        self.stores.deleted_contacts.delete(id).await?;
        Ok(())
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<DeletedContact>, ServiceError> {
        let mut entries = self.stores.deleted_contacts.list().await?;
        entries.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at));
        Ok(entries)
    }

    /// Recreates the booking and its invoice under their original ids and
    /// removes the archive entry.
    pub async fn restore(&self, id: &str) -> Result<Booking, ServiceError> {
        let entry = self
            .stores
            .deleted_contacts
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound("Deleted contact"))?;
        let booking = entry.booking;

        if self.stores.plots.get(&booking.plot_id).await?.is_none() {
            return Err(ServiceError::NotFound("Plot"));
        }
        if self
            .stores
            .bookings
            .find_one(Filter::new().eq("plotId", booking.plot_id.as_str()))
            .await?
            .is_some()
        {
            return Err(plot_rebooked());
        }

        self.stores.bookings.insert(&booking).await.map_err(|e| match e {
            StoreError::Duplicate { .. } => plot_rebooked(),
            other => other.into(),
        })?;

        if let Some(invoice) = &entry.invoice {
            if let Err(e) = self.stores.invoices.insert(invoice).await {
                tracing::error!(booking_id = %booking.id, error = %e, "Restoring invoice failed; rolling back booking");
                if let Err(rollback) = self.stores.bookings.delete(&booking.id).await {
                    tracing::error!(booking_id = %booking.id, error = %rollback, "Rollback of restored booking failed");
                }
                return Err(e.into());
            }
        }

        if let Err(e) = self.stores.deleted_contacts.delete(id).await {
            // The booking is back; a stale archive entry is only cosmetic.
            tracing::warn!(deleted_contact_id = %id, error = %e, "Failed to remove archive entry after restore");
        }

        tracing::info!(booking_id = %booking.id, deleted_contact_id = %id, "Booking restored");
        Ok(booking)
    }
}

fn plot_rebooked() -> ServiceError {
    ServiceError::conflict("The plot has been booked again since this contact was deleted")
}
