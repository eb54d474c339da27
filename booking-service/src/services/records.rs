//! Flat records with no ties to bookings: expenses, other ledger entries,
//! enquiries and layout resources.

use super::repository::{Filter, Stores};
use super::storage::{storage_key, Storage};
use super::ServiceError;
use crate::dtos::records::{
    CreateEnquiryRequest, LedgerEntryRequest, UpdateEnquiryRequest, UpdateLedgerEntryRequest,
};
use crate::dtos::UploadedFile;
use crate::models::{
    new_id, records::net_amount, Enquiry, Expense, LayoutResource, Other, StoredFile,
    DEFAULT_LAYOUT,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Clone)]
pub struct RecordService {
    stores: Stores,
    storage: Arc<dyn Storage>,
}

struct LedgerFields {
    description: String,
    category: String,
    amount: Decimal,
    tds: Decimal,
    date: chrono::NaiveDate,
    layout: String,
}

impl LedgerFields {
    fn from_request(req: LedgerEntryRequest) -> Result<Self, ServiceError> {
        let amount = req
            .amount
            .ok_or_else(|| ServiceError::invalid("amount", "Amount is required"))?;
        Ok(Self {
            description: req.description.trim().to_string(),
            category: req.category.trim().to_string(),
            amount,
            tds: req.tds.unwrap_or(Decimal::ZERO),
            date: req.date.unwrap_or_else(|| Utc::now().date_naive()),
            layout: req.layout.unwrap_or_else(|| DEFAULT_LAYOUT.to_string()),
        })
    }
}

impl RecordService {
    pub fn new(stores: Stores, storage: Arc<dyn Storage>) -> Self {
        Self { stores, storage }
    }

    // Expenses

    pub async fn create_expense(&self, req: LedgerEntryRequest) -> Result<Expense, ServiceError> {
        let fields = LedgerFields::from_request(req)?;
        let now = Utc::now();
        let expense = Expense {
            id: new_id(),
            net_amount: net_amount(fields.amount, fields.tds),
            description: fields.description,
            category: fields.category,
            amount: fields.amount,
            tds: fields.tds,
            date: fields.date,
            layout: fields.layout,
            document: None,
            created_at: now,
            updated_at: now,
        };
        self.stores.expenses.insert(&expense).await?;
        tracing::info!(expense_id = %expense.id, "Expense recorded");
        Ok(expense)
    }

    /// Latest date first.
    pub async fn list_expenses(&self, layout: Option<&str>) -> Result<Vec<Expense>, ServiceError> {
        let mut expenses = self
            .stores
            .expenses
            .find(Filter::new().eq_opt("layout", layout))
            .await?;
        expenses.sort_by(|a, b| (b.date, b.created_at).cmp(&(a.date, a.created_at)));
        Ok(expenses)
    }

    pub async fn update_expense(
        &self,
        id: &str,
        req: UpdateLedgerEntryRequest,
    ) -> Result<Expense, ServiceError> {
        let mut expense = self.load_expense(id).await?;
        apply_ledger_changes(
            req,
            &mut expense.description,
            &mut expense.category,
            &mut expense.amount,
            &mut expense.tds,
            &mut expense.date,
            &mut expense.layout,
        );
        expense.net_amount = net_amount(expense.amount, expense.tds);
        expense.updated_at = Utc::now();
        self.save_expense(&expense).await?;
        Ok(expense)
    }

    pub async fn delete_expense(&self, id: &str) -> Result<(), ServiceError> {
        let expense = self.load_expense(id).await?;
        if !self.stores.expenses.delete(id).await? {
            return Err(ServiceError::NotFound("Expense"));
        }
        if let Some(document) = expense.document {
            self.remove_file(&document.storage_key).await;
        }
        tracing::info!(expense_id = %id, "Expense deleted");
        Ok(())
    }

    /// Stored as `expenses/<expense id>.<ext>`, replacing any earlier file.
    pub async fn attach_expense_document(
        &self,
        id: &str,
        file: UploadedFile,
    ) -> Result<Expense, ServiceError> {
        let mut expense = self.load_expense(id).await?;
        let stored = self.store_file(storage_key("expenses", id, &file.file_name), file).await?;

        let previous = expense.document.replace(stored.clone());
        expense.updated_at = Utc::now();
        if let Err(e) = self.save_expense(&expense).await {
            if previous.as_ref().map(|p| &p.storage_key) != Some(&stored.storage_key) {
                self.remove_file(&stored.storage_key).await;
            }
            return Err(e);
        }
        if let Some(previous) = previous {
            if previous.storage_key != stored.storage_key {
                self.remove_file(&previous.storage_key).await;
            }
        }

        tracing::info!(expense_id = %id, key = %stored.storage_key, "Expense document attached");
        Ok(expense)
    }

    /// Looks the file up by name under `expenses/`. Only files attached to
    /// an expense are served.
    pub async fn expense_document(
        &self,
        file_name: &str,
    ) -> Result<(StoredFile, Vec<u8>), ServiceError> {
        let key = format!("expenses/{}", file_name);
        let expense = self
            .stores
            .expenses
            .find_one(Filter::new().eq("document.storageKey", key.as_str()))
            .await?
            .ok_or(ServiceError::NotFound("Document"))?;
        let document = expense.document.ok_or(ServiceError::NotFound("Document"))?;

        let data = self.storage.download(&document.storage_key).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ServiceError::NotFound("Document")
            } else {
                e.into()
            }
        })?;
        Ok((document, data))
    }

    pub async fn remove_expense_document(&self, id: &str) -> Result<Expense, ServiceError> {
        let mut expense = self.load_expense(id).await?;
        let document = expense
            .document
            .take()
            .ok_or(ServiceError::NotFound("Document"))?;
        expense.updated_at = Utc::now();
        self.save_expense(&expense).await?;
        self.remove_file(&document.storage_key).await;
        tracing::info!(expense_id = %id, "Expense document removed");
        Ok(expense)
    }

    async fn load_expense(&self, id: &str) -> Result<Expense, ServiceError> {
        self.stores
            .expenses
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound("Expense"))
    }

    async fn save_expense(&self, expense: &Expense) -> Result<(), ServiceError> {
        if !self.stores.expenses.replace(expense, None).await? {
            return Err(ServiceError::NotFound("Expense"));
        }
        Ok(())
    }

    // Others

    pub async fn create_other(&self, req: LedgerEntryRequest) -> Result<Other, ServiceError> {
        let fields = LedgerFields::from_request(req)?;
        let now = Utc::now();
        let other = Other {
            id: new_id(),
            net_amount: net_amount(fields.amount, fields.tds),
            description: fields.description,
            category: fields.category,
            amount: fields.amount,
            tds: fields.tds,
            date: fields.date,
            layout: fields.layout,
            created_at: now,
            updated_at: now,
        };
        self.stores.others.insert(&other).await?;
        Ok(other)
    }

    pub async fn list_others(&self, layout: Option<&str>) -> Result<Vec<Other>, ServiceError> {
        let mut others = self
            .stores
            .others
            .find(Filter::new().eq_opt("layout", layout))
            .await?;
        others.sort_by(|a, b| (b.date, b.created_at).cmp(&(a.date, a.created_at)));
        Ok(others)
    }

    pub async fn update_other(
        &self,
        id: &str,
        req: UpdateLedgerEntryRequest,
    ) -> Result<Other, ServiceError> {
        let mut other = self
            .stores
            .others
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound("Record"))?;
        apply_ledger_changes(
            req,
            &mut other.description,
            &mut other.category,
            &mut other.amount,
            &mut other.tds,
            &mut other.date,
            &mut other.layout,
        );
        other.net_amount = net_amount(other.amount, other.tds);
        other.updated_at = Utc::now();
        if !self.stores.others.replace(&other, None).await? {
            return Err(ServiceError::NotFound("Record"));
        }
        Ok(other)
    }

    pub async fn delete_other(&self, id: &str) -> Result<(), ServiceError> {
        if !self.stores.others.delete(id).await? {
            return Err(ServiceError::NotFound("Record"));
        }
        Ok(())
    }

    // Enquiries

    pub async fn create_enquiry(&self, req: CreateEnquiryRequest) -> Result<Enquiry, ServiceError> {
        let now = Utc::now();
        let enquiry = Enquiry {
            id: new_id(),
            name: req.name.trim().to_string(),
            phone: req.phone,
            email: req.email,
            message: req.message,
            layout: req.layout.unwrap_or_else(|| DEFAULT_LAYOUT.to_string()),
            follow_up_date: req.follow_up_date,
            status: req.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        self.stores.enquiries.insert(&enquiry).await?;
        tracing::info!(enquiry_id = %enquiry.id, layout = %enquiry.layout, "Enquiry recorded");
        Ok(enquiry)
    }

    /// Newest first.
    pub async fn list_enquiries(&self, layout: Option<&str>) -> Result<Vec<Enquiry>, ServiceError> {
        let mut enquiries = self
            .stores
            .enquiries
            .find(Filter::new().eq_opt("layout", layout))
            .await?;
        enquiries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(enquiries)
    }

    pub async fn update_enquiry(
        &self,
        id: &str,
        req: UpdateEnquiryRequest,
    ) -> Result<Enquiry, ServiceError> {
        let mut enquiry = self
            .stores
            .enquiries
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound("Enquiry"))?;

        if let Some(name) = req.name {
            enquiry.name = name.trim().to_string();
        }
        if let Some(phone) = req.phone {
            enquiry.phone = phone;
        }
        if let Some(email) = req.email {
            enquiry.email = Some(email).filter(|e| !e.trim().is_empty());
        }
        if let Some(message) = req.message {
            enquiry.message = message;
        }
        if let Some(layout) = req.layout {
            enquiry.layout = layout;
        }
        if req.follow_up_date.is_some() {
            enquiry.follow_up_date = req.follow_up_date;
        }
        if let Some(status) = req.status {
            enquiry.status = status;
        }
        enquiry.updated_at = Utc::now();

        if !self.stores.enquiries.replace(&enquiry, None).await? {
            return Err(ServiceError::NotFound("Enquiry"));
        }
        Ok(enquiry)
    }

    pub async fn delete_enquiry(&self, id: &str) -> Result<(), ServiceError> {
        if !self.stores.enquiries.delete(id).await? {
            return Err(ServiceError::NotFound("Enquiry"));
        }
        Ok(())
    }

    // Layout resources

    pub async fn create_layout_resource(
        &self,
        layout: String,
        title: String,
        file: UploadedFile,
    ) -> Result<LayoutResource, ServiceError> {
        let id = new_id();
        let stored = self
            .store_file(storage_key("layouts", &id, &file.file_name), file)
            .await?;

        let now = Utc::now();
        let resource = LayoutResource {
            id,
            layout,
            title,
            file: stored,
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = self.stores.layout_resources.insert(&resource).await {
            self.remove_file(&resource.file.storage_key).await;
            return Err(e.into());
        }

        tracing::info!(resource_id = %resource.id, layout = %resource.layout, "Layout resource uploaded");
        Ok(resource)
    }

    pub async fn list_layout_resources(
        &self,
        layout: Option<&str>,
    ) -> Result<Vec<LayoutResource>, ServiceError> {
        let mut resources = self
            .stores
            .layout_resources
            .find(Filter::new().eq_opt("layout", layout))
            .await?;
        resources.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(resources)
    }

    pub async fn delete_layout_resource(&self, id: &str) -> Result<(), ServiceError> {
        let resource = self
            .stores
            .layout_resources
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound("Layout resource"))?;
        if !self.stores.layout_resources.delete(id).await? {
            return Err(ServiceError::NotFound("Layout resource"));
        }
        self.remove_file(&resource.file.storage_key).await;
        tracing::info!(resource_id = %id, "Layout resource deleted");
        Ok(())
    }

    async fn store_file(&self, key: String, file: UploadedFile) -> Result<StoredFile, ServiceError> {
        let size = file.data.len() as u64;
        self.storage.upload(&key, file.data).await?;
        Ok(StoredFile {
            url: self.storage.url_for(&key),
            file_name: file.file_name,
            content_type: file.content_type,
            size,
            storage_key: key,
        })
    }

    async fn remove_file(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to delete stored file");
        }
    }
}

fn apply_ledger_changes(
    req: UpdateLedgerEntryRequest,
    description: &mut String,
    category: &mut String,
    amount: &mut Decimal,
    tds: &mut Decimal,
    date: &mut chrono::NaiveDate,
    layout: &mut String,
) {
    if let Some(v) = req.description {
        *description = v.trim().to_string();
    }
    if let Some(v) = req.category {
        *category = v.trim().to_string();
    }
    if let Some(v) = req.amount {
        *amount = v;
    }
    if let Some(v) = req.tds {
        *tds = v;
    }
    if let Some(v) = req.date {
        *date = v;
    }
    if let Some(v) = req.layout {
        *layout = v;
    }
}
