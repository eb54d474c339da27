//! Storage seam shared by every collection.
//!
//! Services talk to `Repository<T>` only. `Stores` is built once at startup
//! (MongoDB or in-memory) and handed to the services through `AppState`.

use crate::models::{
    Booking, Broker, DeletedContact, Enquiry, Entity, Expense, Invoice, LayoutResource, Other,
    PasswordResetToken, Plot, User,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use super::database::{MongoDb, MongoRepository};
use super::memory::MemoryRepository;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate key in {collection}: {detail}")]
    Duplicate {
        collection: &'static str,
        detail: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Str(String),
    Int(i64),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Str(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Str(value)
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        FilterValue::Int(value as i64)
    }
}

/// Conjunction of equality clauses over serialized (camelCase) field names.
/// Dotted names reach into embedded documents.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<(String, FilterValue)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.clauses.push((field.to_string(), value.into()));
        self
    }

    /// Adds the clause only when a value is present.
    pub fn eq_opt(self, field: &str, value: Option<impl Into<FilterValue>>) -> Self {
        match value {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    pub fn clauses(&self) -> &[(String, FilterValue)] {
        &self.clauses
    }
}

#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Fails with `StoreError::Duplicate` when a unique key is already taken.
    async fn insert(&self, item: &T) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<T>, StoreError>;

    /// Matching items in insertion order.
    async fn find(&self, filter: Filter) -> Result<Vec<T>, StoreError>;

    async fn find_one(&self, filter: Filter) -> Result<Option<T>, StoreError> {
        Ok(self.find(filter).await?.into_iter().next())
    }

    async fn list(&self) -> Result<Vec<T>, StoreError> {
        self.find(Filter::new()).await
    }

    /// Replaces the stored item with the same id. With `expected_version` the
    /// write only happens if the stored `version` field still equals it.
    /// Returns false when nothing matched.
    async fn replace(&self, item: &T, expected_version: Option<i64>) -> Result<bool, StoreError>;

    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

/// One repository per collection.
#[derive(Clone)]
pub struct Stores {
    pub plots: Arc<dyn Repository<Plot>>,
    pub brokers: Arc<dyn Repository<Broker>>,
    pub bookings: Arc<dyn Repository<Booking>>,
    pub invoices: Arc<dyn Repository<Invoice>>,
    pub deleted_contacts: Arc<dyn Repository<DeletedContact>>,
    pub expenses: Arc<dyn Repository<Expense>>,
    pub others: Arc<dyn Repository<Other>>,
    pub enquiries: Arc<dyn Repository<Enquiry>>,
    pub layout_resources: Arc<dyn Repository<LayoutResource>>,
    pub users: Arc<dyn Repository<User>>,
    pub reset_tokens: Arc<dyn Repository<PasswordResetToken>>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            plots: Arc::new(MemoryRepository::new()),
            brokers: Arc::new(MemoryRepository::new()),
            bookings: Arc::new(MemoryRepository::new()),
            invoices: Arc::new(MemoryRepository::new()),
            deleted_contacts: Arc::new(MemoryRepository::new()),
            expenses: Arc::new(MemoryRepository::new()),
            others: Arc::new(MemoryRepository::new()),
            enquiries: Arc::new(MemoryRepository::new()),
            layout_resources: Arc::new(MemoryRepository::new()),
            users: Arc::new(MemoryRepository::new()),
            reset_tokens: Arc::new(MemoryRepository::new()),
        }
    }

    pub fn mongo(db: &MongoDb) -> Self {
        Self {
            plots: Arc::new(MongoRepository::new(db)),
            brokers: Arc::new(MongoRepository::new(db)),
            bookings: Arc::new(MongoRepository::new(db)),
            invoices: Arc::new(MongoRepository::new(db)),
            deleted_contacts: Arc::new(MongoRepository::new(db)),
            expenses: Arc::new(MongoRepository::new(db)),
            others: Arc::new(MongoRepository::new(db)),
            enquiries: Arc::new(MongoRepository::new(db)),
            layout_resources: Arc::new(MongoRepository::new(db)),
            users: Arc::new(MongoRepository::new(db)),
            reset_tokens: Arc::new(MongoRepository::new(db)),
        }
    }
}

/// Reads a serialized field by dotted path.
pub(crate) fn field_at<'a>(
    value: &'a serde_json::Value,
    path: &str,
) -> Option<&'a serde_json::Value> {
    path.split('.').try_fold(value, |v, segment| v.get(segment))
}

pub(crate) fn matches_value(value: &serde_json::Value, expected: &FilterValue) -> bool {
    match expected {
        FilterValue::Str(s) => value.as_str() == Some(s.as_str()),
        FilterValue::Int(i) => value.as_i64() == Some(*i),
    }
}
