use super::repository::{field_at, matches_value, Filter, Repository, StoreError};
use crate::models::Entity;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};

struct Stored<T> {
    doc: Value,
    item: T,
}

/// In-process collection used by tests and `STORE_BACKEND=memory`.
/// Honours the same unique keys the MongoDB indexes enforce.
pub struct MemoryRepository<T> {
    items: Mutex<Vec<Stored<T>>>,
}

impl<T> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Stored<T>>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_unique(items: &[Stored<T>], doc: &Value, skip_id: &str) -> Result<(), StoreError> {
        for key in T::UNIQUE_KEYS {
            let wanted: Vec<Option<&Value>> = key.iter().map(|f| field_at(doc, f)).collect();
            if wanted.iter().any(|v| v.map_or(true, Value::is_null)) {
                continue;
            }
            let taken = items
                .iter()
                .filter(|s| s.item.id() != skip_id)
                .any(|s| key.iter().zip(&wanted).all(|(f, w)| field_at(&s.doc, f) == *w));
            if taken {
                return Err(StoreError::Duplicate {
                    collection: T::COLLECTION,
                    detail: key.join(", "),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for MemoryRepository<T> {
    async fn insert(&self, item: &T) -> Result<(), StoreError> {
        let doc = serde_json::to_value(item)?;
        let mut items = self.lock();
        if items.iter().any(|s| s.item.id() == item.id()) {
            return Err(StoreError::Duplicate {
                collection: T::COLLECTION,
                detail: "_id".to_string(),
            });
        }
        Self::check_unique(&items, &doc, item.id())?;
        items.push(Stored {
            doc,
            item: item.clone(),
        });
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        Ok(self
            .lock()
            .iter()
            .find(|s| s.item.id() == id)
            .map(|s| s.item.clone()))
    }

    async fn find(&self, filter: Filter) -> Result<Vec<T>, StoreError> {
        Ok(self
            .lock()
            .iter()
            .filter(|s| {
                filter.clauses().iter().all(|(field, expected)| {
                    field_at(&s.doc, field).is_some_and(|v| matches_value(v, expected))
                })
            })
            .map(|s| s.item.clone())
            .collect())
    }

    async fn replace(&self, item: &T, expected_version: Option<i64>) -> Result<bool, StoreError> {
        let doc = serde_json::to_value(item)?;
        let mut items = self.lock();
        let Some(index) = items.iter().position(|s| s.item.id() == item.id()) else {
            return Ok(false);
        };
        if let Some(expected) = expected_version {
            if items[index].doc.get("version").and_then(Value::as_i64) != Some(expected) {
                return Ok(false);
            }
        }
        Self::check_unique(&items, &doc, item.id())?;
        items[index] = Stored {
            doc,
            item: item.clone(),
        };
        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut items = self.lock();
        let before = items.len();
        items.retain(|s| s.item.id() != id);
        Ok(items.len() != before)
    }
}
