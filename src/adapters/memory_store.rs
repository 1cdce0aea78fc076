//! In-memory document store backed by `DashMap`, one map per collection.
//!
//! Used for tests and for sessions that do not need persistence.

use crate::domain::ports::{Collection, DocumentStore};
use crate::utils::error::{DesignerError, Result};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<Collection, DashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let collections = DashMap::new();
        for collection in Collection::ALL {
            collections.insert(collection, DashMap::new());
        }
        Self { collections }
    }

    /// Number of documents per collection.
    pub fn stats(&self) -> Vec<(Collection, usize)> {
        let mut stats: Vec<(Collection, usize)> = self
            .collections
            .iter()
            .map(|entry| (*entry.key(), entry.value().len()))
            .collect();
        stats.sort();
        stats
    }

    fn with_collection<T>(
        &self,
        collection: Collection,
        f: impl FnOnce(&DashMap<String, Value>) -> T,
    ) -> T {
        if let Some(documents) = self.collections.get(&collection) {
            return f(documents.value());
        }
        let documents = self.collections.entry(collection).or_default();
        f(documents.value())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: Collection, id: &str, document: Value) -> Result<()> {
        self.with_collection(collection, |documents| match documents.entry(id.to_string()) {
            Entry::Occupied(_) => Err(DesignerError::storage(format!(
                "duplicate id {} in {}",
                id, collection
            ))),
            Entry::Vacant(slot) => {
                slot.insert(document);
                Ok(())
            }
        })
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        Ok(self.with_collection(collection, |documents| {
            documents.get(id).map(|doc| doc.value().clone())
        }))
    }

    async fn replace(&self, collection: Collection, id: &str, document: Value) -> Result<bool> {
        Ok(self.with_collection(collection, |documents| {
            match documents.get_mut(id) {
                Some(mut existing) => {
                    *existing = document;
                    true
                }
                None => false,
            }
        }))
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool> {
        Ok(self.with_collection(collection, |documents| documents.remove(id).is_some()))
    }

    async fn list(&self, collection: Collection) -> Result<Vec<(String, Value)>> {
        let mut all: Vec<(String, Value)> = self.with_collection(collection, |documents| {
            documents
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect()
        });
        all.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(all)
    }

    async fn clear(&self, collection: Collection) -> Result<usize> {
        Ok(self.with_collection(collection, |documents| {
            let count = documents.len();
            documents.clear();
            count
        }))
    }
}
