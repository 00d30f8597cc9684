//! In-process document store.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::store::{DocumentStore, Projection, Record, RecordId, StoreError};

/// A thread-safe collection map. Documents keep their insertion order.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<DashMap<String, Vec<Record>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any record with the same identifier.
    pub fn insert(&self, collection: &str, record: Record) {
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        let id = record.id().cloned();
        match docs.iter().position(|r| r.id() == id.as_ref()) {
            Some(pos) => docs[pos] = record,
            None => docs.push(record),
        }
    }

    /// Insert raw JSON documents into `collection`.
    pub fn insert_documents<I>(&self, collection: &str, docs: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut count = 0;
        for doc in docs {
            self.insert(collection, Record::from_document(doc)?);
            count += 1;
        }
        Ok(count)
    }

    /// Load a JSON array of documents from disk into `collection`.
    pub fn load_seed(&self, collection: &str, path: &Path) -> Result<usize, StoreError> {
        let seed_err = |reason: String| StoreError::Seed {
            path: path.display().to_string(),
            reason,
        };
        let file = File::open(path).map_err(|e| seed_err(e.to_string()))?;
        let value: Value =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| seed_err(e.to_string()))?;
        let Value::Array(docs) = value else {
            return Err(seed_err("expected a JSON array of documents".into()));
        };
        let count = self.insert_documents(collection, docs)?;
        tracing::info!(collection = %collection, count, "Loaded store seed");
        Ok(count)
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map(|d| d.len()).unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find_one(&self, collection: &str, id: &RecordId) -> Result<Option<Record>, StoreError> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|r| r.id() == Some(id)).cloned()))
    }

    async fn find(&self, collection: &str, projection: &Projection) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| docs.iter().map(|r| projection.apply(r)).collect())
            .unwrap_or_default())
    }
}
