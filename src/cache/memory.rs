//! In-process string cache.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::cache::{CacheError, KeyValueCache};

#[derive(Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<DashMap<String, String>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    /// Load a JSON object of string values from disk.
    pub fn load_seed(&self, path: &Path) -> Result<usize, CacheError> {
        let seed_err = |reason: String| CacheError::Seed {
            path: path.display().to_string(),
            reason,
        };
        let file = File::open(path).map_err(|e| seed_err(e.to_string()))?;
        let map: HashMap<String, String> =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| seed_err(e.to_string()))?;
        let count = map.len();
        for (k, v) in map {
            self.entries.insert(k, v);
        }
        tracing::info!(count, "Loaded cache seed");
        Ok(count)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl KeyValueCache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }
}
