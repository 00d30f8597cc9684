//! Key-value cache client.
//!
//! The cache holds plain string values. There is no TTL or eviction logic
//! here; a key is either present or absent. [`RedisCache`] talks to a
//! server, [`InMemoryCache`] serves local runs and tests.

pub mod memory;
pub mod redis_cache;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::{Classify, ErrorKind};

pub use memory::InMemoryCache;
pub use redis_cache::RedisCache;

/// Errors that can occur while talking to the cache.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("cache command failed: {0}")]
    Command(String),

    #[error("failed to load seed '{path}': {reason}")]
    Seed { path: String, reason: String },

    #[error("invalid cache configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Unclassified(String),
}

impl Classify for CacheError {
    fn kind(&self) -> ErrorKind {
        match self {
            CacheError::Unavailable(_) => ErrorKind::Unreachable,
            CacheError::Command(_) | CacheError::Seed { .. } | CacheError::Config(_) => {
                ErrorKind::Dependency
            }
            CacheError::Unclassified(_) => ErrorKind::Unclassified,
        }
    }
}

#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Value stored under `key`, or `None` if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
}
