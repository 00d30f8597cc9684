//! Startup orchestration.
//!
//! Builds every dependency client from a validated [`AppConfig`], picking
//! the store and cache backends the configuration names. Seed files of the
//! in-memory backends are loaded before the listener is bound, so a bad
//! seed fails the process instead of the first request.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::cache::{CacheError, InMemoryCache, KeyValueCache, RedisCache};
use crate::config::schema::{CacheBackend, CacheConfig, StoreBackend, StoreConfig};
use crate::config::AppConfig;
use crate::downstream::{DownstreamError, HttpDownstream};
use crate::http::{AppState, RouteSettings};
use crate::redaction::Redactor;
use crate::store::{DocumentStore, InMemoryStore, MongoStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("cache: {0}")]
    Cache(#[from] CacheError),

    #[error("downstream client: {0}")]
    Downstream(#[from] DownstreamError),

    #[error("redaction patterns: {0}")]
    Redactor(#[from] regex::Error),
}

async fn build_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match config.backend {
        StoreBackend::Mongodb => Ok(Arc::new(MongoStore::connect(config).await?)),
        StoreBackend::Memory => {
            let store = InMemoryStore::new();
            if let Some(path) = &config.seed_path {
                store.load_seed(&config.collection, Path::new(path))?;
            }
            Ok(Arc::new(store))
        }
    }
}

fn build_cache(config: &CacheConfig) -> Result<Arc<dyn KeyValueCache>, CacheError> {
    match config.backend {
        CacheBackend::Redis => Ok(Arc::new(RedisCache::open(config)?)),
        CacheBackend::Memory => {
            let cache = InMemoryCache::new();
            if let Some(path) = &config.seed_path {
                cache.load_seed(Path::new(path))?;
            }
            Ok(Arc::new(cache))
        }
    }
}

pub async fn bootstrap(config: &AppConfig) -> Result<AppState, StartupError> {
    let store = build_store(&config.store).await?;
    let cache = build_cache(&config.cache)?;
    let downstream = HttpDownstream::new()?;
    let redactor = Redactor::new()?;
    let routes = RouteSettings::from_config(config);

    tracing::info!(
        store = ?config.store.backend,
        cache = ?config.cache.backend,
        collection = %routes.collection,
        cache_key = %routes.cache_key,
        downstream_url = %routes.downstream_url,
        downstream_timeout_ms = routes.downstream_timeout.as_millis() as u64,
        "Dependencies ready"
    );

    Ok(AppState::new(
        store,
        cache,
        Arc::new(downstream),
        Arc::new(redactor),
        routes,
    ))
}
