//! Redis-backed cache.
//!
//! One multiplexed connection is shared by every request. It is opened on
//! first use and dropped after an I/O failure, so the next call reconnects.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};
use tokio::sync::Mutex;

use crate::cache::{CacheError, KeyValueCache};
use crate::config::schema::{CacheConfig, TlsConfig};

pub struct RedisCache {
    client: Client,
    conn: Mutex<Option<MultiplexedConnection>>,
}

impl RedisCache {
    pub fn open(config: &CacheConfig) -> Result<Self, CacheError> {
        let url = connection_url(&config.url, &config.tls)?;
        let client = Client::open(url.as_str()).map_err(classify)?;
        tracing::info!(tls = url.starts_with("rediss://"), "Cache client ready");
        Ok(Self {
            client,
            conn: Mutex::new(None),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        let mut slot = self.conn.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(classify)?;
        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn reset(&self) {
        self.conn.lock().await.take();
    }
}

/// Resolve the server URL for `tls`. TLS switches `redis://` to
/// `rediss://`; accepting invalid certificates adds the `#insecure` marker.
pub fn connection_url(raw: &str, tls: &TlsConfig) -> Result<String, CacheError> {
    let mut url = url::Url::parse(raw).map_err(|e| CacheError::Config(format!("{}: {}", raw, e)))?;
    if tls.enabled && url.scheme() == "redis" {
        url.set_scheme("rediss")
            .map_err(|_| CacheError::Config(format!("{}: cannot switch to rediss", raw)))?;
    }
    if url.scheme() == "rediss" && tls.allow_invalid_certificates {
        url.set_fragment(Some("insecure"));
    }
    Ok(url.to_string())
}

fn classify(err: RedisError) -> CacheError {
    if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() || err.is_timeout() {
        CacheError::Unavailable(err.to_string())
    } else {
        CacheError::Command(err.to_string())
    }
}

#[async_trait]
impl KeyValueCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        let result: Result<Option<String>, RedisError> = conn.get(key).await;
        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                let err = classify(err);
                if matches!(err, CacheError::Unavailable(_)) {
                    self.reset().await;
                }
                Err(err)
            }
        }
    }
}
