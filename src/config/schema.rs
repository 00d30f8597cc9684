//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Document store settings.
    pub store: StoreConfig,

    /// Cache settings.
    pub cache: CacheConfig,

    /// Downstream peer settings.
    pub downstream: DownstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Which document store implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Mongodb,
    Memory,
}

/// Which cache implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Redis,
    Memory,
}

/// TLS settings for a networked data client.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Connect over TLS.
    pub enabled: bool,

    /// Accept any server certificate. Only for managed services with
    /// self-signed certificates.
    pub allow_invalid_certificates: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Connection string (e.g., "mongodb://localhost:27017").
    pub uri: String,

    /// Database holding the collection.
    pub database: String,

    /// Collection queried by the record routes.
    pub collection: String,

    pub tls: TlsConfig,

    /// JSON array of documents loaded at startup (memory backend).
    pub seed_path: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Mongodb,
            uri: "mongodb://localhost:27017".to_string(),
            database: "mydatabase".to_string(),
            collection: "collection".to_string(),
            tls: TlsConfig::default(),
            seed_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,

    /// Server URL; credentials go in the URL (e.g., "redis://:secret@host:6379").
    pub url: String,

    pub tls: TlsConfig,

    /// The single key read by the cache routes.
    pub key: String,

    /// JSON object of string values loaded at startup (memory backend).
    pub seed_path: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            url: "redis://localhost:6379".to_string(),
            tls: TlsConfig::default(),
            key: "cached_key".to_string(),
            seed_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Base URL of the peer (scheme, host, port).
    pub base_url: String,

    /// Path requested on the peer.
    pub path: String,

    /// Per-call deadline in milliseconds.
    pub timeout_ms: u64,
}

impl DownstreamConfig {
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://0.0.0.0:8001".to_string(),
            path: "/external-api".to_string(),
            timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `service.name` resource attribute of exported spans.
    pub service_name: String,

    /// Log filter directive (e.g. "info", "traced_backend=debug").
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// OTLP/HTTP collector base URL (e.g., "http://tempo:4318"). Span
    /// export over OTLP is off when unset.
    pub otlp_endpoint: Option<String>,

    /// Print finished spans to stdout.
    pub console_spans: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "traced-backend".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            otlp_endpoint: None,
            console_spans: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
