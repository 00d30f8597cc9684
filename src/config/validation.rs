//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, URLs and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{AppConfig, CacheBackend, StoreBackend};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("downstream.base_url: {0}")]
    InvalidUrl(String),

    #[error("downstream.path must start with '/', got '{0}'")]
    InvalidPath(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("downstream.timeout_ms ({downstream_ms}) must be shorter than timeouts.request_secs ({request_ms} ms)")]
    TimeoutOrder { request_ms: u64, downstream_ms: u64 },

    #[error("{field}: {reason}")]
    InvalidEndpoint { field: &'static str, reason: String },
}

/// Check that `value` parses as a URL with one of `schemes`.
fn check_url(field: &'static str, value: &str, schemes: &[&str], errors: &mut Vec<ValidationError>) {
    match url::Url::parse(value) {
        Ok(url) if schemes.contains(&url.scheme()) => {}
        Ok(url) => errors.push(ValidationError::InvalidEndpoint {
            field,
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidEndpoint {
            field,
            reason: e.to_string(),
        }),
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    match url::Url::parse(&config.downstream.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            url.scheme()
        ))),
        Err(e) => errors.push(ValidationError::InvalidUrl(e.to_string())),
    }

    if !config.downstream.path.starts_with('/') {
        errors.push(ValidationError::InvalidPath(config.downstream.path.clone()));
    }

    if config.downstream.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("downstream.timeout_ms"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }
    let request_ms = config.timeouts.request_secs.saturating_mul(1000);
    if config.downstream.timeout_ms > 0 && request_ms > 0 && request_ms <= config.downstream.timeout_ms {
        errors.push(ValidationError::TimeoutOrder {
            request_ms,
            downstream_ms: config.downstream.timeout_ms,
        });
    }

    if config.store.backend == StoreBackend::Mongodb {
        check_url("store.uri", &config.store.uri, &["mongodb", "mongodb+srv"], &mut errors);
        if config.store.database.trim().is_empty() {
            errors.push(ValidationError::Empty("store.database"));
        }
    }
    if config.cache.backend == CacheBackend::Redis {
        check_url("cache.url", &config.cache.url, &["redis", "rediss"], &mut errors);
    }
    if let Some(endpoint) = &config.observability.otlp_endpoint {
        check_url("observability.otlp_endpoint", endpoint, &["http", "https"], &mut errors);
    }

    if config.store.collection.trim().is_empty() {
        errors.push(ValidationError::Empty("store.collection"));
    }
    if config.cache.key.is_empty() {
        errors.push(ValidationError::Empty("cache.key"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
