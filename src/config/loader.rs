//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_BIND_ADDRESS: &str = "TRACED_BACKEND_BIND_ADDRESS";
pub const ENV_DOWNSTREAM_URL: &str = "TRACED_BACKEND_DOWNSTREAM_URL";
pub const ENV_LOG_LEVEL: &str = "TRACED_BACKEND_LOG_LEVEL";
pub const ENV_STORE_URI: &str = "TRACED_BACKEND_STORE_URI";
pub const ENV_CACHE_URL: &str = "TRACED_BACKEND_CACHE_URL";
pub const ENV_OTLP_ENDPOINT: &str = "TRACED_BACKEND_OTLP_ENDPOINT";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a TOML document without validating it.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::Parse)
}

/// Overlay values found through `lookup` (normally the process environment).
pub fn apply_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(addr) = lookup(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
    if let Some(url) = lookup(ENV_DOWNSTREAM_URL) {
        config.downstream.base_url = url;
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.observability.log_level = level;
    }
    if let Some(uri) = lookup(ENV_STORE_URI) {
        config.store.uri = uri;
    }
    if let Some(url) = lookup(ENV_CACHE_URL) {
        config.cache.url = url;
    }
    if let Some(endpoint) = lookup(ENV_OTLP_ENDPOINT) {
        config.observability.otlp_endpoint = Some(endpoint);
    }
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            parse_config(&content)?
        }
        None => AppConfig::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
