//! Subscriber initialization.
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` wins over the configured level
//! - The log filter only applies to the fmt layer; span export and the
//!   open-span count see every span of this crate whatever the log level

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::schema::{LogFormat, ObservabilityConfig};
use crate::observability::export::{self, ExportError, TelemetryGuard};
use crate::observability::open_spans::OpenSpans;

#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("failed to install subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Install the global subscriber. Keep the returned guard alive for as long
/// as spans should be exported.
pub fn init(config: &ObservabilityConfig) -> Result<TelemetryGuard, InitError> {
    let filter = env_filter(config);
    let (pretty, json) = match config.log_format {
        LogFormat::Pretty => (Some(fmt::layer().with_filter(filter)), None),
        LogFormat::Json => (None, Some(fmt::layer().json().with_filter(filter))),
    };

    let provider = export::tracer_provider(config)?;
    let spans = provider.as_ref().map(|p| export::span_layer(p));

    tracing_subscriber::registry()
        .with(pretty)
        .with(json)
        .with(spans)
        .with(OpenSpans::new().with_filter(export::crate_spans()))
        .try_init()?;

    Ok(TelemetryGuard::new(provider))
}
