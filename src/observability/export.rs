//! Span export through OpenTelemetry.
//!
//! # Data Flow
//! ```text
//! tracing spans of this crate
//!     → tracing-opentelemetry layer (otel.* fields → name, kind, status)
//!     → SDK tracer provider (resource: service.name)
//!     → OTLP/HTTP batch exporter and/or stdout exporter
//! ```
//!
//! # Design Decisions
//! - No provider is built when neither exporter is configured
//! - The OTLP endpoint is the collector base URL; the exporter appends `/v1/traces`
//! - The provider is flushed when the [`TelemetryGuard`] drops

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{self as sdktrace, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use thiserror::Error;
use tracing::{Level, Subscriber};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::config::schema::ObservabilityConfig;

/// Target prefix of every span and event this crate emits.
pub const CRATE_TARGET: &str = "traced_backend";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to build OTLP exporter for {endpoint}: {reason}")]
    Otlp { endpoint: String, reason: String },
}

/// Filter keeping only this crate's spans and events.
pub fn crate_spans() -> Targets {
    Targets::new().with_target(CRATE_TARGET, Level::TRACE)
}

fn service_resource(service_name: &str) -> Resource {
    Resource::new([KeyValue::new("service.name", service_name.to_string())])
}

/// Build the tracer provider described by `config`, or `None` when no
/// exporter is enabled. Must run inside the Tokio runtime.
pub fn tracer_provider(config: &ObservabilityConfig) -> Result<Option<TracerProvider>, ExportError> {
    if config.otlp_endpoint.is_none() && !config.console_spans {
        return Ok(None);
    }

    let mut builder = TracerProvider::builder().with_config(
        sdktrace::config().with_resource(service_resource(&config.service_name)),
    );

    if let Some(endpoint) = &config.otlp_endpoint {
        let http = opentelemetry_otlp::new_exporter()
            .http()
            .with_endpoint(endpoint.as_str());
        let exporter = opentelemetry_otlp::SpanExporterBuilder::from(http)
            .build_span_exporter()
            .map_err(|e| ExportError::Otlp {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
        builder = builder.with_batch_exporter(exporter, runtime::Tokio);
    }

    if config.console_spans {
        builder = builder.with_simple_exporter(opentelemetry_stdout::SpanExporter::default());
    }

    Ok(Some(builder.build()))
}

/// The `tracing` layer feeding `provider`, limited to this crate's spans.
pub fn span_layer<S>(provider: &TracerProvider) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_opentelemetry::layer()
        .with_tracer(provider.tracer(CRATE_TARGET))
        .with_filter(crate_spans())
}

/// Keeps the tracer provider alive and flushes it on drop.
#[must_use = "spans are only exported while the guard is alive"]
pub struct TelemetryGuard {
    provider: Option<TracerProvider>,
}

impl TelemetryGuard {
    pub fn new(provider: Option<TracerProvider>) -> Self {
        Self { provider }
    }

    pub fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        let Some(provider) = self.provider.take() else { return };
        for result in provider.force_flush() {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Failed to flush spans");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::Status;
    use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
    use tracing_subscriber::layer::SubscriberExt;

    use crate::observability::spans::{self, SpanExt};

    #[test]
    fn test_no_exporter_means_no_provider() {
        let config = ObservabilityConfig::default();
        assert!(tracer_provider(&config).unwrap().is_none());
        assert!(!TelemetryGuard::new(None).is_exporting());
    }

    #[test]
    fn test_console_provider_builds() {
        let config = ObservabilityConfig {
            service_name: "orders".into(),
            console_spans: true,
            ..ObservabilityConfig::default()
        };
        let provider = tracer_provider(&config).unwrap();
        assert!(TelemetryGuard::new(provider).is_exporting());
    }

    // The batch processor blocks on its worker task at shutdown.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_otlp_provider_builds_without_collector() {
        let config = ObservabilityConfig {
            otlp_endpoint: Some("http://127.0.0.1:4318".into()),
            ..ObservabilityConfig::default()
        };
        assert!(tracer_provider(&config).unwrap().is_some());
    }

    #[test]
    fn test_layer_maps_otel_fields() {
        let exporter = InMemorySpanExporter::default();
        let provider = TracerProvider::builder()
            .with_config(sdktrace::config().with_resource(service_resource("orders")))
            .with_simple_exporter(exporter.clone())
            .build();
        let subscriber = tracing_subscriber::registry().with(span_layer(&provider));

        tracing::subscriber::with_default(subscriber, || {
            let root = spans::request_span("GET", "/cache-data", "req-1");
            let _entered = root.enter();
            let child = spans::cache_query_span("cached_key");
            child.record_exception(&"connection reset");
            child.set_error();
        });

        provider.force_flush();
        let finished = exporter.get_finished_spans().unwrap();
        assert_eq!(finished.len(), 2);
        let child = finished.iter().find(|s| s.name == "Cache Query").unwrap();
        let root = finished.iter().find(|s| s.name == "Request: /cache-data").unwrap();

        assert_eq!(child.parent_span_id, root.span_context.span_id());
        assert!(matches!(child.status, Status::Error { .. }));
        assert!(child.events.iter().any(|e| e.name == "exception"));
        assert_eq!(root.status, Status::Unset);
        assert_eq!(root.span_kind, opentelemetry::trace::SpanKind::Server);
        assert!(root
            .resource
            .iter()
            .any(|(k, v)| k.as_str() == "service.name" && v.as_str() == "orders"));
    }
}
