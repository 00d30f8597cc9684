//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! middleware / handlers / clients produce:
//!     → spans.rs (span constructors, status + exception conventions)
//!     → log events (tracing macros)
//!     → metrics.rs (counters, histograms, gauge)
//!
//! Consumers:
//!     → logging.rs (fmt layer, pretty or JSON)
//!     → export.rs (tracing-opentelemetry → OTLP collector and/or stdout)
//!     → open_spans.rs (live span count)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows into the root span of every request
//! - Trace context is continued from inbound headers and passed to the downstream peer
//! - Metrics are cheap (atomic increments) and a no-op when disabled

pub mod export;
pub mod logging;
pub mod metrics;
pub mod open_spans;
pub mod propagation;
pub mod spans;

pub use export::{span_layer, TelemetryGuard};
pub use open_spans::OpenSpans;
pub use spans::SpanExt;
