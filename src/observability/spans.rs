//! Span conventions.
//!
//! Spans use the field names `tracing-opentelemetry` maps onto OpenTelemetry
//! span data:
//! - `otel.name` carries the display name (span names are static in `tracing`)
//! - `otel.kind` is the span kind
//! - `otel.status_code` is `OK` or `ERROR`; absent means unset
//! - `otel.status_message` is the error description
//! - an event carrying `exception.message` is a recorded exception
//!
//! Every span is created here so field sets stay consistent. Fields that
//! are filled in later must be declared up front as `Empty`.

use std::fmt::Display;

use tracing::field::Empty;
use tracing::{info_span, Span};

pub const STATUS_FIELD: &str = "otel.status_code";
pub const STATUS_DESCRIPTION_FIELD: &str = "otel.status_message";
pub const EXCEPTION_FIELD: &str = "exception.message";

pub const STATUS_OK: &str = "OK";
pub const STATUS_ERROR: &str = "ERROR";

pub const STORE_QUERY_SPAN: &str = "Store Query";
pub const STORE_LIST_SPAN: &str = "Store List";
pub const CACHE_QUERY_SPAN: &str = "Cache Query";

/// Extension trait for status and exception bookkeeping.
pub trait SpanExt {
    /// Emit an exception event on this span. The event doubles as the
    /// error-level log line.
    fn record_exception(&self, err: &dyn Display);

    fn set_error(&self);

    fn set_ok(&self);
}

impl SpanExt for Span {
    fn record_exception(&self, err: &dyn Display) {
        tracing::error!(parent: self, exception.message = %err, "exception");
    }

    fn set_error(&self) {
        self.record(STATUS_FIELD, STATUS_ERROR);
    }

    fn set_ok(&self) {
        self.record(STATUS_FIELD, STATUS_OK);
    }
}

/// Display name of the root span for `path`.
pub fn request_span_name(path: &str) -> String {
    format!("Request: {}", path)
}

/// Root span wrapping one inbound request.
pub fn request_span(method: &str, path: &str, request_id: &str) -> Span {
    info_span!(
        "request",
        otel.name = %request_span_name(path),
        otel.kind = "server",
        otel.status_code = Empty,
        http.method = %method,
        http.target = %path,
        http.route = Empty,
        http.status_code = Empty,
        request_id = %request_id,
    )
}

pub fn store_query_span(collection: &str, raw_id: &str) -> Span {
    info_span!(
        "store_query",
        otel.name = STORE_QUERY_SPAN,
        otel.status_code = Empty,
        db.collection = %collection,
        record.id = %raw_id,
        record.native_id = Empty,
    )
}

pub fn store_list_span(collection: &str) -> Span {
    info_span!(
        "store_list",
        otel.name = STORE_LIST_SPAN,
        otel.status_code = Empty,
        db.collection = %collection,
        db.returned = Empty,
    )
}

pub fn cache_query_span(key: &str) -> Span {
    info_span!(
        "cache_query",
        otel.name = CACHE_QUERY_SPAN,
        otel.status_code = Empty,
        cache.key = %key,
        cache.redacted_value = Empty,
    )
}

/// Client span around one downstream HTTP call.
pub fn downstream_span(url: &str) -> Span {
    info_span!(
        "downstream_call",
        otel.name = %format!("GET {}", url),
        otel.kind = "client",
        otel.status_code = Empty,
        otel.status_message = Empty,
        http.url = %url,
        http.status_code = Empty,
    )
}
