//! Metrics collection and exposition.
//!
//! # Metrics
//! - `backend_requests_total` (counter): requests by route template, method, status
//! - `backend_request_duration_seconds` (histogram): latency by route template
//! - `backend_unhandled_failures_total` (counter): failures caught by the middleware
//! - `backend_downstream_calls_total` (counter): downstream calls by outcome
//! - `backend_open_spans` (gauge): spans created and not yet closed
//!
//! Without an installed recorder every call here is a no-op, which is what
//! tests rely on.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, method: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "backend_requests_total",
        "route" => route.to_owned(),
        "method" => method.to_owned(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("backend_request_duration_seconds", "route" => route.to_owned())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_unhandled(route: &str) {
    ::metrics::counter!("backend_unhandled_failures_total", "route" => route.to_owned()).increment(1);
}

pub fn record_downstream(outcome: &'static str) {
    ::metrics::counter!("backend_downstream_calls_total", "outcome" => outcome).increment(1);
}

pub fn record_open_spans(open: usize) {
    ::metrics::gauge!("backend_open_spans").set(open as f64);
}
