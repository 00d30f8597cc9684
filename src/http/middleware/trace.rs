//! Request tracing middleware.
//!
//! Outermost safety net of the pipeline. Every request runs inside a root
//! span named `Request: <path>`. A failure that escapes the handler, either
//! an [`UnhandledFailure`] response or a panic, is recorded on that span as
//! an exception, the span is marked errored, and the client gets the
//! generic 500 body. Nothing escapes past this layer. An inbound W3C
//! `traceparent` header makes the root span part of the caller's trace.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use futures_util::FutureExt;
use tracing::{Instrument, Span};

use crate::http::error::{internal_server_error, UnhandledFailure};
use crate::observability::{metrics, propagation, spans};
use crate::observability::SpanExt;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Metrics label for requests no route matched.
pub const UNMATCHED_ROUTE: &str = "unmatched";

pub async fn trace_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let path = request.uri().path().to_owned();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_owned();

    let span = spans::request_span(&method, &path, &request_id);
    span.record("http.route", route.as_str());
    propagation::continue_remote(&span, request.headers());

    async move {
        let response = run_guarded(request, next, &route).await;
        let status = response.status().as_u16();
        Span::current().record("http.status_code", status);
        metrics::record_request(&route, &method, status, start);
        response
    }
    .instrument(span)
    .await
}

async fn run_guarded(request: Request, next: Next, route: &str) -> Response {
    let failure = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => match response.extensions().get::<UnhandledFailure>() {
            Some(UnhandledFailure(message)) => message.clone(),
            None => return response,
        },
        Err(panic) => panic_message(panic.as_ref()),
    };

    let span = Span::current();
    span.record_exception(&failure);
    span.set_error();
    metrics::record_unhandled(route);
    internal_server_error()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
