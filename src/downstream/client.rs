//! HTTP downstream client.
//!
//! # Responsibilities
//! - Issue GET requests to the configured peer with a per-call deadline
//! - Require a 2xx status and a JSON body
//! - Classify failures (timeout, unreachable, status, decode)
//! - Open a client span per call and pass its trace context to the peer
//!
//! Idle connections are not pooled, so every call runs on its own
//! short-lived connection. Nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::Instrument;

use crate::downstream::types::{DownstreamError, DownstreamResponse};
use crate::downstream::Downstream;
use crate::observability::spans::{self, STATUS_DESCRIPTION_FIELD};
use crate::observability::{metrics, propagation};
use crate::observability::SpanExt;

/// `reqwest`-backed downstream client.
#[derive(Clone)]
pub struct HttpDownstream {
    http: reqwest::Client,
}

impl HttpDownstream {
    pub fn new() -> Result<Self, DownstreamError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()
            .map_err(|e| DownstreamError::Unclassified(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<DownstreamResponse, DownstreamError> {
        let after_ms = timeout.as_millis() as u64;
        let response = self
            .http
            .get(url)
            .headers(propagation::current_headers())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| DownstreamError::from_transport(url, after_ms, e))?;

        let status = response.status();
        tracing::Span::current().record("http.status_code", status.as_u16());

        if !status.is_success() {
            return Err(DownstreamError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DownstreamError::from_transport(url, after_ms, e))?;
        let body: Value = serde_json::from_slice(&bytes).map_err(|e| DownstreamError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(DownstreamResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Downstream for HttpDownstream {
    async fn get(&self, url: &str, timeout: Duration) -> Result<DownstreamResponse, DownstreamError> {
        let span = spans::downstream_span(url);
        async move {
            let result = self.fetch(url, timeout).await;
            let span = tracing::Span::current();
            match &result {
                Ok(_) => {
                    span.set_ok();
                    metrics::record_downstream("ok");
                }
                Err(e) => {
                    span.set_error();
                    span.record(STATUS_DESCRIPTION_FIELD, e.to_string().as_str());
                    tracing::debug!(error = %e, "Downstream call failed");
                    metrics::record_downstream(e.outcome());
                }
            }
            result
        }
        .instrument(span)
        .await
    }
}
