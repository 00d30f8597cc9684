//! Downstream response and error definitions.

use serde_json::Value;
use thiserror::Error;

use crate::error::{Classify, ErrorKind};

/// A successful (2xx) downstream answer with its parsed JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct DownstreamResponse {
    pub status: u16,
    pub body: Value,
}

/// Errors that can occur during a downstream call.
#[derive(Debug, Clone, Error)]
pub enum DownstreamError {
    /// No answer before the deadline.
    #[error("request to {url} timed out after {after_ms} ms")]
    Timeout { url: String, after_ms: u64 },

    /// Connection refused, reset, DNS failure and the like.
    #[error("request to {url} failed: {reason}")]
    Unreachable { url: String, reason: String },

    /// The peer answered with a non-2xx status. The body is not read.
    #[error("server responded {status} for {url}")]
    Status { url: String, status: u16 },

    /// The peer answered 2xx but the body is not JSON.
    #[error("invalid response body from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// The request could not even be built.
    #[error("{0}")]
    Unclassified(String),
}

impl DownstreamError {
    /// Map a transport error from the HTTP client.
    pub fn from_transport(url: &str, after_ms: u64, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DownstreamError::Timeout {
                url: url.to_string(),
                after_ms,
            }
        } else if err.is_builder() {
            DownstreamError::Unclassified(format!("invalid request to {}: {}", url, err))
        } else if err.is_decode() {
            DownstreamError::Decode {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else {
            DownstreamError::Unreachable {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }

    /// Short label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            DownstreamError::Timeout { .. } => "timeout",
            DownstreamError::Unreachable { .. } => "unreachable",
            DownstreamError::Status { .. } => "status",
            DownstreamError::Decode { .. } => "decode",
            DownstreamError::Unclassified(_) => "unclassified",
        }
    }
}

impl Classify for DownstreamError {
    fn kind(&self) -> ErrorKind {
        match self {
            DownstreamError::Timeout { .. } => ErrorKind::Timeout,
            DownstreamError::Unreachable { .. } => ErrorKind::Unreachable,
            DownstreamError::Status { status, .. } => ErrorKind::UpstreamStatus(*status),
            DownstreamError::Decode { .. } => ErrorKind::Dependency,
            DownstreamError::Unclassified(_) => ErrorKind::Unclassified,
        }
    }
}
