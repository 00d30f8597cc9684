//! HTTP error responses.
//!
//! Every classified failure renders the same envelope:
//! `{"status_code": <u16>, "detail": "<message>"}`. Unhandled failures
//! render a fixed body with no internal detail and carry an
//! [`UnhandledFailure`] marker so the tracing middleware can record them.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Body of every classified failure response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    pub status_code: u16,
    pub detail: String,
}

/// Response extension marking a failure no handler classified.
#[derive(Debug, Clone)]
pub struct UnhandledFailure(pub String);

/// The generic 500 returned for unhandled failures.
pub fn internal_server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": "Internal Server Error"})),
    )
        .into_response()
}

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The requested key legitimately does not exist.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// The path exists but not for this method.
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// The request ran past the configured request timeout.
    #[error("Request Timeout")]
    Timeout,

    /// A downstream status passed through to the caller.
    #[error("{detail}")]
    Upstream { status: StatusCode, detail: String },

    #[error("{0}")]
    Internal(String),

    /// Not attributable to any dependency; handled by the middleware.
    #[error("unhandled failure: {0}")]
    Unhandled(String),
}

impl ApiError {
    /// Build the variant matching `status`.
    pub fn for_status(status: StatusCode, detail: String) -> Self {
        match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(detail),
            StatusCode::BAD_REQUEST => ApiError::BadRequest(detail),
            StatusCode::INTERNAL_SERVER_ERROR => ApiError::Internal(detail),
            status => ApiError::Upstream { status, detail },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Internal(_) | ApiError::Unhandled(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Unhandled(message) = self {
            let mut response = internal_server_error();
            response.extensions_mut().insert(UnhandledFailure(message));
            return response;
        }
        let status = self.status_code();
        let body = ErrorEnvelope {
            status_code: status.as_u16(),
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
