//! Route handlers.
//!
//! Handlers map classified dependency failures to error envelopes
//! themselves and record them on the span that was current when the
//! failure happened. Unclassified failures are returned as
//! [`ApiError::Unhandled`] without being recorded, and the tracing
//! middleware records them on the root span.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{BoxError, Json};
use serde_json::{json, Value};
use tracing::{Instrument, Span};

use crate::downstream::DownstreamError;
use crate::error::{Classify, ErrorKind};
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::spans;
use crate::observability::SpanExt;
use crate::store::record::ID_FIELD;
use crate::store::{Projection, RecordId};

pub const LIVENESS_MESSAGE: &str = "Hello from traced-backend";
pub const DATA_NOT_FOUND: &str = "Data not found";
pub const CACHE_KEY_NOT_FOUND: &str = "Cache key not found";
pub const CACHE_PLACEHOLDER: &str = "No cache data found";

pub async fn liveness() -> Json<Value> {
    Json(json!({ "message": LIVENESS_MESSAGE }))
}

/// `GET /mongo-data`
///
/// Every document of the collection with the identifier projected away.
pub async fn list_records(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let collection = state.routes.collection.clone();
    let span = spans::store_list_span(&collection);

    async move {
        let records = state
            .store
            .find(&collection, &Projection::excluding([ID_FIELD]))
            .await
            .map_err(|e| dependency_failure(e, "Store Fetch Error"))?;
        Span::current().record("db.returned", records.len() as u64);
        Ok(Json(json!({ "mongo_data": records })))
    }
    .instrument(span)
    .await
}

/// `GET /mongo-data/{id}`
pub async fn fetch_record(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = id.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let collection = state.routes.collection.clone();
    let span = spans::store_query_span(&collection, &id);

    async move {
        let record_id = RecordId::parse(&id);
        Span::current().record("record.native_id", record_id.is_native());

        match state.store.find_one(&collection, &record_id).await {
            Ok(Some(record)) => Ok(Json(json!({ "success": true, "data": record }))),
            Ok(None) => Ok(Json(json!({ "success": false, "message": DATA_NOT_FOUND }))),
            Err(err) => Err(dependency_failure(err, "Store Fetch Error")),
        }
    }
    .instrument(span)
    .await
}

/// `GET /cache-data`
///
/// The raw value goes back to the caller; only the span attribute carries
/// the redacted copy.
pub async fn fetch_cache_value(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let key = state.routes.cache_key.clone();
    let span = spans::cache_query_span(&key);

    async move {
        match state.cache.get(&key).await {
            Ok(Some(value)) => {
                tracing::info!("Cache hit");
                let redacted = state.redactor.redact(&value);
                Span::current().record("cache.redacted_value", &*redacted);
                Ok(Json(json!({ "cache_data": value })))
            }
            Ok(None) => {
                let span = Span::current();
                span.set_error();
                tracing::warn!("Cache key not found");
                Err(ApiError::NotFound(CACHE_KEY_NOT_FOUND.to_string()))
            }
            Err(err) => Err(dependency_failure(err, "Cache Fetch Error")),
        }
    }
    .instrument(span)
    .await
}

/// `GET /mongo-cache-data`
///
/// Store, then cache, then downstream, strictly in that order. Any
/// classified failure aborts the whole request with one coarse 500.
pub async fn fetch_combined(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let routes = &state.routes;
    let prefix = "Store/Cache Fetch Error";

    let records = state
        .store
        .find(&routes.collection, &Projection::excluding([ID_FIELD]))
        .await
        .map_err(|e| dependency_failure(e, prefix))?;

    let cache_data = state
        .cache
        .get(&routes.cache_key)
        .await
        .map_err(|e| dependency_failure(e, prefix))?
        .unwrap_or_else(|| CACHE_PLACEHOLDER.to_string());

    let api_data = state
        .downstream
        .get(&routes.downstream_url, routes.downstream_timeout)
        .await
        .map_err(|e| dependency_failure(e, prefix))?
        .body;

    Ok(Json(json!({
        "mongo_data": records,
        "cache_data": cache_data,
        "api_data": api_data,
    })))
}

/// `GET /external-api`
pub async fn external_api(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let routes = &state.routes;
    match state
        .downstream
        .get(&routes.downstream_url, routes.downstream_timeout)
        .await
    {
        Ok(response) => Ok(Json(response.body)),
        Err(err) => Err(passthrough_failure(err)),
    }
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not Found".to_string())
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Error handler for the request timeout layer.
pub async fn request_layer_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("Request timed out");
        ApiError::Timeout
    } else {
        ApiError::Unhandled(err.to_string())
    }
}

/// How the passthrough route answers a classified downstream failure.
/// `None` means the failure escapes to the middleware.
pub fn passthrough_mapping(kind: ErrorKind) -> Option<(StatusCode, &'static str)> {
    match kind {
        ErrorKind::UpstreamStatus(code) => Some((
            StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY),
            "External API Error",
        )),
        ErrorKind::Timeout | ErrorKind::Unreachable => {
            Some((StatusCode::BAD_REQUEST, "External API Request Failed"))
        }
        ErrorKind::Dependency => Some((StatusCode::INTERNAL_SERVER_ERROR, "Unexpected Error")),
        ErrorKind::Unclassified => None,
    }
}

fn passthrough_failure(err: DownstreamError) -> ApiError {
    let Some((status, prefix)) = passthrough_mapping(err.kind()) else {
        return ApiError::Unhandled(err.to_string());
    };
    record_on_current(&err);
    ApiError::for_status(status, format!("{}: {}", prefix, err))
}

/// Map a store or cache failure to a 500 envelope with `prefix`.
fn dependency_failure<E: Classify>(err: E, prefix: &str) -> ApiError {
    if !err.kind().is_classified() {
        return ApiError::Unhandled(err.to_string());
    }
    record_on_current(&err);
    ApiError::Internal(format!("{}: {}", prefix, err))
}

fn record_on_current<E: Classify>(err: &E) {
    let span = Span::current();
    span.record_exception(err);
    span.set_error();
}
