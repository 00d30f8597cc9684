//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with every route handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve on a bound listener until shutdown

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::cache::KeyValueCache;
use crate::config::AppConfig;
use crate::downstream::Downstream;
use crate::http::handlers;
use crate::http::middleware::trace_requests;
use crate::redaction::Redactor;
use crate::store::DocumentStore;

/// Per-route settings resolved from configuration once at startup.
#[derive(Debug, Clone)]
pub struct RouteSettings {
    pub collection: String,
    pub cache_key: String,
    pub downstream_url: String,
    pub downstream_timeout: Duration,
}

impl RouteSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            collection: config.store.collection.clone(),
            cache_key: config.cache.key.clone(),
            downstream_url: config.downstream.url(),
            downstream_timeout: config.downstream.timeout(),
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub cache: Arc<dyn KeyValueCache>,
    pub downstream: Arc<dyn Downstream>,
    pub redactor: Arc<Redactor>,
    pub routes: Arc<RouteSettings>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: Arc<dyn KeyValueCache>,
        downstream: Arc<dyn Downstream>,
        redactor: Arc<Redactor>,
        routes: RouteSettings,
    ) -> Self {
        Self {
            store,
            cache,
            downstream,
            redactor,
            routes: Arc::new(routes),
        }
    }
}

/// Build the router with all middleware layers.
///
/// Layer order, outermost first: request ID assignment and propagation,
/// the tracing middleware, then the request timeout. A timeout therefore
/// still passes through the root span. Timeouts, unknown paths and
/// unsupported methods all answer with the error envelope.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(handlers::liveness))
        .route("/mongo-data", get(handlers::list_records))
        .route("/mongo-data/{id}", get(handlers::fetch_record))
        .route("/cache-data", get(handlers::fetch_cache_value))
        .route("/mongo-cache-data", get(handlers::fetch_combined))
        .route("/external-api", get(handlers::external_api))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handlers::request_layer_error))
                .timeout(request_timeout),
        )
        .layer(middleware::from_fn(trace_requests))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

pub struct HttpServer {
    router: Router,
    service_name: String,
}

impl HttpServer {
    pub fn new(config: &AppConfig, state: AppState) -> Self {
        let timeout = Duration::from_secs(config.timeouts.request_secs);
        Self {
            router: build_router(state, timeout),
            service_name: config.observability.service_name.clone(),
        }
    }

    /// Run the server until `shutdown` resolves, then drain in-flight
    /// requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service = %self.service_name,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
