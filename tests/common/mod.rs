//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use opentelemetry::trace::{SpanId, Status};
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use opentelemetry_sdk::trace::TracerProvider;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

use traced_backend::cache::{CacheError, InMemoryCache, KeyValueCache};
use traced_backend::downstream::HttpDownstream;
use traced_backend::http::{build_router, AppState, RouteSettings};
use traced_backend::observability::export::crate_spans;
use traced_backend::observability::spans::EXCEPTION_FIELD;
use traced_backend::observability::{span_layer, OpenSpans};
use traced_backend::redaction::Redactor;
use traced_backend::store::{DocumentStore, InMemoryStore, Projection, Record, RecordId, StoreError};

pub const COLLECTION: &str = "records";
pub const CACHE_KEY: &str = "cached_key";

/// Start a mock downstream that answers every request with `status` and a
/// JSON `body`.
pub async fn start_mock_backend(status: u16, body: &'static str) -> SocketAddr {
    start_programmable_backend(move || async move { (status, body.to_string()) }).await
}

/// Start a programmable mock downstream. The closure decides status and
/// body for each request and may sleep first.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let (status, body) = f().await;
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    502 => "502 Bad Gateway",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Mock downstream that sleeps `delay` before answering 200.
pub async fn start_slow_backend(delay: Duration) -> SocketAddr {
    start_programmable_backend(move || async move {
        tokio::time::sleep(delay).await;
        (200, r#"{"status":"late"}"#.to_string())
    })
    .await
}

/// Mock downstream answering 200 with `body` that keeps the head of every
/// request it receives.
pub async fn start_recording_backend(body: &'static str) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = seen.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let recorded = recorded.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                recorded
                    .lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&buf[..n]).to_lowercase());
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, seen)
}

/// An address nothing listens on.
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn downstream_url(addr: SocketAddr) -> String {
    format!("http://{}/external-api", addr)
}

/// Store whose every call fails with the given error.
pub struct FailingStore(pub StoreError);

#[async_trait]
impl DocumentStore for FailingStore {
    async fn find_one(&self, _: &str, _: &RecordId) -> Result<Option<Record>, StoreError> {
        Err(self.0.clone())
    }

    async fn find(&self, _: &str, _: &Projection) -> Result<Vec<Record>, StoreError> {
        Err(self.0.clone())
    }
}

/// Store that panics mid-request.
pub struct PanickingStore;

#[async_trait]
impl DocumentStore for PanickingStore {
    async fn find_one(&self, _: &str, _: &RecordId) -> Result<Option<Record>, StoreError> {
        panic!("store driver crashed")
    }

    async fn find(&self, _: &str, _: &Projection) -> Result<Vec<Record>, StoreError> {
        panic!("store driver crashed")
    }
}

pub struct FailingCache(pub CacheError);

#[async_trait]
impl KeyValueCache for FailingCache {
    async fn get(&self, _: &str) -> Result<Option<String>, CacheError> {
        Err(self.0.clone())
    }
}

pub fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store
        .insert_documents(
            COLLECTION,
            vec![
                serde_json::json!({"_id": {"$oid": "507f1f77bcf86cd799439011"}, "name": "alpha"}),
                serde_json::json!({"_id": "plain-key", "name": "beta"}),
            ],
        )
        .unwrap();
    store
}

pub fn cache_with(value: Option<&str>) -> InMemoryCache {
    let cache = InMemoryCache::new();
    if let Some(value) = value {
        cache.set(CACHE_KEY, value);
    }
    cache
}

pub struct TestApp {
    store: Arc<dyn DocumentStore>,
    cache: Arc<dyn KeyValueCache>,
    downstream_url: String,
    downstream_timeout: Duration,
    request_timeout: Duration,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            store: Arc::new(seeded_store()),
            cache: Arc::new(cache_with(Some("plain value"))),
            downstream_url: "http://127.0.0.1:9/external-api".to_string(),
            downstream_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn store(mut self, store: impl DocumentStore + 'static) -> Self {
        self.store = Arc::new(store);
        self
    }

    pub fn cache(mut self, cache: impl KeyValueCache + 'static) -> Self {
        self.cache = Arc::new(cache);
        self
    }

    pub fn downstream(mut self, addr: SocketAddr) -> Self {
        self.downstream_url = downstream_url(addr);
        self
    }

    /// Use `url` verbatim, even if it does not parse.
    pub fn raw_downstream_url(mut self, url: &str) -> Self {
        self.downstream_url = url.to_string();
        self
    }

    pub fn downstream_timeout(mut self, timeout: Duration) -> Self {
        self.downstream_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn state(&self) -> AppState {
        AppState::new(
            self.store.clone(),
            self.cache.clone(),
            Arc::new(HttpDownstream::new().unwrap()),
            Arc::new(Redactor::new().unwrap()),
            RouteSettings {
                collection: COLLECTION.to_string(),
                cache_key: CACHE_KEY.to_string(),
                downstream_url: self.downstream_url.clone(),
                downstream_timeout: self.downstream_timeout,
            },
        )
    }

    pub fn router(self) -> Router {
        build_router(self.state(), self.request_timeout)
    }
}

/// Spans exported through the OpenTelemetry SDK, plus the live span count.
#[derive(Clone)]
pub struct SpanCapture {
    exporter: InMemorySpanExporter,
    open: OpenSpans,
    // The tracer only holds a weak reference to its provider.
    _provider: TracerProvider,
}

impl SpanCapture {
    fn install() -> (Self, impl tracing::Subscriber + Send + Sync + 'static) {
        let exporter = InMemorySpanExporter::default();
        let provider = TracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let open = OpenSpans::new();
        let subscriber = tracing_subscriber::registry()
            .with(span_layer(&provider))
            .with(open.clone().with_filter(crate_spans()));
        let capture = Self {
            exporter,
            open,
            _provider: provider,
        };
        (capture, subscriber)
    }

    pub fn finished(&self) -> Vec<SpanData> {
        // The simple processor exports on a background thread.
        self._provider.force_flush();
        self.exporter.get_finished_spans().unwrap()
    }

    pub fn named(&self, name: &str) -> Vec<SpanData> {
        self.finished().into_iter().filter(|s| s.name == name).collect()
    }

    /// The single span called `name`.
    pub fn one(&self, name: &str) -> SpanData {
        let mut found = self.named(name);
        assert_eq!(found.len(), 1, "expected exactly one span named {}", name);
        found.pop().unwrap()
    }

    /// The root span of the single request to `path`.
    pub fn root(&self, path: &str) -> SpanData {
        let root = self.one(&format!("Request: {}", path));
        assert!(is_root(&root));
        root
    }

    pub fn open_spans(&self) -> usize {
        self.open.count()
    }

    pub fn reset(&self) {
        self.exporter.reset();
    }
}

/// Capture spans for the current thread. Tests on the current-thread
/// runtime see every span of the test here.
pub fn capture_spans() -> (SpanCapture, DefaultGuard) {
    let (capture, subscriber) = SpanCapture::install();
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}

/// Capture spans process-wide, for tests on the multi-thread runtime. The
/// first call installs the global subscriber.
pub fn global_capture() -> SpanCapture {
    static CAPTURE: OnceLock<SpanCapture> = OnceLock::new();
    CAPTURE
        .get_or_init(|| {
            let (capture, subscriber) = SpanCapture::install();
            tracing::subscriber::set_global_default(subscriber).unwrap();
            capture
        })
        .clone()
}

pub fn attr(span: &SpanData, key: &str) -> Option<String> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.to_string())
}

pub fn has_event(span: &SpanData, name: &str) -> bool {
    span.events.iter().any(|e| e.name == name)
}

/// Messages of the exceptions recorded on `span`, in order.
pub fn exceptions(span: &SpanData) -> Vec<String> {
    span.events
        .iter()
        .filter_map(|e| {
            e.attributes
                .iter()
                .find(|kv| kv.key.as_str() == EXCEPTION_FIELD)
                .map(|kv| kv.value.to_string())
        })
        .collect()
}

pub fn is_root(span: &SpanData) -> bool {
    span.parent_span_id == SpanId::INVALID
}

pub fn is_error(span: &SpanData) -> bool {
    matches!(span.status, Status::Error { .. })
}

pub fn is_child_of(child: &SpanData, parent: &SpanData) -> bool {
    child.parent_span_id == parent.span_context.span_id()
        && child.span_context.trace_id() == parent.span_context.trace_id()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub request_id: Option<String>,
    pub body: Value,
}

pub async fn get(router: &Router, uri: &str) -> TestResponse {
    send(router, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse {
        status,
        request_id,
        body,
    }
}
