//! Every span opened while serving a request is closed once the request
//! completes, whatever the outcome. Requests run on a multi-thread runtime
//! so spans cross worker threads.

mod common;

use std::collections::HashSet;

use futures_util::future::join_all;
use opentelemetry::trace::SpanId;
use tokio::sync::Mutex;

use common::*;
use traced_backend::store::StoreError;

const REQUESTS: usize = 100;

const PATHS: [&str; 5] = [
    "/",
    "/mongo-data/507f1f77bcf86cd799439011",
    "/cache-data",
    "/mongo-cache-data",
    "/external-api",
];

// The capture is process-wide; tests in this file take turns.
static SERIAL: Mutex<()> = Mutex::const_new(());

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_close_every_span() {
    let _serial = SERIAL.lock().await;
    let spans = global_capture();
    spans.reset();

    let addr = start_mock_backend(200, r#"{"status":"ok"}"#).await;
    let router = TestApp::new().downstream(addr).router();

    let responses = join_all((0..REQUESTS).map(|i| {
        let router = router.clone();
        tokio::spawn(async move { get(&router, PATHS[i % PATHS.len()]).await })
    }))
    .await;

    assert!(responses
        .iter()
        .all(|r| r.as_ref().unwrap().status.is_success()));
    assert_eq!(spans.open_spans(), 0);

    let finished = spans.finished();
    let roots: Vec<_> = finished
        .iter()
        .filter(|s| s.name.starts_with("Request: "))
        .collect();
    assert_eq!(roots.len(), REQUESTS);
    assert!(roots.iter().all(|s| is_root(s)));

    let root_ids: HashSet<SpanId> = roots.iter().map(|s| s.span_context.span_id()).collect();
    for child in finished.iter().filter(|s| !s.name.starts_with("Request: ")) {
        assert!(
            root_ids.contains(&child.parent_span_id),
            "{} is not under a root span",
            child.name
        );
    }

    // 20 record lookups, 20 cache lookups, 40 downstream calls.
    assert_eq!(spans.named("Store Query").len(), REQUESTS / 5);
    assert_eq!(spans.named("Cache Query").len(), REQUESTS / 5);
    assert_eq!(
        spans.named(&format!("GET {}", downstream_url(addr))).len(),
        2 * REQUESTS / 5
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failing_requests_close_every_span() {
    let _serial = SERIAL.lock().await;
    let spans = global_capture();
    spans.reset();

    let addr = refused_addr().await;
    let router = TestApp::new()
        .store(FailingStore(StoreError::Unclassified("lost".into())))
        .downstream(addr)
        .router();

    let responses = join_all((0..REQUESTS).map(|i| {
        let router = router.clone();
        tokio::spawn(async move { get(&router, PATHS[i % PATHS.len()]).await })
    }))
    .await;

    assert!(responses.iter().all(|r| r.is_ok()));
    assert_eq!(spans.open_spans(), 0);

    let roots = spans
        .finished()
        .into_iter()
        .filter(|s| s.name.starts_with("Request: "))
        .collect::<Vec<_>>();
    assert_eq!(roots.len(), REQUESTS);

    // Unclassified store failures land on the root span, once each.
    let record_roots = spans.named("Request: /mongo-data/507f1f77bcf86cd799439011");
    assert_eq!(record_roots.len(), REQUESTS / 5);
    for root in record_roots {
        assert!(is_error(&root));
        assert_eq!(exceptions(&root), vec!["lost".to_string()]);
    }
}
