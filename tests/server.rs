//! The server binds, answers over a real socket, and stops on shutdown.

mod common;

use tokio::net::TcpListener;

use common::*;
use traced_backend::{AppConfig, HttpServer, Shutdown};

#[tokio::test]
async fn test_serves_until_shutdown() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server = HttpServer::new(&AppConfig::default(), TestApp::new().state());
    let handle = tokio::spawn(server.run(listener, shutdown.triggered()));

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let response = client
        .get(format!("http://{}/", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.headers().contains_key("x-request-id"));
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["message"].is_string());

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}
