//! Traced backend service.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                 TRACED BACKEND                   │
//!                      │                                                  │
//!   Client Request     │  ┌───────────┐   ┌──────────┐   ┌────────────┐   │
//!   ───────────────────┼─▶│ request id│──▶│  trace   │──▶│  handlers  │   │
//!                      │  │  layers   │   │middleware│   │            │   │
//!                      │  └───────────┘   └──────────┘   └─────┬──────┘   │
//!                      │                                       │          │
//!                      │           ┌───────────────┬───────────┼───────┐  │
//!                      │           ▼               ▼           ▼       │  │
//!                      │     ┌──────────┐   ┌──────────┐ ┌──────────┐  │  │
//!                      │     │  store   │   │  cache   │ │downstream│──┼──┼──▶ External API
//!                      │     └──────────┘   └────┬─────┘ └──────────┘  │  │
//!                      │                         ▼                     │  │
//!                      │                   ┌──────────┐                │  │
//!                      │                   │redaction │  (span attrs)  │  │
//!                      │                   └──────────┘                │  │
//!                      │                                                  │
//!                      │  Cross-cutting: config, observability, lifecycle │
//!                      └──────────────────────────────────────────────────┘
//!     store ──▶ MongoDB     cache ──▶ Redis     spans ──▶ OTLP collector / stdout
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use traced_backend::config::load_config;
use traced_backend::lifecycle::{bootstrap, Shutdown};
use traced_backend::observability::{logging, metrics};
use traced_backend::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "traced-backend", version, about = "Observable HTTP backend")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "TRACED_BACKEND_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    let _telemetry = logging::init(&config.observability)?;

    tracing::info!(
        service = %config.observability.service_name,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        otlp_endpoint = config.observability.otlp_endpoint.as_deref().unwrap_or("disabled"),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let state = bootstrap(&config).await.inspect_err(|e| {
        tracing::error!(error = %e, "Startup failed");
    })?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, state);
    server.run(listener, shutdown.signalled()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
