//! Traced backend service library.

pub mod cache;
pub mod config;
pub mod downstream;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod redaction;
pub mod store;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
