//! Downstream HTTP peer.
//!
//! # Data Flow
//! ```text
//! route handler
//!     → Downstream::get(url, timeout)
//!     → 2xx + JSON body          → DownstreamResponse
//!     → timeout / refused / non-2xx / bad body → DownstreamError (classified)
//! ```

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;

pub use client::HttpDownstream;
pub use types::{DownstreamError, DownstreamResponse};

#[async_trait]
pub trait Downstream: Send + Sync {
    /// GET `url`, giving up after `timeout`. Non-2xx answers are errors.
    async fn get(&self, url: &str, timeout: Duration) -> Result<DownstreamResponse, DownstreamError>;
}
