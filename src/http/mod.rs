//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID layers)
//!     → middleware/trace.rs (root span, unhandled failure net)
//!     → handlers.rs (store, cache, downstream calls; child spans)
//!     → error.rs (error envelope)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use error::{ApiError, ErrorEnvelope, UnhandledFailure};
pub use middleware::X_REQUEST_ID;
pub use server::{build_router, AppState, HttpServer, RouteSettings};
