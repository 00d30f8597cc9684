//! Request pipeline stages composed around the router.

pub mod trace;

pub use trace::{trace_requests, UNMATCHED_ROUTE, X_REQUEST_ID};
