//! Document store client.
//!
//! # Data Flow
//! ```text
//! route handler
//!     → RecordId::parse (native vs literal identifier)
//!     → DocumentStore::find_one / find
//!     → Record (identifier normalized to a string on output)
//! ```
//!
//! # Design Decisions
//! - Handlers only see the `DocumentStore` trait; the concrete store
//!   (MongoDB, or in-memory for local runs and tests) is constructed once
//!   at startup and shared through `AppState`
//! - Absence is `Ok(None)`, never an error
//! - Errors carry an `ErrorKind` so handlers map them without matching on
//!   concrete types

pub mod memory;
pub mod mongo;
pub mod object_id;
pub mod record;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::{Classify, ErrorKind};

pub use memory::InMemoryStore;
pub use mongo::MongoStore;
pub use object_id::ObjectId;
pub use record::{Projection, Record, RecordId};

/// Errors that can occur while talking to the document store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store answered but the query failed.
    #[error("query failed: {0}")]
    Query(String),

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A document does not have the expected shape.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Seed data could not be loaded.
    #[error("failed to load seed '{path}': {reason}")]
    Seed { path: String, reason: String },

    /// Anything the client cannot attribute.
    #[error("{0}")]
    Unclassified(String),
}

impl Classify for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Unavailable(_) => ErrorKind::Unreachable,
            StoreError::Query(_) | StoreError::InvalidDocument(_) | StoreError::Seed { .. } => {
                ErrorKind::Dependency
            }
            StoreError::Unclassified(_) => ErrorKind::Unclassified,
        }
    }
}

/// Read-only access to a document collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point lookup by identifier.
    async fn find_one(&self, collection: &str, id: &RecordId) -> Result<Option<Record>, StoreError>;

    /// Every document in the collection, with `projection` applied.
    async fn find(&self, collection: &str, projection: &Projection) -> Result<Vec<Record>, StoreError>;
}
