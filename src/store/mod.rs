//! Configuration entry storage subsystem.
//!
//! # Data Flow
//! ```text
//! lifecycle controller
//!     → StoreConnector::connect (opens the pool once, at startup)
//!     → Arc<dyn ConfigRepository>
//!     → shared by the config service and the health reporter
//! ```
//!
//! # Design Decisions
//! - Every operation is one round trip to the backing store; no retries
//! - Reads, updates and deletes only ever see live (not soft-deleted) rows
//! - Rows are never physically removed; deletion stamps `deleted_at`

pub mod entry;
pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::DatabaseConfig;

pub use entry::{ConfigEntry, ConfigEntryDraft, ConfigEntryId};
pub use memory::{InMemoryConfigRepository, InMemoryConnector};
pub use postgres::{PostgresConfigRepository, PostgresConnector};

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors returned by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No live entry has the given identifier.
    #[error("config entry not found: {0}")]
    NotFound(ConfigEntryId),

    /// The store has been closed.
    #[error("store is closed")]
    Closed,

    /// The backend was unreachable or rejected the operation.
    #[error("storage error: {0}")]
    Storage(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => Self::Closed,
            other => Self::Storage(other),
        }
    }
}

/// Persistence contract for configuration entries.
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Stores a new entry with a generated id and `created_at == updated_at`.
    async fn create(&self, draft: ConfigEntryDraft) -> RepositoryResult<ConfigEntry>;

    /// Returns the live entry with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when no live entry has that id.
    async fn get_by_id(&self, id: ConfigEntryId) -> RepositoryResult<ConfigEntry>;

    /// Overwrites the mutable fields of a live entry and refreshes `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when the target is not live.
    async fn update(&self, id: ConfigEntryId, draft: ConfigEntryDraft)
        -> RepositoryResult<ConfigEntry>;

    /// Soft-deletes a live entry. A second call for the same id fails.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when no live entry has that id.
    async fn delete(&self, id: ConfigEntryId) -> RepositoryResult<()>;

    /// All live entries, most recently created first.
    async fn list(&self) -> RepositoryResult<Vec<ConfigEntry>>;

    /// Trivial round trip used to test reachability.
    async fn ping(&self) -> RepositoryResult<()>;

    /// Releases the underlying connection(s).
    async fn close(&self);
}

/// Opens a repository from database settings.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, config: &DatabaseConfig) -> RepositoryResult<Arc<dyn ConfigRepository>>;
}
