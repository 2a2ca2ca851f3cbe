//! Abstract fact store trait for SAINT.
//!
//! The engine only ever reads facts. Backends expose named collections of
//! entity records and a first-match lookup by field value; refreshing or
//! mutating operational state belongs to whoever owns the backend.

use thiserror::Error;

use crate::entity::EntityRecord;
use crate::error::{ExecutionError, SaintError};

/// Errors raised by fact store holders.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

impl From<StorageError> for SaintError {
    fn from(err: StorageError) -> Self {
        Self::Execution(ExecutionError::Storage {
            message: err.to_string(),
        })
    }
}

/// Read-only view over named entity collections.
///
/// Implementations must return the same answers for the whole lifetime of
/// a value: the engine assumes one evaluation call sees one consistent
/// snapshot.
pub trait FactStore: Send + Sync {
    /// Returns the first record in `collection` whose `field` equals `value`.
    ///
    /// Unknown collections behave like empty ones.
    fn lookup(&self, collection: &str, field: &str, value: &str) -> Option<&EntityRecord>;

    /// Returns every record of `collection` in snapshot order.
    fn list_collection(&self, collection: &str) -> &[EntityRecord];

    /// Returns the names of all non-empty collections.
    fn collection_names(&self) -> Vec<&str>;
}
