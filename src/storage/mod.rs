//! Fact store abstraction and in-memory snapshots.
//!
//! The trait defines what the engine reads; the in-memory module provides
//! the immutable snapshot used per evaluation and the refresh holder.

mod memory;
mod traits;

pub use memory::{FactSnapshot, FactSnapshotBuilder, LiveFacts};
pub use traits::{FactStore, StorageError};
