//! In-memory fact snapshots.
//!
//! `FactSnapshot` is an immutable arena of entity records grouped by
//! collection. Cloning it is cheap (one `Arc`), so every evaluation call
//! can own its own copy. `LiveFacts` is the integrator-facing holder for a
//! snapshot that gets refreshed while evaluations are running: readers
//! take a copy of the current `Arc` and never observe a partial refresh.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::entity::EntityRecord;
use crate::error::ValidationError;
use crate::storage::traits::{FactStore, StorageError};
use crate::value::Value;

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// Immutable snapshot of operational facts.
#[derive(Debug, Clone, Default)]
pub struct FactSnapshot {
    collections: Arc<BTreeMap<String, Vec<EntityRecord>>>,
}

impl FactSnapshot {
    /// Starts building a snapshot.
    #[must_use]
    pub fn builder() -> FactSnapshotBuilder {
        FactSnapshotBuilder::default()
    }

    /// Builds a snapshot from records; order within a collection follows input order.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = EntityRecord>) -> Self {
        records
            .into_iter()
            .fold(Self::builder(), FactSnapshotBuilder::record)
            .build()
    }

    /// Parses the operational-data boundary format: a JSON object mapping
    /// collection name to an ordered array of flat records.
    ///
    /// ```json
    /// { "platforms": [ { "platform_number": "5", "is_occupied": false } ] }
    /// ```
    pub fn from_json(s: &str) -> Result<Self, ValidationError> {
        let raw: BTreeMap<String, Vec<serde_json::Map<String, serde_json::Value>>> =
            serde_json::from_str(s).map_err(|e| ValidationError::InvalidFactRecord {
                collection: "<root>".to_string(),
                reason: e.to_string(),
            })?;

        let mut builder = Self::builder();
        for (collection, rows) in raw {
            for row in rows {
                let mut record = EntityRecord::new(collection.clone());
                for (field, json) in row {
                    let value: Value = serde_json::from_value(json).map_err(|e| {
                        ValidationError::InvalidFactRecord {
                            collection: collection.clone(),
                            reason: format!("field '{field}': {e}"),
                        }
                    })?;
                    record.attributes.insert(field, value);
                }
                builder = builder.record(record);
            }
        }
        Ok(builder.build())
    }

    /// Total number of records across all collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    /// Returns true if the snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FactStore for FactSnapshot {
    fn lookup(&self, collection: &str, field: &str, value: &str) -> Option<&EntityRecord> {
        self.list_collection(collection)
            .iter()
            .find(|record| record.is_keyed_by(field, value))
    }

    fn list_collection(&self, collection: &str) -> &[EntityRecord] {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn collection_names(&self) -> Vec<&str> {
        self.collections
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Builder for [`FactSnapshot`].
#[derive(Debug, Default)]
pub struct FactSnapshotBuilder {
    collections: BTreeMap<String, Vec<EntityRecord>>,
}

impl FactSnapshotBuilder {
    /// Appends a record to its collection.
    #[must_use]
    pub fn record(mut self, record: EntityRecord) -> Self {
        self.collections
            .entry(record.collection.clone())
            .or_default()
            .push(record);
        self
    }

    /// Freezes the snapshot.
    #[must_use]
    pub fn build(self) -> FactSnapshot {
        FactSnapshot {
            collections: Arc::new(self.collections),
        }
    }
}

/// Holder for the current snapshot of a refreshing data source.
///
/// Consistency model: copy-on-read. `snapshot()` hands out the snapshot
/// current at call time; a later `replace()` does not affect it.
#[derive(Debug, Default)]
pub struct LiveFacts {
    current: RwLock<FactSnapshot>,
    generation: RwLock<u64>,
}

impl LiveFacts {
    /// Creates a holder seeded with `initial`.
    #[must_use]
    pub fn new(initial: FactSnapshot) -> Self {
        Self {
            current: RwLock::new(initial),
            generation: RwLock::new(0),
        }
    }

    /// Returns the snapshot current at call time.
    pub fn snapshot(&self) -> Result<FactSnapshot, StorageError> {
        let guard = self.current.read().map_err(|_| lock_err("facts.snapshot"))?;
        Ok(guard.clone())
    }

    /// Swaps in a refreshed snapshot and returns the new generation number.
    pub fn replace(&self, next: FactSnapshot) -> Result<u64, StorageError> {
        let mut current = self.current.write().map_err(|_| lock_err("facts.replace"))?;
        let mut generation = self
            .generation
            .write()
            .map_err(|_| lock_err("facts.generation"))?;
        *current = next;
        *generation += 1;
        debug!(generation = *generation, records = current.len(), "fact snapshot replaced");
        Ok(*generation)
    }

    /// Number of refreshes applied so far.
    pub fn generation(&self) -> Result<u64, StorageError> {
        let generation = self
            .generation
            .read()
            .map_err(|_| lock_err("facts.generation"))?;
        Ok(*generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platforms() -> FactSnapshot {
        FactSnapshot::from_records([
            EntityRecord::new("platforms")
                .with("platform_number", "1")
                .with("is_occupied", true),
            EntityRecord::new("platforms")
                .with("platform_number", "5")
                .with("is_occupied", false),
            EntityRecord::new("platforms")
                .with("platform_number", "5")
                .with("is_occupied", true),
        ])
    }

    #[test]
    fn test_lookup_returns_first_match() {
        let facts = platforms();
        let hit = facts.lookup("platforms", "platform_number", "5").unwrap();
        assert_eq!(hit.get("is_occupied"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_lookup_missing() {
        let facts = platforms();
        assert!(facts.lookup("platforms", "platform_number", "9").is_none());
        assert!(facts.lookup("tracks", "track_id", "T1").is_none());
    }

    #[test]
    fn test_list_collection_preserves_order() {
        let facts = platforms();
        let numbers: Vec<_> = facts
            .list_collection("platforms")
            .iter()
            .filter_map(|r| r.get("platform_number").and_then(Value::as_str))
            .collect();
        assert_eq!(numbers, vec!["1", "5", "5"]);
        assert!(facts.list_collection("crews").is_empty());
        assert_eq!(facts.collection_names(), vec!["platforms"]);
    }

    #[test]
    fn test_from_json() {
        let facts = FactSnapshot::from_json(
            r#"{
                "trains": [
                    {"train_number": "456", "status": "en route", "crew_id": "B1", "wagons": ["W1", "W2"]}
                ],
                "platforms": [{"platform_number": 5, "is_occupied": false}]
            }"#,
        )
        .unwrap();

        assert_eq!(facts.len(), 2);
        let train = facts.lookup("trains", "train_number", "456").unwrap();
        assert_eq!(
            train.get("wagons").and_then(Value::as_list),
            Some(&["W1".to_string(), "W2".to_string()][..])
        );
        // integer keys still match captured text
        assert!(facts.lookup("platforms", "platform_number", "5").is_some());
    }

    #[test]
    fn test_from_json_rejects_nested_objects() {
        let err = FactSnapshot::from_json(r#"{"trains": [{"train_number": {"n": 1}}]}"#)
            .unwrap_err();
        match err {
            ValidationError::InvalidFactRecord { collection, reason } => {
                assert_eq!(collection, "trains");
                assert!(reason.contains("train_number"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_live_facts_copy_on_read() {
        let live = LiveFacts::new(platforms());
        let before = live.snapshot().unwrap();

        let refreshed = FactSnapshot::from_records([EntityRecord::new("platforms")
            .with("platform_number", "5")
            .with("is_occupied", true)]);
        assert_eq!(live.replace(refreshed).unwrap(), 1);

        // the earlier copy is untouched by the refresh
        let old = before.lookup("platforms", "platform_number", "5").unwrap();
        assert_eq!(old.get("is_occupied"), Some(&Value::Bool(false)));

        let after = live.snapshot().unwrap();
        let new = after.lookup("platforms", "platform_number", "5").unwrap();
        assert_eq!(new.get("is_occupied"), Some(&Value::Bool(true)));
        assert_eq!(live.generation().unwrap(), 1);
    }
}
