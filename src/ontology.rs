//! Ontology registry: logical entity names to physical storage.
//!
//! Rules speak in logical terms ("Platform", "Occupied"); fact snapshots
//! use physical ones (`platforms`, `is_occupied`). The registry is the only
//! place that knows both, so rule authors never touch the physical schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::EntityRecord;
use crate::error::ValidationError;
use crate::storage::FactStore;

/// Logical names used by the built-in action families.
pub mod names {
    /// Trains, keyed by number.
    pub const TRAIN: &str = "Train";
    /// Platforms, keyed by number.
    pub const PLATFORM: &str = "Platform";
    /// Track sections, keyed by id.
    pub const TRACK: &str = "Track";
    /// Crews, keyed by id.
    pub const CREW: &str = "Crew";
    /// Wagons, keyed by id.
    pub const WAGON: &str = "Wagon";

    /// Key attribute of trains and platforms.
    pub const NUMBER: &str = "Number";
    /// Key attribute of tracks, crews and wagons.
    pub const ID: &str = "Id";
    /// Train type, e.g. passenger or freight.
    pub const KIND: &str = "Kind";
    /// Operational status text.
    pub const STATUS: &str = "Status";
    /// Platform occupancy flag.
    pub const OCCUPIED: &str = "Occupied";
    /// Wagons attached to a train.
    pub const WAGONS: &str = "Wagons";
    /// Wagon inspection state.
    pub const INSPECTION: &str = "Inspection";
}

/// A reference the registry could not resolve.
///
/// These surface as `MalformedRule` reasons at evaluation time: the
/// ontology arrives with the snapshot, so a rule set can only be checked
/// against it per call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OntologyError {
    #[error("no ontology entry for entity '{entity}'")]
    UnresolvedEntity {
        entity: String,
    },

    #[error("entity '{entity}' has no attribute '{attribute}'")]
    UnmappedAttribute {
        entity: String,
        attribute: String,
    },
}

/// Where a logical entity lives and how its attributes are named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyEntry {
    /// Fact store collection name.
    pub collection: String,
    /// Logical attribute holding the entity's identity.
    pub key: String,
    /// Logical attribute name to physical field name.
    pub attributes: BTreeMap<String, String>,
}

impl OntologyEntry {
    /// Creates an entry whose key attribute maps to `key_field`.
    #[must_use]
    pub fn new(
        collection: impl Into<String>,
        key: impl Into<String>,
        key_field: impl Into<String>,
    ) -> Self {
        let key = key.into();
        let mut attributes = BTreeMap::new();
        attributes.insert(key.clone(), key_field.into());
        Self {
            collection: collection.into(),
            key,
            attributes,
        }
    }

    /// Adds an attribute mapping.
    #[must_use]
    pub fn attribute(mut self, logical: impl Into<String>, physical: impl Into<String>) -> Self {
        self.attributes.insert(logical.into(), physical.into());
        self
    }

    /// Physical field name for a logical attribute.
    #[must_use]
    pub fn physical(&self, logical: &str) -> Option<&str> {
        self.attributes.get(logical).map(String::as_str)
    }
}

/// Registry of ontology entries keyed by logical entity name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OntologyRegistry {
    entries: BTreeMap<String, OntologyEntry>,
}

impl OntologyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The default railway ontology the built-in action families rely on.
    #[must_use]
    pub fn railway() -> Self {
        use names::{
            CREW, ID, INSPECTION, KIND, NUMBER, OCCUPIED, PLATFORM, STATUS, TRACK, TRAIN, WAGON,
            WAGONS,
        };

        let mut registry = Self::new();
        registry.insert(
            TRAIN,
            OntologyEntry::new("trains", NUMBER, "train_number")
                .attribute(KIND, "type")
                .attribute(STATUS, "status")
                .attribute(CREW, "crew_id")
                .attribute(WAGONS, "wagons"),
        );
        registry.insert(
            PLATFORM,
            OntologyEntry::new("platforms", NUMBER, "platform_number")
                .attribute(OCCUPIED, "is_occupied"),
        );
        registry.insert(
            TRACK,
            OntologyEntry::new("tracks", ID, "track_id").attribute(STATUS, "status"),
        );
        registry.insert(
            CREW,
            OntologyEntry::new("crews", ID, "crew_id").attribute(STATUS, "status"),
        );
        registry.insert(
            WAGON,
            OntologyEntry::new("wagons", ID, "wagon_id")
                .attribute(STATUS, "status")
                .attribute(INSPECTION, "inspection"),
        );
        registry
    }

    /// Parses a registry from JSON and validates every entry.
    pub fn from_json(s: &str) -> Result<Self, ValidationError> {
        let registry: Self =
            serde_json::from_str(s).map_err(|e| ValidationError::InvalidOntology {
                reason: e.to_string(),
            })?;
        registry.validate()?;
        Ok(registry)
    }

    /// Checks that every entry names a collection and maps its key attribute.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, entry) in &self.entries {
            if entry.collection.trim().is_empty() {
                return Err(ValidationError::InvalidOntology {
                    reason: format!("entity '{name}' has no collection"),
                });
            }
            if entry.physical(&entry.key).is_none() {
                return Err(ValidationError::InvalidOntology {
                    reason: format!("entity '{name}' does not map its key attribute '{}'", entry.key),
                });
            }
        }
        Ok(())
    }

    /// Registers (or replaces) an entry.
    pub fn insert(&mut self, name: impl Into<String>, entry: OntologyEntry) {
        self.entries.insert(name.into(), entry);
    }

    /// Resolves a logical entity name.
    pub fn resolve(&self, entity: &str) -> Result<&OntologyEntry, OntologyError> {
        self.entries
            .get(entity)
            .ok_or_else(|| OntologyError::UnresolvedEntity {
                entity: entity.to_string(),
            })
    }

    /// Resolves a logical attribute of a logical entity to its physical field.
    pub fn field(&self, entity: &str, attribute: &str) -> Result<&str, OntologyError> {
        self.resolve(entity)?
            .physical(attribute)
            .ok_or_else(|| OntologyError::UnmappedAttribute {
                entity: entity.to_string(),
                attribute: attribute.to_string(),
            })
    }

    /// Finds the record of `entity` identified by `key` in `facts`.
    pub fn find<'f>(
        &self,
        facts: &'f dyn FactStore,
        entity: &str,
        key: &str,
    ) -> Result<Option<&'f EntityRecord>, OntologyError> {
        let entry = self.resolve(entity)?;
        let key_field = self.field(entity, &entry.key)?;
        Ok(facts.lookup(&entry.collection, key_field, key))
    }

    /// Logical entity names in sorted order.
    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FactSnapshot;

    #[test]
    fn test_railway_resolves_builtin_names() {
        let ontology = OntologyRegistry::railway();
        ontology.validate().unwrap();
        assert_eq!(ontology.resolve("Train").unwrap().collection, "trains");
        assert_eq!(ontology.field("Platform", "Occupied").unwrap(), "is_occupied");
        assert_eq!(ontology.field("Wagon", "Id").unwrap(), "wagon_id");
        assert_eq!(ontology.entity_names().count(), 5);
    }

    #[test]
    fn test_unresolved_entity() {
        let ontology = OntologyRegistry::railway();
        assert_eq!(
            ontology.resolve("Locomotive").unwrap_err(),
            OntologyError::UnresolvedEntity {
                entity: "Locomotive".to_string()
            }
        );
    }

    #[test]
    fn test_unmapped_attribute() {
        let ontology = OntologyRegistry::railway();
        let err = ontology.field("Track", "Occupied").unwrap_err();
        assert!(err.to_string().contains("no attribute 'Occupied'"));
    }

    #[test]
    fn test_find_translates_key_field() {
        let ontology = OntologyRegistry::railway();
        let facts = FactSnapshot::from_records([
            EntityRecord::new("tracks").with("track_id", "T1").with("status", "free")
        ]);
        let record = ontology.find(&facts, "Track", "T1").unwrap();
        assert!(record.is_some());
        assert!(ontology.find(&facts, "Track", "T9").unwrap().is_none());
    }

    #[test]
    fn test_from_json_validates_key_mapping() {
        let ok = OntologyRegistry::from_json(
            r#"{"Depot": {"collection": "depots", "key": "Code", "attributes": {"Code": "depot_code"}}}"#,
        )
        .unwrap();
        assert_eq!(ok.field("Depot", "Code").unwrap(), "depot_code");

        let err = OntologyRegistry::from_json(
            r#"{"Depot": {"collection": "depots", "key": "Code", "attributes": {}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("key attribute"));
    }
}
