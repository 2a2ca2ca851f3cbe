//! Entity records: the rows of the operational fact snapshot.
//!
//! A record is a flat attribute map tagged with the collection it belongs
//! to (`trains`, `platforms`, ...). Its identity is the value of the key
//! attribute named by the ontology, so records carry no id of their own.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// One operational entity (a train, platform, track, crew or wagon).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Collection this record belongs to.
    pub collection: String,
    /// Physical attribute name to value.
    pub attributes: BTreeMap<String, Value>,
}

impl EntityRecord {
    /// Creates an empty record in `collection`.
    #[must_use]
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Sets an attribute.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(field.into(), value.into());
        self
    }

    /// Returns the attribute value, if the record has the field at all.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    /// Returns true if `field` identifies this record as `key`.
    #[must_use]
    pub fn is_keyed_by(&self, field: &str, key: &str) -> bool {
        self.get(field).is_some_and(|v| v.matches_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let platform = EntityRecord::new("platforms")
            .with("platform_number", "5")
            .with("is_occupied", false);

        assert_eq!(platform.collection, "platforms");
        assert_eq!(platform.get("is_occupied"), Some(&Value::Bool(false)));
        assert!(platform.get("missing").is_none());
    }

    #[test]
    fn test_record_keyed_by() {
        let train = EntityRecord::new("trains").with("train_number", "123");
        assert!(train.is_keyed_by("train_number", "123"));
        assert!(!train.is_keyed_by("train_number", "124"));
        assert!(!train.is_keyed_by("status", "123"));
    }
}
