//! Engine configuration.
//!
//! ```toml
//! max_input_len = 16384
//!
//! [inspection]
//! enabled = true
//! cutoff_hour = 22
//! train_kind = "passenger"
//! utc_offset_minutes = 180
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::conflict::InspectionPolicy;
use crate::error::{SaintError, SaintResult, ValidationError};

/// Default bound on order text length, in bytes.
pub const DEFAULT_MAX_INPUT_LEN: usize = 16 * 1024;

/// Settings of a [`FeasibilityEngine`](crate::FeasibilityEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Night inspection rule.
    pub inspection: InspectionPolicy,
    /// Longest accepted order text, in bytes.
    pub max_input_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inspection: InspectionPolicy::default(),
            max_input_len: DEFAULT_MAX_INPUT_LEN,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_input_len == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "max_input_len must be > 0".to_string(),
            });
        }
        self.inspection.validate()
    }

    /// Parses and validates TOML. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> SaintResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| ValidationError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> SaintResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| SaintError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }
}
