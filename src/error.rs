//! Error types for SAINT.
//!
//! Only two things can fail outright: loading a structurally invalid
//! catalog, rule set, snapshot or config (`ValidationError`), and an
//! evaluation that hits an internal inconsistency (`ExecutionError`).
//! Everything an operator should see as "not executable" is reported
//! inside an `EvaluationResult`, not as an error.

use thiserror::Error;

/// Validation errors raised while loading catalogs, rules, facts or config.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Pattern for action '{action}' has an invalid matcher: {reason}")]
    InvalidMatcher {
        action: String,
        reason: String,
    },

    #[error("Pattern for action '{action}' declares {declared} capture names but its matcher has {groups} groups")]
    CaptureCountMismatch {
        action: String,
        declared: usize,
        groups: usize,
    },

    #[error("Pattern for action '{action}' declares capture '{capture}' more than once")]
    DuplicateCapture {
        action: String,
        capture: String,
    },

    #[error("Pattern for action '{action}' must capture '{capture}'")]
    MissingCapture {
        action: String,
        capture: String,
    },

    #[error("Rule '{rule}' references capture '{capture}' which no pattern for action '{action}' declares")]
    UnknownCapture {
        rule: String,
        action: String,
        capture: String,
    },

    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("Field '{field}' exceeds maximum length of {max_length}")]
    FieldTooLong {
        field: String,
        max_length: usize,
    },

    #[error("Invalid rule definition '{rule}': {reason}")]
    InvalidRuleDefinition {
        rule: String,
        reason: String,
    },

    #[error("Invalid record in collection '{collection}': {reason}")]
    InvalidFactRecord {
        collection: String,
        reason: String,
    },

    #[error("Invalid ontology: {reason}")]
    InvalidOntology {
        reason: String,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Execution errors that abort a single evaluation call.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Internal inconsistency: {reason}")]
    InternalInconsistency {
        reason: String,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
    },
}

/// Top-level error type for SAINT.
#[derive(Debug, Error)]
pub enum SaintError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("I/O error on '{path}': {message}")]
    Io {
        path: String,
        message: String,
    },
}

impl SaintError {
    /// Creates an internal inconsistency error.
    #[must_use]
    pub fn inconsistency(reason: impl Into<String>) -> Self {
        Self::Execution(ExecutionError::InternalInconsistency {
            reason: reason.into(),
        })
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if an evaluation reached a state upstream checks should
    /// have made unreachable.
    #[must_use]
    pub const fn is_internal_inconsistency(&self) -> bool {
        matches!(
            self,
            Self::Execution(ExecutionError::InternalInconsistency { .. })
        )
    }
}

/// Result type alias for SAINT operations.
pub type SaintResult<T> = Result<T, SaintError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_count_mismatch_message() {
        let err = ValidationError::CaptureCountMismatch {
            action: "transfer".to_string(),
            declared: 2,
            groups: 3,
        };
        let msg = format!("{err}");
        assert!(msg.contains("transfer"));
        assert!(msg.contains("2 capture names"));
        assert!(msg.contains("3 groups"));
    }

    #[test]
    fn test_unknown_capture_message() {
        let err = ValidationError::UnknownCapture {
            rule: "late transfer".to_string(),
            action: "transfer".to_string(),
            capture: "crew".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("late transfer"));
        assert!(msg.contains("'crew'"));
    }

    #[test]
    fn test_saint_error_from_validation() {
        let err: SaintError = ValidationError::MissingField {
            field: "matcher".to_string(),
        }
        .into();
        assert!(err.is_validation());
        assert!(!err.is_execution());
        assert!(!err.is_internal_inconsistency());
    }

    #[test]
    fn test_saint_error_inconsistency() {
        let err = SaintError::inconsistency("no plan template for 'teleport'");
        assert!(err.is_execution());
        assert!(err.is_internal_inconsistency());
        assert!(format!("{err}").contains("teleport"));
    }

    #[test]
    fn test_storage_error_is_not_inconsistency() {
        let err: SaintError = ExecutionError::Storage {
            message: "poisoned lock".to_string(),
        }
        .into();
        assert!(err.is_execution());
        assert!(!err.is_internal_inconsistency());
    }
}
