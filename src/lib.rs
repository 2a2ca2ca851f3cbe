//! # SAINT - Feasibility checking for railway dispatch orders
//!
//! SAINT turns free-text dispatch orders ("move train 123 from platform 1
//! to platform 5") into structured commands, checks them against a snapshot
//! of operational facts, and reports whether each one can be executed now,
//! with either a step plan or every reason it cannot.
//!
//! ## Core Concepts
//!
//! - **Pattern Catalog**: ordered matchers; the first match wins
//! - **Extracted Command**: action name plus named captures
//! - **Fact Store**: immutable snapshot of trains, platforms, tracks, crews and wagons
//! - **Ontology**: logical entity and attribute names mapped to the physical schema
//! - **Condition**: one existence, equality or predicate check
//! - **Conflict**: two commands contending for the same resource
//! - **EvaluationResult**: verdict, reasons, plan and conflicts
//!
//! ## Usage
//!
//! ```rust,ignore
//! use saint::{
//!     EngineConfig, FactSnapshot, FeasibilityEngine, OperationalSnapshot, PatternCatalog, RuleSet,
//! };
//!
//! let facts = FactSnapshot::from_json(&std::fs::read_to_string("facts.json")?)?;
//! let snapshot = OperationalSnapshot::railway(facts, chrono::Utc::now());
//! let catalog = PatternCatalog::builtin()?;
//! let engine = FeasibilityEngine::new(EngineConfig::default())?;
//!
//! let result = engine.evaluate(
//!     "transfer train 123 from platform 1 to platform 5",
//!     &snapshot,
//!     &catalog,
//!     &RuleSet::empty(),
//!     &[],
//! )?;
//! println!("{}: {}", result.status, result.details());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Data model
pub mod command;
pub mod entity;
pub mod error;
pub mod outcome;
pub mod value;

// Facts and naming
pub mod ontology;
pub mod storage;

// Extraction and rules
pub mod action;
pub mod extract;
pub mod pattern;
pub mod rule;

// Evaluation
pub mod config;
pub mod conflict;
pub mod engine;
pub mod plan;

// Re-export primary types at crate root for convenience
pub use action::{Action, ActionKind};
pub use command::{CommandId, ExtractedCommand, PendingCommand};
pub use config::EngineConfig;
pub use conflict::{
    ClaimMode, ConflictDescriptor, ConflictDetector, ConstraintEvaluator, InspectionPolicy,
    ResourceClaim, ResourceKind,
};
pub use engine::{FeasibilityEngine, OperationalSnapshot};
pub use entity::EntityRecord;
pub use error::{ExecutionError, SaintError, SaintResult, ValidationError};
pub use extract::{extract, Extraction};
pub use ontology::{OntologyEntry, OntologyError, OntologyRegistry};
pub use outcome::{EvaluationResult, Feasibility, Reason, ReasonKind};
pub use pattern::{PatternCatalog, PatternDefinition};
pub use plan::PlanGenerator;
pub use rule::{
    load_stored_rules, Conclusion, Condition, ConditionEvaluator, ConditionReport, Predicate, Rule,
    RuleSet, StoredRule,
};
pub use storage::{FactSnapshot, FactStore, LiveFacts, StorageError};
pub use value::Value;
