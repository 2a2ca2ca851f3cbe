//! Time-sensitive constraints evaluated beside the precondition bundle.
//!
//! The only constraint today is the night inspection rule: a train of the
//! configured kind needs an inspection before any other action once the
//! local hour reaches the cutoff.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::action::{Action, ActionKind};
use crate::command::ExtractedCommand;
use crate::error::ValidationError;
use crate::ontology::names::{KIND, TRAIN};
use crate::ontology::OntologyRegistry;
use crate::outcome::{Reason, ReasonKind};
use crate::storage::FactStore;
use crate::value::Value;

/// Message of the inspection demotion.
pub const INSPECTION_REQUIRED: &str = "inspection required";

const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Settings of the night inspection rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectionPolicy {
    /// Whether the rule applies at all.
    pub enabled: bool,
    /// First local hour (0-23) at which inspection is required.
    pub cutoff_hour: u32,
    /// Train kind the rule applies to, compared case-insensitively.
    pub train_kind: String,
    /// Offset of local time from UTC, in minutes.
    pub utc_offset_minutes: i32,
}

impl Default for InspectionPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            cutoff_hour: 22,
            train_kind: "passenger".to_string(),
            utc_offset_minutes: 0,
        }
    }
}

impl InspectionPolicy {
    /// Validate the policy.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.cutoff_hour > 23 {
            return Err(ValidationError::InvalidConfig {
                reason: format!("inspection.cutoff_hour must be 0-23, got {}", self.cutoff_hour),
            });
        }
        if self.train_kind.trim().is_empty() {
            return Err(ValidationError::InvalidConfig {
                reason: "inspection.train_kind must not be empty".to_string(),
            });
        }
        if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(ValidationError::InvalidConfig {
                reason: format!(
                    "inspection.utc_offset_minutes must be within +/-{MAX_OFFSET_MINUTES}, got {}",
                    self.utc_offset_minutes
                ),
            });
        }
        Ok(())
    }

    /// Local hour of `at` under this policy's offset.
    #[must_use]
    pub fn local_hour(&self, at: DateTime<Utc>) -> u32 {
        (at + Duration::minutes(i64::from(self.utc_offset_minutes))).hour()
    }

    /// Time predicate: the local hour has reached the cutoff.
    #[must_use]
    pub fn past_cutoff(&self, at: DateTime<Utc>) -> bool {
        self.local_hour(at) >= self.cutoff_hour
    }

    /// Kind predicate: a train record's kind attribute matches.
    #[must_use]
    pub fn matches_kind(&self, kind: Option<&Value>) -> bool {
        kind.and_then(Value::as_str)
            .is_some_and(|k| k.trim().eq_ignore_ascii_case(self.train_kind.trim()))
    }
}

/// Evaluates constraints that depend on time and facts but not on other
/// pending commands.
#[derive(Clone, Copy)]
pub struct ConstraintEvaluator<'a> {
    facts: &'a dyn FactStore,
    ontology: &'a OntologyRegistry,
    policy: &'a InspectionPolicy,
}

impl<'a> ConstraintEvaluator<'a> {
    /// Creates an evaluator over one snapshot.
    #[must_use]
    pub fn new(
        facts: &'a dyn FactStore,
        ontology: &'a OntologyRegistry,
        policy: &'a InspectionPolicy,
    ) -> Self {
        Self {
            facts,
            ontology,
            policy,
        }
    }

    /// Returns the inspection reason if the rule applies to `command` at
    /// time `at`.
    ///
    /// Inspection orders are exempt. A train missing from the snapshot, or
    /// an ontology without a train kind mapping, never triggers the rule;
    /// existence is reported by the precondition bundle instead.
    #[must_use]
    pub fn inspection(
        &self,
        action: Option<&Action>,
        command: &ExtractedCommand,
        at: DateTime<Utc>,
    ) -> Option<Reason> {
        if !self.policy.enabled {
            return None;
        }
        if action.is_some_and(|a| a.kind() == ActionKind::Inspect) {
            return None;
        }
        if !self.policy.past_cutoff(at) {
            return None;
        }

        let train = match action {
            Some(action) => action.train(),
            None => command.capture("train"),
        }?;

        let kind_field = match self.ontology.field(TRAIN, KIND) {
            Ok(field) => field,
            Err(e) => {
                debug!(error = %e, "inspection rule skipped");
                return None;
            }
        };
        let record = self.ontology.find(self.facts, TRAIN, train).ok().flatten()?;
        if !self.policy.matches_kind(record.get(kind_field)) {
            return None;
        }

        warn!(
            train,
            action = command.action(),
            hour = self.policy.local_hour(at),
            "inspection required before further actions"
        );
        Some(Reason::new(ReasonKind::InspectionRequired, INSPECTION_REQUIRED))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::entity::EntityRecord;
    use crate::storage::FactSnapshot;

    fn facts() -> FactSnapshot {
        FactSnapshot::from_records([
            EntityRecord::new("trains")
                .with("train_number", "123")
                .with("type", "Passenger")
                .with("status", "on platform"),
            EntityRecord::new("trains")
                .with("train_number", "700")
                .with("type", "freight")
                .with("status", "on platform"),
        ])
    }

    fn dispatch(train: &str) -> ExtractedCommand {
        ExtractedCommand::new("dispatch", [("train".to_string(), train.to_string())])
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 30, 0).unwrap()
    }

    fn check(policy: &InspectionPolicy, cmd: &ExtractedCommand, hour: u32) -> Option<Reason> {
        let facts = facts();
        let ontology = OntologyRegistry::railway();
        let action = Action::from_command(cmd).unwrap();
        ConstraintEvaluator::new(&facts, &ontology, policy).inspection(action.as_ref(), cmd, at(hour))
    }

    #[test]
    fn test_default_policy_is_valid() {
        InspectionPolicy::default().validate().unwrap();
    }

    #[test]
    fn test_policy_rejects_bad_values() {
        let mut p = InspectionPolicy::default();
        p.cutoff_hour = 24;
        assert!(p.validate().is_err());

        let mut p = InspectionPolicy::default();
        p.train_kind = "  ".to_string();
        assert!(p.validate().is_err());

        let mut p = InspectionPolicy::default();
        p.utc_offset_minutes = 15 * 60;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_passenger_train_after_cutoff() {
        let policy = InspectionPolicy::default();
        let reason = check(&policy, &dispatch("123"), 22).unwrap();
        assert_eq!(reason.kind, ReasonKind::InspectionRequired);
        assert_eq!(reason.message, "inspection required");
        assert!(check(&policy, &dispatch("123"), 21).is_none());
    }

    #[test]
    fn test_other_kinds_and_missing_trains_are_exempt() {
        let policy = InspectionPolicy::default();
        assert!(check(&policy, &dispatch("700"), 23).is_none());
        assert!(check(&policy, &dispatch("999"), 23).is_none());
    }

    #[test]
    fn test_inspect_is_exempt() {
        let policy = InspectionPolicy::default();
        let inspect = ExtractedCommand::new("inspect", [("train".to_string(), "123".to_string())]);
        assert!(check(&policy, &inspect, 23).is_none());
    }

    #[test]
    fn test_offset_shifts_local_hour() {
        let policy = InspectionPolicy {
            utc_offset_minutes: 180,
            ..InspectionPolicy::default()
        };
        assert_eq!(policy.local_hour(at(19)), 22);
        assert!(check(&policy, &dispatch("123"), 19).is_some());

        let disabled = InspectionPolicy {
            enabled: false,
            ..InspectionPolicy::default()
        };
        assert!(check(&disabled, &dispatch("123"), 23).is_none());
    }
}
