//! `EvaluationResult`, the structured answer to one `evaluate` call.
//!
//! A result is either Feasible with a plan, or Infeasible with the complete
//! list of reasons. Nothing an operator needs to see is reported as an
//! error; only engine defects abort a call.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::command::{CommandId, ExtractedCommand};
use crate::conflict::ConflictDescriptor;
use crate::error::{SaintError, SaintResult};

/// Overall verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feasibility {
    /// Every check passed.
    Feasible,
    /// At least one reason blocks the command.
    Infeasible,
}

impl fmt::Display for Feasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feasible => write!(f, "Feasible"),
            Self::Infeasible => write!(f, "Infeasible"),
        }
    }
}

/// Category of a failure reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind {
    /// No pattern matched the text.
    NoMatch,
    /// A rule references something the ontology cannot resolve, or the
    /// action has no rule and no built-in family.
    MalformedRule,
    /// A referenced entity is missing from the fact store.
    EntityNotFound,
    /// An attribute check failed.
    ConditionFailed,
    /// The command contends with a pending command.
    ConflictDetected,
    /// The time-sensitive inspection constraint applies.
    InspectionRequired,
    /// The input itself was refused before extraction.
    InputRejected,
}

/// One failure reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    /// Category.
    pub kind: ReasonKind,
    /// Operator-facing message.
    pub message: String,
}

impl Reason {
    /// Creates a reason.
    #[must_use]
    pub fn new(kind: ReasonKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Structured outcome of evaluating one order text.
///
/// `reasons` is empty iff `status` is Feasible; `plan` is present iff
/// `status` is Feasible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Verdict.
    pub status: Feasibility,
    /// Display label, taken from the rule's conclusion when it has one.
    pub status_label: String,
    /// Every failure reason, in evaluation order.
    pub reasons: Vec<Reason>,
    /// Ordered execution steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Vec<String>>,
    /// Pending commands this one contends with.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<ConflictDescriptor>,
    /// The extracted command, absent when nothing matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<ExtractedCommand>,
    /// Deterministic id of the extracted command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_id: Option<CommandId>,
}

impl EvaluationResult {
    /// A Feasible result carrying `plan`.
    #[must_use]
    pub fn feasible(command: ExtractedCommand, command_id: CommandId, plan: Vec<String>) -> Self {
        Self {
            status: Feasibility::Feasible,
            status_label: Feasibility::Feasible.to_string(),
            reasons: Vec::new(),
            plan: Some(plan),
            conflicts: Vec::new(),
            command: Some(command),
            command_id: Some(command_id),
        }
    }

    /// An Infeasible result. `reasons` must not be empty.
    #[must_use]
    pub fn infeasible(reasons: Vec<Reason>) -> Self {
        debug_assert!(!reasons.is_empty());
        Self {
            status: Feasibility::Infeasible,
            status_label: Feasibility::Infeasible.to_string(),
            reasons,
            plan: None,
            conflicts: Vec::new(),
            command: None,
            command_id: None,
        }
    }

    /// An Infeasible result with a single reason.
    #[must_use]
    pub fn rejected(kind: ReasonKind, message: impl Into<String>) -> Self {
        Self::infeasible(vec![Reason::new(kind, message)])
    }

    /// Attaches the command the result is about.
    #[must_use]
    pub fn with_command(mut self, command: ExtractedCommand, command_id: CommandId) -> Self {
        self.command = Some(command);
        self.command_id = Some(command_id);
        self
    }

    /// Attaches conflict descriptors.
    #[must_use]
    pub fn with_conflicts(mut self, conflicts: Vec<ConflictDescriptor>) -> Self {
        self.conflicts = conflicts;
        self
    }

    /// Overrides the display label.
    #[must_use]
    pub fn with_status_label(mut self, label: impl Into<String>) -> Self {
        self.status_label = label.into();
        self
    }

    /// Returns true if the command can be executed now.
    #[must_use]
    pub fn is_feasible(&self) -> bool {
        self.status == Feasibility::Feasible
    }

    /// Reason messages in order.
    #[must_use]
    pub fn reason_messages(&self) -> Vec<&str> {
        self.reasons.iter().map(|r| r.message.as_str()).collect()
    }

    /// Returns true if any reason has the given kind.
    #[must_use]
    pub fn has_reason(&self, kind: ReasonKind) -> bool {
        self.reasons.iter().any(|r| r.kind == kind)
    }

    /// Reasons joined into one line, as shown in the decision log.
    #[must_use]
    pub fn details(&self) -> String {
        if self.reasons.is_empty() {
            "all conditions satisfied".to_string()
        } else {
            self.reason_messages().join(" ")
        }
    }

    /// Plan steps, one per line. Empty when there is no plan.
    #[must_use]
    pub fn plan_text(&self) -> String {
        self.plan.as_deref().map(|steps| steps.join("\n")).unwrap_or_default()
    }

    /// Serializes the result as pretty JSON.
    pub fn to_json_pretty(&self) -> SaintResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SaintError::inconsistency(format!("result serialization failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatch() -> ExtractedCommand {
        ExtractedCommand::new("dispatch", [("train".to_string(), "123".to_string())])
    }

    #[test]
    fn test_feasible_result_shape() {
        let cmd = dispatch();
        let id = CommandId::derive("dispatch", "dispatch train 123");
        let result = EvaluationResult::feasible(cmd, id, vec!["Step 1: a".into(), "Step 2: b".into()]);
        assert!(result.is_feasible());
        assert!(result.reasons.is_empty());
        assert_eq!(result.details(), "all conditions satisfied");
        assert_eq!(result.plan_text(), "Step 1: a\nStep 2: b");
        assert_eq!(result.status_label, "Feasible");
    }

    #[test]
    fn test_infeasible_details_joins_reasons() {
        let result = EvaluationResult::infeasible(vec![
            Reason::new(ReasonKind::EntityNotFound, "train does not exist"),
            Reason::new(ReasonKind::ConditionFailed, "platform is occupied"),
        ]);
        assert!(!result.is_feasible());
        assert!(result.plan.is_none());
        assert_eq!(result.details(), "train does not exist platform is occupied");
        assert_eq!(result.plan_text(), "");
        assert!(result.has_reason(ReasonKind::ConditionFailed));
        assert!(!result.has_reason(ReasonKind::NoMatch));
    }

    #[test]
    fn test_json_shape() {
        let result = EvaluationResult::rejected(ReasonKind::NoMatch, "command not recognized");
        let json: serde_json::Value =
            serde_json::from_str(&result.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["status"], "infeasible");
        assert_eq!(json["reasons"][0]["kind"], "no_match");
        assert!(json.get("plan").is_none());
        assert!(json.get("conflicts").is_none());
    }
}
