//! Feasibility engine: extraction, conditions, constraints, conflicts, plan.
//!
//! The engine holds only its configuration. Facts, ontology, catalog, rules
//! and the pending set are all passed in per call, so concurrent calls never
//! share mutable state and the same inputs always give the same result.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::command::{CommandId, PendingCommand};
use crate::config::EngineConfig;
use crate::conflict::{ConflictDetector, ConstraintEvaluator};
use crate::error::SaintResult;
use crate::extract::{extract, Extraction};
use crate::ontology::OntologyRegistry;
use crate::outcome::{EvaluationResult, Reason, ReasonKind};
use crate::pattern::PatternCatalog;
use crate::plan::PlanGenerator;
use crate::rule::{ConditionEvaluator, RuleSet};
use crate::storage::FactStore;

/// Reason message for text no pattern matches.
pub const NOT_RECOGNIZED: &str = "command not recognized";
/// Reason message for text longer than the configured bound.
pub const TOO_LONG: &str = "command text too long";

/// Immutable view of operational state for one or more evaluation calls.
///
/// `taken_at` is the instant time-sensitive constraints are evaluated at;
/// the engine never reads the clock itself.
#[derive(Clone)]
pub struct OperationalSnapshot {
    /// Entity collections.
    pub facts: Arc<dyn FactStore>,
    /// Logical to physical name mapping.
    pub ontology: Arc<OntologyRegistry>,
    /// Evaluation instant.
    pub taken_at: DateTime<Utc>,
}

impl OperationalSnapshot {
    /// Bundles facts and ontology taken at `taken_at`.
    #[must_use]
    pub fn new(
        facts: impl FactStore + 'static,
        ontology: OntologyRegistry,
        taken_at: DateTime<Utc>,
    ) -> Self {
        Self {
            facts: Arc::new(facts),
            ontology: Arc::new(ontology),
            taken_at,
        }
    }

    /// Facts under the default railway ontology.
    #[must_use]
    pub fn railway(facts: impl FactStore + 'static, taken_at: DateTime<Utc>) -> Self {
        Self::new(facts, OntologyRegistry::railway(), taken_at)
    }

    /// The same facts and ontology at another instant.
    #[must_use]
    pub fn at(&self, taken_at: DateTime<Utc>) -> Self {
        Self {
            taken_at,
            ..self.clone()
        }
    }
}

/// Evaluates order texts for feasibility.
#[derive(Debug, Clone, Default)]
pub struct FeasibilityEngine {
    config: EngineConfig,
    detector: ConflictDetector,
    planner: PlanGenerator,
}

impl FeasibilityEngine {
    /// Creates an engine after validating `config`.
    pub fn new(config: EngineConfig) -> SaintResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            detector: ConflictDetector::new(),
            planner: PlanGenerator::new(),
        })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluates one order text.
    ///
    /// Every operator-facing outcome, including unrecognized text and
    /// malformed rules, is an `Ok` result. `Err` means an internal
    /// inconsistency that aborts this call only.
    pub fn evaluate(
        &self,
        text: &str,
        snapshot: &OperationalSnapshot,
        catalog: &PatternCatalog,
        rules: &RuleSet,
        pending: &[PendingCommand],
    ) -> SaintResult<EvaluationResult> {
        if text.len() > self.config.max_input_len {
            debug!(len = text.len(), max = self.config.max_input_len, "order text rejected");
            return Ok(EvaluationResult::rejected(ReasonKind::InputRejected, TOO_LONG));
        }

        let command = match extract(text, catalog) {
            Extraction::Matched(command) => command,
            Extraction::NoMatch => {
                return Ok(EvaluationResult::rejected(ReasonKind::NoMatch, NOT_RECOGNIZED));
            }
        };
        let id = CommandId::derive(command.action(), text);

        let action = match Action::from_command(&command) {
            Ok(action) => action,
            Err(e) => {
                warn!(action = command.action(), error = %e, "command cannot be typed");
                return Ok(EvaluationResult::rejected(e.reason_kind(), e.to_string())
                    .with_command(command, id));
            }
        };
        let rule = rules.for_action(command.action());
        let templated = rule
            .and_then(|r| r.conclusion.plan.as_ref())
            .is_some_and(|steps| !steps.is_empty());
        if action.is_none() && !templated {
            let message = format!("command not supported: {}", command.action());
            return Ok(EvaluationResult::rejected(ReasonKind::MalformedRule, message)
                .with_command(command, id));
        }

        let mut conditions = action.as_ref().map(Action::preconditions).unwrap_or_default();
        if let Some(rule) = rule {
            conditions.extend(rule.conditions.iter().cloned());
        }

        let facts = snapshot.facts.as_ref();
        let ontology = snapshot.ontology.as_ref();
        let report = ConditionEvaluator::new(facts, ontology).evaluate(&conditions, &command);
        let mut reasons: Vec<Reason> = report.reasons;

        if let Some(reason) = ConstraintEvaluator::new(facts, ontology, &self.config.inspection)
            .inspection(action.as_ref(), &command, snapshot.taken_at)
        {
            reasons.push(reason);
        }

        let candidate = PendingCommand {
            id,
            text: text.to_string(),
            command,
        };
        let conflicts = match self.detector.detect(&candidate, pending) {
            Ok(conflicts) => conflicts,
            Err(e) => {
                warn!(error = %e, "pending set holds a command that cannot be typed");
                reasons.push(Reason::new(
                    e.reason_kind(),
                    format!("pending set cannot be checked: {e}"),
                ));
                Vec::new()
            }
        };
        reasons.extend(
            conflicts
                .iter()
                .map(|c| Reason::new(ReasonKind::ConflictDetected, c.message())),
        );
        let command = candidate.command;

        let result = if reasons.is_empty() {
            let template = rule.and_then(|r| r.conclusion.plan.as_deref());
            let plan = self.planner.plan(&command, template)?;
            let result = EvaluationResult::feasible(command, id, plan);
            match rule.and_then(|r| r.conclusion.status.as_deref()) {
                Some(label) => result.with_status_label(label),
                None => result,
            }
        } else {
            EvaluationResult::infeasible(reasons)
                .with_command(command, id)
                .with_conflicts(conflicts)
        };

        info!(
            command = %id,
            status = %result.status,
            reasons = result.reasons.len(),
            "order evaluated"
        );
        Ok(result)
    }

    /// Evaluates texts in order. Each Feasible command joins `pending`
    /// before the next text is evaluated.
    pub fn evaluate_sequence<S: AsRef<str>>(
        &self,
        texts: &[S],
        snapshot: &OperationalSnapshot,
        catalog: &PatternCatalog,
        rules: &RuleSet,
        pending: &mut Vec<PendingCommand>,
    ) -> SaintResult<Vec<EvaluationResult>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            let text = text.as_ref();
            let result = self.evaluate(text, snapshot, catalog, rules, pending)?;
            if let Some(command) = result.command.as_ref().filter(|_| result.is_feasible()) {
                pending.push(PendingCommand::new(text, command.clone()));
            }
            results.push(result);
        }
        Ok(results)
    }
}
