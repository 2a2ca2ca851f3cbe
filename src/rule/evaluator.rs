//! Condition evaluation against one fact snapshot.

use std::collections::BTreeSet;

use tracing::debug;

use crate::command::ExtractedCommand;
use crate::entity::EntityRecord;
use crate::ontology::{OntologyError, OntologyRegistry};
use crate::outcome::{Reason, ReasonKind};
use crate::storage::FactStore;
use crate::value::Value;

use super::condition::Condition;

/// Outcome of evaluating a condition list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionReport {
    /// One reason per failing condition, in declared order.
    pub reasons: Vec<Reason>,
    /// Number of conditions evaluated.
    pub checked: usize,
}

impl ConditionReport {
    /// Returns true if no condition failed.
    #[must_use]
    pub fn feasible(&self) -> bool {
        self.reasons.is_empty()
    }
}

/// Evaluates conditions for a command against facts, through the ontology.
#[derive(Clone, Copy)]
pub struct ConditionEvaluator<'a> {
    facts: &'a dyn FactStore,
    ontology: &'a OntologyRegistry,
}

enum Lookup<'f> {
    Found(&'f EntityRecord),
    Missing,
}

impl<'a> ConditionEvaluator<'a> {
    /// Creates an evaluator over one snapshot.
    #[must_use]
    pub fn new(facts: &'a dyn FactStore, ontology: &'a OntologyRegistry) -> Self {
        Self { facts, ontology }
    }

    /// Evaluates every condition; never stops at the first failure.
    ///
    /// An attribute check whose subject is missing is skipped when the same
    /// list also checks that subject's existence, so a missing entity is
    /// reported once. Without such a check the missing subject is the
    /// condition's failure.
    #[must_use]
    pub fn evaluate(&self, conditions: &[Condition], command: &ExtractedCommand) -> ConditionReport {
        let existence_checked: BTreeSet<(&str, &str)> = conditions
            .iter()
            .filter(|c| matches!(c, Condition::Exists { .. }))
            .map(|c| (c.entity(), c.key()))
            .collect();

        let mut report = ConditionReport::default();
        for condition in conditions {
            report.checked += 1;
            let covered = existence_checked.contains(&(condition.entity(), condition.key()));
            if let Some(reason) = self.check(condition, command, covered) {
                debug!(
                    action = command.action(),
                    entity = condition.entity(),
                    reason = %reason.message,
                    "condition failed"
                );
                report.reasons.push(reason);
            }
        }
        report
    }

    fn check(&self, condition: &Condition, command: &ExtractedCommand, covered: bool) -> Option<Reason> {
        let key_capture = condition.key();
        let keys = if condition.is_each() {
            command.list(key_capture)
        } else {
            command.capture(key_capture).map(|k| vec![k.to_string()])
        };
        let Some(keys) = keys else {
            return Some(Reason::new(
                ReasonKind::MalformedRule,
                format!("condition on {} reads missing capture '{key_capture}'", condition.entity()),
            ));
        };

        let field = match condition.attribute() {
            Some(attribute) => match self.ontology.field(condition.entity(), attribute) {
                Ok(field) => Some(field),
                Err(e) => return Some(malformed(&e)),
            },
            None => None,
        };

        let mut missing: Vec<&str> = Vec::new();
        let mut failed: Vec<&str> = Vec::new();
        let mut last_actual: Option<&Value> = None;

        for key in &keys {
            let lookup = match self.ontology.find(self.facts, condition.entity(), key) {
                Ok(Some(record)) => Lookup::Found(record),
                Ok(None) => Lookup::Missing,
                Err(e) => return Some(malformed(&e)),
            };

            match (condition, lookup) {
                (Condition::Exists { .. }, Lookup::Missing) => missing.push(key),
                (Condition::Exists { .. }, Lookup::Found(_)) => {}
                (_, Lookup::Missing) if covered => {}
                (_, Lookup::Missing) => missing.push(key),
                (_, Lookup::Found(record)) => {
                    let actual = field.and_then(|f| record.get(f));
                    if !holds(condition, actual, command) {
                        failed.push(key);
                        last_actual = actual;
                    }
                }
            }
        }

        if failed.is_empty() && missing.is_empty() {
            return None;
        }

        if failed.is_empty() {
            let message = match condition {
                Condition::Exists { .. } => render(condition, command, &missing, default_exists(condition)),
                _ => default_exists(condition),
            };
            return Some(Reason::new(ReasonKind::EntityNotFound, with_keys(condition, message, &missing)));
        }

        failed.extend(missing);
        let message = render(condition, command, &failed, default_mismatch(condition, last_actual));
        Some(Reason::new(ReasonKind::ConditionFailed, with_keys(condition, message, &failed)))
    }
}

fn holds(condition: &Condition, actual: Option<&Value>, command: &ExtractedCommand) -> bool {
    match condition {
        Condition::Exists { .. } => true,
        Condition::AttributeEquals { expected, .. } => actual == Some(expected),
        Condition::AttributePredicate { predicate, .. } => predicate.holds(actual, command),
    }
}

fn malformed(e: &OntologyError) -> Reason {
    Reason::new(ReasonKind::MalformedRule, e.to_string())
}

fn default_exists(condition: &Condition) -> String {
    format!("{} does not exist", condition.entity().to_lowercase())
}

fn default_mismatch(condition: &Condition, actual: Option<&Value>) -> String {
    let entity = condition.entity().to_lowercase();
    let attribute = condition.attribute().unwrap_or_default().to_lowercase();
    let actual = actual.map_or_else(|| "absent".to_string(), ToString::to_string);
    match condition {
        Condition::AttributeEquals { expected, .. } if !condition.is_each() => {
            format!("{entity} {attribute} is {actual}, expected {expected}")
        }
        Condition::AttributeEquals { expected, .. } => {
            format!("{entity} {attribute} is not {expected}")
        }
        Condition::AttributePredicate { predicate, .. } => {
            format!("{entity} {attribute} does not satisfy '{predicate}'")
        }
        Condition::Exists { .. } => default_exists(condition),
    }
}

/// Uses the condition's own message when it has one, expanding `{key}` and
/// capture placeholders.
fn render(condition: &Condition, command: &ExtractedCommand, keys: &[&str], fallback: String) -> String {
    match condition.reason() {
        Some(template) => command.render(&template.replace("{key}", &keys.join(", "))),
        None => fallback,
    }
}

/// List conditions name the offending keys unless the message already does.
fn with_keys(condition: &Condition, message: String, keys: &[&str]) -> String {
    let templated = condition.reason().is_some_and(|r| r.contains("{key}"));
    if condition.is_each() && !templated {
        format!("{message}: {}", keys.join(", "))
    } else {
        message
    }
}
