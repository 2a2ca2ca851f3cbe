//! Declarative rules: conditions plus a conclusion, keyed by action.
//!
//! A rule refines one action. For built-in families its conditions run
//! after the family's fixed bundle; for other actions the rule is the only
//! source of preconditions.

mod condition;
mod definition;
mod evaluator;

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::error::{SaintResult, ValidationError};
use crate::pattern::PatternCatalog;

pub use condition::{Condition, Predicate};
pub use definition::{load_stored_rules, StoredRule};
pub use evaluator::{ConditionEvaluator, ConditionReport};

/// What a rule concludes when its command is feasible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conclusion {
    /// Status label reported instead of "Feasible".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Plan template overriding the fixed per-action plan. Steps may use
    /// `{capture}` placeholders. Accepted as a list or as one string with a
    /// step per line.
    #[serde(
        default,
        deserialize_with = "deserialize_plan",
        skip_serializing_if = "Option::is_none"
    )]
    pub plan: Option<Vec<String>>,
}

fn deserialize_plan<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Plan {
        Text(String),
        Steps(Vec<String>),
    }

    let steps = match Option::<Plan>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Plan::Text(text)) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>(),
        Some(Plan::Steps(steps)) => steps,
    };
    Ok((!steps.is_empty()).then_some(steps))
}

/// A named rule for one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Rule name.
    pub name: String,
    /// Action the rule applies to.
    pub action: String,
    /// Preconditions, evaluated in order without short-circuit.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Conclusion.
    #[serde(default)]
    pub conclusion: Conclusion,
}

impl Rule {
    /// Creates a rule with no conditions.
    #[must_use]
    pub fn new(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: action.into(),
            conditions: Vec::new(),
            conclusion: Conclusion::default(),
        }
    }

    /// Appends a condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Sets the conclusion status label.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.conclusion.status = Some(status.into());
        self
    }

    /// Sets the plan template.
    #[must_use]
    pub fn with_plan(mut self, steps: Vec<String>) -> Self {
        self.conclusion.plan = Some(steps);
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "name".to_string(),
            });
        }
        if self.action.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "action".to_string(),
            });
        }
        for condition in &self.conditions {
            let blank_attribute = condition.attribute().is_some_and(|a| a.trim().is_empty());
            if condition.entity().trim().is_empty() || condition.key().trim().is_empty() || blank_attribute {
                return Err(ValidationError::InvalidRuleDefinition {
                    rule: self.name.clone(),
                    reason: "condition has an empty entity, key or attribute".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Validated set of rules, at most one per action.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// An empty set: built-in families run on their fixed bundles alone.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validates rules against `catalog`.
    ///
    /// # Errors
    ///
    /// Rejects blank names, duplicate actions, and conditions reading a
    /// capture that some pattern of the rule's action does not declare.
    /// Rules whose action no pattern produces are kept and logged.
    pub fn load(rules: impl IntoIterator<Item = Rule>, catalog: &PatternCatalog) -> SaintResult<Self> {
        let rules: Vec<Rule> = rules.into_iter().collect();
        let mut actions = BTreeSet::new();

        for rule in &rules {
            rule.validate()?;
            if !actions.insert(rule.action.as_str()) {
                return Err(ValidationError::InvalidRuleDefinition {
                    rule: rule.name.clone(),
                    reason: format!("another rule already covers action '{}'", rule.action),
                }
                .into());
            }

            for pattern in catalog.patterns_for(&rule.action) {
                for condition in &rule.conditions {
                    for capture in condition.captures() {
                        if !pattern.captures().iter().any(|c| c == capture) {
                            return Err(ValidationError::UnknownCapture {
                                rule: rule.name.clone(),
                                action: rule.action.clone(),
                                capture: capture.to_string(),
                            }
                            .into());
                        }
                    }
                }
            }
        }

        let set = Self { rules };
        for rule in set.unreachable(catalog) {
            warn!(rule = %rule.name, action = %rule.action, "rule is unreachable: no pattern produces its action");
        }
        info!(rules = set.rules.len(), "rule set loaded");
        Ok(set)
    }

    /// Parses a JSON array of rules and loads it.
    pub fn from_json(s: &str, catalog: &PatternCatalog) -> SaintResult<Self> {
        let rules: Vec<Rule> =
            serde_json::from_str(s).map_err(|e| ValidationError::InvalidRuleDefinition {
                rule: "<rule set>".to_string(),
                reason: e.to_string(),
            })?;
        Self::load(rules, catalog)
    }

    /// The rule covering `action`.
    #[must_use]
    pub fn for_action(&self, action: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.action == action)
    }

    /// Rules no pattern in `catalog` can reach.
    #[must_use]
    pub fn unreachable<'a>(&'a self, catalog: &PatternCatalog) -> Vec<&'a Rule> {
        self.rules
            .iter()
            .filter(|r| !catalog.produces(&r.action))
            .collect()
    }

    /// Rules in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SaintError;
    use crate::pattern::PatternDefinition;

    fn catalog() -> PatternCatalog {
        PatternCatalog::builtin().unwrap()
    }

    #[test]
    fn test_load_accepts_declared_captures() {
        let rule = Rule::new("crew on board", "dispatch")
            .with_condition(Condition::predicate("Train", "train", "Crew", Predicate::Present))
            .with_status("Ready to depart");
        let set = RuleSet::load([rule], &catalog()).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(
            set.for_action("dispatch").unwrap().conclusion.status.as_deref(),
            Some("Ready to depart")
        );
        assert!(set.for_action("inspect").is_none());
    }

    #[test]
    fn test_load_rejects_unknown_capture() {
        let rule = Rule::new("bad", "dispatch").with_condition(Condition::exists("Crew", "crew"));
        let err = RuleSet::load([rule], &catalog()).unwrap_err();
        assert!(matches!(
            err,
            SaintError::Validation(ValidationError::UnknownCapture { ref capture, .. }) if capture == "crew"
        ));
    }

    #[test]
    fn test_load_rejects_duplicate_action() {
        let err = RuleSet::load(
            [Rule::new("a", "dispatch"), Rule::new("b", "dispatch")],
            &catalog(),
        )
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_unreachable_rules_are_kept() {
        let set = RuleSet::load([Rule::new("orphan", "teleport")], &catalog()).unwrap();
        let unreachable: Vec<_> = set.unreachable(&catalog()).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(unreachable, vec!["orphan"]);

        let mut extended = catalog();
        extended
            .extend([PatternDefinition::new("teleport", r"teleport\s+(\w+)", &["train"])])
            .unwrap();
        assert!(set.unreachable(&extended).is_empty());
    }

    #[test]
    fn test_conclusion_plan_accepts_text_or_list() {
        let from_text: Conclusion =
            serde_json::from_str(r#"{"status": "OK", "plan": "Release {train}.\n\nDepart."}"#).unwrap();
        assert_eq!(
            from_text.plan,
            Some(vec!["Release {train}.".to_string(), "Depart.".to_string()])
        );

        let from_list: Conclusion = serde_json::from_str(r#"{"plan": ["a", "b"]}"#).unwrap();
        assert_eq!(from_list.plan.map(|p| p.len()), Some(2));

        let none: Conclusion = serde_json::from_str(r#"{"status": "OK"}"#).unwrap();
        assert!(none.plan.is_none());
    }

    #[test]
    fn test_from_json() {
        let set = RuleSet::from_json(
            r#"[{"name": "platform check", "action": "transfer",
                 "conditions": [{"check": "exists", "entity": "Platform", "key": "from_platform"}]}]"#,
            &catalog(),
        )
        .unwrap();
        assert_eq!(set.iter().next().unwrap().conditions.len(), 1);
    }
}
