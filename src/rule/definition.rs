//! Stored rule records as kept by the administrative store.
//!
//! One record per order template. The condition and conclusion columns are
//! JSON text; they are parsed here, once, so a malformed record fails the
//! load instead of an evaluation.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{SaintResult, ValidationError};
use crate::pattern::{PatternCatalog, PatternDefinition};

use super::{Conclusion, Condition, Rule, RuleSet};

/// One record of the rule store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRule {
    /// Rule name.
    pub name: String,
    /// Action the record's pattern produces.
    pub action: String,
    /// Matcher expression.
    pub pattern: String,
    /// Capture names bound to the matcher's groups.
    #[serde(default)]
    pub captures: Vec<String>,
    /// JSON text: a list of conditions, or a single condition object.
    #[serde(default)]
    pub conditions: String,
    /// JSON text: the conclusion object.
    #[serde(default)]
    pub conclusion: String,
}

impl StoredRule {
    /// The pattern half of the record.
    #[must_use]
    pub fn pattern_definition(&self) -> PatternDefinition {
        PatternDefinition {
            action: self.action.clone(),
            matcher: self.pattern.clone(),
            captures: self.captures.clone(),
        }
    }

    /// Parses the record's JSON columns into a rule.
    ///
    /// Blank columns mean "no conditions" and "default conclusion".
    ///
    /// # Errors
    ///
    /// `InvalidRuleDefinition` when either column is not valid JSON of the
    /// expected shape.
    pub fn parse_rule(&self) -> Result<Rule, ValidationError> {
        let invalid = |column: &str, e: serde_json::Error| ValidationError::InvalidRuleDefinition {
            rule: self.name.clone(),
            reason: format!("{column}: {e}"),
        };

        let conditions = if self.conditions.trim().is_empty() {
            Vec::new()
        } else {
            let raw: serde_json::Value =
                serde_json::from_str(&self.conditions).map_err(|e| invalid("conditions", e))?;
            let list = match raw {
                serde_json::Value::Null => Vec::new(),
                serde_json::Value::Array(items) => items,
                single @ serde_json::Value::Object(_) => vec![single],
                other => {
                    return Err(ValidationError::InvalidRuleDefinition {
                        rule: self.name.clone(),
                        reason: format!("conditions: expected a list or an object, got {other}"),
                    })
                }
            };
            list.into_iter()
                .map(serde_json::from_value::<Condition>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| invalid("conditions", e))?
        };

        let conclusion = if self.conclusion.trim().is_empty() {
            Conclusion::default()
        } else {
            serde_json::from_str(&self.conclusion).map_err(|e| invalid("conclusion", e))?
        };

        Ok(Rule {
            name: self.name.clone(),
            action: self.action.clone(),
            conditions,
            conclusion,
        })
    }
}

/// Turns stored records into a catalog and a rule set.
///
/// With `builtin` set, the records' patterns are appended after the
/// built-in catalog, so built-in phrasings keep precedence. Records sharing
/// an action contribute one pattern each but must not both carry a rule:
/// only the first record of an action yields a rule, and later records for
/// it must leave their condition and conclusion columns blank.
///
/// # Errors
///
/// Any invalid pattern, unparseable column, or rule failing
/// [`RuleSet::load`] rejects the whole load.
pub fn load_stored_rules(
    records: &[StoredRule],
    builtin: bool,
) -> SaintResult<(PatternCatalog, RuleSet)> {
    let mut catalog = if builtin {
        PatternCatalog::builtin()?
    } else {
        PatternCatalog::default()
    };
    catalog.extend(records.iter().map(StoredRule::pattern_definition))?;

    let mut rules: Vec<Rule> = Vec::new();
    for record in records {
        let rule = record.parse_rule()?;
        let blank = rule.conditions.is_empty() && rule.conclusion == Conclusion::default();
        if blank && rules.iter().any(|r| r.action == rule.action) {
            continue;
        }
        rules.push(rule);
    }

    let rules = RuleSet::load(rules, &catalog)?;
    info!(
        records = records.len(),
        patterns = catalog.len(),
        rules = rules.len(),
        "stored rules loaded"
    );
    Ok((catalog, rules))
}
