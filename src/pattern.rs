//! Pattern catalog: the ordered matchers that turn order text into commands.
//!
//! Catalog order is load-bearing. The extractor stops at the first pattern
//! that matches, so a general pattern placed before a specific one shadows
//! it. Definitions are validated when the catalog is built; a catalog that
//! exists is always consistent.

use std::collections::BTreeSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::action::ActionKind;
use crate::error::{SaintResult, ValidationError};

/// Maximum matcher expression length.
pub const MAX_MATCHER_LEN: usize = 1024;

/// Boundary format of one pattern: matcher, action name, capture names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDefinition {
    /// Action name the pattern produces.
    pub action: String,
    /// Regular expression applied to the order text.
    pub matcher: String,
    /// Names bound to the matcher's groups, in group order.
    pub captures: Vec<String>,
}

impl PatternDefinition {
    /// Creates a definition.
    #[must_use]
    pub fn new(action: impl Into<String>, matcher: impl Into<String>, captures: &[&str]) -> Self {
        Self {
            action: action.into(),
            matcher: matcher.into(),
            captures: captures.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.action.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "action".to_string(),
            });
        }
        if self.matcher.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "matcher".to_string(),
            });
        }
        if self.matcher.len() > MAX_MATCHER_LEN {
            return Err(ValidationError::FieldTooLong {
                field: "matcher".to_string(),
                max_length: MAX_MATCHER_LEN,
            });
        }

        let mut seen = BTreeSet::new();
        for capture in &self.captures {
            if capture.trim().is_empty() {
                return Err(ValidationError::MissingField {
                    field: "captures".to_string(),
                });
            }
            if !seen.insert(capture.as_str()) {
                return Err(ValidationError::DuplicateCapture {
                    action: self.action.clone(),
                    capture: capture.clone(),
                });
            }
        }

        if let Some(kind) = ActionKind::from_name(&self.action) {
            for required in kind.required_captures() {
                if !seen.contains(required) {
                    return Err(ValidationError::MissingCapture {
                        action: self.action.clone(),
                        capture: (*required).to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A validated definition with its compiled matcher.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    definition: PatternDefinition,
    regex: Regex,
}

impl CompiledPattern {
    /// Validates and compiles a definition.
    ///
    /// # Errors
    ///
    /// Rejects empty fields, duplicate capture names, built-in actions
    /// missing a capture their family needs, matchers that do not compile,
    /// and capture lists whose length differs from the group count.
    pub fn compile(definition: PatternDefinition) -> SaintResult<Self> {
        definition.validate()?;
        let regex =
            Regex::new(&definition.matcher).map_err(|e| ValidationError::InvalidMatcher {
                action: definition.action.clone(),
                reason: e.to_string(),
            })?;

        let groups = regex.captures_len() - 1;
        if groups != definition.captures.len() {
            return Err(ValidationError::CaptureCountMismatch {
                action: definition.action.clone(),
                declared: definition.captures.len(),
                groups,
            }
            .into());
        }
        Ok(Self { definition, regex })
    }

    /// Action name.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.definition.action
    }

    /// Capture names in group order.
    #[must_use]
    pub fn captures(&self) -> &[String] {
        &self.definition.captures
    }

    /// The source definition.
    #[must_use]
    pub fn definition(&self) -> &PatternDefinition {
        &self.definition
    }

    pub(crate) fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// Ordered, validated pattern catalog.
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    patterns: Vec<CompiledPattern>,
}

impl PatternCatalog {
    /// Builds a catalog, validating every definition in order.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid definition; see [`CompiledPattern::compile`].
    pub fn load(definitions: impl IntoIterator<Item = PatternDefinition>) -> SaintResult<Self> {
        let patterns = definitions
            .into_iter()
            .map(CompiledPattern::compile)
            .collect::<SaintResult<Vec<_>>>()?;
        info!(patterns = patterns.len(), "pattern catalog loaded");
        Ok(Self { patterns })
    }

    /// Parses a JSON array of definitions and loads it.
    pub fn from_json(s: &str) -> SaintResult<Self> {
        let definitions: Vec<PatternDefinition> =
            serde_json::from_str(s).map_err(|e| ValidationError::InvalidMatcher {
                action: "<catalog>".to_string(),
                reason: e.to_string(),
            })?;
        Self::load(definitions)
    }

    /// The built-in catalog covering all twelve action families.
    ///
    /// # Errors
    ///
    /// Only on an internal defect in the built-in definitions.
    pub fn builtin() -> SaintResult<Self> {
        Self::load(builtin_definitions())
    }

    /// Appends validated definitions after the existing ones.
    pub fn extend(
        &mut self,
        definitions: impl IntoIterator<Item = PatternDefinition>,
    ) -> SaintResult<()> {
        for definition in definitions {
            self.patterns.push(CompiledPattern::compile(definition)?);
        }
        Ok(())
    }

    /// Patterns in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &CompiledPattern> {
        self.patterns.iter()
    }

    /// Number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if the catalog holds no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Patterns producing `action`.
    pub fn patterns_for<'a>(&'a self, action: &'a str) -> impl Iterator<Item = &'a CompiledPattern> {
        self.patterns.iter().filter(move |p| p.action() == action)
    }

    /// Returns true if some pattern produces `action`.
    #[must_use]
    pub fn produces(&self, action: &str) -> bool {
        self.patterns_for(action).next().is_some()
    }
}

/// Definitions of the built-in catalog, in match order.
///
/// "move train" orders are split between `transfer` and `change_track` by
/// the word following "from".
#[must_use]
pub fn builtin_definitions() -> Vec<PatternDefinition> {
    const ID: &str = r"([\w-]+)";
    let p = |action: ActionKind, matcher: String, captures: &[&str]| {
        PatternDefinition::new(action.name(), matcher, captures)
    };

    vec![
        p(
            ActionKind::Transfer,
            format!(r"(?i)\b(?:transfer|move)\s+train\s+{ID}\s+from\s+platform\s+{ID}\s+to\s+platform\s+{ID}"),
            &["train", "from_platform", "to_platform"],
        ),
        p(
            ActionKind::ChangeTrack,
            format!(r"(?i)\b(?:move|switch)\s+train\s+{ID}\s+from\s+track\s+{ID}\s+to\s+track\s+{ID}"),
            &["train", "from_track", "to_track"],
        ),
        p(
            ActionKind::Reposition,
            format!(r"(?i)\breposition\s+train\s+{ID}\s+to\s+track\s+{ID}"),
            &["train", "track"],
        ),
        p(
            ActionKind::AttachWagon,
            format!(r"(?i)\battach\s+wagon\s+{ID}\s+to\s+train\s+{ID}"),
            &["wagon", "train"],
        ),
        p(
            ActionKind::DetachWagon,
            format!(r"(?i)\bdetach\s+wagon\s+{ID}\s+from\s+train\s+{ID}"),
            &["wagon", "train"],
        ),
        p(
            ActionKind::FormConsist,
            format!(
                r"(?i)\bform\s+consist\s+(?:for\s+)?train\s+{ID}\s+from\s+wagons?\s+([\w-]+(?:\s*,\s*[\w-]+)*)"
            ),
            &["train", "wagons"],
        ),
        p(
            ActionKind::DisbandConsist,
            format!(r"(?i)\bdisband\s+consist\s+(?:of\s+)?train\s+{ID}"),
            &["train"],
        ),
        p(
            ActionKind::AssignCrew,
            format!(r"(?i)\bassign\s+crew\s+{ID}\s+to\s+train\s+{ID}"),
            &["crew", "train"],
        ),
        p(
            ActionKind::DelayDeparture,
            format!(
                r"(?i)\bdelay\s+(?:the\s+)?departure\s+of\s+train\s+{ID}\s+by\s+([1-9]\d*)\s+min(?:ute)?s?\b"
            ),
            &["train", "minutes"],
        ),
        p(
            ActionKind::Dispatch,
            format!(r"(?i)\bdispatch\s+train\s+{ID}"),
            &["train"],
        ),
        p(
            ActionKind::Inspect,
            format!(r"(?i)\binspect\s+train\s+{ID}"),
            &["train"],
        ),
        p(
            ActionKind::CheckWagon,
            format!(r"(?i)\bcheck\s+wagon\s+{ID}"),
            &["wagon"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SaintError;

    #[test]
    fn test_builtin_catalog_covers_every_family() {
        let catalog = PatternCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 12);
        for kind in ActionKind::ALL {
            assert!(catalog.produces(kind.name()), "no pattern for {kind}");
        }
    }

    #[test]
    fn test_capture_count_mismatch_rejected_at_load() {
        let err = PatternCatalog::load([PatternDefinition::new(
            "inspect",
            r"inspect\s+train\s+(\w+)\s+at\s+(\w+)",
            &["train"],
        )])
        .unwrap_err();
        match err {
            SaintError::Validation(ValidationError::CaptureCountMismatch {
                declared, groups, ..
            }) => {
                assert_eq!(declared, 1);
                assert_eq!(groups, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_matcher_rejected() {
        let err = PatternCatalog::load([PatternDefinition::new("wash", r"wash\s+(", &["train"])])
            .unwrap_err();
        assert!(matches!(
            err,
            SaintError::Validation(ValidationError::InvalidMatcher { .. })
        ));
    }

    #[test]
    fn test_builtin_action_requires_family_captures() {
        let err = PatternCatalog::load([PatternDefinition::new(
            "transfer",
            r"transfer\s+train\s+(\w+)\s+to\s+(\w+)",
            &["train", "platform"],
        )])
        .unwrap_err();
        assert!(matches!(
            err,
            SaintError::Validation(ValidationError::MissingCapture { ref capture, .. })
                if capture == "from_platform"
        ));
    }

    #[test]
    fn test_duplicate_capture_rejected() {
        let err = PatternCatalog::load([PatternDefinition::new(
            "wash",
            r"wash\s+(\w+)\s+and\s+(\w+)",
            &["train", "train"],
        )])
        .unwrap_err();
        assert!(matches!(
            err,
            SaintError::Validation(ValidationError::DuplicateCapture { .. })
        ));
    }

    #[test]
    fn test_overlong_matcher_rejected() {
        let matcher = "a".repeat(MAX_MATCHER_LEN + 1);
        let err = PatternCatalog::load([PatternDefinition::new("wash", matcher, &[])]).unwrap_err();
        assert!(matches!(
            err,
            SaintError::Validation(ValidationError::FieldTooLong { .. })
        ));
    }

    #[test]
    fn test_from_json_and_extend_preserve_order() {
        let mut catalog = PatternCatalog::from_json(
            r#"[{"action": "wash_train", "matcher": "(?i)wash\\s+train\\s+(\\w+)", "captures": ["train"]}]"#,
        )
        .unwrap();
        catalog
            .extend([PatternDefinition::new("inspect", r"(?i)inspect\s+train\s+(\w+)", &["train"])])
            .unwrap();
        let actions: Vec<_> = catalog.iter().map(CompiledPattern::action).collect();
        assert_eq!(actions, vec!["wash_train", "inspect"]);
        assert_eq!(catalog.patterns_for("inspect").count(), 1);
    }
}
