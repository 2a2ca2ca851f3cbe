//! Atomic preconditions and the predicate library they use.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::command::ExtractedCommand;
use crate::value::Value;

/// Named predicates applicable to a single attribute value.
///
/// `None` as the actual value means the record has no such field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Attribute is the boolean `true`.
    IsTrue,
    /// Attribute is the boolean `false` (absent does not count).
    IsFalse,
    /// Attribute exists and is not null or empty.
    Present,
    /// Attribute is missing, null or empty.
    Absent,
    /// Attribute equals `value` exactly.
    Equals {
        /// Expected value.
        value: Value,
    },
    /// Attribute exists and differs from `value`.
    NotEquals {
        /// Rejected value.
        value: Value,
    },
    /// Attribute equals one of `values`.
    OneOf {
        /// Accepted values.
        values: Vec<Value>,
    },
    /// Text attribute starts with `prefix`.
    StartsWith {
        /// Required prefix.
        prefix: String,
    },
    /// List attribute contains the value of a capture.
    ContainsCapture {
        /// Capture name.
        capture: String,
    },
}

impl Predicate {
    /// Creates an equality predicate.
    #[must_use]
    pub fn equals(value: impl Into<Value>) -> Self {
        Self::Equals {
            value: value.into(),
        }
    }

    /// Creates an inequality predicate.
    #[must_use]
    pub fn not_equals(value: impl Into<Value>) -> Self {
        Self::NotEquals {
            value: value.into(),
        }
    }

    /// Creates a list-membership predicate on a capture.
    #[must_use]
    pub fn contains_capture(capture: impl Into<String>) -> Self {
        Self::ContainsCapture {
            capture: capture.into(),
        }
    }

    /// Evaluates the predicate.
    #[must_use]
    pub fn holds(&self, actual: Option<&Value>, command: &ExtractedCommand) -> bool {
        match self {
            Self::IsTrue => actual.and_then(Value::as_bool) == Some(true),
            Self::IsFalse => actual.and_then(Value::as_bool) == Some(false),
            Self::Present => actual.is_some_and(|v| !v.is_empty()),
            Self::Absent => actual.map_or(true, Value::is_empty),
            Self::Equals { value } => actual == Some(value),
            Self::NotEquals { value } => actual.is_some_and(|v| v != value),
            Self::OneOf { values } => actual.is_some_and(|v| values.contains(v)),
            Self::StartsWith { prefix } => actual
                .and_then(Value::as_str)
                .is_some_and(|s| s.starts_with(prefix.as_str())),
            Self::ContainsCapture { capture } => {
                let (Some(list), Some(wanted)) =
                    (actual.and_then(Value::as_list), command.capture(capture))
                else {
                    return false;
                };
                list.iter().any(|item| item == wanted)
            }
        }
    }

    /// Capture referenced by this predicate, if any.
    #[must_use]
    pub fn capture(&self) -> Option<&str> {
        match self {
            Self::ContainsCapture { capture } => Some(capture),
            _ => None,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IsTrue => write!(f, "is true"),
            Self::IsFalse => write!(f, "is false"),
            Self::Present => write!(f, "is present"),
            Self::Absent => write!(f, "is absent"),
            Self::Equals { value } => write!(f, "equals {value}"),
            Self::NotEquals { value } => write!(f, "does not equal {value}"),
            Self::OneOf { values } => {
                let items: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "is one of {}", items.join(", "))
            }
            Self::StartsWith { prefix } => write!(f, "starts with {prefix}"),
            Self::ContainsCapture { capture } => write!(f, "contains {{{capture}}}"),
        }
    }
}

/// One atomic precondition.
///
/// Every variant names a logical entity and the capture holding its key.
/// With `each` set, the capture is a comma-separated list and the check
/// applies to every listed key; the condition still yields one reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Condition {
    /// The entity identified by the key exists.
    Exists {
        /// Logical entity name.
        entity: String,
        /// Capture holding the key.
        key: String,
        /// Key capture is a list.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        each: bool,
        /// Failure message template.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// A logical attribute equals an expected value exactly.
    #[serde(alias = "equals")]
    AttributeEquals {
        /// Logical entity name.
        entity: String,
        /// Capture holding the key.
        key: String,
        /// Key capture is a list.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        each: bool,
        /// Logical attribute name.
        attribute: String,
        /// Expected value.
        expected: Value,
        /// Failure message template.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// A logical attribute satisfies a named predicate.
    #[serde(alias = "predicate")]
    AttributePredicate {
        /// Logical entity name.
        entity: String,
        /// Capture holding the key.
        key: String,
        /// Key capture is a list.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        each: bool,
        /// Logical attribute name.
        attribute: String,
        /// Predicate to apply.
        predicate: Predicate,
        /// Failure message template.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl Condition {
    /// Creates an existence check.
    #[must_use]
    pub fn exists(entity: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Exists {
            entity: entity.into(),
            key: key.into(),
            each: false,
            reason: None,
        }
    }

    /// Creates an equality check.
    #[must_use]
    pub fn equals(
        entity: impl Into<String>,
        key: impl Into<String>,
        attribute: impl Into<String>,
        expected: impl Into<Value>,
    ) -> Self {
        Self::AttributeEquals {
            entity: entity.into(),
            key: key.into(),
            each: false,
            attribute: attribute.into(),
            expected: expected.into(),
            reason: None,
        }
    }

    /// Creates a predicate check.
    #[must_use]
    pub fn predicate(
        entity: impl Into<String>,
        key: impl Into<String>,
        attribute: impl Into<String>,
        predicate: Predicate,
    ) -> Self {
        Self::AttributePredicate {
            entity: entity.into(),
            key: key.into(),
            each: false,
            attribute: attribute.into(),
            predicate,
            reason: None,
        }
    }

    /// Applies the check to every item of a list capture.
    #[must_use]
    pub fn for_each(mut self) -> Self {
        match &mut self {
            Self::Exists { each, .. }
            | Self::AttributeEquals { each, .. }
            | Self::AttributePredicate { each, .. } => *each = true,
        }
        self
    }

    /// Sets the failure message. `{key}` expands to the offending key(s).
    #[must_use]
    pub fn with_reason(mut self, message: impl Into<String>) -> Self {
        match &mut self {
            Self::Exists { reason, .. }
            | Self::AttributeEquals { reason, .. }
            | Self::AttributePredicate { reason, .. } => *reason = Some(message.into()),
        }
        self
    }

    /// Logical entity name.
    #[must_use]
    pub fn entity(&self) -> &str {
        match self {
            Self::Exists { entity, .. }
            | Self::AttributeEquals { entity, .. }
            | Self::AttributePredicate { entity, .. } => entity,
        }
    }

    /// Capture holding the key.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Exists { key, .. }
            | Self::AttributeEquals { key, .. }
            | Self::AttributePredicate { key, .. } => key,
        }
    }

    /// Whether the key capture is a list.
    #[must_use]
    pub const fn is_each(&self) -> bool {
        match self {
            Self::Exists { each, .. }
            | Self::AttributeEquals { each, .. }
            | Self::AttributePredicate { each, .. } => *each,
        }
    }

    /// Logical attribute, for attribute checks.
    #[must_use]
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::Exists { .. } => None,
            Self::AttributeEquals { attribute, .. } | Self::AttributePredicate { attribute, .. } => {
                Some(attribute)
            }
        }
    }

    /// Custom failure message template, if set.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Exists { reason, .. }
            | Self::AttributeEquals { reason, .. }
            | Self::AttributePredicate { reason, .. } => reason.as_deref(),
        }
    }

    /// Every capture name this condition reads.
    #[must_use]
    pub fn captures(&self) -> Vec<&str> {
        let mut out = vec![self.key()];
        if let Self::AttributePredicate { predicate, .. } = self {
            out.extend(predicate.capture());
        }
        out
    }
}
