//! Attribute values held by entity records.
//!
//! Operational data is flat: strings, booleans, integers and ordered
//! string lists (e.g. the wagons of a train). Values serialize as plain
//! JSON so fact snapshots and rule definitions read naturally.

use serde::{Deserialize, Serialize};

/// A single attribute value.
///
/// Equality is type-aware: `Bool(false)` is not equal to `Null`, and
/// `Int(5)` is not equal to `String("5")`. Key lookups use
/// [`Value::matches_key`], which is the one place an integer is compared
/// against its textual form.
///
/// # Examples
///
/// ```
/// use saint::Value;
///
/// let occupied = Value::Bool(false);
/// assert_eq!(occupied.as_bool(), Some(false));
/// assert_ne!(occupied, Value::Null);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent or explicitly null.
    #[default]
    Null,
    /// A flag such as `is_occupied`.
    Bool(bool),
    /// A whole number.
    Int(i64),
    /// Text, including numeric identifiers stored as text.
    String(String),
    /// An ordered list of identifiers.
    List(Vec<String>),
}

impl Value {
    /// Returns true for `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The boolean, if this is a `Bool`.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer, if this is an `Int`.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The text, if this is a `String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// The items, if this is a `List`.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// Returns true if this value identifies the record keyed by `key`.
    ///
    /// Captured keys are always text, so integer keys compare by their
    /// decimal form.
    #[must_use]
    pub fn matches_key(&self, key: &str) -> bool {
        match self {
            Self::String(v) => v == key,
            Self::Int(v) => key.parse::<i64>().is_ok_and(|k| k == *v),
            _ => false,
        }
    }

    /// Returns true for an empty string or list, and for `Null`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(v) => v.is_empty(),
            Self::List(v) => v.is_empty(),
            Self::Bool(_) | Self::Int(_) => false,
        }
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::String(_) => "string",
            Self::List(_) => "list",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::List(v) => write!(f, "[{}]", v.join(", ")),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Self::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
