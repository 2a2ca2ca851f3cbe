//! Extracted commands and their identity.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for deterministic command identifiers.
const COMMAND_NAMESPACE: Uuid = Uuid::from_u128(0x5a17_c0de_0f0e_4d1a_9b2e_6c0a_3f11_d15a);

/// Deterministic identifier for a command.
///
/// Derived from the action name and the trimmed order text, so the same
/// order evaluated twice gets the same id and a pending entry can be
/// recognised when it is evaluated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(Uuid);

impl CommandId {
    /// Derives the id of `action` extracted from `text`.
    #[must_use]
    pub fn derive(action: &str, text: &str) -> Self {
        let name = format!("{action}\n{}", text.trim());
        Self(Uuid::new_v5(&COMMAND_NAMESPACE, name.as_bytes()))
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A structured command: action name plus named captures.
///
/// Produced by the extractor and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedCommand {
    action: String,
    captures: BTreeMap<String, String>,
}

impl ExtractedCommand {
    /// Creates a command from an action name and captures.
    #[must_use]
    pub fn new(
        action: impl Into<String>,
        captures: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            action: action.into(),
            captures: captures.into_iter().collect(),
        }
    }

    /// The action name, taken from the matching pattern definition.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// All captures by name.
    #[must_use]
    pub fn captures(&self) -> &BTreeMap<String, String> {
        &self.captures
    }

    /// A single capture.
    #[must_use]
    pub fn capture(&self, name: &str) -> Option<&str> {
        self.captures.get(name).map(String::as_str)
    }

    /// A comma-separated capture split into its trimmed, non-empty items.
    #[must_use]
    pub fn list(&self, name: &str) -> Option<Vec<String>> {
        self.capture(name).map(split_list)
    }

    /// Replaces `{name}` placeholders in `template` with capture values.
    #[must_use]
    pub fn render(&self, template: &str) -> String {
        self.captures
            .iter()
            .fold(template.to_string(), |acc, (name, value)| {
                acc.replace(&format!("{{{name}}}"), value)
            })
    }
}

pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// A command already accepted as feasible and awaiting execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCommand {
    /// Deterministic id.
    pub id: CommandId,
    /// The order text the command was extracted from.
    pub text: String,
    /// The command itself.
    pub command: ExtractedCommand,
}

impl PendingCommand {
    /// Wraps a command extracted from `text`.
    #[must_use]
    pub fn new(text: impl Into<String>, command: ExtractedCommand) -> Self {
        let text = text.into();
        Self {
            id: CommandId::derive(command.action(), &text),
            text,
            command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer() -> ExtractedCommand {
        ExtractedCommand::new(
            "transfer",
            [
                ("train".to_string(), "123".to_string()),
                ("to_platform".to_string(), "5".to_string()),
            ],
        )
    }

    #[test]
    fn test_command_id_is_deterministic() {
        let a = CommandId::derive("transfer", "transfer train 123 from platform 1 to platform 5");
        let b = CommandId::derive("transfer", "  transfer train 123 from platform 1 to platform 5 ");
        let c = CommandId::derive("transfer", "transfer train 124 from platform 1 to platform 5");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_render_placeholders() {
        let cmd = transfer();
        assert_eq!(
            cmd.render("Transfer train {train} to platform {to_platform}."),
            "Transfer train 123 to platform 5."
        );
        assert_eq!(cmd.render("{unknown} stays"), "{unknown} stays");
    }

    #[test]
    fn test_list_capture() {
        let cmd = ExtractedCommand::new(
            "form_consist",
            [("wagons".to_string(), "W1, W2 ,,W3".to_string())],
        );
        assert_eq!(
            cmd.list("wagons").unwrap(),
            vec!["W1".to_string(), "W2".to_string(), "W3".to_string()]
        );
        assert!(cmd.list("train").is_none());
    }

    #[test]
    fn test_pending_command_id_matches_derive() {
        let text = "transfer train 123 from platform 1 to platform 5";
        let pending = PendingCommand::new(text, transfer());
        assert_eq!(pending.id, CommandId::derive("transfer", text));
    }
}
