//! Resource contention between commands and time-sensitive constraints.
//!
//! Every command claims a small set of resources (a platform, a track, a
//! train, wagons, a crew). Two commands conflict when they claim the same
//! resource and at least one of the claims is exclusive.

pub mod constraints;
pub mod detector;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::action::{Action, CommandError};
use crate::command::{CommandId, ExtractedCommand};

pub use constraints::{ConstraintEvaluator, InspectionPolicy};
pub use detector::ConflictDetector;

/// Kind of a contended resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A train, by number.
    Train,
    /// A platform, by number.
    Platform,
    /// A track, by id.
    Track,
    /// A wagon, by id.
    Wagon,
    /// A crew, by id.
    Crew,
}

impl ResourceKind {
    /// Resource kind a capture name refers to, for commands outside the
    /// built-in families.
    #[must_use]
    pub fn for_capture(name: &str) -> Option<Self> {
        match name {
            "train" => Some(Self::Train),
            "platform" | "to_platform" => Some(Self::Platform),
            "track" | "to_track" => Some(Self::Track),
            "wagon" | "wagons" => Some(Self::Wagon),
            "crew" => Some(Self::Crew),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Train => write!(f, "train"),
            Self::Platform => write!(f, "platform"),
            Self::Track => write!(f, "track"),
            Self::Wagon => write!(f, "wagon"),
            Self::Crew => write!(f, "crew"),
        }
    }
}

/// How a command holds a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimMode {
    /// No other command may use the resource.
    Exclusive,
    /// Compatible with other shared claims.
    Shared,
}

/// One resource a command needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceClaim {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Resource identity (platform number, track id, ...).
    pub id: String,
    /// Claim mode.
    pub mode: ClaimMode,
}

impl ResourceClaim {
    /// Creates a claim.
    #[must_use]
    pub fn new(kind: ResourceKind, id: impl Into<String>, mode: ClaimMode) -> Self {
        Self {
            kind,
            id: id.into(),
            mode,
        }
    }

    /// Returns true if both claims name the same resource and they cannot
    /// be held at the same time. Symmetric.
    #[must_use]
    pub fn contends_with(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.id == other.id
            && !(self.mode == ClaimMode::Shared && other.mode == ClaimMode::Shared)
    }
}

/// Identifies the pending command a candidate contends with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictDescriptor {
    /// Id of the pending command.
    pub with: CommandId,
    /// Order text of the pending command.
    pub with_text: String,
    /// Contended resource kind.
    pub resource_kind: ResourceKind,
    /// Contended resource identity.
    pub resource_id: String,
}

impl ConflictDescriptor {
    /// Operator-facing reason text.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "conflicts with pending command '{}' over {} {}",
            self.with_text, self.resource_kind, self.resource_id
        )
    }
}

/// Resources a command claims.
///
/// Built-in families use their fixed claim sets. Other actions claim every
/// capture whose name identifies a resource, exclusively.
///
/// # Errors
///
/// The same [`CommandError`] the evaluation path reports for a built-in
/// command that cannot be typed.
pub fn claims_for(command: &ExtractedCommand) -> Result<Vec<ResourceClaim>, CommandError> {
    if let Some(action) = Action::from_command(command)? {
        return Ok(action.claims());
    }

    let claims = command
        .captures()
        .iter()
        .filter_map(|(name, value)| ResourceKind::for_capture(name).map(|kind| (name, kind, value)))
        .flat_map(|(name, kind, value)| {
            let ids = if name == "wagons" {
                crate::command::split_list(value)
            } else {
                vec![value.trim().to_string()]
            };
            ids.into_iter()
                .map(move |id| ResourceClaim::new(kind, id, ClaimMode::Exclusive))
        })
        .collect();
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(action: &str, captures: &[(&str, &str)]) -> ExtractedCommand {
        ExtractedCommand::new(
            action,
            captures
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
        )
    }

    #[test]
    fn test_shared_claims_do_not_contend() {
        let a = ResourceClaim::new(ResourceKind::Train, "123", ClaimMode::Shared);
        let b = ResourceClaim::new(ResourceKind::Train, "123", ClaimMode::Shared);
        let c = ResourceClaim::new(ResourceKind::Train, "123", ClaimMode::Exclusive);
        let d = ResourceClaim::new(ResourceKind::Platform, "123", ClaimMode::Exclusive);
        assert!(!a.contends_with(&b));
        assert!(a.contends_with(&c));
        assert!(c.contends_with(&a));
        assert!(!c.contends_with(&d));
    }

    #[test]
    fn test_claims_for_builtin_transfer() {
        let cmd = command(
            "transfer",
            &[("train", "123"), ("from_platform", "1"), ("to_platform", "5")],
        );
        let claims = claims_for(&cmd).unwrap();
        assert!(claims.contains(&ResourceClaim::new(
            ResourceKind::Platform,
            "5",
            ClaimMode::Exclusive
        )));
        assert!(!claims.iter().any(|c| c.id == "1" && c.kind == ResourceKind::Platform));
    }

    #[test]
    fn test_claims_for_custom_action_uses_captures() {
        let cmd = command(
            "wash_train",
            &[("train", "123"), ("wagons", "W1, W2"), ("bay", "3")],
        );
        let claims = claims_for(&cmd).unwrap();
        assert_eq!(claims.len(), 3);
        assert!(claims.iter().all(|c| c.mode == ClaimMode::Exclusive));
        assert!(claims.iter().any(|c| c.kind == ResourceKind::Wagon && c.id == "W2"));
    }

    #[test]
    fn test_claims_for_agrees_with_typing() {
        let cmd = command("delay_departure", &[("train", "123"), ("minutes", "99999999999")]);
        let err = claims_for(&cmd).unwrap_err();
        assert_eq!(err, Action::from_command(&cmd).unwrap_err());

        // a built-in family never falls back to capture-based claims
        let cmd = command("dispatch", &[("crew", "B1")]);
        assert!(matches!(
            claims_for(&cmd),
            Err(CommandError::MissingCapture { .. })
        ));
    }

    #[test]
    fn test_descriptor_message() {
        let descriptor = ConflictDescriptor {
            with: CommandId::derive("transfer", "move train 1 from platform 2 to platform 5"),
            with_text: "move train 1 from platform 2 to platform 5".to_string(),
            resource_kind: ResourceKind::Platform,
            resource_id: "5".to_string(),
        };
        assert_eq!(
            descriptor.message(),
            "conflicts with pending command 'move train 1 from platform 2 to platform 5' over platform 5"
        );
    }
}
