//! Pairwise conflict detection against the pending set.

use tracing::debug;

use crate::action::CommandError;
use crate::command::PendingCommand;

use super::{claims_for, ConflictDescriptor};

/// Finds pending commands a candidate contends with.
///
/// Stateless: the pending set is passed in per call, and the caller owns
/// its consistency for the duration of the call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictDetector;

impl ConflictDetector {
    /// Creates a detector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns one descriptor per (pending command, contended resource).
    ///
    /// Pending entries with the candidate's own id are skipped, so
    /// re-evaluating an already pending order does not conflict with
    /// itself. Order follows the pending set, then the candidate's claims.
    ///
    /// # Errors
    ///
    /// A built-in command on either side that cannot be typed; see
    /// [`claims_for`].
    pub fn detect(
        &self,
        candidate: &PendingCommand,
        pending: &[PendingCommand],
    ) -> Result<Vec<ConflictDescriptor>, CommandError> {
        let candidate_claims = claims_for(&candidate.command)?;
        let mut conflicts: Vec<ConflictDescriptor> = Vec::new();

        for other in pending {
            if other.id == candidate.id {
                continue;
            }
            let other_claims = claims_for(&other.command)?;
            for mine in &candidate_claims {
                if !other_claims.iter().any(|theirs| mine.contends_with(theirs)) {
                    continue;
                }
                let duplicate = conflicts.iter().any(|c| {
                    c.with == other.id && c.resource_kind == mine.kind && c.resource_id == mine.id
                });
                if duplicate {
                    continue;
                }
                debug!(
                    candidate = %candidate.id,
                    pending = %other.id,
                    resource = %mine.kind,
                    id = %mine.id,
                    "resource conflict"
                );
                conflicts.push(ConflictDescriptor {
                    with: other.id,
                    with_text: other.text.clone(),
                    resource_kind: mine.kind,
                    resource_id: mine.id.clone(),
                });
            }
        }

        Ok(conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ExtractedCommand;
    use crate::conflict::ResourceKind;

    fn pending(text: &str, action: &str, captures: &[(&str, &str)]) -> PendingCommand {
        PendingCommand::new(
            text,
            ExtractedCommand::new(
                action,
                captures
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
            ),
        )
    }

    fn transfer(train: &str, to: &str) -> PendingCommand {
        pending(
            &format!("transfer train {train} from platform 1 to platform {to}"),
            "transfer",
            &[("train", train), ("from_platform", "1"), ("to_platform", to)],
        )
    }

    #[test]
    fn test_same_target_platform_conflicts() {
        let a = transfer("123", "5");
        let b = transfer("124", "5");
        let conflicts = ConflictDetector::new().detect(&b, &[a.clone()]).unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].with, a.id);
        assert_eq!(conflicts[0].resource_kind, ResourceKind::Platform);
        assert_eq!(conflicts[0].resource_id, "5");
    }

    #[test]
    fn test_conflict_is_symmetric() {
        let a = transfer("123", "5");
        let b = transfer("124", "5");
        let c = transfer("125", "6");
        let detector = ConflictDetector::new();
        assert!(!detector.detect(&a, &[b.clone()]).unwrap().is_empty());
        assert!(!detector.detect(&b, &[a.clone()]).unwrap().is_empty());
        assert!(detector.detect(&a, &[c.clone()]).unwrap().is_empty());
        assert!(detector.detect(&c, &[a]).unwrap().is_empty());
    }

    #[test]
    fn test_shared_train_claims_coexist() {
        let inspect = pending("inspect train 123", "inspect", &[("train", "123")]);
        let attach = pending(
            "attach wagon W1 to train 123",
            "attach_wagon",
            &[("wagon", "W1"), ("train", "123")],
        );
        let dispatch = pending("dispatch train 123", "dispatch", &[("train", "123")]);
        let detector = ConflictDetector::new();
        assert!(detector.detect(&attach, &[inspect.clone()]).unwrap().is_empty());
        assert_eq!(detector.detect(&dispatch, &[inspect, attach]).unwrap().len(), 2);
    }

    #[test]
    fn test_skips_own_id_and_dedupes() {
        let a = transfer("123", "5");
        let detector = ConflictDetector::new();
        assert!(detector.detect(&a, &[a.clone()]).unwrap().is_empty());

        let b = transfer("123", "5");
        let b = PendingCommand {
            text: "again: transfer train 123 from platform 1 to platform 5".to_string(),
            id: crate::command::CommandId::derive("transfer", "again"),
            ..b
        };
        // platform and train both contended, each reported once
        let conflicts = detector.detect(&b, &[a.clone(), a]).unwrap();
        assert_eq!(conflicts.len(), 2);
    }

    #[test]
    fn test_untyped_builtin_command_is_an_error() {
        let broken = pending("dispatch now", "dispatch", &[]);
        let a = transfer("123", "5");
        let detector = ConflictDetector::new();
        assert!(matches!(
            detector.detect(&broken, &[a.clone()]),
            Err(CommandError::MissingCapture { .. })
        ));
        assert!(detector.detect(&a, &[broken]).is_err());
    }
}
