//! Plan generation for feasible commands.

use tracing::error;

use crate::action::Action;
use crate::command::ExtractedCommand;
use crate::error::{SaintError, SaintResult};

/// Maps a feasible command to its ordered execution steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanGenerator;

impl PlanGenerator {
    /// Creates a generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Produces the numbered plan for `command`.
    ///
    /// A rule-supplied `template` overrides the fixed per-action steps; its
    /// `{capture}` placeholders are filled from the command.
    ///
    /// # Errors
    ///
    /// `InternalInconsistency` when the action is not a built-in family and
    /// no template was supplied. The engine reports such commands as
    /// unsupported before planning, so this is an engine defect.
    pub fn plan(
        &self,
        command: &ExtractedCommand,
        template: Option<&[String]>,
    ) -> SaintResult<Vec<String>> {
        let steps = match template {
            Some(template) if !template.is_empty() => {
                template.iter().map(|step| command.render(step)).collect()
            }
            _ => match Action::from_command(command)? {
                Some(action) => fixed_steps(&action),
                None => {
                    error!(action = command.action(), "no plan template for action");
                    return Err(SaintError::inconsistency(format!(
                        "no plan template for action '{}'",
                        command.action()
                    )));
                }
            },
        };
        Ok(number(steps))
    }
}

fn number(steps: Vec<String>) -> Vec<String> {
    steps
        .into_iter()
        .enumerate()
        .map(|(i, step)| {
            if step.starts_with("Step ") {
                step
            } else {
                format!("Step {}: {step}", i + 1)
            }
        })
        .collect()
}

fn fixed_steps(action: &Action) -> Vec<String> {
    match action {
        Action::Transfer {
            train,
            from_platform,
            to_platform,
        } => vec![
            format!("Release platform {from_platform}."),
            format!("Transfer train {train} to platform {to_platform}."),
            format!("Record train {train} on platform {to_platform}."),
        ],
        Action::Reposition { train, track } => vec![
            format!("Clear route to track {track}."),
            format!("Reposition train {train} to track {track}."),
            format!("Record train {train} on track {track}."),
        ],
        Action::AttachWagon { wagon, train } => vec![
            format!("Move wagon {wagon} to train {train}."),
            format!("Attach wagon {wagon} to train {train}."),
            format!("Record wagon {wagon} in the consist of train {train}."),
        ],
        Action::DetachWagon { wagon, train } => vec![
            format!("Secure train {train}."),
            format!("Detach wagon {wagon} from train {train}."),
            format!("Record wagon {wagon} as free."),
        ],
        Action::Dispatch { train } => vec![
            format!("Confirm crew aboard train {train}."),
            format!("Clear departure route for train {train}."),
            format!("Dispatch train {train}."),
            format!("Record train {train} as en route."),
        ],
        Action::Inspect { train } => vec![
            format!("Hold train {train} for inspection."),
            format!("Inspect train {train}."),
            format!("Record inspection result for train {train}."),
        ],
        Action::AssignCrew { crew, train } => vec![
            format!("Notify crew {crew}."),
            format!("Assign crew {crew} to train {train}."),
            format!("Record crew {crew} as busy."),
        ],
        Action::ChangeTrack {
            train,
            from_track,
            to_track,
        } => vec![
            format!("Release track {from_track}."),
            format!("Change train {train} to track {to_track}."),
            format!("Record train {train} on track {to_track}."),
        ],
        Action::CheckWagon { wagon } => vec![
            format!("Locate wagon {wagon}."),
            format!("Check wagon {wagon}."),
            format!("Record check result for wagon {wagon}."),
        ],
        Action::FormConsist { train, wagons } => {
            let wagons = wagons.join(", ");
            vec![
                format!("Reserve wagons {wagons}."),
                format!("Move wagons {wagons} to train {train}."),
                format!("Form consist of train {train} from wagons {wagons}."),
                format!("Record the consist of train {train}."),
            ]
        }
        Action::DisbandConsist { train } => vec![
            format!("Uncouple the wagons of train {train}."),
            format!("Disband consist of train {train}."),
            format!("Record the wagons of train {train} as free."),
        ],
        Action::DelayDeparture { train, minutes } => vec![
            format!("Notify the crew of train {train}."),
            format!("Delay departure of train {train} by {minutes} minutes."),
            format!("Update the timetable for train {train}."),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;

    fn command(action: &str, captures: &[(&str, &str)]) -> ExtractedCommand {
        ExtractedCommand::new(
            action,
            captures
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
        )
    }

    #[test]
    fn test_transfer_plan() {
        let cmd = command(
            "transfer",
            &[("train", "123"), ("from_platform", "1"), ("to_platform", "5")],
        );
        let plan = PlanGenerator::new().plan(&cmd, None).unwrap();
        assert_eq!(
            plan,
            vec![
                "Step 1: Release platform 1.",
                "Step 2: Transfer train 123 to platform 5.",
                "Step 3: Record train 123 on platform 5.",
            ]
        );
    }

    #[test]
    fn test_every_family_has_three_or_four_steps() {
        for kind in ActionKind::ALL {
            let captures: Vec<(&str, &str)> = kind
                .required_captures()
                .iter()
                .map(|name| (*name, if *name == "minutes" { "5" } else { "X1" }))
                .collect();
            let plan = PlanGenerator::new()
                .plan(&command(kind.name(), &captures), None)
                .unwrap();
            assert!((3..=4).contains(&plan.len()), "{kind}: {plan:?}");
            assert!(plan[0].starts_with("Step 1: "));
        }
    }

    #[test]
    fn test_template_overrides_fixed_steps() {
        let cmd = command("dispatch", &[("train", "123")]);
        let template = vec!["Sound horn on {train}.".to_string(), "Step 2: Go.".to_string()];
        let plan = PlanGenerator::new().plan(&cmd, Some(&template)).unwrap();
        assert_eq!(plan, vec!["Step 1: Sound horn on 123.", "Step 2: Go."]);
    }

    #[test]
    fn test_unknown_action_without_template_is_inconsistency() {
        let cmd = command("teleport", &[("train", "123")]);
        let err = PlanGenerator::new().plan(&cmd, None).unwrap_err();
        assert!(err.is_internal_inconsistency());

        let template = vec!["Teleport {train}.".to_string()];
        assert!(PlanGenerator::new().plan(&cmd, Some(&template)).is_ok());
    }
}
