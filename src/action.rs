//! The twelve built-in action families.
//!
//! Each family is a variant holding its typed captures. The precondition
//! bundle, resource claims and plan of a family are exhaustive matches on
//! this enum, so adding a family fails to compile until every one of them
//! handles it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command::ExtractedCommand;
use crate::conflict::{ClaimMode, ResourceClaim, ResourceKind};
use crate::error::SaintError;
use crate::ontology::names::{
    CREW, INSPECTION, OCCUPIED, PLATFORM, STATUS, TRACK, TRAIN, WAGON, WAGONS,
};
use crate::outcome::ReasonKind;
use crate::rule::{Condition, Predicate};

/// Train status meaning the train has left and is moving.
pub const EN_ROUTE: &str = "en route";
/// Track, crew and wagon status meaning available.
pub const FREE: &str = "free";
/// Wagon inspection value meaning passed.
pub const INSPECTION_OK: &str = "ok";
/// Longest departure delay an order may request, in minutes.
pub const MAX_DELAY_MINUTES: u32 = 24 * 60;

/// A recognized command that cannot be typed as its built-in family.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The matching pattern left a capture the family needs unset.
    #[error("pattern for '{action}' matched without capturing '{capture}'")]
    MissingCapture {
        action: String,
        capture: String,
    },

    /// A numeric capture is outside the family's accepted range.
    #[error("{capture} '{value}' is out of range ({min}-{max})")]
    OutOfRange {
        capture: String,
        value: String,
        min: u32,
        max: u32,
    },
}

impl CommandError {
    /// How the engine reports this error to the operator.
    #[must_use]
    pub const fn reason_kind(&self) -> ReasonKind {
        match self {
            Self::MissingCapture { .. } => ReasonKind::MalformedRule,
            Self::OutOfRange { .. } => ReasonKind::InputRejected,
        }
    }
}

impl From<CommandError> for SaintError {
    fn from(err: CommandError) -> Self {
        Self::inconsistency(err.to_string())
    }
}

/// Names of the built-in action families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Transfer,
    Reposition,
    AttachWagon,
    DetachWagon,
    Dispatch,
    Inspect,
    AssignCrew,
    ChangeTrack,
    CheckWagon,
    FormConsist,
    DisbandConsist,
    DelayDeparture,
}

impl ActionKind {
    /// Every family, in catalog order.
    pub const ALL: [Self; 12] = [
        Self::Transfer,
        Self::ChangeTrack,
        Self::Reposition,
        Self::AttachWagon,
        Self::DetachWagon,
        Self::FormConsist,
        Self::DisbandConsist,
        Self::AssignCrew,
        Self::DelayDeparture,
        Self::Dispatch,
        Self::Inspect,
        Self::CheckWagon,
    ];

    /// Action name used in pattern definitions and rules.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Reposition => "reposition",
            Self::AttachWagon => "attach_wagon",
            Self::DetachWagon => "detach_wagon",
            Self::Dispatch => "dispatch",
            Self::Inspect => "inspect",
            Self::AssignCrew => "assign_crew",
            Self::ChangeTrack => "change_track",
            Self::CheckWagon => "check_wagon",
            Self::FormConsist => "form_consist",
            Self::DisbandConsist => "disband_consist",
            Self::DelayDeparture => "delay_departure",
        }
    }

    /// Looks a family up by action name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Captures a pattern producing this family must declare.
    #[must_use]
    pub const fn required_captures(self) -> &'static [&'static str] {
        match self {
            Self::Transfer => &["train", "from_platform", "to_platform"],
            Self::Reposition => &["train", "track"],
            Self::AttachWagon | Self::DetachWagon => &["wagon", "train"],
            Self::Dispatch | Self::Inspect | Self::DisbandConsist => &["train"],
            Self::AssignCrew => &["crew", "train"],
            Self::ChangeTrack => &["train", "from_track", "to_track"],
            Self::CheckWagon => &["wagon"],
            Self::FormConsist => &["train", "wagons"],
            Self::DelayDeparture => &["train", "minutes"],
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A built-in command with its typed captures.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Transfer { train: String, from_platform: String, to_platform: String },
    Reposition { train: String, track: String },
    AttachWagon { wagon: String, train: String },
    DetachWagon { wagon: String, train: String },
    Dispatch { train: String },
    Inspect { train: String },
    AssignCrew { crew: String, train: String },
    ChangeTrack { train: String, from_track: String, to_track: String },
    CheckWagon { wagon: String },
    FormConsist { train: String, wagons: Vec<String> },
    DisbandConsist { train: String },
    DelayDeparture { train: String, minutes: u32 },
}

impl Action {
    /// Types an extracted command.
    ///
    /// Returns `Ok(None)` for actions outside the built-in families.
    ///
    /// # Errors
    ///
    /// `MissingCapture` when an optional group of the matching pattern did
    /// not take part in the match, and `OutOfRange` for a delay outside
    /// `1..=MAX_DELAY_MINUTES`.
    pub fn from_command(command: &ExtractedCommand) -> Result<Option<Self>, CommandError> {
        let Some(kind) = ActionKind::from_name(command.action()) else {
            return Ok(None);
        };

        let get = |name: &str| -> Result<String, CommandError> {
            command
                .capture(name)
                .map(str::to_string)
                .ok_or_else(|| CommandError::MissingCapture {
                    action: kind.name().to_string(),
                    capture: name.to_string(),
                })
        };

        let action = match kind {
            ActionKind::Transfer => Self::Transfer {
                train: get("train")?,
                from_platform: get("from_platform")?,
                to_platform: get("to_platform")?,
            },
            ActionKind::Reposition => Self::Reposition {
                train: get("train")?,
                track: get("track")?,
            },
            ActionKind::AttachWagon => Self::AttachWagon {
                wagon: get("wagon")?,
                train: get("train")?,
            },
            ActionKind::DetachWagon => Self::DetachWagon {
                wagon: get("wagon")?,
                train: get("train")?,
            },
            ActionKind::Dispatch => Self::Dispatch { train: get("train")? },
            ActionKind::Inspect => Self::Inspect { train: get("train")? },
            ActionKind::AssignCrew => Self::AssignCrew {
                crew: get("crew")?,
                train: get("train")?,
            },
            ActionKind::ChangeTrack => Self::ChangeTrack {
                train: get("train")?,
                from_track: get("from_track")?,
                to_track: get("to_track")?,
            },
            ActionKind::CheckWagon => Self::CheckWagon { wagon: get("wagon")? },
            ActionKind::FormConsist => Self::FormConsist {
                train: get("train")?,
                wagons: command.list("wagons").unwrap_or_default(),
            },
            ActionKind::DisbandConsist => Self::DisbandConsist { train: get("train")? },
            ActionKind::DelayDeparture => {
                let raw = get("minutes")?;
                let minutes = raw
                    .parse::<u32>()
                    .ok()
                    .filter(|m| (1..=MAX_DELAY_MINUTES).contains(m))
                    .ok_or_else(|| CommandError::OutOfRange {
                        capture: "minutes".to_string(),
                        value: raw.clone(),
                        min: 1,
                        max: MAX_DELAY_MINUTES,
                    })?;
                Self::DelayDeparture {
                    train: get("train")?,
                    minutes,
                }
            }
        };
        Ok(Some(action))
    }

    /// The family of this action.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Transfer { .. } => ActionKind::Transfer,
            Self::Reposition { .. } => ActionKind::Reposition,
            Self::AttachWagon { .. } => ActionKind::AttachWagon,
            Self::DetachWagon { .. } => ActionKind::DetachWagon,
            Self::Dispatch { .. } => ActionKind::Dispatch,
            Self::Inspect { .. } => ActionKind::Inspect,
            Self::AssignCrew { .. } => ActionKind::AssignCrew,
            Self::ChangeTrack { .. } => ActionKind::ChangeTrack,
            Self::CheckWagon { .. } => ActionKind::CheckWagon,
            Self::FormConsist { .. } => ActionKind::FormConsist,
            Self::DisbandConsist { .. } => ActionKind::DisbandConsist,
            Self::DelayDeparture { .. } => ActionKind::DelayDeparture,
        }
    }

    /// The train this action concerns, if any.
    #[must_use]
    pub fn train(&self) -> Option<&str> {
        match self {
            Self::Transfer { train, .. }
            | Self::Reposition { train, .. }
            | Self::AttachWagon { train, .. }
            | Self::DetachWagon { train, .. }
            | Self::Dispatch { train }
            | Self::Inspect { train }
            | Self::AssignCrew { train, .. }
            | Self::ChangeTrack { train, .. }
            | Self::FormConsist { train, .. }
            | Self::DisbandConsist { train }
            | Self::DelayDeparture { train, .. } => Some(train),
            Self::CheckWagon { .. } => None,
        }
    }

    /// The fixed precondition bundle of this family.
    ///
    /// Keys refer to capture names, so the bundle is evaluated exactly like
    /// a declarative rule.
    #[must_use]
    pub fn preconditions(&self) -> Vec<Condition> {
        let train_exists = || Condition::exists(TRAIN, "train").with_reason("train does not exist");
        let not_en_route = |reason: &str| {
            Condition::predicate(TRAIN, "train", STATUS, Predicate::not_equals(EN_ROUTE))
                .with_reason(reason)
        };
        let track_free = |key: &str| {
            vec![
                Condition::exists(TRACK, key).with_reason("track does not exist"),
                Condition::equals(TRACK, key, STATUS, FREE).with_reason("track is occupied"),
            ]
        };

        match self {
            Self::Transfer { .. } => vec![
                train_exists(),
                Condition::exists(PLATFORM, "to_platform").with_reason("platform does not exist"),
                Condition::predicate(PLATFORM, "to_platform", OCCUPIED, Predicate::IsFalse)
                    .with_reason("platform is occupied"),
                not_en_route("train is en route"),
            ],
            Self::Reposition { .. } => {
                let mut bundle = vec![train_exists()];
                bundle.extend(track_free("track"));
                bundle.push(not_en_route("train is en route"));
                bundle
            }
            Self::ChangeTrack { .. } => {
                let mut bundle = vec![train_exists()];
                bundle.extend(track_free("to_track"));
                bundle.push(not_en_route("train is en route"));
                bundle
            }
            Self::AttachWagon { .. } => vec![
                Condition::exists(WAGON, "wagon").with_reason("wagon does not exist"),
                train_exists(),
                Condition::equals(WAGON, "wagon", STATUS, FREE)
                    .with_reason("wagon is already attached"),
                Condition::equals(WAGON, "wagon", INSPECTION, INSPECTION_OK)
                    .with_reason("wagon requires inspection"),
            ],
            Self::DetachWagon { .. } => vec![
                Condition::exists(WAGON, "wagon").with_reason("wagon does not exist"),
                train_exists(),
                Condition::predicate(TRAIN, "train", WAGONS, Predicate::contains_capture("wagon"))
                    .with_reason("wagon is not attached to the train"),
                not_en_route("train is en route"),
            ],
            Self::Dispatch { .. } => vec![
                train_exists(),
                Condition::predicate(TRAIN, "train", CREW, Predicate::Present)
                    .with_reason("train has no crew assigned"),
                not_en_route("train is already en route"),
            ],
            Self::Inspect { .. } => vec![train_exists(), not_en_route("train is en route")],
            Self::AssignCrew { .. } => vec![
                Condition::exists(CREW, "crew").with_reason("crew does not exist"),
                train_exists(),
                Condition::equals(CREW, "crew", STATUS, FREE).with_reason("crew is busy"),
            ],
            Self::CheckWagon { .. } => {
                vec![Condition::exists(WAGON, "wagon").with_reason("wagon does not exist")]
            }
            Self::FormConsist { .. } => vec![
                train_exists(),
                Condition::exists(WAGON, "wagons")
                    .for_each()
                    .with_reason("wagon does not exist: {key}"),
                Condition::equals(WAGON, "wagons", STATUS, FREE)
                    .for_each()
                    .with_reason("wagon is already attached: {key}"),
                Condition::equals(WAGON, "wagons", INSPECTION, INSPECTION_OK)
                    .for_each()
                    .with_reason("wagon requires inspection: {key}"),
                not_en_route("train is en route"),
            ],
            Self::DisbandConsist { .. } => vec![
                train_exists(),
                Condition::predicate(TRAIN, "train", WAGONS, Predicate::Present)
                    .with_reason("train has no wagons"),
                not_en_route("train is en route"),
            ],
            Self::DelayDeparture { .. } => {
                vec![train_exists(), not_en_route("train has already departed")]
            }
        }
    }

    /// Resources this action needs while it executes.
    #[must_use]
    pub fn claims(&self) -> Vec<ResourceClaim> {
        use ClaimMode::{Exclusive, Shared};
        use ResourceKind as R;

        match self {
            Self::Transfer { train, to_platform, .. } => vec![
                ResourceClaim::new(R::Platform, to_platform, Exclusive),
                ResourceClaim::new(R::Train, train, Exclusive),
            ],
            Self::Reposition { train, track } => vec![
                ResourceClaim::new(R::Track, track, Exclusive),
                ResourceClaim::new(R::Train, train, Exclusive),
            ],
            Self::ChangeTrack { train, to_track, .. } => vec![
                ResourceClaim::new(R::Track, to_track, Exclusive),
                ResourceClaim::new(R::Train, train, Exclusive),
            ],
            Self::AttachWagon { wagon, train } | Self::DetachWagon { wagon, train } => vec![
                ResourceClaim::new(R::Wagon, wagon, Exclusive),
                ResourceClaim::new(R::Train, train, Shared),
            ],
            Self::Dispatch { train }
            | Self::DisbandConsist { train }
            | Self::DelayDeparture { train, .. } => {
                vec![ResourceClaim::new(R::Train, train, Exclusive)]
            }
            Self::Inspect { train } => vec![ResourceClaim::new(R::Train, train, Shared)],
            Self::AssignCrew { crew, train } => vec![
                ResourceClaim::new(R::Crew, crew, Exclusive),
                ResourceClaim::new(R::Train, train, Shared),
            ],
            Self::CheckWagon { wagon } => vec![ResourceClaim::new(R::Wagon, wagon, Shared)],
            Self::FormConsist { train, wagons } => wagons
                .iter()
                .map(|wagon| ResourceClaim::new(R::Wagon, wagon, Exclusive))
                .chain(std::iter::once(ResourceClaim::new(R::Train, train, Exclusive)))
                .collect(),
        }
    }
}
