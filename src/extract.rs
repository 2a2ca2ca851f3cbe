//! Command extraction: first matching pattern wins.

use tracing::debug;

use crate::command::ExtractedCommand;
use crate::pattern::PatternCatalog;

/// Outcome of applying a catalog to order text.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    NoMatch,
    Matched(ExtractedCommand),
}

impl Extraction {
    /// The extracted command, if any.
    #[must_use]
    pub fn into_command(self) -> Option<ExtractedCommand> {
        match self {
            Self::NoMatch => None,
            Self::Matched(command) => Some(command),
        }
    }
}

/// Applies `catalog` to `text` in order and returns the command produced by
/// the first pattern that matches anywhere in the text.
///
/// Groups are bound to capture names in declared order. A group that did
/// not participate in the match leaves its capture unset.
#[must_use]
pub fn extract(text: &str, catalog: &PatternCatalog) -> Extraction {
    for (index, pattern) in catalog.iter().enumerate() {
        let Some(groups) = pattern.regex().captures(text) else {
            continue;
        };

        let captures = pattern
            .captures()
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                groups
                    .get(i + 1)
                    .map(|m| (name.clone(), m.as_str().trim().to_string()))
            });
        let command = ExtractedCommand::new(pattern.action(), captures);
        debug!(pattern = index, action = command.action(), "command extracted");
        return Extraction::Matched(command);
    }

    debug!(patterns = catalog.len(), "no pattern matched");
    Extraction::NoMatch
}
