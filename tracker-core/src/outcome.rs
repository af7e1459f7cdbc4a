//! Observable results of encounter operations.
//!
//! Tracker operations never fail. Input that cannot be applied (an
//! unparsable number, an empty selection, a move past the end of the list)
//! leaves state untouched and reports why.

use std::fmt;

/// What happened when an operation ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Ignored(Reason),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

/// Why an operation was a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    InvalidNumber,
    NoSelection,
    AtBoundary,
    UnknownCombatant,
    EmptyEncounter,
    NotActive,
    AlreadyActive,
    NoPrompt,
    EmptyText,
    Unchanged,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Reason::InvalidNumber => "input is not a number",
            Reason::NoSelection => "nothing is selected",
            Reason::AtBoundary => "already at the end of the list",
            Reason::UnknownCombatant => "no such combatant",
            Reason::EmptyEncounter => "the encounter has no combatants",
            Reason::NotActive => "the encounter is not running",
            Reason::AlreadyActive => "the encounter is already running",
            Reason::NoPrompt => "no such prompt",
            Reason::EmptyText => "text is empty",
            Reason::Unchanged => "nothing changed",
        };
        f.write_str(text)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Applied => f.write_str("applied"),
            Outcome::Ignored(reason) => write!(f, "ignored: {reason}"),
        }
    }
}
