//! Tag suggestions.
//!
//! Tags are free text, but most of them are standard conditions. The tag
//! prompt offers these as completions.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Standard 5e conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Blinded,
    Charmed,
    Concentrating,
    Deafened,
    Exhaustion,
    Frightened,
    Grappled,
    Incapacitated,
    Invisible,
    Paralyzed,
    Petrified,
    Poisoned,
    Prone,
    Restrained,
    Stunned,
    Unconscious,
}

impl Condition {
    pub fn all() -> &'static [Condition] {
        &[
            Condition::Blinded,
            Condition::Charmed,
            Condition::Concentrating,
            Condition::Deafened,
            Condition::Exhaustion,
            Condition::Frightened,
            Condition::Grappled,
            Condition::Incapacitated,
            Condition::Invisible,
            Condition::Paralyzed,
            Condition::Petrified,
            Condition::Poisoned,
            Condition::Prone,
            Condition::Restrained,
            Condition::Stunned,
            Condition::Unconscious,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Condition::Blinded => "Blinded",
            Condition::Charmed => "Charmed",
            Condition::Concentrating => "Concentrating",
            Condition::Deafened => "Deafened",
            Condition::Exhaustion => "Exhaustion",
            Condition::Frightened => "Frightened",
            Condition::Grappled => "Grappled",
            Condition::Incapacitated => "Incapacitated",
            Condition::Invisible => "Invisible",
            Condition::Paralyzed => "Paralyzed",
            Condition::Petrified => "Petrified",
            Condition::Poisoned => "Poisoned",
            Condition::Prone => "Prone",
            Condition::Restrained => "Restrained",
            Condition::Stunned => "Stunned",
            Condition::Unconscious => "Unconscious",
        }
    }

    /// Look up a condition by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Condition> {
        CONDITIONS_BY_NAME.get(&name.trim().to_lowercase()).copied()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

lazy_static! {
    static ref CONDITIONS_BY_NAME: HashMap<String, Condition> = Condition::all()
        .iter()
        .map(|c| (c.name().to_lowercase(), *c))
        .collect();
}

/// Condition names starting with `prefix` (case-insensitive), in
/// alphabetical order. An empty prefix suggests nothing.
pub fn suggest(prefix: &str) -> Vec<&'static str> {
    let prefix = prefix.trim().to_lowercase();
    if prefix.is_empty() {
        return Vec::new();
    }
    Condition::all()
        .iter()
        .map(Condition::name)
        .filter(|name| name.to_lowercase().starts_with(&prefix))
        .collect()
}
