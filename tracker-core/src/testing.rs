//! Testing utilities for the tracker.
//!
//! This module provides tools for deterministic tests:
//! - `ScriptedRules` returns preset d20 faces instead of random rolls
//! - `RecordingSink` captures narrative log messages
//! - Stat block fixtures for common creatures

use crate::log::LogSink;
use crate::rules::Rules;
use crate::stat_block::{Abilities, StatBlock};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Face used once the script runs out.
const FALLBACK_FACE: i32 = 10;

/// Rules that replay scripted d20 faces.
///
/// Each check returns the next face plus the modifier.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRules {
    faces: VecDeque<i32>,
    group: bool,
}

impl ScriptedRules {
    pub fn new(faces: &[i32]) -> Self {
        Self {
            faces: faces.iter().copied().collect(),
            group: false,
        }
    }

    /// Scripted rules that roll once per creature name.
    pub fn grouped(faces: &[i32]) -> Self {
        Self {
            group: true,
            ..Self::new(faces)
        }
    }

    /// Faces not yet consumed.
    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl Rules for ScriptedRules {
    fn check(&mut self, modifier: i32) -> i32 {
        self.faces.pop_front().unwrap_or(FALLBACK_FACE) + modifier
    }

    fn group_similar_creatures(&self) -> bool {
        self.group
    }
}

/// A log sink that keeps every message. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    messages: Rc<RefCell<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl LogSink for RecordingSink {
    fn log(&mut self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

/// Goblin: 7 HP, AC 15, +2 initiative.
pub fn goblin() -> StatBlock {
    StatBlock::new("Goblin", 7)
        .with_ac(15)
        .with_type("Small humanoid (goblinoid)")
        .with_abilities(Abilities {
            str: 8,
            dex: 14,
            ..Abilities::default()
        })
}

/// Ogre: 59 HP, AC 11, -1 initiative.
pub fn ogre() -> StatBlock {
    StatBlock::new("Ogre", 59)
        .with_ac(11)
        .with_type("Large giant")
        .with_abilities(Abilities {
            str: 19,
            dex: 8,
            con: 16,
            int: 5,
            wis: 7,
            cha: 7,
        })
}

/// Aria, a player character: 24 HP, AC 16, +2 initiative.
pub fn hero() -> StatBlock {
    StatBlock::new("Aria", 24)
        .with_ac(16)
        .with_initiative_modifier(2)
        .player_character()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stat_block::TrackerStats;

    #[test]
    fn test_scripted_rules_replay_then_fall_back() {
        let mut rules = ScriptedRules::new(&[18, 3]);
        assert_eq!(rules.check(2), 20);
        assert_eq!(rules.check(-1), 2);
        assert_eq!(rules.remaining(), 0);
        assert_eq!(rules.check(0), FALLBACK_FACE);
    }

    #[test]
    fn test_fixtures() {
        assert_eq!(goblin().initiative_modifier(), 2);
        assert_eq!(ogre().initiative_modifier(), -1);
        assert!(hero().is_player());
    }

    #[test]
    fn test_recording_sink_clones_share_messages() {
        let sink = RecordingSink::new();
        let mut writer = sink.clone();
        writer.log("Goblin 2 revealed in player view.");
        assert_eq!(sink.messages(), vec!["Goblin 2 revealed in player view."]);
    }
}
