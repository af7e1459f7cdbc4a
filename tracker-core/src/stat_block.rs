//! Static creature statistics.
//!
//! A [`StatBlock`] is the immutable reference data a combatant is built from.
//! Field names serialize in PascalCase so saved encounters stay readable by
//! the wider statblock library format.

use serde::{Deserialize, Serialize};

/// Marker value of [`StatBlock::player`] identifying a player character.
pub const PLAYER_MARKER: &str = "player";

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Abilities {
    pub str: i32,
    pub dex: i32,
    pub con: i32,
    pub int: i32,
    pub wis: i32,
    pub cha: i32,
}

impl Abilities {
    /// Standard ability modifier: floor((score - 10) / 2).
    pub fn modifier(score: i32) -> i32 {
        (score - 10).div_euclid(2)
    }
}

impl Default for Abilities {
    fn default() -> Self {
        Self {
            str: 10,
            dex: 10,
            con: 10,
            int: 10,
            wis: 10,
            cha: 10,
        }
    }
}

/// A numeric stat with free-text notes, e.g. `{ "Value": 15, "Notes": "(natural armor)" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValueAndNotes {
    #[serde(default)]
    pub value: i32,
    #[serde(default)]
    pub notes: String,
}

impl ValueAndNotes {
    pub fn new(value: i32) -> Self {
        Self {
            value,
            notes: String::new(),
        }
    }
}

/// Immutable reference data describing a creature's base stats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatBlock {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "Type")]
    pub creature_type: String,
    #[serde(default, rename = "HP")]
    pub hp: ValueAndNotes,
    #[serde(default, rename = "AC")]
    pub ac: ValueAndNotes,
    #[serde(default)]
    pub abilities: Abilities,
    /// Explicit initiative modifier; falls back to the Dexterity modifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiative_modifier: Option<i32>,
    /// Set to `"player"` (any case) for player characters.
    #[serde(default)]
    pub player: String,
}

impl StatBlock {
    pub fn new(name: impl Into<String>, max_hp: i32) -> Self {
        Self {
            name: name.into(),
            hp: ValueAndNotes::new(max_hp),
            ..Self::default()
        }
    }

    pub fn with_ac(mut self, ac: i32) -> Self {
        self.ac = ValueAndNotes::new(ac);
        self
    }

    pub fn with_initiative_modifier(mut self, modifier: i32) -> Self {
        self.initiative_modifier = Some(modifier);
        self
    }

    pub fn with_abilities(mut self, abilities: Abilities) -> Self {
        self.abilities = abilities;
        self
    }

    pub fn with_type(mut self, creature_type: impl Into<String>) -> Self {
        self.creature_type = creature_type.into();
        self
    }

    pub fn player_character(mut self) -> Self {
        self.player = PLAYER_MARKER.to_string();
        self
    }
}

/// Read-only stats an encounter needs to track a combatant.
pub trait TrackerStats {
    fn name(&self) -> &str;
    fn max_hp(&self) -> i32;
    fn armor_class(&self) -> i32;
    fn initiative_modifier(&self) -> i32;
    fn is_player(&self) -> bool;

    /// The stat block a new combatant keeps a copy of.
    fn to_stat_block(&self) -> StatBlock;
}

impl TrackerStats for StatBlock {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_hp(&self) -> i32 {
        self.hp.value
    }

    fn armor_class(&self) -> i32 {
        self.ac.value
    }

    fn initiative_modifier(&self) -> i32 {
        self.initiative_modifier
            .unwrap_or_else(|| Abilities::modifier(self.abilities.dex))
    }

    fn is_player(&self) -> bool {
        self.player.to_lowercase() == PLAYER_MARKER
    }

    fn to_stat_block(&self) -> StatBlock {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_modifier() {
        assert_eq!(Abilities::modifier(10), 0);
        assert_eq!(Abilities::modifier(14), 2);
        assert_eq!(Abilities::modifier(9), -1);
        assert_eq!(Abilities::modifier(7), -2);
        assert_eq!(Abilities::modifier(1), -5);
    }

    #[test]
    fn test_initiative_modifier_falls_back_to_dex() {
        let quick = StatBlock::new("Scout", 16).with_abilities(Abilities {
            dex: 16,
            ..Abilities::default()
        });
        assert_eq!(quick.initiative_modifier(), 3);

        let explicit = quick.clone().with_initiative_modifier(-1);
        assert_eq!(explicit.initiative_modifier(), -1);
    }

    #[test]
    fn test_player_marker_is_case_insensitive() {
        let mut pc = StatBlock::new("Lia", 30);
        assert!(!pc.is_player());
        pc.player = "Player".to_string();
        assert!(pc.is_player());
        pc.player = "PLAYER".to_string();
        assert!(pc.is_player());
        pc.player = "npc".to_string();
        assert!(!pc.is_player());
    }

    #[test]
    fn test_pascal_case_json() {
        let json = r#"{
            "Name": "Goblin",
            "Type": "Small humanoid",
            "HP": { "Value": 7, "Notes": "(2d6)" },
            "AC": { "Value": 15 },
            "Abilities": { "Str": 8, "Dex": 14, "Con": 10, "Int": 10, "Wis": 8, "Cha": 8 },
            "Player": ""
        }"#;
        let goblin: StatBlock = serde_json::from_str(json).unwrap();
        assert_eq!(goblin.max_hp(), 7);
        assert_eq!(goblin.armor_class(), 15);
        assert_eq!(goblin.hp.notes, "(2d6)");
        assert_eq!(goblin.initiative_modifier(), 2);

        let value = serde_json::to_value(&goblin).unwrap();
        assert_eq!(value["HP"]["Value"], 7);
        assert!(value.get("InitiativeModifier").is_none());
    }
}
