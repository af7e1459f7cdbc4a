//! Combatant records.
//!
//! A [`Combatant`] is one participant tracked by an encounter: a copy of its
//! stat block plus the mutable combat state (hit points, initiative, alias,
//! tags, visibility).

use crate::stat_block::{StatBlock, TrackerStats};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for combatants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatantId(pub Uuid);

impl CombatantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CombatantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a combatant is a monster/NPC or a player character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatantKind {
    Creature,
    PlayerCharacter,
}

/// Result of taking damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageResult {
    pub absorbed_by_temporary: i32,
    pub hp_lost: i32,
    pub dropped_to_zero: bool,
}

/// One participant in an encounter.
#[derive(Debug, Clone, PartialEq)]
pub struct Combatant {
    pub(crate) id: CombatantId,
    pub(crate) kind: CombatantKind,
    pub(crate) stat_block: StatBlock,
    pub(crate) current_hp: i32,
    pub(crate) temporary_hp: i32,
    pub(crate) initiative: Option<i32>,
    pub(crate) alias: String,
    pub(crate) index_label: u32,
    pub(crate) hidden: bool,
    pub(crate) tags: Vec<String>,
}

impl Combatant {
    pub(crate) fn from_stats(stats: &impl TrackerStats, index_label: u32) -> Self {
        let kind = if stats.is_player() {
            CombatantKind::PlayerCharacter
        } else {
            CombatantKind::Creature
        };
        Self {
            id: CombatantId::new(),
            kind,
            stat_block: stats.to_stat_block(),
            current_hp: stats.max_hp(),
            temporary_hp: 0,
            initiative: None,
            alias: String::new(),
            index_label,
            hidden: false,
            tags: Vec::new(),
        }
    }

    pub fn id(&self) -> CombatantId {
        self.id
    }

    pub fn kind(&self) -> CombatantKind {
        self.kind
    }

    pub fn is_player(&self) -> bool {
        self.kind == CombatantKind::PlayerCharacter
    }

    pub fn stat_block(&self) -> &StatBlock {
        &self.stat_block
    }

    /// The derived name: the stat block's base name, ignoring any alias.
    pub fn name(&self) -> &str {
        &self.stat_block.name
    }

    pub fn max_hp(&self) -> i32 {
        self.stat_block.max_hp()
    }

    pub fn armor_class(&self) -> i32 {
        self.stat_block.armor_class()
    }

    pub fn initiative_modifier(&self) -> i32 {
        self.stat_block.initiative_modifier()
    }

    pub fn current_hp(&self) -> i32 {
        self.current_hp
    }

    pub fn temporary_hp(&self) -> i32 {
        self.temporary_hp
    }

    pub fn initiative(&self) -> Option<i32> {
        self.initiative
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn index_label(&self) -> u32 {
        self.index_label
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn is_down(&self) -> bool {
        self.current_hp <= 0
    }

    /// Apply damage: temporary HP absorbs first, the rest comes off current HP.
    ///
    /// Current HP stops at zero unless `allow_negative` is set.
    pub fn take_damage(&mut self, amount: i32, allow_negative: bool) -> DamageResult {
        let amount = amount.max(0);
        let absorbed = amount.min(self.temporary_hp);
        self.temporary_hp -= absorbed;

        let before = self.current_hp;
        let mut after = before.saturating_sub(amount - absorbed);
        if after < 0 && !allow_negative {
            after = 0;
        }
        self.current_hp = after;

        DamageResult {
            absorbed_by_temporary: absorbed,
            hp_lost: before - after,
            dropped_to_zero: before > 0 && after <= 0,
        }
    }

    /// Restore hit points up to the maximum. Returns the amount actually healed.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.current_hp;
        if before < self.max_hp() {
            self.current_hp = before.saturating_add(amount.max(0)).min(self.max_hp());
        }
        self.current_hp - before
    }

    /// Grant temporary HP. Temporary HP never stacks: the larger pool wins.
    /// Returns whether the pool changed.
    pub fn grant_temporary_hp(&mut self, amount: i32) -> bool {
        if amount > self.temporary_hp {
            self.temporary_hp = amount;
            true
        } else {
            false
        }
    }

    /// Overwrite current HP (used when restoring saved state).
    pub(crate) fn set_current_hp(&mut self, hp: i32) {
        self.current_hp = hp.min(self.max_hp());
    }

    pub(crate) fn set_temporary_hp(&mut self, hp: i32) {
        self.temporary_hp = hp.max(0);
    }

    /// Remove the first tag equal to `tag`. Returns whether one was removed.
    pub(crate) fn remove_tag(&mut self, tag: &str) -> bool {
        match self.tags.iter().position(|t| t == tag) {
            Some(index) => {
                self.tags.remove(index);
                true
            }
            None => false,
        }
    }
}
