//! Immutable views of encounter state for rendering.

use crate::combatant::CombatantId;
use crate::encounter::{Encounter, EncounterState};
use crate::prompt::PromptView;
use crate::view_model::{display_hp, hp_color, HpColor};
use serde::{Deserialize, Serialize};

/// Everything a UI row needs to draw one combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantSnapshot {
    pub id: CombatantId,
    pub name: String,
    pub display_name: String,
    /// Whether the display name carries the index label.
    pub show_index_label: bool,
    pub index_label: u32,
    pub initiative: Option<i32>,
    pub initiative_modifier: i32,
    pub current_hp: i32,
    pub temporary_hp: i32,
    pub max_hp: i32,
    pub armor_class: i32,
    pub display_hp: String,
    pub hp_color: HpColor,
    pub tags: Vec<String>,
    pub hidden: bool,
    /// Current HP at or below zero.
    pub down: bool,
    pub is_player: bool,
    pub is_active: bool,
    pub is_selected: bool,
}

/// The whole encounter at one revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterSnapshot {
    pub revision: u64,
    pub state: EncounterState,
    pub round: u32,
    /// Combatants in turn order.
    pub combatants: Vec<CombatantSnapshot>,
    pub active: Option<CombatantId>,
    pub selected: Vec<CombatantId>,
    pub prompts: Vec<PromptView>,
}

impl EncounterSnapshot {
    pub fn capture(encounter: &Encounter) -> Self {
        let intensity = encounter.config().hp_color_intensity;
        let combatants = encounter
            .combatants()
            .iter()
            .map(|c| CombatantSnapshot {
                id: c.id(),
                name: c.name().to_string(),
                display_name: encounter.display_name_of(c),
                show_index_label: c.alias().is_empty() && encounter.creature_count(c.name()) > 1,
                index_label: c.index_label(),
                initiative: c.initiative(),
                initiative_modifier: c.initiative_modifier(),
                current_hp: c.current_hp(),
                temporary_hp: c.temporary_hp(),
                max_hp: c.max_hp(),
                armor_class: c.armor_class(),
                display_hp: display_hp(c),
                hp_color: hp_color(c, intensity),
                tags: c.tags().to_vec(),
                hidden: c.is_hidden(),
                down: c.is_down(),
                is_player: c.is_player(),
                is_active: encounter.active() == Some(c.id()),
                is_selected: encounter.is_selected(c.id()),
            })
            .collect();

        Self {
            revision: encounter.revision(),
            state: encounter.state(),
            round: encounter.round(),
            combatants,
            active: encounter.active(),
            selected: encounter.selected().to_vec(),
            prompts: encounter.prompts().iter().map(|p| p.view()).collect(),
        }
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&CombatantSnapshot> {
        self.combatants.iter().find(|c| c.id == id)
    }

    pub fn active_combatant(&self) -> Option<&CombatantSnapshot> {
        self.active.and_then(|id| self.combatant(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use crate::encounter::AddFlags;
    use crate::testing::{goblin, ScriptedRules};

    #[test]
    fn test_snapshot_marks_active_and_selected() {
        let mut enc = Encounter::with_rules(TrackerConfig::default(), ScriptedRules::new(&[]));
        let first = enc.add_creature(&goblin(), AddFlags::default());
        let second = enc.add_creature(&goblin(), AddFlags::hidden());
        enc.start_encounter();
        enc.select(second);

        let snapshot = enc.snapshot();
        assert_eq!(snapshot.revision, enc.revision());
        assert_eq!(snapshot.round, 1);
        assert_eq!(snapshot.active_combatant().map(|c| c.id), Some(first));

        let row = snapshot.combatant(second).unwrap();
        assert!(row.is_selected);
        assert!(!row.is_active);
        assert!(row.hidden);
        assert!(row.show_index_label);
        assert_eq!(row.display_name, "Goblin 2");
        assert_eq!(row.display_hp, "7/7");
    }
}
