//! Per-combatant presentation logic.
//!
//! A [`CombatantViewModel`] turns raw user input into validated mutations of
//! one combatant and derives its display values. It borrows the encounter,
//! so every change still flows through the encounter's notification.

use crate::combatant::{Combatant, CombatantId};
use crate::encounter::Encounter;
use crate::input::parse_int;
use crate::outcome::{Outcome, Reason};
use crate::prompt::PromptId;
use crate::tags::Condition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alias if set, otherwise the stat block name, suffixed with the index
/// label when more than one live combatant shares the name.
pub fn display_name(combatant: &Combatant, same_name_count: usize) -> String {
    if !combatant.alias().is_empty() {
        combatant.alias().to_string()
    } else if same_name_count > 1 {
        format!("{} {}", combatant.name(), combatant.index_label())
    } else {
        combatant.name().to_string()
    }
}

/// `current+temp/max`, or `current/max` without temporary HP.
pub fn display_hp(combatant: &Combatant) -> String {
    if combatant.temporary_hp() != 0 {
        format!(
            "{}+{}/{}",
            combatant.current_hp(),
            combatant.temporary_hp(),
            combatant.max_hp()
        )
    } else {
        format!("{}/{}", combatant.current_hp(), combatant.max_hp())
    }
}

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HpColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl fmt::Display for HpColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.red, self.green, self.blue)
    }
}

/// Fade from green at full health to red at zero.
///
/// `green = floor(ratio * intensity)`, `red = floor((max - current) / max * intensity)`,
/// with the ratio clamped to `[0, 1]`. Blue is always zero.
pub fn hp_color(combatant: &Combatant, intensity: u8) -> HpColor {
    let max = combatant.max_hp();
    if max <= 0 {
        return HpColor {
            red: 0,
            green: intensity,
            blue: 0,
        };
    }

    let max = f64::from(max);
    let current = f64::from(combatant.current_hp()).clamp(0.0, max);
    let intensity = f64::from(intensity);
    HpColor {
        red: ((max - current) / max * intensity).floor() as u8,
        green: (current / max * intensity).floor() as u8,
        blue: 0,
    }
}

/// Presentation handle for one combatant of an encounter.
pub struct CombatantViewModel<'a> {
    encounter: &'a mut Encounter,
    id: CombatantId,
}

impl<'a> CombatantViewModel<'a> {
    pub(crate) fn new(encounter: &'a mut Encounter, id: CombatantId) -> Self {
        Self { encounter, id }
    }

    pub fn id(&self) -> CombatantId {
        self.id
    }

    pub fn combatant(&self) -> Option<&Combatant> {
        self.encounter.combatant(self.id)
    }

    pub fn display_name(&self) -> String {
        self.combatant()
            .map(|c| self.encounter.display_name_of(c))
            .unwrap_or_default()
    }

    pub fn display_hp(&self) -> String {
        self.combatant().map(display_hp).unwrap_or_default()
    }

    pub fn hp_color(&self) -> HpColor {
        let intensity = self.encounter.config().hp_color_intensity;
        self.combatant()
            .map(|c| hp_color(c, intensity))
            .unwrap_or(HpColor {
                red: 0,
                green: 0,
                blue: 0,
            })
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Apply damage (positive) or healing (zero or negative) typed by the user.
    ///
    /// Damage drains temporary HP first. Current HP stops at zero unless the
    /// encounter's config allows negative HP; healing stops at max and never
    /// touches temporary HP.
    pub fn apply_damage(&mut self, input: &str) -> Outcome {
        let Some(amount) = parse_int(input) else {
            return Outcome::Ignored(Reason::InvalidNumber);
        };
        let allow_negative = self.encounter.config().allow_negative_hp;
        let Some(combatant) = self.encounter.combatant_mut(self.id) else {
            return Outcome::Ignored(Reason::UnknownCombatant);
        };

        if amount > 0 {
            let result = combatant.take_damage(amount, allow_negative);
            tracing::debug!(
                id = %self.id,
                amount,
                absorbed = result.absorbed_by_temporary,
                lost = result.hp_lost,
                down = result.dropped_to_zero,
                hp = combatant.current_hp(),
                "applied damage"
            );
        } else {
            let healed = combatant.heal(amount.saturating_neg());
            tracing::debug!(id = %self.id, healed, hp = combatant.current_hp(), "applied healing");
        }
        self.encounter.changed();
        Outcome::Applied
    }

    /// Grant temporary HP; the larger of the current and new pools is kept.
    pub fn apply_temporary_hp(&mut self, input: &str) -> Outcome {
        let Some(amount) = parse_int(input) else {
            return Outcome::Ignored(Reason::InvalidNumber);
        };
        let Some(combatant) = self.encounter.combatant_mut(self.id) else {
            return Outcome::Ignored(Reason::UnknownCombatant);
        };
        if !combatant.grant_temporary_hp(amount) {
            return Outcome::Ignored(Reason::Unchanged);
        }
        self.encounter.changed();
        Outcome::Applied
    }

    /// Set initiative directly and re-sort the encounter.
    pub fn apply_initiative(&mut self, input: &str) -> Outcome {
        let Some(initiative) = parse_int(input) else {
            return Outcome::Ignored(Reason::InvalidNumber);
        };
        let Some(combatant) = self.encounter.combatant_mut(self.id) else {
            return Outcome::Ignored(Reason::UnknownCombatant);
        };
        combatant.initiative = Some(initiative);
        self.encounter.sort_by_initiative();
        Outcome::Applied
    }

    /// Hide from or reveal in the player view.
    pub fn toggle_hidden(&mut self) -> Outcome {
        let name = self.display_name();
        let Some(combatant) = self.encounter.combatant_mut(self.id) else {
            return Outcome::Ignored(Reason::UnknownCombatant);
        };
        combatant.hidden = !combatant.hidden;
        let message = if combatant.hidden {
            format!("{name} hidden in player view.")
        } else {
            format!("{name} revealed in player view.")
        };
        self.encounter.log_event(message);
        self.encounter.changed();
        Outcome::Applied
    }

    /// Append a note. Condition names are normalized to their usual spelling.
    pub fn add_tag(&mut self, text: &str) -> Outcome {
        let text = text.trim();
        if text.is_empty() {
            return Outcome::Ignored(Reason::EmptyText);
        }
        let text = Condition::from_name(text)
            .map_or_else(|| text.to_string(), |c| c.name().to_string());

        let name = self.display_name();
        let Some(combatant) = self.encounter.combatant_mut(self.id) else {
            return Outcome::Ignored(Reason::UnknownCombatant);
        };
        combatant.tags.push(text.clone());
        self.encounter.log_event(format!("{name} added note: \"{text}\""));
        self.encounter.changed();
        Outcome::Applied
    }

    /// Remove one note equal to `tag`.
    pub fn remove_tag(&mut self, tag: &str) -> Outcome {
        let name = self.display_name();
        let Some(combatant) = self.encounter.combatant_mut(self.id) else {
            return Outcome::Ignored(Reason::UnknownCombatant);
        };
        if !combatant.remove_tag(tag) {
            return Outcome::Ignored(Reason::Unchanged);
        }
        self.encounter.log_event(format!("{name} removed note: \"{tag}\""));
        self.encounter.changed();
        Outcome::Applied
    }

    /// Rename the combatant; an empty alias restores the derived name.
    pub fn set_alias(&mut self, alias: &str) -> Outcome {
        let alias = alias.trim();
        let old_name = self.display_name();
        let Some(combatant) = self.encounter.combatant_mut(self.id) else {
            return Outcome::Ignored(Reason::UnknownCombatant);
        };
        if combatant.alias == alias {
            return Outcome::Ignored(Reason::Unchanged);
        }
        combatant.alias = alias.to_string();

        let message = if alias.is_empty() {
            format!("{old_name} alias removed.")
        } else {
            format!("{old_name} alias changed to {alias}.")
        };
        self.encounter.log_event(message);
        self.encounter.changed();
        Outcome::Applied
    }

    /// Apply a damage prompt response and log the change.
    pub(crate) fn commit_damage(&mut self, response: &str) -> Outcome {
        let Some(amount) = parse_int(response) else {
            return Outcome::Ignored(Reason::InvalidNumber);
        };
        let name = self.display_name();
        let was_down = self.combatant().is_some_and(Combatant::is_down);
        let outcome = self.apply_damage(response);
        if outcome.is_applied() {
            let message = if amount > 0 {
                format!("{amount} damage applied to {name}.")
            } else {
                format!("{} HP restored to {name}.", amount.saturating_neg())
            };
            self.encounter.log_event(message);
            if !was_down && self.combatant().is_some_and(Combatant::is_down) {
                self.encounter.log_event(format!("{name} is down."));
            }
        }
        outcome
    }

    // ========================================================================
    // Prompts
    // ========================================================================

    /// Ask for damage (or negative numbers for healing).
    pub fn edit_hp(&mut self) -> PromptId {
        let id = self.id;
        let content = format!("Apply damage to {}:", self.display_name());
        self.encounter.enqueue_prompt(
            content,
            "damage",
            None,
            Box::new(move |encounter, response| match encounter.view_model(id) {
                Some(mut vm) => vm.commit_damage(response),
                None => Outcome::Ignored(Reason::UnknownCombatant),
            }),
        )
    }

    /// Ask for a new initiative value.
    pub fn edit_initiative(&mut self) -> PromptId {
        let id = self.id;
        let current = self.combatant().and_then(Combatant::initiative);
        let content = format!("Update initiative for {}:", self.display_name());
        self.encounter.enqueue_prompt(
            content,
            "initiative",
            current.map(|i| i.to_string()),
            Box::new(move |encounter, response| {
                let Some(mut vm) = encounter.view_model(id) else {
                    return Outcome::Ignored(Reason::UnknownCombatant);
                };
                let outcome = vm.apply_initiative(response);
                if let (Outcome::Applied, Some(value)) = (outcome, parse_int(response)) {
                    let name = vm.display_name();
                    vm.encounter.log_event(format!("{name} initiative set to {value}."));
                }
                outcome
            }),
        )
    }

    /// Ask for a new alias.
    pub fn edit_name(&mut self) -> PromptId {
        let id = self.id;
        let alias = self.combatant().map(|c| c.alias().to_string()).filter(|a| !a.is_empty());
        let content = format!("Change alias for {}:", self.display_name());
        self.encounter.enqueue_prompt(
            content,
            "alias",
            alias,
            Box::new(move |encounter, response| match encounter.view_model(id) {
                Some(mut vm) => vm.set_alias(response),
                None => Outcome::Ignored(Reason::UnknownCombatant),
            }),
        )
    }

    /// Ask for a temporary HP grant.
    pub fn add_temporary_hp(&mut self) -> PromptId {
        let id = self.id;
        let content = format!("Grant temporary hit points to {}:", self.display_name());
        self.encounter.enqueue_prompt(
            content,
            "temporary_hp",
            None,
            Box::new(move |encounter, response| {
                let Some(mut vm) = encounter.view_model(id) else {
                    return Outcome::Ignored(Reason::UnknownCombatant);
                };
                let outcome = vm.apply_temporary_hp(response);
                if let (Outcome::Applied, Some(amount)) = (outcome, parse_int(response)) {
                    let name = vm.display_name();
                    vm.encounter
                        .log_event(format!("{amount} temporary hit points applied to {name}."));
                }
                outcome
            }),
        )
    }

    /// Ask for a note to attach. See [`crate::tags::suggest`] for completions.
    pub fn add_tag_prompt(&mut self) -> PromptId {
        let id = self.id;
        let content = format!("Add a note to {}:", self.display_name());
        self.encounter.enqueue_prompt(
            content,
            "tag",
            None,
            Box::new(move |encounter, response| match encounter.view_model(id) {
                Some(mut vm) => vm.add_tag(response),
                None => Outcome::Ignored(Reason::UnknownCombatant),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use crate::encounter::AddFlags;
    use crate::stat_block::StatBlock;
    use crate::testing::{goblin, ScriptedRules};

    fn single(max_hp: i32, config: TrackerConfig) -> (Encounter, CombatantId) {
        let mut enc = Encounter::with_rules(config, ScriptedRules::new(&[]));
        let id = enc.add_creature(&StatBlock::new("Ogre", max_hp), AddFlags::default());
        (enc, id)
    }

    #[test]
    fn test_overkill_clamps_at_zero() {
        let (mut enc, id) = single(20, TrackerConfig::default());
        let mut vm = enc.view_model(id).unwrap();
        vm.apply_damage("10");
        assert_eq!(vm.apply_damage("15"), Outcome::Applied);
        let c = vm.combatant().unwrap();
        assert_eq!((c.current_hp(), c.temporary_hp()), (0, 0));
    }

    #[test]
    fn test_overkill_with_negative_hp() {
        let (mut enc, id) = single(20, TrackerConfig::default().with_allow_negative_hp(true));
        let mut vm = enc.view_model(id).unwrap();
        vm.apply_damage("10");
        vm.apply_damage("15");
        assert_eq!(vm.combatant().unwrap().current_hp(), -5);
    }

    #[test]
    fn test_invalid_input_is_ignored() {
        let (mut enc, id) = single(20, TrackerConfig::default());
        let revision = enc.revision();
        let mut vm = enc.view_model(id).unwrap();
        assert_eq!(vm.apply_damage("lots"), Outcome::Ignored(Reason::InvalidNumber));
        assert_eq!(vm.apply_temporary_hp(""), Outcome::Ignored(Reason::InvalidNumber));
        assert_eq!(vm.apply_initiative("?"), Outcome::Ignored(Reason::InvalidNumber));
        assert_eq!(vm.display_hp(), "20/20");
        assert_eq!(enc.revision(), revision);
    }

    #[test]
    fn test_healing_leaves_temporary_hp() {
        let (mut enc, id) = single(20, TrackerConfig::default());
        let mut vm = enc.view_model(id).unwrap();
        vm.apply_temporary_hp("5");
        vm.apply_damage("12");
        assert_eq!(vm.display_hp(), "13/20");
        vm.apply_temporary_hp("3");
        vm.apply_damage("-30");
        assert_eq!(vm.display_hp(), "20+3/20");
    }

    #[test]
    fn test_temporary_hp_keeps_larger_pool() {
        let (mut enc, id) = single(20, TrackerConfig::default());
        let mut vm = enc.view_model(id).unwrap();
        assert_eq!(vm.apply_temporary_hp("6"), Outcome::Applied);
        assert_eq!(vm.apply_temporary_hp("4"), Outcome::Ignored(Reason::Unchanged));
        assert_eq!(vm.combatant().unwrap().temporary_hp(), 6);
    }

    #[test]
    fn test_hp_color() {
        let (mut enc, id) = single(20, TrackerConfig::default());
        let mut vm = enc.view_model(id).unwrap();
        assert_eq!(vm.hp_color().to_string(), "rgb(0,170,0)");
        vm.apply_damage("10");
        assert_eq!(vm.hp_color().to_string(), "rgb(85,85,0)");
        vm.apply_damage("10");
        assert_eq!(vm.hp_color().to_string(), "rgb(170,0,0)");
    }

    #[test]
    fn test_hp_color_with_custom_intensity() {
        let (mut enc, id) = single(4, TrackerConfig::default().with_hp_color_intensity(255));
        let mut vm = enc.view_model(id).unwrap();
        vm.apply_damage("1");
        assert_eq!(
            vm.hp_color(),
            HpColor {
                red: 63,
                green: 191,
                blue: 0
            }
        );
    }

    #[test]
    fn test_display_name_prefers_alias() {
        let mut enc = Encounter::with_rules(TrackerConfig::default(), ScriptedRules::new(&[]));
        let first = enc.add_creature(&goblin(), AddFlags::default());
        enc.add_creature(&goblin(), AddFlags::default());

        let mut vm = enc.view_model(first).unwrap();
        assert_eq!(vm.display_name(), "Goblin 1");
        assert_eq!(vm.set_alias("Snik"), Outcome::Applied);
        assert_eq!(vm.display_name(), "Snik");
        assert_eq!(vm.set_alias("Snik"), Outcome::Ignored(Reason::Unchanged));
        vm.set_alias("");
        assert_eq!(vm.display_name(), "Goblin 1");

        let messages: Vec<&str> = enc.events().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["Goblin 1 alias changed to Snik.", "Snik alias removed."]
        );
    }

    #[test]
    fn test_toggle_hidden_logs() {
        let (mut enc, id) = single(20, TrackerConfig::default());
        let mut vm = enc.view_model(id).unwrap();
        vm.toggle_hidden();
        assert!(vm.combatant().unwrap().is_hidden());
        vm.toggle_hidden();
        assert!(!vm.combatant().unwrap().is_hidden());
        assert_eq!(vm.combatant().unwrap().current_hp(), 20);

        let messages: Vec<&str> = enc.events().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["Ogre hidden in player view.", "Ogre revealed in player view."]
        );
    }

    #[test]
    fn test_tags() {
        let (mut enc, id) = single(20, TrackerConfig::default());
        let mut vm = enc.view_model(id).unwrap();
        assert_eq!(vm.add_tag("  "), Outcome::Ignored(Reason::EmptyText));
        vm.add_tag("prone");
        vm.add_tag("Bless (3 rounds)");
        vm.add_tag("Prone");
        assert_eq!(vm.remove_tag("Prone"), Outcome::Applied);
        assert_eq!(vm.remove_tag("Stunned"), Outcome::Ignored(Reason::Unchanged));
        assert_eq!(
            vm.combatant().unwrap().tags(),
            ["Bless (3 rounds)".to_string(), "Prone".to_string()]
        );
        assert_eq!(
            enc.events().last().map(|e| e.message.as_str()),
            Some("Ogre removed note: \"Prone\"")
        );
    }

    #[test]
    fn test_prompts_apply_and_log() {
        let (mut enc, id) = single(20, TrackerConfig::default());

        let hp = enc.view_model(id).unwrap().edit_hp();
        assert_eq!(enc.resolve_prompt(hp, "7"), Outcome::Applied);
        assert_eq!(enc.combatant(id).unwrap().current_hp(), 13);

        let thp = enc.view_model(id).unwrap().add_temporary_hp();
        enc.resolve_prompt(thp, "4");

        let init = enc.view_model(id).unwrap().edit_initiative();
        enc.resolve_prompt(init, "18");
        assert_eq!(enc.combatant(id).unwrap().initiative(), Some(18));

        let tag = enc.view_model(id).unwrap().add_tag_prompt();
        enc.resolve_prompt(tag, "stunned");

        let messages: Vec<&str> = enc.events().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "7 damage applied to Ogre.",
                "4 temporary hit points applied to Ogre.",
                "Ogre initiative set to 18.",
                "Ogre added note: \"Stunned\"",
            ]
        );
    }

    #[test]
    fn test_dropping_to_zero_is_logged_once() {
        let (mut enc, id) = single(10, TrackerConfig::default());

        let hp = enc.view_model(id).unwrap().edit_hp();
        enc.resolve_prompt(hp, "12");
        assert!(enc.combatant(id).unwrap().is_down());
        assert!(enc.snapshot().combatant(id).unwrap().down);

        let hp = enc.view_model(id).unwrap().edit_hp();
        enc.resolve_prompt(hp, "3");

        let messages: Vec<&str> = enc.events().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "12 damage applied to Ogre.",
                "Ogre is down.",
                "3 damage applied to Ogre.",
            ]
        );
    }

    #[test]
    fn test_dismissed_prompt_never_runs() {
        let (mut enc, id) = single(20, TrackerConfig::default());
        let prompt = enc.view_model(id).unwrap().edit_hp();
        assert_eq!(enc.dismiss_prompt(prompt), Outcome::Applied);
        assert_eq!(enc.resolve_prompt(prompt, "5"), Outcome::Ignored(Reason::NoPrompt));
        assert_eq!(enc.combatant(id).unwrap().current_hp(), 20);
    }
}
