//! The encounter: combatant order, selection and turn progression.
//!
//! [`Encounter`] is the single owner of combat state. Every mutation goes
//! through it (directly or through a [`CombatantViewModel`]), returns an
//! [`Outcome`], bumps the revision and hands subscribers a fresh
//! [`EncounterSnapshot`].

use crate::combatant::{Combatant, CombatantId};
use crate::config::TrackerConfig;
use crate::dice::modifier_string;
use crate::input::parse_int;
use crate::log::{LogEntry, LogSink};
use crate::outcome::{Outcome, Reason};
use crate::persist::{SavedCreature, SavedEncounter, SAVE_VERSION};
use crate::prompt::{PromptCallback, PromptId, PromptQueue};
use crate::rules::{DefaultRules, Rules};
use crate::snapshot::EncounterSnapshot;
use crate::stat_block::TrackerStats;
use crate::view_model::{self, CombatantViewModel};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Whether the encounter is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncounterState {
    #[default]
    Inactive,
    Active,
}

/// Modifiers applied when adding a combatant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddFlags {
    /// Hide the combatant from the player view.
    pub hidden: bool,
}

impl AddFlags {
    pub fn hidden() -> Self {
        Self { hidden: true }
    }
}

/// Per-name bookkeeping: live combatants and the last index label handed out.
#[derive(Debug, Clone, Copy, Default)]
struct NameCount {
    live: usize,
    last_label: u32,
}

/// Called with a fresh snapshot after every change.
pub type ChangeListener = Box<dyn FnMut(&EncounterSnapshot)>;

/// Authoritative owner of the combatant list, selection and turn order.
pub struct Encounter {
    combatants: Vec<Combatant>,
    name_counts: HashMap<String, NameCount>,
    selected: Vec<CombatantId>,
    active: Option<CombatantId>,
    state: EncounterState,
    round: u32,
    config: TrackerConfig,
    rules: Box<dyn Rules>,
    prompts: PromptQueue,
    events: Vec<LogEntry>,
    sink: Option<Box<dyn LogSink>>,
    listeners: Vec<ChangeListener>,
    revision: u64,
    /// Set while a multi-step operation runs; listeners hear once at the end.
    batching: bool,
    dirty: bool,
}

impl fmt::Debug for Encounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encounter")
            .field("combatants", &self.combatants)
            .field("selected", &self.selected)
            .field("active", &self.active)
            .field("state", &self.state)
            .field("round", &self.round)
            .field("config", &self.config)
            .field("prompts", &self.prompts)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl Default for Encounter {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl Encounter {
    /// Create an empty encounter using the default d20 rules.
    pub fn new(config: TrackerConfig) -> Self {
        let rules = DefaultRules::from_config(&config);
        Self::with_rules(config, rules)
    }

    /// Create an empty encounter with custom rules.
    pub fn with_rules(config: TrackerConfig, rules: impl Rules + 'static) -> Self {
        Self {
            combatants: Vec::new(),
            name_counts: HashMap::new(),
            selected: Vec::new(),
            active: None,
            state: EncounterState::Inactive,
            round: 0,
            config,
            rules: Box::new(rules),
            prompts: PromptQueue::new(),
            events: Vec::new(),
            sink: None,
            listeners: Vec::new(),
            revision: 0,
            batching: false,
            dirty: false,
        }
    }

    /// Forward narrative log messages to `sink`.
    pub fn set_log_sink(&mut self, sink: impl LogSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// Register a listener called after every change.
    pub fn subscribe(&mut self, listener: impl FnMut(&EncounterSnapshot) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }

    pub(crate) fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.iter_mut().find(|c| c.id == id)
    }

    pub fn index_of(&self, id: CombatantId) -> Option<usize> {
        self.combatants.iter().position(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    pub fn state(&self) -> EncounterState {
        self.state
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// The combatant whose turn it is.
    pub fn active(&self) -> Option<CombatantId> {
        self.active
    }

    pub fn active_combatant(&self) -> Option<&Combatant> {
        self.active.and_then(|id| self.combatant(id))
    }

    /// Selected combatants, in selection order.
    pub fn selected(&self) -> &[CombatantId] {
        &self.selected
    }

    pub fn is_selected(&self, id: CombatantId) -> bool {
        self.selected.contains(&id)
    }

    /// Number of live combatants whose stat block is named `name`.
    pub fn creature_count(&self, name: &str) -> usize {
        self.name_counts.get(name).map_or(0, |count| count.live)
    }

    /// Display name of a combatant, with its index label when the name is shared.
    pub fn display_name_of(&self, combatant: &Combatant) -> String {
        view_model::display_name(combatant, self.creature_count(combatant.name()))
    }

    pub fn prompts(&self) -> &PromptQueue {
        &self.prompts
    }

    /// All narrative events, oldest first.
    pub fn events(&self) -> &[LogEntry] {
        &self.events
    }

    /// The most recent `count` narrative events, oldest first.
    pub fn recent_events(&self, count: usize) -> &[LogEntry] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    /// Incremented on every change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> EncounterSnapshot {
        EncounterSnapshot::capture(self)
    }

    /// Borrow the view model of one combatant.
    pub fn view_model(&mut self, id: CombatantId) -> Option<CombatantViewModel<'_>> {
        self.index_of(id)?;
        Some(CombatantViewModel::new(self, id))
    }

    // ========================================================================
    // Combatant collection
    // ========================================================================

    /// Add a combatant built from `stats` to the end of the list.
    ///
    /// Stats marked as a player produce a player character. The new
    /// combatant gets the next index label for its name.
    pub fn add_creature(&mut self, stats: &impl TrackerStats, flags: AddFlags) -> CombatantId {
        let id = self.insert_creature(stats, flags);
        self.claim_turn_if_unset();
        self.changed();
        id
    }

    /// A running encounter with combatants always has someone's turn.
    fn claim_turn_if_unset(&mut self) {
        if self.state == EncounterState::Active && self.active.is_none() {
            self.active = self.combatants.first().map(|c| c.id);
        }
    }

    fn insert_creature(&mut self, stats: &impl TrackerStats, flags: AddFlags) -> CombatantId {
        let count = self.name_counts.entry(stats.name().to_string()).or_default();
        count.live += 1;
        count.last_label += 1;

        let mut combatant = Combatant::from_stats(stats, count.last_label);
        combatant.hidden = flags.hidden;
        let id = combatant.id;

        tracing::debug!(
            %id,
            name = stats.name(),
            index_label = combatant.index_label,
            player = combatant.is_player(),
            "added combatant"
        );
        self.combatants.push(combatant);
        id
    }

    /// Remove every selected combatant.
    ///
    /// A name's count and index labels reset once no combatant of that name
    /// remains. If the active combatant goes, the turn passes to the next
    /// surviving combatant in order.
    pub fn remove_selected(&mut self) -> Outcome {
        if self.selected.is_empty() {
            return Outcome::Ignored(Reason::NoSelection);
        }

        let removing: HashSet<CombatantId> = self.selected.drain(..).collect();
        let successor = match self.active {
            Some(active) if removing.contains(&active) => {
                Some(self.turn_successor(active, &removing))
            }
            _ => None,
        };

        let mut removed_names = Vec::new();
        self.combatants.retain(|c| {
            if removing.contains(&c.id) {
                removed_names.push(c.name().to_string());
                false
            } else {
                true
            }
        });

        for name in removed_names {
            if let Some(count) = self.name_counts.get_mut(&name) {
                count.live = count.live.saturating_sub(1);
                if count.live == 0 {
                    self.name_counts.remove(&name);
                }
            }
        }

        if let Some(next) = successor {
            self.active = next;
        }

        tracing::debug!(
            removed = removing.len(),
            remaining = self.combatants.len(),
            "removed selected combatants"
        );
        self.changed();
        Outcome::Applied
    }

    /// The first combatant after `active` (wrapping) that is not being removed.
    fn turn_successor(
        &self,
        active: CombatantId,
        removing: &HashSet<CombatantId>,
    ) -> Option<CombatantId> {
        let len = self.combatants.len();
        let start = self.index_of(active)?;
        (1..=len)
            .map(|step| &self.combatants[(start + step) % len])
            .find(|c| !removing.contains(&c.id))
            .map(|c| c.id)
    }

    /// Remove every combatant and reset turn state. Prompts are dropped.
    pub fn clear(&mut self) {
        self.combatants.clear();
        self.name_counts.clear();
        self.selected.clear();
        self.active = None;
        self.state = EncounterState::Inactive;
        self.round = 0;
        self.prompts.clear();
        self.changed();
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Select exactly one combatant.
    pub fn select(&mut self, id: CombatantId) -> Outcome {
        if self.index_of(id).is_none() {
            return Outcome::Ignored(Reason::UnknownCombatant);
        }
        self.selected = vec![id];
        self.changed();
        Outcome::Applied
    }

    /// Add a combatant to the selection, or remove it if already selected.
    pub fn toggle_selection(&mut self, id: CombatantId) -> Outcome {
        if self.index_of(id).is_none() {
            return Outcome::Ignored(Reason::UnknownCombatant);
        }
        match self.selected.iter().position(|s| *s == id) {
            Some(index) => {
                self.selected.remove(index);
            }
            None => self.selected.push(id),
        }
        self.changed();
        Outcome::Applied
    }

    pub fn clear_selection(&mut self) -> Outcome {
        if self.selected.is_empty() {
            return Outcome::Ignored(Reason::NoSelection);
        }
        self.selected.clear();
        self.changed();
        Outcome::Applied
    }

    pub fn select_previous(&mut self) -> Outcome {
        self.navigate_selection(-1)
    }

    pub fn select_next(&mut self) -> Outcome {
        self.navigate_selection(1)
    }

    /// Select the combatant `offset` places from the first selected one,
    /// clamped to the list. With nothing selected the first combatant is chosen.
    fn navigate_selection(&mut self, offset: isize) -> Outcome {
        if self.combatants.is_empty() {
            return Outcome::Ignored(Reason::EmptyEncounter);
        }

        let last = self.combatants.len() as isize - 1;
        let current = self
            .selected
            .first()
            .and_then(|id| self.index_of(*id))
            .map_or(-1, |index| index as isize);
        let target = (current + offset).clamp(0, last) as usize;
        let id = self.combatants[target].id;

        if self.selected == [id] {
            return Outcome::Ignored(Reason::AtBoundary);
        }
        self.selected = vec![id];
        self.changed();
        Outcome::Applied
    }

    pub fn move_selected_up(&mut self) -> Outcome {
        self.move_selected(-1)
    }

    pub fn move_selected_down(&mut self) -> Outcome {
        self.move_selected(1)
    }

    /// Shift the first selected combatant by one slot, ignoring initiative.
    fn move_selected(&mut self, offset: isize) -> Outcome {
        let Some(&id) = self.selected.first() else {
            return Outcome::Ignored(Reason::NoSelection);
        };
        let Some(index) = self.index_of(id) else {
            return Outcome::Ignored(Reason::UnknownCombatant);
        };

        let target = index as isize + offset;
        if target < 0 || target >= self.combatants.len() as isize {
            return Outcome::Ignored(Reason::AtBoundary);
        }
        self.combatants.swap(index, target as usize);
        self.changed();
        Outcome::Applied
    }

    // ========================================================================
    // Initiative
    // ========================================================================

    /// Re-sort by initiative: highest first, ties broken by the higher
    /// initiative modifier. Combatants without initiative go last. The sort
    /// is stable, so full ties keep their current order.
    pub fn sort_by_initiative(&mut self) {
        self.sort_combatants();
        self.changed();
    }

    fn sort_combatants(&mut self) {
        self.combatants.sort_by(|l, r| {
            r.initiative
                .cmp(&l.initiative)
                .then_with(|| r.initiative_modifier().cmp(&l.initiative_modifier()))
        });
    }

    /// Roll initiative for everyone and sort.
    ///
    /// With grouping enabled, the first roll for a name is reused for every
    /// combatant sharing it. Player characters are asked for their roll
    /// through a prompt unless `prompt_player_initiative` is off.
    pub fn roll_initiative(&mut self) -> Outcome {
        if self.combatants.is_empty() {
            return Outcome::Ignored(Reason::EmptyEncounter);
        }
        self.batch(Self::roll_all);
        Outcome::Applied
    }

    fn roll_all(&mut self) {
        // Sorting reorders the list, so walk a copy of the ids.
        let ids: Vec<CombatantId> = self.combatants.iter().map(|c| c.id).collect();
        let group = self.config.group_similar_creatures || self.rules.group_similar_creatures();
        let mut group_rolls: HashMap<String, i32> = HashMap::new();
        let mut players = Vec::new();

        for id in ids {
            let Some(combatant) = self.combatant(id) else {
                continue;
            };
            if combatant.is_player() && self.config.prompt_player_initiative {
                players.push(id);
                continue;
            }

            let name = combatant.name().to_string();
            let modifier = combatant.initiative_modifier();
            let roll = if group {
                match group_rolls.get(&name) {
                    Some(roll) => *roll,
                    None => {
                        let roll = self.rules.check(modifier);
                        group_rolls.insert(name.clone(), roll);
                        roll
                    }
                }
            } else {
                self.rules.check(modifier)
            };

            tracing::debug!(%id, name = %name, roll, grouped = group, "rolled initiative");
            if let Some(combatant) = self.combatant_mut(id) {
                combatant.initiative = Some(roll);
            }
        }

        self.sort_combatants();
        for id in players {
            self.request_initiative(id);
        }
        self.changed();
    }

    /// Ask the user for a combatant's initiative, suggesting a rolled value.
    ///
    /// The answer sets the initiative and re-sorts; an unparsable answer
    /// changes nothing.
    pub fn request_initiative(&mut self, id: CombatantId) -> Outcome {
        let Some(combatant) = self.combatant(id) else {
            return Outcome::Ignored(Reason::UnknownCombatant);
        };
        let modifier = combatant.initiative_modifier();
        let name = self.display_name_of(combatant);
        let suggested = self.rules.check(modifier);

        self.enqueue_prompt(
            format!("Initiative roll for {name} ({}):", modifier_string(modifier)),
            "initiative",
            Some(suggested.to_string()),
            Box::new(move |encounter, response| {
                let Some(initiative) = parse_int(response) else {
                    return Outcome::Ignored(Reason::InvalidNumber);
                };
                let Some(combatant) = encounter.combatant_mut(id) else {
                    return Outcome::Ignored(Reason::UnknownCombatant);
                };
                combatant.initiative = Some(initiative);
                encounter.sort_combatants();
                Outcome::Applied
            }),
        );
        Outcome::Applied
    }

    // ========================================================================
    // Turns
    // ========================================================================

    /// Start the encounter at the top of the order, round 1.
    pub fn start_encounter(&mut self) -> Outcome {
        if self.state == EncounterState::Active {
            return Outcome::Ignored(Reason::AlreadyActive);
        }
        self.state = EncounterState::Active;
        self.active = self.combatants.first().map(|c| c.id);
        self.round = 1;
        tracing::info!(combatants = self.combatants.len(), "encounter started");
        self.changed();
        Outcome::Applied
    }

    pub fn end_encounter(&mut self) -> Outcome {
        if self.state == EncounterState::Inactive {
            return Outcome::Ignored(Reason::NotActive);
        }
        self.state = EncounterState::Inactive;
        self.active = None;
        tracing::info!(rounds = self.round, "encounter ended");
        self.round = 0;
        self.changed();
        Outcome::Applied
    }

    /// Pass the turn to the next combatant, wrapping to the top (and a new round).
    pub fn next_turn(&mut self) -> Outcome {
        self.advance_turn(true)
    }

    /// Hand the turn back to the previous combatant, wrapping to the bottom.
    pub fn previous_turn(&mut self) -> Outcome {
        self.advance_turn(false)
    }

    fn advance_turn(&mut self, forward: bool) -> Outcome {
        if self.state != EncounterState::Active {
            return Outcome::Ignored(Reason::NotActive);
        }
        if self.combatants.is_empty() {
            return Outcome::Ignored(Reason::EmptyEncounter);
        }

        let len = self.combatants.len();
        let current = self.active.and_then(|id| self.index_of(id));
        let next = match (current, forward) {
            (Some(index), true) => (index + 1) % len,
            (None, true) => 0,
            (Some(index), false) => (index + len - 1) % len,
            (None, false) => len - 1,
        };

        if forward && current == Some(len - 1) {
            self.round += 1;
        } else if !forward && current == Some(0) && self.round > 1 {
            self.round -= 1;
        }

        self.active = Some(self.combatants[next].id);
        tracing::debug!(round = self.round, index = next, "turn changed");
        self.changed();
        Outcome::Applied
    }

    // ========================================================================
    // Selected-combatant commands
    // ========================================================================

    /// Ask for damage to the selection: the combatant's own HP prompt when
    /// one is selected, a shared prompt applying the same amount to all
    /// otherwise.
    pub fn focus_selected_hp(&mut self) -> Outcome {
        let selected = self.selected.clone();
        match selected.len() {
            0 => Outcome::Ignored(Reason::NoSelection),
            1 => match self.view_model(selected[0]) {
                Some(mut vm) => {
                    vm.edit_hp();
                    Outcome::Applied
                }
                None => Outcome::Ignored(Reason::UnknownCombatant),
            },
            _ => {
                let ids = selected;
                let names: Vec<String> = ids
                    .iter()
                    .filter_map(|id| self.combatant(*id))
                    .map(|c| self.display_name_of(c))
                    .collect();

                self.enqueue_prompt(
                    format!("Apply damage to {}:", names.join(", ")),
                    "damage",
                    None,
                    Box::new(move |encounter, response| {
                        if parse_int(response).is_none() {
                            return Outcome::Ignored(Reason::InvalidNumber);
                        }
                        let mut outcome = Outcome::Ignored(Reason::UnknownCombatant);
                        for id in &ids {
                            if let Some(mut vm) = encounter.view_model(*id) {
                                if vm.commit_damage(response).is_applied() {
                                    outcome = Outcome::Applied;
                                }
                            }
                        }
                        outcome
                    }),
                );
                Outcome::Applied
            }
        }
    }

    pub fn add_selected_temporary_hp(&mut self) -> Outcome {
        self.prompt_each_selected(|vm| {
            vm.add_temporary_hp();
        })
    }

    pub fn add_selected_tag(&mut self) -> Outcome {
        self.prompt_each_selected(|vm| {
            vm.add_tag_prompt();
        })
    }

    pub fn edit_selected_initiative(&mut self) -> Outcome {
        self.prompt_each_selected(|vm| {
            vm.edit_initiative();
        })
    }

    pub fn edit_selected_name(&mut self) -> Outcome {
        self.prompt_each_selected(|vm| {
            vm.edit_name();
        })
    }

    fn prompt_each_selected(
        &mut self,
        mut prompt: impl FnMut(&mut CombatantViewModel<'_>),
    ) -> Outcome {
        if self.selected.is_empty() {
            return Outcome::Ignored(Reason::NoSelection);
        }
        let selected = self.selected.clone();
        self.batch(|encounter| {
            for id in selected {
                if let Some(mut vm) = encounter.view_model(id) {
                    prompt(&mut vm);
                }
            }
        });
        Outcome::Applied
    }

    // ========================================================================
    // Prompts
    // ========================================================================

    pub(crate) fn enqueue_prompt(
        &mut self,
        content: String,
        input_selector: &str,
        default_value: Option<String>,
        callback: PromptCallback,
    ) -> PromptId {
        let id = self.prompts.push(content, input_selector, default_value, callback);
        tracing::debug!(prompt = %id, "prompt queued");
        self.changed();
        id
    }

    /// Answer a prompt, running its callback once.
    pub fn resolve_prompt(&mut self, id: PromptId, response: &str) -> Outcome {
        let Some(prompt) = self.prompts.take(id) else {
            return Outcome::Ignored(Reason::NoPrompt);
        };
        let outcome = self.batch(|encounter| {
            let outcome = (prompt.into_callback())(encounter, response);
            encounter.changed();
            outcome
        });
        tracing::debug!(prompt = %id, %outcome, "prompt resolved");
        outcome
    }

    /// Drop a prompt without running its callback.
    pub fn dismiss_prompt(&mut self, id: PromptId) -> Outcome {
        if self.prompts.take(id).is_none() {
            return Outcome::Ignored(Reason::NoPrompt);
        }
        self.changed();
        Outcome::Applied
    }

    // ========================================================================
    // Save / restore
    // ========================================================================

    /// Capture the encounter under `name`.
    pub fn save(&self, name: impl Into<String>) -> SavedEncounter {
        SavedEncounter {
            version: SAVE_VERSION,
            name: name.into(),
            creatures: self.combatants.iter().map(SavedCreature::from_combatant).collect(),
            selected_creatures: self
                .selected
                .iter()
                .filter_map(|id| self.index_of(*id))
                .collect(),
            active_creature: self.active.and_then(|id| self.index_of(id)),
            state: self.state,
            round: self.round,
        }
    }

    /// Append the saved combatants, in saved order, without re-sorting.
    ///
    /// Each entry is added like a new creature, then HP, temporary HP,
    /// initiative, alias, index label and tags are applied. Entries without
    /// an index label keep the freshly assigned one.
    pub fn add_saved_encounter(&mut self, saved: &SavedEncounter) -> Vec<CombatantId> {
        let mut ids = Vec::with_capacity(saved.creatures.len());

        for creature in &saved.creatures {
            let flags = AddFlags {
                hidden: creature.hidden,
            };
            let id = self.insert_creature(&creature.statblock, flags);

            if let Some(combatant) = self.combatant_mut(id) {
                combatant.set_current_hp(creature.current_hp);
                combatant.set_temporary_hp(creature.temporary_hp);
                combatant.initiative = creature.initiative;
                combatant.alias = creature.alias.clone();
                if let Some(label) = creature.index_label {
                    combatant.index_label = label;
                }
                combatant.tags = creature.tags.clone();
            }
            if let Some(label) = creature.index_label {
                if let Some(count) = self.name_counts.get_mut(&creature.statblock.name) {
                    count.last_label = count.last_label.max(label);
                }
            }
            ids.push(id);
        }

        tracing::debug!(name = %saved.name, restored = ids.len(), "added saved encounter");
        self.claim_turn_if_unset();
        self.changed();
        ids
    }

    /// Replace this encounter's contents with a saved encounter, including
    /// selection, active combatant, state and round.
    pub fn restore(&mut self, saved: &SavedEncounter) {
        self.batch(|encounter| encounter.restore_all(saved));
    }

    fn restore_all(&mut self, saved: &SavedEncounter) {
        self.clear();
        let ids = self.add_saved_encounter(saved);

        self.selected = saved
            .selected_creatures
            .iter()
            .filter_map(|index| ids.get(*index).copied())
            .collect();
        self.state = saved.state;
        match self.state {
            EncounterState::Active => {
                self.active = saved
                    .active_creature
                    .and_then(|index| ids.get(index).copied())
                    .or_else(|| ids.first().copied());
                self.round = saved.round.max(1);
            }
            EncounterState::Inactive => {
                self.active = None;
                self.round = 0;
            }
        }
        self.changed();
    }

    // ========================================================================
    // Notification
    // ========================================================================

    /// Record a narrative event and forward it to the log sink.
    pub(crate) fn log_event(&mut self, message: String) {
        tracing::info!(round = self.round, "{message}");
        if let Some(sink) = self.sink.as_mut() {
            sink.log(&message);
        }
        self.events.push(LogEntry {
            round: self.round,
            message,
        });
    }

    pub(crate) fn changed(&mut self) {
        if self.batching {
            self.dirty = true;
            return;
        }
        self.revision += 1;
        if self.listeners.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for listener in &mut self.listeners {
            listener(&snapshot);
        }
    }

    /// Run `op`, holding change notifications until it finishes so
    /// listeners see one snapshot of the finished state.
    pub(crate) fn batch<R>(&mut self, op: impl FnOnce(&mut Self) -> R) -> R {
        let outer = std::mem::replace(&mut self.batching, true);
        let result = op(self);
        self.batching = outer;
        if !outer && std::mem::take(&mut self.dirty) {
            self.changed();
        }
        result
    }
}
