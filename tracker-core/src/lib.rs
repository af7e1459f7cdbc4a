//! Initiative tracker engine for tabletop combat.
//!
//! This crate provides:
//! - An encounter holding combatants in initiative order, with turn and round tracking
//! - Per-combatant view models for hit points, temporary HP, aliases and condition tags
//! - Queued prompts for anything that needs user input
//! - Saved encounter persistence, including older file versions
//!
//! # Quick Start
//!
//! ```
//! use tracker_core::{AddFlags, Encounter, StatBlock, TrackerConfig};
//!
//! let mut encounter = Encounter::new(TrackerConfig::default());
//! let goblin = StatBlock::new("Goblin", 7).with_ac(15);
//! let first = encounter.add_creature(&goblin, AddFlags::default());
//! encounter.add_creature(&goblin, AddFlags::hidden());
//!
//! encounter.roll_initiative();
//! encounter.start_encounter();
//!
//! let mut vm = encounter.view_model(first).unwrap();
//! vm.apply_damage("4");
//! assert_eq!(vm.display_hp(), "3/7");
//! ```

pub mod combatant;
pub mod config;
pub mod dice;
pub mod encounter;
pub mod input;
pub mod log;
pub mod outcome;
pub mod persist;
pub mod prompt;
pub mod rules;
pub mod snapshot;
pub mod stat_block;
pub mod tags;
pub mod testing;
pub mod view_model;

// Primary public API
pub use combatant::{Combatant, CombatantId, CombatantKind};
pub use config::{ConfigError, TrackerConfig};
pub use dice::{DiceError, DiceExpression, RollResult};
pub use encounter::{AddFlags, Encounter, EncounterState};
pub use log::{LogEntry, LogSink};
pub use outcome::{Outcome, Reason};
pub use persist::{PersistError, SavedCreature, SavedEncounter};
pub use prompt::{PromptId, PromptView};
pub use rules::{DefaultRules, Rules};
pub use snapshot::{CombatantSnapshot, EncounterSnapshot};
pub use stat_block::{StatBlock, TrackerStats};
pub use view_model::{CombatantViewModel, HpColor};
