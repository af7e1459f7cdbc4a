//! Saved encounter persistence.
//!
//! Encounters serialize to PascalCase JSON so files written by older
//! versions of the tracker stay loadable. Version 1 files lack index
//! labels, hidden flags and turn state, and store a single
//! `SelectedCreature`; they are upgraded on load.

use crate::combatant::Combatant;
use crate::encounter::EncounterState;
use crate::stat_block::StatBlock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
pub const SAVE_VERSION: u32 = 2;

/// Oldest version that can still be loaded.
const LEGACY_VERSION: u32 = 1;

/// One saved combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCreature {
    #[serde(rename = "Statblock")]
    pub statblock: StatBlock,

    #[serde(rename = "CurrentHP")]
    pub current_hp: i32,

    #[serde(rename = "TemporaryHP", default)]
    pub temporary_hp: i32,

    #[serde(rename = "Initiative", default)]
    pub initiative: Option<i32>,

    #[serde(rename = "Alias", default)]
    pub alias: String,

    /// Missing in version 1 files; a fresh label is assigned on load.
    #[serde(rename = "IndexLabel", default, skip_serializing_if = "Option::is_none")]
    pub index_label: Option<u32>,

    #[serde(rename = "Tags", default)]
    pub tags: Vec<String>,

    #[serde(rename = "Hidden", default)]
    pub hidden: bool,
}

impl SavedCreature {
    pub fn from_combatant(combatant: &Combatant) -> Self {
        Self {
            statblock: combatant.stat_block().clone(),
            current_hp: combatant.current_hp(),
            temporary_hp: combatant.temporary_hp(),
            initiative: combatant.initiative(),
            alias: combatant.alias().to_string(),
            index_label: Some(combatant.index_label()),
            tags: combatant.tags().to_vec(),
            hidden: combatant.is_hidden(),
        }
    }
}

/// A saved encounter with everything needed to resume it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", from = "RawSavedEncounter")]
pub struct SavedEncounter {
    /// Save format version for compatibility checking.
    pub version: u32,

    pub name: String,

    /// Combatants in turn order.
    pub creatures: Vec<SavedCreature>,

    /// Indices into `creatures`.
    pub selected_creatures: Vec<usize>,

    /// Index into `creatures` of the combatant whose turn it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_creature: Option<usize>,

    pub state: EncounterState,

    pub round: u32,
}

/// Wire shape accepted on load, covering both schema versions.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawSavedEncounter {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    creatures: Vec<SavedCreature>,
    #[serde(default)]
    selected_creatures: Option<Vec<usize>>,
    #[serde(default)]
    selected_creature: Option<serde_json::Value>,
    #[serde(default)]
    active_creature: Option<usize>,
    #[serde(default)]
    state: EncounterState,
    #[serde(default)]
    round: u32,
}

impl From<RawSavedEncounter> for SavedEncounter {
    fn from(raw: RawSavedEncounter) -> Self {
        let count = raw.creatures.len();
        let selected_creatures = match raw.selected_creatures {
            Some(indices) => indices,
            // Version 1 stored a single index, sometimes null.
            None => raw
                .selected_creature
                .as_ref()
                .and_then(serde_json::Value::as_u64)
                .map(|index| vec![index as usize])
                .unwrap_or_default(),
        };

        Self {
            version: raw.version.unwrap_or(LEGACY_VERSION),
            name: raw.name,
            creatures: raw.creatures,
            selected_creatures: selected_creatures.into_iter().filter(|i| *i < count).collect(),
            active_creature: raw.active_creature.filter(|i| *i < count),
            state: raw.state,
            round: raw.round,
        }
    }
}

impl SavedEncounter {
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a saved encounter, upgrading older versions.
    pub fn from_json(content: &str) -> Result<Self, PersistError> {
        let mut saved: Self = serde_json::from_str(content)?;

        if saved.version > SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }
        if saved.version < SAVE_VERSION {
            tracing::warn!(
                name = %saved.name,
                found = saved.version,
                current = SAVE_VERSION,
                "upgrading saved encounter"
            );
            saved.version = SAVE_VERSION;
        }

        Ok(saved)
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = self.to_json()?;
        fs::write(path.as_ref(), content).await?;
        tracing::info!(path = %path.as_ref().display(), name = %self.name, "saved encounter");
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path.as_ref()).await?;
        let saved = Self::from_json(&content)?;
        tracing::info!(
            path = %path.as_ref().display(),
            name = %saved.name,
            creatures = saved.creatures.len(),
            "loaded encounter"
        );
        Ok(saved)
    }
}

/// File name for an encounter saved under `name`.
pub fn save_path(base_dir: impl AsRef<Path>, name: &str) -> PathBuf {
    let sanitized = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();
    base_dir.as_ref().join(format!("{sanitized}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY: &str = r#"{
        "Name": "Goblin Ambush",
        "Creatures": [
            {
                "Statblock": { "Name": "Goblin", "HP": { "Value": 7 }, "AC": { "Value": 15 } },
                "CurrentHP": 3,
                "TemporaryHP": 0,
                "Initiative": 14,
                "Alias": "",
                "Tags": ["Prone"]
            },
            {
                "Statblock": { "Name": "Goblin", "HP": { "Value": 7 } },
                "CurrentHP": 7,
                "TemporaryHP": 2,
                "Initiative": null,
                "Alias": "Boss",
                "Tags": []
            }
        ],
        "SelectedCreature": 1
    }"#;

    #[test]
    fn test_legacy_file_is_upgraded() {
        let saved = SavedEncounter::from_json(LEGACY).unwrap();
        assert_eq!(saved.version, SAVE_VERSION);
        assert_eq!(saved.name, "Goblin Ambush");
        assert_eq!(saved.selected_creatures, vec![1]);
        assert_eq!(saved.state, EncounterState::Inactive);
        assert_eq!(saved.round, 0);

        let first = &saved.creatures[0];
        assert_eq!(first.index_label, None);
        assert!(!first.hidden);
        assert_eq!(first.initiative, Some(14));
        assert_eq!(saved.creatures[1].initiative, None);
    }

    #[test]
    fn test_future_version_is_rejected() {
        let json = r#"{ "Version": 9, "Name": "x", "Creatures": [] }"#;
        let err = SavedEncounter::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: 9
            }
        ));
    }

    #[test]
    fn test_out_of_range_indices_are_dropped() {
        let json = r#"{
            "Version": 2,
            "Name": "x",
            "Creatures": [],
            "SelectedCreatures": [0, 3],
            "ActiveCreature": 0
        }"#;
        let saved = SavedEncounter::from_json(json).unwrap();
        assert!(saved.selected_creatures.is_empty());
        assert_eq!(saved.active_creature, None);
    }

    #[test]
    fn test_canonical_field_names() {
        let saved = SavedEncounter::from_json(LEGACY).unwrap();
        let json = saved.to_json().unwrap();
        let keys = [
            "\"Version\"",
            "\"SelectedCreatures\"",
            "\"CurrentHP\"",
            "\"TemporaryHP\"",
            "\"Statblock\"",
            "\"State\": \"inactive\"",
        ];
        for key in keys {
            assert!(json.contains(key), "missing {key} in {json}");
        }
        assert!(!json.contains("SelectedCreature\""));
    }

    #[test]
    fn test_save_path_is_sanitized() {
        let path = save_path("/tmp/saves", "Goblin Ambush: Part 2");
        assert_eq!(path, PathBuf::from("/tmp/saves/Goblin_Ambush__Part_2.json"));
    }
}
