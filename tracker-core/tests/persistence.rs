//! Save and restore of encounters, in memory and on disk.

use tempfile::TempDir;
use tracker_core::persist::save_path;
use tracker_core::testing::{goblin, hero, ScriptedRules};
use tracker_core::{AddFlags, Encounter, EncounterState, SavedEncounter, TrackerConfig};

fn scripted() -> Encounter {
    Encounter::with_rules(TrackerConfig::default(), ScriptedRules::new(&[]))
}

/// Two goblins (one hurt, hidden and tagged) and a player character, mid-combat.
fn skirmish() -> Encounter {
    let mut enc = scripted();
    let first = enc.add_creature(&goblin(), AddFlags::default());
    let second = enc.add_creature(&goblin(), AddFlags::hidden());
    enc.add_creature(&hero(), AddFlags::default());

    {
        let mut vm = enc.view_model(second).unwrap();
        vm.apply_damage("5");
        vm.apply_temporary_hp("3");
        vm.apply_initiative("17");
        vm.add_tag("poisoned");
        vm.set_alias("Sneaky");
    }
    enc.view_model(first).unwrap().apply_initiative("11");

    enc.start_encounter();
    enc.next_turn();
    enc.select(first);
    enc
}

#[test]
fn test_restore_round_trips_state() {
    let original = skirmish();
    let saved = original.save("Skirmish");

    let mut restored = scripted();
    restored.restore(&saved);

    assert_eq!(restored.len(), 3);
    assert_eq!(restored.state(), EncounterState::Active);
    assert_eq!(restored.round(), 1);

    let restored_order: Vec<String> = restored
        .combatants()
        .iter()
        .map(|c| restored.display_name_of(c))
        .collect();
    assert_eq!(restored_order, vec!["Sneaky", "Goblin 1", "Aria"]);

    let sneaky = &restored.combatants()[0];
    assert_eq!(sneaky.current_hp(), 2);
    assert_eq!(sneaky.temporary_hp(), 3);
    assert_eq!(sneaky.initiative(), Some(17));
    assert_eq!(sneaky.index_label(), 2);
    assert_eq!(sneaky.tags(), ["Poisoned".to_string()]);
    assert!(sneaky.is_hidden());

    assert_eq!(restored.active_combatant().map(|c| c.index_label()), Some(1));
    assert_eq!(restored.selected().len(), 1);
    assert_eq!(restored.combatant(restored.selected()[0]).unwrap().name(), "Goblin");
}

#[test]
fn test_add_saved_encounter_appends_in_saved_order() {
    let saved = skirmish().save("Skirmish");

    let mut enc = scripted();
    enc.add_creature(&goblin(), AddFlags::default());
    let added = enc.add_saved_encounter(&saved);

    assert_eq!(added.len(), 3);
    assert_eq!(enc.len(), 4);
    assert_eq!(enc.creature_count("Goblin"), 3);
    // appended in saved order, no re-sort and no turn state
    assert_eq!(enc.combatants()[1].id(), added[0]);
    assert_eq!(enc.state(), EncounterState::Inactive);

    // the saved labels were applied over fresh ones, which still count
    let next = enc.add_creature(&goblin(), AddFlags::default());
    assert_eq!(enc.combatant(next).unwrap().index_label(), 4);
}

#[test]
fn test_legacy_file_gets_fresh_labels() {
    let legacy = r#"{
        "Name": "Old",
        "Creatures": [
            {
                "Statblock": { "Name": "Goblin", "HP": { "Value": 7 } },
                "CurrentHP": 4, "TemporaryHP": 0, "Initiative": 9, "Alias": "", "Tags": []
            },
            {
                "Statblock": { "Name": "Goblin", "HP": { "Value": 7 } },
                "CurrentHP": 7, "TemporaryHP": 0, "Initiative": 3, "Alias": "", "Tags": []
            }
        ],
        "SelectedCreature": 0
    }"#;
    let saved = SavedEncounter::from_json(legacy).unwrap();

    let mut enc = scripted();
    enc.restore(&saved);
    let labels: Vec<u32> = enc.combatants().iter().map(|c| c.index_label()).collect();
    assert_eq!(labels, vec![1, 2]);
    assert_eq!(enc.combatants()[0].current_hp(), 4);
    assert_eq!(enc.selected(), [enc.combatants()[0].id()]);
}

#[tokio::test]
async fn test_save_and_load_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = save_path(temp_dir.path(), "Goblin Ambush");

    let saved = skirmish().save("Goblin Ambush");
    saved.save_json(&path).await.expect("save should succeed");

    let loaded = SavedEncounter::load_json(&path).await.expect("load should succeed");
    assert_eq!(loaded, saved);
}

#[tokio::test]
async fn test_load_missing_file_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let result = SavedEncounter::load_json(temp_dir.path().join("missing.json")).await;
    assert!(result.is_err());
}
