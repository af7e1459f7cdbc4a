//! Headless mode for the tracker.
//!
//! This module provides a simple text-based interface for running an
//! encounter from stdin. It's designed for scripted sessions and testing.

use std::io::{self, BufRead, Write};
use std::path::Path;
use tracker_core::tags::suggest;
use tracker_core::{
    AddFlags, CombatantId, CombatantViewModel, DiceExpression, Encounter, EncounterSnapshot,
    EncounterState, Outcome, Reason, SavedEncounter, StatBlock, TrackerConfig,
};

/// A parsed `#` command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add {
        stats: StatBlock,
        hidden: bool,
        /// Rolled for HP when the creature is added.
        hp_roll: Option<DiceExpression>,
    },
    Select(usize),
    Toggle(usize),
    SelectNext,
    SelectPrevious,
    MoveUp,
    MoveDown,
    Remove,
    Roll,
    Start,
    End,
    NextTurn,
    PreviousTurn,
    Damage,
    Temporary,
    Initiative,
    Alias,
    Tag,
    Untag(String),
    Hide,
    Suggest(String),
    Skip,
    Save(String),
    Load(String),
    Status,
    Log,
    Help,
    Quit,
}

/// Parse the text after `#`.
pub fn parse_command(input: &str) -> Result<Command, String> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    let rest = || parts[1..].join(" ");

    let command = match parts.first().copied() {
        Some("add") => parse_add(&parts[1..], false)?,
        Some("player") => parse_add(&parts[1..], true)?,
        Some("select") => Command::Select(parse_position(parts.get(1))?),
        Some("toggle") => Command::Toggle(parse_position(parts.get(1))?),
        Some("next") => Command::SelectNext,
        Some("prev") => Command::SelectPrevious,
        Some("up") => Command::MoveUp,
        Some("down") => Command::MoveDown,
        Some("remove") => Command::Remove,
        Some("roll") => Command::Roll,
        Some("start") => Command::Start,
        Some("end") => Command::End,
        Some("turn") => Command::NextTurn,
        Some("back") => Command::PreviousTurn,
        Some("damage") => Command::Damage,
        Some("temp") => Command::Temporary,
        Some("init") => Command::Initiative,
        Some("alias") => Command::Alias,
        Some("tag") => Command::Tag,
        Some("untag") if parts.len() > 1 => Command::Untag(rest()),
        Some("hide") => Command::Hide,
        Some("suggest") if parts.len() > 1 => Command::Suggest(rest()),
        Some("skip") => Command::Skip,
        Some("save") if parts.len() > 1 => Command::Save(rest()),
        Some("load") if parts.len() > 1 => Command::Load(rest()),
        Some("status") => Command::Status,
        Some("log") => Command::Log,
        Some("help") => Command::Help,
        Some("quit") | Some("exit") => Command::Quit,
        Some("untag") => return Err("Usage: #untag <text>".to_string()),
        Some("suggest") => return Err("Usage: #suggest <prefix>".to_string()),
        Some("save") => return Err("Usage: #save <path>".to_string()),
        Some("load") => return Err("Usage: #load <path>".to_string()),
        _ => return Err("Unknown command. Type #help for help.".to_string()),
    };
    Ok(command)
}

/// `<name> <hp> [ac] [initiative modifier] [hidden]`. Underscores in the
/// name become spaces. HP is a number or dice notation such as `2d6+1`.
fn parse_add(args: &[&str], player: bool) -> Result<Command, String> {
    let usage = || "Usage: #add <name> <hp|dice> [ac] [init-mod] [hidden]".to_string();
    let name = args.first().ok_or_else(usage)?.replace('_', " ");
    let hp_arg = args.get(1).ok_or_else(usage)?;
    let (hp, hp_roll) = match hp_arg.parse::<i32>() {
        Ok(hp) => (hp, None),
        Err(_) => {
            let expr = hp_arg
                .parse::<DiceExpression>()
                .map_err(|e| format!("{e}. {}", usage()))?;
            (0, Some(expr))
        }
    };

    let mut stats = StatBlock::new(name, hp);
    let mut hidden = false;
    let mut numbers = Vec::new();
    for arg in &args[2..] {
        if arg.eq_ignore_ascii_case("hidden") {
            hidden = true;
        } else {
            numbers.push(arg.trim_start_matches('+').parse::<i32>().map_err(|_| usage())?);
        }
    }
    if let Some(ac) = numbers.first() {
        stats = stats.with_ac(*ac);
    }
    if let Some(modifier) = numbers.get(1) {
        stats = stats.with_initiative_modifier(*modifier);
    }
    if player {
        stats = stats.player_character();
    }
    Ok(Command::Add {
        stats,
        hidden,
        hp_roll,
    })
}

fn parse_position(arg: Option<&&str>) -> Result<usize, String> {
    arg.and_then(|v| v.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| "Expected a position starting at 1".to_string())
}

/// Whether the loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// An encounter driven by text commands.
pub struct HeadlessTracker {
    encounter: Encounter,
}

impl HeadlessTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let mut encounter = Encounter::new(config);
        encounter.set_log_sink(|message: &str| println!("[LOG] {message}"));
        Self { encounter }
    }

    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    /// Handle one input line. Plain text answers the oldest pending prompt.
    pub async fn handle_line(&mut self, line: &str) -> Flow {
        if let Some(command) = line.strip_prefix('#') {
            match parse_command(command) {
                Ok(command) => return self.execute(command).await,
                Err(message) => println!("[ERROR] {message}"),
            }
            return Flow::Continue;
        }

        match self.encounter.prompts().front().map(|p| p.id) {
            Some(prompt) => {
                let outcome = self.encounter.resolve_prompt(prompt, line);
                report(outcome);
                self.print_prompt();
            }
            None => println!("[ERROR] No prompt is waiting. Type #help for help."),
        }
        Flow::Continue
    }

    pub async fn execute(&mut self, command: Command) -> Flow {
        let outcome = match command {
            Command::Add {
                mut stats,
                hidden,
                hp_roll,
            } => {
                if let Some(expr) = hp_roll {
                    let result = expr.roll();
                    println!("[ROLL] {} HP {expr}: {result}", stats.name);
                    stats.hp.value = result.total.max(1);
                    stats.hp.notes = format!("({expr})");
                }
                self.encounter.add_creature(&stats, AddFlags { hidden });
                Outcome::Applied
            }
            Command::Select(position) => match self.id_at(position) {
                Some(id) => self.encounter.select(id),
                None => return self.no_such_position(position),
            },
            Command::Toggle(position) => match self.id_at(position) {
                Some(id) => self.encounter.toggle_selection(id),
                None => return self.no_such_position(position),
            },
            Command::SelectNext => self.encounter.select_next(),
            Command::SelectPrevious => self.encounter.select_previous(),
            Command::MoveUp => self.encounter.move_selected_up(),
            Command::MoveDown => self.encounter.move_selected_down(),
            Command::Remove => self.encounter.remove_selected(),
            Command::Roll => self.encounter.roll_initiative(),
            Command::Start => self.encounter.start_encounter(),
            Command::End => self.encounter.end_encounter(),
            Command::NextTurn => self.encounter.next_turn(),
            Command::PreviousTurn => self.encounter.previous_turn(),
            Command::Damage => self.encounter.focus_selected_hp(),
            Command::Temporary => self.encounter.add_selected_temporary_hp(),
            Command::Initiative => self.encounter.edit_selected_initiative(),
            Command::Alias => self.encounter.edit_selected_name(),
            Command::Tag => self.encounter.add_selected_tag(),
            Command::Untag(text) => self.for_each_selected(|vm| vm.remove_tag(&text)),
            Command::Hide => self.for_each_selected(|vm| vm.toggle_hidden()),
            Command::Suggest(prefix) => {
                println!("[SUGGEST] {}", suggest(&prefix).join(", "));
                return Flow::Continue;
            }
            Command::Skip => match self.encounter.prompts().front().map(|p| p.id) {
                Some(prompt) => self.encounter.dismiss_prompt(prompt),
                None => Outcome::Ignored(Reason::NoPrompt),
            },
            Command::Save(path) => {
                let name = Path::new(&path)
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.clone());
                let saved = self.encounter.save(name);
                match saved.save_json(&path).await {
                    Ok(()) => println!("[SAVED] Encounter saved to {path}"),
                    Err(e) => println!("[ERROR] Save failed: {e}"),
                }
                return Flow::Continue;
            }
            Command::Load(path) => {
                match SavedEncounter::load_json(&path).await {
                    Ok(saved) => {
                        self.encounter.restore(&saved);
                        println!("[LOADED] {} from {path}", saved.name);
                        print_status(&self.encounter.snapshot());
                    }
                    Err(e) => println!("[ERROR] Load failed: {e}"),
                }
                return Flow::Continue;
            }
            Command::Status => {
                print_status(&self.encounter.snapshot());
                return Flow::Continue;
            }
            Command::Log => {
                for entry in self.encounter.recent_events(20) {
                    println!("  [round {}] {}", entry.round, entry.message);
                }
                return Flow::Continue;
            }
            Command::Help => {
                print_help();
                return Flow::Continue;
            }
            Command::Quit => {
                println!("Goodbye!");
                return Flow::Quit;
            }
        };

        report(outcome);
        self.print_prompt();
        Flow::Continue
    }

    fn id_at(&self, position: usize) -> Option<CombatantId> {
        self.encounter.combatants().get(position - 1).map(|c| c.id())
    }

    fn no_such_position(&self, position: usize) -> Flow {
        println!(
            "[ERROR] No combatant at position {position} (there are {})",
            self.encounter.len()
        );
        Flow::Continue
    }

    fn for_each_selected(
        &mut self,
        mut apply: impl FnMut(&mut CombatantViewModel<'_>) -> Outcome,
    ) -> Outcome {
        let selected = self.encounter.selected().to_vec();
        if selected.is_empty() {
            return Outcome::Ignored(Reason::NoSelection);
        }
        let mut outcome = Outcome::Ignored(Reason::Unchanged);
        for id in selected {
            if let Some(mut vm) = self.encounter.view_model(id) {
                if apply(&mut vm).is_applied() {
                    outcome = Outcome::Applied;
                }
            }
        }
        outcome
    }

    fn print_prompt(&self) {
        if let Some(prompt) = self.encounter.prompts().front() {
            match &prompt.default_value {
                Some(default) => println!(
                    "[PROMPT {}] {} (suggested: {default})",
                    prompt.id, prompt.content
                ),
                None => println!("[PROMPT {}] {}", prompt.id, prompt.content),
            }
            if prompt.input_selector == "tag" {
                println!("  (#suggest <prefix> lists conditions)");
            }
        }
    }
}

fn report(outcome: Outcome) {
    if let Outcome::Ignored(reason) = outcome {
        println!("[IGNORED] {reason}");
    }
}

fn print_status(snapshot: &EncounterSnapshot) {
    let state = match snapshot.state {
        EncounterState::Active => format!("round {}", snapshot.round),
        EncounterState::Inactive => "not started".to_string(),
    };
    println!("[STATUS] {} combatants, {state}", snapshot.combatants.len());

    for (position, c) in snapshot.combatants.iter().enumerate() {
        let marker = if c.is_active { '>' } else { ' ' };
        let selected = if c.is_selected { '*' } else { ' ' };
        let initiative = c.initiative.map_or_else(|| "-".to_string(), |i| i.to_string());
        let mut line = format!(
            "{marker}{selected}{:>2}. {:<20} init {:>3}  HP {:<10} AC {}",
            position + 1,
            c.display_name,
            initiative,
            c.display_hp,
            c.armor_class
        );
        if c.hidden {
            line.push_str("  [hidden]");
        }
        if c.is_player {
            line.push_str("  [player]");
        }
        if c.down {
            line.push_str("  [down]");
        }
        if !c.tags.is_empty() {
            line.push_str(&format!("  {}", c.tags.join(", ")));
        }
        println!("{line}");
    }
}

fn print_help() {
    println!("[HELP]");
    println!("  #add <name> <hp> [ac] [init] [hidden] - Add a creature (_ for spaces in names)");
    println!("                                           hp may be dice, e.g. 2d6+1");
    println!("  #player <name> <hp> [ac] [init]        - Add a player character");
    println!("  #select <n> / #toggle <n>              - Select one / add to selection");
    println!("  #next / #prev                          - Move the selection");
    println!("  #up / #down                            - Move the selected combatant in the order");
    println!("  #remove                                - Remove selected combatants");
    println!("  #roll                                  - Roll initiative");
    println!("  #start / #end                          - Start or end the encounter");
    println!("  #turn / #back                          - Next or previous turn");
    println!("  #damage #temp #init #alias #tag        - Prompt for the selected combatants");
    println!("  #untag <text>                          - Remove a tag from the selection");
    println!("  #hide                                  - Toggle hidden for the selection");
    println!("  #suggest <prefix>                      - List matching conditions");
    println!("  #skip                                  - Dismiss the current prompt");
    println!("  #save <path> / #load <path>            - Save or load the encounter");
    println!("  #status / #log                         - Show combatants / recent events");
    println!("  #quit                                  - Exit");
    println!("  (anything else answers the current prompt)");
}

/// Run the tracker in headless mode.
///
/// This provides a simple line-oriented protocol:
/// - Lines starting with `#` are commands
/// - Other lines answer the oldest pending prompt
pub async fn run_headless(config: TrackerConfig, load: Option<String>) -> anyhow::Result<()> {
    let mut tracker = HeadlessTracker::new(config);

    println!("=== Initiative Tracker ===");
    if let Some(path) = load {
        tracker.execute(Command::Load(path)).await;
    }
    println!("Type #help for commands.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if tracker.handle_line(line).await == Flow::Quit {
            break;
        }
        stdout.flush().ok();
    }

    tracing::debug!(revision = tracker.encounter().revision(), "headless session finished");
    Ok(())
}
