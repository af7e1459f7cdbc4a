//! Initiative tracker for tabletop combat.
//!
//! Reads commands from stdin and prints the encounter as it changes.
//!
//! ```bash
//! cargo run -p tracker -- --load goblin_ambush.json
//! ```
//!
//! Settings come from the environment (or a `.env` file): see
//! `TRACKER_ALLOW_NEGATIVE_HP`, `TRACKER_GROUP_SIMILAR`,
//! `TRACKER_PROMPT_PLAYER_INITIATIVE` and `TRACKER_RNG_SEED`.
//! Diagnostics go to stderr, filtered by `RUST_LOG`.

mod headless;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracker_core::TrackerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tracker=info,tracker_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let mut config = TrackerConfig::from_env().context("invalid tracker configuration")?;
    let mut load = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--load" => {
                load = Some(args.get(i + 1).context("--load needs a path")?.clone());
                i += 1;
            }
            "--seed" => {
                let seed = args.get(i + 1).context("--seed needs a number")?;
                let seed = seed
                    .parse()
                    .with_context(|| format!("invalid seed {seed:?}"))?;
                config.rng_seed = Some(seed);
                i += 1;
            }
            "--negative-hp" => config.allow_negative_hp = true,
            "--group" => config.group_similar_creatures = true,
            other => anyhow::bail!("unknown argument {other:?}; try --help"),
        }
        i += 1;
    }

    tracing::info!(?config, "starting tracker");
    headless::run_headless(config, load).await
}

fn print_help() {
    println!("Initiative tracker");
    println!();
    println!("USAGE:");
    println!("  tracker [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help       Show this help message");
    println!("  --load <PATH>    Load a saved encounter");
    println!("  --seed <N>       Seed initiative rolls");
    println!("  --negative-hp    Let damage take HP below zero");
    println!("  --group          Roll initiative once per creature name");
    println!();
    println!("ENVIRONMENT:");
    println!("  TRACKER_ALLOW_NEGATIVE_HP, TRACKER_GROUP_SIMILAR,");
    println!("  TRACKER_PROMPT_PLAYER_INITIATIVE, TRACKER_RNG_SEED, RUST_LOG");
}
