//! House rules used when rolling initiative.
//!
//! The encounter asks a [`Rules`] implementation for suggested check values
//! and whether similar creatures share one initiative roll. Swap in a
//! different implementation to vary table rules, or a scripted one in tests.

use crate::config::TrackerConfig;
use crate::dice;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Pluggable initiative rules.
pub trait Rules {
    /// A suggested roll for a check with the given modifier.
    fn check(&mut self, modifier: i32) -> i32;

    /// Whether creatures sharing a name roll initiative once as a group.
    fn group_similar_creatures(&self) -> bool;
}

/// Standard rules: a check is `1d20 + modifier`.
#[derive(Debug, Clone)]
pub struct DefaultRules {
    rng: StdRng,
    group_similar_creatures: bool,
}

impl DefaultRules {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            group_similar_creatures: false,
        }
    }

    /// Seed the RNG so rolls repeat across runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            group_similar_creatures: false,
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        let rules = match config.rng_seed {
            Some(seed) => Self::seeded(seed),
            None => Self::new(),
        };
        rules.with_group_similar_creatures(config.group_similar_creatures)
    }

    pub fn with_group_similar_creatures(mut self, group: bool) -> Self {
        self.group_similar_creatures = group;
        self
    }
}

impl Default for DefaultRules {
    fn default() -> Self {
        Self::new()
    }
}

impl Rules for DefaultRules {
    fn check(&mut self, modifier: i32) -> i32 {
        dice::d20_check(modifier, &mut self.rng)
    }

    fn group_similar_creatures(&self) -> bool {
        self.group_similar_creatures
    }
}
