//! Tracker configuration.
//!
//! User-level settings live in a [`TrackerConfig`] owned by the encounter.
//! The binary reads them from the environment.

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Default maximum channel intensity for HP colors.
pub const DEFAULT_HP_COLOR_INTENSITY: u8 = 170;

pub const ENV_ALLOW_NEGATIVE_HP: &str = "TRACKER_ALLOW_NEGATIVE_HP";
pub const ENV_GROUP_SIMILAR: &str = "TRACKER_GROUP_SIMILAR";
pub const ENV_PROMPT_PLAYER_INITIATIVE: &str = "TRACKER_PROMPT_PLAYER_INITIATIVE";
pub const ENV_RNG_SEED: &str = "TRACKER_RNG_SEED";

/// Errors from reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// Settings for an encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Let damage push current HP below zero.
    pub allow_negative_hp: bool,

    /// Creatures sharing a name roll initiative once.
    pub group_similar_creatures: bool,

    /// Ask for player character initiative instead of rolling it.
    pub prompt_player_initiative: bool,

    /// Maximum red/green channel value used by HP colors.
    pub hp_color_intensity: u8,

    /// Fixed seed for initiative rolls.
    pub rng_seed: Option<u64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            allow_negative_hp: false,
            group_similar_creatures: false,
            prompt_player_initiative: true,
            hp_color_intensity: DEFAULT_HP_COLOR_INTENSITY,
            rng_seed: None,
        }
    }
}

impl TrackerConfig {
    /// Read overrides from the environment on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(allow) = read_env_bool(ENV_ALLOW_NEGATIVE_HP)? {
            config.allow_negative_hp = allow;
        }
        if let Some(group) = read_env_bool(ENV_GROUP_SIMILAR)? {
            config.group_similar_creatures = group;
        }
        if let Some(prompt) = read_env_bool(ENV_PROMPT_PLAYER_INITIATIVE)? {
            config.prompt_player_initiative = prompt;
        }
        if let Ok(raw) = env::var(ENV_RNG_SEED) {
            let seed = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_RNG_SEED.to_string(),
                value: raw.clone(),
            })?;
            config.rng_seed = Some(seed);
        }

        Ok(config)
    }

    pub fn with_allow_negative_hp(mut self, allow: bool) -> Self {
        self.allow_negative_hp = allow;
        self
    }

    pub fn with_group_similar_creatures(mut self, group: bool) -> Self {
        self.group_similar_creatures = group;
        self
    }

    pub fn with_prompt_player_initiative(mut self, prompt: bool) -> Self {
        self.prompt_player_initiative = prompt;
        self
    }

    pub fn with_hp_color_intensity(mut self, intensity: u8) -> Self {
        self.hp_color_intensity = intensity;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

fn read_env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(key) {
        Ok(raw) => parse_bool(&raw).map(Some).ok_or(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
        Err(_) => Ok(None),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert!(!config.allow_negative_hp);
        assert!(!config.group_similar_creatures);
        assert!(config.prompt_player_initiative);
        assert_eq!(config.hp_color_intensity, 170);
        assert_eq!(config.rng_seed, None);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TrackerConfig = serde_json::from_str(r#"{"allow_negative_hp": true}"#).unwrap();
        assert!(config.allow_negative_hp);
        assert_eq!(config.hp_color_intensity, DEFAULT_HP_COLOR_INTENSITY);
    }

    // Environment is process-global, so every env assertion lives in one test.
    #[test]
    fn test_from_env() {
        env::set_var(ENV_ALLOW_NEGATIVE_HP, "yes");
        env::set_var(ENV_RNG_SEED, "1234");
        let config = TrackerConfig::from_env().unwrap();
        assert!(config.allow_negative_hp);
        assert_eq!(config.rng_seed, Some(1234));

        env::set_var(ENV_GROUP_SIMILAR, "sometimes");
        assert_eq!(
            TrackerConfig::from_env(),
            Err(ConfigError::InvalidValue {
                key: ENV_GROUP_SIMILAR.to_string(),
                value: "sometimes".to_string(),
            })
        );

        env::remove_var(ENV_ALLOW_NEGATIVE_HP);
        env::remove_var(ENV_RNG_SEED);
        env::remove_var(ENV_GROUP_SIMILAR);
    }
}
