use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_STARTING_HP: i32 = 1000;
pub const DEFAULT_ACCURACY: u8 = 50;
pub const DEFAULT_CRITIC: u8 = 10;
pub const DEFAULT_DEFENSE: i32 = 0;

/// Tunables for a battle. Missing weapon/armor stats fall back to the defaults here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct BattleRules {
    pub starting_hp: i32,
    pub default_accuracy: u8,
    pub default_critic: u8,
    pub default_defense: i32,
}

impl Default for BattleRules {
    fn default() -> Self {
        Self {
            starting_hp: DEFAULT_STARTING_HP,
            default_accuracy: DEFAULT_ACCURACY,
            default_critic: DEFAULT_CRITIC,
            default_defense: DEFAULT_DEFENSE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("starting_hp must be positive, got {0}")]
    StartingHp(i32),

    #[error("{field} must be within 0..=100, got {value}")]
    Chance { field: &'static str, value: u8 },

    #[error("default_defense must not be negative, got {0}")]
    Defense(i32),
}

impl BattleRules {
    pub fn validate(&self) -> std::result::Result<(), RulesError> {
        if self.starting_hp <= 0 {
            return Err(RulesError::StartingHp(self.starting_hp));
        }
        for (field, value) in [
            ("default_accuracy", self.default_accuracy),
            ("default_critic", self.default_critic),
        ] {
            if value > 100 {
                return Err(RulesError::Chance { field, value });
            }
        }
        if self.default_defense < 0 {
            return Err(RulesError::Defense(self.default_defense));
        }
        Ok(())
    }

    /// Parses YAML (and therefore JSON too) and validates the result.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let rules: BattleRules = serde_yaml::from_str(text).context("failed to parse battle rules")?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read battle rules: {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("invalid battle rules: {}", path.display()))
    }
}
