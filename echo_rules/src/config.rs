//! Tuning constants for the rule book.
//!
//! Defaults are the shipped balance. A TOML document can override any subset
//! of fields; missing fields keep their defaults.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

/// Stat growth limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Soft cap at level 0; the effective cap is `base + level * per_level`.
    pub soft_cap_base: i32,
    pub soft_cap_per_level: i32,
    /// XP required for the first level-up.
    pub first_level_xp: u32,
    /// Multiplier applied to the XP threshold after each level-up.
    pub xp_growth: f64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            soft_cap_base: 12,
            soft_cap_per_level: 3,
            first_level_xp: 100,
            xp_growth: 1.5,
        }
    }
}

/// Combat formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Attack variance band added to `STR - defense`.
    pub attack_variance_min: i32,
    pub attack_variance_max: i32,
    /// Critical chance in percent: `crit_base + LUCK * crit_per_luck`, capped.
    pub crit_base: f64,
    pub crit_per_luck: f64,
    pub crit_cap: f64,
    /// Damage multiplier on a critical hit, in percent.
    pub crit_multiplier: u32,
    /// Multiplier against an analyzed weakness, in percent.
    pub weakness_multiplier: u32,
    /// Multiplier against a resisted damage tag, in percent.
    pub resistance_multiplier: u32,
    /// Flee chance: `flee_base + (player AGI - enemy AGI) * flee_per_agility`.
    pub flee_base: f64,
    pub flee_per_agility: f64,
    pub flee_min: f64,
    pub flee_max: f64,
    /// Enemy attack variance band.
    pub enemy_variance_min: i32,
    pub enemy_variance_max: i32,
    /// Chance (percent) that a combat opens with an unstable-parameters roll.
    pub unstable_start_chance: u32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            attack_variance_min: -1,
            attack_variance_max: 2,
            crit_base: 5.0,
            crit_per_luck: 0.5,
            crit_cap: 50.0,
            crit_multiplier: 200,
            weakness_multiplier: 150,
            resistance_multiplier: 50,
            flee_base: 0.5,
            flee_per_agility: 0.02,
            flee_min: 0.05,
            flee_max: 0.95,
            enemy_variance_min: -2,
            enemy_variance_max: 4,
            unstable_start_chance: 15,
        }
    }
}

/// Glitch layer trigger rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlitchConfig {
    /// Percent chance per exploration action.
    pub exploration_chance: u32,
    /// Percent chance after a combat victory.
    pub victory_chance: u32,
    /// Percent chance per combat round once `combat_turn_threshold` is passed.
    pub combat_turn_chance: u32,
    pub combat_turn_threshold: u32,
    /// Corruption values that always fire a glitch when crossed upwards.
    pub corruption_thresholds: Vec<i32>,
    /// Integrity lost on every non-cosmetic glitch.
    pub integrity_decay: i32,
    /// Base chance (percent) that a system message is glitched.
    pub message_glitch_base: u32,
}

impl Default for GlitchConfig {
    fn default() -> Self {
        Self {
            exploration_chance: 10,
            victory_chance: 10,
            combat_turn_chance: 10,
            combat_turn_threshold: 3,
            corruption_thresholds: vec![25, 50, 75],
            integrity_decay: 1,
            message_glitch_base: 15,
        }
    }
}

/// Starting values for a new game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartConfig {
    pub max_hp: i32,
    pub max_mp: i32,
    pub strength: i32,
    pub agility: i32,
    pub intelligence: i32,
    pub luck: i32,
    pub system_integrity: i32,
}

impl Default for StartConfig {
    fn default() -> Self {
        Self {
            max_hp: 100,
            max_mp: 50,
            strength: 10,
            agility: 10,
            intelligence: 10,
            luck: 5,
            system_integrity: 12,
        }
    }
}

/// The complete set of tuning constants.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub start: StartConfig,
    pub growth: GrowthConfig,
    pub combat: CombatConfig,
    pub glitch: GlitchConfig,
}

impl GameConfig {
    /// Parse a configuration from a TOML document.
    pub fn from_toml_str(source: &str) -> GameResult<Self> {
        toml::from_str(source).map_err(|e| GameError::Config(e.to_string()))
    }

    /// Render this configuration as TOML.
    pub fn to_toml_string(&self) -> GameResult<String> {
        toml::to_string(self).map_err(|e| GameError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override() {
        let config = GameConfig::from_toml_str(
            r#"
            [combat]
            flee_base = 0.4

            [glitch]
            exploration_chance = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.combat.flee_base, 0.4);
        assert_eq!(config.combat.flee_min, 0.05);
        assert_eq!(config.glitch.exploration_chance, 0);
        assert_eq!(config.start, StartConfig::default());
    }

    #[test]
    fn test_round_trip() {
        let config = GameConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(GameConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_bad_document() {
        let err = GameConfig::from_toml_str("[combat]\nflee_base = \"fast\"").unwrap_err();
        assert!(matches!(err, GameError::Config(_)));
    }
}
