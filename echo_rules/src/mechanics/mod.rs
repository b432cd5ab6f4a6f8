//! Game mechanics: damage tags, affinities, and the skill book.

mod skills;

pub use skills::*;

use serde::{Deserialize, Serialize};

/// The kind of force an attack or skill carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageTag {
    /// Plain weapon or fist.
    Physical,
    /// Corrupted void energy.
    Void,
    /// Direct manipulation of System code.
    System,
    /// Attacks on memory and thought.
    Mental,
}

impl DamageTag {
    pub fn name(&self) -> &'static str {
        match self {
            DamageTag::Physical => "Physical",
            DamageTag::Void => "Void",
            DamageTag::System => "System",
            DamageTag::Mental => "Mental",
        }
    }
}

/// How a target reacts to a damage tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Affinity {
    /// Takes extra damage.
    Weak,
    Normal,
    /// Takes reduced damage.
    Resistant,
}

impl Affinity {
    /// Damage multiplier in percent, given the configured weakness and
    /// resistance percentages.
    pub fn multiplier(&self, weak_percent: u32, resist_percent: u32) -> u32 {
        match self {
            Affinity::Weak => weak_percent,
            Affinity::Normal => 100,
            Affinity::Resistant => resist_percent,
        }
    }
}

/// Apply a percentage to a damage value, never going below 1.
pub fn scale_damage(damage: i32, percent: u32) -> i32 {
    let scaled = (i64::from(damage) * i64::from(percent)) / 100;
    (scaled as i32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affinity_multipliers() {
        assert_eq!(Affinity::Weak.multiplier(150, 50), 150);
        assert_eq!(Affinity::Normal.multiplier(150, 50), 100);
        assert_eq!(Affinity::Resistant.multiplier(150, 50), 50);
    }

    #[test]
    fn test_scale_damage_floor() {
        assert_eq!(scale_damage(10, 150), 15);
        assert_eq!(scale_damage(1, 50), 1);
        assert_eq!(scale_damage(7, 200), 14);
    }
}
