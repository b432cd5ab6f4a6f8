//! World counters - the state of the ruins outside the player.

use echo_rules::GameRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::lore::LoreId;

pub const STARTING_AREA: &str = "The Forgotten Ruins";
pub const STARTING_STABILITY: i32 = 50;

/// Everything the session tracks about the world itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldState {
    pub area: String,
    /// Fights started, by exploration, rest or explicit request.
    pub encounters: u32,
    pub anomalies: u32,
    pub secrets_found: u32,
    /// Falls with every anomaly; never below zero.
    pub reality_stability: i32,
    pub seen_lore: BTreeSet<LoreId>,
    /// Highest corruption reached; threshold glitches fire once below it.
    pub corruption_peak: i32,
    pub glitch_count: u32,
}

impl Default for WorldState {
    fn default() -> Self {
        Self {
            area: STARTING_AREA.to_string(),
            encounters: 0,
            anomalies: 0,
            secrets_found: 0,
            reality_stability: STARTING_STABILITY,
            seen_lore: BTreeSet::new(),
            corruption_peak: 0,
            glitch_count: 0,
        }
    }
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reality slips by 1-5. Returns the amount lost.
    pub fn destabilize(&mut self, rng: &mut GameRng) -> i32 {
        let before = self.reality_stability;
        self.anomalies += 1;
        self.reality_stability = (before - rng.range(1, 5)).max(0);
        before - self.reality_stability
    }

    /// Remember a fragment. Returns true if it was new.
    pub fn mark_seen(&mut self, fragment: LoreId) -> bool {
        self.seen_lore.insert(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destabilize_never_goes_negative() {
        let mut world = WorldState::new();
        let mut rng = GameRng::new(5);
        let mut lost = 0;
        for _ in 0..60 {
            let step = world.destabilize(&mut rng);
            assert!((0..=5).contains(&step));
            lost += step;
        }
        assert_eq!(world.reality_stability, 0);
        assert_eq!(lost, STARTING_STABILITY);
        assert_eq!(world.anomalies, 60);
    }

    #[test]
    fn test_mark_seen_reports_first_sighting() {
        let mut world = WorldState::new();
        assert!(world.mark_seen(LoreId::TheFall));
        assert!(!world.mark_seen(LoreId::TheFall));
    }
}
