//! The player state and its stat rules.
//!
//! Every numeric change is clamped silently. Out-of-range deltas are never an
//! error: the System is unreliable and the rules absorb whatever it throws.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{ActionTally, GrowthAction, Inventory, Item, Stat, StatBlock, StoryFlag};
use crate::config::{GameConfig, GrowthConfig};
use crate::error::{GameError, GameResult, Resource};
use crate::mechanics::SkillId;
use crate::rng::GameRng;

/// Corruption at or above which LUCK becomes visible.
pub const LUCK_REVEAL_CORRUPTION: i32 = 50;

/// A corruption change, reported so callers can detect threshold crossings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorruptionChange {
    pub before: i32,
    pub after: i32,
}

impl CorruptionChange {
    pub fn delta(&self) -> i32 {
        self.after - self.before
    }

    /// Thresholds crossed upwards by this change, in ascending order.
    pub fn crossed<'a>(&self, thresholds: &'a [i32]) -> impl Iterator<Item = i32> + 'a {
        let (before, after) = (self.before, self.after);
        thresholds
            .iter()
            .copied()
            .filter(move |t| before < *t && after >= *t)
    }
}

/// Stat gains from one level-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    pub level: u32,
    pub max_hp: i32,
    pub max_mp: i32,
    pub strength: i32,
    pub agility: i32,
    pub intelligence: i32,
    pub luck: i32,
}

/// Everything the session knows about the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub name: String,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,

    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub stats: StatBlock,

    /// 0-100.
    pub corruption: i32,
    /// 0-100; starts low and only ever decays.
    pub system_integrity: i32,
    pub system_errors: u32,

    pub inventory: Inventory,
    pub skills: BTreeSet<SkillId>,
    pub flags: BTreeSet<StoryFlag>,
    pub tally: ActionTally,
    pub explorations: u32,
}

impl PlayerState {
    /// A fresh player using the configured starting values.
    pub fn new(name: impl Into<String>, config: &GameConfig) -> Self {
        let start = &config.start;
        let mut flags = BTreeSet::new();
        flags.insert(StoryFlag::Awakened);

        Self {
            name: name.into(),
            level: 1,
            xp: 0,
            xp_to_next: config.growth.first_level_xp,
            hp: start.max_hp,
            max_hp: start.max_hp,
            mp: start.max_mp,
            max_mp: start.max_mp,
            stats: StatBlock {
                strength: start.strength,
                agility: start.agility,
                intelligence: start.intelligence,
                luck: start.luck,
            },
            corruption: 0,
            system_integrity: start.system_integrity.clamp(0, 100),
            system_errors: 0,
            inventory: Inventory::default(),
            skills: BTreeSet::from([SkillId::BasicAttack]),
            flags,
            tally: ActionTally::default(),
            explorations: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// The cap above which action growth stops for the current level.
    pub fn soft_cap(&self, growth: &GrowthConfig) -> i32 {
        growth.soft_cap_base + self.level as i32 * growth.soft_cap_per_level
    }

    /// Train the stat tied to `action` by one point, unless it already sits
    /// at or above the soft cap. Returns the stat that grew.
    pub fn apply_action_growth(&mut self, action: GrowthAction, growth: &GrowthConfig) -> Option<Stat> {
        let stat = action.trained_stat();
        if self.stats.get(stat) >= self.soft_cap(growth) {
            return None;
        }
        self.stats.shift(stat, 1);
        Some(stat)
    }

    /// Remove HP, clamping at zero. Returns HP actually lost.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = self.hp.saturating_sub(amount.max(0)).clamp(0, self.max_hp);
        before - self.hp
    }

    /// Player defense against incoming blows.
    pub fn defense(&self) -> i32 {
        self.stats.agility / 5
    }

    /// Apply an incoming blow after defense. A blow always lands for at least 1.
    pub fn take_hit(&mut self, raw: i32) -> i32 {
        let damage = raw.saturating_sub(self.defense()).max(1);
        self.apply_damage(damage)
    }

    /// Restore HP up to max. Returns HP actually gained.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount.max(0)).clamp(0, self.max_hp);
        self.hp - before
    }

    pub fn restore_mp(&mut self, amount: i32) -> i32 {
        let before = self.mp;
        self.mp = self.mp.saturating_add(amount.max(0)).clamp(0, self.max_mp);
        self.mp - before
    }

    /// Pay an MP cost, or fail without touching MP.
    pub fn spend_mp(&mut self, cost: i32) -> GameResult<()> {
        if self.mp < cost {
            return Err(GameError::InsufficientResource {
                resource: Resource::Mp,
                required: cost,
                available: self.mp,
            });
        }
        self.mp -= cost.max(0);
        Ok(())
    }

    /// Drain MP without failing; clamps at zero. Returns MP lost.
    pub fn drain_mp(&mut self, amount: i32) -> i32 {
        let before = self.mp;
        self.mp = self.mp.saturating_sub(amount.max(0)).clamp(0, self.max_mp);
        before - self.mp
    }

    pub fn modify_corruption(&mut self, delta: i32) -> CorruptionChange {
        let before = self.corruption;
        self.corruption = self.corruption.saturating_add(delta).clamp(0, 100);
        CorruptionChange {
            before,
            after: self.corruption,
        }
    }

    /// Integrity can only fall during a session: positive deltas clamp to no
    /// change. Returns the new value.
    pub fn modify_integrity(&mut self, delta: i32) -> i32 {
        self.system_integrity = self
            .system_integrity
            .saturating_add(delta.min(0))
            .clamp(0, 100);
        self.system_integrity
    }

    /// Count a system error. Each one seeps 1-5 corruption.
    pub fn register_system_error(&mut self, rng: &mut GameRng) -> CorruptionChange {
        self.system_errors += 1;
        let seep = rng.range(1, 5);
        self.modify_corruption(seep)
    }

    /// Add experience and resolve every level-up it pays for.
    pub fn add_xp(&mut self, amount: u32, growth: &GrowthConfig, rng: &mut GameRng) -> Vec<LevelUp> {
        self.xp = self.xp.saturating_add(amount);
        let mut level_ups = Vec::new();
        while self.xp >= self.xp_to_next && self.xp_to_next > 0 {
            self.xp -= self.xp_to_next;
            level_ups.push(self.level_up(rng));
            self.xp_to_next = ((self.xp_to_next as f64) * growth.xp_growth).round() as u32;
        }
        level_ups
    }

    fn level_up(&mut self, rng: &mut GameRng) -> LevelUp {
        self.level += 1;
        let gains = LevelUp {
            level: self.level,
            max_hp: rng.range(8, 15),
            max_mp: rng.range(3, 8),
            strength: rng.range(1, 3),
            agility: rng.range(1, 3),
            intelligence: rng.range(1, 3),
            luck: rng.range(0, 2),
        };

        self.max_hp += gains.max_hp;
        self.max_mp += gains.max_mp;
        self.stats.shift(Stat::Strength, gains.strength);
        self.stats.shift(Stat::Agility, gains.agility);
        self.stats.shift(Stat::Intelligence, gains.intelligence);
        self.stats.shift(Stat::Luck, gains.luck);

        self.hp = self.max_hp;
        self.mp = self.max_mp;
        gains
    }

    /// Recover a third of max HP and half of max MP.
    pub fn rest(&mut self) -> (i32, i32) {
        let hp = self.heal(self.max_hp / 3);
        let mp = self.restore_mp(self.max_mp / 2);
        (hp, mp)
    }

    pub fn has_flag(&self, flag: StoryFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Set a flag; returns true if it was newly set.
    pub fn set_flag(&mut self, flag: StoryFlag) -> bool {
        self.flags.insert(flag)
    }

    /// Learn a skill; returns true if it was new.
    pub fn learn_skill(&mut self, skill: SkillId) -> bool {
        self.skills.insert(skill)
    }

    pub fn knows_skill(&self, skill: SkillId) -> bool {
        self.skills.contains(&skill)
    }

    pub fn has_core_fragment(&self) -> bool {
        self.inventory.has(Item::CoreFragment)
    }

    pub fn memory_shards(&self) -> u32 {
        self.inventory.count(Item::MemoryShard)
    }

    pub fn luck_visible(&self) -> bool {
        self.corruption >= LUCK_REVEAL_CORRUPTION || self.has_flag(StoryFlag::DiscoveredLuck)
    }

    /// Check every numeric invariant. Used by tests and debug assertions.
    pub fn check_invariants(&self) -> Result<(), String> {
        if !(0..=self.max_hp).contains(&self.hp) {
            return Err(format!("hp {} outside [0, {}]", self.hp, self.max_hp));
        }
        if !(0..=self.max_mp).contains(&self.mp) {
            return Err(format!("mp {} outside [0, {}]", self.mp, self.max_mp));
        }
        if !(0..=100).contains(&self.corruption) {
            return Err(format!("corruption {} outside [0, 100]", self.corruption));
        }
        if !(0..=100).contains(&self.system_integrity) {
            return Err(format!("integrity {} outside [0, 100]", self.system_integrity));
        }
        if self.level == 0 {
            return Err("level 0".to_string());
        }
        Ok(())
    }

    /// Read-only view for presentation layers.
    pub fn status(&self) -> PlayerStatus {
        PlayerStatus {
            name: self.name.clone(),
            level: self.level,
            xp: self.xp,
            xp_to_next: self.xp_to_next,
            hp: self.hp,
            max_hp: self.max_hp,
            mp: self.mp,
            max_mp: self.max_mp,
            strength: self.stats.strength,
            agility: self.stats.agility,
            intelligence: self.stats.intelligence,
            luck: self.luck_visible().then_some(self.stats.luck),
            corruption: self.corruption,
            system_integrity: self.system_integrity,
            system_errors: self.system_errors,
            inventory: self.inventory.iter().collect(),
            skills: self.skills.iter().copied().collect(),
            flags: self.flags.iter().copied().collect(),
            explorations: self.explorations,
        }
    }
}

/// Snapshot of the player as the front ends see it. LUCK is `None` while
/// the stat is still hidden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatus {
    pub name: String,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub strength: i32,
    pub agility: i32,
    pub intelligence: i32,
    pub luck: Option<i32>,
    pub corruption: i32,
    pub system_integrity: i32,
    pub system_errors: u32,
    pub inventory: Vec<(Item, u32)>,
    pub skills: Vec<SkillId>,
    pub flags: Vec<StoryFlag>,
    pub explorations: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn player() -> PlayerState {
        PlayerState::new("Unknown", &GameConfig::default())
    }

    #[test]
    fn test_new_player() {
        let p = player();
        assert_eq!(p.level, 1);
        assert_eq!(p.hp, 100);
        assert_eq!(p.system_integrity, 12);
        assert!(p.has_flag(StoryFlag::Awakened));
        assert!(p.knows_skill(SkillId::BasicAttack));
        assert!(p.check_invariants().is_ok());
    }

    #[test]
    fn test_extreme_amounts_clamp() {
        let mut p = player();
        p.apply_damage(30);
        p.drain_mp(10);
        assert_eq!(p.heal(i32::MAX), 30);
        assert_eq!(p.hp, p.max_hp);
        assert_eq!(p.restore_mp(i32::MAX), 10);
        assert_eq!(p.mp, p.max_mp);
        assert_eq!(p.take_hit(i32::MIN), 1);
        assert_eq!(p.apply_damage(i32::MAX), p.max_hp - 1);
        assert_eq!(p.hp, 0);
        assert_eq!(p.drain_mp(i32::MAX), p.max_mp);
        assert_eq!(p.mp, 0);
    }

    #[test]
    fn test_growth_stops_at_soft_cap() {
        let growth = GrowthConfig::default();
        let mut p = player();
        // Level 1 cap is 12 + 3 = 15.
        for _ in 0..5 {
            assert_eq!(p.apply_action_growth(GrowthAction::Attack, &growth), Some(Stat::Strength));
        }
        assert_eq!(p.stats.strength, 15);
        assert_eq!(p.apply_action_growth(GrowthAction::Attack, &growth), None);
        assert_eq!(p.stats.strength, 15);

        p.level = 2;
        assert_eq!(p.apply_action_growth(GrowthAction::Attack, &growth), Some(Stat::Strength));
    }

    #[test]
    fn test_growth_touches_one_stat() {
        let growth = GrowthConfig::default();
        let mut p = player();
        let before = p.stats.clone();
        p.apply_action_growth(GrowthAction::Flee, &growth);
        assert_eq!(p.stats.agility, before.agility + 1);
        assert_eq!(p.stats.strength, before.strength);
        assert_eq!(p.stats.intelligence, before.intelligence);
        assert_eq!(p.stats.luck, before.luck);
    }

    #[test]
    fn test_spend_mp_failure_is_clean() {
        let mut p = player();
        p.mp = 4;
        let err = p.spend_mp(15).unwrap_err();
        assert!(matches!(err, GameError::InsufficientResource { required: 15, available: 4, .. }));
        assert_eq!(p.mp, 4);
    }

    #[test]
    fn test_take_hit_minimum_one() {
        let mut p = player();
        p.stats.agility = 50;
        assert_eq!(p.take_hit(3), 1);
        assert_eq!(p.hp, 99);
    }

    #[test]
    fn test_integrity_never_rises() {
        let mut p = player();
        assert_eq!(p.modify_integrity(30), 12);
        assert_eq!(p.modify_integrity(-5), 7);
        assert_eq!(p.modify_integrity(-50), 0);
    }

    #[test]
    fn test_corruption_thresholds_crossed() {
        let mut p = player();
        p.corruption = 20;
        let change = p.modify_corruption(35);
        let crossed: Vec<_> = change.crossed(&[25, 50, 75]).collect();
        assert_eq!(crossed, vec![25, 50]);

        let change = p.modify_corruption(-10);
        assert_eq!(change.crossed(&[25, 50, 75]).count(), 0);
    }

    #[test]
    fn test_level_up_restores_and_raises_threshold() {
        let growth = GrowthConfig::default();
        let mut rng = GameRng::new(5);
        let mut p = player();
        p.hp = 10;
        let ups = p.add_xp(260, &growth, &mut rng);

        // 100 for level 2, 150 for level 3, 10 left over.
        assert_eq!(ups.len(), 2);
        assert_eq!(p.level, 3);
        assert_eq!(p.xp, 10);
        assert_eq!(p.xp_to_next, 225);
        assert_eq!(p.hp, p.max_hp);
        assert!(p.max_hp >= 116);
    }

    #[test]
    fn test_luck_visibility() {
        let mut p = player();
        assert_eq!(p.status().luck, None);
        p.modify_corruption(50);
        assert_eq!(p.status().luck, Some(5));

        let mut q = player();
        q.set_flag(StoryFlag::DiscoveredLuck);
        assert!(q.luck_visible());
    }

    #[test]
    fn test_rest_recovers_fractions() {
        let mut p = player();
        p.hp = 10;
        p.mp = 0;
        assert_eq!(p.rest(), (33, 25));
    }

    proptest! {
        #[test]
        fn prop_hp_and_mp_stay_in_bounds(ops in proptest::collection::vec((0u8..5, any::<i32>()), 0..60)) {
            let mut p = player();
            for (op, amount) in ops {
                match op {
                    0 => { p.apply_damage(amount); }
                    1 => { p.heal(amount); }
                    2 => { p.drain_mp(amount); }
                    3 => { p.restore_mp(amount); }
                    _ => { p.take_hit(amount); }
                }
                prop_assert!(p.check_invariants().is_ok(), "{:?}", p.check_invariants());
            }
        }

        #[test]
        fn prop_corruption_and_integrity_clamped(deltas in proptest::collection::vec(any::<i32>(), 0..60)) {
            let mut p = player();
            for delta in deltas {
                let before = p.system_integrity;
                p.modify_corruption(delta);
                p.modify_integrity(delta);
                prop_assert!((0..=100).contains(&p.corruption));
                prop_assert!((0..=100).contains(&p.system_integrity));
                prop_assert!(p.system_integrity <= before);
            }
        }
    }
}
