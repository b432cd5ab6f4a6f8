//! A concrete enemy in one combat.

use serde::{Deserialize, Serialize};

use super::{ArchetypeId, EnemyMove, ThreatLevel};
use crate::entities::Item;
use crate::mechanics::{Affinity, DamageTag};
use crate::rng::GameRng;

/// Prefix added to the name of an evolved enemy.
pub const EVOLVED_PREFIX: &str = "[GLITCHED] ";

/// A scaled enemy created at combat start and dropped at combat end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyInstance {
    pub archetype: ArchetypeId,
    pub name: String,
    pub level: u32,
    pub hp: i32,
    pub max_hp: i32,
    /// Offensive power (the enemy's STR).
    pub attack: i32,
    pub defense: i32,
    pub agility: i32,
    pub intelligence: i32,
    pub xp_reward: u32,
    /// Weakness and resistance are known to the player once set.
    pub analyzed: bool,
    /// Set by a glitch evolution; an enemy evolves at most once.
    pub evolved: bool,
}

/// What an analysis reveals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyAnalysis {
    pub name: String,
    pub level: u32,
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub weakness: Option<DamageTag>,
    pub resistance: Option<DamageTag>,
    pub threat: ThreatLevel,
    pub origin: String,
}

impl EnemyInstance {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Remove HP, clamping at zero. Returns HP actually lost.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = self.hp.saturating_sub(amount.max(0)).clamp(0, self.max_hp);
        before - self.hp
    }

    /// How this enemy reacts to a damage tag. Both tags only count once
    /// analysis has revealed them.
    pub fn affinity(&self, tag: DamageTag) -> Affinity {
        if !self.analyzed {
            return Affinity::Normal;
        }
        let archetype = self.archetype.archetype();
        if archetype.resistance == Some(tag) {
            Affinity::Resistant
        } else if archetype.weakness == Some(tag) {
            Affinity::Weak
        } else {
            Affinity::Normal
        }
    }

    /// Reveal weakness and resistance for the rest of this combat.
    pub fn analyze(&mut self) -> EnemyAnalysis {
        self.analyzed = true;
        let archetype = self.archetype.archetype();
        EnemyAnalysis {
            name: self.name.clone(),
            level: self.level,
            hp: self.hp,
            max_hp: self.max_hp,
            attack: self.attack,
            defense: self.defense,
            weakness: archetype.weakness,
            resistance: archetype.resistance,
            threat: archetype.threat,
            origin: archetype.origin.to_string(),
        }
    }

    /// Glitch evolution: boosts HP, attack, defense and reward once.
    pub fn evolve(&mut self, rng: &mut GameRng) -> bool {
        if self.evolved {
            return false;
        }
        self.evolved = true;
        self.name = format!("{EVOLVED_PREFIX}{}", self.name);

        self.max_hp = self.max_hp * rng.range(130, 180) / 100;
        self.hp = self.max_hp;
        self.attack = self.attack * rng.range(120, 160) / 100;
        self.defense = self.defense * rng.range(110, 140) / 100;
        self.xp_reward = self.xp_reward * 3 / 2;
        true
    }

    /// Lower defense and attack, e.g. from a System Hack.
    pub fn weaken(&mut self, defense: i32, attack: i32) {
        self.defense = (self.defense - defense).max(0);
        self.attack = (self.attack - attack).max(1);
    }

    /// One roll on the drop table.
    pub fn roll_drop(&self, rng: &mut GameRng) -> Option<Item> {
        let roll = rng.range(1, 100) as u32;
        self.archetype
            .archetype()
            .drops
            .iter()
            .find(|(_, chance)| roll <= *chance)
            .map(|(item, _)| *item)
    }

    /// Weighted pick among the archetype's moves.
    pub fn choose_move(&self, rng: &mut GameRng) -> EnemyMove {
        let moves = self.archetype.archetype().moves;
        let weights: Vec<u32> = moves.iter().map(|(_, w)| *w).collect();
        rng.weighted_index(&weights)
            .map(|i| moves[i].0)
            .unwrap_or(EnemyMove::Strike)
    }

    /// Raw attack roll before the player's defense.
    pub fn attack_roll(&self, rng: &mut GameRng, variance_min: i32, variance_max: i32) -> i32 {
        (self.attack + rng.range(variance_min, variance_max)).max(1)
    }

    pub fn check_invariants(&self) -> Result<(), String> {
        if !(0..=self.max_hp).contains(&self.hp) {
            return Err(format!("enemy hp {} outside [0, {}]", self.hp, self.max_hp));
        }
        if self.attack < 1 || self.defense < 0 {
            return Err(format!("enemy attack {} / defense {}", self.attack, self.defense));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemies::EnemyCatalog;

    fn wolf() -> EnemyInstance {
        EnemyCatalog::standard().instantiate(ArchetypeId::GlitchedWolf, 2, 0)
    }

    #[test]
    fn test_weakness_hidden_until_analyzed() {
        let mut enemy = wolf();
        assert_eq!(enemy.affinity(DamageTag::System), Affinity::Normal);
        let analysis = enemy.analyze();
        assert_eq!(analysis.weakness, Some(DamageTag::System));
        assert_eq!(enemy.affinity(DamageTag::System), Affinity::Weak);
        assert_eq!(enemy.affinity(DamageTag::Physical), Affinity::Normal);
    }

    #[test]
    fn test_resistance_hidden_until_analyzed() {
        let mut slime = EnemyCatalog::standard().instantiate(ArchetypeId::CorruptedSlime, 1, 0);
        assert_eq!(slime.affinity(DamageTag::Void), Affinity::Normal);
        slime.analyze();
        assert_eq!(slime.affinity(DamageTag::Void), Affinity::Resistant);
    }

    #[test]
    fn test_evolve_once() {
        let mut rng = GameRng::new(11);
        let mut enemy = wolf();
        let base = enemy.clone();
        assert!(enemy.evolve(&mut rng));
        assert!(enemy.name.starts_with(EVOLVED_PREFIX));
        assert!(enemy.max_hp >= base.max_hp * 13 / 10);
        assert_eq!(enemy.hp, enemy.max_hp);
        assert!(!enemy.evolve(&mut rng));
        assert!(enemy.check_invariants().is_ok());
    }

    #[test]
    fn test_weaken_floors() {
        let mut enemy = wolf();
        enemy.weaken(100, 100);
        assert_eq!(enemy.defense, 0);
        assert_eq!(enemy.attack, 1);
    }

    #[test]
    fn test_drops_come_from_table() {
        let mut rng = GameRng::new(3);
        let enemy = wolf();
        for _ in 0..200 {
            if let Some(item) = enemy.roll_drop(&mut rng) {
                assert!(matches!(item, Item::WolfPelt | Item::GlitchCrystal | Item::SystemFragment));
            }
        }
    }

    #[test]
    fn test_guardian_always_drops() {
        let mut rng = GameRng::new(4);
        let guardian = EnemyCatalog::standard().instantiate(ArchetypeId::CorruptedGuardian, 5, 10);
        for _ in 0..100 {
            assert!(guardian.roll_drop(&mut rng).is_some());
        }
    }
}
