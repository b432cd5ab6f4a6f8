//! Turn-based combat.
//!
//! A [`Combat`] is a small state machine:
//!
//! ```text
//! PlayerTurn --action--> EnemyTurn --enemy move--> PlayerTurn
//!      \                     \
//!       +--> Resolved(Victory | Fled)   +--> Resolved(Defeat)
//! ```
//!
//! Every call to [`Combat::step`] resolves one full cycle. A step that fails
//! validation returns an error and leaves player, enemy and phase untouched.
//! Every enemy move removes at least 1 HP, so a fight without healing always
//! ends.

mod formulas;

pub use formulas::*;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::enemies::{EnemyAnalysis, EnemyInstance, EnemyMove};
use crate::entities::{GrowthAction, Item, LevelUp, PlayerState, Stat};
use crate::error::{GameError, GameResult, Resource};
use crate::mechanics::{scale_damage, DamageTag, SkillEffect, SkillId};
use crate::rng::GameRng;

/// What the player does on their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatAction {
    Attack,
    Analyze,
    Skill(SkillId),
    Flee,
}

/// How a combat ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatOutcome {
    Victory,
    Defeat,
    Fled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatPhase {
    PlayerTurn,
    EnemyTurn,
    Resolved(CombatOutcome),
}

/// One thing that happened during a step, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    UnstableStart {
        evolved: bool,
    },
    PlayerHit {
        damage: i32,
        critical: bool,
        tag: DamageTag,
        exploited_weakness: bool,
        resisted: bool,
    },
    Analyzed(EnemyAnalysis),
    SkillUsed {
        skill: SkillId,
        mp_spent: i32,
        damage: i32,
        healed: i32,
        corruption: i32,
    },
    EnemyWeakened {
        defense: i32,
        attack: i32,
    },
    StatGrew(Stat),
    FleeSucceeded {
        chance: f64,
    },
    FleeFailed {
        chance: f64,
    },
    EnemyActed {
        enemy_move: EnemyMove,
        damage: i32,
        mp_drained: i32,
    },
    EnemyDefeated,
    PlayerDefeated,
    XpGained(u32),
    LevelUp(LevelUp),
    Loot(Item),
}

/// Spoils of a victory, already applied to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewards {
    pub xp: u32,
    pub level_ups: Vec<LevelUp>,
    pub drop: Option<Item>,
}

/// The result of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatStep {
    pub turn: u32,
    pub events: Vec<CombatEvent>,
    pub outcome: Option<CombatOutcome>,
    pub rewards: Option<Rewards>,
}

/// One battle from first turn to resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combat {
    enemy: EnemyInstance,
    phase: CombatPhase,
    turn: u32,
}

impl Combat {
    /// Start a fight. No opening roll; see [`Combat::begin`].
    pub fn new(enemy: EnemyInstance) -> Self {
        Self {
            enemy,
            phase: CombatPhase::PlayerTurn,
            turn: 0,
        }
    }

    /// Start a fight with the opening instability roll: with
    /// `unstable_start_chance` percent the parameters wobble, and half of
    /// those times the enemy evolves before the first turn.
    pub fn begin(enemy: EnemyInstance, config: &GameConfig, rng: &mut GameRng) -> (Self, Option<CombatEvent>) {
        let mut combat = Self::new(enemy);
        if !rng.percent(config.combat.unstable_start_chance) {
            return (combat, None);
        }
        let evolved = rng.coin() && combat.enemy.evolve(rng);
        if evolved {
            info!(enemy = %combat.enemy.name, "enemy evolved at combat start");
        }
        (combat, Some(CombatEvent::UnstableStart { evolved }))
    }

    pub fn enemy(&self) -> &EnemyInstance {
        &self.enemy
    }

    pub fn enemy_mut(&mut self) -> &mut EnemyInstance {
        &mut self.enemy
    }

    pub fn phase(&self) -> CombatPhase {
        self.phase
    }

    /// Completed player turns so far.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn outcome(&self) -> Option<CombatOutcome> {
        match self.phase {
            CombatPhase::Resolved(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome().is_some()
    }

    /// Force a resolution when HP was changed outside of a step (e.g. by a
    /// glitch). Returns the new outcome if one was reached.
    pub fn settle(&mut self, player: &PlayerState) -> Option<CombatOutcome> {
        if self.is_resolved() {
            return self.outcome();
        }
        let outcome = if !player.is_alive() {
            CombatOutcome::Defeat
        } else if !self.enemy.is_alive() {
            CombatOutcome::Victory
        } else {
            return None;
        };
        self.phase = CombatPhase::Resolved(outcome);
        Some(outcome)
    }

    /// Resolve one player action and, if the fight goes on, the enemy's reply.
    pub fn step(
        &mut self,
        player: &mut PlayerState,
        action: CombatAction,
        config: &GameConfig,
        rng: &mut GameRng,
    ) -> GameResult<CombatStep> {
        if let CombatPhase::Resolved(outcome) = self.phase {
            return Err(GameError::invalid_action(format!("combat already ended in {outcome:?}")));
        }
        if !player.is_alive() {
            return Err(GameError::invalid_action("player cannot act at 0 HP"));
        }
        if let CombatAction::Skill(skill) = action {
            validate_skill(player, skill)?;
        }

        self.turn += 1;
        let mut events = Vec::new();
        let mut fled = false;

        match action {
            CombatAction::Attack => {
                self.player_attack(player, config, rng, &mut events);
            }
            CombatAction::Analyze => {
                let analysis = self.enemy.analyze();
                events.push(CombatEvent::Analyzed(analysis));
                player.tally.analyzes += 1;
                if let Some(stat) = player.apply_action_growth(GrowthAction::Analyze, &config.growth) {
                    events.push(CombatEvent::StatGrew(stat));
                }
            }
            CombatAction::Skill(skill) => self.player_skill(player, skill, config, rng, &mut events)?,
            CombatAction::Flee => {
                let chance = flee_chance(player.stats.agility, self.enemy.agility, &config.combat);
                if rng.chance(chance) {
                    player.tally.flees += 1;
                    events.push(CombatEvent::FleeSucceeded { chance });
                    if let Some(stat) = player.apply_action_growth(GrowthAction::Flee, &config.growth) {
                        events.push(CombatEvent::StatGrew(stat));
                    }
                    fled = true;
                } else {
                    events.push(CombatEvent::FleeFailed { chance });
                }
            }
        }

        if fled {
            self.phase = CombatPhase::Resolved(CombatOutcome::Fled);
            debug!(turn = self.turn, "player fled");
            return Ok(self.finish_step(events, None));
        }

        if !self.enemy.is_alive() {
            events.push(CombatEvent::EnemyDefeated);
            let rewards = self.grant_rewards(player, config, rng, &mut events);
            self.phase = CombatPhase::Resolved(CombatOutcome::Victory);
            info!(enemy = %self.enemy.name, xp = rewards.xp, turn = self.turn, "combat won");
            return Ok(self.finish_step(events, Some(rewards)));
        }

        if !player.is_alive() {
            events.push(CombatEvent::PlayerDefeated);
            self.phase = CombatPhase::Resolved(CombatOutcome::Defeat);
            info!(enemy = %self.enemy.name, turn = self.turn, "combat lost");
            return Ok(self.finish_step(events, None));
        }

        self.phase = CombatPhase::EnemyTurn;
        self.enemy_turn(player, config, rng, &mut events);

        if player.is_alive() {
            self.phase = CombatPhase::PlayerTurn;
        } else {
            events.push(CombatEvent::PlayerDefeated);
            self.phase = CombatPhase::Resolved(CombatOutcome::Defeat);
            info!(enemy = %self.enemy.name, turn = self.turn, "combat lost");
        }
        Ok(self.finish_step(events, None))
    }

    fn finish_step(&self, events: Vec<CombatEvent>, rewards: Option<Rewards>) -> CombatStep {
        CombatStep {
            turn: self.turn,
            events,
            outcome: self.outcome(),
            rewards,
        }
    }

    fn player_attack(
        &mut self,
        player: &mut PlayerState,
        config: &GameConfig,
        rng: &mut GameRng,
        events: &mut Vec<CombatEvent>,
    ) -> i32 {
        let roll = roll_attack(
            player.stats.strength,
            self.enemy.defense,
            player.stats.luck,
            &config.combat,
            rng,
        );
        let hit = self.land_hit(roll.damage, roll.critical, DamageTag::Physical, config);
        let dealt = match hit {
            CombatEvent::PlayerHit { damage, .. } => damage,
            _ => 0,
        };
        events.push(hit);
        player.tally.attacks += 1;
        if let Some(stat) = player.apply_action_growth(GrowthAction::Attack, &config.growth) {
            events.push(CombatEvent::StatGrew(stat));
        }
        dealt
    }

    /// Apply affinity to a rolled damage value and deal it.
    fn land_hit(&mut self, damage: i32, critical: bool, tag: DamageTag, config: &GameConfig) -> CombatEvent {
        let affinity = self.enemy.affinity(tag);
        let percent = affinity.multiplier(
            config.combat.weakness_multiplier,
            config.combat.resistance_multiplier,
        );
        let dealt = self.enemy.apply_damage(scale_damage(damage, percent));
        CombatEvent::PlayerHit {
            damage: dealt,
            critical,
            tag,
            exploited_weakness: percent > 100,
            resisted: percent < 100,
        }
    }

    fn player_skill(
        &mut self,
        player: &mut PlayerState,
        skill: SkillId,
        config: &GameConfig,
        rng: &mut GameRng,
        events: &mut Vec<CombatEvent>,
    ) -> GameResult<()> {
        let def = skill.def();
        player.spend_mp(def.mp_cost)?;

        let mut damage = 0;
        let mut healed = 0;
        match def.effect {
            SkillEffect::Strike => {
                damage = self.player_attack(player, config, rng, events);
            }
            SkillEffect::EmpoweredStrike { percent } => {
                let roll = roll_attack(
                    player.stats.strength,
                    self.enemy.defense,
                    player.stats.luck,
                    &config.combat,
                    rng,
                );
                let hit = self.land_hit(scale_damage(roll.damage, percent), roll.critical, def.tag, config);
                if let CombatEvent::PlayerHit { damage: dealt, .. } = hit {
                    damage = dealt;
                }
                events.push(hit);
            }
            SkillEffect::IntellectBlast { percent } => {
                let raw = scale_damage(player.stats.intelligence, percent);
                let hit = self.land_hit((raw - self.enemy.defense).max(1), false, def.tag, config);
                if let CombatEvent::PlayerHit { damage: dealt, .. } = hit {
                    damage = dealt;
                }
                events.push(hit);
            }
            SkillEffect::Drain => {
                let raw = player.stats.intelligence;
                let hit = self.land_hit((raw - self.enemy.defense).max(1), false, def.tag, config);
                if let CombatEvent::PlayerHit { damage: dealt, .. } = hit {
                    damage = dealt;
                }
                events.push(hit);
                healed = player.heal(damage / 2);
            }
            SkillEffect::Debuff { defense, attack } => {
                self.enemy.weaken(defense, attack);
                events.push(CombatEvent::EnemyWeakened { defense, attack });
            }
            SkillEffect::Heal { min, max } => {
                healed = player.heal(rng.range(min, max));
            }
        }

        let change = player.modify_corruption(def.corruption);
        if def.integrity_cost > 0 {
            player.modify_integrity(-def.integrity_cost);
        }
        player.tally.skills_used += 1;

        events.push(CombatEvent::SkillUsed {
            skill,
            mp_spent: def.mp_cost,
            damage,
            healed,
            corruption: change.after - change.before,
        });
        debug!(%skill, damage, healed, "skill resolved");
        Ok(())
    }

    fn enemy_turn(
        &mut self,
        player: &mut PlayerState,
        config: &GameConfig,
        rng: &mut GameRng,
        events: &mut Vec<CombatEvent>,
    ) {
        let enemy_move = self.enemy.choose_move(rng);
        let raw = self.enemy.attack_roll(
            rng,
            config.combat.enemy_variance_min,
            config.combat.enemy_variance_max,
        );
        let (damage, mp_drained) = match enemy_move {
            EnemyMove::Strike => (player.take_hit(raw), 0),
            EnemyMove::HeavyBlow { percent } => (player.take_hit(scale_damage(raw, percent)), 0),
            EnemyMove::Siphon { mp } => {
                let damage = player.take_hit(raw / 2);
                (damage, player.drain_mp(mp))
            }
        };
        events.push(CombatEvent::EnemyActed {
            enemy_move,
            damage,
            mp_drained,
        });
    }

    fn grant_rewards(
        &mut self,
        player: &mut PlayerState,
        config: &GameConfig,
        rng: &mut GameRng,
        events: &mut Vec<CombatEvent>,
    ) -> Rewards {
        let xp = self.enemy.xp_reward;
        events.push(CombatEvent::XpGained(xp));
        let level_ups = player.add_xp(xp, &config.growth, rng);
        for level_up in &level_ups {
            events.push(CombatEvent::LevelUp(level_up.clone()));
        }

        let drop = self.enemy.roll_drop(rng);
        if let Some(item) = drop {
            player.inventory.add(item, 1);
            events.push(CombatEvent::Loot(item));
        }

        Rewards { xp, level_ups, drop }
    }
}

/// Check a skill can be used right now, without changing anything.
fn validate_skill(player: &PlayerState, skill: SkillId) -> GameResult<()> {
    if !player.knows_skill(skill) {
        return Err(GameError::invalid_action(format!("{skill} has not been unlocked")));
    }
    let cost = skill.def().mp_cost;
    if player.mp < cost {
        return Err(GameError::InsufficientResource {
            resource: Resource::Mp,
            required: cost,
            available: player.mp,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemies::{ArchetypeId, EnemyCatalog};

    fn setup(id: ArchetypeId) -> (PlayerState, Combat, GameConfig) {
        let config = GameConfig::default();
        let player = PlayerState::new("Unknown", &config);
        let enemy = EnemyCatalog::standard().instantiate(id, 1, 0);
        (player, Combat::new(enemy), config)
    }

    #[test]
    fn test_attack_then_enemy_reply() {
        let (mut player, mut combat, config) = setup(ArchetypeId::RuinsSkeleton);
        let mut rng = GameRng::new(10);

        let step = combat.step(&mut player, CombatAction::Attack, &config, &mut rng).unwrap();
        assert_eq!(step.turn, 1);
        assert!(matches!(step.events[0], CombatEvent::PlayerHit { .. }));
        assert!(step.events.iter().any(|e| matches!(e, CombatEvent::EnemyActed { damage, .. } if *damage >= 1)));
        assert_eq!(combat.phase(), CombatPhase::PlayerTurn);
        assert!(player.hp < player.max_hp);
        assert_eq!(player.stats.strength, 11);
        assert_eq!(player.tally.attacks, 1);
    }

    #[test]
    fn test_analyze_reveals_and_trains_int() {
        let (mut player, mut combat, config) = setup(ArchetypeId::GlitchedWolf);
        let mut rng = GameRng::new(1);
        let step = combat.step(&mut player, CombatAction::Analyze, &config, &mut rng).unwrap();

        assert!(combat.enemy().analyzed);
        assert_eq!(combat.enemy().hp, combat.enemy().max_hp);
        assert_eq!(player.stats.intelligence, 11);
        assert!(step.events.contains(&CombatEvent::StatGrew(Stat::Intelligence)));
    }

    #[test]
    fn test_insufficient_mp_has_no_effect() {
        let (mut player, mut combat, config) = setup(ArchetypeId::CorruptedSlime);
        let mut rng = GameRng::new(2);
        player.learn_skill(SkillId::RealityTear);
        player.mp = 10;
        let before_player = player.clone();
        let before_combat = combat.clone();

        let err = combat
            .step(&mut player, CombatAction::Skill(SkillId::RealityTear), &config, &mut rng)
            .unwrap_err();
        assert!(matches!(err, GameError::InsufficientResource { required: 25, available: 10, .. }));
        assert_eq!(player, before_player);
        assert_eq!(combat, before_combat);
    }

    #[test]
    fn test_locked_skill_rejected() {
        let (mut player, mut combat, config) = setup(ArchetypeId::CorruptedSlime);
        let mut rng = GameRng::new(2);
        let err = combat
            .step(&mut player, CombatAction::Skill(SkillId::VoidStrike), &config, &mut rng)
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidAction(_)));
        assert_eq!(combat.turn(), 0);
    }

    #[test]
    fn test_forbidden_skill_raises_corruption() {
        let (mut player, mut combat, config) = setup(ArchetypeId::CorruptedGuardian);
        let mut rng = GameRng::new(3);
        player.learn_skill(SkillId::RealityTear);

        let step = combat
            .step(&mut player, CombatAction::Skill(SkillId::RealityTear), &config, &mut rng)
            .unwrap();
        assert_eq!(player.corruption, 8);
        assert_eq!(player.system_integrity, 11);
        // The guardian may siphon on its reply.
        assert!((15..=25).contains(&player.mp));
        assert!(step
            .events
            .iter()
            .any(|e| matches!(e, CombatEvent::SkillUsed { skill: SkillId::RealityTear, corruption: 8, .. })));
    }

    #[test]
    fn test_system_hack_weakens() {
        let (mut player, mut combat, config) = setup(ArchetypeId::RuinsSkeleton);
        let mut rng = GameRng::new(4);
        player.learn_skill(SkillId::SystemHack);
        let attack = combat.enemy().attack;

        combat
            .step(&mut player, CombatAction::Skill(SkillId::SystemHack), &config, &mut rng)
            .unwrap();
        assert_eq!(combat.enemy().defense, 0);
        assert_eq!(combat.enemy().attack, attack - 3);
        assert_eq!(player.corruption, 5);
    }

    #[test]
    fn test_weakness_bonus_after_analysis() {
        let config = GameConfig::default();
        let catalog = EnemyCatalog::standard();

        // The analyzed slime takes 1.5x physical damage.
        let mut plain = Combat::new(catalog.instantiate(ArchetypeId::CorruptedSlime, 1, 0));
        let hit_plain = plain.land_hit(10, false, DamageTag::Physical, &config);

        let mut analyzed = Combat::new(catalog.instantiate(ArchetypeId::CorruptedSlime, 1, 0));
        analyzed.enemy_mut().analyze();
        let hit_weak = analyzed.land_hit(10, false, DamageTag::Physical, &config);

        assert!(matches!(hit_plain, CombatEvent::PlayerHit { damage: 10, exploited_weakness: false, .. }));
        assert!(matches!(hit_weak, CombatEvent::PlayerHit { damage: 15, exploited_weakness: true, .. }));
    }

    #[test]
    fn test_resistance_after_analysis() {
        let config = GameConfig::default();
        let catalog = EnemyCatalog::standard();

        let mut plain = Combat::new(catalog.instantiate(ArchetypeId::CorruptedSlime, 1, 0));
        let hit_plain = plain.land_hit(10, false, DamageTag::Void, &config);

        let mut analyzed = Combat::new(catalog.instantiate(ArchetypeId::CorruptedSlime, 1, 0));
        analyzed.enemy_mut().analyze();
        let hit_resisted = analyzed.land_hit(10, false, DamageTag::Void, &config);

        assert!(matches!(hit_plain, CombatEvent::PlayerHit { damage: 10, .. }));
        assert!(matches!(hit_resisted, CombatEvent::PlayerHit { damage: 5, .. }));
    }

    #[test]
    fn test_flee_outcome() {
        let (mut player, mut combat, config) = setup(ArchetypeId::CorruptedSlime);
        player.stats.agility = 200;
        let mut rng = GameRng::new(5);
        let mut fled = false;
        for _ in 0..20 {
            let step = combat.step(&mut player, CombatAction::Flee, &config, &mut rng).unwrap();
            if step.outcome == Some(CombatOutcome::Fled) {
                fled = true;
                break;
            }
        }
        assert!(fled);
        assert_eq!(player.tally.flees, 1);
        assert!(combat.step(&mut player, CombatAction::Attack, &config, &mut rng).is_err());
    }

    #[test]
    fn test_victory_grants_rewards() {
        let (mut player, mut combat, config) = setup(ArchetypeId::CorruptedSlime);
        let mut rng = GameRng::new(6);
        combat.enemy_mut().hp = 1;

        let step = combat.step(&mut player, CombatAction::Attack, &config, &mut rng).unwrap();
        assert_eq!(step.outcome, Some(CombatOutcome::Victory));
        let rewards = step.rewards.unwrap();
        assert_eq!(rewards.xp, 25);
        assert_eq!(player.xp, 25);
        assert!(!step.events.iter().any(|e| matches!(e, CombatEvent::EnemyActed { .. })));
    }

    #[test]
    fn test_defeat_when_hp_runs_out() {
        let (mut player, mut combat, config) = setup(ArchetypeId::CorruptedGuardian);
        let mut rng = GameRng::new(7);
        player.hp = 1;
        let step = combat.step(&mut player, CombatAction::Analyze, &config, &mut rng).unwrap();
        assert_eq!(step.outcome, Some(CombatOutcome::Defeat));
        assert_eq!(player.hp, 0);
        assert!(player.check_invariants().is_ok());
    }

    #[test]
    fn test_passive_fight_always_terminates() {
        // Analyzing never deals damage, so only the monotonic HP loss ends it.
        let (mut player, mut combat, config) = setup(ArchetypeId::CorruptedSlime);
        let mut rng = GameRng::new(8);
        player.stats.agility = 500;
        let mut last_hp = player.hp;
        let mut rounds = 0;
        while !combat.is_resolved() {
            combat.step(&mut player, CombatAction::Analyze, &config, &mut rng).unwrap();
            assert!(player.hp < last_hp);
            last_hp = player.hp;
            rounds += 1;
            assert!(rounds <= 100);
        }
        assert_eq!(combat.outcome(), Some(CombatOutcome::Defeat));
    }

    #[test]
    fn test_settle_after_external_damage() {
        let (mut player, mut combat, _) = setup(ArchetypeId::CorruptedSlime);
        assert_eq!(combat.settle(&player), None);
        player.apply_damage(1000);
        assert_eq!(combat.settle(&player), Some(CombatOutcome::Defeat));
    }
}
