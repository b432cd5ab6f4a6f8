//! The System layer: randomized glitch events and integrity decay.
//!
//! A trigger rolls against its configured chance, then a kind is drawn from
//! a weighted table filtered to the kinds that can act on the current state.
//! Every random value a kind needs is drawn before any state changes, and
//! each effect goes through the clamping mutators of the player, quest log
//! and enemy, so an applied glitch never leaves state half-changed.

mod text;

pub use text::*;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GlitchConfig;
use crate::enemies::EnemyInstance;
use crate::entities::{CorruptionChange, Item, PlayerState, Stat, StoryFlag};
use crate::mechanics::SkillId;
use crate::quests::{QuestId, QuestLog, QuestMutation, QuestUpdate};
use crate::rng::GameRng;

/// Broad family of a glitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlitchCategory {
    StatShift,
    TextCorruption,
    QuestMutation,
    SkillUnlock,
    RealityShift,
}

/// Every glitch the System can throw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlitchKind {
    // Stat shift
    StatFluctuation,
    StatDrain,
    StatSurge,
    VitalFlicker,
    TimeSkip,
    // Text corruption
    GarbledText,
    EchoingWords,
    NoiseBurst,
    Redaction,
    WordScramble,
    // Quest mutation
    ObjectiveMutation,
    ProgressReversal,
    RecordCorruption,
    QuestErasure,
    QuestDuplication,
    // Skill unlock
    ForbiddenAccess,
    HiddenStatLeak,
    // Reality shift
    RealityRipple,
    InventoryCorruption,
    EnemyEvolution,
    IntegrityFracture,
}

/// `(kind, weight)` rows. Higher weight means more frequent.
pub static GLITCH_TABLE: [(GlitchKind, u32); 21] = [
    (GlitchKind::StatFluctuation, 8),
    (GlitchKind::StatDrain, 5),
    (GlitchKind::StatSurge, 5),
    (GlitchKind::VitalFlicker, 5),
    (GlitchKind::TimeSkip, 4),
    (GlitchKind::GarbledText, 3),
    (GlitchKind::EchoingWords, 3),
    (GlitchKind::NoiseBurst, 3),
    (GlitchKind::Redaction, 3),
    (GlitchKind::WordScramble, 3),
    (GlitchKind::ObjectiveMutation, 4),
    (GlitchKind::ProgressReversal, 4),
    (GlitchKind::RecordCorruption, 3),
    (GlitchKind::QuestErasure, 1),
    (GlitchKind::QuestDuplication, 2),
    (GlitchKind::ForbiddenAccess, 5),
    (GlitchKind::HiddenStatLeak, 3),
    (GlitchKind::RealityRipple, 8),
    (GlitchKind::InventoryCorruption, 6),
    (GlitchKind::EnemyEvolution, 6),
    (GlitchKind::IntegrityFracture, 3),
];

impl GlitchKind {
    pub fn category(&self) -> GlitchCategory {
        use GlitchKind::*;
        match self {
            StatFluctuation | StatDrain | StatSurge | VitalFlicker | TimeSkip => GlitchCategory::StatShift,
            GarbledText | EchoingWords | NoiseBurst | Redaction | WordScramble => GlitchCategory::TextCorruption,
            ObjectiveMutation | ProgressReversal | RecordCorruption | QuestErasure | QuestDuplication => {
                GlitchCategory::QuestMutation
            }
            ForbiddenAccess | HiddenStatLeak => GlitchCategory::SkillUnlock,
            RealityRipple | InventoryCorruption | EnemyEvolution | IntegrityFracture => GlitchCategory::RealityShift,
        }
    }

    pub fn text_style(&self) -> Option<TextStyle> {
        match self {
            GlitchKind::GarbledText => Some(TextStyle::CorruptChars),
            GlitchKind::EchoingWords => Some(TextStyle::RepeatWords),
            GlitchKind::NoiseBurst => Some(TextStyle::InsertNoise),
            GlitchKind::Redaction => Some(TextStyle::Redact),
            GlitchKind::WordScramble => Some(TextStyle::Scramble),
            _ => None,
        }
    }

    fn quest_mutation(&self) -> Option<QuestMutation> {
        match self {
            GlitchKind::ObjectiveMutation => Some(QuestMutation::MutateObjectives),
            GlitchKind::ProgressReversal => Some(QuestMutation::ReverseProgress),
            GlitchKind::RecordCorruption => Some(QuestMutation::CorruptRecord),
            GlitchKind::QuestErasure => Some(QuestMutation::Erase),
            GlitchKind::QuestDuplication => Some(QuestMutation::Duplicate),
            _ => None,
        }
    }

    /// Whether this kind would do anything against the given state.
    pub fn is_applicable(&self, ctx: &GlitchContext<'_>) -> bool {
        if let Some(mutation) = self.quest_mutation() {
            return QuestId::ALL.iter().any(|id| ctx.quests.can_mutate(*id, mutation));
        }
        match self {
            GlitchKind::ForbiddenAccess => SkillId::FORBIDDEN_ACCESS.iter().any(|s| !ctx.player.knows_skill(*s)),
            GlitchKind::HiddenStatLeak => !ctx.player.has_flag(StoryFlag::DiscoveredLuck),
            GlitchKind::EnemyEvolution => ctx.enemy.as_ref().is_some_and(|e| e.is_alive() && !e.evolved),
            _ => true,
        }
    }
}

/// What caused a glitch roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlitchTrigger {
    Exploration,
    CombatVictory,
    /// Mid-combat, after the given completed turn.
    CombatTurn(u32),
    /// Corruption crossed this threshold upwards.
    CorruptionThreshold(i32),
    /// An exploration anomaly.
    Anomaly,
}

/// What a glitch touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlitchTarget {
    Player,
    Stat(Stat),
    Quest(QuestId),
    Skill(SkillId),
    Item(Item),
    Enemy,
    Message,
    Nothing,
}

/// One applied glitch. Ephemeral; only its effects persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlitchEvent {
    pub kind: GlitchKind,
    pub category: GlitchCategory,
    /// Size of the main effect, signed where it has a direction.
    pub magnitude: i32,
    pub target: GlitchTarget,
    pub message: String,
    /// Corruption movement caused by the glitch, if any.
    pub corruption: Option<CorruptionChange>,
    pub quest_update: Option<QuestUpdate>,
    /// Integrity after the glitch.
    pub integrity: i32,
}

/// The state a glitch may act on.
pub struct GlitchContext<'a> {
    pub player: &'a mut PlayerState,
    pub quests: &'a mut QuestLog,
    pub enemy: Option<&'a mut EnemyInstance>,
}

impl<'a> GlitchContext<'a> {
    pub fn new(player: &'a mut PlayerState, quests: &'a mut QuestLog) -> Self {
        Self {
            player,
            quests,
            enemy: None,
        }
    }

    pub fn with_enemy(mut self, enemy: &'a mut EnemyInstance) -> Self {
        self.enemy = Some(enemy);
        self
    }
}

/// Rolls, picks and applies glitches.
#[derive(Debug, Clone, Default)]
pub struct GlitchEngine {
    config: GlitchConfig,
}

impl GlitchEngine {
    pub fn new(config: GlitchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GlitchConfig {
        &self.config
    }

    /// Roll the trigger's chance. Threshold crossings and anomalies always fire.
    pub fn rolls(&self, trigger: GlitchTrigger, rng: &mut GameRng) -> bool {
        match trigger {
            GlitchTrigger::Exploration => rng.percent(self.config.exploration_chance),
            GlitchTrigger::CombatVictory => rng.percent(self.config.victory_chance),
            GlitchTrigger::CombatTurn(turn) => {
                turn > self.config.combat_turn_threshold && rng.percent(self.config.combat_turn_chance)
            }
            GlitchTrigger::CorruptionThreshold(_) | GlitchTrigger::Anomaly => true,
        }
    }

    /// Roll the trigger and, if it fires, apply a glitch.
    pub fn trigger(&self, trigger: GlitchTrigger, ctx: &mut GlitchContext<'_>, rng: &mut GameRng) -> Option<GlitchEvent> {
        if !self.rolls(trigger, rng) {
            return None;
        }
        debug!(?trigger, "glitch triggered");
        Some(self.force(ctx, rng))
    }

    /// Pick and apply a glitch unconditionally.
    pub fn force(&self, ctx: &mut GlitchContext<'_>, rng: &mut GameRng) -> GlitchEvent {
        let kind = self.pick(ctx, rng);
        self.apply(kind, ctx, rng)
    }

    /// Weighted pick among the kinds applicable to `ctx`.
    pub fn pick(&self, ctx: &GlitchContext<'_>, rng: &mut GameRng) -> GlitchKind {
        let pool: Vec<(GlitchKind, u32)> = GLITCH_TABLE
            .iter()
            .copied()
            .filter(|(kind, _)| kind.is_applicable(ctx))
            .collect();
        let weights: Vec<u32> = pool.iter().map(|(_, w)| *w).collect();
        rng.weighted_index(&weights)
            .map(|i| pool[i].0)
            .unwrap_or(GlitchKind::StatFluctuation)
    }

    /// Apply one glitch of the given kind.
    pub fn apply(&self, kind: GlitchKind, ctx: &mut GlitchContext<'_>, rng: &mut GameRng) -> GlitchEvent {
        let mut event = GlitchEvent {
            kind,
            category: kind.category(),
            magnitude: 0,
            target: GlitchTarget::Nothing,
            message: String::new(),
            corruption: None,
            quest_update: None,
            integrity: ctx.player.system_integrity,
        };

        match kind.category() {
            GlitchCategory::StatShift => apply_stat_shift(kind, ctx.player, rng, &mut event),
            GlitchCategory::TextCorruption => {
                let style = kind.text_style().unwrap_or(TextStyle::CorruptChars);
                event.target = GlitchTarget::Message;
                event.message = corrupt_text(style, "Signal degradation detected in the narrative buffer.", rng);
            }
            GlitchCategory::QuestMutation => apply_quest_mutation(kind, ctx, rng, &mut event),
            GlitchCategory::SkillUnlock => apply_skill_unlock(kind, ctx.player, rng, &mut event),
            GlitchCategory::RealityShift => apply_reality_shift(kind, ctx, rng, &mut event),
        }

        if event.category != GlitchCategory::TextCorruption {
            event.integrity = ctx.player.modify_integrity(-self.config.integrity_decay);
        }
        warn!(?kind, magnitude = event.magnitude, integrity = event.integrity, "system glitch");
        event
    }
}

fn merge_corruption(event: &mut GlitchEvent, change: CorruptionChange) {
    event.corruption = Some(match event.corruption {
        Some(prev) => CorruptionChange {
            before: prev.before,
            after: change.after,
        },
        None => change,
    });
}

fn random_stat(rng: &mut GameRng) -> Stat {
    *rng.choose(&[Stat::Strength, Stat::Agility, Stat::Intelligence]).unwrap_or(&Stat::Strength)
}

fn apply_stat_shift(kind: GlitchKind, player: &mut PlayerState, rng: &mut GameRng, event: &mut GlitchEvent) {
    match kind {
        GlitchKind::StatFluctuation => {
            let rolls: Vec<(Stat, bool, i32)> = [Stat::Strength, Stat::Agility, Stat::Intelligence]
                .into_iter()
                .map(|stat| (stat, rng.coin(), rng.range(-5, 10)))
                .collect();
            let mut parts = Vec::new();
            for (stat, hit, delta) in rolls {
                if hit {
                    let actual = player.stats.shift(stat, delta);
                    event.magnitude += actual;
                    parts.push(format!("{} {actual:+}", stat.abbreviation()));
                }
            }
            let change = player.register_system_error(rng);
            merge_corruption(event, change);
            event.target = GlitchTarget::Player;
            event.message = if parts.is_empty() {
                "Memory address violation detected. Stats flicker, then settle.".to_string()
            } else {
                format!("Memory address violation detected. Stats altered: {}", parts.join(", "))
            };
        }
        GlitchKind::StatDrain | GlitchKind::StatSurge => {
            let stat = random_stat(rng);
            let amount = rng.range(1, 3);
            let delta = if kind == GlitchKind::StatDrain { -amount } else { amount };
            let actual = player.stats.shift(stat, delta);
            event.magnitude = actual;
            event.target = GlitchTarget::Stat(stat);
            event.message = format!("{} rewritten: {actual:+}", stat.abbreviation());
        }
        GlitchKind::VitalFlicker => {
            let amount = rng.range(5, 15);
            // Never lethal on its own.
            let lost = player.apply_damage(amount.min(player.hp - 1).max(0));
            event.magnitude = -lost;
            event.target = GlitchTarget::Player;
            event.message = format!("Vital signs desynchronized. Lost {lost} HP.");
        }
        GlitchKind::TimeSkip => {
            let hp = player.heal(20);
            let mp = player.restore_mp(10);
            merge_corruption(event, player.modify_corruption(5));
            event.magnitude = hp + mp;
            event.target = GlitchTarget::Player;
            event.message = "Temporal loop detected. Skipping forward. Status partially restored.".to_string();
        }
        _ => {}
    }
}

fn apply_quest_mutation(kind: GlitchKind, ctx: &mut GlitchContext<'_>, rng: &mut GameRng, event: &mut GlitchEvent) {
    let Some(mutation) = kind.quest_mutation() else {
        return;
    };
    let candidates: Vec<QuestId> = QuestId::ALL
        .into_iter()
        .filter(|id| ctx.quests.can_mutate(*id, mutation))
        .collect();
    let Some(&id) = rng.choose(&candidates) else {
        event.message = "Quest data scan found nothing to corrupt.".to_string();
        return;
    };

    match ctx.quests.mutate(id, mutation, rng) {
        Ok(update) => {
            event.target = GlitchTarget::Quest(id);
            event.magnitude = 1;
            event.message = match mutation {
                QuestMutation::MutateObjectives => format!("Quest data corrupting: {id}. Objectives have mutated."),
                QuestMutation::ReverseProgress => "Temporal anomaly detected. Quest progress reversing.".to_string(),
                QuestMutation::CorruptRecord => "Reward data corrupted.".to_string(),
                QuestMutation::Erase => "Memory address invalid. Quest data lost.".to_string(),
                QuestMutation::Duplicate => format!("Memory duplication error. {id} now exists twice."),
            };
            event.quest_update = Some(update);
        }
        Err(err) => {
            event.message = err.to_string();
        }
    }
}

fn apply_skill_unlock(kind: GlitchKind, player: &mut PlayerState, rng: &mut GameRng, event: &mut GlitchEvent) {
    match kind {
        GlitchKind::ForbiddenAccess => {
            let locked: Vec<SkillId> = SkillId::FORBIDDEN_ACCESS
                .into_iter()
                .filter(|s| !player.knows_skill(*s))
                .collect();
            match rng.choose(&locked).copied() {
                Some(skill) => {
                    player.learn_skill(skill);
                    merge_corruption(event, player.register_system_error(rng));
                    event.magnitude = 1;
                    event.target = GlitchTarget::Skill(skill);
                    event.message = format!("Forbidden skill access granted. Skill unlocked: {skill}");
                }
                None => {
                    event.message = "Skill unlock failed - all forbidden skills already acquired.".to_string();
                }
            }
        }
        GlitchKind::HiddenStatLeak => {
            player.set_flag(StoryFlag::DiscoveredLuck);
            event.magnitude = player.stats.luck;
            event.target = GlitchTarget::Stat(Stat::Luck);
            event.message = format!("Hidden parameter exposed: LUCK = {}", player.stats.luck);
        }
        _ => {}
    }
}

fn apply_reality_shift(kind: GlitchKind, ctx: &mut GlitchContext<'_>, rng: &mut GameRng, event: &mut GlitchEvent) {
    match kind {
        GlitchKind::RealityRipple => {
            let amount = rng.range(5, 15);
            merge_corruption(event, ctx.player.modify_corruption(amount));
            merge_corruption(event, ctx.player.register_system_error(rng));
            event.magnitude = amount;
            event.target = GlitchTarget::Player;
            event.message = "Reality anchors destabilizing. The world ripples.".to_string();
        }
        GlitchKind::InventoryCorruption => {
            let held: Vec<(Item, u32)> = ctx
                .player
                .inventory
                .iter()
                .filter(|(item, _)| !item.is_story_item())
                .collect();
            let lose = rng.coin();
            let lost = rng.choose(&held).copied();
            let spawned = *rng.choose(&Item::CORRUPTED).unwrap_or(&Item::CorruptedData);

            if ctx.player.inventory.is_empty() {
                ctx.player.inventory.add(Item::VoidEcho, 1);
                event.target = GlitchTarget::Item(Item::VoidEcho);
                event.magnitude = 1;
                event.message = format!("Inventory data corrupted. Gained: {}", Item::VoidEcho);
            } else if let (true, Some((item, count))) = (lose, lost) {
                let removed = ctx.player.inventory.remove(item, count);
                merge_corruption(event, ctx.player.register_system_error(rng));
                event.target = GlitchTarget::Item(item);
                event.magnitude = -(removed as i32);
                event.message = format!("Inventory data corrupted. Lost item: {item}");
            } else {
                ctx.player.inventory.add(spawned, 1);
                merge_corruption(event, ctx.player.register_system_error(rng));
                event.target = GlitchTarget::Item(spawned);
                event.magnitude = 1;
                event.message = format!("Inventory data corrupted. Gained: {spawned}");
            }
        }
        GlitchKind::EnemyEvolution => {
            let evolved = match ctx.enemy.as_deref_mut() {
                Some(enemy) => enemy.evolve(rng).then(|| (enemy.max_hp, enemy.name.clone())),
                None => None,
            };
            if let Some((max_hp, name)) = evolved {
                event.target = GlitchTarget::Enemy;
                event.magnitude = max_hp;
                event.message = format!("Entity parameters overflow. {name} has evolved.");
            } else {
                event.message = "Entity parameters overflow, but nothing answers.".to_string();
            }
        }
        GlitchKind::IntegrityFracture => {
            let after = ctx.player.modify_integrity(-1);
            event.magnitude = -1;
            event.target = GlitchTarget::Player;
            event.message = format!("Reality kernel fracture. Integrity at {after}%.");
        }
        _ => {}
    }
}
