//! Enemy archetypes, scaling, and encounter selection.
//!
//! The catalog is immutable data built once and referenced by
//! [`ArchetypeId`]. [`EnemyCatalog::instantiate`] is deterministic;
//! randomness only enters through encounter selection, evolution and drops.

mod instance;

pub use instance::*;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::entities::Item;
use crate::error::{GameError, TargetKind};
use crate::mechanics::DamageTag;
use crate::rng::GameRng;

/// Identifier of an enemy template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchetypeId {
    CorruptedSlime,
    RuinsSkeleton,
    GlitchedWolf,
    SystemWraith,
    CorruptedGuardian,
}

impl ArchetypeId {
    pub const ALL: [ArchetypeId; 5] = [
        ArchetypeId::CorruptedSlime,
        ArchetypeId::RuinsSkeleton,
        ArchetypeId::GlitchedWolf,
        ArchetypeId::SystemWraith,
        ArchetypeId::CorruptedGuardian,
    ];

    pub fn archetype(&self) -> &'static Archetype {
        match self {
            ArchetypeId::CorruptedSlime => &ARCHETYPES[0],
            ArchetypeId::RuinsSkeleton => &ARCHETYPES[1],
            ArchetypeId::GlitchedWolf => &ARCHETYPES[2],
            ArchetypeId::SystemWraith => &ARCHETYPES[3],
            ArchetypeId::CorruptedGuardian => &ARCHETYPES[4],
        }
    }

    pub fn name(&self) -> &'static str {
        self.archetype().name
    }
}

impl std::fmt::Display for ArchetypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ArchetypeId {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        ArchetypeId::ALL
            .into_iter()
            .find(|id| id.name().to_ascii_lowercase().replace(' ', "_") == key)
            .ok_or_else(|| GameError::invalid_target(TargetKind::Archetype, s))
    }
}

/// Something an enemy can do on its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyMove {
    /// A regular attack.
    Strike,
    /// An attack scaled by a percentage.
    HeavyBlow { percent: u32 },
    /// A weak hit that also drains MP.
    Siphon { mp: i32 },
}

/// Threat rating shown on analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
    Critical,
    Extreme,
}

/// Static enemy template.
#[derive(Debug, Clone, PartialEq)]
pub struct Archetype {
    pub id: ArchetypeId,
    pub name: &'static str,
    pub base_hp: i32,
    pub hp_per_level: i32,
    pub base_attack: i32,
    pub attack_per_level: i32,
    pub base_defense: i32,
    pub defense_per_level: i32,
    pub base_agility: i32,
    pub agility_per_level: i32,
    pub base_intelligence: i32,
    pub intelligence_per_level: i32,
    pub base_xp: u32,
    pub xp_per_level: u32,
    /// Relative encounter weight; rarer archetypes weigh less.
    pub weight: u32,
    pub min_player_level: u32,
    pub min_encounters: u32,
    pub weakness: Option<DamageTag>,
    pub resistance: Option<DamageTag>,
    /// `(item, threshold)` rows sorted by ascending threshold; a single
    /// 1-100 roll takes the first row it falls under.
    pub drops: &'static [(Item, u32)],
    pub moves: &'static [(EnemyMove, u32)],
    pub threat: ThreatLevel,
    pub origin: &'static str,
}

impl Archetype {
    pub fn is_boss(&self) -> bool {
        self.id == ArchetypeId::CorruptedGuardian
    }

    /// Whether this archetype may appear in a random encounter.
    pub fn is_eligible(&self, player_level: u32, encounter_count: u32) -> bool {
        player_level >= self.min_player_level && encounter_count >= self.min_encounters
    }
}

/// Encounter count after which pressure stops growing.
const MAX_PRESSURE: u32 = 5;
/// Encounters per pressure step.
const PRESSURE_STEP: u32 = 10;

pub static ARCHETYPES: [Archetype; 5] = [
    Archetype {
        id: ArchetypeId::CorruptedSlime,
        name: "Corrupted Slime",
        base_hp: 30,
        hp_per_level: 10,
        base_attack: 5,
        attack_per_level: 2,
        base_defense: 1,
        defense_per_level: 1,
        base_agility: 4,
        agility_per_level: 1,
        base_intelligence: 2,
        intelligence_per_level: 0,
        base_xp: 20,
        xp_per_level: 5,
        weight: 40,
        min_player_level: 1,
        min_encounters: 0,
        weakness: Some(DamageTag::Physical),
        resistance: Some(DamageTag::Void),
        drops: &[
            (Item::SystemFragment, 10),
            (Item::CorruptedGel, 40),
            (Item::SlimeCore, 60),
        ],
        moves: &[(EnemyMove::Strike, 1)],
        threat: ThreatLevel::Low,
        origin: "Failed system restoration attempt",
    },
    Archetype {
        id: ArchetypeId::RuinsSkeleton,
        name: "Ruins Skeleton",
        base_hp: 40,
        hp_per_level: 12,
        base_attack: 8,
        attack_per_level: 3,
        base_defense: 3,
        defense_per_level: 1,
        base_agility: 6,
        agility_per_level: 1,
        base_intelligence: 4,
        intelligence_per_level: 1,
        base_xp: 30,
        xp_per_level: 7,
        weight: 35,
        min_player_level: 1,
        min_encounters: 0,
        weakness: Some(DamageTag::Mental),
        resistance: None,
        drops: &[
            (Item::MemoryShard, 15),
            (Item::RustedBlade, 30),
            (Item::AncientBone, 70),
        ],
        moves: &[
            (EnemyMove::Strike, 3),
            (EnemyMove::HeavyBlow { percent: 130 }, 1),
        ],
        threat: ThreatLevel::Medium,
        origin: "Remnant of the old civilization",
    },
    Archetype {
        id: ArchetypeId::GlitchedWolf,
        name: "Glitched Wolf",
        base_hp: 50,
        hp_per_level: 15,
        base_attack: 10,
        attack_per_level: 4,
        base_defense: 2,
        defense_per_level: 1,
        base_agility: 12,
        agility_per_level: 2,
        base_intelligence: 3,
        intelligence_per_level: 0,
        base_xp: 40,
        xp_per_level: 10,
        weight: 25,
        min_player_level: 1,
        min_encounters: 0,
        weakness: Some(DamageTag::System),
        resistance: None,
        drops: &[
            (Item::SystemFragment, 20),
            (Item::GlitchCrystal, 35),
            (Item::WolfPelt, 50),
        ],
        moves: &[
            (EnemyMove::Strike, 2),
            (EnemyMove::HeavyBlow { percent: 120 }, 1),
        ],
        threat: ThreatLevel::High,
        origin: "Reality corruption manifestation",
    },
    Archetype {
        id: ArchetypeId::SystemWraith,
        name: "System Wraith",
        base_hp: 100,
        hp_per_level: 20,
        base_attack: 15,
        attack_per_level: 5,
        base_defense: 5,
        defense_per_level: 1,
        base_agility: 10,
        agility_per_level: 2,
        base_intelligence: 14,
        intelligence_per_level: 2,
        base_xp: 100,
        xp_per_level: 20,
        weight: 10,
        min_player_level: 3,
        min_encounters: 0,
        weakness: None,
        resistance: Some(DamageTag::Physical),
        drops: &[
            (Item::MemoryShard, 30),
            (Item::WraithEssence, 50),
            (Item::SystemFragment, 70),
        ],
        moves: &[
            (EnemyMove::Strike, 2),
            (EnemyMove::Siphon { mp: 8 }, 1),
        ],
        threat: ThreatLevel::Critical,
        origin: "Corrupted System Administrator",
    },
    Archetype {
        id: ArchetypeId::CorruptedGuardian,
        name: "Corrupted Guardian",
        base_hp: 200,
        hp_per_level: 30,
        base_attack: 20,
        attack_per_level: 6,
        base_defense: 8,
        defense_per_level: 2,
        base_agility: 8,
        agility_per_level: 1,
        base_intelligence: 10,
        intelligence_per_level: 1,
        base_xp: 200,
        xp_per_level: 40,
        weight: 5,
        min_player_level: 5,
        min_encounters: 10,
        weakness: Some(DamageTag::Void),
        resistance: Some(DamageTag::System),
        drops: &[(Item::MemoryShard, 40), (Item::GuardianPlate, 100)],
        moves: &[
            (EnemyMove::Strike, 3),
            (EnemyMove::HeavyBlow { percent: 150 }, 1),
            (EnemyMove::Siphon { mp: 10 }, 1),
        ],
        threat: ThreatLevel::Extreme,
        origin: "Failed world guardian protocol",
    },
];

/// Read-only access to the archetype table.
#[derive(Debug, Clone, Copy)]
pub struct EnemyCatalog {
    archetypes: &'static [Archetype],
}

impl Default for EnemyCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl EnemyCatalog {
    pub fn standard() -> Self {
        Self {
            archetypes: &ARCHETYPES,
        }
    }

    pub fn get(&self, id: ArchetypeId) -> &'static Archetype {
        self.archetypes
            .iter()
            .find(|a| a.id == id)
            .unwrap_or_else(|| id.archetype())
    }

    pub fn all(&self) -> &'static [Archetype] {
        self.archetypes
    }

    /// Archetypes allowed in a random encounter at this point of the run.
    pub fn eligible(&self, player_level: u32, encounter_count: u32) -> Vec<&'static Archetype> {
        self.archetypes
            .iter()
            .filter(|a| a.is_eligible(player_level, encounter_count))
            .collect()
    }

    /// Build a concrete enemy. Deterministic for the same inputs; HP never
    /// decreases as `player_level` rises.
    pub fn instantiate(&self, id: ArchetypeId, player_level: u32, encounter_count: u32) -> EnemyInstance {
        let archetype = self.get(id);
        let level = player_level.max(1);
        let lvl = level as i32;
        let pressure = (encounter_count / PRESSURE_STEP).min(MAX_PRESSURE) as i32;

        let max_hp = archetype.base_hp + archetype.hp_per_level * lvl + pressure * archetype.hp_per_level / 2;

        EnemyInstance {
            archetype: id,
            name: archetype.name.to_string(),
            level,
            hp: max_hp,
            max_hp,
            attack: archetype.base_attack + archetype.attack_per_level * lvl,
            defense: archetype.base_defense + archetype.defense_per_level * lvl,
            agility: archetype.base_agility + archetype.agility_per_level * lvl,
            intelligence: archetype.base_intelligence + archetype.intelligence_per_level * lvl,
            xp_reward: archetype.base_xp + archetype.xp_per_level * level,
            analyzed: false,
            evolved: false,
        }
    }

    /// Weighted pick among eligible archetypes.
    pub fn roll_archetype(&self, rng: &mut GameRng, player_level: u32, encounter_count: u32) -> ArchetypeId {
        let pool = self.eligible(player_level, encounter_count);
        let weights: Vec<u32> = pool.iter().map(|a| a.weight).collect();
        rng.weighted_index(&weights)
            .map(|i| pool[i].id)
            .unwrap_or(ArchetypeId::CorruptedSlime)
    }

    /// Pick and build a random encounter, with a -1..=+1 level jitter.
    pub fn roll_encounter(&self, rng: &mut GameRng, player_level: u32, encounter_count: u32) -> EnemyInstance {
        let id = self.roll_archetype(rng, player_level, encounter_count);
        let jitter = rng.range(-1, 1);
        let level = (player_level as i32 + jitter).max(1) as u32;
        self.instantiate(id, level, encounter_count)
    }
}
