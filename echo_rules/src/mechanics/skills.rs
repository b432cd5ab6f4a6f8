//! The skill book.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::DamageTag;
use crate::error::{GameError, TargetKind};

/// Identifier of a player skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillId {
    BasicAttack,
    VoidStrike,
    SystemHack,
    RealityTear,
    MemoryDrain,
    CorruptedHealing,
}

impl SkillId {
    /// Skills the System can grant through a skill-unlock glitch.
    pub const FORBIDDEN_ACCESS: [SkillId; 5] = [
        SkillId::VoidStrike,
        SkillId::SystemHack,
        SkillId::RealityTear,
        SkillId::MemoryDrain,
        SkillId::CorruptedHealing,
    ];

    /// Static definition of this skill.
    pub fn def(&self) -> &'static SkillDef {
        match self {
            SkillId::BasicAttack => &SKILL_BOOK[0],
            SkillId::VoidStrike => &SKILL_BOOK[1],
            SkillId::SystemHack => &SKILL_BOOK[2],
            SkillId::RealityTear => &SKILL_BOOK[3],
            SkillId::MemoryDrain => &SKILL_BOOK[4],
            SkillId::CorruptedHealing => &SKILL_BOOK[5],
        }
    }

    pub fn name(&self) -> &'static str {
        self.def().name
    }
}

impl std::fmt::Display for SkillId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SkillId {
    type Err = GameError;

    /// Accepts the display name or a snake_case id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        SKILL_BOOK
            .iter()
            .find(|def| def.name.to_ascii_lowercase().replace(' ', "_") == key)
            .map(|def| def.id)
            .ok_or_else(|| GameError::invalid_target(TargetKind::Skill, s))
    }
}

/// What a skill does when it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillEffect {
    /// A regular attack roll.
    Strike,
    /// An attack roll scaled by a percentage.
    EmpoweredStrike { percent: u32 },
    /// Fixed damage of INT times a percentage.
    IntellectBlast { percent: u32 },
    /// INT damage; heals the caster for half of the damage dealt.
    Drain,
    /// Lowers the enemy's defense and attack.
    Debuff { defense: i32, attack: i32 },
    /// Heals a random amount in the given range.
    Heal { min: i32, max: i32 },
}

/// Static definition of a skill.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillDef {
    pub id: SkillId,
    pub name: &'static str,
    pub mp_cost: i32,
    pub effect: SkillEffect,
    pub tag: DamageTag,
    /// Corruption added on use. Non-zero marks the skill as forbidden.
    pub corruption: i32,
    /// System integrity consumed on use.
    pub integrity_cost: i32,
}

impl SkillDef {
    pub fn is_forbidden(&self) -> bool {
        self.corruption > 0
    }
}

/// All skills, indexed by [`SkillId::def`].
pub static SKILL_BOOK: [SkillDef; 6] = [
    SkillDef {
        id: SkillId::BasicAttack,
        name: "Basic Attack",
        mp_cost: 0,
        effect: SkillEffect::Strike,
        tag: DamageTag::Physical,
        corruption: 0,
        integrity_cost: 0,
    },
    SkillDef {
        id: SkillId::VoidStrike,
        name: "Void Strike",
        mp_cost: 15,
        effect: SkillEffect::EmpoweredStrike { percent: 150 },
        tag: DamageTag::Void,
        corruption: 2,
        integrity_cost: 0,
    },
    SkillDef {
        id: SkillId::SystemHack,
        name: "System Hack",
        mp_cost: 20,
        effect: SkillEffect::Debuff {
            defense: 5,
            attack: 3,
        },
        tag: DamageTag::System,
        corruption: 5,
        integrity_cost: 0,
    },
    SkillDef {
        id: SkillId::RealityTear,
        name: "Reality Tear",
        mp_cost: 25,
        effect: SkillEffect::IntellectBlast { percent: 200 },
        tag: DamageTag::System,
        corruption: 8,
        integrity_cost: 1,
    },
    SkillDef {
        id: SkillId::MemoryDrain,
        name: "Memory Drain",
        mp_cost: 18,
        effect: SkillEffect::Drain,
        tag: DamageTag::Mental,
        corruption: 0,
        integrity_cost: 0,
    },
    SkillDef {
        id: SkillId::CorruptedHealing,
        name: "Corrupted Healing",
        mp_cost: 12,
        effect: SkillEffect::Heal { min: 20, max: 40 },
        tag: DamageTag::Void,
        corruption: 3,
        integrity_cost: 0,
    },
];
