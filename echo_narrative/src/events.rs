//! Game events and the result types of the session actions.
//!
//! [`GameEvent`] is the narrative's view of what just happened; recent events
//! feed lore recall. The `*Result` types are what presentation layers get back
//! from each action.

use echo_rules::{
    ArchetypeId, CombatEvent, CombatOutcome, CombatStep, EndingId, EnemyInstance, GlitchCategory, GlitchEvent, Item,
    QuestId, QuestUpdate, StoryFlag,
};
use serde::{Deserialize, Serialize};

use crate::dialogue::{DialogueOutcome, DialoguePrompt};
use crate::epilogue::Epilogue;
use crate::exploration::Discovery;
use crate::knowledge_base::Tag;
use crate::lore::LoreId;

/// Something that happened in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    LoreDiscovered(LoreId),
    EnemyDefeated(ArchetypeId),
    ItemFound(Item),
    GlitchApplied(GlitchCategory),
    CorruptionThreshold(i32),
    FlagSet(StoryFlag),
    QuestChanged(QuestId),
    OracleMet,
}

impl GameEvent {
    /// Tags to seed lore recall with.
    pub fn to_tags(&self) -> Vec<Tag> {
        match self {
            GameEvent::LoreDiscovered(id) => vec![Tag::lore(*id)],
            GameEvent::EnemyDefeated(id) => vec![Tag::enemy(*id)],
            GameEvent::ItemFound(item) => vec![Tag::item(*item)],
            GameEvent::GlitchApplied(_) => vec![Tag::concept("glitch")],
            GameEvent::CorruptionThreshold(_) => vec![Tag::concept("corruption"), Tag::concept("glitch")],
            GameEvent::FlagSet(flag) => vec![Tag::flag(*flag)],
            GameEvent::QuestChanged(id) => vec![Tag::quest(*id)],
            GameEvent::OracleMet => vec![Tag::concept("memory")],
        }
    }
}

/// Refers to one combat of a session. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatHandle(pub u32);

impl std::fmt::Display for CombatHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "combat#{}", self.0)
    }
}

/// A fight that just began.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatStart {
    pub handle: CombatHandle,
    pub enemy: EnemyInstance,
    /// The System's warning, possibly glitched.
    pub warning: String,
    /// Set when the fight opened unstable.
    pub opening: Option<CombatEvent>,
}

/// A lore fragment surfacing, while exploring or in a dream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoreVision {
    pub fragment: LoreId,
    pub title: String,
    pub text: String,
    /// First time this fragment was seen.
    pub new: bool,
    /// Set when the discovery raised intelligence.
    pub intelligence_grew: bool,
}

/// What one exploration turned up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExplorationEvent {
    Combat(CombatStart),
    Discovery(Discovery),
    Lore(LoreVision),
    /// Reality slipped; the glitch itself is in the result's glitch list.
    Anomaly { stability_lost: i32, reality_stability: i32 },
    Empty { message: String, mp_restored: i32 },
    Oracle(DialoguePrompt),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationResult {
    /// Explorations so far, this one included.
    pub exploration: u32,
    pub event: ExplorationEvent,
    pub glitches: Vec<GlitchEvent>,
    pub quest_updates: Vec<QuestUpdate>,
    pub system_messages: Vec<String>,
    /// The ending the player would get right now, if any is reachable.
    pub ending_available: Option<EndingId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatTurnResult {
    pub handle: CombatHandle,
    pub step: CombatStep,
    /// The enemy after the turn.
    pub enemy: EnemyInstance,
    /// Final outcome, including one forced by a glitch after the step.
    pub outcome: Option<CombatOutcome>,
    pub glitches: Vec<GlitchEvent>,
    pub quest_updates: Vec<QuestUpdate>,
    pub system_messages: Vec<String>,
    /// Set when the player died.
    pub game_over: Option<Epilogue>,
    pub ending_available: Option<EndingId>,
}

/// What broke a rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RestInterruption {
    Combat(CombatStart),
    Anomaly { stability_lost: i32, reality_stability: i32 },
    Vision(LoreVision),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestResult {
    pub hp_restored: i32,
    pub mp_restored: i32,
    pub interruption: Option<RestInterruption>,
    pub glitches: Vec<GlitchEvent>,
    pub quest_updates: Vec<QuestUpdate>,
    pub system_messages: Vec<String>,
    pub ending_available: Option<EndingId>,
}

/// An answer given to the Oracle and what followed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueResult {
    pub outcome: DialogueOutcome,
    pub glitches: Vec<GlitchEvent>,
    pub quest_updates: Vec<QuestUpdate>,
    pub system_messages: Vec<String>,
    pub ending_available: Option<EndingId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tags() {
        assert_eq!(
            GameEvent::EnemyDefeated(ArchetypeId::CorruptedGuardian).to_tags(),
            vec![Tag::enemy(ArchetypeId::CorruptedGuardian)]
        );
        assert_eq!(GameEvent::LoreDiscovered(LoreId::TheCycle).to_tags(), vec![Tag::lore(LoreId::TheCycle)]);
        assert!(GameEvent::CorruptionThreshold(50).to_tags().contains(&Tag::concept("corruption")));
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(CombatHandle(3).to_string(), "combat#3");
    }
}
