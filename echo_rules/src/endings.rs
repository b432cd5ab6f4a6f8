//! Ending resolution.
//!
//! Five rule-sets are checked from most to least specific; the first match
//! wins, so exactly one ending is ever selected:
//!
//! 1. True Ending
//! 2. Godless Freedom
//! 3. System Takeover
//! 4. World Collapse
//! 5. Survival

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entities::{PlayerState, StoryFlag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndingId {
    TrueEnding,
    GodlessFreedom,
    SystemTakeover,
    WorldCollapse,
    Survival,
}

impl EndingId {
    /// Evaluation order.
    pub const PRIORITY: [EndingId; 5] = [
        EndingId::TrueEnding,
        EndingId::GodlessFreedom,
        EndingId::SystemTakeover,
        EndingId::WorldCollapse,
        EndingId::Survival,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            EndingId::TrueEnding => "True Ending: Restoration",
            EndingId::GodlessFreedom => "Godless Freedom",
            EndingId::SystemTakeover => "System Takeover",
            EndingId::WorldCollapse => "World Collapse",
            EndingId::Survival => "Survival",
        }
    }

    /// Whether `ctx` satisfies this ending's rule-set on its own.
    pub fn is_met(&self, ctx: &EndingContext) -> bool {
        match self {
            EndingId::TrueEnding => {
                ctx.has_core_fragment
                    && ctx.memory_shards >= 5
                    && ctx.learned_truth
                    && ctx.met_oracle
                    && ctx.level >= 8
                    && (30..=60).contains(&ctx.corruption)
            }
            EndingId::GodlessFreedom => {
                ctx.corruption <= 30 && ctx.has_core_fragment && ctx.met_oracle && ctx.level >= 7
            }
            EndingId::SystemTakeover => ctx.corruption >= 80 && ctx.has_core_fragment,
            EndingId::WorldCollapse => ctx.system_integrity <= 0,
            EndingId::Survival => ctx.level >= 10 && !ctx.has_core_fragment,
        }
    }
}

impl std::fmt::Display for EndingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// The slice of final state that endings are judged on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EndingContext {
    pub level: u32,
    pub corruption: i32,
    pub system_integrity: i32,
    pub has_core_fragment: bool,
    pub memory_shards: u32,
    pub met_oracle: bool,
    pub learned_truth: bool,
}

impl EndingContext {
    pub fn from_player(player: &PlayerState) -> Self {
        Self {
            level: player.level,
            corruption: player.corruption,
            system_integrity: player.system_integrity,
            has_core_fragment: player.has_core_fragment(),
            memory_shards: player.memory_shards(),
            met_oracle: player.has_flag(StoryFlag::MetOracle),
            learned_truth: player.has_flag(StoryFlag::LearnedTruth),
        }
    }
}

/// First ending whose rule-set matches, if any.
pub fn evaluate(ctx: &EndingContext) -> Option<EndingId> {
    EndingId::PRIORITY.into_iter().find(|ending| ending.is_met(ctx))
}

/// Pick the ending for an explicit end of run. Falls back to Survival when no
/// rule-set matches.
pub fn resolve_final(ctx: &EndingContext) -> EndingId {
    let ending = evaluate(ctx).unwrap_or(EndingId::Survival);
    info!(%ending, level = ctx.level, corruption = ctx.corruption, "ending resolved");
    ending
}
