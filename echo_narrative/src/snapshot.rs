//! Session snapshots and the three save slots.
//!
//! A [`SessionSnapshot`] is everything needed to resume a session exactly,
//! generator position included. The lore graph is rebuilt on load; only the
//! keys of revealed facts are stored. Writing slots to disk is left to the
//! caller.

use echo_rules::{EndingId, GameConfig, GameError, GameResult, GameRng, PlayerState, QuestLog, TargetKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::dialogue::Oracle;
use crate::events::GameEvent;
use crate::session::{ActiveCombat, SessionId};
use crate::voice::SystemVoice;
use crate::world::WorldState;

pub const SNAPSHOT_VERSION: &str = "1.0";
pub const SLOT_COUNT: u8 = 3;

/// Full, serializable state of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: String,
    pub session_id: SessionId,
    pub config: GameConfig,
    pub rng: GameRng,
    pub player: PlayerState,
    pub quests: QuestLog,
    pub oracle: Oracle,
    pub voice: SystemVoice,
    pub world: WorldState,
    /// Keys of lore facts the player has already been shown.
    pub revealed: Vec<String>,
    pub recent_events: Vec<GameEvent>,
    pub combat: Option<ActiveCombat>,
    pub next_handle: u32,
    pub ending: Option<EndingId>,
    pub defeated: bool,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> GameResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| GameError::Snapshot(e.to_string()))
    }

    pub fn from_json(json: &str) -> GameResult<Self> {
        let snapshot: Self = serde_json::from_str(json).map_err(|e| GameError::Snapshot(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(GameError::Snapshot(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }
}

/// What a slot listing shows without loading the save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSummary {
    pub slot: u8,
    pub name: String,
    pub level: u32,
    pub hp: i32,
    pub max_hp: i32,
    pub corruption: i32,
    pub explorations: u32,
}

/// Three numbered save slots holding encoded snapshots.
#[derive(Debug, Clone, Default)]
pub struct SaveSlots {
    slots: BTreeMap<u8, String>,
}

impl SaveSlots {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(slot: u8) -> GameResult<()> {
        if (1..=SLOT_COUNT).contains(&slot) {
            Ok(())
        } else {
            Err(GameError::invalid_target(TargetKind::SaveSlot, slot))
        }
    }

    /// Store a snapshot, replacing whatever the slot held.
    pub fn save(&mut self, slot: u8, snapshot: &SessionSnapshot) -> GameResult<()> {
        Self::check(slot)?;
        let json = snapshot.to_json()?;
        self.slots.insert(slot, json);
        info!(slot, player = %snapshot.player.name, "game saved");
        Ok(())
    }

    /// `Ok(None)` for an empty slot.
    pub fn load(&self, slot: u8) -> GameResult<Option<SessionSnapshot>> {
        Self::check(slot)?;
        let Some(json) = self.slots.get(&slot) else {
            debug!(slot, "empty save slot");
            return Ok(None);
        };
        SessionSnapshot::from_json(json).map(Some)
    }

    pub fn clear(&mut self, slot: u8) -> GameResult<bool> {
        Self::check(slot)?;
        Ok(self.slots.remove(&slot).is_some())
    }

    /// The raw document in a slot, for writing to disk.
    pub fn encoded(&self, slot: u8) -> GameResult<Option<&str>> {
        Self::check(slot)?;
        Ok(self.slots.get(&slot).map(String::as_str))
    }

    /// Put a document read from disk into a slot. It must decode.
    pub fn import(&mut self, slot: u8, json: String) -> GameResult<()> {
        Self::check(slot)?;
        SessionSnapshot::from_json(&json)?;
        self.slots.insert(slot, json);
        Ok(())
    }

    /// Summaries of the occupied slots. Undecodable slots are skipped.
    pub fn list(&self) -> Vec<SlotSummary> {
        self.slots
            .iter()
            .filter_map(|(slot, json)| {
                let snapshot = SessionSnapshot::from_json(json).ok()?;
                let player = &snapshot.player;
                Some(SlotSummary {
                    slot: *slot,
                    name: player.name.clone(),
                    level: player.level,
                    hp: player.hp,
                    max_hp: player.max_hp,
                    corruption: player.corruption,
                    explorations: player.explorations,
                })
            })
            .collect()
    }
}
