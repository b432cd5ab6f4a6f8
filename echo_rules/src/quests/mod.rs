//! Quest tracking - objectives, progress counters and the quest state machine.
//!
//! ```text
//! Inactive --register--> Active --all objectives met--> Complete
//!                          |  ^                          (terminal)
//!              mark_glitched  restore
//!                          v  |
//!                        Glitched ----mark_failed----> Failed (terminal)
//! ```
//!
//! A glitched quest keeps counting progress but cannot complete. `restore` is
//! its single way back; it completes the quest on the spot if every objective
//! was met in the meantime.
//!
//! A duplication glitch leaves a phantom copy of a quest in the log. Phantoms
//! are frozen and glitched; restoring the log clears them.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{GameError, GameResult, TargetKind};
use crate::rng::GameRng;

/// Title prefix added by a record-corruption glitch.
pub const CORRUPTED_PREFIX: &str = "[CORRUPTED] ";
/// Title prefix of a phantom left by a duplication glitch.
pub const DUPLICATE_PREFIX: &str = "[DUPLICATE] ";

/// Identifier of a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuestId {
    /// Find the System Core Fragment.
    MainCoreFragment,
    /// Echoes of the Past.
    SideMemoryFragments,
    /// Embrace the Glitch.
    SideCorruption,
}

impl QuestId {
    pub const ALL: [QuestId; 3] = [
        QuestId::MainCoreFragment,
        QuestId::SideMemoryFragments,
        QuestId::SideCorruption,
    ];

    /// Stable key used in saves and lookups.
    pub fn key(&self) -> &'static str {
        match self {
            QuestId::MainCoreFragment => "main_core_fragment",
            QuestId::SideMemoryFragments => "side_memory_fragments",
            QuestId::SideCorruption => "side_corruption",
        }
    }

    pub fn is_main(&self) -> bool {
        matches!(self, QuestId::MainCoreFragment)
    }

    /// Build the stock definition of this quest, still inactive.
    pub fn create(&self) -> Quest {
        match self {
            QuestId::MainCoreFragment => Quest::new(
                *self,
                "Find the System Core Fragment",
                "The Oracle spoke of Core Fragments scattered across the ruins. \
                 Find one to unlock the truth of this world.",
                vec![
                    Objective::new("explore_ruins", "Explore the Forgotten Ruins", 5),
                    Objective::new("defeat_guardian", "Defeat the Corrupted Guardian", 1),
                    Objective::new("obtain_fragment", "Obtain a System Core Fragment", 1),
                ],
            ),
            QuestId::SideMemoryFragments => Quest::new(
                *self,
                "Echoes of the Past",
                "Collect Memory Shards to piece together the truth of what happened.",
                vec![Objective::new("collect_shards", "Collect Memory Shards", 5)],
            ),
            QuestId::SideCorruption => Quest::new(
                *self,
                "Embrace the Glitch",
                "The System's corruption may be a curse... or a gift. \
                 Reach 50% corruption to unlock forbidden knowledge.",
                vec![Objective::new("reach_corruption", "Reach 50% corruption", 50)],
            ),
        }
    }
}

impl std::fmt::Display for QuestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for QuestId {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestId::ALL
            .into_iter()
            .find(|id| id.key() == s.trim())
            .ok_or_else(|| GameError::invalid_target(TargetKind::Quest, s))
    }
}

/// Objective indices of the stock quests.
pub mod objective {
    pub const EXPLORE_RUINS: usize = 0;
    pub const DEFEAT_GUARDIAN: usize = 1;
    pub const OBTAIN_FRAGMENT: usize = 2;
    pub const COLLECT_SHARDS: usize = 0;
    pub const REACH_CORRUPTION: usize = 0;
}

/// One counter inside a quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub key: String,
    pub description: String,
    /// Always at least 1.
    pub target: u32,
    /// Never above `target`.
    pub progress: u32,
}

impl Objective {
    pub fn new(key: impl Into<String>, description: impl Into<String>, target: u32) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            target: target.max(1),
            progress: 0,
        }
    }

    pub fn is_met(&self) -> bool {
        self.progress >= self.target
    }
}

/// Lifecycle state of a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QuestState {
    #[default]
    Inactive,
    Active,
    Complete,
    Failed,
    /// Degraded and unreliable, but recoverable.
    Glitched,
}

impl QuestState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuestState::Complete | QuestState::Failed)
    }

    /// States in which objectives still count.
    pub fn counts_progress(&self) -> bool {
        matches!(self, QuestState::Active | QuestState::Glitched)
    }
}

impl std::fmt::Display for QuestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            QuestState::Inactive => "INACTIVE",
            QuestState::Active => "ACTIVE",
            QuestState::Complete => "COMPLETE",
            QuestState::Failed => "FAILED",
            QuestState::Glitched => "GLITCHED",
        };
        f.write_str(label)
    }
}

/// A quest and its objectives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    pub title: String,
    pub description: String,
    pub objectives: Vec<Objective>,
    pub state: QuestState,
    /// How many times a glitch has touched this quest.
    pub glitch_count: u32,
}

impl Quest {
    pub fn new(
        id: QuestId,
        title: impl Into<String>,
        description: impl Into<String>,
        objectives: Vec<Objective>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            objectives,
            state: QuestState::Inactive,
            glitch_count: 0,
        }
    }

    pub fn all_met(&self) -> bool {
        self.objectives.iter().all(Objective::is_met)
    }

    pub fn is_glitched(&self) -> bool {
        self.state == QuestState::Glitched
    }

    fn objective_mut(&mut self, index: usize) -> GameResult<&mut Objective> {
        let id = self.id;
        self.objectives
            .get_mut(index)
            .ok_or_else(|| GameError::invalid_target(TargetKind::Objective, format!("{id}#{index}")))
    }

    /// Complete the quest if it is active and every objective is met.
    fn try_complete(&mut self) -> bool {
        if self.state == QuestState::Active && self.all_met() {
            self.state = QuestState::Complete;
            return true;
        }
        false
    }
}

/// What a quest operation changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestUpdate {
    Unchanged,
    Activated(QuestId),
    Progressed {
        quest: QuestId,
        objective: usize,
        progress: u32,
        target: u32,
    },
    Completed(QuestId),
    Failed(QuestId),
    Glitched(QuestId),
    Restored(QuestId),
    /// A phantom copy of the quest appeared.
    Duplicated(QuestId),
}

impl QuestUpdate {
    /// The quest this update is about, if anything changed.
    pub fn quest(&self) -> Option<QuestId> {
        match self {
            QuestUpdate::Unchanged => None,
            QuestUpdate::Activated(id)
            | QuestUpdate::Completed(id)
            | QuestUpdate::Failed(id)
            | QuestUpdate::Glitched(id)
            | QuestUpdate::Restored(id)
            | QuestUpdate::Duplicated(id) => Some(*id),
            QuestUpdate::Progressed { quest, .. } => Some(*quest),
        }
    }
}

/// Quest glitch effects, applied through [`QuestLog::mutate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestMutation {
    /// Re-roll some objective targets and glitch the quest.
    MutateObjectives,
    /// Halve every progress counter.
    ReverseProgress,
    /// Mark the title corrupted and glitch the quest.
    CorruptRecord,
    /// The quest record is lost; it fails.
    Erase,
    /// Leave a frozen, glitched copy of the quest in the log.
    Duplicate,
}

/// All quests of a session, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestLog {
    quests: Vec<Quest>,
    #[serde(default)]
    phantoms: Vec<Quest>,
}

impl QuestLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a quest and activate it. Registering an id twice is a no-op.
    pub fn register(&mut self, mut quest: Quest) -> QuestUpdate {
        if self.contains(quest.id) {
            return QuestUpdate::Unchanged;
        }
        let id = quest.id;
        if quest.state == QuestState::Inactive {
            quest.state = QuestState::Active;
        }
        info!(quest = %id, title = %quest.title, "quest registered");
        self.quests.push(quest);
        QuestUpdate::Activated(id)
    }

    pub fn contains(&self, id: QuestId) -> bool {
        self.quests.iter().any(|q| q.id == id)
    }

    pub fn get(&self, id: QuestId) -> Option<&Quest> {
        self.quests.iter().find(|q| q.id == id)
    }

    fn get_mut(&mut self, id: QuestId) -> GameResult<&mut Quest> {
        self.quests
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or_else(|| GameError::invalid_target(TargetKind::Quest, id))
    }

    pub fn state(&self, id: QuestId) -> Option<QuestState> {
        self.get(id).map(|q| q.state)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quest> {
        self.quests.iter()
    }

    /// Quests whose objectives still count.
    pub fn open_ids(&self) -> Vec<QuestId> {
        self.quests
            .iter()
            .filter(|q| q.state.counts_progress())
            .map(|q| q.id)
            .collect()
    }

    pub fn ids_in_state(&self, state: QuestState) -> Vec<QuestId> {
        self.quests.iter().filter(|q| q.state == state).map(|q| q.id).collect()
    }

    /// Phantom copies left by duplication glitches.
    pub fn phantoms(&self) -> &[Quest] {
        &self.phantoms
    }

    /// Read-only copies for presentation layers, phantoms last.
    pub fn snapshots(&self) -> Vec<Quest> {
        self.quests.iter().chain(&self.phantoms).cloned().collect()
    }

    /// Add `amount` to an objective, clamped at its target.
    pub fn advance(&mut self, id: QuestId, objective: usize, amount: u32) -> GameResult<QuestUpdate> {
        let quest = self.get_mut(id)?;
        let current = quest.objective_mut(objective)?.progress;
        self.set_progress(id, objective, current.saturating_add(amount))
    }

    /// Raise an objective to an absolute value, for counters that mirror
    /// player state (shards held, corruption). Never lowers progress.
    pub fn raise_to(&mut self, id: QuestId, objective: usize, value: u32) -> GameResult<QuestUpdate> {
        let quest = self.get_mut(id)?;
        let current = quest.objective_mut(objective)?.progress;
        self.set_progress(id, objective, current.max(value))
    }

    fn set_progress(&mut self, id: QuestId, index: usize, value: u32) -> GameResult<QuestUpdate> {
        let quest = self.get_mut(id)?;
        if !quest.state.counts_progress() {
            quest.objective_mut(index)?;
            return Ok(QuestUpdate::Unchanged);
        }

        let objective = quest.objective_mut(index)?;
        let before = objective.progress;
        objective.progress = value.min(objective.target);
        let (progress, target) = (objective.progress, objective.target);

        if quest.try_complete() {
            info!(quest = %id, "quest complete");
            return Ok(QuestUpdate::Completed(id));
        }
        if progress == before {
            return Ok(QuestUpdate::Unchanged);
        }
        debug!(quest = %id, objective = index, progress, target, "quest progress");
        Ok(QuestUpdate::Progressed {
            quest: id,
            objective: index,
            progress,
            target,
        })
    }

    /// Fail an open quest. Terminal quests are left alone.
    pub fn mark_failed(&mut self, id: QuestId) -> GameResult<QuestUpdate> {
        let quest = self.get_mut(id)?;
        if !quest.state.counts_progress() {
            return Ok(QuestUpdate::Unchanged);
        }
        quest.state = QuestState::Failed;
        info!(quest = %id, "quest failed");
        Ok(QuestUpdate::Failed(id))
    }

    /// Glitch an active quest.
    pub fn mark_glitched(&mut self, id: QuestId) -> GameResult<QuestUpdate> {
        let quest = self.get_mut(id)?;
        if quest.state != QuestState::Active {
            return Ok(QuestUpdate::Unchanged);
        }
        quest.state = QuestState::Glitched;
        quest.glitch_count += 1;
        info!(quest = %id, "quest glitched");
        Ok(QuestUpdate::Glitched(id))
    }

    /// Return a glitched quest to active, completing it if every objective
    /// is already met.
    pub fn restore(&mut self, id: QuestId) -> GameResult<QuestUpdate> {
        let quest = self.get_mut(id)?;
        if quest.state != QuestState::Glitched {
            return Ok(QuestUpdate::Unchanged);
        }
        quest.state = QuestState::Active;
        if quest.try_complete() {
            info!(quest = %id, "quest restored and complete");
            return Ok(QuestUpdate::Completed(id));
        }
        info!(quest = %id, "quest restored");
        Ok(QuestUpdate::Restored(id))
    }

    /// Restore every glitched quest and clear the phantoms.
    pub fn restore_all(&mut self) -> Vec<QuestUpdate> {
        if !self.phantoms.is_empty() {
            debug!(count = self.phantoms.len(), "phantom quests cleared");
            self.phantoms.clear();
        }
        self.ids_in_state(QuestState::Glitched)
            .into_iter()
            .filter_map(|id| self.restore(id).ok())
            .collect()
    }

    /// Whether a mutation would change this quest.
    pub fn can_mutate(&self, id: QuestId, mutation: QuestMutation) -> bool {
        let Some(quest) = self.get(id) else {
            return false;
        };
        match mutation {
            QuestMutation::MutateObjectives | QuestMutation::CorruptRecord => quest.state == QuestState::Active,
            QuestMutation::ReverseProgress => {
                quest.state.counts_progress() && quest.objectives.iter().any(|o| o.progress > 1)
            }
            QuestMutation::Erase => quest.state.counts_progress() && !id.is_main(),
            QuestMutation::Duplicate => quest.state.counts_progress() && !self.phantoms.iter().any(|p| p.id == id),
        }
    }

    /// Apply a glitch mutation. Every random value is drawn before the quest
    /// is touched; a mutation that cannot apply returns `Unchanged`.
    pub fn mutate(&mut self, id: QuestId, mutation: QuestMutation, rng: &mut GameRng) -> GameResult<QuestUpdate> {
        if !self.contains(id) {
            return Err(GameError::invalid_target(TargetKind::Quest, id));
        }
        if !self.can_mutate(id, mutation) {
            return Ok(QuestUpdate::Unchanged);
        }

        match mutation {
            QuestMutation::MutateObjectives => {
                let quest = self.get_mut(id)?;
                let targets: Vec<Option<u32>> = quest
                    .objectives
                    .iter()
                    .map(|o| {
                        let reroll = rng.coin();
                        let upper = (o.target.saturating_mul(3)).min(i32::MAX as u32) as i32;
                        reroll.then(|| rng.range(1, upper) as u32)
                    })
                    .collect();
                for (objective, target) in quest.objectives.iter_mut().zip(targets) {
                    if let Some(target) = target {
                        objective.target = target.max(1);
                        objective.progress = objective.progress.min(objective.target);
                    }
                }
                self.mark_glitched(id)
            }
            QuestMutation::ReverseProgress => {
                let quest = self.get_mut(id)?;
                for objective in &mut quest.objectives {
                    objective.progress /= 2;
                }
                quest.glitch_count += 1;
                info!(quest = %id, "quest progress reversed");
                Ok(QuestUpdate::Progressed {
                    quest: id,
                    objective: 0,
                    progress: quest.objectives.first().map_or(0, |o| o.progress),
                    target: quest.objectives.first().map_or(0, |o| o.target),
                })
            }
            QuestMutation::CorruptRecord => {
                let quest = self.get_mut(id)?;
                if !quest.title.starts_with(CORRUPTED_PREFIX) {
                    quest.title = format!("{CORRUPTED_PREFIX}{}", quest.title);
                }
                self.mark_glitched(id)
            }
            QuestMutation::Erase => {
                let update = self.mark_failed(id)?;
                if let Ok(quest) = self.get_mut(id) {
                    quest.glitch_count += 1;
                }
                Ok(update)
            }
            QuestMutation::Duplicate => {
                let quest = self.get_mut(id)?;
                let mut phantom = quest.clone();
                phantom.title = format!("{DUPLICATE_PREFIX}{}", quest.title);
                phantom.state = QuestState::Glitched;
                phantom.glitch_count += 1;
                info!(quest = %id, "quest duplicated");
                self.phantoms.push(phantom);
                Ok(QuestUpdate::Duplicated(id))
            }
        }
    }

    /// Check every quest invariant. Used by tests and debug assertions.
    pub fn check_invariants(&self) -> Result<(), String> {
        for (i, quest) in self.quests.iter().enumerate() {
            if self.quests[..i].iter().any(|q| q.id == quest.id) {
                return Err(format!("duplicate quest {}", quest.id));
            }
            for objective in &quest.objectives {
                if objective.target == 0 {
                    return Err(format!("{}: objective {} has target 0", quest.id, objective.key));
                }
                if objective.progress > objective.target {
                    return Err(format!(
                        "{}: objective {} at {}/{}",
                        quest.id, objective.key, objective.progress, objective.target
                    ));
                }
            }
            if quest.state == QuestState::Active && quest.all_met() {
                return Err(format!("{}: active with every objective met", quest.id));
            }
        }
        for phantom in &self.phantoms {
            if phantom.state != QuestState::Glitched {
                return Err(format!("phantom of {} is {}", phantom.id, phantom.state));
            }
            if !self.contains(phantom.id) {
                return Err(format!("phantom of unknown quest {}", phantom.id));
            }
            if self.phantoms.iter().filter(|p| p.id == phantom.id).count() > 1 {
                return Err(format!("{} duplicated twice", phantom.id));
            }
            if phantom.objectives.iter().any(|o| o.target == 0 || o.progress > o.target) {
                return Err(format!("phantom of {} has a broken objective", phantom.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_with(id: QuestId) -> QuestLog {
        let mut log = QuestLog::new();
        log.register(id.create());
        log
    }

    #[test]
    fn test_register_activates_once() {
        let mut log = QuestLog::new();
        assert_eq!(log.register(QuestId::MainCoreFragment.create()), QuestUpdate::Activated(QuestId::MainCoreFragment));
        assert_eq!(log.register(QuestId::MainCoreFragment.create()), QuestUpdate::Unchanged);
        assert_eq!(log.state(QuestId::MainCoreFragment), Some(QuestState::Active));
        assert_eq!(log.iter().count(), 1);
    }

    #[test]
    fn test_completion_happens_exactly_once() {
        let mut log = log_with(QuestId::SideMemoryFragments);
        let id = QuestId::SideMemoryFragments;

        for _ in 0..4 {
            assert!(matches!(log.advance(id, 0, 1).unwrap(), QuestUpdate::Progressed { .. }));
        }
        assert_eq!(log.advance(id, 0, 1).unwrap(), QuestUpdate::Completed(id));
        assert_eq!(log.state(id), Some(QuestState::Complete));

        assert_eq!(log.advance(id, 0, 1).unwrap(), QuestUpdate::Unchanged);
        assert_eq!(log.advance(id, 0, 10).unwrap(), QuestUpdate::Unchanged);
        assert_eq!(log.get(id).unwrap().objectives[0].progress, 5);
    }

    #[test]
    fn test_progress_clamps_at_target() {
        let mut log = log_with(QuestId::MainCoreFragment);
        let id = QuestId::MainCoreFragment;
        log.advance(id, objective::EXPLORE_RUINS, 50).unwrap();
        let quest = log.get(id).unwrap();
        assert_eq!(quest.objectives[0].progress, 5);
        assert_eq!(quest.state, QuestState::Active);
        assert!(log.check_invariants().is_ok());
    }

    #[test]
    fn test_main_quest_needs_all_objectives() {
        let mut log = log_with(QuestId::MainCoreFragment);
        let id = QuestId::MainCoreFragment;
        log.advance(id, objective::EXPLORE_RUINS, 5).unwrap();
        log.advance(id, objective::DEFEAT_GUARDIAN, 1).unwrap();
        assert_eq!(log.advance(id, objective::OBTAIN_FRAGMENT, 1).unwrap(), QuestUpdate::Completed(id));
    }

    #[test]
    fn test_unknown_targets() {
        let mut log = log_with(QuestId::MainCoreFragment);
        assert!(matches!(
            log.advance(QuestId::SideCorruption, 0, 1),
            Err(GameError::InvalidTarget { kind: TargetKind::Quest, .. })
        ));
        assert!(matches!(
            log.advance(QuestId::MainCoreFragment, 9, 1),
            Err(GameError::InvalidTarget { kind: TargetKind::Objective, .. })
        ));
        assert!("side_nothing".parse::<QuestId>().is_err());
        assert_eq!("side_corruption".parse::<QuestId>().unwrap(), QuestId::SideCorruption);
    }

    #[test]
    fn test_raise_to_never_lowers() {
        let mut log = log_with(QuestId::SideCorruption);
        let id = QuestId::SideCorruption;
        log.raise_to(id, 0, 30).unwrap();
        assert_eq!(log.raise_to(id, 0, 10).unwrap(), QuestUpdate::Unchanged);
        assert_eq!(log.get(id).unwrap().objectives[0].progress, 30);
        assert_eq!(log.raise_to(id, 0, 64).unwrap(), QuestUpdate::Completed(id));
    }

    #[test]
    fn test_glitched_quest_counts_but_waits_for_restore() {
        let mut log = log_with(QuestId::SideMemoryFragments);
        let id = QuestId::SideMemoryFragments;
        log.advance(id, 0, 2).unwrap();
        assert_eq!(log.mark_glitched(id).unwrap(), QuestUpdate::Glitched(id));

        log.advance(id, 0, 3).unwrap();
        assert_eq!(log.state(id), Some(QuestState::Glitched));
        assert_eq!(log.get(id).unwrap().objectives[0].progress, 5);

        assert_eq!(log.restore(id).unwrap(), QuestUpdate::Completed(id));
        assert_eq!(log.state(id), Some(QuestState::Complete));
        assert_eq!(log.restore(id).unwrap(), QuestUpdate::Unchanged);
    }

    #[test]
    fn test_restore_without_completion() {
        let mut log = log_with(QuestId::MainCoreFragment);
        let id = QuestId::MainCoreFragment;
        log.mark_glitched(id).unwrap();
        assert_eq!(log.restore_all(), vec![QuestUpdate::Restored(id)]);
        assert_eq!(log.state(id), Some(QuestState::Active));
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut log = log_with(QuestId::SideCorruption);
        let id = QuestId::SideCorruption;
        assert_eq!(log.mark_failed(id).unwrap(), QuestUpdate::Failed(id));
        assert_eq!(log.mark_glitched(id).unwrap(), QuestUpdate::Unchanged);
        assert_eq!(log.restore(id).unwrap(), QuestUpdate::Unchanged);
        assert_eq!(log.advance(id, 0, 50).unwrap(), QuestUpdate::Unchanged);
        assert_eq!(log.state(id), Some(QuestState::Failed));
    }

    #[test]
    fn test_mutations_keep_invariants() {
        let mut rng = GameRng::new(99);
        for round in 0..200 {
            let mut log = QuestLog::new();
            for id in QuestId::ALL {
                log.register(id.create());
            }
            log.advance(QuestId::MainCoreFragment, 0, 4).unwrap();
            log.advance(QuestId::SideMemoryFragments, 0, 4).unwrap();
            let mutation = [
                QuestMutation::MutateObjectives,
                QuestMutation::ReverseProgress,
                QuestMutation::CorruptRecord,
                QuestMutation::Erase,
                QuestMutation::Duplicate,
            ][round % 5];
            for id in QuestId::ALL {
                log.mutate(id, mutation, &mut rng).unwrap();
                assert!(log.check_invariants().is_ok(), "{:?}", log.check_invariants());
            }
        }
    }

    #[test]
    fn test_erase_spares_main_quest() {
        let mut rng = GameRng::new(1);
        let mut log = log_with(QuestId::MainCoreFragment);
        assert_eq!(
            log.mutate(QuestId::MainCoreFragment, QuestMutation::Erase, &mut rng).unwrap(),
            QuestUpdate::Unchanged
        );
        assert_eq!(log.state(QuestId::MainCoreFragment), Some(QuestState::Active));
    }

    #[test]
    fn test_corrupt_record_prefixes_title_once() {
        let mut rng = GameRng::new(1);
        let mut log = log_with(QuestId::SideCorruption);
        log.mutate(QuestId::SideCorruption, QuestMutation::CorruptRecord, &mut rng).unwrap();
        let quest = log.get(QuestId::SideCorruption).unwrap();
        assert_eq!(quest.title, "[CORRUPTED] Embrace the Glitch");
        assert!(quest.is_glitched());
    }

    #[test]
    fn test_duplicate_leaves_one_frozen_phantom() {
        let mut rng = GameRng::new(1);
        let id = QuestId::SideMemoryFragments;
        let mut log = log_with(id);
        log.advance(id, 0, 2).unwrap();

        assert_eq!(log.mutate(id, QuestMutation::Duplicate, &mut rng).unwrap(), QuestUpdate::Duplicated(id));
        assert_eq!(log.mutate(id, QuestMutation::Duplicate, &mut rng).unwrap(), QuestUpdate::Unchanged);
        assert_eq!(log.state(id), Some(QuestState::Active));

        let phantom = &log.phantoms()[0];
        assert_eq!(phantom.title, "[DUPLICATE] Echoes of the Past");
        assert!(phantom.is_glitched());
        assert_eq!(phantom.objectives[0].progress, 2);

        // The real quest moves on; the phantom stays where it was copied.
        log.advance(id, 0, 3).unwrap();
        assert_eq!(log.state(id), Some(QuestState::Complete));
        assert_eq!(log.phantoms()[0].objectives[0].progress, 2);
        assert_eq!(log.snapshots().len(), 2);
        assert!(log.check_invariants().is_ok());

        log.restore_all();
        assert!(log.phantoms().is_empty());
        assert_eq!(log.snapshots().len(), 1);
    }
}
