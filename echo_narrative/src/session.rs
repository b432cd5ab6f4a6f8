//! The game session - the single owner of all state and the action API.
//!
//! Presentation layers drive a [`GameSession`] through its actions and read
//! state back through snapshots. Every action either runs to completion or
//! fails without touching state.
//!
//! After each action the session settles the world in a fixed order:
//!
//! 1. **Corruption**: each configured threshold crossed for the first time
//!    fires a glitch, which may push corruption over the next one
//! 2. **Side quests**: registered once their trigger holds, then synced to
//!    the shard count and corruption level
//! 3. **Endings**: the ending the player would get now is reported, but the
//!    run only ends through [`GameSession::attempt_ending`]

use echo_rules::{
    evaluate, objective, resolve_final, ArchetypeId, Combat, CombatAction, CombatOutcome, EndingContext, EndingId,
    EnemyCatalog, GameConfig, GameError, GameResult, GameRng, GlitchContext, GlitchEngine, GlitchEvent,
    GlitchTrigger, GrowthAction, Item, PlayerState, PlayerStatus, Quest, QuestId, QuestLog, QuestUpdate, StoryFlag,
    TargetKind,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dialogue::{DialogueChoice, DialoguePrompt, Oracle, OracleScene};
use crate::epilogue::{epilogue, game_over, Epilogue};
use crate::events::{
    CombatHandle, CombatStart, CombatTurnResult, DialogueResult, ExplorationEvent, ExplorationResult, GameEvent,
    LoreVision, RestInterruption, RestResult,
};
use crate::exploration::{discover, roll_event, wander, ExplorationKind};
use crate::knowledge_base::KnowledgeGraph;
use crate::lore::{lore_graph, pick_fragment};
use crate::recall::{situation_tags, Recall};
use crate::snapshot::{SessionSnapshot, SNAPSHOT_VERSION};
use crate::voice::{Register, SystemVoice};
use crate::world::WorldState;

pub const PLAYER_NAME: &str = "Unknown";
/// Events kept for lore recall.
pub const RECENT_EVENTS: usize = 8;
pub const REST_INTERRUPT_CHANCE: u32 = 20;
/// Corruption at which the corruption side quest appears.
pub const SIDE_CORRUPTION_AT: i32 = 25;

/// Unique identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fight in progress and the handle it was issued under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveCombat {
    pub handle: CombatHandle,
    pub combat: Combat,
}

/// Side effects gathered while an action settles.
#[derive(Debug, Default)]
struct Aftermath {
    glitches: Vec<GlitchEvent>,
    quest_updates: Vec<QuestUpdate>,
    messages: Vec<String>,
}

/// One playthrough.
#[derive(Debug, Clone)]
pub struct GameSession {
    id: SessionId,
    config: GameConfig,
    rng: GameRng,
    player: PlayerState,
    quests: QuestLog,
    glitches: GlitchEngine,
    catalog: EnemyCatalog,
    oracle: Oracle,
    voice: SystemVoice,
    lore: KnowledgeGraph,
    recall: Recall,
    world: WorldState,
    recent: Vec<GameEvent>,
    combat: Option<ActiveCombat>,
    next_handle: u32,
    ending: Option<EndingId>,
    finale: Option<Epilogue>,
}

impl GameSession {
    /// Start a new game with the shipped balance. Without a seed the
    /// generator is seeded from entropy.
    pub fn new_game(seed: Option<u64>) -> Self {
        Self::with_config(GameConfig::default(), seed)
    }

    pub fn with_config(config: GameConfig, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(GameRng::from_entropy, GameRng::new);
        let mut quests = QuestLog::new();
        quests.register(QuestId::MainCoreFragment.create());

        let session = Self {
            id: SessionId::new(),
            player: PlayerState::new(PLAYER_NAME, &config),
            glitches: GlitchEngine::new(config.glitch.clone()),
            catalog: EnemyCatalog::standard(),
            oracle: Oracle::new(),
            voice: SystemVoice::new(),
            lore: lore_graph(),
            recall: Recall::default(),
            world: WorldState::new(),
            recent: Vec::new(),
            combat: None,
            next_handle: 1,
            ending: None,
            finale: None,
            quests,
            config,
            rng,
        };
        info!(session = %session.id, seed = session.rng.seed(), "new game");
        session
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn oracle(&self) -> &Oracle {
        &self.oracle
    }

    pub fn voice(&self) -> &SystemVoice {
        &self.voice
    }

    pub fn lore(&self) -> &KnowledgeGraph {
        &self.lore
    }

    pub fn combat(&self) -> Option<&ActiveCombat> {
        self.combat.as_ref()
    }

    pub fn ending(&self) -> Option<EndingId> {
        self.ending
    }

    /// Closing text once the run is over, by ending or by death.
    pub fn epilogue(&self) -> Option<&Epilogue> {
        self.finale.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.finale.is_some()
    }

    pub fn get_status(&self) -> PlayerStatus {
        self.player.status()
    }

    pub fn get_quests(&self) -> Vec<Quest> {
        self.quests.snapshots()
    }

    /// The ending the player would reach if the run ended now, if any.
    pub fn ending_available(&self) -> Option<EndingId> {
        evaluate(&EndingContext::from_player(&self.player))
    }

    // ---- actions ----

    /// Walk deeper into the ruins.
    pub fn explore(&mut self) -> GameResult<ExplorationResult> {
        self.ensure_idle()?;
        self.player.explorations += 1;
        let exploration = self.player.explorations;
        let mut after = Aftermath::default();

        let kind = roll_event(&self.player, exploration, &mut self.rng);
        debug!(exploration, ?kind, "exploring");

        let event = match kind {
            ExplorationKind::Combat => ExplorationEvent::Combat(self.open_combat(None)),
            ExplorationKind::Discovery => {
                let found = discover(&mut self.player, &mut self.rng);
                self.world.secrets_found += 1;
                for (item, _) in &found.items {
                    self.record(GameEvent::ItemFound(*item));
                }
                let line = format!("{} discovered.", found.kind.name());
                let message = self.say(Register::Message, &line);
                after.messages.push(message);
                ExplorationEvent::Discovery(found)
            }
            ExplorationKind::Lore => ExplorationEvent::Lore(self.discover_lore(&mut after)),
            ExplorationKind::Anomaly => {
                let (stability_lost, reality_stability) = self.anomaly(&mut after);
                ExplorationEvent::Anomaly {
                    stability_lost,
                    reality_stability,
                }
            }
            ExplorationKind::Empty => {
                let (message, mp_restored) = wander(&mut self.player, &mut self.rng);
                ExplorationEvent::Empty { message, mp_restored }
            }
            ExplorationKind::Oracle => ExplorationEvent::Oracle(self.meet_oracle(&mut after)),
        };

        self.progress(QuestId::MainCoreFragment, objective::EXPLORE_RUINS, 1, &mut after);
        if kind != ExplorationKind::Anomaly {
            self.fire_glitch(GlitchTrigger::Exploration, &mut after);
        }
        self.settle(&mut after);

        Ok(ExplorationResult {
            exploration,
            event,
            glitches: after.glitches,
            quest_updates: after.quest_updates,
            system_messages: after.messages,
            ending_available: self.ending_available(),
        })
    }

    /// Start a fight. With an archetype the catalog's eligibility rules are
    /// bypassed; without one a random eligible enemy is rolled.
    pub fn start_combat(&mut self, archetype: Option<ArchetypeId>) -> GameResult<CombatStart> {
        self.ensure_idle()?;
        Ok(self.open_combat(archetype))
    }

    /// Play one turn of the active combat.
    pub fn combat_action(&mut self, handle: CombatHandle, action: CombatAction) -> GameResult<CombatTurnResult> {
        self.ensure_running()?;
        let active = self
            .combat
            .as_mut()
            .ok_or_else(|| GameError::invalid_action("no combat in progress"))?;
        if active.handle != handle {
            return Err(GameError::invalid_target(TargetKind::Combat, handle));
        }

        let step = active.combat.step(&mut self.player, action, &self.config, &mut self.rng)?;
        let mut after = Aftermath::default();

        if step.outcome.is_none() {
            self.fire_glitch(GlitchTrigger::CombatTurn(step.turn), &mut after);
        }

        let (outcome, enemy) = match self.combat.as_mut() {
            Some(active) => (active.combat.settle(&self.player), active.combat.enemy().clone()),
            None => return Err(GameError::invalid_action("no combat in progress")),
        };
        if outcome.is_some() {
            self.combat = None;
        }

        match outcome {
            Some(CombatOutcome::Victory) => {
                self.record(GameEvent::EnemyDefeated(enemy.archetype));
                if let Some(item) = step.rewards.as_ref().and_then(|r| r.drop) {
                    self.record(GameEvent::ItemFound(item));
                }
                if enemy.archetype == ArchetypeId::CorruptedGuardian {
                    self.claim_core_fragment(&mut after);
                }
                self.fire_glitch(GlitchTrigger::CombatVictory, &mut after);
            }
            Some(CombatOutcome::Defeat) => {
                info!(enemy = %enemy.name, level = self.player.level, "player died");
                self.finale = Some(game_over(&self.player));
            }
            Some(CombatOutcome::Fled) | None => {}
        }

        if !self.is_over() {
            self.settle(&mut after);
        }

        Ok(CombatTurnResult {
            handle,
            step,
            enemy,
            outcome,
            glitches: after.glitches,
            quest_updates: after.quest_updates,
            system_messages: after.messages,
            game_over: self.finale.clone().filter(|_| outcome == Some(CombatOutcome::Defeat)),
            ending_available: self.ending_available(),
        })
    }

    /// Rest and recover. Sometimes something finds the player first.
    pub fn rest(&mut self) -> GameResult<RestResult> {
        self.ensure_idle()?;
        let (hp_restored, mp_restored) = self.player.rest();
        let mut after = Aftermath::default();

        let interruption = if self.rng.percent(REST_INTERRUPT_CHANCE) {
            let roll = self.rng.range(0, 2);
            debug!(roll, "rest interrupted");
            Some(match roll {
                0 => RestInterruption::Combat(self.open_combat(None)),
                1 => {
                    let (stability_lost, reality_stability) = self.anomaly(&mut after);
                    RestInterruption::Anomaly {
                        stability_lost,
                        reality_stability,
                    }
                }
                _ => {
                    let message = self.say(Register::Message, "A vision comes to you in your rest...");
                    after.messages.push(message);
                    RestInterruption::Vision(self.discover_lore(&mut after))
                }
            })
        } else {
            let message = self.say(Register::Message, "Rest complete. Systems... somewhat stable.");
            after.messages.push(message);
            None
        };

        self.settle(&mut after);

        Ok(RestResult {
            hp_restored,
            mp_restored,
            interruption,
            glitches: after.glitches,
            quest_updates: after.quest_updates,
            system_messages: after.messages,
            ending_available: self.ending_available(),
        })
    }

    /// Answer the Oracle.
    pub fn respond(&mut self, choice: DialogueChoice) -> GameResult<DialogueResult> {
        self.ensure_running()?;
        let outcome = self.oracle.respond(choice, &mut self.player)?;
        let mut after = Aftermath::default();

        for flag in &outcome.flags {
            self.record(GameEvent::FlagSet(*flag));
        }
        for note in &outcome.system_notes {
            let message = self.say(Register::Warning, note);
            after.messages.push(message);
        }
        self.settle(&mut after);

        Ok(DialogueResult {
            outcome,
            glitches: after.glitches,
            quest_updates: after.quest_updates,
            system_messages: after.messages,
            ending_available: self.ending_available(),
        })
    }

    /// End the run and pick its ending. Falls back to Survival when no
    /// specific ending is met. Asking again returns the same ending.
    pub fn attempt_ending(&mut self) -> GameResult<EndingId> {
        if let Some(ending) = self.ending {
            return Ok(ending);
        }
        if self.is_over() {
            return Err(GameError::invalid_action("the run already ended in defeat"));
        }
        if self.combat.is_some() {
            return Err(GameError::invalid_action("cannot end the run during combat"));
        }

        let ending = resolve_final(&EndingContext::from_player(&self.player));
        info!(
            ?ending,
            level = self.player.level,
            corruption = self.player.corruption,
            integrity = self.player.system_integrity,
            "ending reached"
        );
        self.ending = Some(ending);
        self.finale = Some(epilogue(ending, &self.player));
        Ok(ending)
    }

    // ---- persistence ----

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            session_id: self.id,
            config: self.config.clone(),
            rng: self.rng.clone(),
            player: self.player.clone(),
            quests: self.quests.clone(),
            oracle: self.oracle.clone(),
            voice: self.voice.clone(),
            world: self.world.clone(),
            revealed: self.lore.revealed_keys(),
            recent_events: self.recent.clone(),
            combat: self.combat.clone(),
            next_handle: self.next_handle,
            ending: self.ending,
            defeated: self.finale.is_some() && self.ending.is_none(),
        }
    }

    /// Resume a session. The snapshot is checked before anything is built.
    pub fn from_snapshot(snapshot: SessionSnapshot) -> GameResult<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(GameError::Snapshot(format!("unsupported snapshot version {}", snapshot.version)));
        }
        snapshot.player.check_invariants().map_err(GameError::Snapshot)?;
        snapshot.quests.check_invariants().map_err(GameError::Snapshot)?;
        if let Some(active) = &snapshot.combat {
            active.combat.enemy().check_invariants().map_err(GameError::Snapshot)?;
            if active.handle.0 >= snapshot.next_handle {
                return Err(GameError::Snapshot(format!("{} was never issued", active.handle)));
            }
        }

        let mut lore = lore_graph();
        for key in &snapshot.revealed {
            if !lore.reveal(key) {
                return Err(GameError::Snapshot(format!("unknown lore fact {key}")));
            }
        }

        let finale = match (snapshot.ending, snapshot.defeated) {
            (Some(ending), _) => Some(epilogue(ending, &snapshot.player)),
            (None, true) => Some(game_over(&snapshot.player)),
            (None, false) => None,
        };

        info!(session = %snapshot.session_id, explorations = snapshot.player.explorations, "session restored");
        Ok(Self {
            id: snapshot.session_id,
            glitches: GlitchEngine::new(snapshot.config.glitch.clone()),
            catalog: EnemyCatalog::standard(),
            recall: Recall::default(),
            config: snapshot.config,
            rng: snapshot.rng,
            player: snapshot.player,
            quests: snapshot.quests,
            oracle: snapshot.oracle,
            voice: snapshot.voice,
            lore,
            world: snapshot.world,
            recent: snapshot.recent_events,
            combat: snapshot.combat,
            next_handle: snapshot.next_handle,
            ending: snapshot.ending,
            finale,
        })
    }

    // ---- internals ----

    fn ensure_running(&self) -> GameResult<()> {
        if self.is_over() {
            return Err(GameError::invalid_action("the game is over"));
        }
        Ok(())
    }

    /// Out-of-combat actions need a free player.
    fn ensure_idle(&self) -> GameResult<()> {
        self.ensure_running()?;
        if let Some(active) = &self.combat {
            return Err(GameError::invalid_action(format!("{} is in progress", active.handle)));
        }
        if self.oracle.pending().is_some() {
            return Err(GameError::invalid_action("the Oracle is waiting for an answer"));
        }
        Ok(())
    }

    fn record(&mut self, event: GameEvent) {
        self.recent.push(event);
        if self.recent.len() > RECENT_EVENTS {
            let excess = self.recent.len() - RECENT_EVENTS;
            self.recent.drain(..excess);
        }
    }

    fn say(&mut self, register: Register, text: &str) -> String {
        self.voice.speak(
            register,
            text,
            self.player.system_integrity,
            &self.config.glitch,
            &mut self.rng,
        )
    }

    fn note_update(&mut self, update: QuestUpdate, after: &mut Aftermath) {
        if let Some(id) = update.quest() {
            self.record(GameEvent::QuestChanged(id));
            after.quest_updates.push(update);
        }
    }

    fn progress(&mut self, id: QuestId, objective: usize, amount: u32, after: &mut Aftermath) {
        match self.quests.advance(id, objective, amount) {
            Ok(update) => self.note_update(update, after),
            Err(err) => warn!(quest = %id, objective, %err, "quest progress skipped"),
        }
    }

    fn raise(&mut self, id: QuestId, objective: usize, value: u32, after: &mut Aftermath) {
        match self.quests.raise_to(id, objective, value) {
            Ok(update) => self.note_update(update, after),
            Err(err) => warn!(quest = %id, objective, %err, "quest progress skipped"),
        }
    }

    fn open_combat(&mut self, archetype: Option<ArchetypeId>) -> CombatStart {
        let level = self.player.level;
        let encounters = self.world.encounters;
        let enemy = match archetype {
            Some(id) => self.catalog.instantiate(id, level, encounters),
            None => self.catalog.roll_encounter(&mut self.rng, level, encounters),
        };
        self.world.encounters += 1;

        let (combat, opening) = Combat::begin(enemy, &self.config, &mut self.rng);
        let handle = CombatHandle(self.next_handle);
        self.next_handle += 1;

        let enemy = combat.enemy().clone();
        let warning = self.say(Register::Warning, &format!("Hostile entity detected: {}", enemy.name));
        info!(%handle, enemy = %enemy.name, level = enemy.level, "combat started");
        self.combat = Some(ActiveCombat { handle, combat });

        CombatStart {
            handle,
            enemy,
            warning,
            opening,
        }
    }

    fn discover_lore(&mut self, after: &mut Aftermath) -> LoreVision {
        let fragment = pick_fragment(&self.world.seen_lore, &mut self.rng);
        let new = self.world.mark_seen(fragment);
        let intelligence_grew = self
            .player
            .apply_action_growth(GrowthAction::LoreDiscovery, &self.config.growth)
            .is_some();
        self.lore.reveal(&format!("lore:{}", fragment.key()));
        self.record(GameEvent::LoreDiscovered(fragment));

        let line = if self.player.has_flag(StoryFlag::LearnedTruth) {
            self.voice.truth(&mut self.rng)
        } else {
            self.voice.lie(&mut self.rng)
        };
        after.messages.push(line);
        debug!(?fragment, new, "lore fragment");

        LoreVision {
            fragment,
            title: fragment.title().to_string(),
            text: fragment.text().to_string(),
            new,
            intelligence_grew,
        }
    }

    fn anomaly(&mut self, after: &mut Aftermath) -> (i32, i32) {
        let lost = self.world.destabilize(&mut self.rng);
        let message = self.say(Register::Warning, "The air ripples. Reality destabilizes...");
        after.messages.push(message);
        self.fire_glitch(GlitchTrigger::Anomaly, after);
        (lost, self.world.reality_stability)
    }

    fn meet_oracle(&mut self, after: &mut Aftermath) -> DialoguePrompt {
        let hint = if self.oracle.pending().is_none() && self.oracle.next_scene(&self.player) == OracleScene::Musing {
            let tags = situation_tags(&self.player, &self.quests, &self.recent);
            self.recall
                .recall_hint(&self.lore, tags)
                .map(|fact| (fact.key.clone(), fact.content.clone()))
        } else {
            None
        };

        let prompt = self
            .oracle
            .encounter(&mut self.player, hint.as_ref().map(|(_, text)| text.as_str()), &mut self.rng);
        if let Some((key, _)) = &hint {
            self.lore.reveal(key);
        }
        self.record(GameEvent::OracleMet);

        for update in self.quests.restore_all() {
            self.note_update(update, after);
        }
        for note in &prompt.system_notes {
            let message = self.say(Register::Warning, note);
            after.messages.push(message);
        }
        prompt
    }

    fn claim_core_fragment(&mut self, after: &mut Aftermath) {
        self.progress(QuestId::MainCoreFragment, objective::DEFEAT_GUARDIAN, 1, after);
        self.player.inventory.add(Item::CoreFragment, 1);
        self.record(GameEvent::ItemFound(Item::CoreFragment));
        self.progress(QuestId::MainCoreFragment, objective::OBTAIN_FRAGMENT, 1, after);
        if self.player.set_flag(StoryFlag::FoundCoreFragment) {
            self.record(GameEvent::FlagSet(StoryFlag::FoundCoreFragment));
        }
        self.player.register_system_error(&mut self.rng);
        let message = self.say(Register::Error, "CRITICAL: System Core Fragment detected!");
        after.messages.push(message);
        info!("core fragment obtained");
    }

    /// Roll a glitch for `trigger` against the player, the quests and the
    /// enemy of an unresolved fight.
    fn fire_glitch(&mut self, trigger: GlitchTrigger, after: &mut Aftermath) {
        let event = {
            let mut ctx = GlitchContext::new(&mut self.player, &mut self.quests);
            if let Some(active) = self.combat.as_mut().filter(|a| !a.combat.is_resolved()) {
                ctx = ctx.with_enemy(active.combat.enemy_mut());
            }
            self.glitches.trigger(trigger, &mut ctx, &mut self.rng)
        };
        let Some(event) = event else {
            return;
        };

        self.world.glitch_count += 1;
        self.record(GameEvent::GlitchApplied(event.category));
        if let Some(update) = event.quest_update.clone() {
            self.note_update(update, after);
        }
        after.glitches.push(event);
    }

    fn settle(&mut self, after: &mut Aftermath) {
        self.settle_corruption(after);
        self.sync_side_quests(after);
    }

    fn settle_corruption(&mut self, after: &mut Aftermath) {
        loop {
            let peak = self.world.corruption_peak;
            let corruption = self.player.corruption;
            let next = self
                .config
                .glitch
                .corruption_thresholds
                .iter()
                .copied()
                .filter(|t| *t > peak && corruption >= *t)
                .min();
            let Some(threshold) = next else {
                break;
            };

            self.world.corruption_peak = threshold;
            info!(threshold, corruption, "corruption threshold crossed");
            self.record(GameEvent::CorruptionThreshold(threshold));
            let message = self.say(Register::Warning, &format!("Corruption level {threshold}% reached."));
            after.messages.push(message);
            self.fire_glitch(GlitchTrigger::CorruptionThreshold(threshold), after);
        }
        self.world.corruption_peak = self.world.corruption_peak.max(self.player.corruption);
    }

    fn sync_side_quests(&mut self, after: &mut Aftermath) {
        let shards = self.player.memory_shards();
        if shards > 0 {
            let update = self.quests.register(QuestId::SideMemoryFragments.create());
            self.note_update(update, after);
        }
        if self.quests.contains(QuestId::SideMemoryFragments) {
            self.raise(QuestId::SideMemoryFragments, objective::COLLECT_SHARDS, shards, after);
        }

        let corruption = self.player.corruption;
        if corruption >= SIDE_CORRUPTION_AT {
            let update = self.quests.register(QuestId::SideCorruption.create());
            self.note_update(update, after);
        }
        if self.quests.contains(QuestId::SideCorruption) {
            let value = u32::try_from(corruption).unwrap_or(0);
            self.raise(QuestId::SideCorruption, objective::REACH_CORRUPTION, value, after);
        }
    }
}
