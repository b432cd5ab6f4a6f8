//! Lore recall - picks what the Oracle talks about using spreading activation.
//!
//! 1. **Trigger**: tags drawn from the player's situation and recent events
//! 2. **Activation**: trigger tags start with energy
//! 3. **Spreading**: energy flows along tag associations, decaying each hop
//! 4. **Filtering**: tags below the threshold are ignored
//! 5. **Selection**: facts are scored by the energy of their tags times importance

mod activation;

pub use activation::*;

use echo_rules::{Item, PlayerState, QuestId, QuestLog, QuestState, StoryFlag};
use std::collections::BTreeMap;

use crate::events::GameEvent;
use crate::knowledge_base::{Fact, KnowledgeGraph, Tag};

/// Configuration for the spreading activation algorithm.
#[derive(Debug, Clone)]
pub struct RecallConfig {
    /// Initial energy given to trigger tags.
    pub initial_energy: f32,
    /// How much energy survives each hop (0.0-1.0).
    pub decay_rate: f32,
    /// Maximum depth of spreading.
    pub max_depth: u32,
    /// Minimum energy for a tag to count.
    pub energy_threshold: f32,
    /// Maximum number of facts returned by [`Recall::collect_facts`].
    pub max_facts: usize,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            initial_energy: 1.0,
            decay_rate: 0.5,
            max_depth: 2,
            energy_threshold: 0.1,
            max_facts: 8,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Recall {
    config: RecallConfig,
}

impl Recall {
    pub fn new(config: RecallConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecallConfig {
        &self.config
    }

    /// Run spreading activation from the trigger tags.
    pub fn spread_activation(&self, graph: &KnowledgeGraph, trigger_tags: Vec<Tag>) -> ActivationState {
        let mut state = ActivationState::new();
        for tag in trigger_tags {
            state.add_energy(tag, self.config.initial_energy);
        }

        for _depth in 0..self.config.max_depth {
            let mut spread: BTreeMap<Tag, f32> = BTreeMap::new();

            for (tag, energy) in state.iter_energies() {
                if *energy < self.config.energy_threshold {
                    continue;
                }
                for assoc in graph.get_associations(tag) {
                    *spread.entry(assoc.target.clone()).or_default() += energy * assoc.weight * self.config.decay_rate;
                }
            }

            for (tag, energy) in spread {
                state.add_energy(tag, energy);
            }
        }

        state
    }

    /// Facts ranked by summed tag energy times importance. Ties go to the
    /// lower key.
    pub fn collect_facts<'a>(&self, graph: &'a KnowledgeGraph, activation: &ActivationState) -> Vec<&'a Fact> {
        let mut scores: BTreeMap<&'a str, (f32, &'a Fact)> = BTreeMap::new();

        for (tag, energy) in activation.hot_tags(self.config.energy_threshold) {
            for fact in graph.facts_by_tag(tag) {
                scores.entry(fact.key.as_str()).or_insert((0.0, fact)).0 += energy * fact.importance;
            }
        }

        let mut ranked: Vec<(f32, &'a Fact)> = scores.into_values().collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
        ranked.into_iter().take(self.config.max_facts).map(|(_, fact)| fact).collect()
    }

    /// The best hint the player has not been told yet.
    pub fn recall_hint<'a>(&self, graph: &'a KnowledgeGraph, trigger_tags: Vec<Tag>) -> Option<&'a Fact> {
        let activation = self.spread_activation(graph, trigger_tags);
        let mut scores: BTreeMap<&'a str, (f32, &'a Fact)> = BTreeMap::new();

        for (tag, energy) in activation.hot_tags(self.config.energy_threshold) {
            for fact in graph.facts_by_tag(tag).into_iter().filter(|f| f.is_hint() && !f.revealed) {
                scores.entry(fact.key.as_str()).or_insert((0.0, fact)).0 += energy * fact.importance;
            }
        }

        let mut ranked: Vec<(f32, &'a Fact)> = scores.into_values().collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
        ranked.into_iter().next().map(|(_, fact)| fact)
    }
}

/// Tags describing where the player stands right now.
pub fn situation_tags(player: &PlayerState, quests: &QuestLog, recent: &[GameEvent]) -> Vec<Tag> {
    let mut tags = vec![Tag::concept("system")];

    if player.corruption >= 25 {
        tags.push(Tag::concept("corruption"));
    }
    if player.system_integrity <= 6 {
        tags.push(Tag::concept("integrity"));
    }
    if player.has_flag(StoryFlag::LearnedTruth) {
        tags.push(Tag::concept("cycle"));
    }
    if player.inventory.has(Item::MemoryShard) {
        tags.push(Tag::item(Item::MemoryShard));
    }
    if player.has_core_fragment() {
        tags.push(Tag::item(Item::CoreFragment));
    } else if player.level >= 4 {
        tags.push(Tag::concept("guardian"));
    }
    if quests.state(QuestId::MainCoreFragment) == Some(QuestState::Glitched) {
        tags.push(Tag::quest(QuestId::MainCoreFragment));
    }

    for event in recent {
        tags.extend(event.to_tags());
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge_base::{AssociationType, FactKind};
    use echo_rules::GameConfig;

    fn create_test_graph() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        let corruption = Tag::concept("corruption");
        let glitch = Tag::concept("glitch");
        let cycle = Tag::concept("cycle");

        graph.add_fact(
            Fact::new("curse", "Is it a curse? Or evolution?")
                .with_kind(FactKind::Hint)
                .with_tag(corruption.clone())
                .with_importance(0.8),
        );
        graph.add_fact(
            Fact::new("glitches", "The glitches are the System breathing.")
                .with_kind(FactKind::Hint)
                .with_tag(glitch.clone())
                .with_importance(0.9),
        );
        graph.add_fact(
            Fact::new("cycle", "Every cycle ends the same way.")
                .with_kind(FactKind::Hint)
                .with_tag(cycle.clone())
                .with_importance(1.0),
        );

        graph.add_bidirectional_association(corruption, glitch, 0.8, AssociationType::Semantic);
        graph
    }

    #[test]
    fn test_spread_activation_reaches_neighbours() {
        let graph = create_test_graph();
        let recall = Recall::default();

        let state = recall.spread_activation(&graph, vec![Tag::concept("corruption")]);

        assert!(state.get_energy(&Tag::concept("corruption")) >= 1.0);
        assert!(state.is_active(&Tag::concept("glitch")));
        assert!(!state.is_active(&Tag::concept("cycle")));
    }

    #[test]
    fn test_collect_facts_ranks_trigger_first() {
        let graph = create_test_graph();
        let recall = Recall::default();

        let state = recall.spread_activation(&graph, vec![Tag::concept("corruption")]);
        let facts = recall.collect_facts(&graph, &state);

        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].key, "curse");
        assert_eq!(facts[1].key, "glitches");
    }

    #[test]
    fn test_recall_hint_skips_revealed() {
        let mut graph = create_test_graph();
        let recall = Recall::default();

        let first = recall.recall_hint(&graph, vec![Tag::concept("corruption")]).map(|f| f.key.clone());
        assert_eq!(first.as_deref(), Some("curse"));

        graph.reveal("curse");
        let second = recall.recall_hint(&graph, vec![Tag::concept("corruption")]).map(|f| f.key.clone());
        assert_eq!(second.as_deref(), Some("glitches"));

        graph.reveal("glitches");
        assert!(recall.recall_hint(&graph, vec![Tag::concept("corruption")]).is_none());
    }

    #[test]
    fn test_no_triggers_no_hint() {
        let graph = create_test_graph();
        assert!(Recall::default().recall_hint(&graph, Vec::new()).is_none());
    }

    #[test]
    fn test_situation_tags_follow_state() {
        let config = GameConfig::default();
        let mut player = PlayerState::new("Unknown", &config);
        let quests = QuestLog::new();

        let calm = situation_tags(&player, &quests, &[]);
        assert_eq!(calm, vec![Tag::concept("system")]);

        player.modify_corruption(40);
        player.level = 5;
        let tense = situation_tags(&player, &quests, &[GameEvent::ItemFound(Item::MemoryShard)]);
        assert!(tense.contains(&Tag::concept("corruption")));
        assert!(tense.contains(&Tag::concept("guardian")));
        assert!(tense.contains(&Tag::item(Item::MemoryShard)));
    }
}
