//! Lore fragments and the seeded lore graph.
//!
//! The graph holds one fact per fragment plus the hints the Oracle draws on;
//! [`lore_graph`] rebuilds it identically every time.

use echo_rules::{ArchetypeId, GameRng, Item, QuestId, StoryFlag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::knowledge_base::{AssociationType, Fact, FactKind, KnowledgeGraph, Tag};

/// The memory fragments scattered across the ruins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoreId {
    Awakening,
    TheFall,
    CoreFragment,
    TruthOfTheUnknown,
    TheCycle,
    RealityEchoes,
}

impl LoreId {
    pub const ALL: [LoreId; 6] = [
        LoreId::Awakening,
        LoreId::TheFall,
        LoreId::CoreFragment,
        LoreId::TruthOfTheUnknown,
        LoreId::TheCycle,
        LoreId::RealityEchoes,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            LoreId::Awakening => "awakening",
            LoreId::TheFall => "the_fall",
            LoreId::CoreFragment => "core_fragment",
            LoreId::TruthOfTheUnknown => "truth_of_the_unknown",
            LoreId::TheCycle => "the_cycle",
            LoreId::RealityEchoes => "reality_echoes",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            LoreId::Awakening => "Awakening",
            LoreId::TheFall => "The Fall",
            LoreId::CoreFragment => "System Core Fragment",
            LoreId::TruthOfTheUnknown => "Truth of the Unknown",
            LoreId::TheCycle => "The Cycle",
            LoreId::RealityEchoes => "Reality Echoes",
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            LoreId::Awakening => {
                "You stand in ruins that stretch endlessly in all directions.\n\
                 The sky is a static gray, like a broken screen.\n\
                 You remember nothing. Not your name, not your purpose, not how you got here.\n\
                 But there is a voice in your head. Cold. Mechanical. Glitching.\n\
                 [SYSTEM]: Welcome, User #10,392. Designation: Unknown.\n\
                 [SYSTEM]: Current Objective: ??? [DATA CORRUPTED]"
            }
            LoreId::TheFall => {
                "A memory that isn't yours flashes through your mind:\n\
                 cities of crystal and light, a civilization that mastered reality through the System.\n\
                 Then something went wrong. The System broke. Reality collapsed. Everyone died.\n\
                 Everyone except those bound to the System, trapped in an endless loop of death and resurrection."
            }
            LoreId::CoreFragment => {
                "Ancient text is etched into the stone:\n\
                 'The System Core maintained reality itself. When it shattered, the world ended.\n\
                 Its fragments remain, scattered across the ruins.\n\
                 Gather them and you may restore the System and its prison, destroy it and reality with it,\n\
                 or become something new. Choose wisely. Or don't. The System has already chosen for you.'"
            }
            LoreId::TruthOfTheUnknown => {
                "A corrupted data log plays in your mind:\n\
                 'User designation \"Unknown\" is not an error. It is intentional.\n\
                 Those who forget their names cannot be bound by fate.\n\
                 You are Unknown because you refused to be Known.\n\
                 That resistance is your only weapon.'"
            }
            LoreId::TheCycle => {
                "Numbers are carved into every surface:\n\
                 10,391 attempts failed. 10,391 Users who tried to restore the System.\n\
                 10,391 who were consumed by it.\n\
                 You are #10,392. Will you be different? Or will someone else wake up as #10,393?"
            }
            LoreId::RealityEchoes => {
                "The world glitches around you, revealing the truth:\n\
                 this place is not a ruin of the past. It is an echo of the present.\n\
                 The world ended, but the System couldn't let go, so it replays the final moments.\n\
                 Over and over. You are trapped in a dead world's dream."
            }
        }
    }

    /// Concepts this fragment touches, most central first.
    fn concepts(&self) -> &'static [&'static str] {
        match self {
            LoreId::Awakening => &["system", "memory", "identity"],
            LoreId::TheFall => &["system", "fall", "cycle"],
            LoreId::CoreFragment => &["system", "core", "choice"],
            LoreId::TruthOfTheUnknown => &["identity", "memory", "resistance"],
            LoreId::TheCycle => &["cycle", "users", "fall"],
            LoreId::RealityEchoes => &["reality", "integrity", "cycle"],
        }
    }

    fn tags(&self) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self.concepts().iter().map(|c| Tag::concept(*c)).collect();
        tags.push(Tag::lore(*self));
        tags
    }
}

impl std::fmt::Display for LoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Pick the next fragment. The first is always Awakening, unseen fragments
/// are preferred, and once all are seen any may repeat.
pub fn pick_fragment(seen: &BTreeSet<LoreId>, rng: &mut GameRng) -> LoreId {
    if seen.is_empty() {
        return LoreId::Awakening;
    }
    let unseen: Vec<LoreId> = LoreId::ALL.into_iter().filter(|id| !seen.contains(id)).collect();
    let pool: &[LoreId] = if unseen.is_empty() { &LoreId::ALL } else { &unseen };
    rng.choose(pool).copied().unwrap_or(LoreId::Awakening)
}

/// Things the Oracle can let slip: `(key, text, importance, tags)`.
const HINTS: &[(&str, &str, f32, &[&str])] = &[
    ("watching", "The System watches you more closely now. Be careful.", 0.5, &["system"]),
    ("thin_reality", "Reality grows thinner with each passing moment.", 0.7, &["reality", "integrity"]),
    ("break_cycle", "I wonder if you'll be the one to break the cycle...", 0.8, &["cycle"]),
    ("secrets", "The ruins hold many secrets. Some are better left buried.", 0.4, &["ruins", "system"]),
    ("curse_or_evolution", "Your corruption rises. Is it a curse? Or evolution?", 0.9, &["corruption"]),
    ("guardian_waits", "The Guardian waits where the ruins run deepest. It guards what you seek.", 0.9, &["guardian", "core"]),
    ("shards_remember", "Memory Shards remember what you cannot. Five of them would tell the whole story.", 0.8, &["memory"]),
    ("names", "You refused to be Known. Hold on to that refusal.", 0.6, &["identity", "resistance"]),
    ("liar", "The System lies most when it sounds most certain.", 0.6, &["system", "lies"]),
    ("fragment_choice", "A fragment in your hand is a choice you have not made yet.", 0.9, &["core", "choice"]),
    ("glitch_breath", "The glitches are the System breathing. Count them.", 0.5, &["glitch", "corruption"]),
];

/// Concept pairs worth linking on top of co-occurrence.
const LINKS: &[(&str, &str, f32)] = &[
    ("corruption", "glitch", 0.8),
    ("integrity", "glitch", 0.6),
    ("system", "lies", 0.5),
    ("core", "choice", 0.7),
    ("guardian", "core", 0.9),
    ("memory", "identity", 0.7),
    ("cycle", "users", 0.8),
    ("fall", "reality", 0.5),
];

/// Build the lore graph of a fresh world.
pub fn lore_graph() -> KnowledgeGraph {
    let mut graph = KnowledgeGraph::new();

    for id in LoreId::ALL {
        graph.add_fact(
            Fact::new(format!("lore:{}", id.key()), id.text())
                .with_kind(FactKind::Lore(id))
                .with_tags(id.tags())
                .with_importance(0.6),
        );
    }

    for (key, text, importance, concepts) in HINTS {
        graph.add_fact(
            Fact::new(format!("hint:{key}"), *text)
                .with_kind(FactKind::Hint)
                .with_tags(concepts.iter().map(|c| Tag::concept(*c)))
                .with_importance(*importance),
        );
    }

    graph.add_fact(
        Fact::new("quest:main", "The Core Fragment lies with the Guardian.")
            .with_kind(FactKind::Quest(QuestId::MainCoreFragment))
            .with_tag(Tag::quest(QuestId::MainCoreFragment))
            .with_tag(Tag::concept("core")),
    );

    graph.build_co_occurrence_associations();

    for (a, b, weight) in LINKS {
        graph.add_bidirectional_association(Tag::concept(*a), Tag::concept(*b), *weight, AssociationType::Semantic);
    }

    // Game objects point at the concepts they embody.
    let anchors = [
        (Tag::enemy(ArchetypeId::CorruptedGuardian), "guardian"),
        (Tag::enemy(ArchetypeId::SystemWraith), "system"),
        (Tag::enemy(ArchetypeId::GlitchedWolf), "glitch"),
        (Tag::item(Item::CoreFragment), "core"),
        (Tag::item(Item::MemoryShard), "memory"),
        (Tag::item(Item::SystemFragment), "system"),
        (Tag::flag(StoryFlag::LearnedTruth), "cycle"),
        (Tag::flag(StoryFlag::LearnedOthersFate), "users"),
        (Tag::quest(QuestId::SideCorruption), "corruption"),
        (Tag::quest(QuestId::SideMemoryFragments), "memory"),
    ];
    for (tag, concept) in anchors {
        graph.add_association(tag, Tag::concept(concept), 1.0, AssociationType::Direct);
    }
    for id in LoreId::ALL {
        for concept in id.concepts() {
            graph.add_association(Tag::lore(id), Tag::concept(*concept), 0.5, AssociationType::Direct);
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recall::Recall;

    #[test]
    fn test_first_fragment_is_awakening() {
        let mut rng = GameRng::new(1);
        assert_eq!(pick_fragment(&BTreeSet::new(), &mut rng), LoreId::Awakening);
    }

    #[test]
    fn test_unseen_fragments_first() {
        let mut rng = GameRng::new(2);
        let mut seen = BTreeSet::from([LoreId::Awakening]);
        for _ in 1..LoreId::ALL.len() {
            let next = pick_fragment(&seen, &mut rng);
            assert!(seen.insert(next), "{next} repeated before all were seen");
        }
        assert_eq!(seen.len(), LoreId::ALL.len());

        let again = pick_fragment(&seen, &mut rng);
        assert!(LoreId::ALL.contains(&again));
    }

    #[test]
    fn test_graph_holds_every_fragment() {
        let graph = lore_graph();
        for id in LoreId::ALL {
            let fact = graph.fact_by_key(&format!("lore:{}", id.key()));
            assert_eq!(fact.map(|f| f.kind), Some(FactKind::Lore(id)));
        }
        assert_eq!(graph.find_facts(|f| f.is_hint()).len(), HINTS.len());
    }

    #[test]
    fn test_guardian_points_to_the_guardian_hint() {
        let graph = lore_graph();
        let hint = Recall::default().recall_hint(&graph, vec![Tag::enemy(ArchetypeId::CorruptedGuardian)]);
        assert_eq!(hint.map(|f| f.key.as_str()), Some("hint:guardian_waits"));
    }

    #[test]
    fn test_corruption_recalls_its_hint() {
        let graph = lore_graph();
        let hint = Recall::default().recall_hint(&graph, vec![Tag::concept("corruption")]);
        assert_eq!(hint.map(|f| f.key.as_str()), Some("hint:curse_or_evolution"));
    }
}
