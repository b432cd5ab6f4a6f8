//! Knowledge Graph - the data structure behind lore recall.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{Fact, FactId, Tag};

/// Association between two tags with a weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Association {
    pub target: Tag,
    /// Weight from 0.0 to 1.0 indicating association strength.
    pub weight: f32,
    pub association_type: AssociationType,
}

/// Types of associations between tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssociationType {
    /// Explicitly defined association.
    Direct,
    /// Both tags appear on same facts.
    CoOccurrence,
    /// Conceptually related.
    Semantic,
}

/// Facts, a tag index, and weighted tag-to-tag associations.
///
/// The graph is authored content and is rebuilt at session start; only the
/// keys of revealed facts are saved.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    facts: HashMap<FactId, Fact>,

    /// Index: Tag -> Facts containing this tag.
    tag_to_facts: BTreeMap<Tag, BTreeSet<String>>,

    /// Index: stable key -> fact.
    key_to_fact: HashMap<String, FactId>,

    /// Associations between tags (adjacency list).
    associations: BTreeMap<Tag, Vec<Association>>,
}

impl KnowledgeGraph {
    /// Create a new empty knowledge graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new fact. A fact with an already-used key replaces the old one.
    pub fn add_fact(&mut self, fact: Fact) -> FactId {
        if let Some(old) = self.key_to_fact.get(&fact.key).copied() {
            self.remove_fact(old);
        }
        let id = fact.id;

        for tag in &fact.tags {
            self.tag_to_facts
                .entry(tag.clone())
                .or_default()
                .insert(fact.key.clone());
        }
        self.key_to_fact.insert(fact.key.clone(), id);
        self.facts.insert(id, fact);
        id
    }

    /// Remove a fact from the knowledge base.
    pub fn remove_fact(&mut self, id: FactId) -> Option<Fact> {
        let fact = self.facts.remove(&id)?;
        for tag in &fact.tags {
            if let Some(keys) = self.tag_to_facts.get_mut(tag) {
                keys.remove(&fact.key);
            }
        }
        self.key_to_fact.remove(&fact.key);
        Some(fact)
    }

    /// All facts carrying a tag, ordered by key.
    pub fn facts_by_tag(&self, tag: &Tag) -> Vec<&Fact> {
        self.tag_to_facts
            .get(tag)
            .map(|keys| keys.iter().filter_map(|key| self.fact_by_key(key)).collect())
            .unwrap_or_default()
    }

    /// Add or update an association between tags.
    pub fn add_association(&mut self, from: Tag, to: Tag, weight: f32, assoc_type: AssociationType) {
        let associations = self.associations.entry(from).or_default();

        if let Some(existing) = associations.iter_mut().find(|a| a.target == to) {
            // Average weights for updates
            existing.weight = (existing.weight + weight.clamp(0.0, 1.0)) / 2.0;
        } else {
            associations.push(Association {
                target: to,
                weight: weight.clamp(0.0, 1.0),
                association_type: assoc_type,
            });
        }
    }

    pub fn add_bidirectional_association(&mut self, tag_a: Tag, tag_b: Tag, weight: f32, assoc_type: AssociationType) {
        self.add_association(tag_a.clone(), tag_b.clone(), weight, assoc_type);
        self.add_association(tag_b, tag_a, weight, assoc_type);
    }

    pub fn get_associations(&self, tag: &Tag) -> &[Association] {
        self.associations.get(tag).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn get_fact(&self, id: FactId) -> Option<&Fact> {
        self.facts.get(&id)
    }

    pub fn fact_by_key(&self, key: &str) -> Option<&Fact> {
        self.key_to_fact.get(key).and_then(|id| self.facts.get(id))
    }

    /// Mark a fact as revealed. Returns false for an unknown key.
    pub fn reveal(&mut self, key: &str) -> bool {
        match self.key_to_fact.get(key).and_then(|id| self.facts.get_mut(id)) {
            Some(fact) => {
                fact.reveal();
                true
            }
            None => false,
        }
    }

    /// Keys of every revealed fact, sorted.
    pub fn revealed_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.facts.values().filter(|f| f.revealed).map(|f| f.key.clone()).collect();
        keys.sort();
        keys
    }

    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tag_to_facts.contains_key(tag)
    }

    /// Find facts matching a predicate.
    pub fn find_facts<F>(&self, predicate: F) -> Vec<&Fact>
    where
        F: Fn(&Fact) -> bool,
    {
        self.facts.values().filter(|f| predicate(f)).collect()
    }

    /// Automatically create co-occurrence associations from shared tags on facts.
    pub fn build_co_occurrence_associations(&mut self) {
        let mut co_occurrences: BTreeMap<(Tag, Tag), u32> = BTreeMap::new();

        for fact in self.facts.values() {
            // Tags are a sorted set, so (i, j) pairs are already ordered.
            let tags: Vec<_> = fact.tags.iter().cloned().collect();
            for i in 0..tags.len() {
                for j in (i + 1)..tags.len() {
                    *co_occurrences.entry((tags[i].clone(), tags[j].clone())).or_default() += 1;
                }
            }
        }

        for ((tag_a, tag_b), count) in co_occurrences {
            // Log scale; a single shared fact gives a weak link.
            let weight = (1.0 + count as f32).ln().min(1.0) * 0.5;
            self.add_bidirectional_association(tag_a, tag_b, weight, AssociationType::CoOccurrence);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge_base::FactKind;

    #[test]
    fn test_add_and_get_fact() {
        let mut graph = KnowledgeGraph::new();
        let id = graph.add_fact(Fact::new("fall", "The world fell").with_tag(Tag::concept("fall")));

        assert_eq!(graph.get_fact(id).map(|f| f.content.as_str()), Some("The world fell"));
        assert!(graph.fact_by_key("fall").is_some());
        assert!(graph.has_tag(&Tag::concept("fall")));
    }

    #[test]
    fn test_same_key_replaces() {
        let mut graph = KnowledgeGraph::new();
        graph.add_fact(Fact::new("k", "old").with_tag(Tag::concept("a")));
        graph.add_fact(Fact::new("k", "new").with_tag(Tag::concept("b")));

        assert_eq!(graph.fact_count(), 1);
        assert!(graph.facts_by_tag(&Tag::concept("a")).is_empty());
        assert_eq!(graph.facts_by_tag(&Tag::concept("b"))[0].content, "new");
    }

    #[test]
    fn test_facts_by_tag_sorted_by_key() {
        let mut graph = KnowledgeGraph::new();
        let system = Tag::concept("system");
        graph.add_fact(Fact::new("b", "second").with_tag(system.clone()));
        graph.add_fact(Fact::new("a", "first").with_tag(system.clone()));
        graph.add_fact(Fact::new("c", "other").with_tag(Tag::concept("void")));

        let found: Vec<_> = graph.facts_by_tag(&system).iter().map(|f| f.key.as_str()).collect();
        assert_eq!(found, vec!["a", "b"]);
    }

    #[test]
    fn test_associations() {
        let mut graph = KnowledgeGraph::new();
        let corruption = Tag::concept("corruption");
        let glitch = Tag::concept("glitch");

        graph.add_association(corruption.clone(), glitch.clone(), 0.7, AssociationType::Direct);
        graph.add_association(corruption.clone(), glitch.clone(), 0.9, AssociationType::Direct);

        let assocs = graph.get_associations(&corruption);
        assert_eq!(assocs.len(), 1);
        assert!((assocs[0].weight - 0.8).abs() < 0.01);
        assert!(graph.get_associations(&glitch).is_empty());
    }

    #[test]
    fn test_bidirectional_associations() {
        let mut graph = KnowledgeGraph::new();
        let a = Tag::concept("a");
        let b = Tag::concept("b");
        graph.add_bidirectional_association(a.clone(), b.clone(), 0.8, AssociationType::Semantic);

        assert_eq!(graph.get_associations(&a).len(), 1);
        assert_eq!(graph.get_associations(&b).len(), 1);
    }

    #[test]
    fn test_reveal_by_key() {
        let mut graph = KnowledgeGraph::new();
        graph.add_fact(Fact::new("hint", "Be careful").with_kind(FactKind::Hint));

        assert!(graph.reveal("hint"));
        assert!(!graph.reveal("missing"));
        assert_eq!(graph.revealed_keys(), vec!["hint".to_string()]);
    }

    #[test]
    fn test_remove_fact() {
        let mut graph = KnowledgeGraph::new();
        let tag = Tag::concept("test");
        let id = graph.add_fact(Fact::new("r", "Removable").with_tag(tag.clone()));

        assert!(graph.remove_fact(id).is_some());
        assert!(graph.get_fact(id).is_none());
        assert!(graph.fact_by_key("r").is_none());
        assert!(graph.facts_by_tag(&tag).is_empty());
    }

    #[test]
    fn test_co_occurrence_associations() {
        let mut graph = KnowledgeGraph::new();
        let system = Tag::concept("system");
        let lies = Tag::concept("lies");
        let ruins = Tag::concept("ruins");

        graph.add_fact(Fact::new("1", "one").with_tag(system.clone()).with_tag(lies.clone()));
        graph.add_fact(Fact::new("2", "two").with_tag(system.clone()).with_tag(lies.clone()));
        graph.add_fact(Fact::new("3", "three").with_tag(system.clone()).with_tag(ruins.clone()));

        graph.build_co_occurrence_associations();

        let assocs = graph.get_associations(&system);
        let to_lies = assocs.iter().find(|a| a.target == lies).map(|a| a.weight);
        let to_ruins = assocs.iter().find(|a| a.target == ruins).map(|a| a.weight);
        assert!(to_ruins.is_some_and(|w| w > 0.0));
        assert!(to_lies > to_ruins);
    }
}
