//! Fact definitions - data entries in the lore graph.

use echo_rules::QuestId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::Tag;
use crate::lore::LoreId;

/// Unique identifier for facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactId(pub Uuid);

impl FactId {
    /// Create a new random fact ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FactId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A piece of knowledge stored in the graph.
///
/// `id` is per-process identity; `key` is the stable name that saves refer to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub id: FactId,

    pub key: String,

    /// Human-readable content of the fact.
    pub content: String,

    pub kind: FactKind,

    /// Tags this fact is associated with.
    pub tags: BTreeSet<Tag>,

    /// Importance score (0.0 - 1.0) for prioritization.
    pub importance: f32,

    /// Whether this fact has been told to the player.
    pub revealed: bool,

    pub source: FactSource,
}

impl Fact {
    /// Create a new fact with the given stable key and content.
    pub fn new(key: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: FactId::new(),
            key: key.into(),
            content: content.into(),
            kind: FactKind::Generic,
            tags: BTreeSet::new(),
            importance: 0.5,
            revealed: false,
            source: FactSource::Initial,
        }
    }

    pub fn with_kind(mut self, kind: FactKind) -> Self {
        self.kind = kind;
        self
    }

    /// Add a tag to this fact.
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.insert(tag);
        self
    }

    /// Add multiple tags to this fact.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Set the importance score.
    pub fn with_importance(mut self, importance: f32) -> Self {
        self.importance = importance.clamp(0.0, 1.0);
        self
    }

    pub fn with_source(mut self, source: FactSource) -> Self {
        self.source = source;
        self
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    pub fn is_hint(&self) -> bool {
        matches!(self.kind, FactKind::Hint)
    }

    pub fn reveal(&mut self) {
        self.revealed = true;
    }
}

/// Types of facts in the lore graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactKind {
    /// The text of a lore fragment.
    Lore(LoreId),

    /// Something the Oracle can hint at.
    Hint,

    /// Quest-related information.
    Quest(QuestId),

    Generic,
}

/// Where a fact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactSource {
    /// Part of the authored world.
    Initial,
    /// Learned through exploration.
    Exploration,
    /// Revealed through conversation.
    Dialogue,
}
