//! Tag definitions - nodes in the lore graph.

use echo_rules::{ArchetypeId, Item, QuestId, StoryFlag};
use serde::{Deserialize, Serialize};

use crate::lore::LoreId;

/// Tags are the nodes of the lore graph.
/// They name concepts, lore fragments, and the game objects stories touch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    /// A concept or theme (e.g. "corruption", "cycle").
    Concept(String),

    /// One of the lore fragments.
    Lore(LoreId),

    /// An enemy archetype.
    Enemy(ArchetypeId),

    /// An item.
    Item(Item),

    /// A quest.
    Quest(QuestId),

    /// A story flag.
    Flag(StoryFlag),

    /// Custom tag for extension.
    Custom(String),
}

impl Tag {
    /// Create a new concept tag.
    pub fn concept(name: impl Into<String>) -> Self {
        Tag::Concept(name.into())
    }

    pub fn lore(id: LoreId) -> Self {
        Tag::Lore(id)
    }

    pub fn enemy(id: ArchetypeId) -> Self {
        Tag::Enemy(id)
    }

    pub fn item(item: Item) -> Self {
        Tag::Item(item)
    }

    pub fn quest(id: QuestId) -> Self {
        Tag::Quest(id)
    }

    pub fn flag(flag: StoryFlag) -> Self {
        Tag::Flag(flag)
    }

    /// Create a custom tag.
    pub fn custom(name: impl Into<String>) -> Self {
        Tag::Custom(name.into())
    }

    /// Convert the tag to a string representation.
    pub fn as_string(&self) -> String {
        match self {
            Tag::Concept(s) => format!("concept:{}", s),
            Tag::Lore(id) => format!("lore:{}", id.key()),
            Tag::Enemy(id) => format!("enemy:{:?}", id),
            Tag::Item(item) => format!("item:{:?}", item),
            Tag::Quest(id) => format!("quest:{}", id.key()),
            Tag::Flag(flag) => format!("flag:{:?}", flag),
            Tag::Custom(s) => format!("custom:{}", s),
        }
    }

    /// Get the category of this tag.
    pub fn category(&self) -> &'static str {
        match self {
            Tag::Concept(_) => "concept",
            Tag::Lore(_) => "lore",
            Tag::Enemy(_) => "enemy",
            Tag::Item(_) => "item",
            Tag::Quest(_) => "quest",
            Tag::Flag(_) => "flag",
            Tag::Custom(_) => "custom",
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

// Ordered by string form so graph walks and co-occurrence pairs are stable.
impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_string().cmp(&other.as_string())
    }
}
