//! Player-side entities: items, story flags, stats, and the player state.

mod components;
mod player;

pub use components::*;
pub use player::*;

use serde::{Deserialize, Serialize};

/// Every item the world can hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Item {
    // Story
    MemoryShard,
    CoreFragment,
    SystemFragment,

    // Supplies
    HealthPotion,
    AncientCoin,
    Rations,
    Rope,
    Torch,

    // Drops
    SlimeCore,
    CorruptedGel,
    AncientBone,
    RustedBlade,
    WolfPelt,
    GlitchCrystal,
    WraithEssence,
    GuardianPlate,

    // Produced by inventory corruption
    CorruptedData,
    NullPointer,
    MemoryFragment,
    UnknownItem,
    VoidEcho,
}

impl Item {
    /// Items an inventory-corruption glitch may spawn.
    pub const CORRUPTED: [Item; 4] = [
        Item::CorruptedData,
        Item::NullPointer,
        Item::MemoryFragment,
        Item::UnknownItem,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Item::MemoryShard => "Memory Shard",
            Item::CoreFragment => "System Core Fragment",
            Item::SystemFragment => "System Fragment",
            Item::HealthPotion => "Health Potion",
            Item::AncientCoin => "Ancient Coin",
            Item::Rations => "Rations",
            Item::Rope => "Rope",
            Item::Torch => "Torch",
            Item::SlimeCore => "Slime Core",
            Item::CorruptedGel => "Corrupted Gel",
            Item::AncientBone => "Ancient Bone",
            Item::RustedBlade => "Rusted Blade",
            Item::WolfPelt => "Wolf Pelt",
            Item::GlitchCrystal => "Glitch Crystal",
            Item::WraithEssence => "Wraith Essence",
            Item::GuardianPlate => "Guardian Plate",
            Item::CorruptedData => "Corrupted Data",
            Item::NullPointer => "Null Pointer",
            Item::MemoryFragment => "Memory Fragment",
            Item::UnknownItem => "??? Item",
            Item::VoidEcho => "Void Echo",
        }
    }

    /// Story items are never removed by inventory corruption.
    pub fn is_story_item(&self) -> bool {
        matches!(self, Item::MemoryShard | Item::CoreFragment)
    }
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Boolean markers for story progress and dialogue history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StoryFlag {
    Awakened,
    MetOracle,
    FoundCoreFragment,
    LearnedTruth,
    LearnedOthersFate,
    DiscoveredLuck,
    PathRestoration,
    PathDestruction,
}
