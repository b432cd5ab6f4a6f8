//! What the ruins hold: the exploration event table, discoveries and the
//! quiet moments in between.

use echo_rules::{CorruptionChange, GameRng, Item, PlayerState, Stat, StoryFlag};
use serde::{Deserialize, Serialize};

/// Corruption above which the ruins turn stranger.
pub const ANOMALY_CORRUPTION: i32 = 50;

/// MP recovered when an empty exploration turns into a breather.
pub const BREATHER_MP: i32 = 5;
pub const BREATHER_CHANCE: u32 = 30;

const EMPTY_MESSAGES: [&str; 8] = [
    "You find nothing but rubble and decay.",
    "The ruins stretch on, empty and silent.",
    "Only the wind answers your footsteps.",
    "Whatever was here is long gone.",
    "You sense you're being watched, but see nothing.",
    "The System's presence feels... distant here.",
    "Time feels strange in this place. How long have you been walking?",
    "Your own footprints from before. Or are they someone else's?",
];

/// Kinds of exploration event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplorationKind {
    Combat,
    Discovery,
    Lore,
    Anomaly,
    Empty,
    Oracle,
}

/// Event weights for the player's current state.
pub fn event_weights(player: &PlayerState) -> [(ExplorationKind, u32); 6] {
    let mut combat = 35u32;
    let mut anomaly = 10u32;
    let mut empty = 15u32;
    let mut oracle = 5u32;

    if player.corruption > ANOMALY_CORRUPTION {
        anomaly += 10;
        combat -= 5;
        empty -= 5;
    }
    if !player.has_flag(StoryFlag::MetOracle) {
        oracle = 15;
        combat = combat.saturating_sub(10);
    }

    [
        (ExplorationKind::Combat, combat),
        (ExplorationKind::Discovery, 20),
        (ExplorationKind::Lore, 15),
        (ExplorationKind::Anomaly, anomaly),
        (ExplorationKind::Empty, empty),
        (ExplorationKind::Oracle, oracle),
    ]
}

/// Roll the event for an exploration. The very first one is always lore.
pub fn roll_event(player: &PlayerState, exploration: u32, rng: &mut GameRng) -> ExplorationKind {
    if exploration <= 1 {
        return ExplorationKind::Lore;
    }
    let table = event_weights(player);
    let weights: Vec<u32> = table.iter().map(|(_, w)| *w).collect();
    rng.weighted_index(&weights)
        .map(|i| table[i].0)
        .unwrap_or(ExplorationKind::Empty)
}

/// The places worth finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoveryKind {
    AncientChest,
    MysteriousShrine,
    CorruptedFountain,
    MemoryCrystal,
    HiddenCache,
}

impl DiscoveryKind {
    pub const ALL: [DiscoveryKind; 5] = [
        DiscoveryKind::AncientChest,
        DiscoveryKind::MysteriousShrine,
        DiscoveryKind::CorruptedFountain,
        DiscoveryKind::MemoryCrystal,
        DiscoveryKind::HiddenCache,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DiscoveryKind::AncientChest => "Ancient Chest",
            DiscoveryKind::MysteriousShrine => "Mysterious Shrine",
            DiscoveryKind::CorruptedFountain => "Corrupted Fountain",
            DiscoveryKind::MemoryCrystal => "Memory Crystal",
            DiscoveryKind::HiddenCache => "Hidden Cache",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DiscoveryKind::AncientChest => "You find a weathered chest half-buried in rubble.",
            DiscoveryKind::MysteriousShrine => "A strange shrine pulses with residual energy.",
            DiscoveryKind::CorruptedFountain => "A fountain of dark liquid. Something compels you to drink.",
            DiscoveryKind::MemoryCrystal => "A crystalline structure containing fragmented memories.",
            DiscoveryKind::HiddenCache => "You discover a hidden cache of supplies.",
        }
    }

    pub fn items(&self) -> &'static [(Item, u32)] {
        match self {
            DiscoveryKind::AncientChest => &[(Item::HealthPotion, 2), (Item::AncientCoin, 1)],
            DiscoveryKind::MysteriousShrine => &[(Item::SystemFragment, 1)],
            DiscoveryKind::CorruptedFountain => &[],
            DiscoveryKind::MemoryCrystal => &[(Item::MemoryShard, 1)],
            DiscoveryKind::HiddenCache => &[(Item::Rations, 3), (Item::Rope, 1), (Item::Torch, 2)],
        }
    }

    pub fn stat_gain(&self) -> Option<(Stat, i32)> {
        match self {
            DiscoveryKind::MysteriousShrine => Some((Stat::Intelligence, 2)),
            DiscoveryKind::CorruptedFountain => Some((Stat::Strength, 3)),
            DiscoveryKind::MemoryCrystal => Some((Stat::Intelligence, 1)),
            DiscoveryKind::AncientChest | DiscoveryKind::HiddenCache => None,
        }
    }

    pub fn corruption(&self) -> i32 {
        match self {
            DiscoveryKind::CorruptedFountain => 5,
            _ => 0,
        }
    }
}

/// A discovery, already applied to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discovery {
    pub kind: DiscoveryKind,
    pub items: Vec<(Item, u32)>,
    pub stat_gain: Option<(Stat, i32)>,
    pub corruption: Option<CorruptionChange>,
}

/// Roll and apply a discovery.
pub fn discover(player: &mut PlayerState, rng: &mut GameRng) -> Discovery {
    let kind = rng.choose(&DiscoveryKind::ALL).copied().unwrap_or(DiscoveryKind::AncientChest);
    apply_discovery(kind, player)
}

pub fn apply_discovery(kind: DiscoveryKind, player: &mut PlayerState) -> Discovery {
    for (item, quantity) in kind.items() {
        player.inventory.add(*item, *quantity);
    }
    let stat_gain = kind
        .stat_gain()
        .map(|(stat, amount)| (stat, player.stats.shift(stat, amount)));
    let corruption = (kind.corruption() != 0).then(|| player.modify_corruption(kind.corruption()));

    Discovery {
        kind,
        items: kind.items().to_vec(),
        stat_gain,
        corruption,
    }
}

/// A quiet stretch of ruins. Returns the message and MP regained.
pub fn wander(player: &mut PlayerState, rng: &mut GameRng) -> (String, i32) {
    let message = rng.choose(&EMPTY_MESSAGES).copied().unwrap_or(EMPTY_MESSAGES[0]);
    let restored = if rng.percent(BREATHER_CHANCE) {
        player.restore_mp(BREATHER_MP)
    } else {
        0
    };
    (message.to_string(), restored)
}
