//! Building blocks of the player state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Item;

/// Core attribute block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    pub strength: i32,
    pub agility: i32,
    pub intelligence: i32,
    /// Hidden stat; always used in rolls, only shown at high corruption.
    pub luck: i32,
}

impl Default for StatBlock {
    fn default() -> Self {
        Self {
            strength: 10,
            agility: 10,
            intelligence: 10,
            luck: 5,
        }
    }
}

/// Attribute selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Strength,
    Agility,
    Intelligence,
    Luck,
}

impl Stat {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Stat::Strength => "STR",
            Stat::Agility => "AGI",
            Stat::Intelligence => "INT",
            Stat::Luck => "LUCK",
        }
    }
}

impl StatBlock {
    pub fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Strength => self.strength,
            Stat::Agility => self.agility,
            Stat::Intelligence => self.intelligence,
            Stat::Luck => self.luck,
        }
    }

    /// Add `delta` to a stat. Stats never drop below 1.
    pub fn shift(&mut self, stat: Stat, delta: i32) -> i32 {
        let slot = match stat {
            Stat::Strength => &mut self.strength,
            Stat::Agility => &mut self.agility,
            Stat::Intelligence => &mut self.intelligence,
            Stat::Luck => &mut self.luck,
        };
        let before = *slot;
        *slot = slot.saturating_add(delta).max(1);
        *slot - before
    }
}

/// Actions that may raise a stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthAction {
    Attack,
    Analyze,
    Flee,
    LoreDiscovery,
}

impl GrowthAction {
    /// The single stat this action trains.
    pub fn trained_stat(&self) -> Stat {
        match self {
            GrowthAction::Attack => Stat::Strength,
            GrowthAction::Analyze => Stat::Intelligence,
            GrowthAction::Flee => Stat::Agility,
            GrowthAction::LoreDiscovery => Stat::Intelligence,
        }
    }
}

/// Item counts. Entries with zero count are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Inventory {
    items: BTreeMap<Item, u32>,
}

impl Inventory {
    pub fn add(&mut self, item: Item, quantity: u32) {
        if quantity == 0 {
            return;
        }
        *self.items.entry(item).or_default() += quantity;
    }

    /// Remove up to `quantity`; returns how many were removed.
    pub fn remove(&mut self, item: Item, quantity: u32) -> u32 {
        let Some(count) = self.items.get_mut(&item) else {
            return 0;
        };
        let removed = quantity.min(*count);
        *count -= removed;
        if *count == 0 {
            self.items.remove(&item);
        }
        removed
    }

    pub fn count(&self, item: Item) -> u32 {
        self.items.get(&item).copied().unwrap_or(0)
    }

    pub fn has(&self, item: Item) -> bool {
        self.count(item) > 0
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Item, u32)> + '_ {
        self.items.iter().map(|(item, count)| (*item, *count))
    }
}

/// How often the player has taken each combat action.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionTally {
    pub attacks: u32,
    pub analyzes: u32,
    pub flees: u32,
    pub skills_used: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stats() {
        let stats = StatBlock::default();
        assert_eq!(stats.get(Stat::Strength), 10);
        assert_eq!(stats.get(Stat::Luck), 5);
    }

    #[test]
    fn test_shift_floors_at_one() {
        let mut stats = StatBlock::default();
        assert_eq!(stats.shift(Stat::Agility, -50), -9);
        assert_eq!(stats.agility, 1);
        assert_eq!(stats.shift(Stat::Agility, 4), 4);
        assert_eq!(stats.agility, 5);
    }

    #[test]
    fn test_growth_mapping() {
        assert_eq!(GrowthAction::Attack.trained_stat(), Stat::Strength);
        assert_eq!(GrowthAction::Analyze.trained_stat(), Stat::Intelligence);
        assert_eq!(GrowthAction::Flee.trained_stat(), Stat::Agility);
        assert_eq!(GrowthAction::LoreDiscovery.trained_stat(), Stat::Intelligence);
    }

    #[test]
    fn test_inventory_counts() {
        let mut inv = Inventory::default();
        inv.add(Item::MemoryShard, 2);
        inv.add(Item::MemoryShard, 1);
        inv.add(Item::Torch, 0);

        assert_eq!(inv.count(Item::MemoryShard), 3);
        assert!(!inv.has(Item::Torch));

        assert_eq!(inv.remove(Item::MemoryShard, 5), 3);
        assert!(inv.is_empty());
        assert_eq!(inv.remove(Item::Rope, 1), 0);
    }
}
