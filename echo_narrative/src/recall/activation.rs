//! Activation state for the spreading activation algorithm.

use std::collections::BTreeMap;

use crate::knowledge_base::Tag;

/// Tracks activation energy for tags during spreading.
///
/// Ordered by tag so repeated runs over the same graph sum energies in the
/// same order.
#[derive(Debug, Clone, Default)]
pub struct ActivationState {
    energies: BTreeMap<Tag, f32>,
}

impl ActivationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add energy to a tag (accumulates with existing energy).
    pub fn add_energy(&mut self, tag: Tag, energy: f32) {
        *self.energies.entry(tag).or_insert(0.0) += energy;
    }

    pub fn get_energy(&self, tag: &Tag) -> f32 {
        self.energies.get(tag).copied().unwrap_or(0.0)
    }

    pub fn is_active(&self, tag: &Tag) -> bool {
        self.get_energy(tag) > 0.0
    }

    /// Tags with energy at or above the threshold, hottest first.
    pub fn hot_tags(&self, threshold: f32) -> Vec<(&Tag, f32)> {
        let mut tags: Vec<_> = self
            .energies
            .iter()
            .filter(|(_, energy)| **energy >= threshold)
            .map(|(tag, energy)| (tag, *energy))
            .collect();

        tags.sort_by(|a, b| b.1.total_cmp(&a.1));
        tags
    }

    pub fn hottest_tag(&self) -> Option<(&Tag, f32)> {
        self.hot_tags(f32::MIN).into_iter().next()
    }

    pub fn total_energy(&self) -> f32 {
        self.energies.values().sum()
    }

    pub fn active_count(&self) -> usize {
        self.energies.len()
    }

    pub fn iter_energies(&self) -> impl Iterator<Item = (&Tag, &f32)> {
        self.energies.iter()
    }

    /// Remove tags with energy below threshold.
    pub fn prune(&mut self, threshold: f32) {
        self.energies.retain(|_, energy| *energy >= threshold);
    }

    pub fn clear(&mut self) {
        self.energies.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_accumulation() {
        let mut state = ActivationState::new();
        let tag = Tag::concept("system");

        state.add_energy(tag.clone(), 0.3);
        state.add_energy(tag.clone(), 0.4);

        assert!((state.get_energy(&tag) - 0.7).abs() < 0.001);
        assert!(state.is_active(&tag));
        assert!(!state.is_active(&Tag::concept("void")));
    }

    #[test]
    fn test_hot_tags() {
        let mut state = ActivationState::new();
        state.add_energy(Tag::concept("high"), 0.9);
        state.add_energy(Tag::concept("medium"), 0.5);
        state.add_energy(Tag::concept("low"), 0.1);

        let hot = state.hot_tags(0.4);
        assert_eq!(hot.len(), 2);
        assert_eq!(hot[0].0, &Tag::concept("high"));
        assert_eq!(hot[1].0, &Tag::concept("medium"));
        assert_eq!(state.hottest_tag().map(|(t, _)| t.clone()), Some(Tag::concept("high")));
    }

    #[test]
    fn test_equal_energies_keep_tag_order() {
        let mut state = ActivationState::new();
        state.add_energy(Tag::concept("b"), 0.5);
        state.add_energy(Tag::concept("a"), 0.5);

        let hot = state.hot_tags(0.0);
        assert_eq!(hot[0].0, &Tag::concept("a"));
    }

    #[test]
    fn test_prune_and_total() {
        let mut state = ActivationState::new();
        state.add_energy(Tag::concept("high"), 0.9);
        state.add_energy(Tag::concept("low"), 0.1);
        assert!((state.total_energy() - 1.0).abs() < 0.001);

        state.prune(0.5);
        assert_eq!(state.active_count(), 1);

        state.clear();
        assert_eq!(state.active_count(), 0);
    }
}
