//! Seeded random source for every roll in the game.
//!
//! Wraps `ChaCha8Rng` so that a session replays exactly for a given seed. The
//! stream position is serialized alongside the seed, so a restored session
//! continues the same sequence it would have produced without the save.

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Game random number generator.
#[derive(Debug, Clone)]
pub struct GameRng {
    rng: ChaCha8Rng,
    seed: u64,
}

#[derive(Serialize, Deserialize)]
struct RngState {
    seed: u64,
    word_pos: u128,
}

impl Serialize for GameRng {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        RngState {
            seed: self.seed,
            word_pos: self.rng.get_word_pos(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GameRng {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let state = RngState::deserialize(deserializer)?;
        let mut rng = GameRng::new(state.seed);
        rng.rng.set_word_pos(state.word_pos);
        Ok(rng)
    }
}

/// Two generators are equal when they will produce the same stream.
impl PartialEq for GameRng {
    fn eq(&self, other: &Self) -> bool {
        self.seed == other.seed && self.rng.get_word_pos() == other.rng.get_word_pos()
    }
}

impl Eq for GameRng {}

impl GameRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create a new RNG with a random seed.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// The seed this generator was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform integer in `low..=high`. Returns `low` if the range is empty.
    pub fn range(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    /// Roll 1..=100 and compare against `percent`.
    pub fn percent(&mut self, percent: u32) -> bool {
        self.rng.gen_range(1..=100) <= percent
    }

    /// True with probability `p`, clamped to `[0, 1]`.
    pub fn chance(&mut self, p: f64) -> bool {
        let p = p.clamp(0.0, 1.0);
        self.rng.gen::<f64>() < p
    }

    /// Fair coin.
    pub fn coin(&mut self) -> bool {
        self.rng.gen()
    }

    /// Choose a random element from a slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    /// Index of a weighted entry. Zero weights are never picked; returns
    /// `None` if every weight is zero.
    pub fn weighted_index(&mut self, weights: &[u32]) -> Option<usize> {
        let dist = WeightedIndex::new(weights).ok()?;
        Some(dist.sample(&mut self.rng))
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = GameRng::new(42);
        let mut b = GameRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.range(0, 1000), b.range(0, 1000));
        }
    }

    #[test]
    fn test_range_bounds() {
        let mut rng = GameRng::new(7);
        for _ in 0..1000 {
            let v = rng.range(-3, 5);
            assert!((-3..=5).contains(&v));
        }
        assert_eq!(rng.range(4, 4), 4);
        assert_eq!(rng.range(9, 2), 9);
    }

    #[test]
    fn test_weighted_index_skips_zero() {
        let mut rng = GameRng::new(1);
        for _ in 0..500 {
            assert_eq!(rng.weighted_index(&[0, 5, 0]), Some(1));
        }
        assert_eq!(rng.weighted_index(&[0, 0]), None);
        assert_eq!(rng.weighted_index(&[]), None);
    }

    #[test]
    fn test_shuffle_keeps_elements() {
        let mut rng = GameRng::new(8);
        let mut items: Vec<u32> = (0..20).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
        assert_eq!(rng.choose::<u32>(&[]), None);
        assert!(rng.choose(&items).is_some_and(|v| *v < 20));
    }

    #[test]
    fn test_chance_extremes() {
        let mut rng = GameRng::new(3);
        for _ in 0..200 {
            assert!(rng.chance(1.0));
            assert!(!rng.chance(0.0));
        }
    }

    #[test]
    fn test_serialization_resumes_stream() {
        let mut rng = GameRng::new(99);
        for _ in 0..17 {
            rng.range(0, 100);
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: GameRng = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.seed(), 99);
        for _ in 0..50 {
            assert_eq!(rng.range(0, 10_000), restored.range(0, 10_000));
        }
    }
}
