//! Deterministic random source for plan generation and mutation.
//!
//! Every random decision a mutator makes is drawn from a [`SimRng`]. Two
//! runs with the same seed against the same base plan produce identical
//! mutations, which is what makes a failing upgrade test reproducible.
//!
//! A `SimRng` is not meant to be shared between concurrently running
//! mutators; [`fork`](SimRng::fork) hands out independent, still
//! deterministic, streams instead.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng as _, RngCore, SeedableRng};

/// Seedable, reproducible random number generator.
#[derive(Debug, Clone)]
pub struct SimRng {
    seed: u64,
    inner: SmallRng,
}

impl SimRng {
    /// Creates a generator from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: SmallRng::seed_from_u64(seed),
        }
    }

    /// Creates a generator from OS entropy, returning it with the seed used
    /// so the run can be replayed.
    pub fn from_entropy() -> (Self, u64) {
        let seed = rand::thread_rng().r#gen::<u64>();
        (Self::new(seed), seed)
    }

    /// The seed this generator was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    pub fn next_bool(&mut self) -> bool {
        self.inner.r#gen()
    }

    /// Generates a random `f64` in `[0.0, 1.0)`.
    pub fn next_f64(&mut self) -> f64 {
        self.inner.r#gen()
    }

    /// Returns `true` with the given probability.
    pub fn next_bool_with_probability(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }

    /// Generates a random `usize` in `[0, max)`.
    ///
    /// # Panics
    ///
    /// Panics if `max` is zero.
    pub fn next_usize(&mut self, max: usize) -> usize {
        self.inner.gen_range(0..max)
    }

    /// Generates a random `usize` in `[min, max]`.
    pub fn next_usize_inclusive(&mut self, min: usize, max: usize) -> usize {
        self.inner.gen_range(min..=max)
    }

    /// Picks one element uniformly, or `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.inner)
    }

    /// Shuffles `items` in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }

    /// Picks `amount` distinct indices from `0..len`, returned in
    /// ascending order. `amount` is clamped to `len`.
    pub fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        let amount = amount.min(len);
        let mut indices =
            rand::seq::index::sample(&mut self.inner, len, amount).into_vec();
        indices.sort_unstable();
        indices
    }

    /// Forks an independent generator with a seed derived from this one.
    pub fn fork(&mut self) -> SimRng {
        SimRng::new(self.next_u64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut rng1 = SimRng::new(12345);
        let mut rng2 = SimRng::new(12345);

        for _ in 0..100 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn next_usize_stays_in_range() {
        let mut rng = SimRng::new(7);
        for _ in 0..1000 {
            assert!(rng.next_usize(5) < 5);
            let v = rng.next_usize_inclusive(1, 3);
            assert!((1..=3).contains(&v));
        }
    }

    #[test]
    fn next_bool_with_probability_extremes() {
        let mut rng = SimRng::new(12345);

        for _ in 0..10 {
            assert!(!rng.next_bool_with_probability(0.0));
            assert!(rng.next_bool_with_probability(1.0));
        }
    }

    #[test]
    fn sample_indices_are_sorted_distinct_and_clamped() {
        let mut rng = SimRng::new(99);

        let picked = rng.sample_indices(10, 4);
        assert_eq!(picked.len(), 4);
        assert!(picked.windows(2).all(|w| w[0] < w[1]));
        assert!(picked.iter().all(|i| *i < 10));

        let all = rng.sample_indices(3, 10);
        assert_eq!(all, vec![0, 1, 2]);

        assert!(rng.sample_indices(0, 2).is_empty());
    }

    #[test]
    fn choose_handles_empty_slices() {
        let mut rng = SimRng::new(1);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert_eq!(rng.choose(&[42]), Some(&42));
    }

    #[test]
    fn fork_is_deterministic_but_independent() {
        let mut master1 = SimRng::new(12345);
        let mut master2 = SimRng::new(12345);

        let mut child1 = master1.fork();
        let mut child2 = master2.fork();
        assert_eq!(child1.next_u64(), child2.next_u64());
        assert_ne!(child1.seed(), 12345);
    }
}
