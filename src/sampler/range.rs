// src/sampler/range.rs
//! Random-offset batch ranges over a bounded tree size.
//!
//! Sampling is with replacement: ranges from successive calls may overlap
//! or repeat. That is a deliberate statistical-sampling choice, not a
//! coverage guarantee.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces random inclusive index ranges sized to one get-entries batch
pub struct RangeSampler {
    batch_size: u64,
    rng: StdRng,
}

impl RangeSampler {
    pub fn new(batch_size: u64) -> Self {
        Self::from_rng(batch_size, StdRng::from_entropy())
    }

    /// Deterministic sampler for tests
    pub fn with_seed(batch_size: u64, seed: u64) -> Self {
        Self::from_rng(batch_size, StdRng::seed_from_u64(seed))
    }

    fn from_rng(batch_size: u64, rng: StdRng) -> Self {
        assert!(batch_size > 0, "batch size must be positive");
        Self { batch_size, rng }
    }

    /// Next inclusive range `(first, last)` with `last < tree_size`.
    ///
    /// `first` is uniform in `[0, tree_size)`; a start landing in the
    /// final batch-size positions is shifted down one batch so the range
    /// fits, saturating at zero. Trees no larger than one batch yield the
    /// full range `[0, tree_size - 1]`.
    ///
    /// `tree_size` must be positive.
    pub fn next_range(&mut self, tree_size: u64) -> (u64, u64) {
        assert!(tree_size > 0, "tree size must be positive");

        if tree_size <= self.batch_size {
            return (0, tree_size - 1);
        }

        let mut first = self.rng.gen_range(0..tree_size);
        if first + self.batch_size > tree_size {
            first = first.saturating_sub(self.batch_size);
        }

        (first, first + self.batch_size - 1)
    }
}
