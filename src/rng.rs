//! Seedable randomness source for profile generation.
//!
//! Generation is a pure function of (config, catalog, randomness), so tests
//! pin a seed and get byte-identical profiles back.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform-choice source backing the generator.
pub struct Randomness {
    rng: StdRng,
}

impl Randomness {
    /// Deterministic source from a fixed seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// OS-entropy-seeded source for production use.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Uniform choice over a non-empty slice.
    ///
    /// Panics on an empty slice; catalog populations are statically non-empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        let idx = self.rng.gen_range(0..items.len());
        &items[idx]
    }

    /// Uniform draw from an inclusive integer range.
    pub fn range_inclusive(&mut self, low: u32, high: u32) -> u32 {
        self.rng.gen_range(low..=high)
    }

    /// Raw 64-bit draw, used for profile id minting.
    pub fn next_u64(&mut self) -> u64 {
        self.rng.gen()
    }
}
