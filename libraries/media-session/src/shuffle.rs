//! Shuffle index selection
//!
//! Picks the next track in shuffle mode: uniform over every index except
//! the current one, in a single draw.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces random playlist indices distinct from the current one
#[derive(Debug, Clone)]
pub struct ShuffleIndexGenerator {
    rng: StdRng,
}

impl Default for ShuffleIndexGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShuffleIndexGenerator {
    /// Create a generator seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a reproducible generator
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Pick an index in `[0, len)` that differs from `current`
    ///
    /// Returns 0 when `len <= 1`. Draws from the `len - 1` other slots and
    /// shifts past `current`, so it never retries.
    pub fn next_index(&mut self, len: usize, current: usize) -> usize {
        if len <= 1 {
            return 0;
        }

        if current >= len {
            return self.rng.gen_range(0..len);
        }

        let pick = self.rng.gen_range(0..len - 1);
        if pick >= current {
            pick + 1
        } else {
            pick
        }
    }
}
