//! Seedable random number generation for bootstrap resampling.
//!
//! Wraps ChaCha20 so that a fixed seed yields a bit-identical random stream
//! across runs and platforms, which the bootstrap relies on for exact
//! reproducibility of its resample matrix.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Seedable RNG used by the bootstrap resampler.
#[derive(Clone)]
pub struct SeededRng {
    rng: ChaCha20Rng,
}

impl SeededRng {
    /// Create an RNG seeded from OS entropy (non-deterministic).
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    /// Create an RNG with a specific seed for reproducibility.
    ///
    /// `seed_from_u64` expands the u64 into the full 256-bit ChaCha20 seed,
    /// so distinct seeds produce decorrelated streams.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Entropy-seeded unless a seed is supplied.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::from_entropy(),
        }
    }

    /// Generate a random usize in the given range.
    pub fn usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.rng.gen_range(range)
    }

    /// Generate a random f64 in [0, 1).
    pub fn f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}
