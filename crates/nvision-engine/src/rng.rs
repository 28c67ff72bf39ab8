//! Seeded PCG32 generator for synthetic scans.
//!
//! Sample frames must be reproducible from their seed alone, so every random
//! draw in this crate goes through [`DeterministicRng`].

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// PCG32 seeded from a 32-bit value.
#[derive(Clone)]
pub struct DeterministicRng {
    inner: Pcg32,
}

impl DeterministicRng {
    /// Creates a generator from a 32-bit seed.
    ///
    /// The seed is duplicated into both halves of the 64-bit PCG state seed.
    pub fn new(seed: u32) -> Self {
        let seed64 = (seed as u64) | ((seed as u64) << 32);
        Self {
            inner: Pcg32::seed_from_u64(seed64),
        }
    }

    /// Derives an independent seed for a named stream with BLAKE3.
    pub fn derive_seed(base_seed: u32, stream: &str) -> u32 {
        let mut input = Vec::with_capacity(4 + stream.len());
        input.extend_from_slice(&base_seed.to_le_bytes());
        input.extend_from_slice(stream.as_bytes());
        let hash = blake3::hash(&input);
        let bytes = hash.as_bytes();
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Uniform `f64` in `[0, 1)`.
    #[inline]
    pub fn gen_f64(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }
}
