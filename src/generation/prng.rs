//! # Seeded PRNG
//!
//! PCG-XSH-RR 32-bit generator. The output stream depends only on the seed, so
//! the same seed produces the same levels on every platform.
//!
//! [`SeededRng`] implements [`rand::RngCore`], so the usual `rand` helpers
//! (`gen_range`, `shuffle`, ...) can drive it. Index draws used by the
//! generator go through [`SeededRng::index`], which always samples a `u32`
//! range and therefore consumes the stream identically on 32- and 64-bit
//! targets.

use super::Seed;
use rand::{Rng, RngCore};

const MULTIPLIER: u64 = 6_364_136_223_846_793_005;

/// Stream selector shared by every generation run.
const STREAM: u64 = 0x5eed_b0c5;

/// Deterministic random number generator owned by one generation run.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u64,
    inc: u64,
}

impl SeededRng {
    /// Creates a generator for a seed value and stream.
    pub fn new(seed: u64, seq: u64) -> Self {
        let inc = (seq << 1) | 1;
        let mut rng = Self { state: 0, inc };
        rng.advance();
        rng.state = rng.state.wrapping_add(seed);
        rng.advance();
        rng
    }

    /// Creates the generator used for a generation seed.
    pub fn from_seed_value(seed: &Seed) -> Self {
        Self::new(seed.to_u64(), STREAM)
    }

    fn advance(&mut self) {
        self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(self.inc);
    }

    fn step(&mut self) -> u32 {
        let old = self.state;
        self.advance();
        let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_float(&mut self) -> f64 {
        f64::from(self.step()) / (f64::from(u32::MAX) + 1.0)
    }

    /// Uniform index in `0..len`. `len` must be positive and fit in a `u32`.
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0 && len <= u32::MAX as usize);
        self.gen_range(0..len as u32) as usize
    }

    /// Fisher-Yates shuffle driven by [`SeededRng::index`].
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.index(i + 1);
            items.swap(i, j);
        }
    }

    /// Picks a reference to a random element, or `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            Some(&items[self.index(items.len())])
        }
    }
}

impl RngCore for SeededRng {
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    fn next_u64(&mut self) -> u64 {
        let low = u64::from(self.step());
        let high = u64::from(self.step());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
