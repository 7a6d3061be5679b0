//! Seeded pseudo-random number generator
//!
//! Deterministic PRNG for reproducible simulations.
//! Uses xorshift64* for the stream itself and a splitmix64 finalizer to
//! derive independent sub-streams, so every match can own its generator
//! and the whole run replays bit-for-bit from one seed.

const SEED_MIX: u64 = 0x517cc1b727220a95;
const STREAM_MIX: u64 = 0x9e3779b97f4a7c15;

/// Seeded random number generator
///
/// Deterministic: same seed (and same derivation path) = same sequence
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Create a new RNG from a 64-bit seed
    pub fn new(seed: u64) -> Self {
        let mut rng = Self::from_state(seed.wrapping_mul(SEED_MIX) ^ STREAM_MIX);

        // Warm up the generator
        for _ in 0..8 {
            rng.next_u64();
        }

        rng
    }

    /// xorshift never leaves the all-zero state, so it is never entered.
    fn from_state(state: u64) -> Self {
        Self {
            state: if state == 0 { STREAM_MIX } else { state },
        }
    }

    /// Derive an independent sub-stream without advancing this generator.
    ///
    /// `derive(k)` is a pure function of the current state and `k`, which
    /// is what lets match `k` run on any thread and still see the same
    /// numbers.
    pub fn derive(&self, stream: u64) -> Self {
        let mut z = self.state ^ stream.wrapping_add(1).wrapping_mul(STREAM_MIX);
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^= z >> 31;

        let mut rng = Self::from_state(z);
        rng.next_u64(); // Mix
        rng
    }

    /// Generate next u64
    pub fn next_u64(&mut self) -> u64 {
        // xorshift64*
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545f4914f6cdd1d)
    }

    /// Uniform float in `[0, 1)` built from the top 53 bits
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Bernoulli draw. Certain outcomes (`p <= 0` or `p >= 1`) consume nothing.
    pub fn chance(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            false
        } else if p >= 1.0 {
            true
        } else {
            self.next_f64() < p
        }
    }

    /// Generate a value in range [0, max)
    pub fn next_range(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (self.next_u64() % max as u64) as usize
    }

    /// Pick one element uniformly, `None` for an empty slice
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            items.get(self.next_range(items.len()))
        }
    }
}
