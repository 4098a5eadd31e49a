//! Seeded deterministic float streams.
//!
//! Every stochastic step in the engine draws from a [`SeededStream`]: a plain
//! linear-congruential recurrence over explicit numeric state, keyed by a
//! string seed. Two streams built from the same seed string produce
//! bit-identical sequences on every platform, which is what makes whole
//! simulation results reproducible and lets independent candidates be
//! evaluated in any order (each candidate derives its own stream, never
//! shares one).

use serde::{Deserialize, Serialize};

/// LCG multiplier (the classic glibc constant).
const LCG_MUL: u64 = 1_103_515_245;
/// LCG increment.
const LCG_INC: u64 = 12_345;
/// Modulus for both the state recurrence and the float output: 2^31.
const LCG_MOD: u64 = 1 << 31;

/// Deterministic stream of floats in `[0, 1)` keyed by a string seed.
///
/// The recurrence is `state = (state * 1103515245 + 12345) mod 2^31`,
/// output `state / 2^31`. The seed string is folded into the initial state
/// with a 31x polynomial hash, so nearby seeds ("run-1", "run-2") still land
/// on unrelated state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededStream {
    state: u64,
}

impl SeededStream {
    /// Creates a stream from a seed string.
    pub fn new(seed: &str) -> Self {
        let hash = seed
            .bytes()
            .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)));
        Self {
            state: u64::from(hash) % LCG_MOD,
        }
    }

    /// Creates a stream keyed by `seed` plus a derivation suffix.
    ///
    /// Used to give each simulation candidate its own independent stream:
    /// `derived("community", "alloc:0.250000,0.750000")` and the same call on
    /// another thread always agree.
    pub fn derived(seed: &str, suffix: &str) -> Self {
        Self::new(&format!("{seed}|{suffix}"))
    }

    /// Next float in `[0, 1)`.
    pub fn next(&mut self) -> f64 {
        self.state = (self.state.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC)) % LCG_MOD;
        self.state as f64 / LCG_MOD as f64
    }

    /// Next float in `[lo, hi)`.
    pub fn next_in(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next()
    }

    /// Next integer in `[0, n)`. Returns 0 when `n == 0`.
    pub fn next_index(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        // next() < 1.0, so the product stays below n.
        (self.next() * n as f64) as usize
    }

    /// Gaussian draw with mean 0 and the given sigma (Box–Muller over two
    /// uniform draws).
    pub fn gaussian(&mut self, sigma: f64) -> f64 {
        // Guard ln(0): the LCG can emit exactly 0.0.
        let u1 = self.next().max(1e-12);
        let u2 = self.next();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        z * sigma
    }
}
