//! Deterministic random source for tie-breaks.
//!
//! The core only draws randomness when two throws of equal priority meet in
//! the same frame. The draw is a pure function of the match seed, the tick and
//! the two entity ids, so replays and rollback re-simulation agree.

use crate::common::EntityId;

/// RNG oracle for deterministic random number generation.
///
/// Implementations must produce the same value for the same seed.
pub trait RngOracle: Send + Sync {
    fn next_u32(&self, seed: u64) -> u32;

    /// Picks one of two entities. The result does not depend on argument order.
    fn coin_flip(&self, seed: u64, a: EntityId, b: EntityId) -> EntityId {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        if self.next_u32(seed) & 1 == 0 { lo } else { hi }
    }
}

/// PCG-XSH-RR: 64-bit state, 32-bit output.
///
/// <https://www.pcg-random.org/>
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::pcg_output(Self::pcg_step(seed))
    }
}

/// Mixes the match seed with the tick and an unordered entity pair.
pub fn compute_seed(match_seed: u64, tick: u64, a: EntityId, b: EntityId) -> u64 {
    let (lo, hi) = if a <= b { (a.0, b.0) } else { (b.0, a.0) };

    // SplitMix64 / FxHash multipliers
    let mut hash = match_seed;
    hash ^= tick.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (lo as u64).wrapping_mul(0x517cc1b727220a95);
    hash ^= (hi as u64).wrapping_mul(0x85ebca6b);

    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;

    hash
}
