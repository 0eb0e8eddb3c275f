//! RNG oracle for deterministic damage rolls.
//!
//! Damage variance is drawn from an injectable [`RngOracle`] seeded per
//! action, so a war can be replayed exactly from its ledger inputs and tests
//! can substitute a fixed source.
//!
//! # Determinism
//!
//! All implementations must be deterministic: the same seed always yields
//! the same value.
use crate::config::WarConfig;
use crate::types::{UserId, WarId};

/// RNG oracle for deterministic random number generation.
pub trait RngOracle: Send + Sync {
    /// Generate a random u32 value from a seed.
    fn next_u32(&self, seed: u64) -> u32;

    /// Generate a random u64 value from a seed.
    fn next_u64(&self, seed: u64) -> u64 {
        let high = u64::from(self.next_u32(seed));
        let low = u64::from(self.next_u32(seed ^ 0x9e37_79b9_7f4a_7c15));
        (high << 32) | low
    }

    /// Generate a random value in range [min, max] inclusive.
    fn range(&self, seed: u64, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        let span = max - min;
        if span == u64::MAX {
            return self.next_u64(seed);
        }
        min + (self.next_u64(seed) % (span + 1))
    }
}

/// PCG random number generator (PCG-XSH-RR, 64-bit state, 32-bit output).
///
/// Stateless: each call derives its state from the seed alone.
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

/// Compute the seed of one random event.
///
/// * `war_seed` - chosen once when the war is created
/// * `nonce` - the war's transition counter (increments on every fight)
/// * `user` - acting user
/// * `context` - distinguishes several rolls within one action (0 = damage)
pub fn compute_seed(war_seed: u64, nonce: u64, user: UserId, context: u32) -> u64 {
    let mut hash = war_seed;
    hash ^= nonce.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= user.0.wrapping_mul(0x517cc1b727220a95);
    hash ^= u64::from(context).wrapping_mul(0x85ebca6b);

    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;

    hash
}

/// Mixes a war id into a caller-provided seed so two wars created with the
/// same entropy still roll independently.
pub fn war_seed(entropy: u64, war: WarId) -> u64 {
    compute_seed(entropy, war.0, UserId(0), u32::MAX)
}

/// Rolls the damage of one fight.
///
/// The mean is `strength * damage_per_strength`; the result is uniform in
/// `mean ± damage_variance_percent` and never below 1.
pub fn roll_damage(rng: &dyn RngOracle, seed: u64, strength: u32, config: &WarConfig) -> u64 {
    let mean = u64::from(strength).saturating_mul(config.damage_per_strength);
    let variance = u64::from(config.damage_variance_percent.min(99));

    let low = mean.saturating_mul(100 - variance) / 100;
    let high = mean.saturating_mul(100 + variance) / 100;

    rng.range(seed, low, high).max(1)
}
