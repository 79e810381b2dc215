//! Seed derivation.
//!
//! A placement pass never shares one random generator between its stages.
//! Each stage seeds its own stream from the path's base seed plus a fixed
//! additive offset. The offsets are part of the reproducibility contract:
//! changing any of them changes the output of every saved configuration.
//!
//! | stream                             | seed                          |
//! |------------------------------------|-------------------------------|
//! | distribution / tube candidates     | `seed`                        |
//! | noise threshold channel            | `seed + NOISE_THRESHOLD`      |
//! | tube offset noise / jitter         | `seed + TUBE_OFFSET`          |
//! | packed generator assignment        | `seed + PACKED_ASSIGNMENT`    |
//! | per-instance generator + params    | `seed + placement_index`      |
//! | per-instance shape seed            | `seed + INSTANCE_SHAPE + i`   |
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

pub const NOISE_THRESHOLD: u64 = 1000;
pub const TUBE_OFFSET: u64 = 2000;
pub const PACKED_ASSIGNMENT: u64 = 3000;
pub const INSTANCE_SHAPE: u64 = 10_000;

/// Derives a stream seed by additive offset.
#[inline]
pub fn derive(seed: u64, offset: u64) -> u64 {
    seed.wrapping_add(offset)
}

/// Deterministic generator for a derived stream.
pub fn rng_for(seed: u64, offset: u64) -> StdRng {
    StdRng::seed_from_u64(derive(seed, offset))
}

/// Generate a random float in the range [0, 1).
///
/// Uses the top 24 bits so the result is exactly representable and never
/// rounds up to 1.0.
#[inline]
pub fn rand01(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() >> 8) as f32 / (1u32 << 24) as f32
}

/// Random float in `[min, max)`. Swapped bounds are tolerated.
#[inline]
pub fn rand_range(rng: &mut dyn RngCore, min: f32, max: f32) -> f32 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    lo + rand01(rng) * (hi - lo)
}
