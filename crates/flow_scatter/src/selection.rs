//! Weighted selection of generators.
//!
//! - [pick_weighted_index]: draws an index proportionally to its weight.
//! - [pick_weighted_assignment]: draws a [`GeneratorAssignment`] from a path's list.
//!
//! Non-positive and non-finite weights are never picked. When randomness is
//! required, pass an RNG that implements [rand::RngCore].
use rand::RngCore;

use crate::generator::GeneratorAssignment;
use crate::seed::rand01;

#[inline]
fn usable(weight: f32) -> bool {
    weight.is_finite() && weight > 0.0
}

pub fn pick_weighted_index(
    weights: impl Iterator<Item = f32> + Clone,
    rng: &mut dyn RngCore,
) -> Option<usize> {
    let total: f32 = weights.clone().filter(|w| usable(*w)).sum();
    if total <= 0.0 {
        return None;
    }

    let mut roll = rand01(rng) * total;
    let mut last_usable = None;
    for (i, w) in weights.enumerate() {
        if !usable(w) {
            continue;
        }
        last_usable = Some(i);
        roll -= w;
        if roll < 0.0 {
            return Some(i);
        }
    }

    // Rounding can leave a tiny positive remainder.
    last_usable
}

pub fn pick_weighted_assignment<'a>(
    assignments: &'a [GeneratorAssignment],
    rng: &mut dyn RngCore,
) -> Option<(usize, &'a GeneratorAssignment)> {
    pick_weighted_index(assignments.iter().map(|a| a.weight), rng).map(|i| (i, &assignments[i]))
}
