//! Packing policy: maps a packing mode and spacing nudge to a signed overlap
//! tolerance, and provides the collision tests that consume it.
//!
//! A negative tolerance permits overlap (shapes shrink before testing), a
//! positive one demands clearance (shapes grow), and any tolerance `>= 1.0`
//! disables collision checks entirely.
use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::Aabb;

/// Tolerance added per millimetre of user spacing.
pub const SPACING_TOLERANCE_PER_MM: f32 = 0.05;

/// Tolerances at or above this value skip collision checks.
pub const SKIP_COLLISION_TOLERANCE: f32 = 1.0;

/// How tightly accepted shapes may pack.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PackingMode {
    /// Allows 20% bounding-box overlap.
    Tight,
    #[default]
    Normal,
    Loose,
    /// Every candidate is accepted.
    AllowOverlap,
}

impl PackingMode {
    pub fn base_tolerance(self) -> f32 {
        match self {
            PackingMode::Tight => -0.20,
            PackingMode::Normal => 0.10,
            PackingMode::Loose => 0.25,
            PackingMode::AllowOverlap => SKIP_COLLISION_TOLERANCE,
        }
    }

    /// Candidate over-generation factor for the packed fill. Tighter packing
    /// rejects more candidates and so needs more of them.
    pub fn packed_candidate_multiplier(self) -> f32 {
        match self {
            PackingMode::Tight => 10.0,
            PackingMode::Normal | PackingMode::Loose => 5.0,
            PackingMode::AllowOverlap => 1.5,
        }
    }
}

/// Final signed tolerance for `mode` nudged by `min_spacing_mm`.
pub fn tolerance(mode: PackingMode, min_spacing_mm: f32) -> f32 {
    let nudge = if min_spacing_mm.is_finite() {
        min_spacing_mm * SPACING_TOLERANCE_PER_MM
    } else {
        0.0
    };
    mode.base_tolerance() + nudge
}

#[inline]
pub fn skips_collision(tau: f32) -> bool {
    tau >= SKIP_COLLISION_TOLERANCE
}

/// Box test: each box grows by `min(w, h) * tau * 0.5` per side before the
/// intersection test, so a negative `tau` shrinks it.
pub fn boxes_collide(a: &Aabb, b: &Aabb, tau: f32) -> bool {
    if skips_collision(tau) {
        return false;
    }
    let sa = a.inflate(a.min_dimension() * tau * 0.5);
    let sb = b.inflate(b.min_dimension() * tau * 0.5);
    // A box shrunk past zero size no longer occupies anything.
    if sa.min.x > sa.max.x || sa.min.y > sa.max.y || sb.min.x > sb.max.x || sb.min.y > sb.max.y {
        return false;
    }
    sa.intersects(&sb)
}

/// Circle test: collide when the center distance is below `(r1 + r2) * (1 + tau)`.
pub fn circles_collide(c1: Vec2, r1: f32, c2: Vec2, r2: f32, tau: f32) -> bool {
    if skips_collision(tau) {
        return false;
    }
    let min_dist = (r1 + r2) * (1.0 + tau);
    c1.distance_squared(c2) < min_dist * min_dist && min_dist > 0.0
}

/// Extra half-extent a query box needs so that a broad-phase lookup still finds
/// every box that [`boxes_collide`] could report, given the largest registered
/// box dimension `max_dim`.
pub fn box_query_margin(query: &Aabb, max_dim: f32, tau: f32) -> f32 {
    (query.min_dimension() + max_dim) * tau.abs() * 0.5
}

/// Query half-extent around a circle of radius `r` so that every circle of radius
/// up to `max_r` that [`circles_collide`] could report is found.
pub fn circle_query_radius(r: f32, max_r: f32, tau: f32) -> f32 {
    (r + max_r) * (1.0 + tau.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tight_with_zero_spacing_is_minus_twenty_percent() {
        assert_eq!(tolerance(PackingMode::Tight, 0.0), -0.20);
    }

    #[test]
    fn spacing_nudges_linearly() {
        let base = tolerance(PackingMode::Normal, 0.0);
        assert!((tolerance(PackingMode::Normal, 2.0) - (base + 0.1)).abs() < 1e-6);
        assert!((tolerance(PackingMode::Normal, -2.0) - (base - 0.1)).abs() < 1e-6);
        assert_eq!(tolerance(PackingMode::Loose, f32::NAN), 0.25);
    }

    #[test]
    fn tolerance_is_pure() {
        for mode in [
            PackingMode::Tight,
            PackingMode::Normal,
            PackingMode::Loose,
            PackingMode::AllowOverlap,
        ] {
            assert_eq!(tolerance(mode, 1.5), tolerance(mode, 1.5));
        }
    }

    #[test]
    fn allow_overlap_never_collides() {
        let tau = tolerance(PackingMode::AllowOverlap, 0.0);
        let a = Aabb::from_xywh(0.0, 0.0, 10.0, 10.0);
        assert!(skips_collision(tau));
        assert!(!boxes_collide(&a, &a, tau));
        assert!(!circles_collide(Vec2::ZERO, 5.0, Vec2::ZERO, 5.0, tau));
    }

    #[test]
    fn negative_tolerance_permits_partial_overlap_of_boxes() {
        let a = Aabb::from_xywh(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::from_xywh(9.0, 0.0, 10.0, 10.0);
        assert!(boxes_collide(&a, &b, 0.0));
        // Tight shrinks both boxes by 1 per side; the 1-unit overlap is allowed.
        assert!(!boxes_collide(&a, &b, tolerance(PackingMode::Tight, 0.0)));
        assert!(boxes_collide(&a, &b, tolerance(PackingMode::Normal, 0.0)));
    }

    #[test]
    fn positive_tolerance_demands_clearance_between_boxes() {
        let a = Aabb::from_xywh(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::from_xywh(12.5, 0.0, 10.0, 10.0);
        assert!(!boxes_collide(&a, &b, 0.1));
        assert!(boxes_collide(&a, &b, 0.3));
        assert!(!boxes_collide(&a, &b, -0.3));
    }

    #[test]
    fn spacing_adds_box_clearance() {
        let a = Aabb::from_xywh(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::from_xywh(11.5, 0.0, 10.0, 10.0);
        assert!(!boxes_collide(&a, &b, tolerance(PackingMode::Normal, 0.0)));
        assert!(boxes_collide(&a, &b, tolerance(PackingMode::Normal, 5.0)));
    }

    #[test]
    fn boxes_and_circles_agree_on_tolerance_sign() {
        // Unit squares and their inscribed circles, centres 0.9 apart.
        let a = Aabb::from_center_radius(Vec2::ZERO, 0.5);
        let b = Aabb::from_center_radius(Vec2::new(0.9, 0.0), 0.5);
        for tau in [-0.2, 0.1, 0.25] {
            assert_eq!(
                boxes_collide(&a, &b, tau),
                circles_collide(Vec2::ZERO, 0.5, Vec2::new(0.9, 0.0), 0.5, tau),
                "tau {tau}"
            );
        }
    }

    #[test]
    fn circle_distance_scales_with_tolerance() {
        // r1 + r2 = 2
        assert!(circles_collide(Vec2::ZERO, 1.0, Vec2::new(2.1, 0.0), 1.0, 0.1));
        assert!(!circles_collide(Vec2::ZERO, 1.0, Vec2::new(2.3, 0.0), 1.0, 0.1));
        assert!(!circles_collide(Vec2::ZERO, 1.0, Vec2::new(1.7, 0.0), 1.0, -0.2));
        assert!(circles_collide(Vec2::ZERO, 1.0, Vec2::new(1.5, 0.0), 1.0, -0.2));
    }

    #[test]
    fn packed_multipliers() {
        assert_eq!(PackingMode::Tight.packed_candidate_multiplier(), 10.0);
        assert_eq!(PackingMode::Normal.packed_candidate_multiplier(), 5.0);
        assert_eq!(PackingMode::Loose.packed_candidate_multiplier(), 5.0);
        assert_eq!(PackingMode::AllowOverlap.packed_candidate_multiplier(), 1.5);
    }
}
