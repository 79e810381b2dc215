//! Tube fill: placements inside a perpendicular band around a curve.
//!
//! At every sampled position `t` the tube has half-width `spread(t) / 2` along
//! the curve normal. Four strategies fill it:
//! - [`FillMode::Grid`]: a roughly square lattice whose spacing follows the local density.
//! - [`FillMode::Noise`]: random `t`, noise-driven offset, square-footprint rejection.
//! - [`FillMode::Random`]: random `t`, uniform offset, square-footprint rejection.
//! - [`FillMode::Packed`]: over-generated candidates with per-generator circular
//!   footprints, sorted by `t` and greedily accepted.
use glam::Vec2;
use rand::RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::curve::{Curve, CurveExt};
use crate::distribution::MAX_GENERATED_POSITIONS;
use crate::geometry::Aabb;
use crate::modifier::{size_multiplier, spaced_density, spread_width, Modifier};
use crate::noise::Noise2D;
use crate::packing::{
    box_query_margin, boxes_collide, circle_query_radius, circles_collide, skips_collision, tolerance,
    PackingMode,
};
use crate::seed::{self, rand01};
use crate::selection::pick_weighted_index;
use crate::spatial::SpatialIndex;
use crate::units::Units;

/// Density floor (per mm) applied before inverting density into a spacing.
pub const MIN_DENSITY: f32 = 0.01;

/// Minimum number of candidates for the noise and random fills.
pub const MIN_CANDIDATES: usize = 10;

/// Square-footprint radius as a fraction of the shape size for the noise and
/// random fills.
pub const FOOTPRINT_RADIUS_FACTOR: f32 = 0.35;

/// Noise frequency per millimetre for tube offsets.
pub const OFFSET_NOISE_SCALE: f32 = 0.08;

/// Samples used to estimate the mean density along the curve.
const DENSITY_SAMPLES: usize = 16;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillMode {
    Grid,
    Noise,
    #[default]
    Random,
    Packed,
}

/// An accepted position inside the tube.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Normalised position along the curve.
    pub t: f32,
    /// Signed distance along the normal, in render units.
    pub offset: f32,
    pub position: Vec2,
    /// Footprint radius used during acceptance, in render units.
    pub radius: f32,
    /// Generator slot pre-assigned by the packed fill.
    pub generator: Option<usize>,
}

/// Per-generator selection weight and accurate footprint radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub weight: f32,
    /// Bounding-circle radius in render units.
    pub radius: f32,
}

/// Footprints of the generators assigned to a path, in assignment order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FootprintTable {
    pub entries: Vec<Footprint>,
}

impl FootprintTable {
    pub fn new(entries: Vec<Footprint>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Weighted choice of a generator slot. `None` when no slot has positive weight.
    pub fn pick(&self, rng: &mut dyn RngCore) -> Option<usize> {
        pick_weighted_index(self.entries.iter().map(|e| e.weight), rng)
    }
}

/// Scalar function of the curve position `t`.
pub type Evaluator<'a> = &'a dyn Fn(f32) -> f32;

/// Everything a tube fill needs. Spread and density are authored in millimetres
/// (`spread` in mm, `density` per mm); all geometry is in render units.
pub struct TubeRequest<'a> {
    pub curve: &'a dyn Curve,
    pub spread: Evaluator<'a>,
    pub fill: FillMode,
    pub density: Evaluator<'a>,
    /// Average shape size in render units.
    pub avg_shape_size: f32,
    pub packing: PackingMode,
    pub min_spacing_mm: f32,
    pub modifiers: &'a [Modifier],
    pub seed: u64,
    pub units: Units,
    /// Generator footprints for [`FillMode::Packed`]. Without them every
    /// candidate uses half the average shape size as its radius.
    pub footprints: Option<&'a FootprintTable>,
}

/// Result of one tube fill.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct TubeResult {
    pub placements: Vec<Placement>,
    /// Candidate positions considered.
    pub candidates_evaluated: usize,
    /// Candidate positions rejected by collision checks.
    pub candidates_rejected: usize,
}

impl<'a> TubeRequest<'a> {
    /// Spread width in render units at `t`, after spread modifiers; never negative.
    pub fn spread_px(&self, t: f32) -> f32 {
        let base = (self.spread)(t);
        let w = spread_width(t, self.modifiers, if base.is_finite() { base } else { 0.0 });
        if w.is_finite() {
            self.units.mm_to_px(w.max(0.0))
        } else {
            0.0
        }
    }

    /// Density per mm at `t`, floored at [`MIN_DENSITY`].
    pub fn density_per_mm(&self, t: f32) -> f32 {
        let d = (self.density)(t);
        if d.is_finite() {
            d.max(MIN_DENSITY)
        } else {
            MIN_DENSITY
        }
    }

    /// Target spacing at `t` in render units, including spacing modifiers.
    pub fn spacing_px(&self, t: f32) -> f32 {
        let spacing_mm = 1.0 / spaced_density(t, self.modifiers, self.density_per_mm(t));
        self.units.mm_to_px(spacing_mm).max(f32::EPSILON)
    }

    fn avg_size(&self) -> f32 {
        if self.avg_shape_size.is_finite() {
            self.avg_shape_size.abs()
        } else {
            0.0
        }
    }

    fn curve_length_mm(&self) -> f32 {
        let l = self.units.px_to_mm(self.curve.length());
        if l.is_finite() {
            l.max(0.0)
        } else {
            0.0
        }
    }

    /// Expected placements: curve length times mean density, with spacing
    /// modifiers applied.
    pub fn expected_count(&self) -> usize {
        let mean = (0..DENSITY_SAMPLES)
            .map(|i| {
                let t = (i as f32 + 0.5) / DENSITY_SAMPLES as f32;
                spaced_density(t, self.modifiers, self.density_per_mm(t))
            })
            .sum::<f32>()
            / DENSITY_SAMPLES as f32;
        let raw = (self.curve_length_mm() * mean).ceil();
        raw.min(MAX_GENERATED_POSITIONS as f32) as usize
    }

    fn position(&self, t: f32, offset: f32) -> Vec2 {
        self.curve.point_at_t(t) + self.curve.normal_at_t(t) * offset
    }
}

/// Fills the tube around `request.curve`.
pub fn generate(request: &TubeRequest<'_>) -> TubeResult {
    if request.curve.length() <= 0.0 || !request.curve.length().is_finite() {
        warn!("Tube fill skipped: curve has no length.");
        return TubeResult::default();
    }
    let result = match request.fill {
        FillMode::Grid => fill_grid(request),
        FillMode::Noise => fill_scatter(request, OffsetSource::Noise),
        FillMode::Random => fill_scatter(request, OffsetSource::Uniform),
        FillMode::Packed => fill_packed(request),
    };
    debug!(
        "Tube fill {:?}: {} accepted, {} evaluated, {} rejected.",
        request.fill,
        result.placements.len(),
        result.candidates_evaluated,
        result.candidates_rejected
    );
    result
}

fn fill_grid(request: &TubeRequest<'_>) -> TubeResult {
    let length = request.curve.length();
    let mut placements = Vec::new();
    let mut arc = 0.0f32;
    'rows: while arc <= length {
        let t = arc / length;
        let spacing = request.spacing_px(t);
        let width = request.spread_px(t);
        let columns = ((width / spacing).floor() as usize).max(1);
        let first = -((columns - 1) as f32) * spacing * 0.5;
        let radius = request.avg_size() * size_multiplier(t, request.modifiers).abs() * 0.5;
        for c in 0..columns {
            if placements.len() >= MAX_GENERATED_POSITIONS {
                warn!("Grid fill stopped at the {} placement safety cap.", MAX_GENERATED_POSITIONS);
                break 'rows;
            }
            let offset = first + c as f32 * spacing;
            placements.push(Placement {
                t,
                offset,
                position: request.position(t, offset),
                radius,
                generator: None,
            });
        }
        arc += spacing;
    }
    TubeResult {
        candidates_evaluated: placements.len(),
        candidates_rejected: 0,
        placements,
    }
}

#[derive(Clone, Copy, PartialEq)]
enum OffsetSource {
    Noise,
    Uniform,
}

fn fill_scatter(request: &TubeRequest<'_>, source: OffsetSource) -> TubeResult {
    let count = (request.expected_count() * 2)
        .max(MIN_CANDIDATES)
        .min(MAX_GENERATED_POSITIONS);
    let mut rng = seed::rng_for(request.seed, 0);
    let mut offset_rng = seed::rng_for(request.seed, seed::TUBE_OFFSET);
    let noise = Noise2D::new(seed::derive(request.seed, seed::TUBE_OFFSET));
    let length_mm = request.curve_length_mm();

    let tau = tolerance(request.packing, request.min_spacing_mm);
    let skip = skips_collision(tau);
    let avg = request.avg_size();
    let mut index: SpatialIndex = SpatialIndex::new(avg * FOOTPRINT_RADIUS_FACTOR * 4.0);
    let mut max_dim = 0.0f32;

    let mut placements = Vec::new();
    let mut rejected = 0;
    for _ in 0..count {
        let t = rand01(&mut rng);
        let half = request.spread_px(t) * 0.5;
        let unit = match source {
            OffsetSource::Noise => noise.sample(t * length_mm * OFFSET_NOISE_SCALE, 0.5),
            OffsetSource::Uniform => rand01(&mut offset_rng) * 2.0 - 1.0,
        };
        let offset = (unit * half).clamp(-half, half);
        let position = request.position(t, offset);
        let radius = avg * size_multiplier(t, request.modifiers).abs() * FOOTPRINT_RADIUS_FACTOR;

        if !skip {
            let bounds = Aabb::from_center_radius(position, radius);
            let query = bounds.inflate(box_query_margin(&bounds, max_dim, tau));
            let blocked = index
                .nearby(&query)
                .into_iter()
                .any(|(other, _)| boxes_collide(&bounds, other, tau));
            if blocked {
                rejected += 1;
                continue;
            }
            max_dim = max_dim.max(radius * 2.0);
            index.add(bounds);
        }
        placements.push(Placement {
            t,
            offset,
            position,
            radius,
            generator: None,
        });
    }

    TubeResult {
        placements,
        candidates_evaluated: count,
        candidates_rejected: rejected,
    }
}

fn fill_packed(request: &TubeRequest<'_>) -> TubeResult {
    let multiplier = request.packing.packed_candidate_multiplier();
    let count = ((request.expected_count() as f32 * multiplier).ceil() as usize)
        .max(1)
        .min(MAX_GENERATED_POSITIONS);
    let mut rng = seed::rng_for(request.seed, 0);
    let mut offset_rng = seed::rng_for(request.seed, seed::TUBE_OFFSET);
    let mut assign_rng = seed::rng_for(request.seed, seed::PACKED_ASSIGNMENT);
    let footprints = request.footprints.filter(|f| !f.is_empty());
    let default_radius = request.avg_size() * 0.5;

    let mut candidates: Vec<Placement> = (0..count)
        .map(|_| {
            let t = rand01(&mut rng);
            let half = request.spread_px(t) * 0.5;
            let offset = ((rand01(&mut offset_rng) * 2.0 - 1.0) * half).clamp(-half, half);
            let generator = footprints.and_then(|f| f.pick(&mut assign_rng));
            let base_radius = generator
                .and_then(|g| footprints.map(|f| f.entries[g].radius))
                .unwrap_or(default_radius);
            Placement {
                t,
                offset,
                position: request.position(t, offset),
                radius: base_radius * size_multiplier(t, request.modifiers).abs(),
                generator,
            }
        })
        .collect();
    candidates.sort_by(|a, b| a.t.total_cmp(&b.t));

    let tau = tolerance(request.packing, request.min_spacing_mm);
    if skips_collision(tau) {
        return TubeResult {
            placements: candidates,
            candidates_evaluated: count,
            candidates_rejected: 0,
        };
    }

    let mut index: SpatialIndex<usize> = SpatialIndex::new(default_radius.max(f32::EPSILON) * 4.0);
    let mut max_radius = 0.0f32;
    let mut placements: Vec<Placement> = Vec::new();
    let mut rejected = 0;
    for candidate in candidates {
        let reach = circle_query_radius(candidate.radius, max_radius, tau);
        let query = Aabb::from_center_radius(candidate.position, reach);
        let blocked = index.nearby(&query).into_iter().any(|(_, slot)| {
            let other = &placements[*slot];
            circles_collide(candidate.position, candidate.radius, other.position, other.radius, tau)
        });
        if blocked {
            rejected += 1;
            continue;
        }
        max_radius = max_radius.max(candidate.radius);
        index.insert(
            Aabb::from_center_radius(candidate.position, candidate.radius),
            placements.len(),
        );
        placements.push(candidate);
    }

    TubeResult {
        placements,
        candidates_evaluated: count,
        candidates_rejected: rejected,
    }
}
