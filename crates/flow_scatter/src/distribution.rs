//! Distribution of normalised positions `t` in `[0, 1]` along a curve.
//!
//! [`sample`] produces an ordered list of positions for the linear, random and
//! noise modes. [`sample_visual_density`] over-generates candidates with one of
//! those modes and greedily keeps the ones whose approximate footprint does not
//! collide with earlier ones.
use tracing::{debug, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::curve::{Curve, CurveExt};
use crate::error::{Error, Result};
use crate::geometry::Aabb;
use crate::modifier::{size_multiplier, Modifier};
use crate::noise::{lerp, Noise2D};
use crate::packing::{box_query_margin, boxes_collide, skips_collision, tolerance, PackingMode};
use crate::seed::{self, rand01};
use crate::spatial::SpatialIndex;
use crate::units::Units;

/// Hard ceiling on positions generated in one pass.
pub const MAX_GENERATED_POSITIONS: usize = 10_000;

/// Candidate over-generation factor for visual-density sampling.
pub const VISUAL_DENSITY_OVERSAMPLING: usize = 3;

/// Parameters of the noise-walk distribution.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseDistribution {
    /// Noise frequency per millimetre of curve.
    pub scale: f32,
    /// Step multiplier where the noise is lowest.
    pub min_spacing: f32,
    /// Step multiplier where the noise is highest.
    pub max_spacing: f32,
    /// When set, steps whose threshold-channel noise falls below this value
    /// advance without emitting a position.
    pub threshold: Option<f32>,
}

impl Default for NoiseDistribution {
    fn default() -> Self {
        Self {
            scale: 0.05,
            min_spacing: 0.5,
            max_spacing: 1.5,
            threshold: None,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DistributionMode {
    #[default]
    Linear,
    Random,
    Noise(NoiseDistribution),
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionParams {
    pub mode: DistributionMode,
    /// Positions per linear millimetre of curve, shared by all generators.
    pub density: f32,
    pub seed: u64,
}

impl Default for DistributionParams {
    fn default() -> Self {
        Self {
            mode: DistributionMode::Linear,
            density: 0.5,
            seed: 0,
        }
    }
}

impl DistributionParams {
    pub fn new(mode: DistributionMode, density: f32) -> Self {
        Self {
            mode,
            density,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    /// Rejects non-finite numbers. Zero or negative densities are valid and
    /// clamp to a single position.
    pub fn validate(&self) -> Result<()> {
        if !self.density.is_finite() {
            return Err(Error::InvalidConfig("density must be finite".into()));
        }
        if let DistributionMode::Noise(n) = self.mode {
            if !n.scale.is_finite() || !n.min_spacing.is_finite() || !n.max_spacing.is_finite() {
                return Err(Error::InvalidConfig(
                    "noise distribution parameters must be finite".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Footprint settings for visual-density sampling.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualDensity {
    /// Average generator footprint (side of the square approximation) in render units.
    pub footprint: f32,
    pub packing: PackingMode,
    pub min_spacing_mm: f32,
}

/// `max(1, floor(length * density / max(1, generator_count)))`, capped at
/// [`MAX_GENERATED_POSITIONS`].
pub fn target_count(density: f32, curve_length_mm: f32, generator_count: usize) -> usize {
    let raw = curve_length_mm * density / generator_count.max(1) as f32;
    let count = if raw.is_finite() && raw > 0.0 {
        raw.floor().min(MAX_GENERATED_POSITIONS as f32) as usize
    } else {
        0
    };
    count.max(1)
}

/// Ordered positions along the curve for `params`.
pub fn sample(params: &DistributionParams, curve_length_mm: f32, generator_count: usize) -> Vec<f32> {
    let count = target_count(params.density, curve_length_mm, generator_count);
    let ts = candidates(params, count, curve_length_mm, true);
    debug!(
        "Distribution {:?}: {} positions over {:.1}mm.",
        params.mode,
        ts.len(),
        curve_length_mm
    );
    ts
}

/// Positions in generation order. `count` is the target for linear/random and
/// the step basis for the noise walk.
fn candidates(params: &DistributionParams, count: usize, curve_length_mm: f32, sorted: bool) -> Vec<f32> {
    let count = count.clamp(1, MAX_GENERATED_POSITIONS);
    match params.mode {
        DistributionMode::Linear => linear(count),
        DistributionMode::Random => {
            let mut rng = seed::rng_for(params.seed, 0);
            let mut ts: Vec<f32> = (0..count).map(|_| rand01(&mut rng)).collect();
            if sorted {
                ts.sort_by(f32::total_cmp);
            }
            ts
        }
        DistributionMode::Noise(noise) => noise_walk(&noise, count, curve_length_mm, params.seed),
    }
}

fn linear(count: usize) -> Vec<f32> {
    if count <= 1 {
        return vec![0.5];
    }
    let last = (count - 1) as f32;
    (0..count).map(|i| i as f32 / last).collect()
}

fn noise_walk(noise: &NoiseDistribution, count: usize, curve_length_mm: f32, seed: u64) -> Vec<f32> {
    let spacing = Noise2D::new(seed);
    let threshold = Noise2D::new(seed::derive(seed, seed::NOISE_THRESHOLD));
    let base_step = 1.0 / count as f32;
    let length = if curve_length_mm.is_finite() {
        curve_length_mm.max(0.0)
    } else {
        0.0
    };

    let mut raw: Vec<f32> = Vec::with_capacity(count);
    let mut pos = 0.0f32;
    let mut steps = 0usize;
    while pos <= 1.0 && steps < MAX_GENERATED_POSITIONS {
        steps += 1;
        // Offset y keeps samples off the lattice rows where gradient noise is zero.
        let x = pos * length * noise.scale;
        let skip = noise
            .threshold
            .is_some_and(|th| threshold.sample01(x, 0.5) < th);
        if !skip {
            raw.push(pos);
        }
        let mult = lerp(noise.min_spacing, noise.max_spacing, spacing.sample01(x, 0.5));
        pos += base_step * mult.max(0.01);
    }
    if steps >= MAX_GENERATED_POSITIONS {
        warn!(
            "Noise distribution stopped at the {} position safety cap.",
            MAX_GENERATED_POSITIONS
        );
    }

    match raw.last().copied() {
        None => raw,
        Some(last) if last > 0.0 => raw.into_iter().map(|t| t / last).collect(),
        Some(_) => vec![0.5],
    }
}

/// Visual-density sampling: over-generate, then greedily accept positions whose
/// square footprint (scaled by the size modifier) does not collide with earlier
/// accepted ones. Acceptance follows generation order, so random candidates are
/// not returned sorted.
pub fn sample_visual_density(
    curve: &dyn Curve,
    params: &DistributionParams,
    visual: &VisualDensity,
    modifiers: &[Modifier],
    generator_count: usize,
    units: &Units,
) -> Vec<f32> {
    let length_mm = units.px_to_mm(curve.length());
    let target = target_count(params.density, length_mm, generator_count);
    let wanted = target.saturating_mul(VISUAL_DENSITY_OVERSAMPLING);
    if wanted > MAX_GENERATED_POSITIONS {
        warn!(
            "Visual density wants {} candidates; capping at {}.",
            wanted, MAX_GENERATED_POSITIONS
        );
    }
    let ts = candidates(params, wanted, length_mm, false);

    let tau = tolerance(visual.packing, visual.min_spacing_mm);
    if skips_collision(tau) {
        return ts;
    }

    let footprint = if visual.footprint.is_finite() {
        visual.footprint.max(f32::EPSILON)
    } else {
        1.0
    };
    let mut index: SpatialIndex = SpatialIndex::new(footprint * 2.0);
    let mut max_dim = 0.0f32;
    let mut accepted = Vec::with_capacity(target);
    for t in ts {
        let size = (footprint * size_multiplier(t, modifiers)).abs();
        let bounds = Aabb::from_center_radius(curve.point_at_t(t), size * 0.5);
        let query = bounds.inflate(box_query_margin(&bounds, max_dim, tau));
        let blocked = index
            .nearby(&query)
            .into_iter()
            .any(|(other, _)| boxes_collide(&bounds, other, tau));
        if blocked {
            continue;
        }
        max_dim = max_dim.max(bounds.width().max(bounds.height()));
        index.add(bounds);
        accepted.push(t);
    }
    debug!(
        "Visual density accepted {} of {} candidates.",
        accepted.len(),
        wanted.min(MAX_GENERATED_POSITIONS)
    );
    accepted
}
