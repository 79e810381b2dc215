//! Instance pipeline: turns a flow path configuration into positioned, rotated
//! and scaled shape instances.
use std::fmt;
use std::sync::Arc;

use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::curve::Curve;
use crate::distribution::DistributionMode;
use crate::error::{Error, Result};
use crate::generator::GeneratorAssignment;
use crate::geometry::Shape;
use crate::modifier::{Modifier, ResponseCurve};
use crate::packing::PackingMode;
use crate::tube::FillMode;
use crate::units::Units;

pub mod boids;
pub mod events;
pub mod runner;

pub use boids::BoidsConfig;

/// How placements are produced for a path.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathLayout {
    /// Positions directly on the curve.
    Along {
        mode: DistributionMode,
        /// Thin candidates by approximate footprint collisions.
        visual_density: bool,
    },
    /// Positions inside the tube around the curve.
    Tube { fill: FillMode },
}

impl Default for PathLayout {
    fn default() -> Self {
        PathLayout::Tube {
            fill: FillMode::Random,
        }
    }
}

/// Everything needed to regenerate the instances of one path.
#[non_exhaustive]
#[derive(Clone)]
pub struct FlowPathConfig {
    pub id: String,
    pub curve: Arc<dyn Curve>,
    pub layout: PathLayout,
    /// Placements per linear millimetre, as a function of `t`.
    pub density: ResponseCurve,
    /// Tube width in millimetres, as a function of `t`.
    pub spread: ResponseCurve,
    pub packing: PackingMode,
    pub min_spacing_mm: f32,
    pub modifiers: Vec<Modifier>,
    pub generators: Vec<GeneratorAssignment>,
    pub seed: u64,
    /// Fraction of the curve direction applied to instance rotation.
    pub follow_curve: f32,
    pub boids: Option<BoidsConfig>,
    pub units: Units,
}

impl fmt::Debug for FlowPathConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowPathConfig")
            .field("id", &self.id)
            .field("curve_length", &self.curve.length())
            .field("layout", &self.layout)
            .field("density", &self.density)
            .field("spread", &self.spread)
            .field("packing", &self.packing)
            .field("min_spacing_mm", &self.min_spacing_mm)
            .field("modifiers", &self.modifiers)
            .field("generators", &self.generators)
            .field("seed", &self.seed)
            .field("follow_curve", &self.follow_curve)
            .field("boids", &self.boids)
            .field("units", &self.units)
            .finish()
    }
}

impl FlowPathConfig {
    /// Creates a path with a random tube fill, 0.5 placements/mm, 10mm spread,
    /// normal packing and no generators.
    pub fn new(id: impl Into<String>, curve: impl Curve + 'static) -> Self {
        Self::with_shared_curve(id, Arc::new(curve))
    }

    pub fn with_shared_curve(id: impl Into<String>, curve: Arc<dyn Curve>) -> Self {
        Self {
            id: id.into(),
            curve,
            layout: PathLayout::default(),
            density: ResponseCurve::Constant(0.5),
            spread: ResponseCurve::Constant(10.0),
            packing: PackingMode::Normal,
            min_spacing_mm: 0.0,
            modifiers: Vec::new(),
            generators: Vec::new(),
            seed: 0,
            follow_curve: 1.0,
            boids: None,
            units: Units::default(),
        }
    }

    pub fn with_layout(mut self, layout: PathLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_fill(self, fill: FillMode) -> Self {
        self.with_layout(PathLayout::Tube { fill })
    }

    pub fn with_density(mut self, density: ResponseCurve) -> Self {
        self.density = density;
        self
    }

    pub fn with_spread(mut self, spread: ResponseCurve) -> Self {
        self.spread = spread;
        self
    }

    pub fn with_packing(mut self, packing: PackingMode) -> Self {
        self.packing = packing;
        self
    }

    pub fn with_min_spacing_mm(mut self, min_spacing_mm: f32) -> Self {
        self.min_spacing_mm = min_spacing_mm;
        self
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn with_generator(mut self, assignment: GeneratorAssignment) -> Self {
        self.generators.push(assignment);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_follow_curve(mut self, follow_curve: f32) -> Self {
        self.follow_curve = follow_curve;
        self
    }

    pub fn with_boids(mut self, boids: BoidsConfig) -> Self {
        self.boids = Some(boids);
        self
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.generators.is_empty() {
            return Err(Error::NoGenerators {
                path: self.id.clone(),
            });
        }
        if !self
            .generators
            .iter()
            .any(|g| g.weight.is_finite() && g.weight > 0.0)
        {
            return Err(Error::InvalidConfig(format!(
                "path '{}' has no generator with a positive weight",
                self.id
            )));
        }
        if !self.min_spacing_mm.is_finite() {
            return Err(Error::InvalidConfig("min_spacing_mm must be finite".into()));
        }
        if !self.follow_curve.is_finite() {
            return Err(Error::InvalidConfig("follow_curve must be finite".into()));
        }
        if let Some(boids) = &self.boids {
            boids.validate()?;
        }
        Ok(())
    }
}

/// A positioned shape produced by the pipeline.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedInstance {
    pub id: String,
    /// Final shape, already rotated, scaled and translated.
    pub shape: Shape,
    pub position: Vec2,
    /// Rotation in degrees.
    pub rotation: f32,
    pub scale: f32,
    /// Id of the path that produced this instance.
    pub source_id: String,
    pub generator_type: String,
}

/// Counters of a placement pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaceStats {
    pub candidates_evaluated: usize,
    pub candidates_rejected: usize,
    pub placements: usize,
    pub instances: usize,
}

/// Result of placing one path.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct PlaceResult {
    pub instances: Vec<GeneratedInstance>,
    pub stats: PlaceStats,
}
