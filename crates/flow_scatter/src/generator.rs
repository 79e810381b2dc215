//! Shape generator protocol and an injectable registry.
//!
//! A generator turns `(t, params, seed)` into a small vector [`Shape`]. Output must
//! be a pure function of those inputs so that regeneration is reproducible.
use std::collections::{BTreeMap, HashMap};
use std::f32::consts::TAU;
use std::fmt;
use std::sync::Arc;

use glam::Vec2;
use rand::RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::{Shape, SubPath};
use crate::seed;
use crate::value::ParamValue;

pub type GeneratorId = String;

/// Authored parameters; values may be random ranges.
pub type GeneratorParams = BTreeMap<String, ParamValue>;

/// Concrete parameters handed to a generator.
pub type ResolvedParams = BTreeMap<String, f32>;

/// Produces a vector shape for a position on the curve.
pub trait ShapeGenerator: Send + Sync {
    fn generate(&self, t: f32, params: &ResolvedParams, seed: u64) -> Shape;

    fn default_params(&self) -> GeneratorParams;
}

/// Turns authored parameters into concrete ones at a curve position.
pub trait ParamEvaluator: Send + Sync {
    fn evaluate(&self, params: &GeneratorParams, t: f32, rng: &mut dyn RngCore) -> ResolvedParams;
}

/// Resolves every [`ParamValue`] with the supplied rng, in key order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveRanges;

impl ParamEvaluator for ResolveRanges {
    fn evaluate(&self, params: &GeneratorParams, _t: f32, rng: &mut dyn RngCore) -> ResolvedParams {
        params
            .iter()
            .map(|(k, v)| (k.clone(), v.resolve(rng)))
            .collect()
    }
}

/// A generator assigned to a path with a selection weight and parameter
/// overrides.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorAssignment {
    pub generator_type: GeneratorId,
    pub weight: f32,
    /// Overrides merged over the generator's defaults.
    pub params: GeneratorParams,
    /// Orient instances along the curve normal instead of the tangent.
    pub follow_normal: bool,
}

impl GeneratorAssignment {
    pub fn new(generator_type: impl Into<GeneratorId>) -> Self {
        Self {
            generator_type: generator_type.into(),
            weight: 1.0,
            params: GeneratorParams::new(),
            follow_normal: false,
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_follow_normal(mut self, follow_normal: bool) -> Self {
        self.follow_normal = follow_normal;
        self
    }

    /// Generator defaults with this assignment's overrides applied.
    pub fn merged_params(&self, generator: &dyn ShapeGenerator) -> GeneratorParams {
        let mut merged = generator.default_params();
        merged.extend(self.params.iter().map(|(k, v)| (k.clone(), *v)));
        merged
    }
}

/// Registry of generators by type name. Passed explicitly to the runner.
#[derive(Clone, Default)]
pub struct GeneratorRegistry {
    generators: HashMap<GeneratorId, Arc<dyn ShapeGenerator>>,
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.generators.keys().collect();
        ids.sort();
        f.debug_struct("GeneratorRegistry")
            .field("generators", &ids)
            .finish()
    }
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with [`CircleGenerator`] (`"circle"`) and [`RectGenerator`] (`"rect"`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("circle", CircleGenerator);
        registry.register("rect", RectGenerator);
        registry
    }

    pub fn register<G: ShapeGenerator + 'static>(&mut self, id: impl Into<GeneratorId>, generator: G) {
        self.register_arc(id, Arc::new(generator));
    }

    pub fn register_arc(&mut self, id: impl Into<GeneratorId>, generator: Arc<dyn ShapeGenerator>) {
        self.generators.insert(id.into(), generator);
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn ShapeGenerator>> {
        self.generators.get(id)
    }

    /// Like [`GeneratorRegistry::get`] but an unknown id is an error.
    pub fn try_get(&self, id: &str) -> Result<&Arc<dyn ShapeGenerator>> {
        self.get(id)
            .ok_or_else(|| Error::UnknownGenerator { id: id.to_owned() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.generators.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

/// Bounding-circle radius of `generator` sampled at `t = 0.5` with nominal
/// parameters: half the diagonal of the output bounds.
pub fn footprint_radius(generator: &dyn ShapeGenerator, params: &GeneratorParams, seed: u64) -> f32 {
    let nominal: ResolvedParams = params.iter().map(|(k, v)| (k.clone(), v.nominal())).collect();
    let shape = generator.generate(0.5, &nominal, seed);
    let r = shape.bounds.diagonal() * 0.5;
    if r.is_finite() {
        r
    } else {
        0.0
    }
}

fn param(params: &ResolvedParams, key: &str, default: f32) -> f32 {
    params.get(key).copied().filter(|v| v.is_finite()).unwrap_or(default)
}

/// Closed polygon approximating a circle. Params: `radius`, `segments`, `jitter`
/// (relative radial noise per vertex, seeded).
#[derive(Debug, Clone, Copy, Default)]
pub struct CircleGenerator;

impl ShapeGenerator for CircleGenerator {
    fn generate(&self, _t: f32, params: &ResolvedParams, seed: u64) -> Shape {
        let radius = param(params, "radius", 2.0).abs();
        let segments = (param(params, "segments", 16.0) as usize).clamp(3, 256);
        let jitter = param(params, "jitter", 0.0).clamp(0.0, 1.0);
        let mut rng = seed::rng_for(seed, 0);
        let points = (0..segments)
            .map(|i| {
                let angle = TAU * i as f32 / segments as f32;
                let r = radius * (1.0 + jitter * (seed::rand01(&mut rng) * 2.0 - 1.0));
                Vec2::from_angle(angle) * r
            })
            .collect();
        Shape::from_subpaths(vec![SubPath::new(points, true)]).with_anchor(Vec2::ZERO)
    }

    fn default_params(&self) -> GeneratorParams {
        GeneratorParams::from([
            ("radius".to_owned(), ParamValue::Scalar(2.0)),
            ("segments".to_owned(), ParamValue::Scalar(16.0)),
            ("jitter".to_owned(), ParamValue::Scalar(0.0)),
        ])
    }
}

/// Axis-aligned rectangle centred on its anchor. Params: `width`, `height`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RectGenerator;

impl ShapeGenerator for RectGenerator {
    fn generate(&self, _t: f32, params: &ResolvedParams, _seed: u64) -> Shape {
        let hw = param(params, "width", 4.0).abs() * 0.5;
        let hh = param(params, "height", 1.0).abs() * 0.5;
        let points = vec![
            Vec2::new(-hw, -hh),
            Vec2::new(hw, -hh),
            Vec2::new(hw, hh),
            Vec2::new(-hw, hh),
        ];
        Shape::from_subpaths(vec![SubPath::new(points, true)]).with_anchor(Vec2::ZERO)
    }

    fn default_params(&self) -> GeneratorParams {
        GeneratorParams::from([
            ("width".to_owned(), ParamValue::Scalar(4.0)),
            ("height".to_owned(), ParamValue::Scalar(1.0)),
        ])
    }
}
