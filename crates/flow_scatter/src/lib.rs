#![forbid(unsafe_code)]
//! flow_scatter: deterministic placement of generated vector shapes along and
//! around 2D curves.
//!
//! Modules:
//! - curve, geometry, units: curve protocol, shape geometry, mm to render units
//! - distribution: positions on the curve (linear, random, noise walk, visual density)
//! - tube: positions inside the band around the curve (grid, noise, random, packed)
//! - packing, spatial: collision tolerance and the uniform-grid broad phase
//! - modifier: size, rotation, spacing and spread response curves over `t`
//! - generator, selection: shape generators, injectable registry, weighted picks
//! - pipeline: path configuration, runner, events, boids relaxation
//!
//! All randomness derives from a per-path seed; identical inputs give identical output.
pub mod curve;
pub mod distribution;
pub mod error;
pub mod generator;
pub mod geometry;
pub mod modifier;
pub mod noise;
pub mod packing;
pub mod pipeline;
pub mod seed;
pub mod selection;
pub mod spatial;
pub mod tube;
pub mod units;
pub mod value;

/// Convenient re-exports for common types. Import with `use flow_scatter::prelude::*;`.
pub mod prelude {
    pub use crate::curve::{Curve, CurveExt, Polyline};
    pub use crate::distribution::{
        DistributionMode, DistributionParams, NoiseDistribution, VisualDensity,
    };
    pub use crate::error::{Error, Result};
    pub use crate::generator::{
        CircleGenerator, GeneratorAssignment, GeneratorParams, GeneratorRegistry, ParamEvaluator,
        RectGenerator, ResolveRanges, ResolvedParams, ShapeGenerator,
    };
    pub use crate::geometry::{Aabb, Shape, SubPath};
    pub use crate::modifier::{Modifier, ModifierKind, ResponseCurve, TRange};
    pub use crate::packing::PackingMode;
    pub use crate::pipeline::events::{
        EventSink, FnSink, PlacementEvent, PlacementEventKind, VecSink,
    };
    pub use crate::pipeline::runner::{place, FlowRunner};
    pub use crate::pipeline::{
        BoidsConfig, FlowPathConfig, GeneratedInstance, PathLayout, PlaceResult, PlaceStats,
    };
    pub use crate::spatial::SpatialIndex;
    pub use crate::tube::{FillMode, Placement};
    pub use crate::units::Units;
    pub use crate::value::ParamValue;
}
