//! Parameters that are either a fixed number or a random range.
use rand::RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::seed::rand_range;

/// A generator or layout parameter.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Scalar(f32),
    /// Uniformly drawn from `[min, max)` each time it is resolved.
    Range { min: f32, max: f32 },
}

impl ParamValue {
    pub fn range(min: f32, max: f32) -> Self {
        ParamValue::Range { min, max }
    }

    /// Concrete value for one use. Scalars never consume randomness, so adding a
    /// range elsewhere does not shift the stream of unrelated scalars.
    pub fn resolve(&self, rng: &mut dyn RngCore) -> f32 {
        match *self {
            ParamValue::Scalar(v) => v,
            ParamValue::Range { min, max } => rand_range(rng, min, max),
        }
    }

    /// Midpoint for ranges, the value itself for scalars.
    pub fn nominal(&self) -> f32 {
        match *self {
            ParamValue::Scalar(v) => v,
            ParamValue::Range { min, max } => (min + max) * 0.5,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Scalar(value)
    }
}

impl From<(f32, f32)> for ParamValue {
    fn from((min, max): (f32, f32)) -> Self {
        ParamValue::Range { min, max }
    }
}

// Unsuffixed float literals default to f64.
impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Scalar(value as f32)
    }
}

impl From<(f64, f64)> for ParamValue {
    fn from((min, max): (f64, f64)) -> Self {
        ParamValue::Range {
            min: min as f32,
            max: max as f32,
        }
    }
}
