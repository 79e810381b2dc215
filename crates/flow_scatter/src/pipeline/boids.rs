//! Cohesion relaxation over a finished instance set.
//!
//! One pass: every instance moves toward the average position of the other
//! instances within `radius`, by `strength` of the way. Neighbour positions are
//! taken from the input set, so the result does not depend on iteration order.
//! The pass is O(n²) in the number of instances.
use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pipeline::GeneratedInstance;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoidsConfig {
    /// Neighbourhood radius in render units.
    pub radius: f32,
    /// Fraction of the distance to the neighbour average moved in one pass.
    pub strength: f32,
}

impl BoidsConfig {
    pub fn new(radius: f32, strength: f32) -> Self {
        Self { radius, strength }
    }

    pub fn is_active(&self) -> bool {
        self.strength > 0.0 && self.radius > 0.0
    }

    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(Error::InvalidConfig("boids radius must be >= 0".into()));
        }
        if !self.strength.is_finite() || self.strength < 0.0 {
            return Err(Error::InvalidConfig("boids strength must be >= 0".into()));
        }
        Ok(())
    }
}

/// Applies one cohesion pass, returning new instances.
pub fn relax(instances: Vec<GeneratedInstance>, config: &BoidsConfig) -> Vec<GeneratedInstance> {
    if !config.is_active() || instances.len() < 2 {
        return instances;
    }
    let positions: Vec<Vec2> = instances.iter().map(|i| i.position).collect();
    let radius_sq = config.radius * config.radius;

    instances
        .into_iter()
        .enumerate()
        .map(|(i, instance)| {
            let here = positions[i];
            let (sum, count) = positions
                .iter()
                .enumerate()
                .filter(|(j, p)| *j != i && here.distance_squared(**p) <= radius_sq)
                .fold((Vec2::ZERO, 0usize), |(s, c), (_, p)| (s + *p, c + 1));
            if count == 0 {
                return instance;
            }
            let average = sum / count as f32;
            let delta = (average - here) * config.strength;
            GeneratedInstance {
                shape: instance.shape.translated(delta),
                position: here + delta,
                ..instance
            }
        })
        .collect()
}
