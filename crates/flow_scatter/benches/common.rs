use std::time::Duration;

use criterion::{Criterion, Throughput};
use flow_scatter::curve::Polyline;
use glam::Vec2;

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// Sine wave along x, roughly `length` units long, flattened into a polyline.
pub fn wave(length: f32) -> Polyline {
    const STEPS: usize = 512;
    Polyline::open((0..=STEPS).map(|i| {
        let x = length * i as f32 / STEPS as f32;
        Vec2::new(x, (x * 0.02).sin() * 40.0)
    }))
}
