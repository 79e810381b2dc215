mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use flow_scatter::distribution::{
    sample, sample_visual_density, DistributionMode, DistributionParams, NoiseDistribution,
    VisualDensity,
};
use flow_scatter::packing::PackingMode;
use flow_scatter::units::Units;

const LENGTHS_MM: [f32; 4] = [100.0, 500.0, 2_000.0, 8_000.0];

fn distribution_mode_benches(c: &mut Criterion) {
    let modes = [
        ("linear", DistributionMode::Linear),
        ("random", DistributionMode::Random),
        ("noise", DistributionMode::Noise(NoiseDistribution::default())),
    ];

    for (name, mode) in modes {
        let mut group = c.benchmark_group(format!("distribution/{name}"));
        let params = DistributionParams::new(mode, 1.0).with_seed(0xD157);

        for &length in &LENGTHS_MM {
            let expected = sample(&params, length, 1).len();
            group.throughput(common::elements_throughput(expected));
            group.bench_with_input(BenchmarkId::from_parameter(length), &length, |b, &len| {
                b.iter(|| {
                    let ts = sample(&params, len, 1);
                    black_box(ts.len());
                });
            });
        }

        group.finish();
    }
}

fn visual_density_benches(c: &mut Criterion) {
    let units = Units::millimetres();
    let visual = VisualDensity {
        footprint: 2.0,
        packing: PackingMode::Normal,
        min_spacing_mm: 0.0,
    };
    let params = DistributionParams::new(DistributionMode::Random, 1.0).with_seed(0x71);

    let mut group = c.benchmark_group("distribution/visual_density");
    for &length in &LENGTHS_MM {
        let curve = common::wave(length);
        group.throughput(common::elements_throughput(length as usize * 3));
        group.bench_with_input(BenchmarkId::from_parameter(length), &length, |b, _| {
            b.iter(|| {
                let ts = sample_visual_density(&curve, &params, &visual, &[], 1, &units);
                black_box(ts.len());
            });
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = distribution_mode_benches, visual_density_benches
}
criterion_main!(benches);
