use flow_scatter::prelude::*;
use flow_scatter_examples::{init_tracing, render_instances_to_png, RenderConfig};
use glam::Vec2;

const ROW_HEIGHT: f32 = 200.0;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let registry = GeneratorRegistry::with_builtins();
    let runner = FlowRunner::new(&registry);

    let fills = [
        FillMode::Grid,
        FillMode::Noise,
        FillMode::Random,
        FillMode::Packed,
    ];
    let curves: Vec<Polyline> = (0..fills.len())
        .map(|row| wave(Vec2::new(40.0, 100.0 + row as f32 * ROW_HEIGHT), 920.0))
        .collect();

    let configs: Vec<FlowPathConfig> = fills
        .iter()
        .zip(&curves)
        .map(|(fill, curve)| {
            FlowPathConfig::new(format!("{fill:?}").to_lowercase(), curve.clone())
                .with_fill(*fill)
                .with_density(ResponseCurve::Constant(0.4))
                .with_spread(ResponseCurve::Constant(30.0))
                .with_generator(
                    GeneratorAssignment::new("circle").with_param("radius", (3.0, 7.0)),
                )
                .with_generator(
                    GeneratorAssignment::new("rect")
                        .with_weight(0.5)
                        .with_param("width", 12.0)
                        .with_param("height", 4.0),
                )
                .with_seed(7)
        })
        .collect();

    let results = runner.place_paths(&configs)?;
    for (cfg, result) in configs.iter().zip(&results) {
        println!(
            "{:>8}: {} instances, {} candidates, {} rejected",
            cfg.id, result.stats.instances, result.stats.candidates_evaluated, result.stats.candidates_rejected
        );
    }

    let instances: Vec<GeneratedInstance> =
        results.into_iter().flat_map(|r| r.instances).collect();
    let mut config = RenderConfig::new(
        (1000, 800),
        Vec2::ZERO,
        Vec2::new(1000.0, ROW_HEIGHT * fills.len() as f32),
    );
    config
        .set_generator_style("circle", [40, 110, 60])
        .set_generator_style("rect", [50, 70, 160]);

    let curve_refs: Vec<&dyn Curve> = curves.iter().map(|c| c as &dyn Curve).collect();
    render_instances_to_png(&curve_refs, &instances, &config, "tube-fill-modes.png")
}

fn wave(origin: Vec2, length: f32) -> Polyline {
    Polyline::open((0..=200).map(|i| {
        let x = length * i as f32 / 200.0;
        origin + Vec2::new(x, (x * 0.012).sin() * 35.0)
    }))
}
