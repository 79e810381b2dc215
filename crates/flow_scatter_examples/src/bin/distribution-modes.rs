use flow_scatter::prelude::*;
use flow_scatter_examples::{init_tracing, render_instances_to_png, RenderConfig};
use glam::Vec2;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let registry = GeneratorRegistry::with_builtins();
    let runner = FlowRunner::new(&registry);

    let layouts = [
        ("linear", DistributionMode::Linear, false),
        ("random", DistributionMode::Random, false),
        (
            "noise",
            DistributionMode::Noise(NoiseDistribution {
                threshold: Some(-0.2),
                ..NoiseDistribution::default()
            }),
            false,
        ),
        ("visual", DistributionMode::Random, true),
    ];

    let mut curves = Vec::new();
    let mut instances = Vec::new();
    for (row, (name, mode, visual_density)) in layouts.into_iter().enumerate() {
        let y = 80.0 + row as f32 * 140.0;
        let curve = Polyline::from_cubics(
            &[[
                Vec2::new(40.0, y),
                Vec2::new(300.0, y - 90.0),
                Vec2::new(650.0, y + 90.0),
                Vec2::new(960.0, y),
            ]],
            64,
            false,
        );
        let cfg = FlowPathConfig::new(name, curve.clone())
            .with_layout(PathLayout::Along {
                mode,
                visual_density,
            })
            .with_density(ResponseCurve::Constant(0.6))
            .with_generator(
                GeneratorAssignment::new("rect")
                    .with_param("width", 14.0)
                    .with_param("height", 3.0),
            )
            .with_seed(3);
        let result = runner.place(&cfg)?;
        println!("{name:>7}: {} instances", result.instances.len());
        instances.extend(result.instances);
        curves.push(curve);
    }

    let mut config = RenderConfig::new((1000, 580), Vec2::ZERO, Vec2::new(1000.0, 580.0));
    config.set_generator_style("rect", [20, 60, 140]);
    let curve_refs: Vec<&dyn Curve> = curves.iter().map(|c| c as &dyn Curve).collect();
    render_instances_to_png(&curve_refs, &instances, &config, "distribution-modes.png")
}
