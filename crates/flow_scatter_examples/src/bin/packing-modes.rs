use flow_scatter::prelude::*;
use flow_scatter_examples::{init_tracing, Canvas, RenderConfig};
use glam::Vec2;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let registry = GeneratorRegistry::with_builtins();
    let runner = FlowRunner::new(&registry);

    let modes = [
        PackingMode::Tight,
        PackingMode::Normal,
        PackingMode::Loose,
        PackingMode::AllowOverlap,
    ];

    let mut config = RenderConfig::new((1000, 800), Vec2::ZERO, Vec2::new(1000.0, 800.0));
    config
        .set_generator_style("circle", [150, 40, 40])
        .set_generator_style("rect", [40, 40, 150]);
    let mut canvas = Canvas::new(config);

    for (row, packing) in modes.into_iter().enumerate() {
        let y = 100.0 + row as f32 * 200.0;
        let curve = Polyline::open([Vec2::new(40.0, y), Vec2::new(960.0, y)]);
        let cfg = FlowPathConfig::new(format!("{packing:?}").to_lowercase(), curve.clone())
            .with_fill(FillMode::Packed)
            .with_packing(packing)
            .with_min_spacing_mm(0.5)
            .with_density(ResponseCurve::Constant(1.2))
            .with_spread(ResponseCurve::Constant(35.0))
            .with_generator(GeneratorAssignment::new("circle").with_param("radius", 8.0))
            .with_generator(
                GeneratorAssignment::new("circle")
                    .with_weight(3.0)
                    .with_param("radius", 3.0),
            )
            .with_generator(
                GeneratorAssignment::new("rect")
                    .with_param("width", 10.0)
                    .with_param("height", 10.0),
            )
            .with_seed(21);
        let result = runner.place(&cfg)?;
        println!(
            "{:>12}: {} placed of {} candidates",
            cfg.id, result.stats.placements, result.stats.candidates_evaluated
        );
        canvas.draw_curve(&curve);
        canvas.draw_instances(&result.instances);
    }

    canvas.save("packing-modes.png")
}
