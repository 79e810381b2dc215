use flow_scatter::prelude::*;
use flow_scatter::seed::rand_range;
use flow_scatter_examples::{init_tracing, Canvas, RenderConfig};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let registry = GeneratorRegistry::with_builtins();
    let runner = FlowRunner::new(&registry);

    let curve = random_walk(0x5EED, Vec2::new(60.0, 300.0), 40, 22.0);

    let base = FlowPathConfig::new("walk", curve.clone())
        .with_fill(FillMode::Random)
        .with_density(ResponseCurve::Keyframes(vec![(0.0, 0.2), (0.5, 0.8), (1.0, 0.2)]))
        .with_spread(ResponseCurve::Constant(20.0))
        .with_modifier(Modifier::size(ResponseCurve::Linear { from: 0.4, to: 1.6 }))
        .with_modifier(
            Modifier::rotation(ResponseCurve::Sine {
                base: 0.0,
                amplitude: 45.0,
                cycles: 3.0,
                phase: 0.0,
            })
            .with_range(0.25, 1.0),
        )
        .with_modifier(
            Modifier::spread(ResponseCurve::Linear { from: 10.0, to: 60.0 }).with_range(0.5, 1.0),
        )
        .with_generator(
            GeneratorAssignment::new("rect")
                .with_param("width", (6.0, 12.0))
                .with_param("height", 2.0),
        )
        .with_generator(
            GeneratorAssignment::new("circle")
                .with_weight(0.3)
                .with_param("radius", 3.0)
                .with_param("jitter", 0.3),
        )
        .with_follow_curve(1.0)
        .with_seed(99);

    let mut sink = VecSink::only([PlacementEventKind::PassFinished, PlacementEventKind::Warning]);
    let plain = runner.place_with_events(&base, &mut sink)?;
    let relaxed = runner.place(&base.clone().with_boids(BoidsConfig::new(25.0, 0.4)))?;
    for event in sink.as_slice() {
        println!("{event:?}");
    }
    println!(
        "plain: {} instances, relaxed: {} instances",
        plain.instances.len(),
        relaxed.instances.len()
    );

    for (name, result) in [("modifiers.png", &plain), ("modifiers-boids.png", &relaxed)] {
        let mut config = RenderConfig::new((1000, 600), Vec2::ZERO, Vec2::new(1000.0, 600.0));
        config
            .set_generator_style("rect", [90, 50, 20])
            .set_generator_style("circle", [20, 120, 90]);
        let mut canvas = Canvas::new(config);
        canvas.draw_curve(&curve);
        canvas.draw_instances(&result.instances);
        canvas.save(name)?;
    }
    Ok(())
}

fn random_walk(seed: u64, start: Vec2, steps: usize, step: f32) -> Polyline {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut heading: f32 = 0.0;
    let mut p = start;
    let mut points = vec![p];
    for _ in 0..steps {
        heading = (heading + rand_range(&mut rng, -0.6, 0.6)).clamp(-1.0, 1.0);
        p += Vec2::from_angle(heading) * step;
        points.push(p);
    }
    Polyline::open(points)
}
