//! Runner that turns flow path configurations into generated instances.
use tracing::{debug, info, warn};

use crate::curve::CurveExt;
use crate::distribution::{self, DistributionParams, VisualDensity};
use crate::error::{Error, Result};
use crate::generator::{
    footprint_radius, GeneratorParams, GeneratorRegistry, ParamEvaluator, ResolveRanges,
    ShapeGenerator,
};
use crate::modifier::{rotation_offset, size_multiplier, spaced_density};
use crate::pipeline::boids;
use crate::pipeline::events::{EventSink, PlacementEvent, PlacementEventKind};
use crate::pipeline::{FlowPathConfig, GeneratedInstance, PathLayout, PlaceResult, PlaceStats};
use crate::seed;
use crate::selection::pick_weighted_assignment;
use crate::tube::{self, Footprint, FootprintTable, Placement, TubeRequest};

/// Samples used to average a density curve for along-curve distributions.
const DENSITY_SAMPLES: usize = 16;

/// Places instances for flow paths using an explicit generator registry.
pub struct FlowRunner<'a> {
    /// Registry the generator types of every path are resolved against.
    pub registry: &'a GeneratorRegistry,
    evaluator: Box<dyn ParamEvaluator + 'a>,
}

impl<'a> FlowRunner<'a> {
    /// Creates a runner that resolves parameter ranges with [`ResolveRanges`].
    pub fn new(registry: &'a GeneratorRegistry) -> Self {
        Self {
            registry,
            evaluator: Box::new(ResolveRanges),
        }
    }

    /// Replaces the parameter evaluator.
    pub fn with_param_evaluator(mut self, evaluator: impl ParamEvaluator + 'a) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    /// Places one path.
    pub fn place(&self, config: &FlowPathConfig) -> Result<PlaceResult> {
        place_path(config, self.registry, self.evaluator.as_ref(), &mut (), 0)
    }

    pub fn place_with_events(
        &self,
        config: &FlowPathConfig,
        sink: &mut dyn EventSink,
    ) -> Result<PlaceResult> {
        place_path(config, self.registry, self.evaluator.as_ref(), sink, 0)
    }

    /// Places every path in order. The first failing path aborts the batch.
    pub fn place_paths(&self, configs: &[FlowPathConfig]) -> Result<Vec<PlaceResult>> {
        self.place_paths_with_events(configs, &mut ())
    }

    pub fn place_paths_with_events(
        &self,
        configs: &[FlowPathConfig],
        sink: &mut dyn EventSink,
    ) -> Result<Vec<PlaceResult>> {
        let results = configs
            .iter()
            .enumerate()
            .map(|(index, config)| {
                place_path(config, self.registry, self.evaluator.as_ref(), &mut *sink, index)
            })
            .collect::<Result<Vec<_>>>()?;
        info!(
            "Placed {} paths: {} instances.",
            results.len(),
            results.iter().map(|r| r.instances.len()).sum::<usize>()
        );
        Ok(results)
    }
}

/// Places one path with the default parameter evaluator.
pub fn place(config: &FlowPathConfig, registry: &GeneratorRegistry) -> Result<PlaceResult> {
    FlowRunner::new(registry).place(config)
}

struct ResolvedGenerator<'r> {
    generator: &'r dyn ShapeGenerator,
    params: GeneratorParams,
}

fn place_path(
    config: &FlowPathConfig,
    registry: &GeneratorRegistry,
    evaluator: &dyn ParamEvaluator,
    sink: &mut dyn EventSink,
    index: usize,
) -> Result<PlaceResult> {
    config.validate()?;

    // Unknown generator types fail before any work is done.
    let resolved = config
        .generators
        .iter()
        .map(|a| -> Result<ResolvedGenerator<'_>> {
            let generator = registry.try_get(&a.generator_type)?.as_ref();
            Ok(ResolvedGenerator {
                generator,
                params: a.merged_params(generator),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let curve = config.curve.as_ref();
    let length = curve.length();
    if sink.wants(PlacementEventKind::PassStarted) {
        sink.send(PlacementEvent::PassStarted {
            index,
            path_id: config.id.clone(),
            curve_length: length,
            generator_count: config.generators.len(),
        });
    }

    if !length.is_finite() || length <= 0.0 {
        warn!("Path '{}' has no length; skipping.", config.id);
        if sink.wants(PlacementEventKind::Warning) {
            sink.send(PlacementEvent::Warning {
                context: format!("path:{}", config.id),
                message: "Curve has no length; skipping".into(),
            });
        }
        return Ok(finish(config, index, sink, PlaceResult::default()));
    }

    let footprints = FootprintTable::new(
        resolved
            .iter()
            .zip(&config.generators)
            .map(|(r, a)| Footprint {
                weight: a.weight,
                radius: footprint_radius(r.generator, &r.params, 0),
            })
            .collect(),
    );
    let avg_shape_size = average_shape_size(&footprints);

    let (placements, candidates_evaluated, candidates_rejected) =
        layout_placements(config, &footprints, avg_shape_size);

    if sink.wants(PlacementEventKind::PlacementAccepted) {
        for (i, placement) in placements.iter().enumerate() {
            sink.send(PlacementEvent::PlacementAccepted {
                path_id: config.id.clone(),
                index: i,
                placement: *placement,
            });
        }
    }

    let mut instances = Vec::with_capacity(placements.len());
    for (i, placement) in placements.iter().enumerate() {
        let instance = build_instance(config, &resolved, evaluator, i, placement)?;
        instances.push(instance);
    }

    if let Some(b) = config.boids.as_ref().filter(|b| b.is_active()) {
        debug!(
            "Relaxing {} instances on path '{}' (radius {}, strength {}).",
            instances.len(),
            config.id,
            b.radius,
            b.strength
        );
        instances = boids::relax(instances, b);
    }

    if sink.wants(PlacementEventKind::InstanceCreated) {
        for instance in &instances {
            sink.send(PlacementEvent::InstanceCreated {
                path_id: config.id.clone(),
                instance_id: instance.id.clone(),
                generator_type: instance.generator_type.clone(),
                position: instance.position,
            });
        }
    }

    let stats = PlaceStats {
        candidates_evaluated,
        candidates_rejected,
        placements: placements.len(),
        instances: instances.len(),
    };
    Ok(finish(config, index, sink, PlaceResult { instances, stats }))
}

fn finish(
    config: &FlowPathConfig,
    index: usize,
    sink: &mut dyn EventSink,
    result: PlaceResult,
) -> PlaceResult {
    info!(
        "Path '{}': {} instances from {} candidates ({} rejected).",
        config.id,
        result.stats.instances,
        result.stats.candidates_evaluated,
        result.stats.candidates_rejected
    );
    if sink.wants(PlacementEventKind::PassFinished) {
        sink.send(PlacementEvent::PassFinished {
            index,
            path_id: config.id.clone(),
            stats: result.stats,
        });
    }
    result
}

/// Runs the configured layout and returns `(placements, evaluated, rejected)`.
fn layout_placements(
    config: &FlowPathConfig,
    footprints: &FootprintTable,
    avg_shape_size: f32,
) -> (Vec<Placement>, usize, usize) {
    let curve = config.curve.as_ref();
    match config.layout {
        PathLayout::Along {
            mode,
            visual_density,
        } => {
            let params = DistributionParams::new(mode, mean_density(config))
                .with_seed(config.seed);
            let generator_count = config.generators.len();
            let ts = if visual_density {
                let visual = VisualDensity {
                    footprint: avg_shape_size,
                    packing: config.packing,
                    min_spacing_mm: config.min_spacing_mm,
                };
                distribution::sample_visual_density(
                    curve,
                    &params,
                    &visual,
                    &config.modifiers,
                    generator_count,
                    &config.units,
                )
            } else {
                let length_mm = config.units.px_to_mm(curve.length());
                distribution::sample(&params, length_mm, generator_count)
            };
            let base_radius = avg_shape_size * 0.5;
            let placements: Vec<Placement> = ts
                .into_iter()
                .map(|t| Placement {
                    t,
                    offset: 0.0,
                    position: curve.point_at_t(t),
                    radius: base_radius * size_multiplier(t, &config.modifiers).abs(),
                    generator: None,
                })
                .collect();
            let n = placements.len();
            (placements, n, 0)
        }
        PathLayout::Tube { fill } => {
            let density = |t: f32| config.density.value(t);
            let spread = |t: f32| config.spread.value(t);
            let request = TubeRequest {
                curve,
                spread: &spread,
                fill,
                density: &density,
                avg_shape_size,
                packing: config.packing,
                min_spacing_mm: config.min_spacing_mm,
                modifiers: &config.modifiers,
                seed: config.seed,
                units: config.units,
                footprints: Some(footprints),
            };
            let result = tube::generate(&request);
            (
                result.placements,
                result.candidates_evaluated,
                result.candidates_rejected,
            )
        }
    }
}

fn build_instance(
    config: &FlowPathConfig,
    resolved: &[ResolvedGenerator<'_>],
    evaluator: &dyn ParamEvaluator,
    i: usize,
    placement: &Placement,
) -> Result<GeneratedInstance> {
    let mut rng = seed::rng_for(config.seed, i as u64);
    let slot = match placement.generator.filter(|g| *g < resolved.len()) {
        Some(slot) => slot,
        None => pick_weighted_assignment(&config.generators, &mut rng)
            .map(|(slot, _)| slot)
            .ok_or_else(|| {
                Error::InvalidConfig(format!("path '{}' has no selectable generator", config.id))
            })?,
    };
    let assignment = &config.generators[slot];
    let target = &resolved[slot];

    let t = placement.t;
    let params = evaluator.evaluate(&target.params, t, &mut rng);
    let shape_seed = seed::derive(config.seed, seed::INSTANCE_SHAPE + i as u64);
    let shape = target.generator.generate(t, &params, shape_seed);

    let curve = config.curve.as_ref();
    let direction = if assignment.follow_normal {
        curve.normal_at_t(t)
    } else {
        curve.tangent_at_t(t)
    };
    let rotation = direction.y.atan2(direction.x).to_degrees() * config.follow_curve
        + rotation_offset(t, &config.modifiers);
    let scale = size_multiplier(t, &config.modifiers);

    Ok(GeneratedInstance {
        id: format!("{}-{}", config.id, i),
        shape: shape.transformed(rotation, scale, placement.position),
        position: placement.position,
        rotation,
        scale,
        source_id: config.id.clone(),
        generator_type: assignment.generator_type.clone(),
    })
}

/// Weighted mean footprint diameter over generators with usable weights.
fn average_shape_size(footprints: &FootprintTable) -> f32 {
    let (sum, total) = footprints
        .entries
        .iter()
        .filter(|f| f.weight.is_finite() && f.weight > 0.0)
        .fold((0.0, 0.0), |(s, w), f| (s + 2.0 * f.radius * f.weight, w + f.weight));
    if total > 0.0 {
        sum / total
    } else {
        0.0
    }
}

/// Mean of the density curve along the path, with spacing modifiers applied.
fn mean_density(config: &FlowPathConfig) -> f32 {
    (0..DENSITY_SAMPLES)
        .map(|i| {
            let t = (i as f32 + 0.5) / DENSITY_SAMPLES as f32;
            spaced_density(t, &config.modifiers, config.density.value(t))
        })
        .sum::<f32>()
        / DENSITY_SAMPLES as f32
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::curve::Polyline;
    use crate::distribution::DistributionMode;
    use crate::generator::{CircleGenerator, GeneratorAssignment, ResolvedParams};
    use crate::geometry::{Shape, SubPath};
    use crate::modifier::{Modifier, ResponseCurve};
    use crate::packing::PackingMode;
    use crate::pipeline::events::VecSink;
    use crate::pipeline::BoidsConfig;
    use crate::tube::FillMode;
    use crate::units::Units;
    use crate::value::ParamValue;

    /// Unit horizontal segment anchored at the origin.
    struct Stick;

    impl ShapeGenerator for Stick {
        fn generate(&self, _t: f32, _params: &ResolvedParams, _seed: u64) -> Shape {
            Shape::from_subpaths(vec![SubPath::new(vec![Vec2::ZERO, Vec2::X], false)])
                .with_anchor(Vec2::ZERO)
        }

        fn default_params(&self) -> GeneratorParams {
            GeneratorParams::new()
        }
    }

    fn registry() -> GeneratorRegistry {
        let mut r = GeneratorRegistry::with_builtins();
        r.register("stick", Stick);
        r
    }

    fn line_path(id: &str, length: f32) -> FlowPathConfig {
        FlowPathConfig::new(id, Polyline::line(length))
            .with_units(Units::millimetres())
            .with_generator(GeneratorAssignment::new("circle").with_param("radius", 1.0))
    }

    #[test]
    fn same_config_same_instances() {
        let registry = registry();
        let runner = FlowRunner::new(&registry);
        let cfg = line_path("p", 200.0)
            .with_seed(42)
            .with_generator(GeneratorAssignment::new("rect").with_weight(2.0))
            .with_generator(
                GeneratorAssignment::new("circle").with_param("radius", ParamValue::range(0.5, 2.0)),
            );
        let a = runner.place(&cfg).unwrap();
        let b = runner.place(&cfg).unwrap();
        assert!(!a.instances.is_empty());
        assert_eq!(a.instances, b.instances);
        assert_eq!(a.stats, b.stats);
    }

    #[test]
    fn different_seeds_differ() {
        let registry = registry();
        let runner = FlowRunner::new(&registry);
        let a = runner.place(&line_path("p", 200.0).with_seed(1)).unwrap();
        let b = runner.place(&line_path("p", 200.0).with_seed(2)).unwrap();
        assert_ne!(a.instances, b.instances);
    }

    #[test]
    fn unknown_generator_fails_fast() {
        let registry = registry();
        let cfg = line_path("p", 100.0).with_generator(GeneratorAssignment::new("spiral"));
        let mut sink = VecSink::new();
        let err = FlowRunner::new(&registry)
            .place_with_events(&cfg, &mut sink)
            .err()
            .expect("unknown generator must fail");
        assert!(matches!(err, Error::UnknownGenerator { ref id } if id == "spiral"));
        assert!(sink.is_empty());
    }

    #[test]
    fn missing_generators_is_an_error() {
        let registry = registry();
        let cfg = FlowPathConfig::new("bare", Polyline::line(10.0));
        assert!(matches!(
            place(&cfg, &registry),
            Err(Error::NoGenerators { .. })
        ));
    }

    #[test]
    fn zero_length_curve_yields_nothing() {
        let registry = registry();
        let cfg = FlowPathConfig::new("dot", Polyline::open([Vec2::ONE, Vec2::ONE]))
            .with_generator(GeneratorAssignment::new("circle"));
        let mut sink = VecSink::only([PlacementEventKind::Warning]);
        let result = FlowRunner::new(&registry)
            .place_with_events(&cfg, &mut sink)
            .unwrap();
        assert!(result.instances.is_empty());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn along_linear_layout_is_evenly_spaced_on_curve() {
        let registry = registry();
        let cfg = line_path("p", 80.0)
            .with_layout(PathLayout::Along {
                mode: DistributionMode::Linear,
                visual_density: false,
            })
            .with_density(ResponseCurve::Constant(0.125));
        let result = place(&cfg, &registry).unwrap();
        // floor(80 * 0.125 / 1) positions at i / (n - 1).
        assert_eq!(result.instances.len(), 10);
        for (i, inst) in result.instances.iter().enumerate() {
            let expected = 80.0 * i as f32 / 9.0;
            assert!((inst.position.x - expected).abs() < 1e-3);
            assert!(inst.position.y.abs() < 1e-6);
        }
    }

    #[test]
    fn spacing_modifier_raises_along_counts() {
        let registry = registry();
        let layouts = [
            (DistributionMode::Linear, false),
            (DistributionMode::Random, false),
            (DistributionMode::Noise(Default::default()), false),
            (DistributionMode::Linear, true),
        ];
        for (mode, visual_density) in layouts {
            let cfg = line_path("p", 80.0)
                .with_layout(PathLayout::Along {
                    mode,
                    visual_density,
                })
                .with_packing(PackingMode::AllowOverlap)
                .with_density(ResponseCurve::Constant(0.125));
            let plain = place(&cfg, &registry).unwrap().instances.len();
            let spaced = place(
                &cfg.clone()
                    .with_modifier(Modifier::spacing(ResponseCurve::Constant(0.5))),
                &registry,
            )
            .unwrap()
            .instances
            .len();
            assert!(spaced > plain, "{mode:?} visual {visual_density}: {spaced} <= {plain}");
            if matches!(mode, DistributionMode::Linear) && !visual_density {
                assert_eq!((plain, spaced), (10, 20));
            }
        }
    }

    #[test]
    fn rotation_follows_tangent_or_normal() {
        let registry = registry();
        let vertical = Polyline::open([Vec2::ZERO, Vec2::new(0.0, 50.0)]);
        let along = PathLayout::Along {
            mode: DistributionMode::Linear,
            visual_density: false,
        };
        let base = FlowPathConfig::new("v", vertical)
            .with_units(Units::millimetres())
            .with_layout(along)
            .with_density(ResponseCurve::Constant(0.1));

        let tangent = place(&base.clone().with_generator(GeneratorAssignment::new("stick")), &registry)
            .unwrap();
        for inst in &tangent.instances {
            assert!((inst.rotation - 90.0).abs() < 1e-3);
            // The unit stick now points up from its anchor.
            let end = inst.shape.subpaths[0].points[1];
            assert!((end - (inst.position + Vec2::Y)).length() < 1e-4);
        }

        let normal = place(
            &base
                .clone()
                .with_generator(GeneratorAssignment::new("stick").with_follow_normal(true)),
            &registry,
        )
        .unwrap();
        for inst in &normal.instances {
            assert!((inst.rotation - 180.0).abs() < 1e-3);
        }

        let half = place(
            &base
                .with_follow_curve(0.5)
                .with_modifier(Modifier::rotation(ResponseCurve::Constant(10.0)))
                .with_generator(GeneratorAssignment::new("stick")),
            &registry,
        )
        .unwrap();
        for inst in &half.instances {
            assert!((inst.rotation - 55.0).abs() < 1e-3);
        }
    }

    #[test]
    fn size_modifier_scales_about_anchor() {
        let registry = registry();
        let cfg = FlowPathConfig::new("p", Polyline::line(100.0))
            .with_units(Units::millimetres())
            .with_layout(PathLayout::Along {
                mode: DistributionMode::Linear,
                visual_density: false,
            })
            .with_density(ResponseCurve::Constant(0.05))
            .with_modifier(Modifier::size(ResponseCurve::Constant(3.0)))
            .with_generator(GeneratorAssignment::new("stick"));
        let result = place(&cfg, &registry).unwrap();
        for inst in &result.instances {
            assert_eq!(inst.scale, 3.0);
            assert!((inst.shape.bounds.width() - 3.0).abs() < 1e-4);
            assert!((inst.shape.anchor - inst.position).length() < 1e-4);
        }
    }

    #[test]
    fn tube_instances_respect_spread() {
        let registry = registry();
        let cfg = line_path("tube", 300.0)
            .with_fill(FillMode::Random)
            .with_spread(ResponseCurve::Constant(20.0))
            .with_seed(3);
        let result = place(&cfg, &registry).unwrap();
        assert!(!result.instances.is_empty());
        assert_eq!(result.stats.instances, result.instances.len());
        assert!(result.stats.candidates_evaluated >= result.stats.placements);
        for inst in &result.instances {
            assert!(inst.position.y.abs() <= 10.0 + 1e-3);
            assert_eq!(inst.source_id, "tube");
        }
    }

    #[test]
    fn packed_fill_uses_preassigned_generators() {
        let registry = registry();
        let cfg = FlowPathConfig::new("packed", Polyline::line(300.0))
            .with_units(Units::millimetres())
            .with_fill(FillMode::Packed)
            .with_packing(PackingMode::Loose)
            .with_density(ResponseCurve::Constant(0.2))
            .with_generator(GeneratorAssignment::new("circle").with_param("radius", 1.0))
            .with_generator(GeneratorAssignment::new("rect"))
            .with_seed(11);
        let result = place(&cfg, &registry).unwrap();
        let circles = result
            .instances
            .iter()
            .filter(|i| i.generator_type == "circle")
            .count();
        assert!(circles > 0);
        assert!(circles < result.instances.len());
    }

    #[test]
    fn boids_pass_pulls_instances_together() {
        let registry = registry();
        let along = PathLayout::Along {
            mode: DistributionMode::Linear,
            visual_density: false,
        };
        let cfg = line_path("b", 100.0)
            .with_layout(along)
            .with_density(ResponseCurve::Constant(0.1));
        let plain = place(&cfg, &registry).unwrap();
        let relaxed = place(&cfg.with_boids(BoidsConfig::new(1000.0, 0.5)), &registry).unwrap();
        let spread = |r: &PlaceResult| {
            let xs: Vec<f32> = r.instances.iter().map(|i| i.position.x).collect();
            xs.iter().cloned().fold(f32::MIN, f32::max) - xs.iter().cloned().fold(f32::MAX, f32::min)
        };
        assert_eq!(plain.instances.len(), relaxed.instances.len());
        assert!(spread(&relaxed) < spread(&plain));
    }

    #[test]
    fn events_cover_a_pass() {
        let registry = registry();
        let cfg = line_path("ev", 100.0);
        let mut sink = VecSink::new();
        let result = FlowRunner::new(&registry)
            .place_with_events(&cfg, &mut sink)
            .unwrap();
        let events = sink.into_inner();
        assert!(matches!(events.first(), Some(PlacementEvent::PassStarted { .. })));
        assert!(matches!(
            events.last(),
            Some(PlacementEvent::PassFinished { stats, .. }) if stats.instances == result.instances.len()
        ));
        let created = events
            .iter()
            .filter(|e| e.kind() == PlacementEventKind::InstanceCreated)
            .count();
        assert_eq!(created, result.instances.len());
    }

    #[test]
    fn batch_places_every_path_and_stops_on_error() {
        let registry = registry();
        let runner = FlowRunner::new(&registry);
        let ok = runner
            .place_paths(&[line_path("a", 50.0), line_path("b", 80.0)])
            .unwrap();
        assert_eq!(ok.len(), 2);
        assert!(ok[1].instances.iter().all(|i| i.source_id == "b"));

        let bad = runner.place_paths(&[
            line_path("a", 50.0),
            FlowPathConfig::new("c", Polyline::line(10.0)),
        ]);
        assert!(bad.is_err());
    }

    #[test]
    fn custom_evaluator_sees_position() {
        struct RadiusFromT;
        impl ParamEvaluator for RadiusFromT {
            fn evaluate(
                &self,
                params: &GeneratorParams,
                t: f32,
                _rng: &mut dyn rand::RngCore,
            ) -> ResolvedParams {
                let mut out: ResolvedParams =
                    params.iter().map(|(k, v)| (k.clone(), v.nominal())).collect();
                out.insert("radius".into(), 1.0 + t * 4.0);
                out
            }
        }

        let mut registry = GeneratorRegistry::new();
        registry.register("circle", CircleGenerator);
        let cfg = FlowPathConfig::new("e", Polyline::line(100.0))
            .with_units(Units::millimetres())
            .with_layout(PathLayout::Along {
                mode: DistributionMode::Linear,
                visual_density: false,
            })
            .with_density(ResponseCurve::Constant(0.05))
            .with_generator(GeneratorAssignment::new("circle"));
        let result = FlowRunner::new(&registry)
            .with_param_evaluator(RadiusFromT)
            .place(&cfg)
            .unwrap();
        let first = &result.instances[0];
        let last = &result.instances[result.instances.len() - 1];
        assert!(last.shape.bounds.width() > first.shape.bounds.width() * 2.0);
    }

    #[test]
    fn average_shape_size_ignores_unusable_weights() {
        let table = FootprintTable::new(vec![
            Footprint { weight: 1.0, radius: 1.0 },
            Footprint { weight: 3.0, radius: 3.0 },
            Footprint { weight: 0.0, radius: 100.0 },
        ]);
        assert!((average_shape_size(&table) - 5.0).abs() < 1e-5);
        assert_eq!(average_shape_size(&FootprintTable::default()), 0.0);
    }
}
