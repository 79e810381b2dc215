use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use flow_scatter::curve::{Curve, CurveExt};
use flow_scatter::pipeline::GeneratedInstance;
use glam::Vec2;
use image::{Rgb, RgbImage};

/// Maps a rectangle of render units onto an image and holds colours per generator type.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub image_size: (u32, u32),
    pub domain_min: Vec2,
    pub domain_extent: Vec2,
    pub background: [u8; 3],
    pub curve_color: Option<[u8; 3]>,
    pub default_color: [u8; 3],
    styles: HashMap<String, [u8; 3]>,
}

impl RenderConfig {
    pub fn new(image_size: (u32, u32), domain_min: Vec2, domain_extent: Vec2) -> Self {
        Self {
            image_size,
            domain_min,
            domain_extent,
            background: [250, 250, 245],
            curve_color: Some([200, 60, 60]),
            default_color: [30, 30, 30],
            styles: HashMap::new(),
        }
    }

    pub fn with_background(mut self, background: [u8; 3]) -> Self {
        self.background = background;
        self
    }

    pub fn with_curve_color(mut self, color: Option<[u8; 3]>) -> Self {
        self.curve_color = color;
        self
    }

    pub fn set_generator_style(&mut self, generator_type: impl Into<String>, color: [u8; 3]) -> &mut Self {
        self.styles.insert(generator_type.into(), color);
        self
    }

    fn color_for(&self, generator_type: &str) -> [u8; 3] {
        self.styles
            .get(generator_type)
            .copied()
            .unwrap_or(self.default_color)
    }

    fn to_pixel(&self, p: Vec2) -> Vec2 {
        let size = Vec2::new(self.image_size.0 as f32, self.image_size.1 as f32);
        (p - self.domain_min) / self.domain_extent.max(Vec2::splat(f32::EPSILON)) * size
    }
}

/// Outline renderer backed by an [`RgbImage`].
pub struct Canvas {
    image: RgbImage,
    config: RenderConfig,
}

impl Canvas {
    pub fn new(config: RenderConfig) -> Self {
        let (w, h) = config.image_size;
        let image = RgbImage::from_pixel(w, h, Rgb(config.background));
        Self { image, config }
    }

    fn plot(&mut self, p: Vec2, color: [u8; 3]) {
        if p.x < 0.0 || p.y < 0.0 {
            return;
        }
        let (x, y) = (p.x as u32, p.y as u32);
        if x < self.image.width() && y < self.image.height() {
            self.image.put_pixel(x, y, Rgb(color));
        }
    }

    fn line(&mut self, a: Vec2, b: Vec2, color: [u8; 3]) {
        let (pa, pb) = (self.config.to_pixel(a), self.config.to_pixel(b));
        let steps = (pb - pa).abs().max_element().ceil().max(1.0) as usize;
        for i in 0..=steps {
            self.plot(pa.lerp(pb, i as f32 / steps as f32), color);
        }
    }

    pub fn draw_polyline(&mut self, points: &[Vec2], closed: bool, color: [u8; 3]) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], color);
        }
        if closed && points.len() > 2 {
            self.line(points[points.len() - 1], points[0], color);
        }
    }

    pub fn draw_curve(&mut self, curve: &dyn Curve) {
        let Some(color) = self.config.curve_color else {
            return;
        };
        let steps = (curve.length().ceil() as usize).clamp(2, 4096);
        let points: Vec<Vec2> = (0..=steps)
            .map(|i| curve.point_at_t(i as f32 / steps as f32))
            .collect();
        self.draw_polyline(&points, false, color);
    }

    pub fn draw_instances(&mut self, instances: &[GeneratedInstance]) {
        for instance in instances {
            let color = self.config.color_for(&instance.generator_type);
            for sp in &instance.shape.subpaths {
                self.draw_polyline(&sp.points, sp.closed, color);
            }
        }
    }

    pub fn save(&self, out: impl AsRef<Path>) -> anyhow::Result<()> {
        let out = out.as_ref();
        self.image
            .save(out)
            .with_context(|| format!("failed to write {}", out.display()))?;
        println!("Wrote {}", out.display());
        Ok(())
    }
}

/// Renders curves and their instances into a PNG.
pub fn render_instances_to_png(
    curves: &[&dyn Curve],
    instances: &[GeneratedInstance],
    config: &RenderConfig,
    out: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let mut canvas = Canvas::new(config.clone());
    for curve in curves {
        canvas.draw_curve(*curve);
    }
    canvas.draw_instances(instances);
    canvas.save(out)
}
