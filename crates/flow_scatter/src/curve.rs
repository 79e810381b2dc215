//! Curve protocol consumed by the placement engine, plus a polyline
//! implementation.
//!
//! All queries take an arc-length offset in render units, never a segment
//! index. Offsets outside `[0, length]` are clamped.
use glam::Vec2;

/// Arc-length parameterised 2D curve.
pub trait Curve: Send + Sync {
    /// Total arc length in render units.
    fn length(&self) -> f32;

    fn point_at(&self, offset: f32) -> Vec2;

    /// Unit tangent at `offset`.
    fn tangent_at(&self, offset: f32) -> Vec2;

    /// Unit normal at `offset`: the tangent rotated a quarter turn
    /// counter-clockwise.
    fn normal_at(&self, offset: f32) -> Vec2 {
        self.tangent_at(offset).perp()
    }

    fn is_closed(&self) -> bool {
        false
    }
}

/// Convenience queries by normalised position `t` in `[0, 1]`.
pub trait CurveExt: Curve {
    fn point_at_t(&self, t: f32) -> Vec2 {
        self.point_at(t.clamp(0.0, 1.0) * self.length())
    }

    fn tangent_at_t(&self, t: f32) -> Vec2 {
        self.tangent_at(t.clamp(0.0, 1.0) * self.length())
    }

    fn normal_at_t(&self, t: f32) -> Vec2 {
        self.normal_at(t.clamp(0.0, 1.0) * self.length())
    }
}

impl<C: Curve + ?Sized> CurveExt for C {}

/// Piecewise-linear curve with a cumulative arc-length table.
#[derive(Debug, Clone)]
pub struct Polyline {
    points: Vec<Vec2>,
    cumulative: Vec<f32>,
    closed: bool,
}

impl Polyline {
    /// Builds a polyline. Consecutive duplicate points are dropped. A closed
    /// polyline gets an implicit segment back to its first point.
    pub fn new(points: impl IntoIterator<Item = Vec2>, closed: bool) -> Self {
        let mut pts: Vec<Vec2> = Vec::new();
        for p in points {
            if !p.is_finite() {
                continue;
            }
            if pts.last().is_none_or(|last| last.distance_squared(p) > f32::EPSILON) {
                pts.push(p);
            }
        }
        if closed && pts.len() > 1 {
            let first = pts[0];
            if pts.last().is_some_and(|last| last.distance_squared(first) > f32::EPSILON) {
                pts.push(first);
            }
        }

        let mut cumulative = Vec::with_capacity(pts.len());
        let mut acc = 0.0;
        for (i, p) in pts.iter().enumerate() {
            if i > 0 {
                acc += pts[i - 1].distance(*p);
            }
            cumulative.push(acc);
        }

        Self {
            points: pts,
            cumulative,
            closed,
        }
    }

    pub fn open(points: impl IntoIterator<Item = Vec2>) -> Self {
        Self::new(points, false)
    }

    /// Builds a polyline from points of any `mint`-compatible math library.
    pub fn from_mint(points: impl IntoIterator<Item = mint::Point2<f32>>, closed: bool) -> Self {
        Self::new(points.into_iter().map(Vec2::from), closed)
    }

    /// Horizontal segment from `(0, 0)` to `(length, 0)`.
    pub fn line(length: f32) -> Self {
        Self::open([Vec2::ZERO, Vec2::new(length.max(0.0), 0.0)])
    }

    /// Flattens a chain of cubic Béziers `(p0, c1, c2, p3)` into a polyline,
    /// `steps` segments per curve.
    pub fn from_cubics(cubics: &[[Vec2; 4]], steps: usize, closed: bool) -> Self {
        let steps = steps.max(1);
        let mut pts = Vec::with_capacity(cubics.len() * steps + 1);
        for (ci, c) in cubics.iter().enumerate() {
            let start = if ci == 0 { 0 } else { 1 };
            for s in start..=steps {
                pts.push(cubic_point(c, s as f32 / steps as f32));
            }
        }
        Self::new(pts, closed)
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Segment index containing `offset` and the local fraction within it.
    fn locate(&self, offset: f32) -> Option<(usize, f32)> {
        if self.points.len() < 2 {
            return None;
        }
        let total = self.length();
        let offset = if offset.is_finite() {
            offset.clamp(0.0, total)
        } else {
            0.0
        };
        let seg = match self
            .cumulative
            .binary_search_by(|c| c.total_cmp(&offset))
        {
            Ok(i) => i.min(self.points.len() - 2),
            Err(i) => i.saturating_sub(1).min(self.points.len() - 2),
        };
        let seg_len = self.cumulative[seg + 1] - self.cumulative[seg];
        let frac = if seg_len > 0.0 {
            (offset - self.cumulative[seg]) / seg_len
        } else {
            0.0
        };
        Some((seg, frac.clamp(0.0, 1.0)))
    }
}

impl Curve for Polyline {
    fn length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    fn point_at(&self, offset: f32) -> Vec2 {
        match self.locate(offset) {
            Some((seg, frac)) => self.points[seg].lerp(self.points[seg + 1], frac),
            None => self.points.first().copied().unwrap_or(Vec2::ZERO),
        }
    }

    fn tangent_at(&self, offset: f32) -> Vec2 {
        match self.locate(offset) {
            Some((seg, _)) => (self.points[seg + 1] - self.points[seg]).normalize_or(Vec2::X),
            None => Vec2::X,
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

fn cubic_point(c: &[Vec2; 4], t: f32) -> Vec2 {
    let mt = 1.0 - t;
    c[0] * (mt * mt * mt) + c[1] * (3.0 * mt * mt * t) + c[2] * (3.0 * mt * t * t) + c[3] * (t * t * t)
}
