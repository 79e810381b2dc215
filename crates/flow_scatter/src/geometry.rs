//! Plain 2D geometry shared by the placement engine: axis-aligned boxes and
//! generated vector shapes.
use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in render units.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Box with its top-left corner at `(x, y)` and the given size.
    pub fn from_xywh(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::new(Vec2::new(x, y), Vec2::new(x + w, y + h))
    }

    /// Square box of half-extent `radius` centered at `center`.
    pub fn from_center_radius(center: Vec2, radius: f32) -> Self {
        let r = Vec2::splat(radius.abs());
        Self {
            min: center - r,
            max: center + r,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn min_dimension(&self) -> f32 {
        self.width().min(self.height())
    }

    #[inline]
    pub fn diagonal(&self) -> f32 {
        (self.max - self.min).length()
    }

    /// Grows the box by `amount` on every side. Negative amounts shrink it.
    pub fn inflate(&self, amount: f32) -> Self {
        let d = Vec2::splat(amount);
        Self {
            min: self.min - d,
            max: self.max + d,
        }
    }

    /// Closed-interval intersection test; touching edges count as overlap.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn translate(&self, delta: Vec2) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }
}

/// A single open or closed polyline of a generated shape.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubPath {
    pub points: Vec<Vec2>,
    pub closed: bool,
}

impl SubPath {
    pub fn new(points: Vec<Vec2>, closed: bool) -> Self {
        Self { points, closed }
    }
}

/// Vector output of a shape generator.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub subpaths: Vec<SubPath>,
    pub bounds: Aabb,
    /// Local point that ends up on the placement position.
    pub anchor: Vec2,
}

impl Shape {
    /// Builds a shape from sub-paths, measuring its bounds.
    /// The anchor defaults to the bounds center.
    pub fn from_subpaths(subpaths: Vec<SubPath>) -> Self {
        let bounds = measure_bounds(&subpaths);
        Self {
            anchor: bounds.center(),
            subpaths,
            bounds,
        }
    }

    pub fn with_anchor(mut self, anchor: Vec2) -> Self {
        self.anchor = anchor;
        self
    }

    /// Applies `f` to every point and the anchor, then re-measures bounds.
    pub fn map_points(&self, mut f: impl FnMut(Vec2) -> Vec2) -> Self {
        let subpaths: Vec<SubPath> = self
            .subpaths
            .iter()
            .map(|sp| SubPath {
                points: sp.points.iter().map(|&p| f(p)).collect(),
                closed: sp.closed,
            })
            .collect();
        let anchor = f(self.anchor);
        let bounds = if subpaths.iter().all(|sp| sp.points.is_empty()) {
            Aabb::new(anchor, anchor)
        } else {
            measure_bounds(&subpaths)
        };
        Self {
            subpaths,
            bounds,
            anchor,
        }
    }

    /// Rotates (degrees) and scales the shape about its anchor, then moves the
    /// anchor onto `position`.
    pub fn transformed(&self, rotation_deg: f32, scale: f32, position: Vec2) -> Self {
        let anchor = self.anchor;
        let rot = Vec2::from_angle(rotation_deg.to_radians());
        self.map_points(|p| rot.rotate((p - anchor) * scale) + position)
    }

    pub fn translated(&self, delta: Vec2) -> Self {
        self.map_points(|p| p + delta)
    }
}

/// Bounding box of all points in `subpaths`. Empty input yields a zero box at
/// the origin.
pub fn measure_bounds(subpaths: &[SubPath]) -> Aabb {
    let mut points = subpaths.iter().flat_map(|sp| sp.points.iter().copied());
    let Some(first) = points.next() else {
        return Aabb::new(Vec2::ZERO, Vec2::ZERO);
    };
    let (min, max) = points.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
    Aabb { min, max }
}
