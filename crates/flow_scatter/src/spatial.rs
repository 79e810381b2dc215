//! Uniform-grid broad phase over axis-aligned boxes.
//!
//! A box is registered in every cell it overlaps and a query visits exactly the
//! cells its own box overlaps, so [`SpatialIndex::nearby`] returns a superset of
//! the true overlaps and never misses one. The index is built fresh for each
//! placement pass and dropped afterwards.
use std::collections::HashMap;
use std::ops::RangeInclusive;

use crate::geometry::Aabb;

/// Smallest usable cell size.
pub const MIN_CELL_SIZE: f32 = 1e-3;

pub type CellKey = (i32, i32);

/// Grid-backed spatial index with an optional payload per box.
#[derive(Debug, Clone)]
pub struct SpatialIndex<T = ()> {
    cell_size: f32,
    entries: Vec<(Aabb, T)>,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl<T> SpatialIndex<T> {
    /// Creates an empty index. Aim for 1–2× the typical box size; a non-positive
    /// or non-finite `cell_size` is clamped to [`MIN_CELL_SIZE`].
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() {
            cell_size.max(MIN_CELL_SIZE)
        } else {
            MIN_CELL_SIZE
        };
        Self {
            cell_size,
            entries: Vec::new(),
            cells: HashMap::new(),
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    fn cell_coord(&self, v: f32) -> i32 {
        (v / self.cell_size).floor() as i32
    }

    /// Inclusive cell ranges `(x, y)` covered by `aabb`.
    pub fn cell_range(&self, aabb: &Aabb) -> (RangeInclusive<i32>, RangeInclusive<i32>) {
        (
            self.cell_coord(aabb.min.x)..=self.cell_coord(aabb.max.x),
            self.cell_coord(aabb.min.y)..=self.cell_coord(aabb.max.y),
        )
    }

    pub fn insert(&mut self, aabb: Aabb, value: T) {
        let slot = self.entries.len();
        let (xs, ys) = self.cell_range(&aabb);
        for y in ys {
            for x in xs.clone() {
                self.cells.entry((x, y)).or_default().push(slot);
            }
        }
        self.entries.push((aabb, value));
    }

    /// Entries registered in any cell `aabb` overlaps, deduplicated and in
    /// insertion order.
    pub fn nearby(&self, aabb: &Aabb) -> Vec<&(Aabb, T)> {
        if self.entries.is_empty() {
            return Vec::new();
        }
        let (xs, ys) = self.cell_range(aabb);
        let mut slots: Vec<usize> = Vec::new();
        for y in ys {
            for x in xs.clone() {
                if let Some(cell) = self.cells.get(&(x, y)) {
                    slots.extend_from_slice(cell);
                }
            }
        }
        slots.sort_unstable();
        slots.dedup();
        slots.into_iter().map(|s| &self.entries[s]).collect()
    }

    /// Iterator over every registered entry.
    pub fn iter(&self) -> impl Iterator<Item = &(Aabb, T)> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cells.clear();
    }

    #[cfg(test)]
    fn occupied_cells(&self) -> usize {
        self.cells.len()
    }
}

impl SpatialIndex<()> {
    /// Registers a bare box.
    pub fn add(&mut self, aabb: Aabb) {
        self.insert(aabb, ());
    }

    /// Boxes near `aabb`, without payloads.
    pub fn nearby_boxes(&self, aabb: &Aabb) -> Vec<Aabb> {
        self.nearby(aabb).into_iter().map(|(b, _)| *b).collect()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;

    #[test]
    fn far_query_is_empty_and_near_query_hits() {
        let mut index: SpatialIndex = SpatialIndex::new(50.0);
        let inserted = Aabb::from_xywh(0.0, 0.0, 40.0, 40.0);
        index.add(inserted);

        assert!(index
            .nearby_boxes(&Aabb::from_xywh(1000.0, 1000.0, 10.0, 10.0))
            .is_empty());
        assert_eq!(
            index.nearby_boxes(&Aabb::from_xywh(10.0, 10.0, 10.0, 10.0)),
            vec![inserted]
        );
    }

    #[test]
    fn box_spanning_cells_is_registered_in_each() {
        let mut index: SpatialIndex = SpatialIndex::new(10.0);
        index.add(Aabb::from_xywh(5.0, 5.0, 20.0, 10.0));
        // x cells 0..=2, y cells 0..=1
        assert_eq!(index.occupied_cells(), 6);

        // Query each covered cell individually.
        for cx in 0..=2 {
            for cy in 0..=1 {
                let cell_box = Aabb::from_xywh(cx as f32 * 10.0 + 1.0, cy as f32 * 10.0 + 1.0, 1.0, 1.0);
                assert_eq!(index.nearby(&cell_box).len(), 1, "cell ({cx},{cy})");
            }
        }
        let outside = Aabb::from_xywh(31.0, 1.0, 1.0, 1.0);
        assert!(index.nearby(&outside).is_empty());
    }

    #[test]
    fn cell_range_uses_floor_for_negative_coordinates() {
        let index: SpatialIndex = SpatialIndex::new(10.0);
        let (xs, ys) = index.cell_range(&Aabb::from_xywh(-15.0, -0.5, 10.0, 1.0));
        assert_eq!(xs, -2..=-1);
        assert_eq!(ys, -1..=0);
    }

    #[test]
    fn nearby_deduplicates_multi_cell_entries() {
        let mut index = SpatialIndex::new(1.0);
        index.insert(Aabb::from_xywh(0.0, 0.0, 5.0, 5.0), "big");
        index.insert(Aabb::from_xywh(2.0, 2.0, 0.5, 0.5), "small");
        let hits = index.nearby(&Aabb::from_xywh(0.0, 0.0, 5.0, 5.0));
        let names: Vec<_> = hits.iter().map(|(_, n)| *n).collect();
        assert_eq!(names, vec!["big", "small"]);
    }

    #[test]
    fn never_misses_a_true_overlap() {
        let mut index: SpatialIndex = SpatialIndex::new(7.0);
        let boxes: Vec<Aabb> = (0..40)
            .map(|i| {
                let f = i as f32;
                Aabb::from_center_radius(Vec2::new((f * 13.7) % 60.0, (f * 5.3) % 45.0), 2.0 + (i % 4) as f32)
            })
            .collect();
        for b in &boxes {
            index.add(*b);
        }
        for query in &boxes {
            let hits = index.nearby_boxes(query);
            for other in &boxes {
                if query.intersects(other) {
                    assert!(hits.contains(other));
                }
            }
        }
    }

    #[test]
    fn clear_and_degenerate_cell_size() {
        let mut index: SpatialIndex = SpatialIndex::new(0.0);
        assert_eq!(index.cell_size(), MIN_CELL_SIZE);
        index.add(Aabb::from_xywh(0.0, 0.0, 0.01, 0.01));
        assert_eq!(index.len(), 1);
        index.clear();
        assert!(index.is_empty());
        assert!(index.nearby(&Aabb::from_xywh(0.0, 0.0, 1.0, 1.0)).is_empty());
    }
}
