// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial hash grid - broad phase
//!
//! Space is partitioned into uniform cubic cells keyed by integer
//! coordinates. Each cell holds the slots (registration indices) of the
//! elements assigned to it, in insertion order, so candidate discovery order
//! is fully determined by registration order and the fixed cell scan order.

use crate::config::IndexMode;
use ifc_clash_model::{Aabb, Element};
use nalgebra::Point3;
use rustc_hash::{FxHashMap, FxHashSet};

/// Integer cell coordinates
pub type GridCell = (i64, i64, i64);

/// Most cells one element may occupy in covering mode
///
/// Larger elements are kept in a separate list scanned by every query.
pub const MAX_COVERED_CELLS: u64 = 4096;

/// Uniform grid mapping cells to element slots
#[derive(Clone, Debug)]
pub struct SpatialHash {
    cell_size: f64,
    mode: IndexMode,
    margin: f64,
    cells: FxHashMap<GridCell, Vec<usize>>,
    /// Covering-mode elements spanning more than [`MAX_COVERED_CELLS`]
    oversized: Vec<usize>,
    len: usize,
}

impl SpatialHash {
    /// Create an empty grid
    ///
    /// `margin` only affects [`IndexMode::Covering`], where boxes are grown
    /// before computing the cells they cover.
    pub fn new(cell_size: f64, mode: IndexMode, margin: f64) -> Self {
        debug_assert!(cell_size > 0.0, "cell size must be positive");
        Self {
            cell_size,
            mode,
            margin,
            cells: FxHashMap::default(),
            oversized: Vec::new(),
            len: 0,
        }
    }

    /// Clear all buckets and insert every element by slot
    pub fn build(&mut self, elements: &[Element]) {
        self.cells.clear();
        self.oversized.clear();
        self.len = elements.len();
        for (slot, element) in elements.iter().enumerate() {
            match self.mode {
                IndexMode::Center => {
                    let cell = self.cell_of(&element.center());
                    self.cells.entry(cell).or_default().push(slot);
                }
                IndexMode::Covering => {
                    let (lo, hi) = self.cell_span(&element.bbox.expanded(self.margin));
                    if span_cells(lo, hi) > MAX_COVERED_CELLS {
                        self.oversized.push(slot);
                        continue;
                    }
                    for x in lo.0..=hi.0 {
                        for y in lo.1..=hi.1 {
                            for z in lo.2..=hi.2 {
                                self.cells.entry((x, y, z)).or_default().push(slot);
                            }
                        }
                    }
                }
            }
        }
        log::debug!(
            "Spatial hash built: {} elements in {} cells, {} oversized ({:?})",
            elements.len(),
            self.cells.len(),
            self.oversized.len(),
            self.mode
        );
    }

    #[inline]
    fn floor_to_i64(v: f64) -> i64 {
        // `as` saturates for out-of-range values; inputs are validated finite
        v.floor() as i64
    }

    /// Cell containing a point
    pub fn cell_of(&self, p: &Point3<f64>) -> GridCell {
        (
            Self::floor_to_i64(p.x / self.cell_size),
            Self::floor_to_i64(p.y / self.cell_size),
            Self::floor_to_i64(p.z / self.cell_size),
        )
    }

    /// Inclusive range of cells a box touches
    pub fn cell_span(&self, bbox: &Aabb) -> (GridCell, GridCell) {
        (self.cell_of(&bbox.min), self.cell_of(&bbox.max))
    }

    /// Candidate slots that may overlap `element`
    ///
    /// In centre mode this gathers the 3×3×3 neighbourhood around the
    /// element's centre cell, iterating offsets -1..=1 with x outermost and z
    /// innermost. In covering mode it gathers every cell the (margin-grown)
    /// box covers, keeping the first occurrence of each slot, followed by
    /// every oversized element in slot order. An oversized element itself
    /// gets every slot in slot order. The element's own slot is included;
    /// callers filter it.
    pub fn query(&self, element: &Element) -> Vec<usize> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.query_into(element, &mut out, &mut seen);
        out
    }

    /// [`query`](Self::query) writing into reusable buffers
    ///
    /// `out` and `seen` are cleared first.
    pub fn query_into(&self, element: &Element, out: &mut Vec<usize>, seen: &mut FxHashSet<usize>) {
        out.clear();
        seen.clear();
        match self.mode {
            IndexMode::Center => {
                let (cx, cy, cz) = self.cell_of(&element.center());
                for dx in -1..=1 {
                    for dy in -1..=1 {
                        for dz in -1..=1 {
                            // Neighbours past the edge of the i64 range do not exist
                            let (Some(x), Some(y), Some(z)) =
                                (cx.checked_add(dx), cy.checked_add(dy), cz.checked_add(dz))
                            else {
                                continue;
                            };
                            if let Some(slots) = self.cells.get(&(x, y, z)) {
                                // Each slot lives in exactly one cell
                                out.extend_from_slice(slots);
                            }
                        }
                    }
                }
            }
            IndexMode::Covering => {
                let (lo, hi) = self.cell_span(&element.bbox.expanded(self.margin));
                if span_cells(lo, hi) > MAX_COVERED_CELLS {
                    out.extend(0..self.len);
                    return;
                }
                for x in lo.0..=hi.0 {
                    for y in lo.1..=hi.1 {
                        for z in lo.2..=hi.2 {
                            if let Some(slots) = self.cells.get(&(x, y, z)) {
                                out.extend(slots.iter().copied().filter(|s| seen.insert(*s)));
                            }
                        }
                    }
                }
                out.extend_from_slice(&self.oversized);
            }
        }
    }

    /// Slots stored in one cell
    pub fn bucket(&self, cell: GridCell) -> &[usize] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Covering-mode elements too large to be bucketed
    pub fn oversized(&self) -> &[usize] {
        &self.oversized
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn mode(&self) -> IndexMode {
        self.mode
    }
}

/// Number of cells in an inclusive span, saturating
fn span_cells(lo: GridCell, hi: GridCell) -> u64 {
    let axis = |a: i64, b: i64| b.abs_diff(a).saturating_add(1);
    axis(lo.0, hi.0)
        .saturating_mul(axis(lo.1, hi.1))
        .saturating_mul(axis(lo.2, hi.2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_clash_model::ElementType;

    fn element(id: u32, min: [f64; 3], max: [f64; 3]) -> Element {
        Element::new(id, ElementType::Other, Aabb::from_coords(min, max))
    }

    #[test]
    fn test_cell_of_floors_negative_coordinates() {
        let grid = SpatialHash::new(1.0, IndexMode::Center, 0.0);
        assert_eq!(grid.cell_of(&Point3::new(0.5, 1.5, 2.0)), (0, 1, 2));
        assert_eq!(grid.cell_of(&Point3::new(-0.5, -1.0, -1.5)), (-1, -1, -2));

        let coarse = SpatialHash::new(2.5, IndexMode::Center, 0.0);
        assert_eq!(coarse.cell_of(&Point3::new(5.0, 4.9, -0.1)), (2, 1, -1));
    }

    #[test]
    fn test_build_buckets_by_center() {
        let elements = vec![
            element(1, [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
            element(2, [0.2, 0.2, 0.2], [0.8, 0.8, 0.8]),
            element(3, [4.0, 0.0, 0.0], [5.0, 1.0, 1.0]),
        ];
        let mut grid = SpatialHash::new(1.0, IndexMode::Center, 0.0);
        grid.build(&elements);

        assert_eq!(grid.cell_count(), 2);
        assert_eq!(grid.bucket((0, 0, 0)), &[0, 1]);
        assert_eq!(grid.bucket((4, 0, 0)), &[2]);
        assert!(grid.bucket((9, 9, 9)).is_empty());
    }

    #[test]
    fn test_rebuild_discards_previous_buckets() {
        let mut grid = SpatialHash::new(1.0, IndexMode::Center, 0.0);
        grid.build(&[element(1, [10.0; 3], [11.0; 3])]);
        grid.build(&[element(2, [0.0; 3], [1.0; 3])]);
        assert_eq!(grid.cell_count(), 1);
        assert!(grid.bucket((10, 10, 10)).is_empty());
    }

    #[test]
    fn test_query_neighbourhood_order() {
        // Centres at x = 0.5, 1.5, -0.5 and 3.5
        let elements = vec![
            element(1, [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
            element(2, [1.0, 0.0, 0.0], [2.0, 1.0, 1.0]),
            element(3, [-1.0, 0.0, 0.0], [0.0, 1.0, 1.0]),
            element(4, [3.0, 0.0, 0.0], [4.0, 1.0, 1.0]),
        ];
        let mut grid = SpatialHash::new(1.0, IndexMode::Center, 0.0);
        grid.build(&elements);

        // dx = -1 cell first, then own cell, then dx = +1
        assert_eq!(grid.query(&elements[0]), vec![2, 0, 1]);
        // Element 4 is two cells away from element 2
        assert_eq!(grid.query(&elements[1]), vec![0, 1]);
        assert_eq!(grid.query(&elements[3]), vec![3]);
    }

    #[test]
    fn test_center_mode_misses_distant_end_of_long_element() {
        // A 10 m slab centred at x = 5 and a column near its x = 0 end
        let elements = vec![
            element(1, [0.0, 0.0, 0.0], [10.0, 1.0, 0.3]),
            element(2, [0.2, 0.2, 0.0], [0.6, 0.6, 3.0]),
        ];
        let mut center = SpatialHash::new(1.0, IndexMode::Center, 0.0);
        center.build(&elements);
        assert!(!center.query(&elements[1]).contains(&0));

        let mut covering = SpatialHash::new(1.0, IndexMode::Covering, 0.0);
        covering.build(&elements);
        assert!(covering.query(&elements[1]).contains(&0));
        assert!(covering.query(&elements[0]).contains(&1));
    }

    #[test]
    fn test_covering_query_deduplicates_slots() {
        let elements = vec![
            element(1, [0.0, 0.0, 0.0], [3.0, 3.0, 1.0]),
            element(2, [0.5, 0.5, 0.0], [2.5, 2.5, 0.5]),
        ];
        let mut grid = SpatialHash::new(1.0, IndexMode::Covering, 0.0);
        grid.build(&elements);
        assert_eq!(grid.query(&elements[0]), vec![0, 1]);
        assert_eq!(grid.query(&elements[1]), vec![0, 1]);
    }

    #[test]
    fn test_extreme_coordinates_do_not_overflow() {
        let elements = vec![
            element(1, [1e300, 0.0, 0.0], [1e300, 1.0, 1.0]),
            element(2, [-1e300, -1e300, 0.0], [-1e300, -1e300, 1.0]),
            element(3, [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
        ];
        let mut grid = SpatialHash::new(1.0, IndexMode::Center, 0.0);
        grid.build(&elements);

        assert_eq!(grid.cell_of(&elements[0].center()).0, i64::MAX);
        assert_eq!(grid.query(&elements[0]), vec![0]);
        assert_eq!(grid.query(&elements[1]), vec![1]);
        assert_eq!(grid.query(&elements[2]), vec![2]);
    }

    #[test]
    fn test_covering_keeps_huge_elements_out_of_buckets() {
        // 3 km square slab over a column and a beam
        let elements = vec![
            element(1, [0.2, 0.2, 0.0], [0.6, 0.6, 3.0]),
            element(2, [-1500.0, -1500.0, 0.0], [1500.0, 1500.0, 0.3]),
            element(3, [1000.0, 5.0, 0.0], [1004.0, 5.4, 0.5]),
        ];
        let mut grid = SpatialHash::new(1.0, IndexMode::Covering, 0.0);
        grid.build(&elements);

        assert_eq!(grid.oversized(), &[1]);
        assert!(grid.cell_count() < 16);
        assert_eq!(grid.query(&elements[0]), vec![0, 1]);
        assert_eq!(grid.query(&elements[2]), vec![2, 1]);
        assert_eq!(grid.query(&elements[1]), vec![0, 1, 2]);
    }

    #[test]
    fn test_span_cells_saturates() {
        assert_eq!(span_cells((0, 0, 0), (0, 0, 0)), 1);
        assert_eq!(span_cells((0, 0, 0), (1, 2, 3)), 24);
        assert_eq!(span_cells((i64::MIN, 0, 0), (i64::MAX, 0, 0)), u64::MAX);
    }
}
