//! # Broad Phase — Candidate Pair Selection
//!
//! Narrow-phase AABB tests are cheap, but testing every pair is O(n²). A
//! [`SpatialPartition`] returns a superset of the overlapping pairs so the
//! detection system only tests boxes that could touch.
//!
//! ```text
//! BruteForce:   every (i, j) with i < j                 O(n²) pairs
//! UniformGrid:  bucket each box into the cells it spans,
//!               pair up indices sharing a cell          ~O(n) for sparse scenes
//!
//!   ┌────┬────┬────┐
//!   │ 0  │ 0,1│ 1  │    box 0 spans two cells, box 1 spans two cells,
//!   ├────┼────┼────┤    they share one → candidate (0, 1)
//!   │    │    │  2 │    box 2 shares no cell → no candidate
//!   └────┴────┴────┘
//! ```
//!
//! The grid caps how many cells one box may occupy. Boxes past the cap (or
//! with non-finite bounds) skip the buckets and are paired with every box.
//!
//! Every strategy returns pairs with `i < j`, sorted, without duplicates.
//! That makes the event stream identical no matter which strategy is plugged
//! in.
//!
//! The trait is open: a quadtree or sort-and-sweep can be added without
//! touching the detection system.

use std::collections::HashMap;

use crate::math::Aabb;

/// Produces candidate collision pairs from world-space boxes.
pub trait SpatialPartition: Send {
    /// Short name for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Indices `(i, j)` into `bounds` with `i < j` whose boxes may overlap,
    /// sorted ascending, without duplicates.
    fn candidate_pairs(&mut self, bounds: &[Aabb]) -> Vec<(usize, usize)>;
}

/// Tests every pair. The baseline the other strategies must agree with.
#[derive(Debug, Default, Clone, Copy)]
pub struct BruteForce;

impl SpatialPartition for BruteForce {
    fn name(&self) -> &'static str {
        "brute-force"
    }

    fn candidate_pairs(&mut self, bounds: &[Aabb]) -> Vec<(usize, usize)> {
        let n = bounds.len();
        let mut pairs = Vec::with_capacity(n.saturating_sub(1) * n / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                pairs.push((i, j));
            }
        }
        pairs
    }
}

type Cell = (i32, i32, i32);

/// Default upper bound on how many cells a single box may be bucketed into.
pub const DEFAULT_MAX_CELLS_PER_BOX: u64 = 64;

/// Uniform grid bucketing boxes by the cells they span.
///
/// A box spanning more than `max_cells_per_box` cells, or with non-finite
/// bounds, is not bucketed at all. It goes on an oversized list and is paired
/// with every other box, leaving the exact test to the narrow phase.
pub struct UniformGrid {
    cell_size: f32,
    max_cells_per_box: u64,
    /// Reused between frames to keep allocations down.
    cells: HashMap<Cell, Vec<usize>>,
    oversized: Vec<usize>,
}

impl UniformGrid {
    /// # Panics
    ///
    /// Panics if `cell_size` is not a positive finite number.
    pub fn new(cell_size: f32) -> Self {
        assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "grid cell size must be positive and finite, got {}",
            cell_size
        );
        Self {
            cell_size,
            max_cells_per_box: DEFAULT_MAX_CELLS_PER_BOX,
            cells: HashMap::new(),
            oversized: Vec::new(),
        }
    }

    /// Override the per-box cell cap. A cap of zero sends every box to the
    /// oversized list, which degrades to brute force.
    pub fn with_max_cells_per_box(mut self, max: u64) -> Self {
        self.max_cells_per_box = max;
        self
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn max_cells_per_box(&self) -> u64 {
        self.max_cells_per_box
    }

    fn cell_of(&self, x: f32, y: f32, z: f32) -> Cell {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
            (z / self.cell_size).floor() as i32,
        )
    }

    /// Cell range covered by `aabb`, or `None` if it must not be bucketed.
    fn cell_span(&self, aabb: &Aabb) -> Option<(Cell, Cell)> {
        if !(aabb.min.is_finite() && aabb.max.is_finite()) {
            return None;
        }
        let lo = self.cell_of(aabb.min.x, aabb.min.y, aabb.min.z);
        let hi = self.cell_of(aabb.max.x, aabb.max.y, aabb.max.z);
        let span = |lo: i32, hi: i32| (i64::from(hi) - i64::from(lo) + 1).max(0) as u64;
        let count = span(lo.0, hi.0)
            .saturating_mul(span(lo.1, hi.1))
            .saturating_mul(span(lo.2, hi.2));
        (count <= self.max_cells_per_box).then_some((lo, hi))
    }
}

impl SpatialPartition for UniformGrid {
    fn name(&self) -> &'static str {
        "uniform-grid"
    }

    fn candidate_pairs(&mut self, bounds: &[Aabb]) -> Vec<(usize, usize)> {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        self.oversized.clear();

        for (index, aabb) in bounds.iter().enumerate() {
            let Some((lo, hi)) = self.cell_span(aabb) else {
                self.oversized.push(index);
                continue;
            };
            for x in lo.0..=hi.0 {
                for y in lo.1..=hi.1 {
                    for z in lo.2..=hi.2 {
                        self.cells.entry((x, y, z)).or_default().push(index);
                    }
                }
            }
        }

        let mut pairs = Vec::new();
        for bucket in self.cells.values() {
            // Indices were pushed in ascending order, so i < j holds.
            for (k, &i) in bucket.iter().enumerate() {
                for &j in &bucket[k + 1..] {
                    pairs.push((i, j));
                }
            }
        }
        for &big in &self.oversized {
            for other in (0..bounds.len()).filter(|&other| other != big) {
                pairs.push((big.min(other), big.max(other)));
            }
        }
        if !self.oversized.is_empty() {
            log::trace!(
                "uniform grid: {} oversized box(es) paired with all",
                self.oversized.len()
            );
        }
        // Drop cells that stayed empty this frame.
        self.cells.retain(|_, bucket| !bucket.is_empty());

        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn unit_box(x: f32, y: f32) -> Aabb {
        Aabb::from_center_half_extents(Vec3::new(x, y, 0.0), Vec3::splat(0.5))
    }

    #[test]
    fn brute_force_lists_all_pairs() {
        let boxes = vec![unit_box(0.0, 0.0), unit_box(5.0, 0.0), unit_box(9.0, 9.0)];
        assert_eq!(
            BruteForce.candidate_pairs(&boxes),
            vec![(0, 1), (0, 2), (1, 2)]
        );
    }

    #[test]
    fn grid_skips_distant_boxes() {
        let boxes = vec![unit_box(0.2, 0.2), unit_box(0.6, 0.2), unit_box(50.0, 50.0)];
        let mut grid = UniformGrid::new(2.0);
        assert_eq!(grid.candidate_pairs(&boxes), vec![(0, 1)]);
    }

    #[test]
    fn grid_pairs_are_deduplicated() {
        // Both boxes straddle the same four cells.
        let boxes = vec![unit_box(0.0, 0.0), unit_box(0.1, 0.1)];
        let mut grid = UniformGrid::new(1.0);
        assert_eq!(grid.candidate_pairs(&boxes), vec![(0, 1)]);
    }

    #[test]
    fn grid_is_reusable_across_frames() {
        let mut grid = UniformGrid::new(1.0);
        grid.candidate_pairs(&[unit_box(0.0, 0.0), unit_box(0.2, 0.0)]);
        let pairs = grid.candidate_pairs(&[unit_box(0.0, 0.0), unit_box(30.0, 0.0)]);
        assert!(pairs.is_empty());
    }

    #[test]
    fn box_much_larger_than_a_cell_is_not_bucketed() {
        let huge = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(50.0));
        let boxes = vec![huge, unit_box(2.0, 2.0), unit_box(40.0, 40.0)];
        let mut grid = UniformGrid::new(1.0);
        let pairs = grid.candidate_pairs(&boxes);
        assert_eq!(pairs, vec![(0, 1), (0, 2)]);
        // Only the two unit boxes occupy cells, 2 x 2 x 2 each.
        assert_eq!(grid.cells.len(), 16);
        assert_eq!(grid.oversized, vec![0]);
    }

    #[test]
    fn non_finite_bounds_are_paired_with_everything() {
        let wild = Aabb::new(Vec3::splat(f32::NEG_INFINITY), Vec3::splat(f32::INFINITY));
        let nan = Aabb::new(Vec3::splat(f32::NAN), Vec3::splat(f32::NAN));
        let boxes = vec![unit_box(0.0, 0.0), wild, unit_box(9.0, 9.0), nan];
        let mut grid = UniformGrid::new(1.0);
        let pairs = grid.candidate_pairs(&boxes);
        assert_eq!(pairs, vec![(0, 1), (0, 3), (1, 2), (1, 3), (2, 3)]);
        assert_eq!(grid.oversized, vec![1, 3]);
    }

    #[test]
    fn zero_cap_degrades_to_brute_force() {
        let boxes = vec![unit_box(0.0, 0.0), unit_box(5.0, 0.0), unit_box(9.0, 9.0)];
        let mut grid = UniformGrid::new(1.0).with_max_cells_per_box(0);
        assert_eq!(grid.max_cells_per_box(), 0);
        assert_eq!(grid.candidate_pairs(&boxes), BruteForce.candidate_pairs(&boxes));
    }

    #[test]
    #[should_panic(expected = "cell size")]
    fn zero_cell_size_panics() {
        UniformGrid::new(0.0);
    }
}
