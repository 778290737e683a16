//! Terrain-following grids.
//!
//! A `LayeredGrid` is uniform along two axes. Along the third, the
//! "varying" axis, every grid point carries its own coordinate, stored as a
//! second block-decomposed field with the same shape as the data. Layers may
//! run in either direction but must be monotonic within each column.

use crate::error::Result;
use crate::interpolation;
use crate::lattice::Lattice;
use crate::regular::RegularGrid;
use crate::types::{cell_upper, Extents, InterpolationOrder};

/// A grid whose coordinate along one axis varies per grid point.
#[derive(Debug, Clone)]
pub struct LayeredGrid<B> {
    base: RegularGrid<B>,
    coords: RegularGrid<B>,
    varying_dim: usize,
    extents: Extents,
}

impl<B: AsRef<[f32]>> LayeredGrid<B> {
    /// Create a layered grid.
    ///
    /// # Arguments
    /// * `bs`, `min`, `max`, `extents`, `periodic`, `blocks` - As for [`RegularGrid::new`]
    /// * `coords` - Varying-axis coordinates, block-decomposed like `blocks`
    /// * `varying_dim` - Axis whose coordinates vary; values above 2 become 2
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bs: [usize; 3],
        min: [usize; 3],
        max: [usize; 3],
        extents: Extents,
        periodic: [bool; 3],
        blocks: Vec<B>,
        coords: Vec<B>,
        varying_dim: usize,
    ) -> Result<Self> {
        let varying_dim = if varying_dim > 2 {
            tracing::debug!(varying_dim, "Varying dimension out of range, using 2");
            2
        } else {
            varying_dim
        };

        let periodic = clear_varying(periodic, varying_dim);
        let base = RegularGrid::new(bs, min, max, extents, periodic, blocks)?;
        let coords = RegularGrid::new(bs, min, max, extents, periodic, coords)?;

        let mut grid = Self {
            base,
            coords,
            varying_dim,
            extents,
        };
        grid.extents = grid.full_bounding_box();
        Ok(grid)
    }

    /// Create a layered grid whose voxels and coordinates may hold
    /// `missing_value`.
    #[allow(clippy::too_many_arguments)]
    pub fn with_missing(
        bs: [usize; 3],
        min: [usize; 3],
        max: [usize; 3],
        extents: Extents,
        periodic: [bool; 3],
        blocks: Vec<B>,
        coords: Vec<B>,
        varying_dim: usize,
        missing_value: f32,
    ) -> Result<Self> {
        let mut grid = Self::new(bs, min, max, extents, periodic, blocks, coords, varying_dim)?;
        grid.base.set_missing_value(missing_value);
        grid.extents = grid.full_bounding_box();
        Ok(grid)
    }

    pub fn varying_dim(&self) -> usize {
        self.varying_dim
    }

    pub fn access_ijk(&self, i: usize, j: usize, k: usize) -> Result<f32> {
        self.base.access_ijk(i, j, k)
    }

    /// Reconstruct the field at a user-space point.
    pub fn value(&self, x: f64, y: f64, z: f64) -> f32 {
        let p = self.wrap([x, y, z]);
        if !self.contains(p) {
            return self.base.missing_value();
        }
        let (lo, w) = self.cell(p);
        self.base.blend(lo, w)
    }

    /// User coordinates of `(i, j, k)`; the varying axis comes from the
    /// coordinate field.
    pub fn user_coordinates(&self, i: usize, j: usize, k: usize) -> Result<[f64; 3]> {
        self.base.check_index(i, j, k)?;
        let mut p = self.base.lattice().point([i, j, k]);
        p[self.varying_dim] = self.varying_coord([i, j, k]);
        Ok(p)
    }

    /// Index of the grid point nearest to a user-space point.
    pub fn ijk_index(&self, x: f64, y: f64, z: f64) -> [usize; 3] {
        let (lo, w) = self.cell(self.wrap([x, y, z]));
        let hi = cell_upper(lo, self.dimensions());
        interpolation::nearest_index(lo, hi, w)
    }

    /// Index of the cell corner at or below a user-space point.
    ///
    /// The varying axis is located by bisection over the column containing
    /// the point. Points past either end of the column map to the boundary
    /// layer; between two layers the lower index is returned.
    pub fn ijk_index_floor(&self, x: f64, y: f64, z: f64) -> [usize; 3] {
        self.floor(self.wrap([x, y, z]))
    }

    /// True when the point lies between the bottom and top layers of the
    /// column containing it.
    pub fn inside_grid(&self, x: f64, y: f64, z: f64) -> bool {
        self.contains(self.wrap([x, y, z]))
    }

    /// User extents of the index box `min..=max`.
    ///
    /// Along the varying axis the box spans the extreme coordinates found on
    /// the first and last layers of the box. Layers without a single valid
    /// coordinate are skipped.
    pub fn bounding_box(&self, min: [usize; 3], max: [usize; 3]) -> Extents {
        let vd = self.varying_dim;
        let lattice = self.base.lattice();
        let increasing = self.base.user_extents().is_increasing(vd);
        let (pick_low, pick_high): (fn(f32, f32) -> f32, fn(f32, f32) -> f32) = if increasing {
            (f32::min, f32::max)
        } else {
            (f32::max, f32::min)
        };

        let mut lo_layer = min[vd];
        let mut hi_layer = max[vd];
        let low = loop {
            if let Some(v) = self.layer_extreme(min, max, lo_layer, pick_low) {
                break v as f64;
            }
            if lo_layer >= hi_layer {
                break lattice.coordinate(vd, min[vd]);
            }
            lo_layer += 1;
        };
        let high = loop {
            if let Some(v) = self.layer_extreme(min, max, hi_layer, pick_high) {
                break v as f64;
            }
            if hi_layer <= lo_layer {
                break lattice.coordinate(vd, max[vd]);
            }
            hi_layer -= 1;
        };

        let mut e = Extents::new(lattice.point(min), lattice.point(max));
        e.min[vd] = low;
        e.max[vd] = high;
        e
    }

    /// Smallest index box whose grid points cover the user box `minu..maxu`.
    pub fn enclosing_region(&self, minu: [f64; 3], maxu: [f64; 3]) -> ([usize; 3], [usize; 3]) {
        let vd = self.varying_dim;
        let (a, b) = self.uniform_axes();
        let lattice = self.base.lattice();
        let dims = self.dimensions();

        let mut min = [0; 3];
        let mut max = [0; 3];
        for axis in [a, b] {
            (min[axis], max[axis]) = lattice.enclosing(axis, minu[axis], maxu[axis]);
        }

        let lo_v = minu[vd].min(maxu[vd]);
        let hi_v = minu[vd].max(maxu[vd]);
        let n = dims[vd];
        let mut found: Option<(usize, usize)> = None;
        let mut include = |layer: usize| {
            found = Some(match found {
                None => (layer, layer),
                Some((l0, l1)) => (l0.min(layer), l1.max(layer)),
            });
        };

        for ia in min[a]..=max[a] {
            for ib in min[b]..=max[b] {
                let mut idx = [0; 3];
                idx[a] = ia;
                idx[b] = ib;
                let column: Vec<f64> = (0..n)
                    .map(|layer| {
                        idx[vd] = layer;
                        self.varying_coord(idx)
                    })
                    .collect();

                for (layer, &c) in column.iter().enumerate() {
                    if c >= lo_v && c <= hi_v {
                        include(layer);
                    }
                }
                for (layer, pair) in column.windows(2).enumerate() {
                    if pair[0].min(pair[1]) < hi_v && pair[0].max(pair[1]) > lo_v {
                        include(layer);
                        include(layer + 1);
                    }
                }
            }
        }

        (min[vd], max[vd]) = found.unwrap_or((0, n - 1));
        (min, max)
    }

    /// Minimum and maximum over non-missing voxels.
    pub fn range(&self) -> (f32, f32) {
        self.base.range()
    }

    /// Change the region of interest. The varying axis stays non-periodic
    /// and the cached extents are recomputed.
    pub fn reshape(&mut self, min: [usize; 3], max: [usize; 3], periodic: [bool; 3]) -> Result<()> {
        let periodic = clear_varying(periodic, self.varying_dim);
        self.base.reshape(min, max, periodic)?;
        self.coords.reshape(min, max, periodic)?;
        self.extents = self.full_bounding_box();
        Ok(())
    }

    pub fn set_periodic(&mut self, periodic: [bool; 3]) {
        let periodic = clear_varying(periodic, self.varying_dim);
        self.base.set_periodic(periodic);
        self.coords.set_periodic(periodic);
    }

    /// Set the missing sentinel for both voxels and coordinates.
    pub fn set_missing_value(&mut self, value: f32) {
        self.base.set_missing_value(value);
        self.extents = self.full_bounding_box();
    }

    /// Grid spacing on the uniform axes and the smallest layer spacing on
    /// the varying axis.
    pub fn min_cell_extents(&self) -> [f64; 3] {
        let vd = self.varying_dim;
        let dims = self.dimensions();
        let mut cell = self.base.min_cell_extents();

        let mut smallest: Option<f64> = None;
        for k in 0..dims[2] {
            for j in 0..dims[1] {
                for i in 0..dims[0] {
                    let idx = [i, j, k];
                    if idx[vd] + 1 >= dims[vd] {
                        continue;
                    }
                    let mut next = idx;
                    next[vd] += 1;
                    let (Some(c0), Some(c1)) = (self.coord_at(idx), self.coord_at(next)) else {
                        continue;
                    };
                    let d = (c1 as f64 - c0 as f64).abs();
                    smallest = Some(smallest.map_or(d, |s| s.min(d)));
                }
            }
        }
        cell[vd] = smallest.unwrap_or(0.0);
        cell
    }

    /// Varying coordinate at `idx`. A missing sample is replaced by the
    /// nearest valid one along the varying axis, searching down first.
    fn varying_coord(&self, idx: [usize; 3]) -> f64 {
        if let Some(c) = self.coord_at(idx) {
            return c as f64;
        }

        let vd = self.varying_dim;
        let n = self.dimensions()[vd];
        let mut sample = idx;
        for layer in (0..idx[vd]).rev() {
            sample[vd] = layer;
            if let Some(c) = self.coord_at(sample) {
                return c as f64;
            }
        }
        for layer in idx[vd] + 1..n {
            sample[vd] = layer;
            if let Some(c) = self.coord_at(sample) {
                return c as f64;
            }
        }
        self.base.user_extents().min[vd]
    }

    fn coord_at(&self, idx: [usize; 3]) -> Option<f32> {
        let c = self.coords.access_ijk(idx[0], idx[1], idx[2]).ok()?;
        if self.base.missing() == Some(c) {
            None
        } else {
            Some(c)
        }
    }

    /// Varying coordinate of layer `layer`, interpolated bilinearly across
    /// the uniform axes at `p`. `lo` holds the cell's lower corner.
    fn interpolate_varying_coord(&self, lo: [usize; 3], layer: usize, p: [f64; 3]) -> f64 {
        let vd = self.varying_dim;
        let (a, b) = self.uniform_axes();
        let hi = cell_upper(lo, self.dimensions());
        let lattice = self.base.lattice();

        let corner = |use_a: bool, use_b: bool| {
            let mut idx = lo;
            idx[vd] = layer;
            if use_a {
                idx[a] = hi[a];
            }
            if use_b {
                idx[b] = hi[b];
            }
            self.varying_coord(idx)
        };
        let c00 = corner(false, false);
        let c01 = corner(true, false);
        let c10 = corner(false, true);
        let c11 = corner(true, true);

        let wa = axis_fraction(&lattice, a, lo[a], hi[a], p[a]);
        let wb = axis_fraction(&lattice, b, lo[b], hi[b], p[b]);

        let bottom = c00 + wa * (c01 - c00);
        let top = c10 + wa * (c11 - c10);
        bottom + wb * (top - bottom)
    }

    /// Lower cell corner: lattice cells on the uniform axes, bisection on
    /// the varying axis.
    fn floor(&self, p: [f64; 3]) -> [usize; 3] {
        let vd = self.varying_dim;
        let lattice = self.base.lattice();
        let p = self.clamp_uniform(p);
        let mut idx = [0; 3];
        let (a, b) = self.uniform_axes();
        for axis in [a, b] {
            idx[axis] = lattice.cell(axis, p[axis]).0;
        }
        idx[vd] = self.bisect(idx, p);
        idx
    }

    /// Clamp the uniform axes of `p` into the extents. The varying
    /// coordinate is left alone.
    fn clamp_uniform(&self, p: [f64; 3]) -> [f64; 3] {
        let lattice = self.base.lattice();
        let (a, b) = self.uniform_axes();
        let mut q = p;
        q[a] = lattice.clamp_axis(a, p[a]);
        q[b] = lattice.clamp_axis(b, p[b]);
        q
    }

    fn bisect(&self, idx: [usize; 3], p: [f64; 3]) -> usize {
        let v = p[self.varying_dim];
        let last = self.dimensions()[self.varying_dim] - 1;
        if last == 0 {
            return 0;
        }

        let mut c0 = self.interpolate_varying_coord(idx, 0, p);
        let c1 = self.interpolate_varying_coord(idx, last, p);
        if c0 <= c1 {
            if v <= c0 {
                return 0;
            }
            if v >= c1 {
                return last;
            }
        } else {
            if v >= c0 {
                return 0;
            }
            if v <= c1 {
                return last;
            }
        }

        let (mut i0, mut i1) = (0, last);
        while i1 - i0 > 1 {
            let mid = (i0 + i1) / 2;
            let cm = self.interpolate_varying_coord(idx, mid, p);
            if cm == v {
                return mid;
            }
            if (v - c0) * (v - cm) < 0.0 {
                i1 = mid;
            } else {
                i0 = mid;
                c0 = cm;
            }
        }
        i0
    }

    /// Cell containing `p` and the upper-corner weight on each axis.
    fn cell(&self, p: [f64; 3]) -> ([usize; 3], [f64; 3]) {
        let vd = self.varying_dim;
        let lattice = self.base.lattice();
        let p = self.clamp_uniform(p);
        let lo = self.floor(p);
        let hi = cell_upper(lo, self.dimensions());

        let mut w = [0.0; 3];
        let (a, b) = self.uniform_axes();
        for axis in [a, b] {
            w[axis] = lattice.cell(axis, p[axis]).1;
        }

        let z0 = self.interpolate_varying_coord(lo, lo[vd], p);
        let z1 = self.interpolate_varying_coord(lo, hi[vd], p);
        if z1 != z0 {
            w[vd] = ((p[vd] - z0) / (z1 - z0)).abs().clamp(0.0, 1.0);
        }
        (lo, w)
    }

    fn contains(&self, p: [f64; 3]) -> bool {
        if !self.extents.contains(p) {
            return false;
        }

        let vd = self.varying_dim;
        let last = self.dimensions()[vd] - 1;
        let lattice = self.base.lattice();
        let mut lo = [0; 3];
        let (a, b) = self.uniform_axes();
        for axis in [a, b] {
            lo[axis] = lattice.cell(axis, p[axis]).0;
        }

        let bottom = self.interpolate_varying_coord(lo, 0, p);
        let top = self.interpolate_varying_coord(lo, last, p);
        let v = p[vd];
        v >= bottom.min(top) && v <= bottom.max(top)
    }

    fn wrap(&self, p: [f64; 3]) -> [f64; 3] {
        let mut q = self.base.lattice().wrap(p);
        q[self.varying_dim] = p[self.varying_dim];
        q
    }

    fn full_bounding_box(&self) -> Extents {
        let dims = self.dimensions();
        self.bounding_box([0, 0, 0], [dims[0] - 1, dims[1] - 1, dims[2] - 1])
    }

    /// Extreme valid coordinate on `layer` within the index box.
    fn layer_extreme(
        &self,
        min: [usize; 3],
        max: [usize; 3],
        layer: usize,
        pick: fn(f32, f32) -> f32,
    ) -> Option<f32> {
        let vd = self.varying_dim;
        let (a, b) = self.uniform_axes();
        let mut extreme: Option<f32> = None;
        for ib in min[b]..=max[b] {
            for ia in min[a]..=max[a] {
                let mut idx = [0; 3];
                idx[a] = ia;
                idx[b] = ib;
                idx[vd] = layer;
                if let Some(c) = self.coord_at(idx) {
                    extreme = Some(extreme.map_or(c, |e| pick(e, c)));
                }
            }
        }
        extreme
    }
}

impl<B> LayeredGrid<B> {
    /// The two uniform axes in increasing order.
    fn uniform_axes(&self) -> (usize, usize) {
        match self.varying_dim {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        }
    }

    pub fn dimensions(&self) -> [usize; 3] {
        self.base.dimensions()
    }

    /// Cached bounding box of the whole grid.
    pub fn user_extents(&self) -> Extents {
        self.extents
    }

    pub fn ijk_origin(&self) -> [usize; 3] {
        self.base.ijk_origin()
    }

    pub fn block_size(&self) -> [usize; 3] {
        self.base.block_size()
    }

    pub fn num_blocks(&self) -> usize {
        self.base.num_blocks()
    }

    pub fn missing_value(&self) -> f32 {
        self.base.missing_value()
    }

    pub fn has_missing_data(&self) -> bool {
        self.base.has_missing_data()
    }

    pub fn interpolation_order(&self) -> InterpolationOrder {
        self.base.interpolation_order()
    }

    pub fn set_interpolation_order(&mut self, order: impl Into<InterpolationOrder>) {
        self.base.set_interpolation_order(order);
    }

    pub fn periodic(&self) -> [bool; 3] {
        self.base.periodic()
    }
}

fn clear_varying(mut periodic: [bool; 3], varying_dim: usize) -> [bool; 3] {
    if periodic[varying_dim] {
        tracing::debug!(varying_dim, "Varying dimension cannot be periodic, clearing");
        periodic[varying_dim] = false;
    }
    periodic
}

/// `|(v - c0) / (c1 - c0)|` between lattice points `i0` and `i1`, or 0 when
/// they coincide.
fn axis_fraction(lattice: &Lattice, axis: usize, i0: usize, i1: usize, v: f64) -> f64 {
    let c0 = lattice.coordinate(axis, i0);
    let c1 = lattice.coordinate(axis, i1);
    if c1 == c0 {
        0.0
    } else {
        ((v - c0) / (c1 - c0)).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_approx_eq, blocked_field, ijk_pattern, terrain_heights};

    const BS: [usize; 3] = [4, 4, 4];
    const MIN: [usize; 3] = [0, 0, 0];
    const MAX: [usize; 3] = [3, 3, 4];

    /// 4x4x5 grid, flat layers at z = 0, 10, 20, 30, 40.
    fn flat_layers() -> LayeredGrid<Vec<f32>> {
        let blocks = blocked_field(BS, MIN, MAX, ijk_pattern);
        let coords = blocked_field(BS, MIN, MAX, |_, _, k| 10.0 * k as f32);
        let e = Extents::new([0.0, 0.0, 0.0], [3.0, 3.0, 40.0]);
        LayeredGrid::new(BS, MIN, MAX, e, [false; 3], blocks, coords, 2).unwrap()
    }

    /// Layers follow a sloping surface: z = 100 + 10*(i+j) + 50*k.
    fn terrain() -> LayeredGrid<Vec<f32>> {
        let blocks = blocked_field(BS, MIN, MAX, ijk_pattern);
        let coords = blocked_field(BS, MIN, MAX, terrain_heights(100.0, 10.0, 50.0));
        let e = Extents::new([0.0, 0.0, 100.0], [3.0, 3.0, 360.0]);
        LayeredGrid::new(BS, MIN, MAX, e, [false; 3], blocks, coords, 2).unwrap()
    }

    // ============================================================================
    // Construction
    // ============================================================================

    #[test]
    fn test_varying_dim_clamped_and_not_periodic() {
        let blocks = blocked_field(BS, MIN, MAX, ijk_pattern);
        let coords = blocked_field(BS, MIN, MAX, |_, _, k| k as f32);
        let e = Extents::new([0.0, 0.0, 0.0], [3.0, 3.0, 4.0]);
        let mut grid = LayeredGrid::new(BS, MIN, MAX, e, [true; 3], blocks, coords, 7).unwrap();
        assert_eq!(grid.varying_dim(), 2);
        assert_eq!(grid.periodic(), [true, true, false]);

        grid.set_periodic([false, false, true]);
        assert_eq!(grid.periodic(), [false; 3]);
    }

    #[test]
    fn test_user_extents_follow_coordinates() {
        let grid = terrain();
        let e = grid.user_extents();
        assert_eq!(e.min, [0.0, 0.0, 100.0]);
        // Top layer at (3,3) is 100 + 60 + 200.
        assert_eq!(e.max, [3.0, 3.0, 360.0]);
    }

    // ============================================================================
    // Coordinates and bisection
    // ============================================================================

    #[test]
    fn test_user_coordinates() {
        let grid = terrain();
        assert_eq!(grid.user_coordinates(1, 2, 3).unwrap(), [1.0, 2.0, 280.0]);
        assert!(grid.user_coordinates(0, 0, 5).is_err());
    }

    #[test]
    fn test_floor_exact_samples_and_between() {
        let grid = flat_layers();
        for k in 0..5 {
            let z = 10.0 * k as f64;
            assert_eq!(grid.ijk_index_floor(1.0, 1.0, z), [1, 1, k]);
        }
        assert_eq!(grid.ijk_index_floor(1.0, 1.0, 15.0), [1, 1, 1]);
        assert_eq!(grid.ijk_index_floor(1.0, 1.0, 39.9), [1, 1, 3]);
        assert_eq!(grid.ijk_index_floor(1.0, 1.0, -5.0), [1, 1, 0]);
        assert_eq!(grid.ijk_index_floor(1.0, 1.0, 55.0), [1, 1, 4]);
    }

    #[test]
    fn test_floor_decreasing_layers() {
        let blocks = blocked_field(BS, MIN, MAX, ijk_pattern);
        let coords = blocked_field(BS, MIN, MAX, |_, _, k| 1000.0 - 100.0 * k as f32);
        let e = Extents::new([0.0, 0.0, 1000.0], [3.0, 3.0, 600.0]);
        let grid = LayeredGrid::new(BS, MIN, MAX, e, [false; 3], blocks, coords, 2).unwrap();

        assert_eq!(grid.ijk_index_floor(0.0, 0.0, 1000.0), [0, 0, 0]);
        assert_eq!(grid.ijk_index_floor(0.0, 0.0, 850.0), [0, 0, 1]);
        assert_eq!(grid.ijk_index_floor(0.0, 0.0, 800.0), [0, 0, 2]);
        assert_eq!(grid.ijk_index_floor(0.0, 0.0, 500.0), [0, 0, 4]);
        assert_eq!(grid.user_extents().min[2], 1000.0);
        assert_eq!(grid.user_extents().max[2], 600.0);
    }

    #[test]
    fn test_ijk_index_rounds() {
        let grid = flat_layers();
        assert_eq!(grid.ijk_index(1.4, 1.6, 16.0), [1, 2, 2]);
        assert_eq!(grid.ijk_index(1.4, 1.6, 14.0), [1, 2, 1]);
    }

    #[test]
    fn test_floor_on_sloping_terrain() {
        let grid = terrain();
        // Column (2,1): layers at 130, 180, 230, 280, 330.
        assert_eq!(grid.ijk_index_floor(2.0, 1.0, 200.0), [2, 1, 1]);
        assert_eq!(grid.ijk_index_floor(2.0, 1.0, 230.0), [2, 1, 2]);
    }

    #[test]
    fn test_floor_outside_uniform_extents_uses_edge_column() {
        let grid = terrain();
        // Column (0,1): layers at 110, 160, 210, ...
        assert_eq!(grid.ijk_index_floor(0.0, 1.0, 170.0), [0, 1, 1]);
        assert_eq!(grid.ijk_index_floor(-2.0, 1.0, 170.0), [0, 1, 1]);
        assert_eq!(grid.ijk_index(-2.0, 1.0, 170.0), grid.ijk_index(0.0, 1.0, 170.0));
    }

    #[test]
    fn test_floor_with_repeated_layer_coordinate() {
        let heights = [0.0, 10.0, 10.0, 20.0, 30.0];
        let blocks = blocked_field(BS, MIN, MAX, ijk_pattern);
        let coords = blocked_field(BS, MIN, MAX, |_, _, k| heights[k]);
        let e = Extents::new([0.0, 0.0, 0.0], [3.0, 3.0, 30.0]);
        let grid = LayeredGrid::new(BS, MIN, MAX, e, [false; 3], blocks, coords, 2).unwrap();

        // The first bisection midpoint is layer 2, which matches exactly.
        assert_eq!(grid.ijk_index_floor(1.0, 1.0, 10.0), [1, 1, 2]);
        assert_eq!(grid.ijk_index_floor(1.0, 1.0, 15.0), [1, 1, 2]);
        assert_eq!(grid.ijk_index_floor(1.0, 1.0, 5.0), [1, 1, 0]);
    }

    // ============================================================================
    // Reconstruction and containment
    // ============================================================================

    #[test]
    fn test_value_flat_layers_matches_regular() {
        let grid = flat_layers();
        // Halfway between layers 1 and 2 at the cell center.
        assert_approx_eq!(grid.value(0.5, 0.5, 15.0), 155.5, 1e-4);
        assert_approx_eq!(grid.value(2.0, 3.0, 20.0), 232.0, 1e-4);
    }

    #[test]
    fn test_value_on_terrain() {
        let grid = terrain();
        // Column (1,1): layers at 120, 170, ...; 145 is halfway between k=0 and k=1.
        assert_approx_eq!(grid.value(1.0, 1.0, 145.0), 61.0, 1e-4);
        // Below the surface is outside.
        assert_eq!(grid.value(1.0, 1.0, 110.0), grid.missing_value());
    }

    #[test]
    fn test_inside_grid() {
        let grid = terrain();
        assert!(grid.inside_grid(0.0, 0.0, 100.0));
        assert!(grid.inside_grid(1.5, 1.5, 250.0));
        // Above the top of column (0,0) but inside the bounding box.
        assert!(!grid.inside_grid(0.0, 0.0, 350.0));
        assert!(!grid.inside_grid(4.0, 0.0, 200.0));
    }

    #[test]
    fn test_missing_coordinates_fall_back_along_column() {
        let mv = -1.0e9;
        let blocks = blocked_field(BS, MIN, MAX, ijk_pattern);
        let coords = blocked_field(BS, MIN, MAX, |i, _, k| {
            if i == 0 && k == 0 {
                mv
            } else {
                10.0 * k as f32
            }
        });
        let e = Extents::new([0.0, 0.0, 0.0], [3.0, 3.0, 40.0]);
        let grid = LayeredGrid::with_missing(BS, MIN, MAX, e, [false; 3], blocks, coords, 2, mv)
            .unwrap();

        // Layer 0 is missing at i == 0; the next layer up stands in.
        assert_eq!(grid.user_coordinates(0, 2, 0).unwrap()[2], 10.0);
        assert_eq!(grid.user_coordinates(1, 2, 0).unwrap()[2], 0.0);
        // The bottom plane still has valid samples elsewhere.
        assert_eq!(grid.user_extents().min[2], 0.0);
    }

    #[test]
    fn test_bounding_box_skips_empty_layers() {
        let mv = -1.0e9;
        let blocks = blocked_field(BS, MIN, MAX, ijk_pattern);
        let coords = blocked_field(BS, MIN, MAX, |_, _, k| {
            if k == 0 {
                mv
            } else {
                10.0 * k as f32
            }
        });
        let e = Extents::new([0.0, 0.0, 0.0], [3.0, 3.0, 40.0]);
        let grid = LayeredGrid::with_missing(BS, MIN, MAX, e, [false; 3], blocks, coords, 2, mv)
            .unwrap();

        let bbox = grid.bounding_box([0, 0, 0], [3, 3, 4]);
        assert_eq!(bbox.min[2], 10.0);
        assert_eq!(bbox.max[2], 40.0);
    }

    #[test]
    fn test_enclosing_region() {
        let grid = terrain();
        let (min, max) = grid.enclosing_region([0.0, 0.0, 160.0], [1.0, 1.0, 200.0]);
        assert_eq!(min, [0, 0, 0]);
        assert_eq!(max, [1, 1, 2]);

        let (min, max) = grid.enclosing_region([0.0, 0.0, 5000.0], [1.0, 1.0, 6000.0]);
        assert_eq!((min[2], max[2]), (0, 4));
    }

    #[test]
    fn test_min_cell_extents() {
        let grid = terrain();
        assert_eq!(grid.min_cell_extents(), [1.0, 1.0, 50.0]);
    }

    #[test]
    fn test_reshape_recomputes_extents() {
        let blocks = blocked_field([2, 2, 4], MIN, MAX, ijk_pattern);
        let coords = blocked_field([2, 2, 4], MIN, MAX, terrain_heights(100.0, 10.0, 50.0));
        let e = Extents::new([0.0, 0.0, 100.0], [3.0, 3.0, 360.0]);
        let mut grid = LayeredGrid::new([2, 2, 4], MIN, MAX, e, [false; 3], blocks, coords, 2)
            .unwrap();

        grid.reshape([1, 1, 0], [3, 3, 4], [false, false, true]).unwrap();
        assert_eq!(grid.dimensions(), [3, 3, 5]);
        assert_eq!(grid.periodic(), [false; 3]);
        let e = grid.user_extents();
        assert_eq!(e.min, [1.0, 1.0, 120.0]);
        assert_eq!(e.max, [3.0, 3.0, 360.0]);
        assert_eq!(grid.user_coordinates(0, 0, 0).unwrap(), [1.0, 1.0, 120.0]);
    }

    #[test]
    fn test_varying_dim_zero() {
        // Layers vary along X: x = 5*i + j.
        let blocks = blocked_field(BS, MIN, MAX, ijk_pattern);
        let coords = blocked_field(BS, MIN, MAX, |i, j, _| 5.0 * i as f32 + j as f32);
        let e = Extents::new([0.0, 0.0, 0.0], [18.0, 3.0, 4.0]);
        let grid = LayeredGrid::new(BS, MIN, MAX, e, [false; 3], blocks, coords, 0).unwrap();

        assert_eq!(grid.user_coordinates(2, 1, 3).unwrap(), [11.0, 1.0, 3.0]);
        assert_eq!(grid.ijk_index_floor(11.0, 1.0, 3.0), [2, 1, 3]);
        assert_eq!(grid.ijk_index_floor(12.0, 1.0, 3.0), [2, 1, 3]);
        // Halfway between i=2 and i=3 at j=1, k=3.
        assert_approx_eq!(grid.value(13.5, 1.0, 3.0), 312.5, 1e-4);
    }
}
