//! Rectilinear grids with non-uniform spacing.
//!
//! Every axis carries an explicit coordinate vector. Vectors may increase or
//! decrease with index but must be monotonic.

use crate::error::{GridError, Result};
use crate::interpolation;
use crate::regular::RegularGrid;
use crate::types::{cell_upper, Extents, InterpolationOrder};

/// A grid whose points sit at per-axis coordinate vectors.
///
/// The vectors given at construction are kept whole so a reshape can move
/// the window anywhere inside them.
#[derive(Debug, Clone)]
pub struct StretchedGrid<B> {
    base: RegularGrid<B>,
    coords: [Vec<f64>; 3],
    /// Global voxel index of the first entry of each coordinate vector.
    coords_min: [usize; 3],
}

impl<B: AsRef<[f32]>> StretchedGrid<B> {
    /// Create a stretched grid.
    ///
    /// A coordinate vector whose length does not match the grid dimension
    /// along its axis is replaced by uniform spacing over `extents`. The
    /// grid's user extents are then taken from the first and last
    /// coordinate of each vector.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bs: [usize; 3],
        min: [usize; 3],
        max: [usize; 3],
        extents: Extents,
        periodic: [bool; 3],
        blocks: Vec<B>,
        xcoords: Vec<f64>,
        ycoords: Vec<f64>,
        zcoords: Vec<f64>,
    ) -> Result<Self> {
        let mut base = RegularGrid::new(bs, min, max, extents, periodic, blocks)?;
        let dims = base.dimensions();
        let lattice = base.lattice();

        let mut coords = [xcoords, ycoords, zcoords];
        for (axis, c) in coords.iter_mut().enumerate() {
            if c.len() != dims[axis] {
                tracing::debug!(
                    axis,
                    expected = dims[axis],
                    actual = c.len(),
                    "Coordinate vector length mismatch, using uniform spacing"
                );
                *c = (0..dims[axis]).map(|i| lattice.coordinate(axis, i)).collect();
            }
        }

        base.set_user_extents(endpoints(&coords));
        Ok(Self {
            base,
            coords,
            coords_min: min,
        })
    }

    /// Create a stretched grid whose voxels may hold `missing_value`.
    #[allow(clippy::too_many_arguments)]
    pub fn with_missing(
        bs: [usize; 3],
        min: [usize; 3],
        max: [usize; 3],
        extents: Extents,
        periodic: [bool; 3],
        blocks: Vec<B>,
        xcoords: Vec<f64>,
        ycoords: Vec<f64>,
        zcoords: Vec<f64>,
        missing_value: f32,
    ) -> Result<Self> {
        let mut grid = Self::new(
            bs, min, max, extents, periodic, blocks, xcoords, ycoords, zcoords,
        )?;
        grid.base.set_missing_value(missing_value);
        Ok(grid)
    }

    /// Coordinates of the current region along `axis`.
    pub fn coordinates(&self, axis: usize) -> &[f64] {
        let start = self.base.ijk_origin()[axis] - self.coords_min[axis];
        &self.coords[axis][start..start + self.base.dimensions()[axis]]
    }

    pub fn access_ijk(&self, i: usize, j: usize, k: usize) -> Result<f32> {
        self.base.access_ijk(i, j, k)
    }

    /// Reconstruct the field at a user-space point.
    pub fn value(&self, x: f64, y: f64, z: f64) -> f32 {
        let p = self.base.lattice().wrap([x, y, z]);
        if !self.base.inside_grid(p[0], p[1], p[2]) {
            return self.base.missing_value();
        }
        let (lo, w) = self.cell(p);
        self.base.blend(lo, w)
    }

    pub fn user_coordinates(&self, i: usize, j: usize, k: usize) -> Result<[f64; 3]> {
        self.base.check_index(i, j, k)?;
        Ok([
            self.coordinates(0)[i],
            self.coordinates(1)[j],
            self.coordinates(2)[k],
        ])
    }

    /// Index of the grid point nearest to a user-space point.
    pub fn ijk_index(&self, x: f64, y: f64, z: f64) -> [usize; 3] {
        let (lo, w) = self.cell(self.base.lattice().wrap([x, y, z]));
        interpolation::nearest_index(lo, cell_upper(lo, self.dimensions()), w)
    }

    /// Index of the cell corner at or below a user-space point.
    pub fn ijk_index_floor(&self, x: f64, y: f64, z: f64) -> [usize; 3] {
        self.cell(self.base.lattice().wrap([x, y, z])).0
    }

    pub fn inside_grid(&self, x: f64, y: f64, z: f64) -> bool {
        self.base.inside_grid(x, y, z)
    }

    /// User extents of the index box `min..=max`, with indices clamped to
    /// the grid.
    pub fn bounding_box(&self, min: [usize; 3], max: [usize; 3]) -> Extents {
        let mut lo = [0.0; 3];
        let mut hi = [0.0; 3];
        for axis in 0..3 {
            let c = self.coordinates(axis);
            let last = c.len() - 1;
            lo[axis] = c[min[axis].min(last)];
            hi[axis] = c[max[axis].min(last)];
        }
        Extents::new(lo, hi)
    }

    /// Smallest index box whose grid points cover the user box `minu..maxu`.
    pub fn enclosing_region(&self, minu: [f64; 3], maxu: [f64; 3]) -> ([usize; 3], [usize; 3]) {
        let mut min = [0; 3];
        let mut max = [0; 3];
        for axis in 0..3 {
            let last = self.coordinates(axis).len() - 1;
            let (ia, wa) = self.axis_cell(axis, minu[axis]);
            let (ib, wb) = self.axis_cell(axis, maxu[axis]);
            let ua = if wa > 0.0 { ia + 1 } else { ia };
            let ub = if wb > 0.0 { ib + 1 } else { ib };
            min[axis] = ia.min(ib);
            max[axis] = ua.max(ub).min(last);
        }
        (min, max)
    }

    pub fn range(&self) -> (f32, f32) {
        self.base.range()
    }

    /// Change the region of interest.
    ///
    /// Besides the block-count rule, the new window must stay inside the
    /// voxels the construction-time coordinate vectors describe. Nothing
    /// changes on error.
    pub fn reshape(&mut self, min: [usize; 3], max: [usize; 3], periodic: [bool; 3]) -> Result<()> {
        self.base.layout().reshaped(min, max)?;

        let known_max: [usize; 3] =
            std::array::from_fn(|axis| self.coords_min[axis] + self.coords[axis].len() - 1);
        if (0..3).any(|axis| min[axis] < self.coords_min[axis] || max[axis] > known_max[axis]) {
            tracing::debug!(?min, ?max, "Reshape past known coordinates refused");
            return Err(GridError::ReshapeOutsideRegion {
                min,
                max,
                current_min: self.coords_min,
                current_max: known_max,
            });
        }

        self.base.reshape(min, max, periodic)?;
        let active = [
            self.coordinates(0).to_vec(),
            self.coordinates(1).to_vec(),
            self.coordinates(2).to_vec(),
        ];
        self.base.set_user_extents(endpoints(&active));
        Ok(())
    }

    /// Smallest spacing between adjacent coordinates on each axis.
    pub fn min_cell_extents(&self) -> [f64; 3] {
        let mut cell = [0.0; 3];
        for (axis, spacing) in cell.iter_mut().enumerate() {
            *spacing = self
                .coordinates(axis)
                .windows(2)
                .map(|w| (w[1] - w[0]).abs())
                .reduce(f64::min)
                .unwrap_or(0.0);
        }
        cell
    }

    fn cell(&self, p: [f64; 3]) -> ([usize; 3], [f64; 3]) {
        let mut lo = [0; 3];
        let mut w = [0.0; 3];
        for axis in 0..3 {
            (lo[axis], w[axis]) = self.axis_cell(axis, p[axis]);
        }
        (lo, w)
    }

    /// Clamp `v` to the axis, then locate its cell by binary search.
    ///
    /// # Returns
    /// `(lower index, weight of the upper point)`.
    fn axis_cell(&self, axis: usize, v: f64) -> (usize, f64) {
        let c = self.coordinates(axis);
        let last = c.len() - 1;
        if last == 0 {
            return (0, 0.0);
        }

        let v = self.base.lattice().clamp_axis(axis, v);
        let count = if c[0] <= c[last] {
            c.partition_point(|&x| x <= v)
        } else {
            c.partition_point(|&x| x >= v)
        };
        let i = count.saturating_sub(1).min(last);
        if i == last || c[i + 1] == c[i] {
            return (i, 0.0);
        }
        (i, ((v - c[i]) / (c[i + 1] - c[i])).clamp(0.0, 1.0))
    }
}

impl<B> StretchedGrid<B> {
    pub fn dimensions(&self) -> [usize; 3] {
        self.base.dimensions()
    }

    pub fn user_extents(&self) -> Extents {
        self.base.user_extents()
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

    pub fn set_missing_value(&mut self, value: f32) {
        self.base.set_missing_value(value);
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

    pub fn set_periodic(&mut self, periodic: [bool; 3]) {
        self.base.set_periodic(periodic);
    }
}

fn endpoints(coords: &[Vec<f64>; 3]) -> Extents {
    let first = |c: &Vec<f64>| c.first().copied().unwrap_or(0.0);
    let last = |c: &Vec<f64>| c.last().copied().unwrap_or(0.0);
    Extents::new(
        [first(&coords[0]), first(&coords[1]), first(&coords[2])],
        [last(&coords[0]), last(&coords[1]), last(&coords[2])],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_approx_eq, blocked_field, ijk_pattern};

    const BS: [usize; 3] = [2, 2, 2];
    const MIN: [usize; 3] = [0, 0, 0];
    const MAX: [usize; 3] = [3, 2, 2];

    fn stretched() -> StretchedGrid<Vec<f32>> {
        let blocks = blocked_field(BS, MIN, MAX, ijk_pattern);
        StretchedGrid::new(
            BS,
            MIN,
            MAX,
            Extents::from_array([0.0; 6]),
            [false; 3],
            blocks,
            vec![0.0, 1.0, 3.0, 7.0],
            vec![10.0, 5.0, 0.0],
            vec![-1.0, 0.0, 1.0],
        )
        .unwrap()
    }

    #[test]
    fn test_extents_from_coordinate_endpoints() {
        let grid = stretched();
        let e = grid.user_extents();
        assert_eq!(e.min, [0.0, 10.0, -1.0]);
        assert_eq!(e.max, [7.0, 0.0, 1.0]);
    }

    #[test]
    fn test_length_mismatch_falls_back_to_uniform() {
        let blocks = blocked_field(BS, MIN, MAX, ijk_pattern);
        let grid = StretchedGrid::new(
            BS,
            MIN,
            MAX,
            Extents::new([0.0, 0.0, 0.0], [3.0, 4.0, 1.0]),
            [false; 3],
            blocks,
            vec![0.0, 1.0],
            vec![0.0, 1.0, 4.0],
            vec![],
        )
        .unwrap();
        assert_eq!(grid.coordinates(0), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(grid.coordinates(1), &[0.0, 1.0, 4.0]);
        assert_eq!(grid.coordinates(2), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_with_missing_sets_sentinel() {
        let mut blocks = blocked_field(BS, MIN, MAX, ijk_pattern);
        blocks[0][0] = -1.0;
        let grid = StretchedGrid::with_missing(
            BS,
            MIN,
            MAX,
            Extents::from_array([0.0; 6]),
            [false; 3],
            blocks,
            vec![0.0, 1.0, 3.0, 7.0],
            vec![10.0, 5.0, 0.0],
            vec![-1.0, 0.0, 1.0],
            -1.0,
        )
        .unwrap();
        assert!(grid.has_missing_data());
        assert_eq!(grid.value(0.5, 10.0, -1.0), -1.0);
        assert_eq!(grid.value(1.0, 10.0, -1.0), 1.0);
    }

    #[test]
    fn test_user_coordinates_roundtrip() {
        let grid = stretched();
        for k in 0..3 {
            for j in 0..3 {
                for i in 0..4 {
                    let p = grid.user_coordinates(i, j, k).unwrap();
                    assert_eq!(grid.ijk_index(p[0], p[1], p[2]), [i, j, k]);
                    assert_eq!(grid.ijk_index_floor(p[0], p[1], p[2]), [i, j, k]);
                }
            }
        }
    }

    #[test]
    fn test_floor_and_nearest_between_points() {
        let grid = stretched();
        assert_eq!(grid.ijk_index_floor(2.0, 7.0, 0.2), [1, 0, 1]);
        assert_eq!(grid.ijk_index(2.2, 7.0, 0.2), [2, 1, 1]);
        // Clamped to the last point.
        assert_eq!(grid.ijk_index_floor(100.0, -3.0, 5.0), [3, 2, 2]);
    }

    #[test]
    fn test_value_uses_stretched_weights() {
        let grid = stretched();
        // x = 5 is halfway between 3 (i=2) and 7 (i=3).
        assert_approx_eq!(grid.value(5.0, 10.0, -1.0), 2.5, 1e-5);
        // y = 7.5 is halfway between 10 (j=0) and 5 (j=1).
        assert_approx_eq!(grid.value(0.0, 7.5, -1.0), 5.0, 1e-5);
        assert_eq!(grid.value(8.0, 5.0, 0.0), grid.missing_value());
    }

    #[test]
    fn test_enclosing_region() {
        let grid = stretched();
        let (min, max) = grid.enclosing_region([0.5, 6.0, 0.0], [3.0, 1.0, 0.5]);
        assert_eq!(min, [0, 0, 1]);
        assert_eq!(max, [2, 2, 2]);
    }

    #[test]
    fn test_bounding_box_and_min_cell() {
        let grid = stretched();
        let b = grid.bounding_box([1, 0, 0], [2, 1, 2]);
        assert_eq!(b.min, [1.0, 10.0, -1.0]);
        assert_eq!(b.max, [3.0, 5.0, 1.0]);
        assert_eq!(grid.min_cell_extents(), [1.0, 5.0, 1.0]);
    }

    #[test]
    fn test_reshape_slices_coordinates() {
        let mut grid = stretched();
        let blocks_before = grid.num_blocks();
        grid.reshape([1, 1, 0], [3, 2, 2], [false; 3]).unwrap();
        assert_eq!(grid.num_blocks(), blocks_before);
        assert_eq!(grid.coordinates(0), &[1.0, 3.0, 7.0]);
        assert_eq!(grid.coordinates(1), &[5.0, 0.0]);
        assert_eq!(grid.user_extents().min, [1.0, 5.0, -1.0]);
        assert_eq!(grid.user_extents().max, [7.0, 0.0, 1.0]);
        assert_eq!(grid.access_ijk(0, 0, 0).unwrap(), ijk_pattern(1, 1, 0));
        assert_eq!(grid.user_coordinates(2, 0, 1).unwrap(), [7.0, 5.0, 0.0]);
    }

    #[test]
    fn test_reshape_regrows_to_full_coordinates() {
        let mut grid = stretched();
        grid.reshape([1, 1, 0], [3, 2, 2], [false; 3]).unwrap();
        grid.reshape([0, 0, 0], [3, 2, 2], [false; 3]).unwrap();

        assert_eq!(grid.coordinates(0), &[0.0, 1.0, 3.0, 7.0]);
        assert_eq!(grid.coordinates(1), &[10.0, 5.0, 0.0]);
        assert_eq!(grid.user_extents(), stretched().user_extents());
        assert_eq!(grid.user_coordinates(0, 0, 0).unwrap(), [0.0, 10.0, -1.0]);
        assert_eq!(grid.ijk_index(3.0, 5.0, 0.0), [2, 1, 1]);
    }

    #[test]
    fn test_reshape_past_known_coordinates_refused() {
        let mut grid = stretched();
        let err = grid.reshape([0, 0, 0], [3, 3, 2], [false; 3]).unwrap_err();
        assert!(matches!(
            err,
            GridError::ReshapeOutsideRegion {
                current_max: [3, 2, 2],
                ..
            }
        ));
        assert_eq!(grid.dimensions(), [4, 3, 3]);
        assert_eq!(grid.coordinates(1), &[10.0, 5.0, 0.0]);
    }

    #[test]
    fn test_bounding_box_clamps_indices() {
        let grid = stretched();
        let b = grid.bounding_box([0, 0, 0], [5, 1, 1]);
        assert_eq!(b.min, [0.0, 10.0, -1.0]);
        assert_eq!(b.max, [7.0, 5.0, 0.0]);

        let b = grid.bounding_box([9, 9, 9], [9, 9, 9]);
        assert_eq!(b.min, [7.0, 0.0, 1.0]);
    }
}
