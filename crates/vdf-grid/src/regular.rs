//! Axis-aligned grid with uniform spacing along each axis.
//!
//! `RegularGrid` is also the base the other variants are composed on: it
//! owns the block layout, the block handles and the missing-value and
//! interpolation state.

use crate::blocks::BlockLayout;
use crate::error::{GridError, Result};
use crate::interpolation;
use crate::iter::{Iter, IterMut};
use crate::lattice::Lattice;
use crate::types::{cell_upper, Extents, InterpolationOrder};

/// A structured grid over caller-owned block storage.
///
/// `B` is the block handle: `&[f32]` for read-only views, `&mut [f32]` for
/// writable views, or `Vec<f32>` when the grid should own its data. The grid
/// never copies voxel payload.
#[derive(Debug, Clone)]
pub struct RegularGrid<B> {
    layout: BlockLayout,
    blocks: Vec<B>,
    extents: Extents,
    spacing: [f64; 3],
    periodic: [bool; 3],
    missing_value: f32,
    has_missing: bool,
    interpolation: InterpolationOrder,
}

impl<B: AsRef<[f32]>> RegularGrid<B> {
    /// Create a grid over the global voxel range `min..=max`.
    ///
    /// # Arguments
    /// * `bs` - Block size; a zero entry is treated as 1
    /// * `min`, `max` - Inclusive global voxel bounds of the region
    /// * `extents` - User coordinates of the `min` and `max` corners
    /// * `periodic` - Per-axis wraparound
    /// * `blocks` - `prod(block_dims)` blocks, each at least `prod(bs)` long
    pub fn new(
        bs: [usize; 3],
        min: [usize; 3],
        max: [usize; 3],
        extents: Extents,
        periodic: [bool; 3],
        blocks: Vec<B>,
    ) -> Result<Self> {
        let layout = BlockLayout::new(bs, min, max)?;
        layout.validate_blocks(&blocks)?;
        let spacing = axis_spacing(extents, layout.dims(), [0.0; 3]);

        Ok(Self {
            layout,
            blocks,
            extents,
            spacing,
            periodic,
            missing_value: f32::INFINITY,
            has_missing: false,
            interpolation: InterpolationOrder::default(),
        })
    }

    /// Create a grid whose voxels may hold `missing_value`.
    pub fn with_missing(
        bs: [usize; 3],
        min: [usize; 3],
        max: [usize; 3],
        extents: Extents,
        periodic: [bool; 3],
        blocks: Vec<B>,
        missing_value: f32,
    ) -> Result<Self> {
        let mut grid = Self::new(bs, min, max, extents, periodic, blocks)?;
        grid.set_missing_value(missing_value);
        Ok(grid)
    }

    /// Read the voxel at ROI-relative `(i, j, k)`.
    pub fn access_ijk(&self, i: usize, j: usize, k: usize) -> Result<f32> {
        let (block, offset) = self.layout.locate(i, j, k)?;
        Ok(self.blocks[block].as_ref()[offset])
    }

    /// Reconstruct the field at a user-space point.
    ///
    /// Returns the missing value when the point lies outside the grid on a
    /// non-periodic axis.
    pub fn value(&self, x: f64, y: f64, z: f64) -> f32 {
        let lattice = self.lattice();
        let p = lattice.wrap([x, y, z]);
        if !lattice.contains(p) {
            return self.missing_value;
        }

        let mut lo = [0; 3];
        let mut w = [0.0; 3];
        for axis in 0..3 {
            (lo[axis], w[axis]) = lattice.cell(axis, p[axis]);
        }
        self.blend(lo, w)
    }

    /// Blend the cell at `lo` with upper-corner weights `w` using the current
    /// interpolation order.
    pub(crate) fn blend(&self, lo: [usize; 3], w: [f64; 3]) -> f32 {
        let hi = cell_upper(lo, self.dimensions());
        let fetch = |idx: [usize; 3]| self.voxel(idx);
        match self.interpolation {
            InterpolationOrder::Nearest => interpolation::nearest(fetch, lo, hi, w),
            InterpolationOrder::Linear => {
                interpolation::trilinear(fetch, lo, hi, w, self.missing())
            }
        }
    }

    /// Voxel at an index already known to be in range.
    fn voxel(&self, idx: [usize; 3]) -> f32 {
        self.access_ijk(idx[0], idx[1], idx[2])
            .unwrap_or(self.missing_value)
    }

    /// User coordinates of ROI-relative `(i, j, k)`.
    pub fn user_coordinates(&self, i: usize, j: usize, k: usize) -> Result<[f64; 3]> {
        self.check_index(i, j, k)?;
        Ok(self.lattice().point([i, j, k]))
    }

    /// Index of the grid point nearest to a user-space point.
    ///
    /// The point is wrapped on periodic axes and clamped to the extents first.
    pub fn ijk_index(&self, x: f64, y: f64, z: f64) -> [usize; 3] {
        let (lo, w) = self.locate_clamped([x, y, z]);
        interpolation::nearest_index(lo, cell_upper(lo, self.dimensions()), w)
    }

    /// Index of the cell corner at or below a user-space point.
    pub fn ijk_index_floor(&self, x: f64, y: f64, z: f64) -> [usize; 3] {
        self.locate_clamped([x, y, z]).0
    }

    fn locate_clamped(&self, p: [f64; 3]) -> ([usize; 3], [f64; 3]) {
        let lattice = self.lattice();
        let p = lattice.wrap(p);
        let mut lo = [0; 3];
        let mut w = [0.0; 3];
        for axis in 0..3 {
            let v = lattice.clamp_axis(axis, p[axis]);
            (lo[axis], w[axis]) = lattice.cell(axis, v);
        }
        (lo, w)
    }

    /// True when the point lies within the user extents.
    pub fn inside_grid(&self, x: f64, y: f64, z: f64) -> bool {
        self.extents.contains([x, y, z])
    }

    /// User extents of the index box `min..=max` (ROI-relative).
    pub fn bounding_box(&self, min: [usize; 3], max: [usize; 3]) -> Extents {
        let lattice = self.lattice();
        Extents::new(lattice.point(min), lattice.point(max))
    }

    /// Smallest ROI-relative index box whose points cover the user box
    /// `minu..maxu`, clamped to the grid.
    pub fn enclosing_region(&self, minu: [f64; 3], maxu: [f64; 3]) -> ([usize; 3], [usize; 3]) {
        let lattice = self.lattice();
        let mut min = [0; 3];
        let mut max = [0; 3];
        for axis in 0..3 {
            (min[axis], max[axis]) = lattice.enclosing(axis, minu[axis], maxu[axis]);
        }
        (min, max)
    }

    /// Minimum and maximum over non-missing voxels.
    ///
    /// When every voxel is missing both bounds are the missing value.
    pub fn range(&self) -> (f32, f32) {
        let missing = self.missing();
        let mut range: Option<(f32, f32)> = None;
        for v in self.iter() {
            if Some(v) == missing {
                continue;
            }
            range = Some(match range {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            });
        }
        range.unwrap_or((self.missing_value, self.missing_value))
    }

    /// Change the region of interest without touching block storage.
    ///
    /// The new window may shift or grow past the current one but must need
    /// exactly the allocated number of blocks per axis. User extents follow
    /// the new corners at the current spacing. Nothing changes on error.
    pub fn reshape(&mut self, min: [usize; 3], max: [usize; 3], periodic: [bool; 3]) -> Result<()> {
        let layout = match self.layout.reshaped(min, max) {
            Ok(layout) => layout,
            Err(e) => {
                tracing::debug!(?min, ?max, error = %e, "Reshape refused");
                return Err(e);
            }
        };

        let origin = self.layout.min();
        let mut extents = self.extents;
        for axis in 0..3 {
            let shift = min[axis] as f64 - origin[axis] as f64;
            let start = self.extents.min[axis] + shift * self.spacing[axis];
            extents.min[axis] = start;
            extents.max[axis] = start + (max[axis] - min[axis]) as f64 * self.spacing[axis];
        }
        self.extents = extents;
        self.layout = layout;
        self.periodic = periodic;
        Ok(())
    }

    /// Iterate the region I-fastest.
    pub fn iter(&self) -> Iter<'_, B> {
        Iter::new(self)
    }

    pub(crate) fn check_index(&self, i: usize, j: usize, k: usize) -> Result<()> {
        if self.layout.contains(i, j, k) {
            Ok(())
        } else {
            Err(GridError::out_of_bounds(i, j, k, self.dimensions()))
        }
    }

    pub(crate) fn block(&self, index: usize) -> &[f32] {
        self.blocks[index].as_ref()
    }
}

impl<B: AsRef<[f32]> + AsMut<[f32]>> RegularGrid<B> {
    /// Mutable reference to the voxel at ROI-relative `(i, j, k)`.
    ///
    /// Out-of-range writes are refused with `OutOfBounds`.
    pub fn access_ijk_mut(&mut self, i: usize, j: usize, k: usize) -> Result<&mut f32> {
        let (block, offset) = self.layout.locate(i, j, k)?;
        Ok(&mut self.blocks[block].as_mut()[offset])
    }

    /// Iterate the region I-fastest with mutable access.
    pub fn iter_mut(&mut self) -> IterMut<'_> {
        IterMut::new(self.layout, &mut self.blocks)
    }
}

impl<B> RegularGrid<B> {
    pub(crate) fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    /// Uniform lattice over the current extents.
    pub(crate) fn lattice(&self) -> Lattice {
        Lattice::new(self.extents, self.dimensions(), self.periodic)
    }

    /// Replace the user extents. Used by variants that derive extents from
    /// auxiliary coordinates.
    pub(crate) fn set_user_extents(&mut self, extents: Extents) {
        self.extents = extents;
        self.spacing = axis_spacing(extents, self.dimensions(), self.spacing);
    }

    /// Missing sentinel when missing-data handling is enabled.
    pub(crate) fn missing(&self) -> Option<f32> {
        self.has_missing.then_some(self.missing_value)
    }

    /// Grid dimensions of the region.
    pub fn dimensions(&self) -> [usize; 3] {
        self.layout.dims()
    }

    /// User coordinates of the first and last grid points.
    pub fn user_extents(&self) -> Extents {
        self.extents
    }

    /// Global index of the first region voxel.
    pub fn ijk_origin(&self) -> [usize; 3] {
        self.layout.min()
    }

    pub fn block_size(&self) -> [usize; 3] {
        self.layout.block_size()
    }

    pub fn num_blocks(&self) -> usize {
        self.layout.num_blocks()
    }

    /// Absolute grid spacing along each axis.
    pub fn min_cell_extents(&self) -> [f64; 3] {
        let lattice = self.lattice();
        [
            lattice.delta(0).abs(),
            lattice.delta(1).abs(),
            lattice.delta(2).abs(),
        ]
    }

    pub fn missing_value(&self) -> f32 {
        self.missing_value
    }

    /// Set the missing sentinel; this also enables missing-data handling.
    pub fn set_missing_value(&mut self, value: f32) {
        self.missing_value = value;
        self.has_missing = true;
    }

    pub fn has_missing_data(&self) -> bool {
        self.has_missing
    }

    pub fn interpolation_order(&self) -> InterpolationOrder {
        self.interpolation
    }

    pub fn set_interpolation_order(&mut self, order: impl Into<InterpolationOrder>) {
        self.interpolation = order.into();
    }

    pub fn periodic(&self) -> [bool; 3] {
        self.periodic
    }

    pub fn set_periodic(&mut self, periodic: [bool; 3]) {
        self.periodic = periodic;
    }
}

impl<'a, B: AsRef<[f32]>> IntoIterator for &'a RegularGrid<B> {
    type Item = f32;
    type IntoIter = Iter<'a, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<B> std::fmt::Display for RegularGrid<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dims = self.dimensions();
        let min = self.layout.min();
        let max = self.layout.max();
        let e = self.extents;
        let bs = self.layout.block_size();
        let p = self.periodic;
        writeln!(f, "RegularGrid")?;
        writeln!(f, " Dimensions {} {} {}", dims[0], dims[1], dims[2])?;
        writeln!(f, " Min voxel offset {} {} {}", min[0], min[1], min[2])?;
        writeln!(f, " Max voxel offset {} {} {}", max[0], max[1], max[2])?;
        writeln!(f, " Min coord {} {} {}", e.min[0], e.min[1], e.min[2])?;
        writeln!(f, " Max coord {} {} {}", e.max[0], e.max[1], e.max[2])?;
        writeln!(f, " Block size {} {} {}", bs[0], bs[1], bs[2])?;
        writeln!(f, " Periodicity {} {} {}", p[0], p[1], p[2])?;
        writeln!(f, " Missing value {}", self.missing_value)?;
        writeln!(f, " Interpolation order {}", self.interpolation.order())
    }
}

/// Signed point spacing per axis. Degenerate axes keep `fallback` so a grid
/// reshaped down to one point can grow back.
fn axis_spacing(extents: Extents, dims: [usize; 3], fallback: [f64; 3]) -> [f64; 3] {
    let lattice = Lattice::new(extents, dims, [false; 3]);
    let mut spacing = fallback;
    for axis in 0..3 {
        if dims[axis] > 1 {
            spacing[axis] = lattice.delta(axis);
        }
    }
    spacing
}
