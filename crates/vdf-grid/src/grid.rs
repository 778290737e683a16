//! Common capability set of every grid variant.

use crate::error::Result;
use crate::layered::LayeredGrid;
use crate::regular::RegularGrid;
use crate::spherical::SphericalGrid;
use crate::stretched::StretchedGrid;
use crate::types::{Extents, InterpolationOrder};

/// Operations shared by all grid variants.
///
/// The trait is object safe so heterogeneous grids can be held as
/// `Box<dyn Grid>`, which is what [`crate::GridFactory`] returns.
pub trait Grid: Send + Sync {
    /// Short variant name, e.g. `"regular"`.
    fn kind(&self) -> &'static str;

    /// Reconstructed value at a user-space point, or the missing value.
    fn value(&self, x: f64, y: f64, z: f64) -> f32;

    /// Voxel at ROI-relative `(i, j, k)`.
    fn access_ijk(&self, i: usize, j: usize, k: usize) -> Result<f32>;

    fn user_coordinates(&self, i: usize, j: usize, k: usize) -> Result<[f64; 3]>;

    /// Nearest grid index to a user-space point.
    fn ijk_index(&self, x: f64, y: f64, z: f64) -> Result<[usize; 3]>;

    /// Index of the cell corner at or below a user-space point.
    fn ijk_index_floor(&self, x: f64, y: f64, z: f64) -> Result<[usize; 3]>;

    fn inside_grid(&self, x: f64, y: f64, z: f64) -> bool;

    /// User extents of an ROI-relative index box.
    fn bounding_box(&self, min: [usize; 3], max: [usize; 3]) -> Extents;

    /// Smallest ROI-relative index box enclosing a user-space box.
    fn enclosing_region(&self, minu: [f64; 3], maxu: [f64; 3]) -> ([usize; 3], [usize; 3]);

    /// Change the region of interest to the global window `min..=max`.
    fn reshape(&mut self, min: [usize; 3], max: [usize; 3], periodic: [bool; 3]) -> Result<()>;

    /// Minimum and maximum over non-missing voxels.
    fn range(&self) -> (f32, f32);

    fn user_extents(&self) -> Extents;
    fn dimensions(&self) -> [usize; 3];
    fn ijk_origin(&self) -> [usize; 3];
    fn block_size(&self) -> [usize; 3];
    fn num_blocks(&self) -> usize;
    fn min_cell_extents(&self) -> [f64; 3];

    fn missing_value(&self) -> f32;
    fn set_missing_value(&mut self, value: f32);
    fn has_missing_data(&self) -> bool;

    fn interpolation_order(&self) -> InterpolationOrder;
    fn set_interpolation_order(&mut self, order: InterpolationOrder);

    fn periodic(&self) -> [bool; 3];
    fn set_periodic(&mut self, periodic: [bool; 3]);
}

/// Forward the operations every variant implements with the same signature.
macro_rules! forward_common {
    () => {
        fn value(&self, x: f64, y: f64, z: f64) -> f32 {
            self.value(x, y, z)
        }

        fn access_ijk(&self, i: usize, j: usize, k: usize) -> Result<f32> {
            self.access_ijk(i, j, k)
        }

        fn user_coordinates(&self, i: usize, j: usize, k: usize) -> Result<[f64; 3]> {
            self.user_coordinates(i, j, k)
        }

        fn inside_grid(&self, x: f64, y: f64, z: f64) -> bool {
            self.inside_grid(x, y, z)
        }

        fn bounding_box(&self, min: [usize; 3], max: [usize; 3]) -> Extents {
            self.bounding_box(min, max)
        }

        fn enclosing_region(&self, minu: [f64; 3], maxu: [f64; 3]) -> ([usize; 3], [usize; 3]) {
            self.enclosing_region(minu, maxu)
        }

        fn reshape(&mut self, min: [usize; 3], max: [usize; 3], periodic: [bool; 3]) -> Result<()> {
            self.reshape(min, max, periodic)
        }

        fn range(&self) -> (f32, f32) {
            self.range()
        }

        fn user_extents(&self) -> Extents {
            self.user_extents()
        }

        fn dimensions(&self) -> [usize; 3] {
            self.dimensions()
        }

        fn ijk_origin(&self) -> [usize; 3] {
            self.ijk_origin()
        }

        fn block_size(&self) -> [usize; 3] {
            self.block_size()
        }

        fn num_blocks(&self) -> usize {
            self.num_blocks()
        }

        fn min_cell_extents(&self) -> [f64; 3] {
            self.min_cell_extents()
        }

        fn missing_value(&self) -> f32 {
            self.missing_value()
        }

        fn set_missing_value(&mut self, value: f32) {
            self.set_missing_value(value)
        }

        fn has_missing_data(&self) -> bool {
            self.has_missing_data()
        }

        fn interpolation_order(&self) -> InterpolationOrder {
            self.interpolation_order()
        }

        fn set_interpolation_order(&mut self, order: InterpolationOrder) {
            self.set_interpolation_order(order)
        }

        fn periodic(&self) -> [bool; 3] {
            self.periodic()
        }

        fn set_periodic(&mut self, periodic: [bool; 3]) {
            self.set_periodic(periodic)
        }
    };
}

/// Variants whose index lookup cannot fail.
macro_rules! forward_index {
    () => {
        fn ijk_index(&self, x: f64, y: f64, z: f64) -> Result<[usize; 3]> {
            Ok(self.ijk_index(x, y, z))
        }

        fn ijk_index_floor(&self, x: f64, y: f64, z: f64) -> Result<[usize; 3]> {
            Ok(self.ijk_index_floor(x, y, z))
        }
    };
}

impl<B: AsRef<[f32]> + Send + Sync> Grid for RegularGrid<B> {
    fn kind(&self) -> &'static str {
        "regular"
    }

    forward_common!();
    forward_index!();
}

impl<B: AsRef<[f32]> + Send + Sync> Grid for LayeredGrid<B> {
    fn kind(&self) -> &'static str {
        "layered"
    }

    forward_common!();
    forward_index!();
}

impl<B: AsRef<[f32]> + Send + Sync> Grid for StretchedGrid<B> {
    fn kind(&self) -> &'static str {
        "stretched"
    }

    forward_common!();
    forward_index!();
}

impl<B: AsRef<[f32]> + Send + Sync> Grid for SphericalGrid<B> {
    fn kind(&self) -> &'static str {
        "spherical"
    }

    forward_common!();

    fn ijk_index(&self, x: f64, y: f64, z: f64) -> Result<[usize; 3]> {
        self.ijk_index(x, y, z)
    }

    fn ijk_index_floor(&self, x: f64, y: f64, z: f64) -> Result<[usize; 3]> {
        self.ijk_index_floor(x, y, z)
    }
}
