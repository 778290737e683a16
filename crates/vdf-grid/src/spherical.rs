//! Grids on a spherical shell.
//!
//! Grid indices map to (longitude, latitude, radius) through an axis
//! permutation. Longitude and latitude extents are in degrees. User
//! coordinates are Cartesian, projected onto the outer radius of the shell.

use std::f64::consts::TAU;

use crate::error::{GridError, Result};
use crate::regular::RegularGrid;
use crate::types::{Extents, InterpolationOrder};

const LON: usize = 0;
const LAT: usize = 1;

/// Angular tolerance for the inverse shell map, in radians.
const ANGLE_EPSILON: f64 = 1e-9;

/// A grid over longitude, latitude and radius.
#[derive(Debug, Clone)]
pub struct SphericalGrid<B> {
    base: RegularGrid<B>,
    permutation: [usize; 3],
    cartesian: Extents,
}

/// Shell parameters in (lon, lat, radius) order.
#[derive(Debug, Clone, Copy)]
struct Shell {
    lon0: f64,
    lat0: f64,
    lon1: f64,
    lat1: f64,
    d_lon: f64,
    d_lat: f64,
    r1: f64,
    dims: [usize; 3],
}

impl Shell {
    fn point(&self, i_lon: usize, j_lat: usize) -> [f64; 3] {
        let phi = self.lon0 + i_lon as f64 * self.d_lon;
        let theta = self.lat0 + j_lat as f64 * self.d_lat;
        [
            self.r1 * phi.cos() * theta.sin(),
            self.r1 * phi.sin() * theta.sin(),
            self.r1 * theta.sin(),
        ]
    }

    /// Cartesian box over the (lon, lat) samples in `lon` x `lat`.
    fn cartesian_box(&self, lon: (usize, usize), lat: (usize, usize)) -> Extents {
        let mut e = Extents::new([f64::INFINITY; 3], [f64::NEG_INFINITY; 3]);
        for j in lat.0..=lat.1 {
            for i in lon.0..=lon.1 {
                let p = self.point(i, j);
                for axis in 0..3 {
                    e.min[axis] = e.min[axis].min(p[axis]);
                    e.max[axis] = e.max[axis].max(p[axis]);
                }
            }
        }
        e
    }
}

/// Reorder IJK-ordered values into (lon, lat, radius) slots.
fn permute<T: Copy + Default>(permutation: [usize; 3], values: [T; 3]) -> [T; 3] {
    let mut result = [T::default(); 3];
    for axis in 0..3 {
        result[permutation[axis]] = values[axis];
    }
    result
}

impl<B: AsRef<[f32]>> SphericalGrid<B> {
    /// Create a spherical grid.
    ///
    /// # Arguments
    /// * `extents` - Spherical extents in IJK order (degrees for lon/lat)
    /// * `permutation` - `permutation[axis]` is the slot of IJK axis `axis`:
    ///   0 for longitude, 1 for latitude, 2 for radius
    pub fn new(
        bs: [usize; 3],
        min: [usize; 3],
        max: [usize; 3],
        extents: Extents,
        permutation: [usize; 3],
        periodic: [bool; 3],
        blocks: Vec<B>,
    ) -> Result<Self> {
        let mut sorted = permutation;
        sorted.sort_unstable();
        if sorted != [0, 1, 2] {
            return Err(GridError::invalid_spec(format!(
                "permutation {:?} is not a permutation of [0, 1, 2]",
                permutation
            )));
        }

        let base = RegularGrid::new(bs, min, max, extents, periodic, blocks)?;
        let mut grid = Self {
            base,
            permutation,
            cartesian: extents,
        };
        grid.cartesian = grid.full_cartesian_box();
        Ok(grid)
    }

    /// Create a spherical grid whose voxels may hold `missing_value`.
    #[allow(clippy::too_many_arguments)]
    pub fn with_missing(
        bs: [usize; 3],
        min: [usize; 3],
        max: [usize; 3],
        extents: Extents,
        permutation: [usize; 3],
        periodic: [bool; 3],
        blocks: Vec<B>,
        missing_value: f32,
    ) -> Result<Self> {
        let mut grid = Self::new(bs, min, max, extents, permutation, periodic, blocks)?;
        grid.base.set_missing_value(missing_value);
        Ok(grid)
    }

    pub fn access_ijk(&self, i: usize, j: usize, k: usize) -> Result<f32> {
        self.base.access_ijk(i, j, k)
    }

    /// Reconstruction is not available on spherical grids; always returns
    /// the missing value.
    pub fn value(&self, x: f64, y: f64, z: f64) -> f32 {
        if self.inside_grid(x, y, z) {
            tracing::warn!(x, y, z, "Spherical grid value reconstruction not implemented");
        }
        self.base.missing_value()
    }

    /// Cartesian coordinates of `(i, j, k)` on the outer shell.
    pub fn user_coordinates(&self, i: usize, j: usize, k: usize) -> Result<[f64; 3]> {
        self.base.check_index(i, j, k)?;
        let ijk = permute(self.permutation, [i, j, k]);
        Ok(self.shell().point(ijk[LON], ijk[LAT]))
    }

    pub fn ijk_index(&self, _x: f64, _y: f64, _z: f64) -> Result<[usize; 3]> {
        Err(GridError::unsupported("spherical", "ijk_index"))
    }

    pub fn ijk_index_floor(&self, _x: f64, _y: f64, _z: f64) -> Result<[usize; 3]> {
        Err(GridError::unsupported("spherical", "ijk_index_floor"))
    }

    /// True when a Cartesian point maps back into the grid's longitude and
    /// latitude ranges.
    ///
    /// Points are compared against the outer shell only, so the radius is
    /// not checked.
    pub fn inside_grid(&self, x: f64, y: f64, z: f64) -> bool {
        if !self.cartesian.contains([x, y, z]) {
            return false;
        }

        let periodic = permute(self.permutation, self.base.periodic());
        if periodic[LON] || periodic[LAT] {
            return true;
        }

        let shell = self.shell();
        if shell.r1 == 0.0 {
            return false;
        }

        let sin_theta = (z / shell.r1).clamp(-1.0, 1.0);
        let theta = sin_theta.asin();
        let (lat_lo, lat_hi) = ordered(shell.lat0, shell.lat1);
        if theta < lat_lo - ANGLE_EPSILON || theta > lat_hi + ANGLE_EPSILON {
            return false;
        }

        // Longitude is undefined where sin(theta) vanishes.
        if sin_theta.abs() < ANGLE_EPSILON {
            return true;
        }

        let mut phi = if sin_theta > 0.0 {
            y.atan2(x)
        } else {
            (-y).atan2(-x)
        };
        let (lon_lo, lon_hi) = ordered(shell.lon0, shell.lon1);
        if phi < lon_lo - ANGLE_EPSILON {
            phi += TAU;
        }
        phi >= lon_lo - ANGLE_EPSILON && phi <= lon_hi + ANGLE_EPSILON
    }

    /// Cartesian box over the (lon, lat) samples of the index box.
    pub fn bounding_box(&self, min: [usize; 3], max: [usize; 3]) -> Extents {
        let min_p = permute(self.permutation, min);
        let max_p = permute(self.permutation, max);
        self.shell()
            .cartesian_box((min_p[LON], max_p[LON]), (min_p[LAT], max_p[LAT]))
    }

    /// The whole grid; spherical grids cannot locate a sub-region.
    pub fn enclosing_region(&self, _minu: [f64; 3], _maxu: [f64; 3]) -> ([usize; 3], [usize; 3]) {
        let dims = self.dimensions();
        ([0, 0, 0], [dims[0] - 1, dims[1] - 1, dims[2] - 1])
    }

    pub fn range(&self) -> (f32, f32) {
        self.base.range()
    }

    /// Change the region of interest and refresh the Cartesian extents.
    pub fn reshape(&mut self, min: [usize; 3], max: [usize; 3], periodic: [bool; 3]) -> Result<()> {
        self.base.reshape(min, max, periodic)?;
        self.cartesian = self.full_cartesian_box();
        Ok(())
    }

    fn full_cartesian_box(&self) -> Extents {
        let shell = self.shell();
        let last = |n: usize| n.saturating_sub(1);
        shell.cartesian_box((0, last(shell.dims[LON])), (0, last(shell.dims[LAT])))
    }
}

impl<B> SphericalGrid<B> {
    fn shell(&self) -> Shell {
        let e = self.base.user_extents();
        let start = permute(self.permutation, e.min);
        let end = permute(self.permutation, e.max);
        let dims = permute(self.permutation, self.base.dimensions());

        let lon0 = start[LON].to_radians();
        let lat0 = start[LAT].to_radians();
        let lon1 = end[LON].to_radians();
        let lat1 = end[LAT].to_radians();
        Shell {
            lon0,
            lat0,
            lon1,
            lat1,
            d_lon: (lon1 - lon0) / dims[LON] as f64,
            d_lat: (lat1 - lat0) / dims[LAT] as f64,
            r1: end[2],
            dims,
        }
    }

    pub fn permutation(&self) -> [usize; 3] {
        self.permutation
    }

    /// Spherical extents as supplied, in IJK order.
    pub fn spherical_extents(&self) -> Extents {
        self.base.user_extents()
    }

    /// Cached Cartesian bounding box of the shell samples.
    pub fn user_extents(&self) -> Extents {
        self.cartesian
    }

    pub fn dimensions(&self) -> [usize; 3] {
        self.base.dimensions()
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

    /// Grid spacing in spherical units (degrees, radius).
    pub fn min_cell_extents(&self) -> [f64; 3] {
        self.base.min_cell_extents()
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

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
