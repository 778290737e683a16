//! Common test fixtures for grid tests.
//!
//! Extents are given in the six-element form used by grids:
//! `[minx, miny, minz, maxx, maxy, maxz]`.

/// Common user-coordinate extents.
pub mod extents {
    /// Unit spacing over a 3x3x3 grid.
    pub const CUBE_3: [f64; 6] = [0.0, 0.0, 0.0, 2.0, 2.0, 2.0];

    /// Unit cube.
    pub const UNIT: [f64; 6] = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

    /// Y axis runs from north to south.
    pub const FLIPPED_Y: [f64; 6] = [0.0, 90.0, 0.0, 10.0, -90.0, 5.0];

    /// Flat in Z (a single layer).
    pub const FLAT_Z: [f64; 6] = [0.0, 0.0, 3.0, 4.0, 4.0, 3.0];

    /// Whole-globe longitude/latitude in degrees with a thin shell radius.
    pub const GLOBE_DEGREES: [f64; 6] = [0.0, -90.0, 6371.0, 360.0, 90.0, 6471.0];

    /// Regional longitude/latitude box in degrees.
    pub const REGION_DEGREES: [f64; 6] = [10.0, 20.0, 1.0, 40.0, 50.0, 2.0];
}

/// Common region definitions `(bs, min, max)` for testing.
pub mod regions {
    /// A 3x3x3 region stored in a single block.
    pub const SINGLE_BLOCK_3: ([usize; 3], [usize; 3], [usize; 3]) =
        ([3, 3, 3], [0, 0, 0], [2, 2, 2]);

    /// A 6x5x4 region that starts mid-block and spans several blocks.
    pub const UNALIGNED: ([usize; 3], [usize; 3], [usize; 3]) =
        ([4, 4, 2], [3, 2, 1], [8, 6, 4]);

    /// A 10x1x1 line of single-voxel-deep blocks.
    pub const LINE: ([usize; 3], [usize; 3], [usize; 3]) = ([4, 1, 1], [0, 0, 0], [9, 0, 0]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extents_well_formed() {
        for e in [extents::CUBE_3, extents::UNIT, extents::FLAT_Z] {
            for axis in 0..3 {
                assert!(e[axis] <= e[axis + 3]);
            }
        }
        assert!(extents::FLIPPED_Y[1] > extents::FLIPPED_Y[4]);
    }

    #[test]
    fn test_regions_well_formed() {
        for (bs, min, max) in [regions::SINGLE_BLOCK_3, regions::UNALIGNED, regions::LINE] {
            for axis in 0..3 {
                assert!(bs[axis] > 0);
                assert!(min[axis] <= max[axis]);
            }
        }
    }
}
