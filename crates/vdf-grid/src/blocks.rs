//! Block decomposition of a voxel region.
//!
//! A grid's voxels live in caller-owned blocks of `bs[0] * bs[1] * bs[2]`
//! values. Blocks are ordered X-fastest, then Y, then Z, and voxels inside a
//! block are I-fastest. The region of interest (ROI) is an inclusive range
//! of global voxel indices that need not start or end on a block boundary.

use crate::error::{GridError, Result};

/// Maps ROI-relative IJK indices onto (block, offset) pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    bs: [usize; 3],
    bdims: [usize; 3],
    min: [usize; 3],
    max: [usize; 3],
}

/// Number of blocks per axis needed to hold `min..=max`.
pub fn block_dims(bs: [usize; 3], min: [usize; 3], max: [usize; 3]) -> [usize; 3] {
    let mut bdims = [0; 3];
    for axis in 0..3 {
        bdims[axis] = max[axis] / bs[axis] - min[axis] / bs[axis] + 1;
    }
    bdims
}

impl BlockLayout {
    /// Create a layout for the global voxel range `min..=max`.
    ///
    /// A zero block size on any axis is treated as 1.
    pub fn new(bs: [usize; 3], min: [usize; 3], max: [usize; 3]) -> Result<Self> {
        if (0..3).any(|axis| min[axis] > max[axis]) {
            return Err(GridError::InvalidRegion { min, max });
        }

        let bs = bs.map(|b| b.max(1));
        Ok(Self {
            bs,
            bdims: block_dims(bs, min, max),
            min,
            max,
        })
    }

    /// Voxels per block along each axis.
    pub fn block_size(&self) -> [usize; 3] {
        self.bs
    }

    /// Blocks per axis.
    pub fn block_dims(&self) -> [usize; 3] {
        self.bdims
    }

    /// Total number of blocks.
    pub fn num_blocks(&self) -> usize {
        self.bdims.iter().product()
    }

    /// Number of values in one full block.
    pub fn block_len(&self) -> usize {
        self.bs.iter().product()
    }

    /// Global index of the first ROI voxel.
    pub fn min(&self) -> [usize; 3] {
        self.min
    }

    /// Global index of the last ROI voxel.
    pub fn max(&self) -> [usize; 3] {
        self.max
    }

    /// ROI dimensions.
    pub fn dims(&self) -> [usize; 3] {
        [
            self.max[0] - self.min[0] + 1,
            self.max[1] - self.min[1] + 1,
            self.max[2] - self.min[2] + 1,
        ]
    }

    /// Offset of the first ROI voxel inside its block.
    fn origin(&self) -> [usize; 3] {
        [
            self.min[0] % self.bs[0],
            self.min[1] % self.bs[1],
            self.min[2] % self.bs[2],
        ]
    }

    /// True when `(i, j, k)` lies inside the ROI.
    pub fn contains(&self, i: usize, j: usize, k: usize) -> bool {
        let dims = self.dims();
        i < dims[0] && j < dims[1] && k < dims[2]
    }

    /// Locate an ROI-relative voxel.
    ///
    /// # Returns
    /// `(block index, offset within block)`, or an `OutOfBounds` error.
    pub fn locate(&self, i: usize, j: usize, k: usize) -> Result<(usize, usize)> {
        if !self.contains(i, j, k) {
            return Err(GridError::out_of_bounds(i, j, k, self.dims()));
        }

        let o = self.origin();
        let (x, y, z) = (i + o[0], j + o[1], k + o[2]);
        let [bs0, bs1, bs2] = self.bs;
        let (xb, yb, zb) = (x / bs0, y / bs1, z / bs2);
        let block = zb * self.bdims[0] * self.bdims[1] + yb * self.bdims[0] + xb;
        let offset = (z % bs2) * bs0 * bs1 + (y % bs1) * bs0 + (x % bs0);
        Ok((block, offset))
    }

    /// Locate the contiguous run of voxels starting at `(i, j, k)` that stays
    /// inside one block row and inside the ROI row.
    ///
    /// # Returns
    /// `(block index, offset within block, run length)`.
    pub fn row_run(&self, i: usize, j: usize, k: usize) -> Result<(usize, usize, usize)> {
        let (block, offset) = self.locate(i, j, k)?;
        let x = (i + self.origin()[0]) % self.bs[0];
        let len = (self.bs[0] - x).min(self.dims()[0] - i);
        Ok((block, offset, len))
    }

    /// Check that `blocks` matches this layout.
    pub fn validate_blocks<B: AsRef<[f32]>>(&self, blocks: &[B]) -> Result<()> {
        let expected = self.num_blocks();
        if blocks.len() != expected {
            return Err(GridError::BlockCount {
                expected,
                actual: blocks.len(),
            });
        }

        let block_len = self.block_len();
        for (index, block) in blocks.iter().enumerate() {
            let actual = block.as_ref().len();
            if actual < block_len {
                return Err(GridError::BlockSize {
                    index,
                    expected: block_len,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Build the layout for a new window without changing block storage.
    ///
    /// The new window may shift or grow past the current one as long as it
    /// needs exactly the same number of blocks per axis. `self` is left
    /// untouched on error.
    pub fn reshaped(&self, min: [usize; 3], max: [usize; 3]) -> Result<Self> {
        if (0..3).any(|axis| min[axis] > max[axis]) {
            return Err(GridError::InvalidRegion { min, max });
        }

        let required = block_dims(self.bs, min, max);
        if required != self.bdims {
            return Err(GridError::BlockCountMismatch {
                min,
                max,
                required,
                allocated: self.bdims,
            });
        }

        Ok(Self {
            bs: self.bs,
            bdims: self.bdims,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_block_size_treated_as_one() {
        let layout = BlockLayout::new([0, 4, 4], [0, 0, 0], [2, 3, 3]).unwrap();
        assert_eq!(layout.block_size(), [1, 4, 4]);
        assert_eq!(layout.block_dims(), [3, 1, 1]);
    }

    #[test]
    fn test_min_greater_than_max_rejected() {
        let err = BlockLayout::new([4, 4, 4], [2, 0, 0], [1, 3, 3]).unwrap_err();
        assert!(matches!(err, GridError::InvalidRegion { .. }));
    }

    #[test]
    fn test_unaligned_roi_block_dims() {
        // Global range 3..=8 with block size 4 touches blocks 0, 1 and 2.
        let layout = BlockLayout::new([4, 4, 4], [3, 0, 0], [8, 3, 3]).unwrap();
        assert_eq!(layout.block_dims(), [3, 1, 1]);
        assert_eq!(layout.dims(), [6, 4, 4]);
    }

    #[test]
    fn test_locate_unaligned() {
        let layout = BlockLayout::new([4, 4, 4], [3, 1, 0], [8, 6, 3]).unwrap();
        // ROI (0,0,0) is global (3,1,0): block 0, offset 1*4 + 3.
        assert_eq!(layout.locate(0, 0, 0).unwrap(), (0, 7));
        // ROI (1,0,0) is global (4,1,0): block 1, offset 4.
        assert_eq!(layout.locate(1, 0, 0).unwrap(), (1, 4));
        // ROI (0,3,0) is global (3,4,0): block row 1, so block 3.
        assert_eq!(layout.locate(0, 3, 0).unwrap(), (3, 3));
    }

    #[test]
    fn test_locate_out_of_bounds() {
        let layout = BlockLayout::new([2, 2, 2], [0, 0, 0], [2, 2, 2]).unwrap();
        assert!(matches!(
            layout.locate(3, 0, 0),
            Err(GridError::OutOfBounds { i: 3, .. })
        ));
    }

    #[test]
    fn test_row_run_stops_at_block_and_roi_edges() {
        let layout = BlockLayout::new([4, 1, 1], [3, 0, 0], [8, 0, 0]).unwrap();
        assert_eq!(layout.row_run(0, 0, 0).unwrap(), (0, 3, 1));
        assert_eq!(layout.row_run(1, 0, 0).unwrap(), (1, 0, 4));
        assert_eq!(layout.row_run(5, 0, 0).unwrap(), (2, 0, 1));
    }

    #[test]
    fn test_validate_blocks() {
        let layout = BlockLayout::new([2, 2, 2], [0, 0, 0], [3, 1, 1]).unwrap();
        let good = vec![vec![0.0f32; 8]; 2];
        assert!(layout.validate_blocks(&good).is_ok());

        let too_few = vec![vec![0.0f32; 8]; 1];
        assert!(matches!(
            layout.validate_blocks(&too_few),
            Err(GridError::BlockCount { expected: 2, actual: 1 })
        ));

        let short = vec![vec![0.0f32; 8], vec![0.0f32; 7]];
        assert!(matches!(
            layout.validate_blocks(&short),
            Err(GridError::BlockSize { index: 1, .. })
        ));
    }

    #[test]
    fn test_reshaped_rules() {
        let layout = BlockLayout::new([4, 4, 4], [0, 0, 0], [7, 7, 3]).unwrap();

        let sub = layout.reshaped([1, 2, 0], [6, 5, 3]).unwrap();
        assert_eq!(sub.dims(), [6, 4, 4]);
        assert_eq!(sub.block_dims(), layout.block_dims());

        assert!(matches!(
            layout.reshaped([0, 0, 0], [3, 7, 3]),
            Err(GridError::BlockCountMismatch { .. })
        ));
        assert!(matches!(
            layout.reshaped([0, 0, 0], [8, 7, 3]),
            Err(GridError::BlockCountMismatch { .. })
        ));
        assert!(matches!(
            layout.reshaped([3, 0, 0], [2, 7, 3]),
            Err(GridError::InvalidRegion { .. })
        ));
    }

    #[test]
    fn test_reshaped_may_shift_past_current_window() {
        let layout = BlockLayout::new([8, 1, 1], [0, 0, 0], [5, 0, 0]).unwrap();

        let shifted = layout.reshaped([2, 0, 0], [7, 0, 0]).unwrap();
        assert_eq!(shifted.min(), [2, 0, 0]);
        assert_eq!(shifted.dims(), [6, 1, 1]);

        // Shrink, then grow back out to the full block.
        let inner = layout.reshaped([1, 0, 0], [4, 0, 0]).unwrap();
        let regrown = inner.reshaped([0, 0, 0], [7, 0, 0]).unwrap();
        assert_eq!(regrown.dims(), [8, 1, 1]);
        assert_eq!(regrown.block_dims(), [1, 1, 1]);
    }
}
