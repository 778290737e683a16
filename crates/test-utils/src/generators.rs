//! Test data generators for block-decomposed fields.
//!
//! These generators create predictable, verifiable voxel patterns laid out
//! the way grids expect them: blocks ordered X-fastest, then Y, then Z, with
//! voxels inside a block I-fastest.

/// Value pattern that encodes its own index: `i + 10*j + 100*k`.
///
/// # Example
///
/// ```
/// use test_utils::ijk_pattern;
///
/// assert_eq!(ijk_pattern(1, 2, 3), 321.0);
/// ```
pub fn ijk_pattern(i: usize, j: usize, k: usize) -> f32 {
    (i + 10 * j + 100 * k) as f32
}

/// Number of blocks per axis needed to hold the global range `min..=max`.
pub fn blocks_per_axis(bs: [usize; 3], min: [usize; 3], max: [usize; 3]) -> [usize; 3] {
    let mut bdims = [0; 3];
    for axis in 0..3 {
        bdims[axis] = max[axis] / bs[axis] - min[axis] / bs[axis] + 1;
    }
    bdims
}

/// Creates block storage for the global voxel range `min..=max`.
///
/// `f` receives ROI-relative indices (0-based from `min`). Voxels that fall
/// inside a block but outside the ROI are filled with NaN so that any read
/// of padding shows up in assertions.
///
/// # Arguments
///
/// * `bs` - Block size (no zero entries)
/// * `min` - Global index of the first ROI voxel
/// * `max` - Global index of the last ROI voxel
/// * `f` - Value generator
///
/// # Returns
///
/// One `Vec<f32>` per block, each holding `bs[0] * bs[1] * bs[2]` values.
pub fn blocked_field<F>(bs: [usize; 3], min: [usize; 3], max: [usize; 3], f: F) -> Vec<Vec<f32>>
where
    F: Fn(usize, usize, usize) -> f32,
{
    let bdims = blocks_per_axis(bs, min, max);
    let first = [min[0] / bs[0], min[1] / bs[1], min[2] / bs[2]];
    let block_len = bs[0] * bs[1] * bs[2];

    let mut blocks = Vec::with_capacity(bdims[0] * bdims[1] * bdims[2]);
    for zb in 0..bdims[2] {
        for yb in 0..bdims[1] {
            for xb in 0..bdims[0] {
                let mut block = Vec::with_capacity(block_len);
                for z in 0..bs[2] {
                    for y in 0..bs[1] {
                        for x in 0..bs[0] {
                            let g = [
                                (first[0] + xb) * bs[0] + x,
                                (first[1] + yb) * bs[1] + y,
                                (first[2] + zb) * bs[2] + z,
                            ];
                            let inside = (0..3).all(|a| g[a] >= min[a] && g[a] <= max[a]);
                            if inside {
                                block.push(f(g[0] - min[0], g[1] - min[1], g[2] - min[2]));
                            } else {
                                block.push(f32::NAN);
                            }
                        }
                    }
                }
                blocks.push(block);
            }
        }
    }
    blocks
}

/// Evaluates `f` over `dims` in I-fastest order.
///
/// Matches the order in which a grid iterator walks its region.
pub fn roi_values<F>(dims: [usize; 3], f: F) -> Vec<f32>
where
    F: Fn(usize, usize, usize) -> f32,
{
    let mut values = Vec::with_capacity(dims[0] * dims[1] * dims[2]);
    for k in 0..dims[2] {
        for j in 0..dims[1] {
            for i in 0..dims[0] {
                values.push(f(i, j, k));
            }
        }
    }
    values
}

/// Creates a terrain-following height generator.
///
/// Layer `k` sits `k * spacing` above a surface that rises by `slope`
/// per unit of `i` and `j`, starting at `base`.
///
/// # Example
///
/// ```
/// use test_utils::terrain_heights;
///
/// let h = terrain_heights(100.0, 10.0, 50.0);
/// assert_eq!(h(0, 0, 0), 100.0);
/// assert_eq!(h(1, 2, 3), 100.0 + 30.0 + 150.0);
/// ```
pub fn terrain_heights(base: f32, slope: f32, spacing: f32) -> impl Fn(usize, usize, usize) -> f32 {
    move |i, j, k| base + slope * (i + j) as f32 + spacing * k as f32
}
