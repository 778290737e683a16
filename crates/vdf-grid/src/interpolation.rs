//! Missing-aware reconstruction over a grid cell.
//!
//! Both blends take a `fetch` closure so that each grid variant can supply
//! its own corner lookup. A corner is only fetched when its weight is
//! nonzero, so a sample sitting exactly on a grid point never looks at
//! neighbors (which may be missing or past the last index).

/// Trilinear blend of the cell `lo..=hi` with fractional weights `w`.
///
/// # Arguments
/// * `fetch` - Returns the voxel at an IJK index
/// * `lo` - Lower cell corner
/// * `hi` - Upper cell corner (equal to `lo` on a clamped axis)
/// * `w` - Weight of the upper corner along each axis, in `[0, 1]`
/// * `missing` - Sentinel; `None` disables missing-data checks
///
/// # Returns
/// The blended value, or the missing value when any fetched corner is
/// missing.
pub fn trilinear<F>(
    fetch: F,
    lo: [usize; 3],
    hi: [usize; 3],
    w: [f64; 3],
    missing: Option<f32>,
) -> f32
where
    F: Fn([usize; 3]) -> f32,
{
    let mut corners = [0.0f64; 8];
    for (n, corner) in corners.iter_mut().enumerate() {
        let (di, dj, dk) = (n & 1, (n >> 1) & 1, (n >> 2) & 1);
        let weight = axis_weight(w[0], di) * axis_weight(w[1], dj) * axis_weight(w[2], dk);
        if weight == 0.0 {
            continue;
        }

        let idx = [
            if di == 1 { hi[0] } else { lo[0] },
            if dj == 1 { hi[1] } else { lo[1] },
            if dk == 1 { hi[2] } else { lo[2] },
        ];
        let v = fetch(idx);
        if let Some(mv) = missing {
            if v == mv {
                return mv;
            }
        }
        *corner = v as f64;
    }

    let [p0, p1, p2, p3, p4, p5, p6, p7] = corners;
    let [iw, jw, kw] = w;

    let b0 = p0 + iw * (p1 - p0);
    let t0 = p2 + iw * (p3 - p2);
    let c0 = b0 + jw * (t0 - b0);

    let b1 = p4 + iw * (p5 - p4);
    let t1 = p6 + iw * (p7 - p6);
    let c1 = b1 + jw * (t1 - b1);

    (c0 + kw * (c1 - c0)) as f32
}

/// Nearest corner of the cell `lo..=hi`: an axis moves to `hi` when its
/// weight exceeds 0.5.
pub fn nearest<F>(fetch: F, lo: [usize; 3], hi: [usize; 3], w: [f64; 3]) -> f32
where
    F: Fn([usize; 3]) -> f32,
{
    fetch(nearest_index(lo, hi, w))
}

pub fn nearest_index(lo: [usize; 3], hi: [usize; 3], w: [f64; 3]) -> [usize; 3] {
    let mut idx = lo;
    for axis in 0..3 {
        if w[axis] > 0.5 {
            idx[axis] = hi[axis];
        }
    }
    idx
}

fn axis_weight(w: f64, upper: usize) -> f64 {
    if upper == 1 {
        w
    } else {
        1.0 - w
    }
}
