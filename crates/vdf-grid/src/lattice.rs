//! Uniform-axis coordinate math shared by every grid variant.

use crate::types::Extents;

/// A uniformly spaced lattice spanning `extents` with `dims` points per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    extents: Extents,
    dims: [usize; 3],
    periodic: [bool; 3],
}

impl Lattice {
    pub fn new(extents: Extents, dims: [usize; 3], periodic: [bool; 3]) -> Self {
        Self {
            extents,
            dims,
            periodic,
        }
    }

    pub fn extents(&self) -> Extents {
        self.extents
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Signed spacing between adjacent points; 0 on a degenerate axis.
    pub fn delta(&self, axis: usize) -> f64 {
        if self.dims[axis] <= 1 {
            return 0.0;
        }
        self.extents.span(axis) / (self.dims[axis] - 1) as f64
    }

    /// User coordinate of index `i` along `axis`.
    pub fn coordinate(&self, axis: usize, i: usize) -> f64 {
        self.extents.min[axis] + i as f64 * self.delta(axis)
    }

    /// User coordinates of an IJK index.
    pub fn point(&self, idx: [usize; 3]) -> [f64; 3] {
        [
            self.coordinate(0, idx[0]),
            self.coordinate(1, idx[1]),
            self.coordinate(2, idx[2]),
        ]
    }

    /// Wrap periodic axes into the extents and pin degenerate axes to their
    /// only coordinate.
    pub fn wrap(&self, p: [f64; 3]) -> [f64; 3] {
        let mut q = p;
        for axis in 0..3 {
            q[axis] = self.wrap_axis(axis, p[axis]);
        }
        q
    }

    /// Values above the axis land in `(lo, hi]`, values below in `[lo, hi)`,
    /// so whole periods past either end hit that end's sample.
    fn wrap_axis(&self, axis: usize, v: f64) -> f64 {
        if self.dims[axis] <= 1 {
            return self.extents.min[axis];
        }

        let (lo, hi) = self.extents.bounds(axis);
        let period = hi - lo;
        if !self.periodic[axis] || period == 0.0 || (v >= lo && v <= hi) {
            return v;
        }
        if v > hi {
            let r = (v - hi).rem_euclid(period);
            return if r == 0.0 { hi } else { lo + r };
        }
        lo + (v - lo).rem_euclid(period)
    }

    pub fn contains_axis(&self, axis: usize, v: f64) -> bool {
        self.extents.contains_axis(axis, v)
    }

    pub fn contains(&self, p: [f64; 3]) -> bool {
        self.extents.contains(p)
    }

    /// Clamp a coordinate into the extents along `axis`.
    pub fn clamp_axis(&self, axis: usize, v: f64) -> f64 {
        let (lo, hi) = self.extents.bounds(axis);
        v.clamp(lo, hi)
    }

    /// Locate the cell containing `v` along `axis`.
    ///
    /// # Returns
    /// `(lower index, weight of the upper point)`. The index is clamped to
    /// the axis and the weight is 0 at the last point or on a degenerate axis.
    pub fn cell(&self, axis: usize, v: f64) -> (usize, f64) {
        let delta = self.delta(axis);
        if delta == 0.0 {
            return (0, 0.0);
        }

        let t = (v - self.extents.min[axis]) / delta;
        if !t.is_finite() {
            return (0, 0.0);
        }

        let last = self.dims[axis] - 1;
        let i = (t.floor().max(0.0) as usize).min(last);
        if i == last {
            return (last, 0.0);
        }
        (i, (t - i as f64).clamp(0.0, 1.0))
    }

    /// Smallest index range along `axis` whose coordinates cover `a..b`.
    pub fn enclosing(&self, axis: usize, a: f64, b: f64) -> (usize, usize) {
        let delta = self.delta(axis);
        let last = self.dims[axis] - 1;
        if delta == 0.0 {
            return (0, last);
        }

        let ta = (a - self.extents.min[axis]) / delta;
        let tb = (b - self.extents.min[axis]) / delta;
        let lo = ta.min(tb).floor().max(0.0) as usize;
        let hi = ta.max(tb).ceil().max(0.0) as usize;
        (lo.min(last), hi.min(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    fn unit_lattice(periodic: [bool; 3]) -> Lattice {
        Lattice::new(
            Extents::new([0.0, 0.0, 0.0], [2.0, 4.0, 0.0]),
            [3, 5, 1],
            periodic,
        )
    }

    #[test]
    fn test_delta_and_coordinate() {
        let lat = unit_lattice([false; 3]);
        assert_approx_eq!(lat.delta(0), 1.0, 1e-12);
        assert_approx_eq!(lat.delta(1), 1.0, 1e-12);
        assert_eq!(lat.delta(2), 0.0);
        assert_approx_eq!(lat.coordinate(1, 3), 3.0, 1e-12);
    }

    #[test]
    fn test_decreasing_axis() {
        let lat = Lattice::new(
            Extents::new([10.0, 0.0, 0.0], [0.0, 1.0, 1.0]),
            [11, 2, 2],
            [false; 3],
        );
        assert_approx_eq!(lat.delta(0), -1.0, 1e-12);
        assert_approx_eq!(lat.coordinate(0, 4), 6.0, 1e-12);
        let (i, w) = lat.cell(0, 6.25);
        assert_eq!(i, 3);
        assert_approx_eq!(w, 0.75, 1e-12);
    }

    #[test]
    fn test_cell_clamps_and_zero_weight_at_last() {
        let lat = unit_lattice([false; 3]);
        assert_eq!(lat.cell(0, 2.0), (2, 0.0));
        assert_eq!(lat.cell(0, 5.0), (2, 0.0));
        assert_eq!(lat.cell(0, -1.0), (0, 0.0));
        let (i, w) = lat.cell(0, 1.25);
        assert_eq!(i, 1);
        assert_approx_eq!(w, 0.25, 1e-12);
    }

    #[test]
    fn test_wrap_periodic() {
        let lat = unit_lattice([true, false, false]);
        let p = lat.wrap([2.5, 1.0, 7.0]);
        assert_approx_eq!(p[0], 0.5, 1e-12);
        assert_approx_eq!(p[1], 1.0, 1e-12);
        // Degenerate axis is pinned.
        assert_eq!(p[2], 0.0);

        let q = lat.wrap([-0.5, 1.0, 0.0]);
        assert_approx_eq!(q[0], 1.5, 1e-12);
    }

    #[test]
    fn test_wrap_whole_periods_hit_the_near_end() {
        let lat = unit_lattice([true, false, false]);
        assert_eq!(lat.wrap([4.0, 0.0, 0.0])[0], 2.0);
        assert_eq!(lat.wrap([6.0, 0.0, 0.0])[0], 2.0);
        assert_eq!(lat.wrap([-2.0, 0.0, 0.0])[0], 0.0);
        assert_eq!(lat.wrap([-4.0, 0.0, 0.0])[0], 0.0);
        // Inside values pass through untouched.
        assert_eq!(lat.wrap([2.0, 0.0, 0.0])[0], 2.0);
    }

    #[test]
    fn test_wrap_non_periodic_untouched() {
        let lat = unit_lattice([false; 3]);
        assert_eq!(lat.wrap([3.0, 5.0, 0.0])[0], 3.0);
    }

    #[test]
    fn test_enclosing() {
        let lat = unit_lattice([false; 3]);
        assert_eq!(lat.enclosing(1, 0.5, 2.5), (0, 3));
        assert_eq!(lat.enclosing(1, 2.5, 0.5), (0, 3));
        assert_eq!(lat.enclosing(1, -3.0, 10.0), (0, 4));
        assert_eq!(lat.enclosing(2, 0.0, 0.0), (0, 0));
    }
}
