//! Core types shared by every grid variant.

use serde::{Deserialize, Serialize};

/// A user-coordinate box given by the coordinates of the first and last
/// grid points.
///
/// `min` holds the coordinate of the grid point with the smallest index and
/// `max` the coordinate of the point with the largest index. An axis may run
/// "backwards" (`min[axis] > max[axis]`) when coordinates decrease with index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extents {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Extents {
    /// Create extents from the first and last grid point coordinates.
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    /// Create extents from a six-element `[minx, miny, minz, maxx, maxy, maxz]` array.
    pub fn from_array(e: [f64; 6]) -> Self {
        Self {
            min: [e[0], e[1], e[2]],
            max: [e[3], e[4], e[5]],
        }
    }

    /// Return the six-element array form.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.min[0],
            self.min[1],
            self.min[2],
            self.max[0],
            self.max[1],
            self.max[2],
        ]
    }

    /// Lower and upper bound along an axis, regardless of orientation.
    pub fn bounds(&self, axis: usize) -> (f64, f64) {
        let (a, b) = (self.min[axis], self.max[axis]);
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Signed length along an axis.
    pub fn span(&self, axis: usize) -> f64 {
        self.max[axis] - self.min[axis]
    }

    /// True when coordinates increase (or stay constant) with index along `axis`.
    pub fn is_increasing(&self, axis: usize) -> bool {
        self.min[axis] <= self.max[axis]
    }

    /// Check if a point lies inside the box on every axis.
    pub fn contains(&self, p: [f64; 3]) -> bool {
        (0..3).all(|axis| self.contains_axis(axis, p[axis]))
    }

    /// Check if a coordinate lies inside the box along one axis.
    pub fn contains_axis(&self, axis: usize, v: f64) -> bool {
        let (lo, hi) = self.bounds(axis);
        v >= lo && v <= hi
    }
}

/// Reconstruction method used by `value()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationOrder {
    /// Nearest grid point (order 0).
    Nearest,
    /// Trilinear blend of the cell corners (order 1).
    #[default]
    Linear,
}

impl InterpolationOrder {
    /// Numeric order: 0 for nearest neighbor, 1 for linear.
    pub fn order(&self) -> i32 {
        match self {
            Self::Nearest => 0,
            Self::Linear => 1,
        }
    }

    /// Parse from string (case-insensitive). Unknown values become `Linear`.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "0" | "nearest" => Self::Nearest,
            _ => Self::Linear,
        }
    }
}

/// Any order other than 0 or 1 silently becomes linear.
impl From<i32> for InterpolationOrder {
    fn from(order: i32) -> Self {
        match order {
            0 => Self::Nearest,
            _ => Self::Linear,
        }
    }
}

impl std::fmt::Display for InterpolationOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nearest => write!(f, "nearest"),
            Self::Linear => write!(f, "linear"),
        }
    }
}

/// Index of the first cell corner along each axis and the next one up,
/// clamped to the last grid point.
pub(crate) fn cell_upper(idx: [usize; 3], dims: [usize; 3]) -> [usize; 3] {
    [
        (idx[0] + 1).min(dims[0] - 1),
        (idx[1] + 1).min(dims[1] - 1),
        (idx[2] + 1).min(dims[2] - 1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extents_array_roundtrip() {
        let e = Extents::from_array([0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(e.min, [0.0, 1.0, 2.0]);
        assert_eq!(e.max, [3.0, 4.0, 5.0]);
        assert_eq!(e.to_array(), [0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_extents_contains_reversed_axis() {
        let e = Extents::new([0.0, 10.0, 0.0], [1.0, 0.0, 1.0]);
        assert!(!e.is_increasing(1));
        assert_eq!(e.bounds(1), (0.0, 10.0));
        assert!(e.contains([0.5, 5.0, 0.5]));
        assert!(!e.contains([0.5, 11.0, 0.5]));
    }

    #[test]
    fn test_interpolation_order_from_i32() {
        assert_eq!(InterpolationOrder::from(0), InterpolationOrder::Nearest);
        assert_eq!(InterpolationOrder::from(1), InterpolationOrder::Linear);
        assert_eq!(InterpolationOrder::from(7), InterpolationOrder::Linear);
        assert_eq!(InterpolationOrder::from(-1), InterpolationOrder::Linear);
    }

    #[test]
    fn test_interpolation_order_from_str() {
        assert_eq!(
            InterpolationOrder::from_str("NEAREST"),
            InterpolationOrder::Nearest
        );
        assert_eq!(InterpolationOrder::from_str("0"), InterpolationOrder::Nearest);
        assert_eq!(
            InterpolationOrder::from_str("cubic"),
            InterpolationOrder::Linear
        );
    }

    #[test]
    fn test_cell_upper_clamps() {
        assert_eq!(cell_upper([0, 2, 1], [3, 3, 1]), [1, 2, 0]);
    }
}
