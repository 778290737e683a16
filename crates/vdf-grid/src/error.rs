//! Error types for grid construction and access.

use thiserror::Error;

/// Errors that can occur while building, reshaping or indexing a grid.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// An IJK index lies outside the grid dimensions.
    #[error("index ({i}, {j}, {k}) is outside grid dimensions {dims:?}")]
    OutOfBounds {
        i: usize,
        j: usize,
        k: usize,
        dims: [usize; 3],
    },

    /// The minimum index exceeds the maximum index on some axis.
    #[error("invalid region: min {min:?} exceeds max {max:?}")]
    InvalidRegion { min: [usize; 3], max: [usize; 3] },

    /// The number of blocks supplied does not match the block decomposition.
    #[error("expected {expected} blocks, got {actual}")]
    BlockCount { expected: usize, actual: usize },

    /// A block holds fewer values than the block size requires.
    #[error("block {index} holds {actual} values, expected at least {expected}")]
    BlockSize {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// Reshaping would change the number of blocks per axis.
    #[error("reshape to {min:?}..={max:?} needs {required:?} blocks per axis, grid holds {allocated:?}")]
    BlockCountMismatch {
        min: [usize; 3],
        max: [usize; 3],
        required: [usize; 3],
        allocated: [usize; 3],
    },

    /// Reshaping would reach past the voxels the grid has coordinates for.
    #[error("reshape to {min:?}..={max:?} is outside known region {current_min:?}..={current_max:?}")]
    ReshapeOutsideRegion {
        min: [usize; 3],
        max: [usize; 3],
        current_min: [usize; 3],
        current_max: [usize; 3],
    },

    /// The grid variant does not implement the requested operation.
    #[error("{grid} grid does not support {operation}")]
    Unsupported {
        grid: &'static str,
        operation: &'static str,
    },

    /// A grid specification is malformed.
    #[error("invalid grid specification: {0}")]
    InvalidSpec(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl GridError {
    /// Create an OutOfBounds error.
    pub fn out_of_bounds(i: usize, j: usize, k: usize, dims: [usize; 3]) -> Self {
        Self::OutOfBounds { i, j, k, dims }
    }

    /// Create an Unsupported error.
    pub fn unsupported(grid: &'static str, operation: &'static str) -> Self {
        Self::Unsupported { grid, operation }
    }

    /// Create an InvalidSpec error.
    pub fn invalid_spec(msg: impl Into<String>) -> Self {
        Self::InvalidSpec(msg.into())
    }

    /// Create a ConfigError.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidSpec(err.to_string())
    }
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_message() {
        let err = GridError::out_of_bounds(3, 0, 1, [3, 3, 3]);
        assert_eq!(
            err.to_string(),
            "index (3, 0, 1) is outside grid dimensions [3, 3, 3]"
        );
    }

    #[test]
    fn test_json_error_converts_to_invalid_spec() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: GridError = parse.unwrap_err().into();
        assert!(matches!(err, GridError::InvalidSpec(_)));
    }
}
