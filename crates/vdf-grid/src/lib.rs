//! Block-decomposed volumetric grids for gridded simulation data.
//!
//! Voxel data lives in caller-owned blocks. A grid stores only the block
//! handles and the shape metadata needed to map between three index and
//! coordinate spaces:
//!
//! - **global voxel indices**: `min..=max` inside the full volume
//! - **ROI-relative indices**: `0..dims`, used by every `ijk` operation
//! - **user coordinates**: physical positions, used by `value()`
//!
//! # Grid variants
//!
//! | Type              | Coordinates                                           |
//! |-------------------|-------------------------------------------------------|
//! | [`RegularGrid`]   | uniform spacing on every axis                         |
//! | [`LayeredGrid`]   | uniform on two axes, per-point on the varying axis    |
//! | [`StretchedGrid`] | per-axis coordinate vectors                           |
//! | [`SphericalGrid`] | longitude/latitude/radius mapped onto a Cartesian shell |
//!
//! All variants implement [`Grid`], and [`GridFactory`] builds any of them
//! from a JSON-loadable [`GridSpec`].
//!
//! # Example
//!
//! ```ignore
//! use vdf_grid::{Extents, RegularGrid};
//!
//! let blocks = vec![vec![0.0f32; 64]; 8];
//! let grid = RegularGrid::new(
//!     [4, 4, 4],
//!     [0, 0, 0],
//!     [7, 7, 7],
//!     Extents::new([0.0; 3], [1.0; 3]),
//!     [false; 3],
//!     blocks,
//! )?;
//!
//! let v = grid.value(0.5, 0.5, 0.5);
//! ```

pub mod blocks;
pub mod config;
pub mod error;
pub mod factory;
pub mod grid;
pub mod interpolation;
pub mod iter;
pub mod lattice;
pub mod layered;
pub mod regular;
pub mod spherical;
pub mod stretched;
pub mod types;

// Re-export commonly used types at crate root
pub use blocks::{block_dims, BlockLayout};
pub use config::GridConfig;
pub use error::{GridError, Result};
pub use factory::{GridFactory, GridKind, GridSpec};
pub use grid::Grid;
pub use iter::{Iter, IterMut};
pub use layered::LayeredGrid;
pub use regular::RegularGrid;
pub use spherical::SphericalGrid;
pub use stretched::StretchedGrid;
pub use types::{Extents, InterpolationOrder};
