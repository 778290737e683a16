//! Build grids from serializable descriptions.

use serde::{Deserialize, Serialize};

use crate::config::GridConfig;
use crate::error::{GridError, Result};
use crate::grid::Grid;
use crate::layered::LayeredGrid;
use crate::regular::RegularGrid;
use crate::spherical::SphericalGrid;
use crate::stretched::StretchedGrid;
use crate::types::{Extents, InterpolationOrder};

/// Variant-specific part of a [`GridSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridKind {
    Regular,
    Layered {
        #[serde(default = "default_varying_dim")]
        varying_dim: usize,
    },
    Stretched {
        #[serde(default)]
        xcoords: Vec<f64>,
        #[serde(default)]
        ycoords: Vec<f64>,
        #[serde(default)]
        zcoords: Vec<f64>,
    },
    Spherical {
        #[serde(default = "default_permutation")]
        permutation: [usize; 3],
    },
}

fn default_varying_dim() -> usize {
    2
}

fn default_permutation() -> [usize; 3] {
    [0, 1, 2]
}

/// Shape and coordinate description of a grid, without its voxel data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Voxels per block per axis
    pub block_size: [usize; 3],

    /// Inclusive global voxel bounds of the region
    pub min: [usize; 3],
    pub max: [usize; 3],

    pub extents: Extents,

    #[serde(default)]
    pub periodic: [bool; 3],

    /// Overrides the configured missing value
    #[serde(default)]
    pub missing_value: Option<f32>,

    /// Overrides the configured interpolation order
    #[serde(default)]
    pub interpolation: Option<InterpolationOrder>,

    pub kind: GridKind,
}

impl GridSpec {
    /// Parse a spec from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Builds boxed grids from a [`GridSpec`] and caller-owned blocks.
#[derive(Debug, Clone, Default)]
pub struct GridFactory {
    config: GridConfig,
}

impl GridFactory {
    /// Create a factory that applies `config` to every grid it builds.
    pub fn new(config: GridConfig) -> Result<Self> {
        config.validate().map_err(GridError::config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Build a grid over `blocks`.
    ///
    /// `coords` holds the varying-axis coordinate blocks of a layered grid
    /// and is ignored by the other variants.
    pub fn build<'a, B>(
        &self,
        spec: &GridSpec,
        blocks: Vec<B>,
        coords: Option<Vec<B>>,
    ) -> Result<Box<dyn Grid + 'a>>
    where
        B: AsRef<[f32]> + Send + Sync + 'a,
    {
        let GridSpec {
            block_size: bs,
            min,
            max,
            extents,
            periodic,
            ..
        } = *spec;

        let mut grid: Box<dyn Grid + 'a> = match &spec.kind {
            GridKind::Regular => {
                Box::new(RegularGrid::new(bs, min, max, extents, periodic, blocks)?)
            }
            GridKind::Layered { varying_dim } => {
                let coords = coords.ok_or_else(|| {
                    GridError::invalid_spec("layered grid requires coordinate blocks")
                })?;
                Box::new(LayeredGrid::new(
                    bs,
                    min,
                    max,
                    extents,
                    periodic,
                    blocks,
                    coords,
                    *varying_dim,
                )?)
            }
            GridKind::Stretched {
                xcoords,
                ycoords,
                zcoords,
            } => Box::new(StretchedGrid::new(
                bs,
                min,
                max,
                extents,
                periodic,
                blocks,
                xcoords.clone(),
                ycoords.clone(),
                zcoords.clone(),
            )?),
            GridKind::Spherical { permutation } => Box::new(SphericalGrid::new(
                bs,
                min,
                max,
                extents,
                *permutation,
                periodic,
                blocks,
            )?),
        };

        if let Some(mv) = spec.missing_value.or(self.config.missing_value) {
            grid.set_missing_value(mv);
        }
        grid.set_interpolation_order(spec.interpolation.unwrap_or(self.config.interpolation));

        tracing::debug!(
            kind = grid.kind(),
            dims = ?grid.dimensions(),
            blocks = grid.num_blocks(),
            "Built grid"
        );
        Ok(grid)
    }
}
