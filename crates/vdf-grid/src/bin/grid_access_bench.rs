//! Grid access benchmark.
//!
//! Builds a synthetic blocked volume and times four ways of reading it:
//! a flat pass over the raw blocks, `access_ijk` for every voxel, the block
//! iterator, and `value()` over one horizontal slice.

use std::hint::black_box;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use vdf_grid::{block_dims, Extents, Grid, GridConfig, GridFactory, GridKind, GridSpec};

#[derive(Parser, Debug)]
#[command(name = "grid-access-bench")]
#[command(about = "Time block-decomposed grid access patterns")]
struct Args {
    /// Grid dimensions (nx ny nz)
    #[arg(long, num_args = 3, default_values_t = [128, 128, 64])]
    dims: Vec<usize>,

    /// Voxels per block along each axis
    #[arg(long, default_value = "32")]
    block_size: usize,

    /// Grid spec JSON file; overrides --dims and --block-size
    #[arg(long)]
    spec: Option<PathBuf>,

    /// Timing repetitions per access pattern
    #[arg(long, default_value = "3")]
    repeat: u32,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    // Load .env before reading GRID_* settings
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);
    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    let spec = match &args.spec {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read spec {}", path.display()))?;
            GridSpec::from_json(&json)?
        }
        None => default_spec(&args)?,
    };

    let config = GridConfig::from_env();
    let factory = GridFactory::new(config)?;

    let blocks = synthetic_blocks(&spec, |i, j, k| (i + j + k) as f32);
    let coords = matches!(spec.kind, GridKind::Layered { .. })
        .then(|| synthetic_blocks(&spec, |_, _, k| k as f32));

    let slices: Vec<&[f32]> = blocks.iter().map(Vec::as_slice).collect();
    let coord_slices: Option<Vec<&[f32]>> = coords
        .as_ref()
        .map(|c| c.iter().map(Vec::as_slice).collect());

    let grid = factory.build(&spec, slices, coord_slices)?;
    let dims = grid.dimensions();
    info!(
        kind = grid.kind(),
        dims = ?dims,
        block_size = ?spec.block_size,
        blocks = grid.num_blocks(),
        "Grid ready"
    );

    for round in 0..args.repeat {
        let direct = time(|| blocks.iter().flatten().copied().sum::<f32>());
        let ijk = time(|| sum_access_ijk(&*grid));
        let slice = time(|| sum_value_slice(&*grid));
        info!(
            round,
            direct_ms = millis(direct),
            access_ijk_ms = millis(ijk),
            value_slice_ms = millis(slice),
            "Access timings"
        );
    }

    // Iteration needs the concrete type, so time it on a regular view.
    if matches!(spec.kind, GridKind::Regular) {
        let regular = vdf_grid::RegularGrid::new(
            spec.block_size,
            spec.min,
            spec.max,
            spec.extents,
            spec.periodic,
            blocks.iter().map(Vec::as_slice).collect(),
        )?;
        for round in 0..args.repeat {
            let iter = time(|| regular.iter().sum::<f32>());
            info!(round, iterator_ms = millis(iter), "Iterator timing");
        }
    }

    let (lo, hi) = grid.range();
    info!(min = lo, max = hi, "Data range");
    Ok(())
}

fn default_spec(args: &Args) -> Result<GridSpec> {
    if args.dims.len() != 3 || args.dims.contains(&0) {
        bail!("--dims needs three positive values, got {:?}", args.dims);
    }
    let dims = [args.dims[0], args.dims[1], args.dims[2]];
    Ok(GridSpec {
        block_size: [args.block_size; 3],
        min: [0, 0, 0],
        max: [dims[0] - 1, dims[1] - 1, dims[2] - 1],
        extents: Extents::new([0.0; 3], [1.0; 3]),
        periodic: [false; 3],
        missing_value: None,
        interpolation: None,
        kind: GridKind::Regular,
    })
}

/// Fill every block of `spec` with `f(global_i, global_j, global_k)`.
fn synthetic_blocks(spec: &GridSpec, f: impl Fn(usize, usize, usize) -> f32) -> Vec<Vec<f32>> {
    let bs = spec.block_size.map(|b| b.max(1));
    let bdims = block_dims(bs, spec.min, spec.max);
    let first = [spec.min[0] / bs[0], spec.min[1] / bs[1], spec.min[2] / bs[2]];

    let mut blocks = Vec::with_capacity(bdims.iter().product());
    for zb in 0..bdims[2] {
        for yb in 0..bdims[1] {
            for xb in 0..bdims[0] {
                let origin = [
                    (first[0] + xb) * bs[0],
                    (first[1] + yb) * bs[1],
                    (first[2] + zb) * bs[2],
                ];
                let mut block = Vec::with_capacity(bs.iter().product());
                for z in 0..bs[2] {
                    for y in 0..bs[1] {
                        for x in 0..bs[0] {
                            block.push(f(origin[0] + x, origin[1] + y, origin[2] + z));
                        }
                    }
                }
                blocks.push(block);
            }
        }
    }
    blocks
}

fn sum_access_ijk(grid: &dyn Grid) -> f32 {
    let [nx, ny, nz] = grid.dimensions();
    let mut sum = 0.0;
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                sum += grid.access_ijk(i, j, k).unwrap_or(0.0);
            }
        }
    }
    sum
}

/// Sample `value()` at the user coordinates of the middle K slice.
fn sum_value_slice(grid: &dyn Grid) -> f32 {
    let [nx, ny, nz] = grid.dimensions();
    let k = nz / 2;
    let mut sum = 0.0;
    for j in 0..ny {
        for i in 0..nx {
            if let Ok([x, y, z]) = grid.user_coordinates(i, j, k) {
                sum += grid.value(x, y, z);
            }
        }
    }
    sum
}

fn time<T>(f: impl FnOnce() -> T) -> Duration {
    let start = Instant::now();
    black_box(f());
    start.elapsed()
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
