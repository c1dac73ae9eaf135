use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::artifacts::{ArtifactLedger, Retention};
use crate::core::bands::BandRaster;
use crate::error::{Error, Result};
use crate::io::toolchain::{RasterCreation, RasterEngine};
use crate::types::{BandId, RasterGrid};

/// Multi-band TOA reflectance raster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectanceStack {
    pub path: PathBuf,
    pub grid: RasterGrid,
    /// Layer order; empty when the stack was supplied by the caller
    pub bands: Vec<BandId>,
    /// Built by this run (as opposed to supplied by the caller)
    pub built: bool,
}

impl ReflectanceStack {
    /// Wrap a stack the caller built beforehand
    pub fn supplied(engine: &dyn RasterEngine, path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            grid: engine.grid(path)?,
            bands: Vec::new(),
            built: false,
        })
    }
}

/// Merge the per-band intermediates, in the given order, into one raster in the
/// run directory written with `creation`. Layer N of the result is `bands[N]`.
/// The intermediates are deleted once the stack exists.
pub fn assemble_stack(
    engine: &dyn RasterEngine,
    bands: &[BandRaster],
    creation: &RasterCreation,
    ledger: &mut ArtifactLedger,
) -> Result<ReflectanceStack> {
    let Some(first) = bands.first() else {
        return Err(Error::InvalidArgument {
            arg: "bands",
            value: "empty".into(),
        });
    };
    let mut seen = HashSet::new();
    for b in bands {
        if !seen.insert(b.band) {
            return Err(Error::InvalidArgument {
                arg: "bands",
                value: format!("{} given twice", b.band),
            });
        }
        if b.pixel_size != first.pixel_size {
            return Err(Error::GridMismatch(format!(
                "{} is at {} m but {} is at {} m",
                b.band, b.pixel_size, first.band, first.pixel_size
            )));
        }
    }

    let sources: Vec<PathBuf> = bands.iter().map(|b| b.intermediate.clone()).collect();
    let path = ledger.allocate("tmp_allbands", &creation.extension, Retention::Intermediate);
    info!(
        "Making stack of all bands, at {} m pixel size: {:?}",
        first.pixel_size, path
    );
    engine.merge(&sources, creation, &path)?;
    let grid = engine.grid(&path)?;

    for source in &sources {
        ledger.release(source)?;
    }

    Ok(ReflectanceStack {
        path,
        grid,
        bands: bands.iter().map(|b| b.band).collect(),
        built: true,
    })
}
