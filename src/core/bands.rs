use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::artifacts::{ArtifactLedger, Retention};
use crate::core::policy::choose_method;
use crate::error::Result;
use crate::io::archive::locate_band_source;
use crate::io::toolchain::RasterEngine;
use crate::types::{BandId, ResampleMethod, TargetGrid};

/// One band's source file and its resampled intermediate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandRaster {
    pub band: BandId,
    pub source: PathBuf,
    pub native_pixel_size: f64,
    pub method: ResampleMethod,
    /// Virtual raster on the output grid
    pub intermediate: PathBuf,
    /// Pixel size of `intermediate`
    pub pixel_size: f64,
}

/// Locate the source file of every band before anything is written, so a
/// missing or duplicated band fails the run without creating artifacts.
pub fn locate_band_sources(granule_dir: &Path, bands: &[BandId]) -> Result<Vec<(BandId, PathBuf)>> {
    bands
        .iter()
        .map(|&band| Ok((band, locate_band_source(granule_dir, band)?)))
        .collect()
}

/// Resample every band to `pixel_size` square pixels as a tiled VRT in the run directory
pub fn resample_bands(
    engine: &dyn RasterEngine,
    sources: &[(BandId, PathBuf)],
    pixel_size: f64,
    ledger: &mut ArtifactLedger,
) -> Result<Vec<BandRaster>> {
    let target = TargetGrid::square(pixel_size);
    let mut resampled = Vec::with_capacity(sources.len());
    for (band, source) in sources {
        let native_pixel_size = engine.grid(source)?.x_res;
        if native_pixel_size != band.nominal_resolution() {
            warn!(
                "Band {} is at {} m, expected {} m: {:?}",
                band,
                native_pixel_size,
                band.nominal_resolution(),
                source
            );
        }
        let method = choose_method(pixel_size, native_pixel_size);
        let intermediate = ledger.allocate(&format!("tmp_{band}"), "vrt", Retention::Transient);
        info!(
            "Resampling {} from {} m to {} m ({})",
            band, native_pixel_size, pixel_size, method
        );
        engine.resample(source, &target, method, &intermediate)?;
        resampled.push(BandRaster {
            band: *band,
            source: source.clone(),
            native_pixel_size,
            method,
            intermediate,
            pixel_size,
        });
    }
    Ok(resampled)
}
