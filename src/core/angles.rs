use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::artifacts::{ArtifactLedger, Retention};
use crate::error::Result;
use crate::io::toolchain::RasterEngine;
use crate::types::{ResampleMethod, TargetGrid};

/// Produces the per-pixel angle raster of a granule from its metadata XML.
/// Layers follow [`AngleLayers`](crate::core::params::AngleLayers).
pub trait AngleComputer {
    fn compute_angles(&self, metadata_xml: &Path, output: &Path) -> Result<()>;
}

/// Angle raster the detection step should read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AngleRaster {
    pub path: PathBuf,
    /// A derivative made by the reconciler, removed at cleanup
    pub is_temporary: bool,
}

/// Make the angles line up with `reference`. When the pixel sizes already match
/// the original path is returned untouched; otherwise a nearest-neighbour VRT on
/// the reference grid and extent is written to the run directory.
pub fn reconcile(
    engine: &dyn RasterEngine,
    angles: &Path,
    reference: &Path,
    ledger: &mut ArtifactLedger,
) -> Result<AngleRaster> {
    let reference_grid = engine.grid(reference)?;
    let angles_grid = engine.grid(angles)?;

    if angles_grid.same_resolution(&reference_grid) {
        return Ok(AngleRaster {
            path: angles.to_path_buf(),
            is_temporary: false,
        });
    }

    let proxy = ledger.allocate("angles_resampled", "vrt", Retention::Transient);
    info!(
        "Angles at {}x{} m, stack at {}x{} m; resampling angles to {:?}",
        angles_grid.x_res, angles_grid.y_res, reference_grid.x_res, reference_grid.y_res, proxy
    );
    engine.resample(
        angles,
        &TargetGrid::matching(&reference_grid),
        ResampleMethod::Nearest,
        &proxy,
    )?;
    Ok(AngleRaster {
        path: proxy,
        is_temporary: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::FakeWorld;

    #[test]
    fn matching_grid_returns_original() {
        let root = tempfile::tempdir().unwrap();
        let world = FakeWorld::new(20.0);
        let stack = world.raster(root.path().join("toa.img"), 20.0);
        let angles = world.raster(root.path().join("angles.img"), 20.0);
        let mut ledger = ArtifactLedger::create(root.path(), false).unwrap();

        let got = reconcile(&world, &angles, &stack, &mut ledger).unwrap();
        assert_eq!(
            got,
            AngleRaster {
                path: angles.clone(),
                is_temporary: false
            }
        );
        // Idempotent
        let again = reconcile(&world, &got.path, &stack, &mut ledger).unwrap();
        assert_eq!(again, got);
        assert!(world.resample_calls().is_empty());
        assert_eq!(ledger.registered().count(), 0);
    }

    #[test]
    fn coarser_angles_get_a_nearest_proxy_on_the_stack_grid() {
        let root = tempfile::tempdir().unwrap();
        let world = FakeWorld::new(20.0);
        let stack = world.raster(root.path().join("toa.img"), 20.0);
        let angles = world.raster(root.path().join("angles.img"), 5000.0);
        let mut ledger = ArtifactLedger::create(root.path(), false).unwrap();

        let got = reconcile(&world, &angles, &stack, &mut ledger).unwrap();
        assert!(got.is_temporary);
        assert_ne!(got.path, angles);
        assert!(got.path.starts_with(ledger.run_dir()));

        let calls = world.resample_calls();
        assert_eq!(calls.len(), 1);
        let (src, px, method) = &calls[0];
        assert_eq!(src, &angles);
        assert_eq!(*px, 20.0);
        assert_eq!(*method, ResampleMethod::Nearest);
        assert_eq!(world.grid_of(&got.path).unwrap().extent, world.grid_of(&stack).unwrap().extent);

        ledger.cleanup();
        assert!(!got.path.exists());
        assert!(angles.exists());
    }
}
