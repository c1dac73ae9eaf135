//! In-memory stand-ins for GDAL and the external collaborators. They write
//! placeholder files so lifecycle assertions can look at the real filesystem.
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::angles::AngleComputer;
use crate::core::detect::{CloudDetector, DetectionInputs};
use crate::core::params::{DerivedParameters, DetectionConfig};
use crate::error::{Error, Result};
use crate::io::toolchain::{RasterCreation, RasterEngine};
use crate::types::{BandId, Extent, RasterGrid, ResampleMethod, TargetGrid};

pub(crate) const TILE_EXTENT: Extent = Extent {
    xmin: 600000.0,
    ymin: 5790240.0,
    xmax: 709800.0,
    ymax: 5900040.0,
};

/// Create `<parent>/<name>/` with `MTD_TL.xml` and one jp2 per band, written
/// in reverse band order.
pub(crate) fn make_granule(parent: &Path, name: &str) -> PathBuf {
    let granule = parent.join(name);
    let img = granule.join("IMG_DATA");
    fs::create_dir_all(&img).unwrap();
    for band in BandId::ALL.iter().rev() {
        fs::write(img.join(format!("T55HFA_20170108T000452_{band}.jp2")), b"").unwrap();
    }
    fs::write(
        granule.join("MTD_TL.xml"),
        "<Level-1C_Tile_ID><General_Info><TILE_ID>T55HFA</TILE_ID></General_Info></Level-1C_Tile_ID>",
    )
    .unwrap();
    granule
}

#[derive(Default)]
pub(crate) struct FakeWorld {
    angles_pixel: f64,
    grids: RefCell<HashMap<PathBuf, RasterGrid>>,
    resamples: RefCell<Vec<(PathBuf, f64, ResampleMethod)>>,
    merges: RefCell<Vec<(Vec<PathBuf>, PathBuf, RasterCreation)>>,
    detections: RefCell<Vec<DetectionInputs>>,
    angle_calls: Cell<usize>,
    fail_resample_band: Option<&'static str>,
    fail_merge: bool,
    fail_detection: bool,
    detector_scratch: Option<&'static str>,
}

impl FakeWorld {
    /// Computed angle rasters come out at `angles_pixel` metres
    pub(crate) fn new(angles_pixel: f64) -> Self {
        Self {
            angles_pixel,
            ..Self::default()
        }
    }

    pub(crate) fn failing_resample_of(mut self, band: &'static str) -> Self {
        self.fail_resample_band = Some(band);
        self
    }

    pub(crate) fn failing_merge(mut self) -> Self {
        self.fail_merge = true;
        self
    }

    /// The detector also writes `name` into the temp directory it is given
    pub(crate) fn detector_writing(mut self, name: &'static str) -> Self {
        self.detector_scratch = Some(name);
        self
    }

    pub(crate) fn failing_detection(mut self) -> Self {
        self.fail_detection = true;
        self
    }

    fn insert(&self, path: &Path, x_res: f64, y_res: f64, extent: Extent) {
        self.grids.borrow_mut().insert(
            path.to_path_buf(),
            RasterGrid {
                x_res,
                y_res,
                extent,
            },
        );
    }

    /// Write a placeholder raster with the given square pixel size
    pub(crate) fn raster(&self, path: PathBuf, pixel: f64) -> PathBuf {
        fs::write(&path, b"raster").unwrap();
        self.insert(&path, pixel, pixel, TILE_EXTENT);
        path
    }

    pub(crate) fn grid_of(&self, path: &Path) -> Option<RasterGrid> {
        self.grids.borrow().get(path).copied()
    }

    pub(crate) fn resample_calls(&self) -> Vec<(PathBuf, f64, ResampleMethod)> {
        self.resamples.borrow().clone()
    }

    pub(crate) fn merge_calls(&self) -> Vec<(Vec<PathBuf>, PathBuf, RasterCreation)> {
        self.merges.borrow().clone()
    }

    pub(crate) fn detect_calls(&self) -> Vec<DetectionInputs> {
        self.detections.borrow().clone()
    }

    pub(crate) fn angle_calls(&self) -> usize {
        self.angle_calls.get()
    }
}

fn band_of(path: &Path) -> Option<BandId> {
    let name = path.file_name()?.to_str()?;
    BandId::ALL
        .into_iter()
        .find(|b| name.ends_with(&format!("_{b}.jp2")))
}

impl RasterEngine for FakeWorld {
    fn grid(&self, path: &Path) -> Result<RasterGrid> {
        if let Some(grid) = self.grid_of(path) {
            return Ok(grid);
        }
        match band_of(path) {
            Some(band) => Ok(RasterGrid {
                x_res: band.nominal_resolution(),
                y_res: band.nominal_resolution(),
                extent: TILE_EXTENT,
            }),
            None => Err(Error::External(format!("no grid for {}", path.display()))),
        }
    }

    fn resample(
        &self,
        src: &Path,
        target: &TargetGrid,
        method: ResampleMethod,
        dst: &Path,
    ) -> Result<()> {
        if let Some(fail) = self.fail_resample_band {
            if band_of(src).is_some_and(|b| b.as_str() == fail) {
                return Err(Error::Toolchain(format!("gdalwarp failed on {}", src.display())));
            }
        }
        fs::write(dst, b"<VRTDataset/>")?;
        self.insert(
            dst,
            target.x_res,
            target.y_res,
            target.extent.unwrap_or(TILE_EXTENT),
        );
        self.resamples
            .borrow_mut()
            .push((src.to_path_buf(), target.x_res, method));
        Ok(())
    }

    fn merge(&self, sources: &[PathBuf], creation: &RasterCreation, dst: &Path) -> Result<()> {
        for s in sources {
            if !s.exists() {
                return Err(Error::Toolchain(format!("missing merge input {}", s.display())));
            }
        }
        self.merges
            .borrow_mut()
            .push((sources.to_vec(), dst.to_path_buf(), creation.clone()));
        if self.fail_merge {
            fs::write(dst, b"partial stack")?;
            return Err(Error::Toolchain("gdal_translate failed".into()));
        }
        let first = self.grid(&sources[0])?;
        fs::write(dst, b"stack")?;
        self.insert(dst, first.x_res, first.y_res, first.extent);
        Ok(())
    }
}

impl AngleComputer for FakeWorld {
    fn compute_angles(&self, metadata_xml: &Path, output: &Path) -> Result<()> {
        assert!(metadata_xml.exists());
        self.angle_calls.set(self.angle_calls.get() + 1);
        fs::write(output, b"angles")?;
        self.insert(output, self.angles_pixel, self.angles_pixel, TILE_EXTENT);
        Ok(())
    }
}

impl CloudDetector for FakeWorld {
    fn detect(
        &self,
        inputs: &DetectionInputs,
        _config: &DetectionConfig,
        _derived: &DerivedParameters,
    ) -> Result<PathBuf> {
        assert!(inputs.toa.exists(), "stack missing at detection time");
        assert!(inputs.angles.exists(), "angles missing at detection time");
        self.detections.borrow_mut().push(inputs.clone());
        if let Some(name) = self.detector_scratch {
            fs::write(inputs.temp_dir.join(name), b"scratch")?;
        }
        if self.fail_detection {
            fs::write(&inputs.output, b"partial")?;
            return Err(Error::External("detection crashed".into()));
        }
        fs::write(&inputs.output, b"mask")?;
        Ok(inputs.output.clone())
    }
}
