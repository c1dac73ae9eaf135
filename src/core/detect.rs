use std::path::{Path, PathBuf};

use crate::core::params::{AngleLayers, DerivedParameters, DetectionConfig};
use crate::error::Result;

/// Files handed to the cloud/shadow detection algorithm
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionInputs {
    /// Reflectance stack, one layer per band in `BandId::ALL` order
    pub toa: PathBuf,
    /// Angle raster on the same grid as `toa`
    pub angles: PathBuf,
    pub angle_layers: AngleLayers,
    /// Mask to write
    pub output: PathBuf,
    /// Scratch directory owned by this run
    pub temp_dir: PathBuf,
}

/// The detection algorithm, called once per run. Writes the mask to
/// `inputs.output`, which may already exist as an empty file, and returns that path.
pub trait CloudDetector {
    fn detect(
        &self,
        inputs: &DetectionInputs,
        config: &DetectionConfig,
        derived: &DerivedParameters,
    ) -> Result<PathBuf>;
}

impl DetectionInputs {
    pub fn new(toa: &Path, angles: &Path, output: &Path, temp_dir: &Path) -> Self {
        Self {
            toa: toa.to_path_buf(),
            angles: angles.to_path_buf(),
            angle_layers: AngleLayers::default(),
            output: output.to_path_buf(),
            temp_dir: temp_dir.to_path_buf(),
        }
    }
}
