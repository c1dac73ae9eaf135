//! External-command implementations of the angle and detection collaborators.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::angles::AngleComputer;
use crate::core::detect::{CloudDetector, DetectionInputs};
use crate::core::params::{DerivedParameters, DetectionConfig};
use crate::error::{Error, Result};
use crate::io::toolchain::{require_executable, run_tool};

pub const DEFAULT_ANGLES_COMMAND: &str = "fmask_sentinel2makeAnglesImage.py";

/// Runs `<program> -i <metadata xml> -o <angles raster>`
#[derive(Debug, Clone)]
pub struct AnglesCommand {
    program: PathBuf,
}

impl AnglesCommand {
    /// Resolve `name` on `PATH` (or as a path) now rather than at first use
    pub fn resolve(name: &str) -> Result<Self> {
        Ok(Self {
            program: require_executable(name)?,
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl AngleComputer for AnglesCommand {
    fn compute_angles(&self, metadata_xml: &Path, output: &Path) -> Result<()> {
        info!("Making angles image {:?}", output);
        let args: Vec<OsString> = vec![
            "-i".into(),
            metadata_xml.into(),
            "-o".into(),
            output.into(),
        ];
        run_tool(&self.program, &args)?;
        if !output.exists() {
            return Err(Error::External(format!(
                "{} reported success but wrote no {}",
                self.program.display(),
                output.display()
            )));
        }
        Ok(())
    }
}

/// Runs a detection program that takes the stack, angles and every tuning
/// parameter as flags, and writes the mask to `-o`.
#[derive(Debug, Clone)]
pub struct DetectorCommand {
    program: PathBuf,
}

impl DetectorCommand {
    pub fn resolve(name: &str) -> Result<Self> {
        Ok(Self {
            program: require_executable(name)?,
        })
    }

    fn args(
        inputs: &DetectionInputs,
        config: &DetectionConfig,
        derived: &DerivedParameters,
    ) -> Vec<OsString> {
        let layers = inputs.angle_layers;
        let mut args: Vec<OsString> = vec![
            "-a".into(),
            (&inputs.toa).into(),
            "-z".into(),
            (&inputs.angles).into(),
            "-o".into(),
            (&inputs.output).into(),
            "--anglelayers".into(),
            format!(
                "{},{},{},{}",
                layers.sat_azimuth, layers.sat_zenith, layers.sun_azimuth, layers.sun_zenith
            )
            .into(),
            "--toascale".into(),
            config.toa_scale.to_string().into(),
            "--cloudprobthreshold".into(),
            config.cloud_prob_threshold.to_string().into(),
            "--nirsnowthreshold".into(),
            config.nir_snow_threshold.to_string().into(),
            "--greensnowthreshold".into(),
            config.green_snow_threshold.to_string().into(),
            "--mincloudsize".into(),
            config.min_cloud_size.to_string().into(),
            "--cloudbuffersize".into(),
            derived.cloud_buffer_pixels.to_string().into(),
            "--shadowbuffersize".into(),
            derived.shadow_buffer_pixels.to_string().into(),
            "--tempdir".into(),
            (&inputs.temp_dir).into(),
        ];
        if config.parallax_test {
            args.push("--parallaxtest".into());
        }
        if config.verbose {
            args.push("--verbose".into());
        }
        if config.keep_intermediates {
            args.push("--keepintermediates".into());
        }
        args
    }
}

impl CloudDetector for DetectorCommand {
    fn detect(
        &self,
        inputs: &DetectionInputs,
        config: &DetectionConfig,
        derived: &DerivedParameters,
    ) -> Result<PathBuf> {
        info!("Running cloud detection into {:?}", inputs.output);
        run_tool(&self.program, &Self::args(inputs, config, derived))?;
        Ok(inputs.output.clone())
    }
}
