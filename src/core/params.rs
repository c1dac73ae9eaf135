use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io::toolchain::RasterCreation;

/// Run configuration, suitable for JSON config files. Immutable once validated;
/// resolution-dependent values are computed into [`DerivedParameters`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Output pixel size of the reflectance stack, in metres
    pub pixel_size: f64,
    /// Divisor turning stored digital numbers into TOA reflectance
    pub toa_scale: f64,
    /// Cloud probability threshold, as a fraction in [0, 1]
    pub cloud_prob_threshold: f64,
    /// NIR reflectance threshold for snow, in [0, 1]
    pub nir_snow_threshold: f64,
    /// Green reflectance threshold for snow, in [0, 1]
    pub green_snow_threshold: f64,
    /// Minimum cloud size in pixels, before buffering
    pub min_cloud_size: u32,
    /// Cloud buffer distance, in metres
    pub cloud_buffer_distance: f64,
    /// Cloud shadow buffer distance, in metres
    pub shadow_buffer_distance: f64,
    /// Enable the parallax displacement test
    pub parallax_test: bool,
    pub verbose: bool,
    /// Keep the built stack and computed angles after the run
    pub keep_intermediates: bool,
    /// Directory under which the run directory is created
    pub temp_dir: PathBuf,
    /// Driver and creation options of materialized rasters
    pub creation: RasterCreation,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            pixel_size: 20.0,
            toa_scale: 10000.0,
            cloud_prob_threshold: 0.2,
            nir_snow_threshold: 0.11,
            green_snow_threshold: 0.1,
            min_cloud_size: 0,
            cloud_buffer_distance: 150.0,
            shadow_buffer_distance: 300.0,
            parallax_test: false,
            verbose: false,
            keep_intermediates: false,
            temp_dir: PathBuf::from("."),
            creation: RasterCreation::default(),
        }
    }
}

fn check_fraction(arg: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidArgument {
            arg,
            value: value.to_string(),
        })
    }
}

fn check_positive(arg: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidArgument {
            arg,
            value: value.to_string(),
        })
    }
}

fn check_distance(arg: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidArgument {
            arg,
            value: value.to_string(),
        })
    }
}

impl DetectionConfig {
    /// Load a config from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn validate(&self) -> Result<()> {
        check_positive("pixel_size", self.pixel_size)?;
        check_positive("toa_scale", self.toa_scale)?;
        check_fraction("cloud_prob_threshold", self.cloud_prob_threshold)?;
        check_fraction("nir_snow_threshold", self.nir_snow_threshold)?;
        check_fraction("green_snow_threshold", self.green_snow_threshold)?;
        check_distance("cloud_buffer_distance", self.cloud_buffer_distance)?;
        check_distance("shadow_buffer_distance", self.shadow_buffer_distance)?;
        if self.creation.driver.is_empty() {
            return Err(Error::InvalidArgument {
                arg: "creation.driver",
                value: String::new(),
            });
        }
        Ok(())
    }

    /// Convert the buffer distances into whole pixels of the stack
    pub fn derive(&self, stack_pixel_size: f64) -> Result<DerivedParameters> {
        check_positive("stack pixel size", stack_pixel_size)?;
        Ok(DerivedParameters {
            stack_pixel_size,
            cloud_buffer_pixels: (self.cloud_buffer_distance / stack_pixel_size) as u32,
            shadow_buffer_pixels: (self.shadow_buffer_distance / stack_pixel_size) as u32,
        })
    }
}

/// Values computed from the configuration and the stack resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedParameters {
    pub stack_pixel_size: f64,
    pub cloud_buffer_pixels: u32,
    pub shadow_buffer_pixels: u32,
}

/// Layer indices (0-based) of the angle raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AngleLayers {
    pub sat_azimuth: usize,
    pub sat_zenith: usize,
    pub sun_azimuth: usize,
    pub sun_zenith: usize,
}

impl Default for AngleLayers {
    fn default() -> Self {
        Self {
            sat_azimuth: 0,
            sat_zenith: 1,
            sun_azimuth: 2,
            sun_zenith: 3,
        }
    }
}
