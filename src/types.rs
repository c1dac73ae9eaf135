//! Shared types used across sen2prep.
//! Includes the fixed Sentinel-2 band list (`BandId`), the interpolation
//! choices (`ResampleMethod`) and the raster grid description (`RasterGrid`).
use serde::{Deserialize, Serialize};

/// Sentinel-2 MSI spectral bands, in the order the detection algorithm
/// expects them as layers of the reflectance stack.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum BandId {
    B01,
    B02,
    B03,
    B04,
    B05,
    B06,
    B07,
    B08,
    B8A,
    B09,
    B10,
    B11,
    B12,
}

impl BandId {
    /// Every band, in stack order. Layer N of the stack is `ALL[N]`.
    pub const ALL: [BandId; 13] = [
        BandId::B01,
        BandId::B02,
        BandId::B03,
        BandId::B04,
        BandId::B05,
        BandId::B06,
        BandId::B07,
        BandId::B08,
        BandId::B8A,
        BandId::B09,
        BandId::B10,
        BandId::B11,
        BandId::B12,
    ];

    /// Identifier as it appears in the L1C file names (`*_B8A.jp2`).
    pub fn as_str(&self) -> &'static str {
        match self {
            BandId::B01 => "B01",
            BandId::B02 => "B02",
            BandId::B03 => "B03",
            BandId::B04 => "B04",
            BandId::B05 => "B05",
            BandId::B06 => "B06",
            BandId::B07 => "B07",
            BandId::B08 => "B08",
            BandId::B8A => "B8A",
            BandId::B09 => "B09",
            BandId::B10 => "B10",
            BandId::B11 => "B11",
            BandId::B12 => "B12",
        }
    }

    /// Nominal ground sampling distance in metres
    pub fn nominal_resolution(&self) -> f64 {
        match self {
            BandId::B02 | BandId::B03 | BandId::B04 | BandId::B08 => 10.0,
            BandId::B05
            | BandId::B06
            | BandId::B07
            | BandId::B8A
            | BandId::B11
            | BandId::B12 => 20.0,
            BandId::B01 | BandId::B09 | BandId::B10 => 60.0,
        }
    }
}

impl std::fmt::Display for BandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Interpolation applied when a raster is brought onto the output grid
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ResampleMethod {
    Nearest,
    Average,
    Cubic,
}

impl ResampleMethod {
    /// Name understood by `gdalwarp -r`
    pub fn gdal_name(&self) -> &'static str {
        match self {
            ResampleMethod::Nearest => "near",
            ResampleMethod::Average => "average",
            ResampleMethod::Cubic => "cubic",
        }
    }
}

impl std::fmt::Display for ResampleMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResampleMethod::Nearest => write!(f, "Nearest"),
            ResampleMethod::Average => write!(f, "Average"),
            ResampleMethod::Cubic => write!(f, "Cubic"),
        }
    }
}

/// Bounding box in georeferenced units
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

/// Pixel size and extent of a raster
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct RasterGrid {
    /// Pixel width (always positive)
    pub x_res: f64,
    /// Pixel height (always positive, regardless of the geotransform sign)
    pub y_res: f64,
    pub extent: Extent,
}

impl RasterGrid {
    /// Grids are equivalent when both pixel sizes match. Extents are not compared.
    pub fn same_resolution(&self, other: &RasterGrid) -> bool {
        self.x_res == other.x_res && self.y_res == other.y_res
    }
}

/// Grid a resample operation should produce
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct TargetGrid {
    pub x_res: f64,
    pub y_res: f64,
    /// When set, the output is clipped/padded to exactly this extent
    pub extent: Option<Extent>,
}

impl TargetGrid {
    /// Square pixels of the given size, extent left to the tool
    pub fn square(pixel_size: f64) -> Self {
        Self {
            x_res: pixel_size,
            y_res: pixel_size,
            extent: None,
        }
    }

    /// Same pixel size and extent as an existing raster
    pub fn matching(grid: &RasterGrid) -> Self {
        Self {
            x_res: grid.x_res,
            y_res: grid.y_res,
            extent: Some(grid.extent),
        }
    }
}
