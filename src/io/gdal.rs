use gdal::{Dataset, errors::GdalError as GdalCrateError};
use std::path::Path;
use thiserror::Error;

use crate::types::{Extent, RasterGrid};

/// Errors encountered when inspecting rasters through GDAL
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Unsupported raster: {0}")]
    UnsupportedFormat(String),
}

/// Geometry of a GDAL-readable raster, as needed to line up grids
#[derive(Debug, Clone)]
pub struct GdalRasterInfo {
    /// Width (pixels) of the raster
    pub size_x: usize,
    /// Height (lines) of the raster
    pub size_y: usize,
    /// Number of raster bands
    pub bands: usize,
    /// Affine geotransform coefficients ([origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height])
    pub geotransform: [f64; 6],
    /// Projection, reduced to `EPSG:nnnn` when an authority code is present
    pub projection: String,
}

// Helper to extract EPSG code from WKT authority tag
fn parse_epsg(wkt: &str) -> Option<String> {
    const KEY: &str = "AUTHORITY[\"EPSG\",\"";
    if let Some(idx) = wkt.rfind(KEY) {
        let start = idx + KEY.len();
        if let Some(end) = wkt[start..].find('"') {
            let code = &wkt[start..start + end];
            return Some(format!("EPSG:{}", code));
        }
    }
    None
}

impl GdalRasterInfo {
    /// Open a GDAL-supported dataset (JPEG2000, VRT, HFA, GeoTIFF, ...) and read its geometry
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GdalError> {
        let dataset = Dataset::open(path.as_ref())?;
        let (size_x, size_y) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;
        if bands == 0 {
            return Err(GdalError::UnsupportedFormat(format!(
                "no raster bands in {}",
                path.as_ref().display()
            )));
        }
        let geotransform = dataset.geo_transform().map_err(|_| {
            GdalError::UnsupportedFormat(format!(
                "{} has no geotransform",
                path.as_ref().display()
            ))
        })?;
        let proj = dataset.projection();
        let projection = if proj.starts_with("EPSG:") {
            proj
        } else if let Some(code) = parse_epsg(&proj) {
            code
        } else {
            proj
        };
        Ok(GdalRasterInfo {
            size_x: size_x as usize,
            size_y: size_y as usize,
            bands,
            geotransform,
            projection,
        })
    }

    /// Pixel size and bounding box. Rotated geotransforms are rejected.
    pub fn grid(&self) -> Result<RasterGrid, GdalError> {
        let [origin_x, pixel_w, rot_x, origin_y, rot_y, pixel_h] = self.geotransform;
        if rot_x != 0.0 || rot_y != 0.0 {
            return Err(GdalError::UnsupportedFormat(
                "rotated geotransforms are not supported".into(),
            ));
        }
        let x_end = origin_x + pixel_w * self.size_x as f64;
        let y_end = origin_y + pixel_h * self.size_y as f64;
        Ok(RasterGrid {
            x_res: pixel_w.abs(),
            y_res: pixel_h.abs(),
            extent: Extent {
                xmin: origin_x.min(x_end),
                ymin: origin_y.min(y_end),
                xmax: origin_x.max(x_end),
                ymax: origin_y.max(y_end),
            },
        })
    }
}
