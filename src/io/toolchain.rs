//! Raster engine capability and its GDAL command-line implementation.
//!
//! The pipeline only needs three raster primitives: read a grid, resample a
//! raster onto a grid, and merge rasters into one multi-band file. They are
//! expressed as the [`RasterEngine`] trait so an in-process engine can replace
//! the external tools without touching pipeline logic.
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::io::gdal::GdalRasterInfo;
use crate::types::{RasterGrid, ResampleMethod, TargetGrid};

pub const GDALWARP: &str = "gdalwarp";
pub const GDALBUILDVRT: &str = "gdalbuildvrt";
pub const GDAL_TRANSLATE: &str = "gdal_translate";

/// Raster primitives the normalization pipeline is built on
pub trait RasterEngine {
    /// Pixel size and extent of an existing raster
    fn grid(&self, path: &Path) -> Result<RasterGrid>;

    /// Write a lazily resampled (virtual) copy of `src` on `target` to `dst`
    fn resample(
        &self,
        src: &Path,
        target: &TargetGrid,
        method: ResampleMethod,
        dst: &Path,
    ) -> Result<()>;

    /// Materialize `sources` as consecutive layers of one raster at `dst`,
    /// written with `creation`. Layer N of the output is the first band of `sources[N]`.
    fn merge(&self, sources: &[PathBuf], creation: &RasterCreation, dst: &Path) -> Result<()>;
}

/// Driver and creation options for materialized outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterCreation {
    /// GDAL short driver name
    pub driver: String,
    /// File extension used for rasters written with `driver`
    pub extension: String,
    /// `-co` creation options
    pub options: Vec<String>,
}

impl Default for RasterCreation {
    fn default() -> Self {
        Self {
            driver: "HFA".to_string(),
            extension: "img".to_string(),
            options: vec!["COMPRESSED=TRUE".to_string(), "IGNOREUTM=TRUE".to_string()],
        }
    }
}

/// Look `name` up on `PATH`. Paths with a directory component are checked as given.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let given = Path::new(name);
    if given.components().count() > 1 {
        return given.is_file().then(|| given.to_path_buf());
    }
    let search = std::env::var_os("PATH")?;
    std::env::split_paths(&search).find_map(|dir| {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let exe = dir.join(format!("{name}.exe"));
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

/// Resolve a required tool, failing with a `Toolchain` error when it is absent
pub fn require_executable(name: &str) -> Result<PathBuf> {
    find_executable(name).ok_or_else(|| {
        Error::Toolchain(format!(
            "unable to find {name} command. Check installation of the GDAL package"
        ))
    })
}

/// Run an external program to completion. A non-zero exit is a `Toolchain` error.
pub fn run_tool(program: &Path, args: &[OsString]) -> Result<()> {
    debug!("Running {:?} {:?}", program, args);
    let status = Command::new(program).args(args).status().map_err(|e| {
        Error::Toolchain(format!("failed to launch {}: {}", program.display(), e))
    })?;
    if !status.success() {
        return Err(Error::Toolchain(format!(
            "{} failed with {}",
            program.display(),
            status
        )));
    }
    Ok(())
}

/// [`RasterEngine`] backed by the GDAL command-line utilities, with the GDAL
/// library used for grid inspection. Tool locations are resolved once.
#[derive(Debug, Clone)]
pub struct GdalToolchain {
    warp: PathBuf,
    buildvrt: PathBuf,
    translate: PathBuf,
}

impl GdalToolchain {
    /// Resolve every required tool on `PATH`
    pub fn discover() -> Result<Self> {
        Ok(Self {
            warp: require_executable(GDALWARP)?,
            buildvrt: require_executable(GDALBUILDVRT)?,
            translate: require_executable(GDAL_TRANSLATE)?,
        })
    }

    /// Use explicitly located tools
    pub fn with_tools(warp: PathBuf, buildvrt: PathBuf, translate: PathBuf) -> Self {
        Self {
            warp,
            buildvrt,
            translate,
        }
    }

    fn warp_args(
        src: &Path,
        target: &TargetGrid,
        method: ResampleMethod,
        dst: &Path,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-q".into(),
            "-of".into(),
            "VRT".into(),
            "-co".into(),
            "TILED=YES".into(),
            "-tr".into(),
            target.x_res.to_string().into(),
            target.y_res.to_string().into(),
        ];
        if let Some(e) = target.extent {
            args.push("-te".into());
            for v in [e.xmin, e.ymin, e.xmax, e.ymax] {
                args.push(v.to_string().into());
            }
        }
        args.push("-r".into());
        args.push(method.gdal_name().into());
        args.push(src.into());
        args.push(dst.into());
        args
    }

    fn translate_args(creation: &RasterCreation, src: &Path, dst: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-q".into(), "-of".into(), (&creation.driver).into()];
        for opt in &creation.options {
            args.push("-co".into());
            args.push(opt.into());
        }
        args.push(src.into());
        args.push(dst.into());
        args
    }
}

impl RasterEngine for GdalToolchain {
    fn grid(&self, path: &Path) -> Result<RasterGrid> {
        let info = GdalRasterInfo::open(path)?;
        debug!(
            "{:?}: {}x{} pixels, {} band(s), {}",
            path, info.size_x, info.size_y, info.bands, info.projection
        );
        Ok(info.grid()?)
    }

    fn resample(
        &self,
        src: &Path,
        target: &TargetGrid,
        method: ResampleMethod,
        dst: &Path,
    ) -> Result<()> {
        run_tool(&self.warp, &Self::warp_args(src, target, method, dst))
    }

    fn merge(&self, sources: &[PathBuf], creation: &RasterCreation, dst: &Path) -> Result<()> {
        if sources.is_empty() {
            return Err(Error::InvalidArgument {
                arg: "sources",
                value: "empty".into(),
            });
        }
        let dir = dst.parent().filter(|p| !p.as_os_str().is_empty());
        let mut builder = tempfile::Builder::new();
        builder.prefix("stack_").suffix(".vrt");
        let vrt = match dir {
            Some(d) => builder.tempfile_in(d)?,
            None => builder.tempfile_in(".")?,
        };

        let mut args: Vec<OsString> = vec!["-q".into(), "-overwrite".into(), "-separate".into()];
        args.push(vrt.path().into());
        args.extend(sources.iter().map(OsString::from));
        run_tool(&self.buildvrt, &args)?;

        // The mosaic VRT is removed when `vrt` drops
        run_tool(&self.translate, &Self::translate_args(creation, vrt.path(), dst))
    }
}
