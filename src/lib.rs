#![doc = r#"
sen2prep: Sentinel-2 L1C input normalization for cloud and shadow masking.

This crate turns a Sentinel-2 Level-1C `.SAFE` product into the two inputs a
cloud/shadow detection algorithm needs: a 13-band TOA reflectance stack on one
grid, and a per-pixel sun/view angle raster on that same grid. It then hands both,
with pixel-based parameters derived from the stack resolution, to the detector.

Resampling and merging are delegated to the GDAL command-line utilities
(`gdalwarp`, `gdalbuildvrt`, `gdal_translate`); grids are read with the GDAL
library. Every intermediate lives in a run-scoped directory that is removed at the
end of the run unless intermediates are kept.

Requirements
------------
- GDAL development headers and runtime, plus the GDAL utilities on `PATH`.
- An angles program (by default `fmask_sentinel2makeAnglesImage.py`) and a
  detection program on `PATH`.

Quick start: process a SAFE to a mask
-------------------------------------
```rust,no_run
use std::path::Path;
use sen2prep::{DetectionConfig, RasterCreation, Tools, process_safe_to_path};

fn main() -> sen2prep::Result<()> {
    let tools = Tools::discover("s2cloud", None)?;
    // Driver, extension and creation options of the stack all come from here
    let creation = RasterCreation {
        driver: "GTiff".into(),
        extension: "tif".into(),
        options: vec!["COMPRESS=DEFLATE".into()],
    };
    let config = DetectionConfig {
        pixel_size: 20.0,
        creation,
        cloud_buffer_distance: 150.0,
        shadow_buffer_distance: 300.0,
        temp_dir: "/scratch".into(),
        ..DetectionConfig::default()
    };

    let report = process_safe_to_path(
        Path::new("/data/S2A_MSIL1C_20170108T000452.SAFE"),
        Path::new("/out/cloud.img"),
        &tools,
        config,
    )?;
    println!("mask: {:?}, cloud buffer: {} px", report.mask, report.derived.cloud_buffer_pixels);
    Ok(())
}
```

Custom raster engine
--------------------
The pipeline only talks to GDAL through [`RasterEngine`]; the angle and detection
steps go through [`AngleComputer`] and [`CloudDetector`]. Any of them can be
replaced:

```rust,no_run
use std::path::Path;
use sen2prep::{DetectionConfig, GdalToolchain, Pipeline, PipelineInput};
use sen2prep::io::{AnglesCommand, DetectorCommand};

fn main() -> sen2prep::Result<()> {
    let engine = GdalToolchain::discover()?;
    let angles = AnglesCommand::resolve("fmask_sentinel2makeAnglesImage.py")?;
    let detector = DetectorCommand::resolve("s2cloud")?;
    let pipeline = Pipeline::new(&engine, &angles, &detector, DetectionConfig::default())?;
    let input = PipelineInput::Prebuilt {
        toa: "/data/toa.img".into(),
        angles: "/data/angles.img".into(),
    };
    pipeline.run(&input, Path::new("/out/cloud.img"))?;
    Ok(())
}
```

Error handling
--------------
All public functions return `sen2prep::Result<T>`; match on `sen2prep::Error`:

```rust,no_run
use std::path::Path;
use sen2prep::{DetectionConfig, Error, Tools, process_safe_to_path};

fn main() {
    let tools = match Tools::discover("s2cloud", None) {
        Ok(t) => t,
        Err(e) => return eprintln!("{e}"),
    };
    match process_safe_to_path(Path::new("/bad.SAFE"), Path::new("/out.img"), &tools, DetectionConfig::default()) {
        Ok(_) => {}
        Err(Error::ArchiveLayout(msg)) => eprintln!("bad archive: {msg}"),
        Err(Error::MissingInput { band, detail }) => eprintln!("band {band}: {detail}"),
        Err(other) => eprintln!("{other}"),
    }
}
```

Useful modules
--------------
- [`api`]: tool discovery and one-call entry points.
- [`core`]: resample policy, band resampling, stack assembly, angle reconciliation, pipeline.
- [`io`]: archive discovery, granule metadata, GDAL inspection and external tools.
- [`types`]: `BandId`, `ResampleMethod`, `RasterGrid`.
- [`error`]: crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
pub use crate::core::angles::{AngleComputer, AngleRaster};
pub use crate::core::detect::{CloudDetector, DetectionInputs};
pub use crate::core::params::{AngleLayers, DerivedParameters, DetectionConfig};
pub use crate::core::pipeline::{Pipeline, PipelineInput, RunReport};
pub use crate::core::policy::choose_method;
pub use crate::error::{Error, Result};
pub use crate::types::{BandId, Extent, RasterGrid, ResampleMethod, TargetGrid};

pub use crate::io::{ArchiveInput, GdalToolchain, GranuleInfo, RasterCreation, RasterEngine};

pub use crate::api::{
    Tools, process_granule_to_path, process_safe_to_path, process_stack_to_path, process_to_path,
};
