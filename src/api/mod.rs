//! High-level library API: resolve the external tools once, then run the
//! normalization pipeline from a `.SAFE` directory, a granule directory or a
//! prebuilt stack. Prefer these entrypoints over the `core` modules when
//! integrating sen2prep.
use std::path::Path;

use tracing::info;

use crate::core::params::DetectionConfig;
use crate::core::pipeline::{Pipeline, PipelineInput, RunReport};
use crate::error::Result;
use crate::io::archive::ArchiveInput;
use crate::io::external::{AnglesCommand, DEFAULT_ANGLES_COMMAND, DetectorCommand};
use crate::io::toolchain::GdalToolchain;

/// Every external program a run may call, located up front
#[derive(Debug, Clone)]
pub struct Tools {
    pub engine: GdalToolchain,
    pub angles: AnglesCommand,
    pub detector: DetectorCommand,
}

impl Tools {
    /// Resolve the GDAL utilities, the angles program and the detection program.
    /// A missing program is a `Toolchain` error before any work starts.
    pub fn discover(detector: &str, angles: Option<&str>) -> Result<Self> {
        let engine = GdalToolchain::discover()?;
        let angles = AnglesCommand::resolve(angles.unwrap_or(DEFAULT_ANGLES_COMMAND))?;
        let detector = DetectorCommand::resolve(detector)?;
        info!("Angles program: {:?}", angles.program());
        Ok(Self {
            engine,
            angles,
            detector,
        })
    }
}

/// Run the pipeline for any input mode
pub fn process_to_path(
    input: &PipelineInput,
    output: &Path,
    tools: &Tools,
    config: DetectionConfig,
) -> Result<RunReport> {
    let pipeline = Pipeline::new(&tools.engine, &tools.angles, &tools.detector, config)?;
    pipeline.run(input, output)
}

/// Single-tile `.SAFE` directory to cloud mask
pub fn process_safe_to_path(
    safe_dir: &Path,
    output: &Path,
    tools: &Tools,
    config: DetectionConfig,
) -> Result<RunReport> {
    process_to_path(
        &PipelineInput::Archive(ArchiveInput::Safe(safe_dir.to_path_buf())),
        output,
        tools,
        config,
    )
}

/// Granule directory (old multi-tile archives) to cloud mask
pub fn process_granule_to_path(
    granule_dir: &Path,
    output: &Path,
    tools: &Tools,
    config: DetectionConfig,
) -> Result<RunReport> {
    process_to_path(
        &PipelineInput::Archive(ArchiveInput::Granule(granule_dir.to_path_buf())),
        output,
        tools,
        config,
    )
}

/// Prebuilt reflectance stack and angles to cloud mask
pub fn process_stack_to_path(
    toa: &Path,
    angles: &Path,
    output: &Path,
    tools: &Tools,
    config: DetectionConfig,
) -> Result<RunReport> {
    process_to_path(
        &PipelineInput::Prebuilt {
            toa: toa.to_path_buf(),
            angles: angles.to_path_buf(),
        },
        output,
        tools,
        config,
    )
}
