//! End-to-end run: locate inputs, build the stack and angles, reconcile grids,
//! derive parameters, run detection, then clean up.
//!
//! ```text
//! Start -> LocateInputs -> ComputeAngles -> BuildStack -> ReconcileAngles
//!       -> DeriveParameters -> RunAlgorithm -> Cleanup -> Done
//! ```
//!
//! Any stage may fail; cleanup still runs before the error is returned.
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::TempPath;
use tracing::{debug, info, warn};

use crate::core::angles::{AngleComputer, AngleRaster, reconcile};
use crate::core::artifacts::{ArtifactLedger, Retention};
use crate::core::bands::{BandRaster, locate_band_sources, resample_bands};
use crate::core::detect::{CloudDetector, DetectionInputs};
use crate::core::params::{DerivedParameters, DetectionConfig};
use crate::core::stack::{ReflectanceStack, assemble_stack};
use crate::error::Result;
use crate::io::archive::{ArchiveInput, locate_metadata};
use crate::io::metadata::{GranuleInfo, read_granule_info};
use crate::io::toolchain::RasterEngine;
use crate::types::BandId;

/// What the run starts from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineInput {
    /// Raw L1C layout; stack and angles are built by the run
    Archive(ArchiveInput),
    /// Stack and angles prepared beforehand; normalization is skipped
    Prebuilt { toa: PathBuf, angles: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LocateInputs,
    ComputeAngles,
    BuildStack,
    ReconcileAngles,
    DeriveParameters,
    RunAlgorithm,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::LocateInputs => "locate inputs",
            Stage::ComputeAngles => "compute angles",
            Stage::BuildStack => "build stack",
            Stage::ReconcileAngles => "reconcile angles",
            Stage::DeriveParameters => "derive parameters",
            Stage::RunAlgorithm => "run algorithm",
        };
        write!(f, "{}", s)
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub mask: PathBuf,
    /// Stack given to detection
    pub toa: PathBuf,
    /// Angles given to detection
    pub angles: PathBuf,
    pub granule_dir: Option<PathBuf>,
    pub granule: Option<GranuleInfo>,
    pub bands: Vec<BandRaster>,
    pub derived: DerivedParameters,
    /// Files of this run left on disk because intermediates were kept
    pub retained: Vec<PathBuf>,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
}

impl RunReport {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Normalized inputs ready for detection
struct Prepared {
    stack: ReflectanceStack,
    angles: PathBuf,
    granule_dir: Option<PathBuf>,
    granule: Option<GranuleInfo>,
    bands: Vec<BandRaster>,
}

/// Orchestrates one run against a raster engine and the two collaborators
pub struct Pipeline<'a> {
    engine: &'a dyn RasterEngine,
    angles: &'a dyn AngleComputer,
    detector: &'a dyn CloudDetector,
    config: DetectionConfig,
}

impl<'a> Pipeline<'a> {
    /// Validates `config`; invalid settings fail here, before anything is written
    pub fn new(
        engine: &'a dyn RasterEngine,
        angles: &'a dyn AngleComputer,
        detector: &'a dyn CloudDetector,
        config: DetectionConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine,
            angles,
            detector,
            config,
        })
    }

    /// Run the whole pipeline and write the mask to `output`
    pub fn run(&self, input: &PipelineInput, output: &Path) -> Result<RunReport> {
        let started = Utc::now();
        let mut ledger = ArtifactLedger::create(&self.config.temp_dir, self.config.keep_intermediates)?;
        let mut stage = Stage::LocateInputs;

        let outcome = self.execute(input, output, &mut ledger, &mut stage);

        debug!("Cleaning up run directory {:?}", ledger.run_dir());
        let retained = ledger.cleanup();

        match outcome {
            Ok(mut report) => {
                report.retained = retained;
                report.started = started;
                report.finished = Utc::now();
                Ok(report)
            }
            Err(e) => {
                warn!("Run failed during {}: {}", stage, e);
                Err(e)
            }
        }
    }

    fn execute(
        &self,
        input: &PipelineInput,
        output: &Path,
        ledger: &mut ArtifactLedger,
        stage: &mut Stage,
    ) -> Result<RunReport> {
        let prepared = match input {
            PipelineInput::Prebuilt { toa, angles } => {
                info!("Using prebuilt stack {:?} and angles {:?}", toa, angles);
                Prepared {
                    stack: ReflectanceStack::supplied(self.engine, toa)?,
                    angles: angles.clone(),
                    granule_dir: None,
                    granule: None,
                    bands: Vec::new(),
                }
            }
            PipelineInput::Archive(archive) => self.normalize(archive, ledger, stage)?,
        };

        *stage = Stage::ReconcileAngles;
        let AngleRaster { path: angles, .. } =
            reconcile(self.engine, &prepared.angles, &prepared.stack.path, ledger)?;

        *stage = Stage::DeriveParameters;
        let derived = self.config.derive(prepared.stack.grid.x_res)?;
        info!(
            "Buffers at {} m pixels: cloud {} px, shadow {} px",
            derived.stack_pixel_size, derived.cloud_buffer_pixels, derived.shadow_buffer_pixels
        );

        *stage = Stage::RunAlgorithm;
        let staged = staged_output(output)?;
        let inputs = DetectionInputs::new(&prepared.stack.path, &angles, &staged, ledger.run_dir());
        let written = self.detector.detect(&inputs, &self.config, &derived)?;
        debug!("Detection wrote {:?}", written);
        staged.persist(output).map_err(std::io::Error::from)?;
        info!("Cloud mask written: {:?}", output);

        Ok(RunReport {
            mask: output.to_path_buf(),
            toa: prepared.stack.path,
            angles,
            granule_dir: prepared.granule_dir,
            granule: prepared.granule,
            bands: prepared.bands,
            derived,
            retained: Vec::new(),
            started: Utc::now(),
            finished: Utc::now(),
        })
    }

    fn normalize(
        &self,
        archive: &ArchiveInput,
        ledger: &mut ArtifactLedger,
        stage: &mut Stage,
    ) -> Result<Prepared> {
        *stage = Stage::LocateInputs;
        let granule_dir = archive.granule_dir()?;
        let metadata_xml = locate_metadata(&granule_dir)?;
        let sources = locate_band_sources(&granule_dir, &BandId::ALL)?;
        let granule = match read_granule_info(&metadata_xml) {
            Ok(g) => {
                info!(
                    "Tile {} sensed {}",
                    g.tile_id.as_deref().unwrap_or("<unknown>"),
                    g.sensing_time
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "<unknown>".to_string())
                );
                Some(g)
            }
            Err(e) => {
                warn!("Could not summarise {:?}: {}", metadata_xml, e);
                None
            }
        };

        *stage = Stage::ComputeAngles;
        let angles = ledger.allocate(
            "angles_tmp",
            &self.config.creation.extension,
            Retention::Intermediate,
        );
        self.angles.compute_angles(&metadata_xml, &angles)?;

        *stage = Stage::BuildStack;
        let bands = resample_bands(self.engine, &sources, self.config.pixel_size, ledger)?;
        let stack = assemble_stack(self.engine, &bands, &self.config.creation, ledger)?;

        Ok(Prepared {
            stack,
            angles,
            granule_dir: Some(granule_dir),
            granule,
            bands,
        })
    }
}

/// Empty file next to `output` for detection to write into. It replaces `output`
/// only once detection succeeds and is deleted on drop otherwise.
fn staged_output(output: &Path) -> Result<TempPath> {
    let dir = output
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let suffix = output
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let file = tempfile::Builder::new()
        .prefix(".sen2prep_mask_")
        .suffix(&suffix)
        .tempfile_in(dir)?;
    Ok(file.into_temp_path())
}
