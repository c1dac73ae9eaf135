//! Locating the granule, its metadata and its band files inside an L1C `.SAFE` layout.
//!
//! ```text
//! <root>.SAFE/GRANULE/L1C_<tile>_.../MTD_TL.xml
//!                                   /IMG_DATA/*_B01.jp2 ... *_B12.jp2
//! ```
//!
//! Discovery only reads the filesystem.
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::types::BandId;

pub const GRANULE_DIR: &str = "GRANULE";
pub const GRANULE_PATTERN: &str = "L1C_*";
pub const METADATA_FILE: &str = "MTD_TL.xml";
pub const IMAGE_DIR: &str = "IMG_DATA";

/// Where the scene comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveInput {
    /// Single-tile `.SAFE` directory; the granule is discovered
    Safe(PathBuf),
    /// Granule directory given directly (old multi-tile archives)
    Granule(PathBuf),
}

impl ArchiveInput {
    /// Resolve the granule directory for this input
    pub fn granule_dir(&self) -> Result<PathBuf> {
        match self {
            ArchiveInput::Safe(root) => locate_granule(root),
            ArchiveInput::Granule(dir) => {
                if !dir.is_dir() {
                    return Err(Error::ArchiveLayout(format!(
                        "granule directory {} does not exist",
                        dir.display()
                    )));
                }
                Ok(dir.clone())
            }
        }
    }
}

/// Expand `pattern` inside `dir`, sorted. Only the pattern part is interpreted;
/// `dir` is matched literally.
pub(crate) fn glob_in(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let base = dir.to_str().ok_or_else(|| Error::InvalidArgument {
        arg: "path",
        value: dir.to_string_lossy().into_owned(),
    })?;
    let full = Path::new(&glob::Pattern::escape(base)).join(pattern);
    let full = full.to_string_lossy();
    let mut found = Vec::new();
    for entry in glob::glob(&full)? {
        found.push(entry.map_err(|e| Error::Io(e.into_error()))?);
    }
    found.sort();
    Ok(found)
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Find the single `GRANULE/L1C_*` directory of a single-tile `.SAFE` archive
pub fn locate_granule(safe_dir: &Path) -> Result<PathBuf> {
    let collection = safe_dir.join(GRANULE_DIR);
    let candidates: Vec<PathBuf> = glob_in(&collection, GRANULE_PATTERN)?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect();
    match candidates.as_slice() {
        [] => Err(Error::ArchiveLayout(format!(
            "no granule found matching {}",
            collection.join(GRANULE_PATTERN).display()
        ))),
        [granule] => {
            info!("Found granule: {:?}", granule);
            Ok(granule.clone())
        }
        many => Err(Error::ArchiveLayout(format!(
            "ambiguous, multiple granules found: {}",
            join_paths(many)
        ))),
    }
}

/// Find the granule-level metadata XML: `MTD_TL.xml`, else the only `*.xml`
pub fn locate_metadata(granule_dir: &Path) -> Result<PathBuf> {
    let canonical = granule_dir.join(METADATA_FILE);
    if canonical.is_file() {
        info!("Found granule metadata: {:?}", canonical);
        return Ok(canonical);
    }
    // Old-format archives name the tile XML after the tile id
    let candidates: Vec<PathBuf> = glob_in(granule_dir, "*.xml")?
        .into_iter()
        .filter(|p| p.is_file())
        .collect();
    match candidates.as_slice() {
        [xml] => {
            info!("Found granule metadata (fallback): {:?}", xml);
            Ok(xml.clone())
        }
        [] => Err(Error::ArchiveLayout(format!(
            "unable to find XML file {}",
            canonical.display()
        ))),
        many => Err(Error::ArchiveLayout(format!(
            "unable to find XML file {}; multiple candidates: {}",
            canonical.display(),
            join_paths(many)
        ))),
    }
}

/// Find the single `IMG_DATA/*_<band>.jp2` file of a band
pub fn locate_band_source(granule_dir: &Path, band: BandId) -> Result<PathBuf> {
    let image_dir = granule_dir.join(IMAGE_DIR);
    let matches = glob_in(&image_dir, &format!("*_{}.jp2", band.as_str()))?;
    match matches.as_slice() {
        [source] => Ok(source.clone()),
        [] => Err(Error::MissingInput {
            band,
            detail: format!("no file matching *_{}.jp2 in {}", band, image_dir.display()),
        }),
        many => Err(Error::MissingInput {
            band,
            detail: format!("multiple matches: {}", join_paths(many)),
        }),
    }
}
