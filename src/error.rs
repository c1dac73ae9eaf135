//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, GDAL, XML and JSON errors, and provides semantic variants
//! for archive discovery, missing bands, the external toolchain and grid checks.
use thiserror::Error;

use crate::types::BandId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] crate::io::GdalError),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Archive layout error: {0}")]
    ArchiveLayout(String),

    #[error("Missing input band {band}: {detail}")]
    MissingInput { band: BandId, detail: String },

    #[error("Toolchain error: {0}")]
    Toolchain(String),

    #[error("Grid mismatch: {0}")]
    GridMismatch(String),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("External error: {0}")]
    External(String),
}

