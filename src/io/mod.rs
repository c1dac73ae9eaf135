//! I/O layer: locating files inside the L1C archive layout, reading granule
//! metadata, inspecting rasters through GDAL and driving the external tools.
pub mod archive;
pub use archive::{ArchiveInput, locate_granule, locate_metadata};

pub mod gdal;
pub use self::gdal::{GdalError, GdalRasterInfo};

pub mod metadata;
pub use metadata::{GranuleInfo, read_granule_info};

pub mod toolchain;
pub use toolchain::{GdalToolchain, RasterCreation, RasterEngine};

pub mod external;
pub use external::{AnglesCommand, DetectorCommand};
