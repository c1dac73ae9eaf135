use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sen2prep",
    version,
    about = "Stack a Sentinel-2 L1C granule, line up its angles and run cloud masking on it"
)]
pub struct CliArgs {
    /// Name of .SAFE directory, as unzipped from a standard ESA L1C zip file.
    /// Intermediate stacks of the input bands and the angles are made automatically,
    /// so --toa and --anglesfile are not needed
    #[arg(long)]
    pub safedir: Option<PathBuf>,

    /// Granule sub-directory within the .SAFE directory (<safedir>/GRANULE/<tile>).
    /// Alternative to --safedir for old ESA zipfiles holding multiple granules
    #[arg(long)]
    pub granuledir: Option<PathBuf>,

    /// Prebuilt stack of TOA reflectance. Only used without --safedir/--granuledir
    #[arg(short = 'a', long)]
    pub toa: Option<PathBuf>,

    /// Prebuilt angles file (satellite and sun azimuth and zenith). Only used
    /// without --safedir/--granuledir
    #[arg(short = 'z', long)]
    pub anglesfile: Option<PathBuf>,

    /// Output cloud mask
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Output pixel size in metres [default: 20]
    #[arg(long)]
    pub pixsize: Option<f64>,

    /// Keep intermediate temporary files (normally deleted)
    #[arg(short = 'k', long, default_value_t = false)]
    pub keepintermediates: bool,

    /// Temp directory to use [default: .]
    #[arg(short = 'e', long)]
    pub tempdir: Option<PathBuf>,

    /// JSON file with detection parameters; explicit flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write a JSON run report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Cloud detection program, called with the stack, angles and parameters
    #[arg(long)]
    pub detector: Option<String>,

    /// Angles program, called as `<prog> -i <MTD_TL.xml> -o <angles>`
    /// [default: fmask_sentinel2makeAnglesImage.py]
    #[arg(long)]
    pub angles_cmd: Option<String>,

    /// GDAL driver for the reflectance stack [default: HFA]
    #[arg(long)]
    pub driver: Option<String>,

    /// GDAL creation option for the stack (repeatable); replaces the defaults
    #[arg(long = "co")]
    pub creation_options: Vec<String>,

    /// Minimum cloud size (in pixels) to retain, before any buffering [default: 0]
    #[arg(long, help_heading = "Configurable parameters")]
    pub mincloudsize: Option<u32>,

    /// Distance (in metres) to buffer final cloud objects [default: 150]
    #[arg(long, help_heading = "Configurable parameters")]
    pub cloudbufferdistance: Option<f64>,

    /// Distance (in metres) to buffer final cloud shadow objects [default: 300]
    #[arg(long, help_heading = "Configurable parameters")]
    pub shadowbufferdistance: Option<f64>,

    /// Cloud probability threshold (percentage) [default: 20]. Increase to reduce
    /// commission errors, at the cost of more omission errors
    #[arg(long, help_heading = "Configurable parameters")]
    pub cloudprobthreshold: Option<f64>,

    /// Threshold for NIR reflectance (range [0-1]) for snow detection [default: 0.11]
    #[arg(long, help_heading = "Configurable parameters")]
    pub nirsnowthreshold: Option<f64>,

    /// Threshold for green reflectance (range [0-1]) for snow detection [default: 0.1]
    #[arg(long, help_heading = "Configurable parameters")]
    pub greensnowthreshold: Option<f64>,

    /// Turn on the parallax displacement test (Frantz, 2018)
    #[arg(long, default_value_t = false, help_heading = "Configurable parameters")]
    pub parallaxtest: bool,
}
