use thiserror::Error;

/// Argument problems; all of them end with the usage text and a non-zero exit
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Only give one of --safedir or --granuledir. The --granuledir is only required for multi-tile zipfiles in the old ESA format")]
    SafeAndGranule,

    #[error("Give either a raw input (--safedir/--granuledir) or a prebuilt --toa with --anglesfile, not both")]
    RawAndPrebuilt,

    #[error("No input given: use --safedir, --granuledir, or both --toa and --anglesfile")]
    NoInput,

    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },

    #[error("Output directory does not exist: {dir}")]
    MissingOutputDir { dir: String },
}
