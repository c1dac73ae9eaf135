//! Command Line Interface (CLI) layer for sen2prep.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) that validates the input mode, builds
//! the configuration and calls into `sen2prep::api`.
//!
//! If you are embedding sen2prep into another application, prefer using
//! the high-level `sen2prep::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
