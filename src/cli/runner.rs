use std::path::{Path, PathBuf};

use clap::CommandFactory;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sen2prep::api::{Tools, process_to_path};
use sen2prep::{ArchiveInput, DetectionConfig, PipelineInput, RasterCreation};

use super::args::CliArgs;
use super::errors::AppError;

/// Work out the input mode. Raw and prebuilt inputs are mutually exclusive.
fn resolve_input(args: &CliArgs) -> Result<PipelineInput, AppError> {
    let raw = match (&args.safedir, &args.granuledir) {
        (Some(_), Some(_)) => return Err(AppError::SafeAndGranule),
        (Some(safe), None) => Some(ArchiveInput::Safe(safe.clone())),
        (None, Some(granule)) => Some(ArchiveInput::Granule(granule.clone())),
        (None, None) => None,
    };
    let prebuilt_given = args.toa.is_some() || args.anglesfile.is_some();

    match (raw, &args.toa, &args.anglesfile) {
        (Some(_), _, _) if prebuilt_given => Err(AppError::RawAndPrebuilt),
        (Some(archive), _, _) => Ok(PipelineInput::Archive(archive)),
        (None, Some(toa), Some(angles)) => Ok(PipelineInput::Prebuilt {
            toa: toa.clone(),
            angles: angles.clone(),
        }),
        (None, _, _) => Err(AppError::NoInput),
    }
}

fn resolve_output(args: &CliArgs) -> Result<PathBuf, AppError> {
    let output = args.output.clone().ok_or(AppError::MissingArgument {
        arg: "--output".to_string(),
    })?;
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.is_dir() {
            return Err(AppError::MissingOutputDir {
                dir: dir.display().to_string(),
            });
        }
    }
    Ok(output)
}

fn default_extension(driver: &str) -> &'static str {
    match driver.to_ascii_uppercase().as_str() {
        "GTIFF" | "COG" => "tif",
        "KEA" => "kea",
        "ENVI" => "bsq",
        _ => "img",
    }
}

/// Config file (or defaults) with explicit flags applied on top
fn build_config(args: &CliArgs) -> Result<DetectionConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => DetectionConfig::from_json_file(path)?,
        None => DetectionConfig::default(),
    };

    if let Some(v) = args.pixsize {
        config.pixel_size = v;
    }
    if let Some(dir) = &args.tempdir {
        config.temp_dir = dir.clone();
    }
    if let Some(v) = args.mincloudsize {
        config.min_cloud_size = v;
    }
    if let Some(v) = args.cloudbufferdistance {
        config.cloud_buffer_distance = v;
    }
    if let Some(v) = args.shadowbufferdistance {
        config.shadow_buffer_distance = v;
    }
    // Percentage on the command line, fraction in the config
    if let Some(v) = args.cloudprobthreshold {
        config.cloud_prob_threshold = v / 100.0;
    }
    if let Some(v) = args.nirsnowthreshold {
        config.nir_snow_threshold = v;
    }
    if let Some(v) = args.greensnowthreshold {
        config.green_snow_threshold = v;
    }
    config.verbose |= args.verbose;
    config.keep_intermediates |= args.keepintermediates;
    config.parallax_test |= args.parallaxtest;

    if let Some(driver) = &args.driver {
        config.creation = RasterCreation {
            driver: driver.clone(),
            extension: default_extension(driver).to_string(),
            options: Vec::new(),
        };
    }
    if !args.creation_options.is_empty() {
        config.creation.options = args.creation_options.clone();
    }

    config.validate()?;
    Ok(config)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn usage_error(e: AppError) -> Box<dyn std::error::Error> {
    let _ = CliArgs::command().print_help();
    eprintln!();
    e.into()
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let input = resolve_input(&args).map_err(usage_error)?;
    let output = resolve_output(&args).map_err(usage_error)?;
    let detector = args.detector.clone().ok_or_else(|| {
        usage_error(AppError::MissingArgument {
            arg: "--detector".to_string(),
        })
    })?;

    let config = build_config(&args)?;
    init_logging(config.verbose);

    let tools = Tools::discover(&detector, args.angles_cmd.as_deref())?;
    let report = process_to_path(&input, &output, &tools, config)?;

    if let Some(path) = &args.report {
        report.write_json(path)?;
        info!("Run report written: {:?}", path);
    }
    for kept in &report.retained {
        info!("Kept intermediate: {:?}", kept);
    }
    info!(
        "Successfully processed: {} -> {:?}",
        describe(&input),
        report.mask
    );
    Ok(())
}

fn describe(input: &PipelineInput) -> String {
    fn show(p: &Path) -> String {
        p.display().to_string()
    }
    match input {
        PipelineInput::Archive(ArchiveInput::Safe(p)) => show(p),
        PipelineInput::Archive(ArchiveInput::Granule(p)) => show(p),
        PipelineInput::Prebuilt { toa, .. } => show(toa),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("sen2prep").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn safe_mode() {
        let args = parse(&["--safedir", "S2A.SAFE", "-o", "cloud.img"]);
        assert_eq!(
            resolve_input(&args).unwrap(),
            PipelineInput::Archive(ArchiveInput::Safe("S2A.SAFE".into()))
        );
    }

    #[test]
    fn prebuilt_mode_needs_both_files() {
        let args = parse(&["-a", "toa.img", "-z", "angles.img", "-o", "cloud.img"]);
        assert_eq!(
            resolve_input(&args).unwrap(),
            PipelineInput::Prebuilt {
                toa: "toa.img".into(),
                angles: "angles.img".into()
            }
        );
        let args = parse(&["-a", "toa.img", "-o", "cloud.img"]);
        assert!(matches!(resolve_input(&args), Err(AppError::NoInput)));
    }

    #[test]
    fn conflicting_modes_are_rejected() {
        let args = parse(&["--safedir", "a.SAFE", "--granuledir", "g", "-o", "m.img"]);
        assert!(matches!(resolve_input(&args), Err(AppError::SafeAndGranule)));

        let args = parse(&[
            "--granuledir",
            "g",
            "--toa",
            "toa.img",
            "--anglesfile",
            "angles.img",
            "-o",
            "m.img",
        ]);
        assert!(matches!(resolve_input(&args), Err(AppError::RawAndPrebuilt)));
    }

    #[test]
    fn output_is_required() {
        let args = parse(&["--safedir", "a.SAFE"]);
        assert!(matches!(
            resolve_output(&args),
            Err(AppError::MissingArgument { .. })
        ));
        let args = parse(&["--safedir", "a.SAFE", "-o", "/no/such/dir/m.img"]);
        assert!(matches!(
            resolve_output(&args),
            Err(AppError::MissingOutputDir { .. })
        ));
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "--safedir",
            "a.SAFE",
            "-o",
            "m.img",
            "--pixsize",
            "10",
            "--cloudprobthreshold",
            "35",
            "--driver",
            "GTiff",
            "--co",
            "COMPRESS=DEFLATE",
            "-k",
        ]);
        let cfg = build_config(&args).unwrap();
        assert_eq!(cfg.pixel_size, 10.0);
        assert!((cfg.cloud_prob_threshold - 0.35).abs() < 1e-12);
        assert_eq!(cfg.creation.driver, "GTiff");
        assert_eq!(cfg.creation.extension, "tif");
        assert_eq!(cfg.creation.options, ["COMPRESS=DEFLATE"]);
        assert!(cfg.keep_intermediates);
        assert_eq!(cfg.shadow_buffer_distance, 300.0);
    }

    #[test]
    fn config_file_is_layered_under_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"pixel_size": 60.0, "min_cloud_size": 8}"#).unwrap();
        let args = parse(&[
            "--safedir",
            "a.SAFE",
            "-o",
            "m.img",
            "--config",
            path.to_str().unwrap(),
            "--mincloudsize",
            "2",
        ]);
        let cfg = build_config(&args).unwrap();
        assert_eq!(cfg.pixel_size, 60.0);
        assert_eq!(cfg.min_cloud_size, 2);
    }

    #[test]
    fn out_of_range_threshold_fails_validation() {
        let args = parse(&["--safedir", "a.SAFE", "-o", "m.img", "--nirsnowthreshold", "1.5"]);
        assert!(build_config(&args).is_err());
    }
}
