//! Validate command implementation

use crate::cli::logging::log;
use crate::cli::{LogLevel, ValidateArgs};
use crate::config::{validate_spec, TrainSpec};

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    let spec =
        TrainSpec::from_yaml_file(&args.config).map_err(|e| format!("Config error: {e}"))?;
    validate_spec(&spec, args.check_paths).map_err(|e| format!("Validation error: {e}"))?;

    log(
        level,
        LogLevel::Normal,
        &format!("{} is valid", args.config.display()),
    );
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  ratio {}:{}, stride {}, {} epochs",
            spec.data.ratio.positive,
            spec.data.ratio.negative,
            spec.data.validation_stride,
            spec.training.epochs
        ),
    );
    Ok(())
}
