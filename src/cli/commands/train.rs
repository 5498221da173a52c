//! Train command implementation

use crate::cli::logging::log;
use crate::cli::{apply_overrides, LogLevel, TrainArgs};
use crate::config::{
    build_data_module, build_model, build_tracker, validate_spec, TrainSpec,
};
use crate::train::Trainer;

pub fn run_train(args: TrainArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Training from {}", args.config.display()),
    );

    let mut spec =
        TrainSpec::from_yaml_file(&args.config).map_err(|e| format!("Config error: {e}"))?;
    apply_overrides(&mut spec, &args);
    validate_spec(&spec, !args.dry_run).map_err(|e| format!("Config error: {e}"))?;

    if args.dry_run {
        log(level, LogLevel::Normal, "Dry run - config validated");
        log(
            level,
            LogLevel::Verbose,
            &format!(
                "  Model: {} blocks, {} conv channels, cutout {:?}",
                spec.model.n_blocks, spec.model.conv_channels, spec.model.cutout_shape
            ),
        );
        log(
            level,
            LogLevel::Verbose,
            &format!(
                "  Optimizer: {:?} (lr={})",
                spec.optimizer.name, spec.optimizer.lr
            ),
        );
        log(
            level,
            LogLevel::Verbose,
            &format!(
                "  Epochs: {}, batch size: {}",
                spec.training.epochs, spec.data.batch_size
            ),
        );
        return Ok(());
    }

    let data = build_data_module(&spec.data, spec.training.seed)
        .map_err(|e| format!("Data error: {e}"))?;
    let mut model = build_model(&spec).map_err(|e| format!("Model error: {e}"))?;
    let mut tracker =
        build_tracker(&spec.training, "luna16").map_err(|e| format!("Tracking error: {e}"))?;

    let trainer = Trainer::new("nodule-classification", spec.training.validation_cadence);
    let result = trainer
        .fit(&mut model, &data, spec.training.epochs, &mut tracker)
        .map_err(|e| format!("Training error: {e}"))?;

    log(
        level,
        LogLevel::Normal,
        &format!(
            "Training complete: {} epochs, final loss {:.4}, best loss {:.4} ({:.1}s)",
            result.final_epoch, result.final_loss, result.best_loss, result.elapsed_secs
        ),
    );
    if let Some(val) = result.best_val_loss {
        log(
            level,
            LogLevel::Verbose,
            &format!("  Best validation loss: {val:.4}"),
        );
    }
    Ok(())
}
