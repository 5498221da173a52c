//! Info command implementation

use crate::cli::logging::log;
use crate::cli::{InfoArgs, LogLevel, OutputFormat};
use crate::config::TrainSpec;

pub fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let spec =
        TrainSpec::from_yaml_file(&args.config).map_err(|e| format!("Config error: {e}"))?;

    match args.format {
        OutputFormat::Text => {
            log(level, LogLevel::Normal, "Configuration:");
            println!();
            println!("Index file: {}", spec.data.index_file.display());
            println!("Cutout dir: {}", spec.data.cutout_dir.display());
            println!(
                "Sampling: {}:{} positive:negative, validation stride {}",
                spec.data.ratio.positive, spec.data.ratio.negative, spec.data.validation_stride
            );
            println!(
                "Model: {} blocks, {} conv channels, dropout {}, cutout {:?}",
                spec.model.n_blocks,
                spec.model.conv_channels,
                spec.model.dropout,
                spec.model.cutout_shape
            );
            println!(
                "Optimizer: {:?} (lr={})",
                spec.optimizer.name, spec.optimizer.lr
            );
            if let Some(sched) = &spec.scheduler {
                println!(
                    "Scheduler: step decay, gamma {} every {} epochs",
                    sched.gamma, sched.step_size
                );
            }
            println!("Epochs: {}", spec.training.epochs);
            println!("Batch size: {}", spec.data.batch_size);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&spec)
                .map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = spec
                .to_yaml()
                .map_err(|e| format!("YAML serialization error: {e}"))?;
            println!("{yaml}");
        }
    }

    Ok(())
}
