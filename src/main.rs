//! luna16 CLI
//!
//! Training entry point for the lung nodule classifier.
//!
//! # Usage
//!
//! ```bash
//! # Train from config
//! luna16 train config.yaml
//!
//! # Train with overrides
//! luna16 train config.yaml --epochs 10 --lr 0.001
//!
//! # Validate config
//! luna16 validate config.yaml
//!
//! # Show config info
//! luna16 info config.yaml --format yaml
//! ```

use clap::Parser;
use luna16::cli::{run_command, Cli};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "luna16=debug"
    } else if cli.quiet {
        "luna16=error"
    } else {
        "luna16=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with_target(false)
        .init();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
