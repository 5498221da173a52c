//! CLI command handlers and argument types.

mod args;
mod commands;
mod logging;

pub use args::{
    apply_overrides, parse_args, Cli, Command, InfoArgs, OutputFormat, TrainArgs, ValidateArgs,
};
pub use commands::run_command;
pub use logging::LogLevel;
