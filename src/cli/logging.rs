//! Console output gating for command results
//!
//! Commands print their results to stdout through [`log`]; diagnostics from
//! the training loop go through the `tracing` subscriber the binary installs.
//! The level is derived from the global `--quiet`/`--verbose` flags.

use super::args::Cli;

/// How much command output to print. Levels are ordered: each level prints
/// everything the levels below it would.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Print nothing, results included (`--quiet`)
    Quiet,
    /// Print command results (the default)
    Normal,
    /// Also print per-setting detail lines (`--verbose`)
    Verbose,
}

impl LogLevel {
    fn permits(self, required: LogLevel) -> bool {
        self != LogLevel::Quiet && self >= required
    }
}

impl From<&Cli> for LogLevel {
    fn from(cli: &Cli) -> Self {
        if cli.quiet {
            LogLevel::Quiet
        } else if cli.verbose {
            LogLevel::Verbose
        } else {
            LogLevel::Normal
        }
    }
}

/// Print `msg` when the active `level` reaches `required`
pub fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if level.permits(required) {
        println!("{msg}");
    }
}
