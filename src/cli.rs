//! Command line interface built with clap.
//!
//! [`Cli`] carries the global flags; [`Command`] selects between running the
//! pool and printing the resolved configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::RunnerConfig;

/// looprun — run a command repeatedly from a pool of workers.
#[derive(Debug, Parser)]
#[command(name = "looprun", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TOML config file (default: ./looprun.toml if present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the workers and run until Ctrl+C.
    Run(RunArgs),

    /// Print the resolved configuration as TOML.
    Config,
}

#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Number of concurrent workers.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Pause after each attempt, in milliseconds.
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Seconds between throughput snapshots.
    #[arg(long)]
    pub report_secs: Option<u64>,

    /// Command to run for each attempt.
    #[arg(long)]
    pub exe: Option<PathBuf>,

    /// Print the final summary as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Arguments passed to the command.
    #[arg(last = true)]
    pub args: Vec<String>,
}

impl RunArgs {
    /// Overlays the flags that were given onto `config`.
    pub fn apply(&self, config: &mut RunnerConfig) {
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(delay) = self.delay_ms {
            config.delay_ms = delay;
        }
        if let Some(secs) = self.report_secs {
            config.report_interval_secs = secs;
        }
        if let Some(exe) = &self.exe {
            config.executable = exe.clone();
        }
        if !self.args.is_empty() {
            config.args = self.args.clone();
        }
    }
}
