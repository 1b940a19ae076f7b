//! Runner configuration loaded from `looprun.toml`.
//!
//! [`RunnerConfig`] holds every tunable of a run. Values missing from the
//! file fall back to defaults. `LOOPRUN_EXECUTABLE` overrides the executable
//! from the file, and CLI flags override both.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::RunnerError;

/// Default config file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "looprun.toml";

/// Environment variable that overrides [`RunnerConfig::executable`].
pub const EXECUTABLE_ENV: &str = "LOOPRUN_EXECUTABLE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Number of concurrent workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Pause after each attempt, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Gap between starting consecutive workers, in milliseconds.
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,

    /// Seconds between throughput snapshots.
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,

    /// Command run once per attempt.
    #[serde(default = "default_executable")]
    pub executable: PathBuf,

    /// Arguments passed to the command.
    #[serde(default)]
    pub args: Vec<String>,

    /// Output substrings that mark an attempt as successful.
    #[serde(default = "default_success_markers")]
    pub success_markers: Vec<String>,

    /// Output substrings reported by name when an attempt fails.
    #[serde(default)]
    pub failure_markers: Vec<String>,
}

fn default_workers() -> usize {
    5
}

fn default_delay_ms() -> u64 {
    500
}

fn default_stagger_ms() -> u64 {
    100
}

fn default_report_interval_secs() -> u64 {
    10
}

fn default_executable() -> PathBuf {
    PathBuf::from("./attempt")
}

fn default_success_markers() -> Vec<String> {
    vec!["SUCCESS".to_string(), "✓".to_string()]
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            delay_ms: default_delay_ms(),
            stagger_ms: default_stagger_ms(),
            report_interval_secs: default_report_interval_secs(),
            executable: default_executable(),
            args: Vec::new(),
            success_markers: default_success_markers(),
            failure_markers: Vec::new(),
        }
    }
}

impl RunnerConfig {
    /// Loads the configuration from `path`, or from `looprun.toml` in the
    /// current directory when no path is given.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let p = Path::new(DEFAULT_CONFIG_FILE);
                if p.exists() {
                    Self::from_file(p)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_override(std::env::var(EXECUTABLE_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(RunnerError::from)?;
        let config = toml::from_str::<RunnerConfig>(&contents).map_err(RunnerError::from)?;
        Ok(config)
    }

    /// Replaces the executable with a non-empty environment value.
    pub fn apply_env_override(&mut self, value: Option<String>) {
        if let Some(exe) = value
            && !exe.is_empty()
        {
            self.executable = PathBuf::from(exe);
        }
    }

    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.report_interval_secs == 0 {
            return Err(RunnerError::Config(
                "report_interval_secs must be greater than zero".into(),
            ));
        }
        if self.executable.as_os_str().is_empty() {
            return Err(RunnerError::Config("executable must not be empty".into()));
        }
        Ok(())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }

    pub fn to_toml(&self) -> Result<String, RunnerError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
