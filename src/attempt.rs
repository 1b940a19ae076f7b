//! A single attempt and how its outcome is decided.
//!
//! The pool only knows the [`Attempt`] trait. [`ProcessAttempt`] is the
//! production implementation: it launches the configured command with a
//! proxy-free environment and classifies its combined output.

use std::ffi::OsString;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::config::RunnerConfig;
use crate::env::{current_sanitized_env, sanitized_env};

/// Outcome of one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptResult {
    Success,
    /// Clean exit without a success marker. `marker` names the flagged
    /// failure marker found in the output, if any.
    Failure { marker: Option<String> },
    /// The command could not be launched or did not exit cleanly.
    Error(String),
}

impl AttemptResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptResult::Success)
    }
}

impl fmt::Display for AttemptResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptResult::Success => write!(f, "SUCCESS"),
            AttemptResult::Failure { marker: None } => write!(f, "FAILED"),
            AttemptResult::Failure {
                marker: Some(marker),
            } => write!(f, "{}", marker.to_uppercase()),
            AttemptResult::Error(msg) => write!(f, "ERROR: {msg}"),
        }
    }
}

/// Anything the worker pool can run repeatedly.
pub trait Attempt: Send + Sync {
    fn run(&self) -> impl Future<Output = AttemptResult> + Send;
}

/// Substring rules applied to an attempt's combined output.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    pub success_markers: Vec<String>,
    pub failure_markers: Vec<String>,
}

impl Classifier {
    pub fn new(success_markers: Vec<String>, failure_markers: Vec<String>) -> Self {
        Self {
            success_markers,
            failure_markers,
        }
    }

    /// Decides the outcome. An unclean exit wins over any output marker,
    /// then success markers, then flagged failure markers.
    pub fn classify(&self, exit: Result<(), String>, output: &str) -> AttemptResult {
        if let Err(msg) = exit {
            return AttemptResult::Error(msg);
        }
        if self
            .success_markers
            .iter()
            .any(|m| !m.is_empty() && output.contains(m.as_str()))
        {
            return AttemptResult::Success;
        }
        let marker = self
            .failure_markers
            .iter()
            .find(|m| !m.is_empty() && output.contains(m.as_str()))
            .cloned();
        AttemptResult::Failure { marker }
    }
}

/// Maps an exit status to `Ok` for a zero exit code.
pub fn exit_check(status: ExitStatus) -> Result<(), String> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(format!("exit status {code}")),
        None => Err("terminated by signal".to_string()),
    }
}

/// Runs an external command once per attempt.
#[derive(Debug, Clone)]
pub struct ProcessAttempt {
    executable: PathBuf,
    args: Vec<String>,
    classifier: Classifier,
    // Base environment; the runner's own when unset.
    base_env: Option<Vec<(OsString, OsString)>>,
}

impl ProcessAttempt {
    pub fn new(executable: PathBuf, args: Vec<String>, classifier: Classifier) -> Self {
        Self {
            executable,
            args,
            classifier,
            base_env: None,
        }
    }

    /// Uses `vars` instead of the runner's environment as the base that
    /// proxy variables are stripped from.
    #[allow(dead_code)]
    pub fn with_base_env(mut self, vars: Vec<(OsString, OsString)>) -> Self {
        self.base_env = Some(vars);
        self
    }

    fn child_env(&self) -> Vec<(OsString, OsString)> {
        match &self.base_env {
            Some(vars) => sanitized_env(vars.iter().cloned()),
            None => current_sanitized_env(),
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(
            config.executable.clone(),
            config.args.clone(),
            Classifier::new(
                config.success_markers.clone(),
                config.failure_markers.clone(),
            ),
        )
    }
}

impl Attempt for ProcessAttempt {
    async fn run(&self) -> AttemptResult {
        let output = Command::new(&self.executable)
            .args(&self.args)
            .env_clear()
            .envs(self.child_env())
            .stdin(Stdio::null())
            .output()
            .await;

        let output = match output {
            Ok(o) => o,
            Err(e) => {
                return AttemptResult::Error(format!(
                    "failed to launch {}: {e}",
                    self.executable.display()
                ));
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        debug!(
            status = %output.status,
            bytes = combined.len(),
            "attempt finished"
        );

        self.classifier.classify(exit_check(output.status), &combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(
            vec!["SUCCESS".into(), "✓".into()],
            vec!["Cloudflare".into()],
        )
    }

    #[test]
    fn success_marker_wins() {
        let c = classifier();
        assert_eq!(c.classify(Ok(()), "step 1 ok\nSUCCESS\n"), AttemptResult::Success);
        assert_eq!(c.classify(Ok(()), "done ✓"), AttemptResult::Success);
    }

    #[test]
    fn flagged_marker_is_named() {
        let c = classifier();
        assert_eq!(
            c.classify(Ok(()), "blocked by Cloudflare"),
            AttemptResult::Failure {
                marker: Some("Cloudflare".into())
            }
        );
    }

    #[test]
    fn success_marker_beats_flagged_marker() {
        let c = classifier();
        assert_eq!(
            c.classify(Ok(()), "Cloudflare passed, SUCCESS"),
            AttemptResult::Success
        );
    }

    #[test]
    fn unmatched_output_is_plain_failure() {
        let c = classifier();
        assert_eq!(
            c.classify(Ok(()), "nothing useful"),
            AttemptResult::Failure { marker: None }
        );
    }

    #[test]
    fn unclean_exit_beats_success_marker() {
        let c = classifier();
        let result = c.classify(Err("exit status 2".into()), "SUCCESS");
        assert_eq!(result, AttemptResult::Error("exit status 2".into()));
        assert!(!result.is_success());
    }

    #[test]
    fn empty_markers_never_match() {
        let c = Classifier::new(vec![String::new()], vec![String::new()]);
        assert_eq!(
            c.classify(Ok(()), "anything"),
            AttemptResult::Failure { marker: None }
        );
    }

    #[test]
    fn display_labels() {
        assert_eq!(AttemptResult::Success.to_string(), "SUCCESS");
        assert_eq!(AttemptResult::Failure { marker: None }.to_string(), "FAILED");
        assert_eq!(
            AttemptResult::Failure {
                marker: Some("Cloudflare".into())
            }
            .to_string(),
            "CLOUDFLARE"
        );
        assert_eq!(
            AttemptResult::Error("exit status 1".into()).to_string(),
            "ERROR: exit status 1"
        );
    }

    #[cfg(unix)]
    fn sh(script: &str) -> ProcessAttempt {
        ProcessAttempt::new(
            PathBuf::from("/bin/sh"),
            vec!["-c".into(), script.into()],
            classifier(),
        )
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_success_from_stdout() {
        assert_eq!(sh("echo SUCCESS").run().await, AttemptResult::Success);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_output_includes_stderr() {
        assert_eq!(sh("echo SUCCESS 1>&2").run().await, AttemptResult::Success);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_nonzero_exit_is_error() {
        assert_eq!(
            sh("echo SUCCESS; exit 3").run().await,
            AttemptResult::Error("exit status 3".into())
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_launch_failure_is_error() {
        let attempt = ProcessAttempt::new(
            PathBuf::from("/definitely/not/here/attempt"),
            Vec::new(),
            classifier(),
        );
        match attempt.run().await {
            AttemptResult::Error(msg) => assert!(msg.contains("failed to launch")),
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_sees_no_proxy_variables() {
        let base = vec![
            (OsString::from("PATH"), OsString::from("/usr/bin:/bin")),
            (OsString::from("HTTPS_PROXY"), OsString::from("http://127.0.0.1:9")),
            (OsString::from("http_proxy"), OsString::from("http://127.0.0.1:9")),
            (OsString::from("RUN_LABEL"), OsString::from("nightly")),
        ];
        let attempt = sh(concat!(
            r#"if [ -z "$HTTPS_PROXY" ] && [ -z "$http_proxy" ] "#,
            r#"&& [ "$RUN_LABEL" = nightly ]; then echo SUCCESS; fi"#,
        ))
        .with_base_env(base);
        assert_eq!(attempt.run().await, AttemptResult::Success);
    }
}
