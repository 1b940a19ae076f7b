use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::attempt::{Attempt, ProcessAttempt};
use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::pool::WorkerPool;
use crate::reporter::run_reporter;
use crate::shutdown::wait_for_signal;
use crate::stats::{RunSummary, Stats};
use crate::ui::RunnerUi;

/// Checks that `exe` can be launched: a path must name an existing file, a
/// bare command name must resolve on `PATH`.
pub fn ensure_executable(exe: &Path) -> Result<(), RunnerError> {
    let is_path = exe.is_absolute() || exe.components().count() > 1;
    let found = if is_path {
        exe.is_file()
    } else {
        std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(exe).is_file()))
            .unwrap_or(false)
    };

    if found {
        Ok(())
    } else {
        Err(RunnerError::ExecutableNotFound(exe.to_path_buf()))
    }
}

/// Runs the configured command until Ctrl+C or SIGTERM, then returns the
/// final totals.
///
/// With `json` set, only the caller's final output reaches stdout.
pub async fn run(config: &RunnerConfig, json: bool) -> Result<RunSummary, RunnerError> {
    ensure_executable(&config.executable)?;

    let ui = if json {
        RunnerUi::quiet()
    } else {
        let ui = RunnerUi::default();
        println!("{}\n", ui.banner(config));
        ui
    };

    let token = CancellationToken::new();
    let signals = tokio::spawn(wait_for_signal(token.clone()));

    let summary = run_with(ProcessAttempt::from_config(config), config, ui, token.clone()).await;

    token.cancel();
    if let Err(e) = signals.await {
        warn!(error = %e, "signal task ended abnormally");
    }
    Ok(summary)
}

/// Drives `attempt` through the pool and the reporter until `token` is
/// cancelled and every worker has drained.
pub async fn run_with<A>(
    attempt: A,
    config: &RunnerConfig,
    ui: RunnerUi,
    token: CancellationToken,
) -> RunSummary
where
    A: Attempt + 'static,
{
    let run_id = Uuid::new_v4();
    let stats = Arc::new(Stats::new());
    info!(%run_id, workers = config.workers, delay_ms = config.delay_ms, "runner starting");

    let reporter = tokio::spawn(run_reporter(
        Arc::clone(&stats),
        ui.clone(),
        config.report_interval(),
        token.clone(),
    ));

    let pool = WorkerPool::new(attempt, Arc::clone(&stats), ui, config.workers)
        .with_delay(config.delay())
        .with_stagger(config.stagger());
    pool.run(token.clone()).await;

    // Workers may also stop on their own when there are none.
    token.cancel();
    if let Err(e) = reporter.await {
        warn!(error = %e, "reporter task ended abnormally");
    }

    let summary = RunSummary::new(run_id, &stats, config.workers);
    info!(%run_id, total = summary.total, success = summary.success, fail = summary.fail, "runner finished");
    summary
}
