use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::stats::Stats;
use crate::ui::RunnerUi;

/// Prints a throughput snapshot every `every` until cancelled.
///
/// Read-only with respect to the counters. Returns the number of snapshots
/// emitted.
pub async fn run_reporter(
    stats: Arc<Stats>,
    ui: RunnerUi,
    every: Duration,
    token: CancellationToken,
) -> usize {
    let mut ticker = interval_at(Instant::now() + every, every);
    let mut emitted = 0;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let snap = stats.snapshot();
                ui.print_snapshot(&snap);
                info!(
                    total = snap.total,
                    success = snap.success,
                    fail = snap.fail,
                    rate_per_min = snap.rate_per_min,
                    "throughput"
                );
                emitted += 1;
            }
        }
    }
    emitted
}
