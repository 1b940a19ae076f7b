//! Fixed-size pool of workers that run attempts until cancelled.
//!
//! Cancellation is cooperative: a worker checks the token only before
//! starting an attempt, so an attempt that has begun always runs to
//! completion. The pause between attempts ends early on cancellation.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::attempt::Attempt;
use crate::stats::{Snapshot, Stats};
use crate::ui::RunnerUi;

pub struct WorkerPool<A> {
    attempt: Arc<A>,
    stats: Arc<Stats>,
    ui: RunnerUi,
    workers: usize,
    delay: Duration,
    stagger: Duration,
}

impl<A> WorkerPool<A>
where
    A: Attempt + 'static,
{
    pub fn new(attempt: A, stats: Arc<Stats>, ui: RunnerUi, workers: usize) -> Self {
        Self {
            attempt: Arc::new(attempt),
            stats,
            ui,
            workers,
            delay: Duration::ZERO,
            stagger: Duration::ZERO,
        }
    }

    /// Pause after each attempt.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Gap between starting consecutive workers.
    pub fn with_stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    /// Starts the workers and waits until every one of them has returned.
    pub async fn run(&self, token: CancellationToken) -> Snapshot {
        let mut set = JoinSet::new();

        for id in 0..self.workers {
            if id > 0 && !self.stagger.is_zero() {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = sleep(self.stagger) => {}
                }
            }
            set.spawn(worker_loop(
                id,
                Arc::clone(&self.attempt),
                Arc::clone(&self.stats),
                self.ui.clone(),
                self.delay,
                token.clone(),
            ));
        }
        info!(workers = set.len(), "workers started");

        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "worker task ended abnormally");
            }
        }

        let snap = self.stats.snapshot();
        info!(total = snap.total, success = snap.success, fail = snap.fail, "all workers stopped");
        snap
    }
}

async fn worker_loop<A: Attempt>(
    id: usize,
    attempt: Arc<A>,
    stats: Arc<Stats>,
    ui: RunnerUi,
    delay: Duration,
    token: CancellationToken,
) {
    debug!(worker = id, "worker started");
    loop {
        if token.is_cancelled() {
            break;
        }

        let result = attempt.run().await;
        stats.record(&result);
        ui.print_attempt(id, &result);
        debug!(worker = id, outcome = %result, "attempt recorded");

        tokio::select! {
            _ = token.cancelled() => {}
            _ = sleep(delay) => {}
        }
    }
    debug!(worker = id, "worker stopped");
}
