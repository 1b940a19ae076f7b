//! Aggregate counters shared by all workers.
//!
//! Only `success` and `fail` are stored. `total` is always derived from the
//! same pair of loads, so every [`Snapshot`] satisfies
//! `total == success + fail` even while workers are recording.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::attempt::AttemptResult;

#[derive(Debug)]
pub struct Stats {
    success: AtomicU64,
    fail: AtomicU64,
    started: Instant,
    started_at: DateTime<Utc>,
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub total: u64,
    pub success: u64,
    pub fail: u64,
    pub elapsed: Duration,
    pub rate_per_min: f64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    pub fn new() -> Self {
        Self {
            success: AtomicU64::new(0),
            fail: AtomicU64::new(0),
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Counts one attempt. Failures and errors both land in `fail`.
    pub fn record(&self, result: &AttemptResult) {
        if result.is_success() {
            self.success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.fail.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_at(self.started.elapsed())
    }

    pub fn snapshot_at(&self, elapsed: Duration) -> Snapshot {
        let success = self.success.load(Ordering::Relaxed);
        let fail = self.fail.load(Ordering::Relaxed);
        Snapshot {
            total: success + fail,
            success,
            fail,
            elapsed,
            rate_per_min: rate_per_min(success, elapsed),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Successes per minute over `elapsed`; zero when no time has passed.
pub fn rate_per_min(success: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    success as f64 / secs * 60.0
}

/// Final report printed when the runner stops.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub workers: usize,
    pub total: u64,
    pub success: u64,
    pub fail: u64,
    pub rate_per_min: f64,
    /// Percentage of successful attempts; absent when nothing ran.
    pub success_pct: Option<f64>,
}

impl RunSummary {
    pub fn new(run_id: Uuid, stats: &Stats, workers: usize) -> Self {
        let snap = stats.snapshot();
        let success_pct = (snap.total > 0).then(|| snap.success as f64 / snap.total as f64 * 100.0);
        Self {
            run_id,
            started_at: stats.started_at(),
            finished_at: Utc::now(),
            workers,
            total: snap.total,
            success: snap.success,
            fail: snap.fail,
            rate_per_min: snap.rate_per_min,
            success_pct,
        }
    }
}
