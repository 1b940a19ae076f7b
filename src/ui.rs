//! Terminal output for the runner: per-attempt lines, throughput snapshots
//! and the final summary, styled with `console`.

use std::time::Duration;

use console::Style;

use crate::attempt::AttemptResult;
use crate::config::RunnerConfig;
use crate::stats::{RunSummary, Snapshot};

/// Styled writer for everything the runner prints to stdout.
#[derive(Debug, Clone)]
pub struct RunnerUi {
    green: Style,
    red: Style,
    yellow: Style,
    cyan: Style,
    // Suppresses per-attempt and snapshot lines, e.g. for JSON output.
    quiet: bool,
}

impl Default for RunnerUi {
    fn default() -> Self {
        Self {
            quiet: false,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            cyan: Style::new().cyan().bold(),
        }
    }
}

impl RunnerUi {
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }

    pub fn banner(&self, config: &RunnerConfig) -> String {
        format!(
            "{}\nWorkers: {} | Delay: {}ms | Command: {}\n\nPress Ctrl+C to stop...",
            self.cyan.apply_to("=== looprun ==="),
            config.workers,
            config.delay_ms,
            config.executable.display(),
        )
    }

    pub fn attempt_line(&self, worker: usize, result: &AttemptResult) -> String {
        match result {
            AttemptResult::Success => format!("[W{worker}] {} {result}", self.green.apply_to("✓")),
            AttemptResult::Failure { .. } => {
                format!("[W{worker}] {} {result}", self.red.apply_to("✗"))
            }
            AttemptResult::Error(_) => {
                format!("[W{worker}] {} {result}", self.yellow.apply_to("✗"))
            }
        }
    }

    pub fn snapshot_line(&self, snap: &Snapshot) -> String {
        format!(
            "{} Total: {} | Success: {} | Failed: {} | Rate: {:.1}/min | {}",
            self.cyan.apply_to("[STATS]"),
            snap.total,
            snap.success,
            snap.fail,
            snap.rate_per_min,
            format_elapsed(snap.elapsed),
        )
    }

    pub fn summary_block(&self, summary: &RunSummary) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n", self.cyan.apply_to("========== FINAL ==========")));
        out.push_str(&format!("Total:   {}\n", summary.total));
        out.push_str(&format!("Success: {}\n", self.green.apply_to(summary.success)));
        out.push_str(&format!("Failed:  {}\n", self.red.apply_to(summary.fail)));
        if let Some(pct) = summary.success_pct {
            out.push_str(&format!("Rate:    {pct:.2}%\n"));
        }
        out.push_str("===========================");
        out
    }

    pub fn print_attempt(&self, worker: usize, result: &AttemptResult) {
        if self.quiet {
            return;
        }
        println!("{}", self.attempt_line(worker, result));
    }

    pub fn print_snapshot(&self, snap: &Snapshot) {
        if self.quiet {
            return;
        }
        println!("\n{}\n", self.snapshot_line(snap));
    }
}

/// Renders a duration rounded to whole seconds, e.g. `1h2m3s`, `45s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs() + u64::from(elapsed.subsec_millis() >= 500);
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, _) => format!("{m}m{s}s"),
        _ => format!("{h}h{m}m{s}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use console::strip_ansi_codes;
    use uuid::Uuid;

    use crate::stats::Stats;

    #[test]
    fn elapsed_formatting() {
        assert_eq!(format_elapsed(Duration::ZERO), "0s");
        assert_eq!(format_elapsed(Duration::from_millis(1_499)), "1s");
        assert_eq!(format_elapsed(Duration::from_millis(1_500)), "2s");
        assert_eq!(format_elapsed(Duration::from_secs(70)), "1m10s");
        assert_eq!(format_elapsed(Duration::from_secs(3_723)), "1h2m3s");
    }

    #[test]
    fn attempt_lines_carry_worker_and_label() {
        let ui = RunnerUi::default();
        let ok = ui.attempt_line(3, &AttemptResult::Success);
        assert_eq!(strip_ansi_codes(&ok), "[W3] ✓ SUCCESS");

        let flagged = ui.attempt_line(
            0,
            &AttemptResult::Failure {
                marker: Some("Cloudflare".into()),
            },
        );
        assert_eq!(strip_ansi_codes(&flagged), "[W0] ✗ CLOUDFLARE");

        let err = ui.attempt_line(1, &AttemptResult::Error("exit status 2".into()));
        assert_eq!(strip_ansi_codes(&err), "[W1] ✗ ERROR: exit status 2");
    }

    #[test]
    fn snapshot_line_contents() {
        let ui = RunnerUi::default();
        let snap = Snapshot {
            total: 10,
            success: 4,
            fail: 6,
            elapsed: Duration::from_secs(120),
            rate_per_min: 2.0,
        };
        assert_eq!(
            strip_ansi_codes(&ui.snapshot_line(&snap)),
            "[STATS] Total: 10 | Success: 4 | Failed: 6 | Rate: 2.0/min | 2m0s"
        );
    }

    #[test]
    fn summary_skips_rate_when_nothing_ran() {
        let ui = RunnerUi::default();
        let summary = RunSummary::new(Uuid::new_v4(), &Stats::new(), 0);
        let block = strip_ansi_codes(&ui.summary_block(&summary)).into_owned();
        assert!(block.contains("Total:   0"));
        assert!(!block.contains("Rate:"));
    }

    #[test]
    fn banner_mentions_settings() {
        let ui = RunnerUi::default();
        let banner = strip_ansi_codes(&ui.banner(&RunnerConfig::default())).into_owned();
        assert!(banner.contains("Workers: 5 | Delay: 500ms"));
        assert!(banner.contains("./attempt"));
    }

    #[test]
    fn quiet_ui_keeps_formatting() {
        let ui = RunnerUi::quiet();
        ui.print_attempt(0, &AttemptResult::Success);
        assert_eq!(strip_ansi_codes(&ui.attempt_line(0, &AttemptResult::Success)), "[W0] ✓ SUCCESS");
    }
}
