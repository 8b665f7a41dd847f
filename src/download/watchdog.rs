//! Long-running watchdog mode.
//!
//! The watchdog re-reads the entries file every cycle, so edits take effect
//! without a restart, runs a batch over it and sleeps for the interval. Cycle
//! errors are logged and never end the loop; only the cancellation token does.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use super::batch::{BatchRunner, BatchStats};
use crate::parser::parse_entries_file;

/// What a single watchdog cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// A batch ran over the entries.
    Ran(BatchStats),
    /// The entries file had no usable lines.
    Empty,
    /// The cycle could not run.
    Errored(String),
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ran(stats) => write!(
                f,
                "{} done, {} failed, {} skipped",
                stats.done(),
                stats.failed(),
                stats.skipped()
            ),
            Self::Empty => f.write_str("no entries"),
            Self::Errored(message) => write!(f, "error: {message}"),
        }
    }
}

/// Repeats batch runs over an entries file until cancelled.
#[derive(Debug)]
pub struct WatchdogLoop {
    runner: BatchRunner,
}

impl WatchdogLoop {
    /// Creates a watchdog around a batch runner.
    #[must_use]
    pub fn new(runner: BatchRunner) -> Self {
        Self { runner }
    }

    /// Runs cycles every `interval` until `cancel` fires.
    ///
    /// Cancellation is observed between jobs and during the sleep; a job in
    /// flight is never interrupted. Returns the number of cycles started.
    #[instrument(
        skip(self, path, interval, cancel),
        fields(path = %path.display(), interval_secs = interval.as_secs())
    )]
    pub async fn run(&self, path: &Path, interval: Duration, cancel: &CancellationToken) -> u64 {
        info!("watchdog mode enabled");
        let mut cycles = 0u64;

        while !cancel.is_cancelled() {
            cycles += 1;
            let report = self.run_cycle(path, cancel).await;
            match &report {
                CycleReport::Ran(_) => info!(cycle = cycles, %report, "cycle complete"),
                CycleReport::Empty => warn!(cycle = cycles, "no playlists found, skipping cycle"),
                CycleReport::Errored(message) => {
                    error!(cycle = cycles, error = %message, "watchdog cycle failed");
                }
            }

            info!("sleeping {}s before next check", interval.as_secs());
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
            }
        }

        info!(cycles, "watchdog stopped");
        cycles
    }

    /// Runs one cycle: re-parse the file and run a batch over it.
    pub async fn run_cycle(&self, path: &Path, cancel: &CancellationToken) -> CycleReport {
        let requests = match parse_entries_file(path) {
            Ok(requests) => requests,
            Err(e) => return CycleReport::Errored(e.to_string()),
        };
        if requests.is_empty() {
            return CycleReport::Empty;
        }
        CycleReport::Ran(self.runner.run_cancellable(&requests, cancel).await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_report_display() {
        assert_eq!(CycleReport::Empty.to_string(), "no entries");
        assert_eq!(
            CycleReport::Errored("boom".to_string()).to_string(),
            "error: boom"
        );
        assert_eq!(
            CycleReport::Ran(BatchStats::default()).to_string(),
            "0 done, 0 failed, 0 skipped"
        );
    }
}
