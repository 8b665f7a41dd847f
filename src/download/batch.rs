//! Sequential batch runs over parsed entries.

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::orchestrator::{DownloadOrchestrator, JobOutcome};
use crate::parser::PlaylistRequest;

/// Tally of one batch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    done: usize,
    failed: usize,
    skipped: usize,
}

impl BatchStats {
    /// Jobs that finished.
    #[must_use]
    pub fn done(&self) -> usize {
        self.done
    }

    /// Jobs that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Entries never attempted because the run was cancelled.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Entries attempted (done + failed).
    #[must_use]
    pub fn total(&self) -> usize {
        self.done + self.failed
    }

    fn record(&mut self, outcome: &JobOutcome) {
        if outcome.is_done() {
            self.done += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Runs requests one at a time, in order, past failures.
#[derive(Debug)]
pub struct BatchRunner {
    orchestrator: DownloadOrchestrator,
}

impl BatchRunner {
    /// Creates a runner around an orchestrator.
    #[must_use]
    pub fn new(orchestrator: DownloadOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Processes every request in order. Failed jobs do not stop the batch.
    pub async fn run(&self, requests: &[PlaylistRequest]) -> BatchStats {
        self.run_cancellable(requests, &CancellationToken::new()).await
    }

    /// Like [`run`](Self::run), but stops starting new jobs once `cancel` fires.
    ///
    /// A job that is already running is allowed to finish.
    #[instrument(skip(self, requests, cancel), fields(total = requests.len()))]
    pub async fn run_cancellable(
        &self,
        requests: &[PlaylistRequest],
        cancel: &CancellationToken,
    ) -> BatchStats {
        let total = requests.len();
        let mut stats = BatchStats::default();

        for (i, request) in requests.iter().enumerate() {
            if cancel.is_cancelled() {
                stats.skipped = total - i;
                warn!(remaining = stats.skipped, "batch cancelled, remaining entries skipped");
                break;
            }
            info!(url = %request.url(), "Processing playlist {}/{total}", i + 1);
            let outcome = self.orchestrator.run(request).await;
            stats.record(&outcome);
        }

        info!(
            done = stats.done,
            failed = stats.failed,
            skipped = stats.skipped,
            "batch finished"
        );
        stats
    }
}
