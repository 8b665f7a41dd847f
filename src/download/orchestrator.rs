//! Per-playlist job orchestration.
//!
//! [`DownloadOrchestrator::run`] drives one request end to end:
//!
//! ```text
//! Pending -> Resolving -> Downloading -> Converting -> Done
//!                 \             \             \
//!                  +-------------+-------------+-> Failed
//! ```
//!
//! Every error of a single job is logged and folded into
//! [`JobOutcome::Failed`]; nothing escapes to the batch. The rate limiter runs
//! after every job regardless of its outcome.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use super::ledger::DedupeLedger;
use super::metadata::{MetadataPolicy, ResolvedJob};
use super::rate_limiter::RateLimiter;
use super::retry::{RetryError, RetryPolicy};
use crate::config::{Config, Quality};
use crate::fetch::{FetchEngine, FetchError, FetchEvent, FetchOptions};
use crate::parser::PlaylistRequest;

/// Lifecycle of a single playlist job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Not started.
    Pending,
    /// Album metadata is being resolved.
    Resolving,
    /// The engine is downloading items.
    Downloading,
    /// The engine is converting and tagging a finished item.
    Converting,
    /// All items were processed.
    Done,
    /// The job failed; terminal for this batch pass.
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Resolving => "resolving",
            Self::Downloading => "downloading",
            Self::Converting => "converting",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Errors that fail a single job.
#[derive(Debug, Error)]
pub enum JobError {
    /// Destination or ledger directory could not be created.
    #[error("cannot create directory {path}: {source}")]
    Filesystem {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The fetch failed permanently or exhausted its retries.
    #[error("fetch failed: {0}")]
    Remote(#[from] RetryError),

    /// The fetch options were rejected before the engine ran.
    #[error("invalid fetch options: {0}")]
    InvalidOptions(#[source] FetchError),
}

/// Final result of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The engine finished the playlist.
    Done {
        /// Album directory the files went to.
        destination: PathBuf,
        /// Items downloaded during this run.
        fetched: u32,
        /// Items skipped because the ledger already listed them.
        archived: u32,
    },
    /// The job failed.
    Failed {
        /// Album directory, when resolution got that far.
        destination: Option<PathBuf>,
        /// Human-readable failure reason.
        reason: String,
    },
}

impl JobOutcome {
    /// Returns `true` for [`JobOutcome::Done`].
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }

    /// Album directory of the job, if one was resolved.
    #[must_use]
    pub fn destination(&self) -> Option<&Path> {
        match self {
            Self::Done { destination, .. } => Some(destination),
            Self::Failed { destination, .. } => destination.as_deref(),
        }
    }
}

/// Item counters gathered from engine events.
#[derive(Debug, Default)]
struct EventTally {
    fetched: u32,
    archived: u32,
}

/// Runs single playlist jobs against a fetch engine.
pub struct DownloadOrchestrator {
    engine: Arc<dyn FetchEngine>,
    metadata: MetadataPolicy,
    retry_policy: RetryPolicy,
    rate_limiter: RateLimiter,
    ledger: DedupeLedger,
    quality: Quality,
}

impl fmt::Debug for DownloadOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadOrchestrator")
            .field("retry_policy", &self.retry_policy)
            .field("rate_limiter", &self.rate_limiter)
            .field("ledger", &self.ledger)
            .field("quality", &self.quality)
            .finish_non_exhaustive()
    }
}

impl DownloadOrchestrator {
    /// Builds an orchestrator from the process configuration.
    ///
    /// The metadata probe and the fetch each get their own retry scope with
    /// the same bounds.
    #[must_use]
    pub fn new(config: &Config, engine: Arc<dyn FetchEngine>) -> Self {
        let retry_policy = RetryPolicy::from_config(config);
        let metadata =
            MetadataPolicy::new(Arc::clone(&engine), retry_policy.clone(), config.output_dir());
        Self {
            engine,
            metadata,
            retry_policy,
            rate_limiter: RateLimiter::new(config.rate_limit_enabled()),
            ledger: DedupeLedger::from_config(config),
            quality: config.quality(),
        }
    }

    /// Replaces the rate limiter.
    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// The ledger handed to the engine.
    #[must_use]
    pub fn ledger(&self) -> &DedupeLedger {
        &self.ledger
    }

    /// Processes one request. Never fails; errors become [`JobOutcome::Failed`].
    #[instrument(skip(self, request), fields(url = %request.url()))]
    pub async fn run(&self, request: &PlaylistRequest) -> JobOutcome {
        debug!(state = %JobState::Pending, "job accepted");
        debug!(state = %JobState::Resolving, "resolving album metadata");
        let job = self.metadata.resolve(request).await;

        let outcome = match self.execute(&job).await {
            Ok(tally) => {
                info!(
                    state = %JobState::Done,
                    album = %job.safe_album(),
                    fetched = tally.fetched,
                    archived = tally.archived,
                    "playlist complete"
                );
                JobOutcome::Done {
                    destination: job.destination().to_path_buf(),
                    fetched: tally.fetched,
                    archived: tally.archived,
                }
            }
            Err(e) => {
                error!(
                    state = %JobState::Failed,
                    url = %job.url(),
                    album = %job.safe_album(),
                    error = %e,
                    "playlist failed"
                );
                JobOutcome::Failed {
                    destination: Some(job.destination().to_path_buf()),
                    reason: e.to_string(),
                }
            }
        };

        self.rate_limiter.throttle().await;
        outcome
    }

    async fn execute(&self, job: &ResolvedJob) -> Result<EventTally, JobError> {
        let destination = job.destination();
        tokio::fs::create_dir_all(destination)
            .await
            .map_err(|source| JobError::Filesystem {
                path: destination.to_path_buf(),
                source,
            })?;
        self.ledger
            .prepare()
            .await
            .map_err(|source| JobError::Filesystem {
                path: self.ledger.path().to_path_buf(),
                source,
            })?;

        let options = FetchOptions::new(
            job.url(),
            destination,
            self.ledger.path(),
            self.quality,
            job.overrides(),
        )
        .map_err(JobError::InvalidOptions)?;

        info!(
            album = %job.safe_album(),
            artist = %job.album_artist(),
            destination = %destination.display(),
            "downloading playlist"
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let fetch = async move {
            let result = self
                .retry_policy
                .execute("fetch", || self.engine.fetch(&options, tx.clone()))
                .await;
            drop(tx);
            result
        };
        let (result, tally) = tokio::join!(fetch, forward_events(rx));
        result?;
        Ok(tally)
    }
}

/// Logs engine events until every sender is gone.
async fn forward_events(mut rx: mpsc::UnboundedReceiver<FetchEvent>) -> EventTally {
    let mut tally = EventTally::default();
    let mut state = JobState::Downloading;

    while let Some(event) = rx.recv().await {
        match &event {
            FetchEvent::Queued { index, total } => {
                state = JobState::Downloading;
                info!(index, total, "fetching item");
            }
            FetchEvent::Downloading { percent, .. } => {
                state = JobState::Downloading;
                debug!(percent, "{event}");
            }
            FetchEvent::Finished { filename } => {
                tally.fetched += 1;
                state = JobState::Converting;
                info!(file = %filename, %state, "download finished, converting");
            }
            FetchEvent::AlreadyArchived { item } => {
                tally.archived += 1;
                debug!(item = %item, "skipping archived item");
            }
            FetchEvent::Error { message } => {
                warn!(%state, message = %message, "engine reported an error");
            }
        }
    }
    tally
}
