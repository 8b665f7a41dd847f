//! Download orchestration around the fetch engine.
//!
//! This module turns parsed [`PlaylistRequest`](crate::parser::PlaylistRequest)s
//! into fetched albums on disk, one job at a time.
//!
//! # Features
//!
//! - Transient/permanent failure classification with bounded linear backoff
//! - Optional randomized pause after each job
//! - A persistent dedupe ledger owned by the engine
//! - Album resolution from the entry or a metadata probe, with a safe fallback
//! - Per-job failure isolation, ordered batches and a cancellable watchdog
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use archiver_core::{BatchRunner, Config, DownloadOrchestrator, YtDlpEngine, parse_entries};
//!
//! # async fn example() {
//! let config = Config::new("/downloads");
//! let orchestrator = DownloadOrchestrator::new(&config, Arc::new(YtDlpEngine::default()));
//! let runner = BatchRunner::new(orchestrator);
//!
//! let requests = parse_entries("Road Trip|DJ|https://www.youtube.com/playlist?list=PL123");
//! let stats = runner.run(&requests).await;
//! println!("done: {}, failed: {}", stats.done(), stats.failed());
//! # }
//! ```

mod batch;
mod ledger;
mod metadata;
mod orchestrator;
pub mod rate_limiter;
mod retry;
mod watchdog;

pub use batch::{BatchRunner, BatchStats};
pub use ledger::DedupeLedger;
pub use metadata::{MetadataPolicy, ResolvedJob, UNKNOWN_PLAYLIST, sanitize_album};
pub use orchestrator::{DownloadOrchestrator, JobError, JobOutcome, JobState};
pub use rate_limiter::RateLimiter;
pub use retry::{
    FailureType, RetryDecision, RetryError, RetryPolicy, TRANSIENT_MARKERS, classify_error,
    classify_message,
};
pub use watchdog::{CycleReport, WatchdogLoop};
