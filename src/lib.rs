//! Playlist Archiver Core Library
//!
//! This library provides the download orchestration engine behind the
//! `playlist-archiver` tool, which batch-downloads remote media playlists
//! into local audio files with uniform album metadata.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Process-wide configuration, validated once at startup
//! - [`parser`] - Entries-file parsing into ordered playlist requests
//! - [`fetch`] - The external fetch engine seam and its yt-dlp adapter
//! - [`download`] - Retry policy, rate limiting, dedupe ledger, metadata policy,
//!   per-job orchestration, batch runs and the watchdog loop
//! - [`maintenance`] - Album tag cleanup and loudness normalization helpers

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod fetch;
pub mod maintenance;
pub mod parser;

// Re-export commonly used types
pub use config::{Config, ConfigError, Quality};
pub use download::{
    BatchRunner, BatchStats, CycleReport, DedupeLedger, DownloadOrchestrator, FailureType,
    JobOutcome, MetadataPolicy, RateLimiter, ResolvedJob, RetryDecision, RetryError, RetryPolicy,
    WatchdogLoop, classify_error,
};
pub use fetch::{FetchEngine, FetchError, FetchEvent, FetchOptions, PlaylistProbe, YtDlpEngine};
pub use parser::{ParseError, PlaylistRequest, parse_entries, parse_entries_file};
