//! The external fetch engine seam.
//!
//! Content extraction, transcoding and tagging are delegated to an external
//! engine that is consumed through one narrow capability: "fetch this playlist
//! into this directory with these options". A metadata-only probe is offered
//! alongside it so album names can be derived for untitled entries.
//!
//! [`YtDlpEngine`] is the production implementation. Tests substitute their
//! own [`FetchEngine`].

mod error;
mod options;
mod ytdlp;

pub use error::FetchError;
pub use options::{
    DEFAULT_ENGINE_RETRIES, DEFAULT_FILE_TEMPLATE, DEFAULT_FORMAT, DEFAULT_FRAGMENT_RETRIES,
    DEFAULT_SOCKET_TIMEOUT, FetchOptions, MetadataOverrides,
};
pub use ytdlp::{DEFAULT_PROGRAM, ProgressParser, YtDlpEngine, build_fetch_args};

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedSender;

/// Playlist-level metadata returned by a probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlaylistProbe {
    /// Playlist title.
    #[serde(default)]
    pub title: Option<String>,
    /// Uploader display name.
    #[serde(default)]
    pub uploader: Option<String>,
    /// Channel name.
    #[serde(default)]
    pub channel: Option<String>,
    /// Uploader handle or id.
    #[serde(default)]
    pub uploader_id: Option<String>,
}

impl PlaylistProbe {
    /// Best-effort owner name: uploader, then channel, then uploader id.
    #[must_use]
    pub fn owner(&self) -> &str {
        [&self.uploader, &self.channel, &self.uploader_id]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or_default()
    }

    /// Playlist title, or an empty string.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_deref().map(str::trim).unwrap_or_default()
    }
}

/// Progress reported by the engine while a playlist is processed.
///
/// Events are observational: they are logged and never gate control flow.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    /// An item of the playlist was picked up.
    Queued {
        /// 1-based position of the item.
        index: u32,
        /// Number of items in the playlist.
        total: u32,
    },
    /// Download progress for the current item.
    Downloading {
        /// File being written.
        filename: String,
        /// Completion in percent.
        percent: f32,
        /// Engine's estimate of the remaining time.
        eta: Option<String>,
    },
    /// The item was downloaded and handed to conversion.
    Finished {
        /// Converted output file.
        filename: String,
    },
    /// The item is already recorded in the dedupe ledger.
    AlreadyArchived {
        /// Engine's description of the item.
        item: String,
    },
    /// The engine reported an error for an item.
    Error {
        /// Engine error text.
        message: String,
    },
}

impl fmt::Display for FetchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued { index, total } => write!(f, "queued item {index}/{total}"),
            Self::Downloading {
                filename,
                percent,
                eta,
            } => write!(
                f,
                "downloading {filename} {percent:.1}% (ETA {})",
                eta.as_deref().unwrap_or("?")
            ),
            Self::Finished { filename } => write!(f, "downloaded {filename}, converting"),
            Self::AlreadyArchived { item } => write!(f, "already archived: {item}"),
            Self::Error { message } => write!(f, "error: {message}"),
        }
    }
}

/// A remote media fetch/convert/tag engine.
///
/// Implementations must honour the dedupe ledger in [`FetchOptions::ledger_path`]:
/// items recorded there are skipped, newly fetched items are appended.
#[async_trait]
pub trait FetchEngine: Send + Sync {
    /// Reads playlist-level metadata without downloading anything.
    async fn probe(&self, url: &str) -> Result<PlaylistProbe, FetchError>;

    /// Fetches, converts and tags every item of the playlist.
    ///
    /// Progress is sent on `events`; a closed receiver must not fail the fetch.
    async fn fetch(
        &self,
        options: &FetchOptions,
        events: UnboundedSender<FetchEvent>,
    ) -> Result<(), FetchError>;
}
