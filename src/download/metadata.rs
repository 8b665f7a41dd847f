//! Album metadata resolution for playlist jobs.
//!
//! Every job ends up with a filesystem-safe album name, used both as the
//! destination directory and as the forced album tag, plus an optional album
//! artist. Explicit entry values win; untitled entries are resolved by probing
//! the playlist, and fall back to [`UNKNOWN_PLAYLIST`] when the probe fails.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use super::retry::RetryPolicy;
use crate::fetch::{FetchEngine, MetadataOverrides};
use crate::parser::PlaylistRequest;

/// Album name used when nothing better is known.
pub const UNKNOWN_PLAYLIST: &str = "Unknown_Playlist";

/// Characters that cannot appear inside a single path component.
const PATH_SEPARATORS: [char; 3] = ['/', '\\', '\0'];

/// Makes an album name usable as one directory name.
///
/// Path separators become underscores and surrounding whitespace is trimmed.
/// Names that end up empty, or that consist only of dots, become
/// [`UNKNOWN_PLAYLIST`].
///
/// # Example
///
/// ```
/// use archiver_core::download::sanitize_album;
///
/// assert_eq!(sanitize_album("Rock/Pop"), "Rock_Pop");
/// assert_eq!(sanitize_album("  "), "Unknown_Playlist");
/// ```
#[must_use]
pub fn sanitize_album(raw: &str) -> String {
    let replaced = raw.replace(PATH_SEPARATORS, "_");
    let trimmed = replaced.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        UNKNOWN_PLAYLIST.to_string()
    } else {
        trimmed.to_string()
    }
}

/// A request with its metadata settled and its destination chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedJob {
    safe_album: String,
    album_artist: String,
    url: String,
    destination: PathBuf,
}

impl ResolvedJob {
    fn new(output_dir: &Path, safe_album: String, album_artist: String, url: &str) -> Self {
        let destination = output_dir.join(&safe_album);
        Self {
            safe_album,
            album_artist,
            url: url.to_string(),
            destination,
        }
    }

    /// Sanitized album name.
    #[must_use]
    pub fn safe_album(&self) -> &str {
        &self.safe_album
    }

    /// Album artist, possibly empty.
    #[must_use]
    pub fn album_artist(&self) -> &str {
        &self.album_artist
    }

    /// Source playlist URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Album directory under the output root.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Metadata forced onto every file of this job.
    #[must_use]
    pub fn overrides(&self) -> MetadataOverrides {
        MetadataOverrides::new(self.safe_album.clone(), self.album_artist.clone())
    }
}

/// Resolves album and album artist for each request.
#[derive(Clone)]
pub struct MetadataPolicy {
    engine: Arc<dyn FetchEngine>,
    retry_policy: RetryPolicy,
    output_dir: PathBuf,
}

impl std::fmt::Debug for MetadataPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataPolicy")
            .field("retry_policy", &self.retry_policy)
            .field("output_dir", &self.output_dir)
            .finish_non_exhaustive()
    }
}

impl MetadataPolicy {
    /// Creates a policy probing through `engine` with its own retry scope.
    #[must_use]
    pub fn new(
        engine: Arc<dyn FetchEngine>,
        retry_policy: RetryPolicy,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            retry_policy,
            output_dir: output_dir.into(),
        }
    }

    /// Resolves a request. Never fails: probe problems fall back to
    /// [`UNKNOWN_PLAYLIST`] with no artist, even when the entry named one.
    #[instrument(skip(self, request), fields(url = %request.url()))]
    pub async fn resolve(&self, request: &PlaylistRequest) -> ResolvedJob {
        if request.has_album() {
            let safe_album = sanitize_album(request.album());
            debug!(album = %safe_album, "using album from entry");
            return ResolvedJob::new(
                &self.output_dir,
                safe_album,
                request.album_artist().to_string(),
                request.url(),
            );
        }

        let url = request.url();
        match self
            .retry_policy
            .execute("metadata probe", || self.engine.probe(url))
            .await
        {
            Ok(probe) => {
                let safe_album = sanitize_album(probe.title());
                let album_artist = if request.album_artist().is_empty() {
                    probe.owner().to_string()
                } else {
                    request.album_artist().to_string()
                };
                debug!(album = %safe_album, artist = %album_artist, "album derived from probe");
                ResolvedJob::new(&self.output_dir, safe_album, album_artist, url)
            }
            Err(e) => {
                warn!(error = %e, "could not fetch playlist metadata, using fallback album");
                ResolvedJob::new(
                    &self.output_dir,
                    UNKNOWN_PLAYLIST.to_string(),
                    String::new(),
                    url,
                )
            }
        }
    }
}
