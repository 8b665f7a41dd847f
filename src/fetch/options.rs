//! Explicit per-job options for the fetch engine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Quality;

use super::FetchError;

/// Source format selector: best audio-only stream, falling back to best overall.
pub const DEFAULT_FORMAT: &str = "bestaudio/best";

/// Output file name template inside the album directory.
pub const DEFAULT_FILE_TEMPLATE: &str = "%(playlist_index)s - %(title)s.%(ext)s";

/// Socket timeout handed to the engine.
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_secs(30);

/// The engine's own per-request retry count.
pub const DEFAULT_ENGINE_RETRIES: u32 = 10;

/// The engine's own per-fragment retry count.
pub const DEFAULT_FRAGMENT_RETRIES: u32 = 10;

/// Metadata forced onto every output file of a job.
///
/// The engine derives the track number from each item's playlist index; the
/// album and album artist are literal values that replace whatever the source
/// embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataOverrides {
    album: String,
    album_artist: Option<String>,
}

impl MetadataOverrides {
    /// Creates overrides. An empty artist is treated as absent.
    #[must_use]
    pub fn new(album: impl Into<String>, album_artist: impl Into<String>) -> Self {
        let album_artist = album_artist.into();
        Self {
            album: album.into(),
            album_artist: (!album_artist.is_empty()).then_some(album_artist),
        }
    }

    /// Forced album value.
    #[must_use]
    pub fn album(&self) -> &str {
        &self.album
    }

    /// Forced album artist, if any.
    #[must_use]
    pub fn album_artist(&self) -> Option<&str> {
        self.album_artist.as_deref()
    }

    /// Renders the overrides as engine pre-processing directives.
    ///
    /// Each literal field is first materialized from the item id, then replaced
    /// wholesale, so the forced value wins whether or not the source had one.
    #[must_use]
    pub fn to_engine_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        push_literal_field(&mut args, "album", &self.album);
        if let Some(artist) = &self.album_artist {
            push_literal_field(&mut args, "album_artist", artist);
        }
        args.push("--parse-metadata".to_string());
        args.push("%(playlist_index)s:%(track_number)s".to_string());
        args
    }
}

fn push_literal_field(args: &mut Vec<String>, field: &str, value: &str) {
    args.push("--parse-metadata".to_string());
    args.push(format!("%(id)s:%({field})s"));
    args.push("--replace-in-metadata".to_string());
    args.push(field.to_string());
    args.push("^.*$".to_string());
    args.push(escape_replacement(value));
}

/// Escapes a literal for use as a regex replacement string.
fn escape_replacement(value: &str) -> String {
    value.replace('\\', r"\\")
}

/// Everything the engine needs to fetch, convert and tag one playlist.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    url: String,
    destination: PathBuf,
    ledger_path: PathBuf,
    quality: Quality,
    overrides: MetadataOverrides,
    format: String,
    file_template: String,
    socket_timeout: Duration,
    engine_retries: u32,
    fragment_retries: u32,
}

impl FetchOptions {
    /// Creates options with the standard format, template and timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidOptions`] if the URL or destination is empty.
    pub fn new(
        url: impl Into<String>,
        destination: impl Into<PathBuf>,
        ledger_path: impl Into<PathBuf>,
        quality: Quality,
        overrides: MetadataOverrides,
    ) -> Result<Self, FetchError> {
        let url = url.into();
        let destination = destination.into();
        if url.trim().is_empty() {
            return Err(FetchError::InvalidOptions {
                reason: "playlist URL is empty".to_string(),
            });
        }
        if destination.as_os_str().is_empty() {
            return Err(FetchError::InvalidOptions {
                reason: "destination directory is empty".to_string(),
            });
        }
        Ok(Self {
            url,
            destination,
            ledger_path: ledger_path.into(),
            quality,
            overrides,
            format: DEFAULT_FORMAT.to_string(),
            file_template: DEFAULT_FILE_TEMPLATE.to_string(),
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            engine_retries: DEFAULT_ENGINE_RETRIES,
            fragment_retries: DEFAULT_FRAGMENT_RETRIES,
        })
    }

    /// Playlist URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Album directory receiving the files.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Dedupe ledger the engine reads and appends to.
    #[must_use]
    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    /// Encoding quality.
    #[must_use]
    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Metadata forced onto output files.
    #[must_use]
    pub fn overrides(&self) -> &MetadataOverrides {
        &self.overrides
    }

    /// Source format selector.
    #[must_use]
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Full output template: destination joined with the file template.
    #[must_use]
    pub fn output_template(&self) -> PathBuf {
        self.destination.join(&self.file_template)
    }

    /// Socket timeout.
    #[must_use]
    pub fn socket_timeout(&self) -> Duration {
        self.socket_timeout
    }

    /// Engine-internal request retries.
    #[must_use]
    pub fn engine_retries(&self) -> u32 {
        self.engine_retries
    }

    /// Engine-internal fragment retries.
    #[must_use]
    pub fn fragment_retries(&self) -> u32 {
        self.fragment_retries
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_with_artist_render_both_fields() {
        let args = MetadataOverrides::new("Mix", "Someone").to_engine_args();
        let joined = args.join(" ");
        assert!(joined.contains("--replace-in-metadata album ^.*$ Mix"));
        assert!(joined.contains("--replace-in-metadata album_artist ^.*$ Someone"));
        assert!(joined.contains("%(playlist_index)s:%(track_number)s"));
    }

    #[test]
    fn test_overrides_empty_artist_is_omitted() {
        let overrides = MetadataOverrides::new("Mix", "");
        assert_eq!(overrides.album_artist(), None);
        let args = overrides.to_engine_args();
        assert!(!args.iter().any(|a| a == "album_artist"));
        assert!(!args.iter().any(|a| a.contains("%(album_artist)s")));
    }

    #[test]
    fn test_overrides_escape_backslash() {
        let args = MetadataOverrides::new(r"AC\DC", "").to_engine_args();
        assert!(args.contains(&r"AC\\DC".to_string()));
    }

    #[test]
    fn test_fetch_options_rejects_empty_url() {
        let result = FetchOptions::new(
            "  ",
            "/out/Mix",
            "/out/ledger.txt",
            Quality::BEST_VBR,
            MetadataOverrides::new("Mix", ""),
        );
        assert!(matches!(result, Err(FetchError::InvalidOptions { .. })));
    }

    #[test]
    fn test_fetch_options_output_template() {
        let options = FetchOptions::new(
            "https://x/list",
            "/out/Mix",
            "/out/ledger.txt",
            Quality::BEST_VBR,
            MetadataOverrides::new("Mix", ""),
        )
        .unwrap();
        assert_eq!(
            options.output_template(),
            PathBuf::from("/out/Mix/%(playlist_index)s - %(title)s.%(ext)s")
        );
        assert_eq!(options.format(), DEFAULT_FORMAT);
        assert_eq!(options.socket_timeout(), Duration::from_secs(30));
    }
}
