//! The parsed form of one entries-file line.

use std::fmt;

/// A single playlist request, in the order it appeared in the entries file.
///
/// Empty `album` / `album_artist` mean "not given"; they are derived later by
/// the metadata policy. The URL is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRequest {
    album: String,
    album_artist: String,
    url: String,
}

impl PlaylistRequest {
    /// Creates a request. Fields are trimmed.
    #[must_use]
    pub fn new(
        album: impl Into<String>,
        album_artist: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            album: album.into().trim().to_string(),
            album_artist: album_artist.into().trim().to_string(),
            url: url.into().trim().to_string(),
        }
    }

    /// Creates a request that only names a URL.
    #[must_use]
    pub fn url_only(url: impl Into<String>) -> Self {
        Self::new("", "", url)
    }

    /// Album name as written, possibly empty.
    #[must_use]
    pub fn album(&self) -> &str {
        &self.album
    }

    /// Album artist as written, possibly empty.
    #[must_use]
    pub fn album_artist(&self) -> &str {
        &self.album_artist
    }

    /// Source playlist URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether an album name was supplied.
    #[must_use]
    pub fn has_album(&self) -> bool {
        !self.album.is_empty()
    }
}

impl fmt::Display for PlaylistRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.album.is_empty(), self.album_artist.is_empty()) {
            (true, _) => write!(f, "{}", self.url),
            (false, true) => write!(f, "{} <- {}", self.album, self.url),
            (false, false) => write!(f, "{} / {} <- {}", self.album, self.album_artist, self.url),
        }
    }
}
