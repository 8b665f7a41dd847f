//! Entries-file parsing.
//!
//! An entries file is UTF-8 text with one playlist request per line. Blank
//! lines and lines starting with `#` are ignored. Each remaining line is split
//! on `|` and dispatched on its field count, so files mixing the historical
//! `album|url` and `album|artist|url` layouts parse line by line:
//!
//! | Fields | Layout | Notes |
//! |--------|--------|-------|
//! | 1 | `url` | album and artist derived later |
//! | 2 | `album\|url` | artist left empty |
//! | 3+ | `album\|artist\|url` | the tail after field two is rejoined with `\|` |
//!
//! Lines whose URL field is empty produce no request.
//!
//! # Example
//!
//! ```
//! use archiver_core::parser::parse_entries;
//!
//! let requests = parse_entries("# mixes\nMix|Artist|https://x/y\nhttps://x/z\n");
//! assert_eq!(requests.len(), 2);
//! assert_eq!(requests[0].album_artist(), "Artist");
//! assert_eq!(requests[1].album(), "");
//! ```

mod entry;
mod error;

pub use entry::PlaylistRequest;
pub use error::ParseError;

use std::path::Path;

use tracing::{debug, instrument};

/// Field separator within an entry line.
const FIELD_SEPARATOR: char = '|';

/// Comment marker at the start of a line.
const COMMENT_PREFIX: char = '#';

/// Parses entries text into requests, preserving line order.
#[must_use]
pub fn parse_entries(input: &str) -> Vec<PlaylistRequest> {
    input.lines().filter_map(parse_line).collect()
}

/// Reads and parses an entries file.
///
/// # Errors
///
/// Returns [`ParseError::File`] if the file cannot be opened or is not valid UTF-8.
#[instrument(skip(path), fields(path = %path.display()))]
pub fn parse_entries_file(path: &Path) -> Result<Vec<PlaylistRequest>, ParseError> {
    let content = std::fs::read_to_string(path).map_err(|e| ParseError::file(path, e))?;
    let requests = parse_entries(&content);
    debug!(entries = requests.len(), "parsed entries file");
    Ok(requests)
}

/// Parses a single line. Returns `None` for blank lines, comments and empty URLs.
#[must_use]
pub fn parse_line(raw: &str) -> Option<PlaylistRequest> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
        return None;
    }

    let parts: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
    let request = match parts.as_slice() {
        [url] => PlaylistRequest::url_only(*url),
        [album, url] => PlaylistRequest::new(*album, "", *url),
        [album, artist, tail @ ..] => {
            if tail.iter().all(|field| field.is_empty()) {
                debug!(line, "skipping entry without URL");
                return None;
            }
            let url = tail.join(&FIELD_SEPARATOR.to_string());
            PlaylistRequest::new(*album, *artist, url)
        }
        [] => return None,
    };

    if request.url().is_empty() {
        debug!(line, "skipping entry without URL");
        return None;
    }
    Some(request)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== Line Shape Tests ====================

    #[test]
    fn test_parse_line_three_fields() {
        let request = parse_line("Mix|Artist|https://x/y").unwrap();
        assert_eq!(request.album(), "Mix");
        assert_eq!(request.album_artist(), "Artist");
        assert_eq!(request.url(), "https://x/y");
    }

    #[test]
    fn test_parse_line_two_fields() {
        let request = parse_line("Mix|https://x/y").unwrap();
        assert_eq!(request.album(), "Mix");
        assert_eq!(request.album_artist(), "");
        assert_eq!(request.url(), "https://x/y");
    }

    #[test]
    fn test_parse_line_url_only() {
        let request = parse_line("https://x/y").unwrap();
        assert_eq!(request, PlaylistRequest::url_only("https://x/y"));
        assert!(!request.has_album());
    }

    #[test]
    fn test_parse_line_url_with_pipe_preserved() {
        let request = parse_line("A|B|https://x/y|z").unwrap();
        assert_eq!(request.album(), "A");
        assert_eq!(request.album_artist(), "B");
        assert_eq!(request.url(), "https://x/y|z");
    }

    #[test]
    fn test_parse_line_trims_fields() {
        let request = parse_line("  Rock Mix |  Someone | https://x/y  ").unwrap();
        assert_eq!(request.album(), "Rock Mix");
        assert_eq!(request.album_artist(), "Someone");
        assert_eq!(request.url(), "https://x/y");
    }

    // ==================== Skipped Line Tests ====================

    #[test]
    fn test_parse_line_comment_and_blank_skipped() {
        assert!(parse_line("# comment").is_none());
        assert!(parse_line("   # indented comment").is_none());
        assert!(parse_line("").is_none());
        assert!(parse_line("   \t ").is_none());
    }

    #[test]
    fn test_parse_line_empty_url_dropped() {
        assert!(parse_line("Mix|").is_none());
        assert!(parse_line("Mix|Artist|").is_none());
        assert!(parse_line("Mix|Artist| | ").is_none());
        assert!(parse_line("A|B||").is_none());
    }

    // ==================== Whole Input Tests ====================

    #[test]
    fn test_parse_entries_mixed_layouts_keep_order() {
        let input = "\
# header
First|https://a/1

https://a/2
Third|Owner|https://a/3
";
        let requests = parse_entries(input);
        let urls: Vec<&str> = requests.iter().map(PlaylistRequest::url).collect();
        assert_eq!(urls, vec!["https://a/1", "https://a/2", "https://a/3"]);
    }

    #[test]
    fn test_parse_entries_empty_input() {
        assert!(parse_entries("").is_empty());
        assert!(parse_entries("# only comments\n\n").is_empty());
    }

    #[test]
    fn test_parse_entries_file_missing_is_error() {
        let result = parse_entries_file(Path::new("/definitely/not/here.txt"));
        assert!(matches!(result, Err(ParseError::File { .. })));
    }
}
