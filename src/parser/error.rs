//! Error types for entries-file parsing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading an entries file.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The entries file could not be opened or read.
    #[error("cannot read entries file {path}: {source}\n  Suggestion: check the -f/--file path and its permissions")]
    File {
        /// Path that was requested.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// Creates a file error for `path`.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}
