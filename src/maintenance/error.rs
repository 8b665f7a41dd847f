//! Error types for album tag maintenance.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the maintenance helpers.
#[derive(Debug, Error)]
pub enum MaintenanceError {
    /// The album path is missing or not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory {
        /// The rejected path.
        path: PathBuf,
    },

    /// The album directory contains no MP3 files.
    #[error("No MP3 files found in {path}")]
    NoMp3Files {
        /// The album directory.
        path: PathBuf,
    },

    /// An ID3 tag could not be read or written.
    #[error("ID3 error on {path}: {source}")]
    Tag {
        /// The audio file.
        path: PathBuf,
        /// The underlying tag error.
        #[source]
        source: id3::Error,
    },

    /// No loudness normalization executable is on the search path.
    #[error("neither {} found on PATH\n  Suggestion: install rsgain or mp3gain", .tools.join(" nor "))]
    ExternalToolMissing {
        /// Executables that were looked for.
        tools: Vec<String>,
    },

    /// A normalization executable ran but failed.
    #[error("{tool} exited with {}", .status.map_or_else(|| "a signal".to_string(), |c| format!("status {c}")))]
    ToolFailed {
        /// Executable name.
        tool: String,
        /// Exit code, if any.
        status: Option<i32>,
    },

    /// Filesystem access failed.
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl MaintenanceError {
    /// Creates an IO error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a tag error for `path`.
    pub fn tag(path: impl Into<PathBuf>, source: id3::Error) -> Self {
        Self::Tag {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_missing_names_both_tools() {
        let err = MaintenanceError::ExternalToolMissing {
            tools: vec!["rsgain".to_string(), "mp3gain".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("rsgain nor mp3gain"), "{msg}");
    }

    #[test]
    fn test_tool_failed_status() {
        let err = MaintenanceError::ToolFailed {
            tool: "mp3gain".to_string(),
            status: Some(3),
        };
        assert_eq!(err.to_string(), "mp3gain exited with status 3");

        let err = MaintenanceError::ToolFailed {
            tool: "rsgain".to_string(),
            status: None,
        };
        assert_eq!(err.to_string(), "rsgain exited with a signal");
    }
}
