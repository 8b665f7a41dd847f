//! Error types for fetch engine operations.

use thiserror::Error;

/// Errors reported by a [`FetchEngine`](super::FetchEngine).
#[derive(Debug, Error)]
pub enum FetchError {
    /// The engine executable could not be started.
    #[error("failed to launch fetch engine '{program}': {source}")]
    Spawn {
        /// Program that was launched.
        program: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The engine ran and reported a failure.
    #[error("fetch engine failed for {url}: {message}")]
    Failed {
        /// The playlist URL being processed.
        url: String,
        /// Engine exit code, if it exited normally.
        exit_code: Option<i32>,
        /// The engine's own error text.
        message: String,
    },

    /// The metadata probe returned something that is not the expected JSON.
    #[error("invalid probe output for {url}: {source}")]
    InvalidProbe {
        /// The probed URL.
        url: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Options could not be assembled into a valid engine invocation.
    #[error("invalid fetch options: {reason}")]
    InvalidOptions {
        /// What is wrong with the options.
        reason: String,
    },

    /// IO failure while talking to the engine process.
    #[error("IO error while running fetch engine: {source}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Creates an engine-reported failure.
    pub fn failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            url: url.into(),
            exit_code: None,
            message: message.into(),
        }
    }

    /// Creates an IO error.
    #[must_use]
    pub fn io(source: std::io::Error) -> Self {
        Self::Io { source }
    }

    /// The text the failure classifier inspects.
    ///
    /// For engine-reported failures this is the engine's own message, without
    /// the URL, so that words inside a URL never change the classification.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Failed { message, .. } => message.clone(),
            Self::Spawn { source, .. } | Self::Io { source } => source.to_string(),
            Self::InvalidProbe { source, .. } => source.to_string(),
            Self::InvalidOptions { reason } => reason.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_display_includes_url_and_message() {
        let err = FetchError::failed("https://x/list", "Video unavailable");
        let msg = err.to_string();
        assert!(msg.contains("https://x/list"));
        assert!(msg.contains("Video unavailable"));
    }

    #[test]
    fn test_detail_excludes_url() {
        let err = FetchError::failed("https://network.example/socket", "Private video");
        assert_eq!(err.detail(), "Private video");
    }
}
