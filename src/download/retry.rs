//! Retry logic with linear backoff for transient fetch engine failures.
//!
//! This module provides the [`RetryPolicy`] and [`FailureType`] types for
//! classifying engine errors and bounding retries around remote operations.
//!
//! # Overview
//!
//! When a remote operation fails, the error is classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - Network-layer failures that may succeed on retry
//! - [`FailureType::Permanent`] - Content or access failures that never will
//!
//! The [`RetryPolicy`] then decides whether to retry based on failure type and
//! attempt count. Delays grow linearly: `base_delay * attempt`.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use archiver_core::download::{FailureType, RetryDecision, RetryPolicy, classify_error};
//! use archiver_core::fetch::FetchError;
//!
//! let policy = RetryPolicy::new(3, Duration::from_secs(10));
//! let error = FetchError::failed("https://x/list", "Read timed out (timeout)");
//!
//! match policy.should_retry(classify_error(&error), 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         assert_eq!(delay, Duration::from_secs(10));
//!         assert_eq!(attempt, 2);
//!     }
//!     RetryDecision::DoNotRetry { reason } => panic!("unexpected: {reason}"),
//! }
//! ```

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::{Config, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_SLEEP};
use crate::fetch::FetchError;

/// Substrings (lowercase) that mark a failure as network-layer and retryable.
pub const TRANSIENT_MARKERS: &[&str] = &[
    "timeout",
    "timed out",
    "connection",
    "network",
    "reset",
    "socket",
    "ssl",
    "tls",
];

/// Classification of fetch engine failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Network-layer failure that may succeed on retry.
    ///
    /// Examples: read timeout, connection reset, TLS handshake failure.
    Transient,

    /// Failure that won't succeed regardless of retries.
    ///
    /// Examples: removed or private content, geo block, unsupported URL,
    /// missing engine executable.
    Permanent,
}

/// Decision on whether to retry a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry the operation.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Final failure of a retried operation, with the attempts it consumed.
#[derive(Debug, Error)]
#[error("{error} (after {attempts} attempt(s))")]
pub struct RetryError {
    /// The last error returned by the operation.
    #[source]
    pub error: FetchError,
    /// Number of attempts made, including the first.
    pub attempts: u32,
    /// Classification of `error`.
    pub failure_type: FailureType,
}

/// Bounded retry with linear backoff.
///
/// # Default Values
///
/// - `max_attempts`: 3
/// - `base_delay`: 10 seconds
///
/// # Delay Calculation
///
/// ```text
/// delay = base_delay * attempt   (attempt is the 1-based number that just failed)
/// ```
///
/// With defaults, delays are 10s then 20s before the third and final attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Delay unit multiplied by the attempt number.
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_RETRY_SLEEP,
        }
    }
}

impl RetryPolicy {
    /// Creates a retry policy.
    ///
    /// `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Creates the policy described by the process configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_retries(), config.retry_sleep())
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the backoff delay unit.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Determines whether to retry a failed operation.
    ///
    /// # Arguments
    ///
    /// * `failure_type` - Classification of the failure
    /// * `attempt` - The attempt number that just failed (1-indexed)
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.calculate_delay(attempt);

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Linear backoff: `base_delay * attempt`.
    fn calculate_delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Runs `operation` until it succeeds, fails permanently, or exhausts attempts.
    ///
    /// Each failure is classified with [`classify_error`]. Permanent failures are
    /// returned immediately; transient ones are retried after a linear backoff.
    /// After the final attempt fails transiently, the last error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError`] carrying the last error and the attempt count.
    #[instrument(skip(self, operation), fields(max_attempts = self.max_attempts))]
    pub async fn execute<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(attempt, "attempting {label}");

            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            let failure_type = classify_error(&error);
            match self.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "network error during {label}, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    debug!(next_attempt, "backoff elapsed");
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(%reason, "not retrying {label}");
                    return Err(RetryError {
                        error,
                        attempts: attempt,
                        failure_type,
                    });
                }
            }
        }
    }
}

/// Classifies a fetch engine error for retry decisions.
///
/// | Error | Type | Rationale |
/// |-------|------|-----------|
/// | Failed (network wording) | Transient | Remote side may recover |
/// | Failed (other wording) | Permanent | Removed, private, blocked, unsupported |
/// | Io (network wording) | Transient | Pipe or socket hiccup |
/// | Spawn | Permanent | Engine missing or not executable |
/// | InvalidProbe | Permanent | Engine output will not change |
/// | InvalidOptions | Permanent | Local configuration issue |
#[must_use]
pub fn classify_error(error: &FetchError) -> FailureType {
    match error {
        FetchError::Failed { .. } | FetchError::Io { .. } => classify_message(&error.detail()),
        FetchError::Spawn { .. } | FetchError::InvalidProbe { .. } | FetchError::InvalidOptions { .. } => {
            FailureType::Permanent
        }
    }
}

/// Classifies raw error text against [`TRANSIENT_MARKERS`], case-insensitively.
#[must_use]
pub fn classify_message(message: &str) -> FailureType {
    let lower = message.to_lowercase();
    if TRANSIENT_MARKERS.iter().any(|marker| lower.contains(marker)) {
        FailureType::Transient
    } else {
        FailureType::Permanent
    }
}
