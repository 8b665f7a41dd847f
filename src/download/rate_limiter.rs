//! Randomized pause between playlist jobs.
//!
//! This module provides the [`RateLimiter`] struct which, when enabled, blocks
//! the worker for a random duration after each playlist job so that requests
//! to the remote side are not issued in a tight, recognizable rhythm.
//!
//! # Example
//!
//! ```
//! use archiver_core::download::RateLimiter;
//!
//! # async fn example() {
//! let limiter = RateLimiter::new(true);
//!
//! // ... run a playlist job ...
//!
//! // Sleeps somewhere between 1 and 5 seconds
//! limiter.throttle().await;
//! # }
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument};

/// Shortest pause when enabled.
pub const DEFAULT_MIN_PAUSE: Duration = Duration::from_secs(1);

/// Longest pause when enabled.
pub const DEFAULT_MAX_PAUSE: Duration = Duration::from_secs(5);

/// Post-job pause, uniformly drawn from a closed range.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Whether pauses are applied at all.
    enabled: bool,

    /// Lower bound of the pause.
    min_pause: Duration,

    /// Upper bound of the pause.
    max_pause: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::disabled()
    }
}

impl RateLimiter {
    /// Creates a rate limiter with the default 1-5 second range.
    #[must_use]
    #[instrument]
    pub fn new(enabled: bool) -> Self {
        debug!("creating rate limiter");
        Self {
            enabled,
            min_pause: DEFAULT_MIN_PAUSE,
            max_pause: DEFAULT_MAX_PAUSE,
        }
    }

    /// Creates a rate limiter that never pauses.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Creates an enabled rate limiter with a custom range.
    ///
    /// Bounds given in the wrong order are swapped.
    #[must_use]
    pub fn with_range(min_pause: Duration, max_pause: Duration) -> Self {
        let (min_pause, max_pause) = if min_pause <= max_pause {
            (min_pause, max_pause)
        } else {
            (max_pause, min_pause)
        };
        Self {
            enabled: true,
            min_pause,
            max_pause,
        }
    }

    /// Returns whether pauses are applied.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Draws the next pause, or `None` when disabled.
    #[must_use]
    pub fn sample_delay(&self) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        let min_ms = duration_millis(self.min_pause);
        let max_ms = duration_millis(self.max_pause);
        Some(Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms)))
    }

    /// Blocks for a random pause when enabled; returns immediately otherwise.
    pub async fn throttle(&self) {
        let Some(delay) = self.sample_delay() else {
            return;
        };
        debug!(delay_ms = delay.as_millis(), "rate limiting: sleeping");
        tokio::time::sleep(delay).await;
    }
}

#[allow(clippy::cast_possible_truncation)]
fn duration_millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_never_samples() {
        let limiter = RateLimiter::disabled();
        assert!(!limiter.is_enabled());
        assert_eq!(limiter.sample_delay(), None);
    }

    #[test]
    fn test_enabled_samples_within_default_range() {
        let limiter = RateLimiter::new(true);
        for _ in 0..200 {
            let delay = limiter.sample_delay().unwrap();
            assert!(delay >= DEFAULT_MIN_PAUSE, "{delay:?} below range");
            assert!(delay <= DEFAULT_MAX_PAUSE, "{delay:?} above range");
        }
    }

    #[test]
    fn test_samples_are_not_constant() {
        let limiter = RateLimiter::new(true);
        let samples: Vec<Duration> = (0..50).map(|_| limiter.sample_delay().unwrap()).collect();
        assert!(samples.iter().any(|d| *d != samples[0]));
    }

    #[test]
    fn test_with_range_swaps_reversed_bounds() {
        let limiter = RateLimiter::with_range(Duration::from_millis(20), Duration::from_millis(10));
        let delay = limiter.sample_delay().unwrap();
        assert!(delay >= Duration::from_millis(10));
        assert!(delay <= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_throttle_disabled_returns_immediately() {
        let start = std::time::Instant::now();
        RateLimiter::disabled().throttle().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_throttle_enabled_sleeps_at_least_min() {
        let limiter = RateLimiter::with_range(Duration::from_millis(20), Duration::from_millis(30));
        let start = std::time::Instant::now();
        limiter.throttle().await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
