//! Process-wide configuration.
//!
//! A [`Config`] is assembled once by the binary from CLI flags and environment
//! overrides, validated, and then passed by reference into every component.
//! Nothing in the library reads configuration from ambient global state.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Default root output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "/downloads";

/// Default number of attempts per remote operation.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base sleep between transient-failure retries.
pub const DEFAULT_RETRY_SLEEP: Duration = Duration::from_secs(10);

/// Default watchdog interval in seconds.
pub const DEFAULT_WATCHDOG_INTERVAL_SECS: u64 = 600;

/// File name of the dedupe ledger when no explicit path is given.
pub const DEFAULT_LEDGER_FILE_NAME: &str = ".yt-dlp-download-archive.txt";

/// Highest VBR level the engine accepts.
const MAX_VBR_LEVEL: u8 = 10;

/// Accepted constant bitrate range in kbit/s.
const BITRATE_RANGE: std::ops::RangeInclusive<u16> = 32..=320;

/// Errors raised while validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Retry bound must allow at least the initial attempt.
    #[error("invalid retry count {value}: must be at least 1")]
    InvalidRetries {
        /// The rejected value.
        value: u32,
    },

    /// Quality value is neither a VBR level nor a supported bitrate.
    #[error("invalid quality '{value}': {reason}")]
    InvalidQuality {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// MP3 encoding quality handed to the fetch engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    /// Variable bitrate level, `0` being best.
    Vbr(u8),
    /// Constant bitrate in kbit/s (e.g. 320).
    Cbr(u16),
}

impl Quality {
    /// Best variable-rate quality (`"0"`).
    pub const BEST_VBR: Self = Self::Vbr(0);

    /// Renders the value in the form the engine's `--audio-quality` flag expects.
    #[must_use]
    pub fn as_engine_arg(&self) -> String {
        match self {
            Self::Vbr(level) => level.to_string(),
            Self::Cbr(kbps) => format!("{kbps}K"),
        }
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::BEST_VBR
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vbr(level) => write!(f, "VBR {level}"),
            Self::Cbr(kbps) => write!(f, "CBR {kbps}k"),
        }
    }
}

impl FromStr for Quality {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.trim_end_matches(['k', 'K']);
        let invalid = |reason: &str| ConfigError::InvalidQuality {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let number: u16 = digits
            .parse()
            .map_err(|_| invalid("expected a VBR level (0-10) or a bitrate such as 320"))?;

        let explicit_bitrate = digits.len() != trimmed.len();
        if !explicit_bitrate && number <= u16::from(MAX_VBR_LEVEL) {
            #[allow(clippy::cast_possible_truncation)]
            return Ok(Self::Vbr(number as u8));
        }

        if BITRATE_RANGE.contains(&number) {
            Ok(Self::Cbr(number))
        } else {
            Err(invalid("bitrate must be between 32 and 320 kbit/s"))
        }
    }
}

/// Read-only process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    output_dir: PathBuf,
    quality: Quality,
    rate_limit_enabled: bool,
    max_retries: u32,
    retry_sleep: Duration,
    ledger_path: PathBuf,
}

impl Config {
    /// Creates a configuration rooted at `output_dir` with default settings.
    ///
    /// The ledger defaults to a hidden file directly under the output directory.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        let ledger_path = output_dir.join(DEFAULT_LEDGER_FILE_NAME);
        Self {
            output_dir,
            quality: Quality::default(),
            rate_limit_enabled: false,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_sleep: DEFAULT_RETRY_SLEEP,
            ledger_path,
        }
    }

    /// Sets the encoding quality.
    #[must_use]
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Enables or disables the post-job rate limit pause.
    #[must_use]
    pub fn with_rate_limit(mut self, enabled: bool) -> Self {
        self.rate_limit_enabled = enabled;
        self
    }

    /// Sets the attempt bound for each remote operation.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the base sleep of the linear retry backoff.
    #[must_use]
    pub fn with_retry_sleep(mut self, retry_sleep: Duration) -> Self {
        self.retry_sleep = retry_sleep;
        self
    }

    /// Overrides the dedupe ledger location. `None` keeps the default.
    #[must_use]
    pub fn with_ledger_path(mut self, ledger_path: Option<PathBuf>) -> Self {
        if let Some(path) = ledger_path {
            self.ledger_path = path;
        }
        self
    }

    /// Checks invariants that cannot be expressed in the types.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRetries`] when `max_retries` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::InvalidRetries {
                value: self.max_retries,
            });
        }
        Ok(())
    }

    /// Root output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Encoding quality.
    #[must_use]
    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Whether the rate limiter is active.
    #[must_use]
    pub fn rate_limit_enabled(&self) -> bool {
        self.rate_limit_enabled
    }

    /// Attempt bound per remote operation.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Base sleep of the linear retry backoff.
    #[must_use]
    pub fn retry_sleep(&self) -> Duration {
        self.retry_sleep
    }

    /// Dedupe ledger location.
    #[must_use]
    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== Quality Tests ====================

    #[test]
    fn test_quality_zero_is_best_vbr() {
        assert_eq!("0".parse::<Quality>().unwrap(), Quality::BEST_VBR);
    }

    #[test]
    fn test_quality_320_is_constant_bitrate() {
        assert_eq!("320".parse::<Quality>().unwrap(), Quality::Cbr(320));
        assert_eq!("320k".parse::<Quality>().unwrap(), Quality::Cbr(320));
    }

    #[test]
    fn test_quality_explicit_k_suffix_forces_bitrate_range() {
        let result = "5k".parse::<Quality>();
        assert!(matches!(result, Err(ConfigError::InvalidQuality { .. })));
    }

    #[test]
    fn test_quality_rejects_garbage_and_out_of_range() {
        assert!("best".parse::<Quality>().is_err());
        assert!("500".parse::<Quality>().is_err());
        assert!("20".parse::<Quality>().is_err());
    }

    #[test]
    fn test_quality_engine_arg_rendering() {
        assert_eq!(Quality::Vbr(0).as_engine_arg(), "0");
        assert_eq!(Quality::Cbr(320).as_engine_arg(), "320K");
    }

    // ==================== Config Tests ====================

    #[test]
    fn test_config_defaults() {
        let config = Config::new("/tmp/out");
        assert_eq!(config.output_dir(), Path::new("/tmp/out"));
        assert_eq!(config.quality(), Quality::BEST_VBR);
        assert!(!config.rate_limit_enabled());
        assert_eq!(config.max_retries(), DEFAULT_MAX_RETRIES);
        assert_eq!(config.retry_sleep(), DEFAULT_RETRY_SLEEP);
        assert_eq!(
            config.ledger_path(),
            Path::new("/tmp/out/.yt-dlp-download-archive.txt")
        );
    }

    #[test]
    fn test_config_ledger_override() {
        let config = Config::new("/tmp/out").with_ledger_path(Some(PathBuf::from("/state/l.txt")));
        assert_eq!(config.ledger_path(), Path::new("/state/l.txt"));

        let config = Config::new("/tmp/out").with_ledger_path(None);
        assert!(config.ledger_path().starts_with("/tmp/out"));
    }

    #[test]
    fn test_config_validate_rejects_zero_retries() {
        let config = Config::new("/tmp/out").with_max_retries(0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidRetries { value: 0 })
        );
        assert!(Config::new("/tmp/out").validate().is_ok());
    }
}
