//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use archiver_core::config::{
    DEFAULT_MAX_RETRIES, DEFAULT_OUTPUT_DIR, DEFAULT_RETRY_SLEEP, DEFAULT_WATCHDOG_INTERVAL_SECS,
};
use archiver_core::fetch::DEFAULT_PROGRAM;
use archiver_core::{Config, Quality};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};

/// Download remote playlists as consistently tagged MP3 albums.
///
/// Each line of the playlist file is `url`, `album|url` or
/// `album|album artist|url`; blank lines and `#` comments are ignored.
/// Already downloaded items are skipped using a persistent archive file.
#[derive(Parser, Debug)]
#[command(name = "playlist-archiver")]
#[command(author, version, about)]
pub struct Args {
    /// Playlist list file
    #[arg(short = 'f', long = "file", env = "PLAYLIST_FILE")]
    pub file: Option<PathBuf>,

    /// Re-read the playlist file and download again every interval
    #[arg(long, env = "WATCHDOG", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub watch: bool,

    /// Seconds between watchdog cycles
    #[arg(long, env = "WATCHDOG_INTERVAL", default_value_t = DEFAULT_WATCHDOG_INTERVAL_SECS)]
    pub interval: u64,

    /// Root directory for album folders
    #[arg(short = 'o', long, env = "OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// MP3 quality: 0-10 for VBR (0 best) or a bitrate such as 320
    #[arg(short = 'q', long, env = "MP3_QUALITY", default_value = "0")]
    pub quality: Quality,

    /// Pause 1-5 seconds after each playlist
    #[arg(short = 'r', long, env = "RATE_LIMIT", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub rate_limit: bool,

    /// Attempts per remote operation on network errors
    #[arg(long, env = "MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES, value_parser = clap::value_parser!(u32).range(1..))]
    pub retries: u32,

    /// Base seconds between retries (multiplied by the attempt number)
    #[arg(long, env = "RETRY_SLEEP", default_value_t = DEFAULT_RETRY_SLEEP.as_secs())]
    pub retry_sleep: u64,

    /// Download archive file [default: <output-dir>/.yt-dlp-download-archive.txt]
    #[arg(long, env = "ARCHIVE_FILE")]
    pub archive_file: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long, env = "VERBOSE", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub verbose: bool,

    /// yt-dlp executable
    #[arg(long, env = "YTDLP_PATH", default_value = DEFAULT_PROGRAM)]
    pub ytdlp_path: PathBuf,
}

impl Args {
    /// Builds the process configuration from the parsed arguments.
    pub fn to_config(&self) -> Config {
        Config::new(&self.output_dir)
            .with_quality(self.quality)
            .with_rate_limit(self.rate_limit)
            .with_max_retries(self.retries)
            .with_retry_sleep(Duration::from_secs(self.retry_sleep))
            .with_ledger_path(self.archive_file.clone())
    }

    /// Watchdog sleep between cycles.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}
