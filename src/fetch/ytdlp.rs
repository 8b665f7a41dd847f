//! [`FetchEngine`] backed by the `yt-dlp` executable.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, instrument, trace};

use super::{DEFAULT_SOCKET_TIMEOUT, FetchEngine, FetchError, FetchEvent, FetchOptions, PlaylistProbe};

/// Program name looked up on `PATH` when no explicit path is configured.
pub const DEFAULT_PROGRAM: &str = "yt-dlp";

/// Prefix the engine puts in front of error lines.
const ERROR_PREFIX: &str = "ERROR:";

#[allow(clippy::expect_used)]
static PERCENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[download\]\s+(?P<percent>\d+(?:\.\d+)?)%(?:.*?ETA\s+(?P<eta>\S+))?")
        .expect("progress regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static ITEM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[download\] Downloading (?:item|video) (?P<index>\d+) of (?P<total>\d+)")
        .expect("item regex is valid") // Static pattern, safe to panic
});

/// Runs `yt-dlp` as a child process, one invocation per operation.
#[derive(Debug, Clone)]
pub struct YtDlpEngine {
    program: PathBuf,
}

impl Default for YtDlpEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl YtDlpEngine {
    /// Creates an engine that launches `program` (a path or a name on `PATH`).
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The executable being launched.
    #[must_use]
    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn spawn_error(&self, source: std::io::Error) -> FetchError {
        FetchError::Spawn {
            program: self.program.display().to_string(),
            source,
        }
    }
}

/// Builds the probe invocation: flat playlist listing as a single JSON document.
fn build_probe_args(url: &str) -> Vec<String> {
    vec![
        "--flat-playlist".into(),
        "--dump-single-json".into(),
        "--no-warnings".into(),
        "--socket-timeout".into(),
        DEFAULT_SOCKET_TIMEOUT.as_secs().to_string(),
        "--".into(),
        url.into(),
    ]
}

/// Builds the fetch/convert/tag invocation for one playlist.
#[must_use]
pub fn build_fetch_args(options: &FetchOptions) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--format".into(),
        options.format().into(),
        "--extract-audio".into(),
        "--audio-format".into(),
        "mp3".into(),
        "--audio-quality".into(),
        options.quality().as_engine_arg(),
        "--embed-metadata".into(),
        "--embed-thumbnail".into(),
        "--write-thumbnail".into(),
        "--output".into(),
        options.output_template().display().to_string(),
        "--ignore-errors".into(),
        "--geo-bypass".into(),
        "--socket-timeout".into(),
        options.socket_timeout().as_secs().to_string(),
        "--retries".into(),
        options.engine_retries().to_string(),
        "--fragment-retries".into(),
        options.fragment_retries().to_string(),
        "--skip-unavailable-fragments".into(),
        "--no-overwrites".into(),
        "--continue".into(),
        "--download-archive".into(),
        options.ledger_path().display().to_string(),
        "--newline".into(),
    ];
    args.extend(options.overrides().to_engine_args());
    args.push("--".into());
    args.push(options.url().into());
    args
}

/// Turns engine output lines into [`FetchEvent`]s.
///
/// Percent lines do not name their file, so the parser remembers the last
/// announced download destination.
#[derive(Debug, Default)]
pub struct ProgressParser {
    current_file: Option<String>,
}

impl ProgressParser {
    /// Creates a parser with no current file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one output line. Lines that carry no event return `None`.
    pub fn parse_line(&mut self, line: &str) -> Option<FetchEvent> {
        let line = line.trim_end();

        if let Some(message) = line.strip_prefix(ERROR_PREFIX) {
            return Some(FetchEvent::Error {
                message: message.trim().to_string(),
            });
        }

        if let Some(filename) = line.strip_prefix("[download] Destination:") {
            self.current_file = Some(filename.trim().to_string());
            return None;
        }

        if let Some(filename) = line.strip_prefix("[ExtractAudio] Destination:") {
            return Some(FetchEvent::Finished {
                filename: filename.trim().to_string(),
            });
        }

        if line.starts_with("[download]") && line.ends_with("has already been recorded in the archive") {
            let item = line
                .trim_start_matches("[download]")
                .trim_end_matches("has already been recorded in the archive")
                .trim();
            return Some(FetchEvent::AlreadyArchived {
                item: item.to_string(),
            });
        }

        if let Some(caps) = ITEM_PATTERN.captures(line) {
            let index = caps["index"].parse().ok()?;
            let total = caps["total"].parse().ok()?;
            return Some(FetchEvent::Queued { index, total });
        }

        if let Some(caps) = PERCENT_PATTERN.captures(line) {
            let percent = caps["percent"].parse().ok()?;
            return Some(FetchEvent::Downloading {
                filename: self.current_file.clone().unwrap_or_default(),
                percent,
                eta: caps.name("eta").map(|m| m.as_str().to_string()),
            });
        }

        None
    }
}

/// Condenses engine stderr into a failure message.
fn summarize_failure(error_lines: &[String], last_line: Option<&str>, exit_code: Option<i32>) -> String {
    if !error_lines.is_empty() {
        return error_lines.join("; ");
    }
    if let Some(line) = last_line.filter(|l| !l.trim().is_empty()) {
        return line.trim().to_string();
    }
    match exit_code {
        Some(code) => format!("engine exited with status {code}"),
        None => "engine terminated by signal".to_string(),
    }
}

/// Error lines (prefix stripped) from captured stderr.
fn error_lines(stderr: &str) -> Vec<String> {
    stderr
        .lines()
        .filter_map(|l| l.strip_prefix(ERROR_PREFIX))
        .map(|l| l.trim().to_string())
        .collect()
}

#[async_trait]
impl FetchEngine for YtDlpEngine {
    #[instrument(skip(self), fields(program = %self.program.display()))]
    async fn probe(&self, url: &str) -> Result<PlaylistProbe, FetchError> {
        let output = self
            .command(&build_probe_args(url))
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let errors = error_lines(&stderr);
            return Err(FetchError::Failed {
                url: url.to_string(),
                exit_code: output.status.code(),
                message: summarize_failure(&errors, stderr.lines().last(), output.status.code()),
            });
        }

        let probe: PlaylistProbe =
            serde_json::from_slice(&output.stdout).map_err(|source| FetchError::InvalidProbe {
                url: url.to_string(),
                source,
            })?;
        debug!(title = probe.title(), owner = probe.owner(), "probe succeeded");
        Ok(probe)
    }

    #[instrument(skip(self, options, events), fields(url = %options.url()))]
    async fn fetch(
        &self,
        options: &FetchOptions,
        events: UnboundedSender<FetchEvent>,
    ) -> Result<(), FetchError> {
        let args = build_fetch_args(options);
        trace!(?args, "launching fetch engine");

        let mut child = self
            .command(&args)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FetchError::io(std::io::Error::other("engine stdout not captured")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| FetchError::io(std::io::Error::other("engine stderr not captured")))?;

        let forward_stdout = async {
            let mut parser = ProgressParser::new();
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                match parser.parse_line(&line) {
                    // A dropped receiver only means nobody is listening.
                    Some(event) => {
                        let _ = events.send(event);
                    }
                    None => trace!(line = %line, "engine output"),
                }
            }
            Ok::<(), std::io::Error>(())
        };

        let collect_stderr = async {
            let mut parser = ProgressParser::new();
            let mut lines = BufReader::new(stderr).lines();
            let mut errors = Vec::new();
            let mut last = None;
            while let Some(line) = lines.next_line().await? {
                if let Some(event) = parser.parse_line(&line) {
                    if let FetchEvent::Error { message } = &event {
                        errors.push(message.clone());
                    }
                    let _ = events.send(event);
                } else {
                    debug!(line = %line, "engine stderr");
                }
                last = Some(line);
            }
            Ok::<_, std::io::Error>((errors, last))
        };

        let (stdout_result, stderr_result) = tokio::join!(forward_stdout, collect_stderr);
        stdout_result.map_err(FetchError::io)?;
        let (errors, last_line) = stderr_result.map_err(FetchError::io)?;

        let status = child.wait().await.map_err(FetchError::io)?;
        if status.success() {
            return Ok(());
        }

        Err(FetchError::Failed {
            url: options.url().to_string(),
            exit_code: status.code(),
            message: summarize_failure(&errors, last_line.as_deref(), status.code()),
        })
    }
}
