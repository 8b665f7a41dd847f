//! CLI entry point for the playlist archiver.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use archiver_core::{
    BatchRunner, Config, DownloadOrchestrator, WatchdogLoop, YtDlpEngine, parse_entries_file,
};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

mod cli;
mod terminal;

use cli::Args;

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    /// Batch finished or watchdog stopped.
    Success,
    /// Nothing to do: no list file, or an empty or unreadable list.
    Usage,
}

impl ProcessExit {
    fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Usage => 2,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse before tracing so --help works without logs
    let args = Args::parse();
    terminal::init_tracing(args.verbose, args.log_file.as_deref());
    debug!(?args, "CLI arguments parsed");

    let exit = run(args).await?;
    Ok(exit.into())
}

async fn run(args: Args) -> Result<ProcessExit> {
    let Some(file) = args.file.clone() else {
        error!("no playlist file given; use -f/--file or set PLAYLIST_FILE");
        return Ok(ProcessExit::Usage);
    };

    let config = args.to_config();
    config.validate().context("invalid configuration")?;
    tokio::fs::create_dir_all(config.output_dir())
        .await
        .with_context(|| {
            format!(
                "cannot create output directory {}",
                config.output_dir().display()
            )
        })?;

    info!(
        output_dir = %config.output_dir().display(),
        quality = %config.quality(),
        archive = %config.ledger_path().display(),
        rate_limit = config.rate_limit_enabled(),
        "playlist archiver starting"
    );

    let runner = build_runner(&config, &args);
    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    if args.watch {
        let watchdog = WatchdogLoop::new(runner);
        watchdog.run(&file, args.interval(), &cancel).await;
        return Ok(ProcessExit::Success);
    }

    run_once(&runner, &file, &cancel).await
}

fn build_runner(config: &Config, args: &Args) -> BatchRunner {
    let engine = Arc::new(YtDlpEngine::new(&args.ytdlp_path));
    BatchRunner::new(DownloadOrchestrator::new(config, engine))
}

async fn run_once(
    runner: &BatchRunner,
    file: &Path,
    cancel: &CancellationToken,
) -> Result<ProcessExit> {
    let requests = match parse_entries_file(file) {
        Ok(requests) => requests,
        Err(e) => {
            error!(error = %e, "cannot read playlist file");
            return Ok(ProcessExit::Usage);
        }
    };
    if requests.is_empty() {
        error!(file = %file.display(), "no playlists found in file");
        return Ok(ProcessExit::Usage);
    }

    let stats = runner.run_cancellable(&requests, cancel).await;
    info!(
        done = stats.done(),
        failed = stats.failed(),
        skipped = stats.skipped(),
        "all playlists processed"
    );
    Ok(ProcessExit::Success)
}

/// Cancels `token` on Ctrl-C. The job in flight finishes first.
fn spawn_interrupt_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current playlist");
            token.cancel();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_exit_codes() {
        assert_eq!(ProcessExit::Success.code(), 0);
        assert_eq!(ProcessExit::Usage.code(), 2);
    }
}
