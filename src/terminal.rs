//! Tracing subscriber setup for the archiver binary.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Default filter level for the given verbosity.
pub(crate) fn default_level(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs stderr logging and, when requested, a plain-text file copy.
///
/// `RUST_LOG` overrides the level. A log file that cannot be opened is
/// reported and skipped.
pub(crate) fn init_tracing(verbose: bool, log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    let mut file_error = None;
    let file_layer = log_file.and_then(|path| match open_log_file(path) {
        Ok(file) => Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(file)),
        ),
        Err(e) => {
            file_error = Some((path.to_path_buf(), e));
            None
        }
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init();

    if let Some((path, e)) = file_error {
        warn!(path = %path.display(), error = %e, "cannot open log file, logging to stderr only");
    }
}
