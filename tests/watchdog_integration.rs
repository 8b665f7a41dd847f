//! Integration tests for the watchdog loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use archiver_core::{BatchRunner, Config, CycleReport, DownloadOrchestrator, WatchdogLoop};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

mod support;
use support::fake_engine::FakeEngine;

const SHORT_INTERVAL: Duration = Duration::from_millis(10);

fn watchdog(temp: &TempDir, engine: FakeEngine) -> (WatchdogLoop, Arc<FakeEngine>) {
    let engine = Arc::new(engine);
    let config = Config::new(temp.path().join("music")).with_retry_sleep(Duration::ZERO);
    let orchestrator = DownloadOrchestrator::new(&config, Arc::clone(&engine) as _);
    (WatchdogLoop::new(BatchRunner::new(orchestrator)), engine)
}

fn entries_path(temp: &TempDir) -> PathBuf {
    temp.path().join("playlists.txt")
}

// ==================== Cycle Tests ====================

#[tokio::test]
async fn test_cycle_reports_empty_and_errored() {
    let temp = TempDir::new().unwrap();
    let (watchdog, _engine) = watchdog(&temp, FakeEngine::new());
    let path = entries_path(&temp);
    let cancel = CancellationToken::new();

    let report = watchdog.run_cycle(&path, &cancel).await;
    assert!(matches!(report, CycleReport::Errored(_)), "{report:?}");

    std::fs::write(&path, "# nothing yet\n\n").unwrap();
    let report = watchdog.run_cycle(&path, &cancel).await;
    assert_eq!(report, CycleReport::Empty);
}

// ==================== Loop Tests ====================

/// Cancellation during a cycle stops the loop before it sleeps again.
#[tokio::test]
async fn test_cancel_stops_after_current_cycle() {
    let temp = TempDir::new().unwrap();
    let path = entries_path(&temp);
    std::fs::write(&path, "A|https://x/a\n").unwrap();
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let engine = FakeEngine::new()
        .with_playlist("https://x/a", &["1"])
        .on_fetch(move |_| token.cancel());
    let (watchdog, engine) = watchdog(&temp, engine);

    let cycles = watchdog.run(&path, Duration::from_secs(3600), &cancel).await;

    assert_eq!(cycles, 1);
    assert_eq!(engine.fetch_calls(), vec!["https://x/a"]);
}

/// Edits to the entries file are picked up by the next cycle.
#[tokio::test]
async fn test_edits_take_effect_next_cycle() {
    let temp = TempDir::new().unwrap();
    let path = entries_path(&temp);
    std::fs::write(&path, "A|https://x/a\n").unwrap();
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let rewrite = path.clone();
    let engine = FakeEngine::new()
        .with_playlist("https://x/a", &["1"])
        .with_playlist("https://x/b", &["2"])
        .on_fetch(move |url| {
            if url == "https://x/a" {
                std::fs::write(&rewrite, "B|https://x/b\n").unwrap();
            } else {
                token.cancel();
            }
        });
    let (watchdog, engine) = watchdog(&temp, engine);

    let cycles = watchdog.run(&path, SHORT_INTERVAL, &cancel).await;

    assert_eq!(cycles, 2);
    assert_eq!(engine.fetch_calls(), vec!["https://x/a", "https://x/b"]);
    assert!(temp.path().join("music/B/01 - 2.mp3").is_file());
}

/// A missing entries file never ends the loop; only cancellation does.
#[tokio::test]
async fn test_missing_file_keeps_looping() {
    let temp = TempDir::new().unwrap();
    let (watchdog, engine) = watchdog(&temp, FakeEngine::new());
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        token.cancel();
    });

    let cycles = watchdog.run(&entries_path(&temp), SHORT_INTERVAL, &cancel).await;

    assert!(cycles >= 2, "expected several cycles, got {cycles}");
    assert!(engine.fetch_calls().is_empty());
}

/// A cancelled token ends the loop without running a cycle.
#[tokio::test]
async fn test_precancelled_token_runs_nothing() {
    let temp = TempDir::new().unwrap();
    let (watchdog, _engine) = watchdog(&temp, FakeEngine::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    assert_eq!(watchdog.run(&entries_path(&temp), SHORT_INTERVAL, &cancel).await, 0);
}
