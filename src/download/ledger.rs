//! The persistent dedupe ledger.
//!
//! The ledger file belongs to the fetch engine: it reads it to skip items it
//! has already fetched and appends one record per newly fetched item. This
//! side only decides where the file lives and makes sure its directory exists.
//! The orchestrator never reads records; [`DedupeLedger::contains`] exists for
//! diagnostics and tests.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;

/// Location of the engine's append-only skip list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupeLedger {
    path: PathBuf,
}

impl DedupeLedger {
    /// Creates a ledger at an explicit path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the ledger configured for this process.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.ledger_path())
    }

    /// Path handed to the fetch engine.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensures the ledger's parent directory exists. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns the IO error if the directory cannot be created.
    pub async fn prepare(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
            debug!(dir = %parent.display(), "ledger directory ready");
        }
        Ok(())
    }

    /// Whether an item id is recorded, read-only.
    ///
    /// Records are `<extractor> <id>` lines; only the id is compared. A
    /// missing file contains nothing.
    ///
    /// # Errors
    ///
    /// Returns the IO error if an existing ledger cannot be read.
    pub async fn contains(&self, id: &str) -> std::io::Result<bool> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        Ok(content
            .lines()
            .filter_map(|line| line.split_whitespace().last())
            .any(|recorded| recorded == id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_ledger_default_location_under_output_dir() {
        let config = Config::new("/srv/music");
        let ledger = DedupeLedger::from_config(&config);
        assert_eq!(
            ledger.path(),
            Path::new("/srv/music/.yt-dlp-download-archive.txt")
        );
    }

    #[tokio::test]
    async fn test_prepare_creates_parent_and_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let ledger = DedupeLedger::new(temp.path().join("state/nested/archive.txt"));

        ledger.prepare().await.unwrap();
        ledger.prepare().await.unwrap();

        assert!(temp.path().join("state/nested").is_dir());
        assert!(!ledger.path().exists(), "the file itself is left to the engine");
    }

    #[tokio::test]
    async fn test_prepare_leaves_existing_records_untouched() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("archive.txt");
        std::fs::write(&path, "youtube abc\nyoutube def\n").unwrap();

        DedupeLedger::new(&path).prepare().await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "youtube abc\nyoutube def\n"
        );
    }

    #[tokio::test]
    async fn test_contains_matches_item_ids() {
        let temp = TempDir::new().unwrap();
        let ledger = DedupeLedger::new(temp.path().join("archive.txt"));
        assert!(!ledger.contains("abc").await.unwrap());

        std::fs::write(ledger.path(), "youtube abc\nyoutube def\n").unwrap();
        assert!(ledger.contains("abc").await.unwrap());
        assert!(!ledger.contains("youtube").await.unwrap());
        assert!(!ledger.contains("xyz").await.unwrap());
    }

    #[tokio::test]
    async fn test_prepare_bare_file_name() {
        DedupeLedger::new("archive.txt").prepare().await.unwrap();
    }
}
