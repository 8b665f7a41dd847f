//! In-memory fetch engine that honours the dedupe ledger like yt-dlp does.
//!
//! Playlists are lists of item ids. Fetching writes one `NN - <id>.mp3` file per
//! item not yet in the ledger and appends `fake <id>` records for them.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Mutex;

use archiver_core::fetch::{FetchEngine, FetchError, FetchEvent, FetchOptions, PlaylistProbe};
use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

type FetchHook = Box<dyn FnMut(&str) + Send>;

#[derive(Default)]
pub struct FakeEngine {
    playlists: HashMap<String, Vec<String>>,
    probes: HashMap<String, PlaylistProbe>,
    fetch_calls: Mutex<Vec<String>>,
    downloaded: Mutex<Vec<String>>,
    hook: Mutex<Option<FetchHook>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a playlist and its item ids.
    pub fn with_playlist(mut self, url: &str, items: &[&str]) -> Self {
        self.playlists
            .insert(url.to_string(), items.iter().map(ToString::to_string).collect());
        self
    }

    /// Makes the probe of `url` succeed. Unregistered probes fail permanently.
    pub fn with_probe(mut self, url: &str, title: &str, uploader: &str) -> Self {
        self.probes.insert(
            url.to_string(),
            PlaylistProbe {
                title: Some(title.to_string()),
                uploader: Some(uploader.to_string()),
                ..PlaylistProbe::default()
            },
        );
        self
    }

    /// Runs `hook` with the URL after every fetch.
    pub fn on_fetch(self, hook: impl FnMut(&str) + Send + 'static) -> Self {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
        self
    }

    /// URLs passed to `fetch`, in call order.
    pub fn fetch_calls(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }

    /// Item ids actually downloaded, in order.
    pub fn downloaded(&self) -> Vec<String> {
        self.downloaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl FetchEngine for FakeEngine {
    async fn probe(&self, url: &str) -> Result<PlaylistProbe, FetchError> {
        self.probes
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::failed(url, "ERROR: This playlist is not available in your country"))
    }

    async fn fetch(
        &self,
        options: &FetchOptions,
        events: UnboundedSender<FetchEvent>,
    ) -> Result<(), FetchError> {
        let url = options.url();
        self.fetch_calls.lock().unwrap().push(url.to_string());

        let result = self.download(options, &events);
        if let Some(hook) = self.hook.lock().unwrap().as_mut() {
            hook(url);
        }
        result
    }
}

impl FakeEngine {
    fn download(
        &self,
        options: &FetchOptions,
        events: &UnboundedSender<FetchEvent>,
    ) -> Result<(), FetchError> {
        let url = options.url();
        let Some(items) = self.playlists.get(url) else {
            return Err(FetchError::failed(url, "ERROR: Unsupported URL"));
        };

        let ledger = std::fs::read_to_string(options.ledger_path()).unwrap_or_default();
        let recorded: HashSet<&str> = ledger
            .lines()
            .filter_map(|line| line.split_whitespace().last())
            .collect();

        let mut appended = String::new();
        let total = u32::try_from(items.len()).unwrap();
        for (i, id) in items.iter().enumerate() {
            let index = u32::try_from(i + 1).unwrap();
            let _ = events.send(FetchEvent::Queued { index, total });
            if recorded.contains(id.as_str()) {
                let _ = events.send(FetchEvent::AlreadyArchived { item: id.clone() });
                continue;
            }
            let file = options.destination().join(format!("{index:02} - {id}.mp3"));
            std::fs::write(&file, id).map_err(FetchError::io)?;
            appended.push_str(&format!("fake {id}\n"));
            self.downloaded.lock().unwrap().push(id.clone());
            let _ = events.send(FetchEvent::Finished {
                filename: file.display().to_string(),
            });
        }

        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(options.ledger_path())
            .and_then(|mut f| f.write_all(appended.as_bytes()))
            .map_err(FetchError::io)
    }
}
