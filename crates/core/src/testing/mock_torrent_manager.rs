//! Mock torrent manager.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::scraper::{ScrapeError, TorrentDownload, TorrentManager};
use crate::torrent::{self, TorrentError, TorrentMetadata};

/// [`TorrentManager`] whose downloads come from a preloaded map; parsing
/// and magnet handling are the real implementations.
#[derive(Default)]
pub struct MockTorrentManager {
    downloads: Mutex<HashMap<String, TorrentDownload>>,
    download_count: AtomicUsize,
}

impl MockTorrentManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the outcome for a link.
    pub fn add_download(&self, url: &str, outcome: TorrentDownload) {
        self.downloads
            .lock()
            .unwrap()
            .insert(url.to_string(), outcome);
    }

    /// Number of network fetches that were attempted.
    pub fn download_count(&self) -> usize {
        self.download_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TorrentManager for MockTorrentManager {
    async fn download(&self, url: &str) -> Result<TorrentDownload, ScrapeError> {
        self.download_count.fetch_add(1, Ordering::SeqCst);
        self.downloads
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(ScrapeError::UpstreamStatus(404))
    }

    fn parse_metainfo(&self, bytes: &[u8]) -> Result<TorrentMetadata, TorrentError> {
        torrent::parse_metainfo(bytes)
    }

    fn trackers_from_magnet(&self, magnet: &str) -> Vec<String> {
        torrent::trackers_from_magnet(magnet)
    }
}
