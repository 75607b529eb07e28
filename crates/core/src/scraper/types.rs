//! Types for the scraping subsystem.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stream::MediaKind;
use crate::torrent::{TorrentError, TorrentMetadata};

/// A scrape request: the stream request enriched with the resolved title.
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub title: String,
    pub kind: MediaKind,
    /// External id, carried through for prefetch bookkeeping.
    pub external_id: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl ScrapeRequest {
    pub fn is_series(&self) -> bool {
        self.kind == MediaKind::Series
    }
}

/// A raw result from the indexer, as Jackett returns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexerResult {
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Link", default)]
    pub link: Option<String>,
    #[serde(rename = "InfoHash", default)]
    pub info_hash: Option<String>,
    #[serde(rename = "MagnetUri", default)]
    pub magnet_uri: Option<String>,
    #[serde(rename = "Seeders", default)]
    pub seeders: Option<i64>,
    #[serde(rename = "Size", default)]
    pub size: i64,
    #[serde(rename = "Tracker", default)]
    pub tracker: String,
    /// Opaque key used only for intra-batch deduplication.
    #[serde(rename = "Details", default)]
    pub details: String,
}

/// A scraped torrent with its canonical infohash resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Torrent {
    pub title: String,
    /// Lowercase 40-hex infohash.
    pub info_hash: String,
    pub file_index: Option<u32>,
    pub seeders: Option<i64>,
    pub size: i64,
    pub tracker: String,
    /// Tracker URLs usable as stream sources.
    pub sources: Vec<String>,
}

/// Outcome of fetching a torrent link: either metainfo bytes or a magnet
/// URI the link redirected to.
#[derive(Debug, Clone)]
pub enum TorrentDownload {
    Metainfo(Vec<u8>),
    Magnet(String),
}

/// Errors from scraping and hash resolution.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("indexer request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("indexer returned status {0}")]
    UpstreamStatus(u16),

    #[error(transparent)]
    BadTorrent(#[from] TorrentError),

    #[error("no info hash could be derived for '{0}'")]
    Unresolvable(String),
}

/// The indexer capability: one query in, raw results out.
#[async_trait]
pub trait Indexer: Send + Sync {
    async fn fetch_raw(&self, query: &str) -> Result<Vec<IndexerResult>, ScrapeError>;
}

/// Torrent-file access used during hash resolution.
#[async_trait]
pub trait TorrentManager: Send + Sync {
    /// Fetch a torrent link; magnet redirects surface as
    /// [`TorrentDownload::Magnet`].
    async fn download(&self, url: &str) -> Result<TorrentDownload, ScrapeError>;

    /// Parse a metainfo blob.
    fn parse_metainfo(&self, bytes: &[u8]) -> Result<TorrentMetadata, TorrentError>;

    /// Extract tracker URLs from a magnet URI.
    fn trackers_from_magnet(&self, magnet: &str) -> Vec<String>;
}
