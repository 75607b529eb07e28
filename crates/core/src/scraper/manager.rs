//! HTTP torrent manager.
//!
//! Fetches .torrent links from indexers. Some links redirect to magnet
//! URIs instead of serving metainfo bytes; a custom redirect policy stops
//! at non-http schemes so the magnet survives as a `Location` header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, redirect, Client};

use crate::torrent::{self, TorrentError, TorrentMetadata};

use super::{ScrapeError, TorrentDownload, TorrentManager};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Downloads torrent files over HTTP and parses them locally.
pub struct HttpTorrentManager {
    client: Client,
}

impl Default for HttpTorrentManager {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTorrentManager {
    pub fn new() -> Self {
        let policy = redirect::Policy::custom(|attempt| {
            if attempt.url().scheme().starts_with("http") {
                attempt.follow()
            } else {
                attempt.stop()
            }
        });

        let client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .redirect(policy)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self { client }
    }
}

#[async_trait]
impl TorrentManager for HttpTorrentManager {
    async fn download(&self, url: &str) -> Result<TorrentDownload, ScrapeError> {
        let response = self.client.get(url).send().await?;

        if response.status().is_redirection() {
            if let Some(location) = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
            {
                if location.starts_with("magnet:") {
                    return Ok(TorrentDownload::Magnet(location.to_string()));
                }
            }
            return Err(ScrapeError::UpstreamStatus(response.status().as_u16()));
        }

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::UpstreamStatus(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        Ok(TorrentDownload::Metainfo(bytes.to_vec()))
    }

    fn parse_metainfo(&self, bytes: &[u8]) -> Result<TorrentMetadata, TorrentError> {
        torrent::parse_metainfo(bytes)
    }

    fn trackers_from_magnet(&self, magnet: &str) -> Vec<String> {
        torrent::trackers_from_magnet(magnet)
    }
}
