//! TorBox API client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::cache::CacheStore;

use super::{CacheCheck, CachedFileInfo, DebridClient, DebridError};

const DEFAULT_BASE_URL: &str = "https://api.torbox.app/v1/api";
const USER_AGENT: &str = "Mozilla/5.0";

/// TorBox client configuration.
#[derive(Debug, Clone)]
pub struct TorBoxConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub timeout: Duration,
    /// TTL for the availability-check cache layer.
    pub check_ttl: Duration,
}

impl Default for TorBoxConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            timeout: Duration::from_secs(28),
            check_ttl: Duration::from_secs(10 * 60),
        }
    }
}

/// TorBox debrid client.
#[derive(Debug)]
pub struct TorBoxClient {
    client: Client,
    base_url: String,
    api_key: String,
    cache: Option<Arc<CacheStore>>,
    check_ttl: Duration,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    detail: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct CreatedTorrent {
    torrent_id: i64,
}

#[derive(Debug, Deserialize)]
struct TorrentInfo {
    #[serde(default)]
    files: Vec<TorrentInfoFile>,
}

#[derive(Debug, Deserialize)]
struct TorrentInfoFile {
    #[serde(default)]
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default)]
    size: i64,
}

impl TorBoxClient {
    pub fn new(config: TorBoxConfig) -> Result<Self, DebridError> {
        if config.api_key.is_empty() {
            return Err(DebridError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: config.api_key,
            cache: None,
            check_ttl: config.check_ttl,
        })
    }

    /// Attach the shared cache; availability checks become TTL-cached.
    pub fn with_cache(mut self, cache: Arc<CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    fn check_cache_key(hashes: &[String]) -> String {
        let mut sorted: Vec<&str> = hashes.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        let digest = Sha256::digest(sorted.join(",").as_bytes());
        format!("torbox_check_{}", hex::encode(digest))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Envelope<T>, DebridError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DebridError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        Ok(response.json().await?)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: serde_json::Value,
    ) -> Result<Envelope<T>, DebridError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .query(query)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("User-Agent", USER_AGENT)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DebridError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl DebridClient for TorBoxClient {
    async fn check_cached(&self, hashes: &[String]) -> Result<Vec<CacheCheck>, DebridError> {
        if hashes.is_empty() {
            return Ok(Vec::new());
        }

        let cache_key = Self::check_cache_key(hashes);
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get_as::<Vec<CacheCheck>>(&cache_key).await {
                debug!(hashes = hashes.len(), "availability check served from cache");
                return Ok(cached);
            }
        }

        let envelope: Envelope<Vec<CacheCheck>> = self
            .post_json(
                "/torrents/checkcached",
                &[("format", "object"), ("list_files", "true")],
                json!({ "hashes": hashes }),
            )
            .await?;

        let checks = envelope.data.unwrap_or_default();
        debug!(
            requested = hashes.len(),
            cached = checks.len(),
            "availability check complete"
        );

        if let Some(cache) = &self.cache {
            cache.set_as(&cache_key, &checks, self.check_ttl).await;
        }

        Ok(checks)
    }

    async fn create_by_magnet(&self, magnet: &str) -> Result<String, DebridError> {
        let envelope: Envelope<CreatedTorrent> = self
            .post_json(
                "/torrents/createtorrent",
                &[],
                json!({ "magnet": magnet, "seed": 1, "allow_zip": false }),
            )
            .await?;

        if !envelope.success {
            return Err(DebridError::Rejected(
                envelope.detail.unwrap_or_else(|| "create failed".into()),
            ));
        }

        envelope
            .data
            .map(|d| d.torrent_id.to_string())
            .ok_or_else(|| DebridError::Rejected("create returned no torrent id".into()))
    }

    async fn list_files(
        &self,
        hash: &str,
    ) -> Result<(Vec<CachedFileInfo>, String), DebridError> {
        // For cached content, creating the torrent is instant and hands us
        // the id the download endpoint needs.
        let magnet = format!("magnet:?xt=urn:btih:{hash}");
        let torrent_id = self.create_by_magnet(&magnet).await?;

        let envelope: Envelope<TorrentInfo> = self
            .get_json("/torrents/mylist", &[("id", torrent_id.as_str())])
            .await?;

        let info = envelope.data.unwrap_or_else(|| {
            warn!(hash, "torrent listing returned no data");
            TorrentInfo { files: Vec::new() }
        });

        let files = info
            .files
            .into_iter()
            .map(|f| CachedFileInfo {
                name: f.name,
                size: f.size,
                index: f.id,
            })
            .collect();

        Ok((files, torrent_id))
    }

    async fn resolve_url(
        &self,
        torrent_id: &str,
        file_index: u32,
    ) -> Result<String, DebridError> {
        let file_id = file_index.to_string();
        let envelope: Envelope<String> = self
            .get_json(
                "/torrents/requestdl",
                &[
                    ("token", self.api_key.as_str()),
                    ("torrent_id", torrent_id),
                    ("file_id", file_id.as_str()),
                ],
            )
            .await?;

        if !envelope.success {
            return Err(DebridError::Rejected(
                envelope
                    .detail
                    .unwrap_or_else(|| "download link refused".into()),
            ));
        }

        envelope
            .data
            .filter(|url| !url.is_empty())
            .ok_or_else(|| DebridError::Rejected("empty download link".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let err = TorBoxClient::new(TorBoxConfig::default()).unwrap_err();
        assert!(matches!(err, DebridError::MissingApiKey));
    }

    #[test]
    fn test_check_cache_key_is_order_insensitive() {
        let a = vec!["bbb".to_string(), "aaa".to_string()];
        let b = vec!["aaa".to_string(), "bbb".to_string()];
        assert_eq!(
            TorBoxClient::check_cache_key(&a),
            TorBoxClient::check_cache_key(&b)
        );
    }

    #[test]
    fn test_check_cache_key_distinguishes_sets() {
        let a = vec!["aaa".to_string()];
        let b = vec!["aaa".to_string(), "bbb".to_string()];
        assert_ne!(
            TorBoxClient::check_cache_key(&a),
            TorBoxClient::check_cache_key(&b)
        );
    }

    #[tokio::test]
    async fn test_check_cached_empty_input_shortcircuits() {
        let client = TorBoxClient::new(TorBoxConfig {
            api_key: "key".into(),
            ..Default::default()
        })
        .unwrap();
        let checks = client.check_cached(&[]).await.unwrap();
        assert!(checks.is_empty());
    }
}
