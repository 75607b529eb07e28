//! Canonical infohash resolution for one indexer result.
//!
//! Resolution ladder: the hash the indexer already carries, a previously
//! resolved link from the permanent cache, and finally downloading the
//! torrent file (or following its magnet redirect). Successful downloads
//! are cached permanently keyed by link, so a link is fetched at most once
//! across the process lifetime.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::CacheStore;
use crate::torrent::{info_hash_from_magnet, normalize_info_hash};

use super::{IndexerResult, ScrapeError, TorrentDownload, TorrentManager};

/// Permanent cache entry for a resolved link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedHash {
    pub hash: String,
    pub sources: Vec<String>,
}

fn link_cache_key(link: &str) -> String {
    format!("hash_{link}")
}

/// Resolve an indexer result to a canonical lowercase 40-hex infohash and
/// its tracker list. Fails with [`ScrapeError::Unresolvable`] when no hash
/// can be derived; the caller skips the result.
pub async fn resolve_torrent(
    result: &IndexerResult,
    cache: &CacheStore,
    manager: &dyn TorrentManager,
) -> Result<ResolvedHash, ScrapeError> {
    // Step 1: the indexer may already carry the hash.
    if let Some(raw) = result.info_hash.as_deref() {
        if let Some(hash) = normalize_info_hash(raw) {
            let sources = result
                .magnet_uri
                .as_deref()
                .map(|magnet| manager.trackers_from_magnet(magnet))
                .unwrap_or_default();
            return Ok(ResolvedHash { hash, sources });
        }
    }

    let Some(link) = result.link.as_deref().filter(|l| !l.is_empty()) else {
        return Err(ScrapeError::Unresolvable(result.title.clone()));
    };

    // Step 2: a prior resolution of the same link.
    if let Some(resolved) = cache.get_as::<ResolvedHash>(&link_cache_key(link)).await {
        debug!(link, hash = %resolved.hash, "hash served from link cache");
        return Ok(resolved);
    }

    // Step 3: fetch the torrent file and extract, or fall back to the
    // magnet the link redirected to.
    let resolved = match manager.download(link).await? {
        TorrentDownload::Metainfo(bytes) => {
            let meta = manager.parse_metainfo(&bytes)?;
            ResolvedHash {
                hash: meta.info_hash.to_lowercase(),
                sources: meta.trackers,
            }
        }
        TorrentDownload::Magnet(magnet) => {
            let hash = info_hash_from_magnet(&magnet)
                .ok_or_else(|| ScrapeError::Unresolvable(result.title.clone()))?;
            ResolvedHash {
                hash,
                sources: manager.trackers_from_magnet(&magnet),
            }
        }
    };

    if normalize_info_hash(&resolved.hash).is_none() {
        return Err(ScrapeError::Unresolvable(result.title.clone()));
    }

    cache
        .set_permanent_as(&link_cache_key(link), &resolved)
        .await;
    debug!(link, hash = %resolved.hash, "hash extracted and cached");

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockTorrentManager};
    use tempfile::TempDir;

    const HASH: &str = "1619ecc9373c3639f4ee3e261638f29b33a6cbd6";

    async fn store(dir: &TempDir) -> CacheStore {
        CacheStore::open(dir.path().join("cache.json")).await
    }

    fn result_with_hash(raw: &str) -> IndexerResult {
        IndexerResult {
            title: "Some Release".into(),
            info_hash: Some(raw.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_raw_hash_shortcut() {
        let dir = TempDir::new().unwrap();
        let cache = store(&dir).await;
        let manager = MockTorrentManager::new();

        let resolved = resolve_torrent(&result_with_hash(HASH), &cache, &manager)
            .await
            .unwrap();
        assert_eq!(resolved.hash, HASH);
        assert!(resolved.sources.is_empty());
        assert_eq!(manager.download_count(), 0);
    }

    #[tokio::test]
    async fn test_double_encoded_raw_hash() {
        let dir = TempDir::new().unwrap();
        let cache = store(&dir).await;
        let manager = MockTorrentManager::new();

        let double = hex::encode(HASH.as_bytes());
        let resolved = resolve_torrent(&result_with_hash(&double), &cache, &manager)
            .await
            .unwrap();
        assert_eq!(resolved.hash, HASH);
    }

    #[tokio::test]
    async fn test_download_and_permanent_cache() {
        let dir = TempDir::new().unwrap();
        let cache = store(&dir).await;
        let manager = MockTorrentManager::new();

        let blob = fixtures::single_file_metainfo("a.mkv", 10, &["udp://t.example/ann"]);
        manager.add_download("http://indexer.example/dl/1", TorrentDownload::Metainfo(blob));

        let result = IndexerResult {
            title: "Release".into(),
            link: Some("http://indexer.example/dl/1".into()),
            ..Default::default()
        };

        let first = resolve_torrent(&result, &cache, &manager).await.unwrap();
        assert_eq!(manager.download_count(), 1);
        assert_eq!(first.sources, vec!["udp://t.example/ann"]);

        // Second resolution of the same link must not hit the network.
        let second = resolve_torrent(&result, &cache, &manager).await.unwrap();
        assert_eq!(manager.download_count(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_magnet_redirect() {
        let dir = TempDir::new().unwrap();
        let cache = store(&dir).await;
        let manager = MockTorrentManager::new();

        let magnet = format!("magnet:?xt=urn:btih:{HASH}&tr=udp%3A%2F%2Ft.example");
        manager.add_download("http://indexer.example/dl/2", TorrentDownload::Magnet(magnet));

        let result = IndexerResult {
            title: "Release".into(),
            link: Some("http://indexer.example/dl/2".into()),
            ..Default::default()
        };

        let resolved = resolve_torrent(&result, &cache, &manager).await.unwrap();
        assert_eq!(resolved.hash, HASH);
        assert_eq!(resolved.sources, vec!["udp://t.example"]);
    }

    #[tokio::test]
    async fn test_unresolvable_without_hash_or_link() {
        let dir = TempDir::new().unwrap();
        let cache = store(&dir).await;
        let manager = MockTorrentManager::new();

        let result = IndexerResult {
            title: "Nothing Usable".into(),
            ..Default::default()
        };

        let err = resolve_torrent(&result, &cache, &manager).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Unresolvable(_)));
    }
}
