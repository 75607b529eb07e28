//! Scrape orchestration.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::matcher::{should_keep_series_result, TitleMatcher};

use super::{resolve_torrent, Indexer, IndexerResult, ScrapeError, ScrapeRequest, Torrent,
    TorrentManager};

/// Scrapes the indexer for one request: query variants, cached raw
/// fetches, dedup, title/pack filtering and hash resolution.
pub struct JackettScraper {
    indexer: Arc<dyn Indexer>,
    cache: Arc<CacheStore>,
    search_ttl: Duration,
    matcher: TitleMatcher,
}

impl JackettScraper {
    pub fn new(indexer: Arc<dyn Indexer>, cache: Arc<CacheStore>, search_ttl: Duration) -> Self {
        Self {
            indexer,
            cache,
            search_ttl,
            matcher: TitleMatcher::default(),
        }
    }

    /// Query variants for a request: movies search by title, series add
    /// season and pack spellings.
    fn build_queries(request: &ScrapeRequest) -> Vec<String> {
        let title = &request.title;
        if !request.is_series() {
            return vec![title.clone()];
        }

        let season = request.season.unwrap_or(1);
        let mut queries = vec![
            format!("{title} s{season:02}"),
            format!("{title} complet"),
            format!("{title} pack"),
        ];
        if season != 1 {
            queries.push(format!("{title} s01-"));
        }
        queries
    }

    fn search_cache_key(query: &str) -> String {
        let digest = Sha256::digest(query.as_bytes());
        format!("jackett_search_{}", hex::encode(digest))
    }

    /// Fetch one query, consulting the search cache first.
    async fn fetch_cached(&self, query: &str) -> Result<Vec<IndexerResult>, ScrapeError> {
        let cache_key = Self::search_cache_key(query);
        if let Some(results) = self.cache.get_as::<Vec<IndexerResult>>(&cache_key).await {
            debug!(query, "search served from cache");
            return Ok(results);
        }

        let results = self.indexer.fetch_raw(query).await?;
        if self.search_ttl > Duration::ZERO {
            self.cache
                .set_as(&cache_key, &results, self.search_ttl)
                .await;
        }
        Ok(results)
    }

    /// Run the full scrape for a request.
    ///
    /// Upstream failures on individual queries or results degrade to fewer
    /// torrents, never to an error.
    pub async fn scrape(
        &self,
        request: &ScrapeRequest,
        manager: &dyn TorrentManager,
    ) -> Vec<Torrent> {
        let queries = Self::build_queries(request);

        let fetches = queries.iter().map(|query| self.fetch_cached(query));
        let batches = join_all(fetches).await;

        let mut seen_details = HashSet::new();
        let mut candidates = Vec::new();
        for (query, batch) in queries.iter().zip(batches) {
            let batch = match batch {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(%query, error = %e, "indexer query failed");
                    continue;
                }
            };
            for result in batch {
                if !seen_details.insert(result.details.clone()) {
                    continue;
                }
                if !self.matcher.matches(&request.title, &result.title) {
                    debug!(expected = %request.title, got = %result.title, "title mismatch");
                    continue;
                }
                if request.is_series() {
                    let season = request.season.unwrap_or(1);
                    let episode = request.episode.unwrap_or(1);
                    if !should_keep_series_result(&result.title, season, episode) {
                        debug!(title = %result.title, "filtered wrong-scope series result");
                        continue;
                    }
                }
                candidates.push(result);
            }
        }

        debug!(
            candidates = candidates.len(),
            "resolving infohashes for surviving results"
        );

        let resolutions = candidates
            .iter()
            .map(|result| resolve_torrent(result, &self.cache, manager));
        let resolved = join_all(resolutions).await;

        candidates
            .iter()
            .zip(resolved)
            .filter_map(|(result, resolution)| match resolution {
                Ok(resolved) => Some(Torrent {
                    title: result.title.clone(),
                    info_hash: resolved.hash,
                    file_index: None,
                    seeders: result.seeders,
                    size: result.size,
                    tracker: result.tracker.clone(),
                    sources: resolved.sources,
                }),
                Err(ScrapeError::Unresolvable(title)) => {
                    debug!(%title, "skipping result with no derivable hash");
                    None
                }
                Err(e) => {
                    warn!(title = %result.title, error = %e, "hash resolution failed");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MediaKind;
    use crate::testing::{fixtures, MockIndexer, MockTorrentManager};
    use tempfile::TempDir;

    const HASH_A: &str = "1619ecc9373c3639f4ee3e261638f29b33a6cbd6";
    const HASH_B: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    fn series_request(title: &str, season: u32, episode: u32) -> ScrapeRequest {
        ScrapeRequest {
            title: title.into(),
            kind: MediaKind::Series,
            external_id: "tt0903747".into(),
            season: Some(season),
            episode: Some(episode),
        }
    }

    fn movie_request(title: &str) -> ScrapeRequest {
        ScrapeRequest {
            title: title.into(),
            kind: MediaKind::Movie,
            external_id: "tt0111161".into(),
            season: None,
            episode: None,
        }
    }

    async fn scraper_with(
        dir: &TempDir,
        indexer: Arc<MockIndexer>,
    ) -> (JackettScraper, Arc<CacheStore>) {
        let cache = Arc::new(CacheStore::open(dir.path().join("cache.json")).await);
        let scraper = JackettScraper::new(indexer, Arc::clone(&cache), Duration::from_secs(60));
        (scraper, cache)
    }

    #[test]
    fn test_movie_queries() {
        let queries = JackettScraper::build_queries(&movie_request("Inception"));
        assert_eq!(queries, vec!["Inception"]);
    }

    #[test]
    fn test_series_queries_first_season() {
        let queries = JackettScraper::build_queries(&series_request("Show Name", 1, 2));
        assert_eq!(
            queries,
            vec!["Show Name s01", "Show Name complet", "Show Name pack"]
        );
    }

    #[test]
    fn test_series_queries_later_season_add_range_probe() {
        let queries = JackettScraper::build_queries(&series_request("Show Name", 3, 2));
        assert!(queries.contains(&"Show Name s01-".to_string()));
    }

    #[test]
    fn test_search_cache_key_stable() {
        assert_eq!(
            JackettScraper::search_cache_key("abc"),
            JackettScraper::search_cache_key("abc")
        );
        assert_ne!(
            JackettScraper::search_cache_key("abc"),
            JackettScraper::search_cache_key("abd")
        );
    }

    #[tokio::test]
    async fn test_scrape_dedups_by_details_and_filters_titles() {
        let dir = TempDir::new().unwrap();
        let indexer = Arc::new(MockIndexer::new());
        indexer.set_results(vec![
            fixtures::indexer_result("Show Name S02 Complete", Some(HASH_A), "d1"),
            // Same details key: dropped even though the title differs.
            fixtures::indexer_result("Show Name S02 Complete PROPER", Some(HASH_B), "d1"),
            // Different work entirely.
            fixtures::indexer_result("Other Series S02", Some(HASH_B), "d2"),
        ]);

        let (scraper, _cache) = scraper_with(&dir, indexer).await;
        let manager = MockTorrentManager::new();
        let torrents = scraper
            .scrape(&series_request("Show Name", 2, 5), &manager)
            .await;

        assert_eq!(torrents.len(), 1);
        assert_eq!(torrents[0].info_hash, HASH_A);
    }

    #[tokio::test]
    async fn test_scrape_applies_pack_policy() {
        let dir = TempDir::new().unwrap();
        let indexer = Arc::new(MockIndexer::new());
        indexer.set_results(vec![
            fixtures::indexer_result("Show Name S02 Complete 1080p", Some(HASH_A), "d1"),
            fixtures::indexer_result("Show Name S03E04", Some(HASH_B), "d2"),
        ]);

        let (scraper, _cache) = scraper_with(&dir, indexer).await;
        let manager = MockTorrentManager::new();
        let torrents = scraper
            .scrape(&series_request("Show Name", 2, 5), &manager)
            .await;

        assert_eq!(torrents.len(), 1);
        assert_eq!(torrents[0].title, "Show Name S02 Complete 1080p");
    }

    #[tokio::test]
    async fn test_scrape_uses_search_cache_on_second_call() {
        let dir = TempDir::new().unwrap();
        let indexer = Arc::new(MockIndexer::new());
        indexer.set_results(vec![fixtures::indexer_result(
            "Inception 1080p",
            Some(HASH_A),
            "d1",
        )]);

        let (scraper, _cache) = scraper_with(&dir, Arc::clone(&indexer)).await;
        let manager = MockTorrentManager::new();

        scraper.scrape(&movie_request("Inception"), &manager).await;
        let first_count = indexer.fetch_count();
        scraper.scrape(&movie_request("Inception"), &manager).await;

        assert_eq!(indexer.fetch_count(), first_count);
    }

    #[tokio::test]
    async fn test_scrape_degrades_on_indexer_failure() {
        let dir = TempDir::new().unwrap();
        let indexer = Arc::new(MockIndexer::new());
        indexer.fail_next(2);

        let (scraper, _cache) = scraper_with(&dir, indexer).await;
        let manager = MockTorrentManager::new();
        let torrents = scraper.scrape(&movie_request("Inception"), &manager).await;

        assert!(torrents.is_empty());
    }
}
