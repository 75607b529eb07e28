//! Stream resolution.
//!
//! No upstream failure is fatal to a response: a torrent that cannot be
//! listed degrades to an infohash fallback stream, a file whose download
//! URL cannot be issued degrades likewise, and a dead indexer or debrid
//! degrades to an empty list.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::debrid::{CachedFileInfo, DebridClient};
use crate::metadata::MetadataProvider;
use crate::scraper::{JackettScraper, ScrapeRequest, Torrent, TorrentManager};
use crate::selector::select_files;
use crate::stream::{
    extract_codec, extract_quality, extract_source, format_bytes, BehaviorHints, StreamOutput,
    StreamRequest, ADDON_NAME,
};
use crate::worker::WorkerPool;

/// Pipeline tuning knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// End-to-end deadline for one request.
    pub request_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Resolves stream requests against the indexer and the debrid cache.
pub struct StreamPipeline {
    scraper: Arc<JackettScraper>,
    torrent_manager: Arc<dyn TorrentManager>,
    debrid: Arc<dyn DebridClient>,
    metadata: Arc<dyn MetadataProvider>,
    worker: Option<Arc<WorkerPool>>,
    config: PipelineConfig,
}

impl StreamPipeline {
    pub fn new(
        scraper: Arc<JackettScraper>,
        torrent_manager: Arc<dyn TorrentManager>,
        debrid: Arc<dyn DebridClient>,
        metadata: Arc<dyn MetadataProvider>,
    ) -> Self {
        Self {
            scraper,
            torrent_manager,
            debrid,
            metadata,
            worker: None,
            config: PipelineConfig::default(),
        }
    }

    /// Attach the background pool; series requests start enqueueing
    /// prefetch tasks after their response is assembled.
    pub fn with_worker(mut self, worker: Arc<WorkerPool>) -> Self {
        self.worker = Some(worker);
        self
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve one stream request into a ranked stream list.
    pub async fn resolve(&self, request: &StreamRequest) -> Vec<StreamOutput> {
        let started = std::time::Instant::now();
        info!(request = %request, "stream request");

        let streams = match tokio::time::timeout(
            self.config.request_timeout,
            self.resolve_inner(request),
        )
        .await
        {
            Ok(streams) => streams,
            Err(_) => {
                warn!(request = %request, "stream request hit its deadline");
                Vec::new()
            }
        };

        info!(
            request = %request,
            streams = streams.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "stream request complete"
        );

        // Hand the request to the prefetch machinery without ever blocking
        // the response on it.
        if let Some(worker) = &self.worker {
            if request.is_series() {
                let worker = Arc::clone(worker);
                let metadata = Arc::clone(&self.metadata);
                let request = request.clone();
                tokio::spawn(async move {
                    worker.queue_user_prefetch(&request, metadata.as_ref()).await;
                });
            }
        }

        streams
    }

    async fn resolve_inner(&self, request: &StreamRequest) -> Vec<StreamOutput> {
        // Title lookup, falling back to the external id literal.
        let title = match self.metadata.resolve(&request.id).await {
            Ok(meta) => meta.title,
            Err(e) => {
                warn!(id = %request.id, error = %e, "metadata lookup failed, using id as title");
                request.id.clone()
            }
        };

        let scrape_request = ScrapeRequest {
            title,
            kind: request.kind,
            external_id: request.id.clone(),
            season: request.season,
            episode: request.episode,
        };

        let torrents = self
            .scraper
            .scrape(&scrape_request, self.torrent_manager.as_ref())
            .await;
        debug!(torrents = torrents.len(), "scrape complete");

        if torrents.is_empty() {
            return Vec::new();
        }

        // Deduplicate by infohash, preserving first-seen order.
        let mut by_hash: HashMap<String, &Torrent> = HashMap::new();
        let mut hashes = Vec::new();
        for torrent in &torrents {
            if !torrent.info_hash.is_empty() && !by_hash.contains_key(&torrent.info_hash) {
                by_hash.insert(torrent.info_hash.clone(), torrent);
                hashes.push(torrent.info_hash.clone());
            }
        }

        if hashes.is_empty() {
            return Vec::new();
        }

        debug!(hashes = hashes.len(), "checking debrid availability");
        let checks = match self.debrid.check_cached(&hashes).await {
            Ok(checks) => checks,
            Err(e) => {
                warn!(error = %e, "debrid availability check failed");
                return Vec::new();
            }
        };

        let mut streams = Vec::new();
        for check in &checks {
            if check.hash.is_empty() {
                continue;
            }
            let Some(torrent) = by_hash.get(&check.hash) else {
                continue;
            };

            debug!(title = %torrent.title, hash = %check.hash, "cached torrent");

            let (files, torrent_id) = match self.debrid.list_files(&check.hash).await {
                Ok(listing) => listing,
                Err(e) => {
                    warn!(hash = %check.hash, error = %e, "file listing failed, using fallback");
                    streams.push(self.fallback_stream(torrent, request));
                    continue;
                }
            };

            for file in select_files(&files, request) {
                match self.debrid.resolve_url(&torrent_id, file.index).await {
                    Ok(url) => streams.push(self.url_stream(torrent, file, url, request)),
                    Err(e) => {
                        warn!(file = %file.name, error = %e, "download link failed, using fallback");
                        streams.push(self.file_fallback_stream(torrent, file, request));
                    }
                }
            }
        }

        streams.sort_by(|a, b| b.video_size().cmp(&a.video_size()));
        streams
    }

    fn describe(&self, torrent: &Torrent, size: i64) -> String {
        let quality = extract_quality(&torrent.title);
        let codec = extract_codec(&torrent.title);
        let source = extract_source(&torrent.title);

        let seeders_info = torrent
            .seeders
            .map(|s| format!(" 👥 {s}"))
            .unwrap_or_default();
        let size_info = if size > 0 {
            format!(" 💾 {}", format_bytes(size))
        } else {
            String::new()
        };
        let source_info = if source.is_empty() {
            String::new()
        } else {
            format!(" 🌟 {source}")
        };
        let tracker_info = if torrent.tracker.is_empty() || torrent.tracker == "all" {
            String::new()
        } else {
            format!(" [{}]", torrent.tracker.split(" (").next().unwrap_or(""))
        };

        format!(
            "{}\n⚡ TorBox {quality} {codec}{seeders_info}{size_info}{source_info}{tracker_info}",
            torrent.title
        )
    }

    fn url_stream(
        &self,
        torrent: &Torrent,
        file: &CachedFileInfo,
        url: String,
        request: &StreamRequest,
    ) -> StreamOutput {
        StreamOutput {
            url: Some(url),
            description: self.describe(torrent, file.size),
            name: ADDON_NAME.into(),
            behavior_hints: Some(BehaviorHints {
                binge_group: request.binge_group(&torrent.info_hash),
                video_size: file.size,
                filename: file.name.clone(),
                not_web_ready: false,
            }),
            ..Default::default()
        }
    }

    fn file_fallback_stream(
        &self,
        torrent: &Torrent,
        file: &CachedFileInfo,
        request: &StreamRequest,
    ) -> StreamOutput {
        StreamOutput {
            info_hash: Some(torrent.info_hash.clone()),
            file_idx: Some(file.index),
            description: self.describe(torrent, file.size),
            name: ADDON_NAME.into(),
            sources: torrent.sources.clone(),
            behavior_hints: Some(BehaviorHints {
                binge_group: request.binge_group(&torrent.info_hash),
                video_size: file.size,
                filename: file.name.clone(),
                not_web_ready: true,
            }),
            ..Default::default()
        }
    }

    fn fallback_stream(&self, torrent: &Torrent, request: &StreamRequest) -> StreamOutput {
        StreamOutput {
            info_hash: Some(torrent.info_hash.clone()),
            file_idx: torrent.file_index,
            description: self.describe(torrent, torrent.size),
            name: ADDON_NAME.into(),
            sources: torrent.sources.clone(),
            behavior_hints: Some(BehaviorHints {
                binge_group: request.binge_group(&torrent.info_hash),
                video_size: torrent.size,
                filename: torrent.title.clone(),
                not_web_ready: true,
            }),
            ..Default::default()
        }
    }
}
