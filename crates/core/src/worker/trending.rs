//! Trending feeder.
//!
//! Periodically turns the metadata provider's trending list into
//! low-priority prefetch tasks. Admission is controlled by queue depth so
//! trending backfill never starves user-triggered work.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::metadata::MetadataProvider;

use super::task::{BackgroundTask, TaskKind, PRIORITY_TRENDING};
use super::WorkerPool;

const TRENDING_DEDUP_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);
const TRENDING_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_TRENDING_ITEMS: usize = 40;
/// Seasons assumed for trending shows whose count is unknown.
const ASSUMED_SEASONS: u32 = 5;
/// Skip the whole cycle when the queue is already this busy.
const IDLE_THRESHOLD: usize = 10;
/// Stop enqueueing mid-cycle past this depth.
const DEPTH_LIMIT: usize = 30;

/// Feeder tuning; tests shrink the cadence and pacing.
#[derive(Debug, Clone)]
pub struct TrendingFeederConfig {
    pub interval: Duration,
    /// Pause between enqueues to spread the load.
    pub pause: Duration,
}

impl Default for TrendingFeederConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(12 * 60 * 60),
            pause: Duration::from_secs(2),
        }
    }
}

/// Periodic producer of trending prefetch tasks.
pub struct TrendingFeeder {
    pool: Arc<WorkerPool>,
    metadata: Arc<dyn MetadataProvider>,
    config: TrendingFeederConfig,
}

impl TrendingFeeder {
    pub fn new(
        pool: Arc<WorkerPool>,
        metadata: Arc<dyn MetadataProvider>,
        config: TrendingFeederConfig,
    ) -> Self {
        Self {
            pool,
            metadata,
            config,
        }
    }

    /// Spawn the feeder loop: one run at startup, then every interval.
    /// Exits on the shutdown signal.
    pub fn start(self, shutdown: &broadcast::Sender<()>) {
        let mut shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            info!("trending feeder started");
            self.run_once().await;

            let mut tick = tokio::time::interval(self.config.interval);
            tick.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = tick.tick() => self.run_once().await,
                }
            }
            debug!("trending feeder stopped");
        });
    }

    /// One feeder cycle. Public for tests.
    pub async fn run_once(&self) {
        debug!("checking for trending content to prefetch");

        if self.pool.queue_len() > IDLE_THRESHOLD {
            debug!("queue not idle, skipping trending prefetch");
            return;
        }

        let trending = match tokio::time::timeout(
            TRENDING_FETCH_TIMEOUT,
            self.metadata.trending_tv(),
        )
        .await
        {
            Ok(Ok(trending)) => trending,
            Ok(Err(e)) => {
                warn!(error = %e, "failed to fetch trending shows");
                return;
            }
            Err(_) => {
                warn!("trending fetch timed out");
                return;
            }
        };

        let total = trending.len().min(MAX_TRENDING_ITEMS);
        info!(total, "trending items to prefetch");

        let mut queued = 0;
        for item in trending.into_iter().take(MAX_TRENDING_ITEMS) {
            if !self
                .pool
                .dedup()
                .should_queue(&item.provider_id, TRENDING_DEDUP_WINDOW)
            {
                debug!(title = %item.title, "already prefetched recently");
                continue;
            }

            let external_id = self
                .metadata
                .imdb_id_for(&item.media_type, &item.provider_id)
                .await
                .unwrap_or_default();

            let (kind, total_seasons) = if item.media_type == "movie" {
                (TaskKind::MoviePrefetch, 0)
            } else {
                (TaskKind::SeriesPrefetch, ASSUMED_SEASONS)
            };

            let task = BackgroundTask {
                kind,
                id: item.provider_id,
                external_id,
                title: item.title,
                year: item.year,
                total_seasons,
                priority: PRIORITY_TRENDING,
            };

            if !self.pool.try_submit(task) {
                warn!(queued, "queue full, stopping trending prefetch");
                return;
            }
            queued += 1;
            debug!(queued, total, "queued trending prefetch");

            if self.pool.queue_len() > DEPTH_LIMIT {
                warn!(queued, "queue filling up, pausing trending prefetch");
                return;
            }

            if !self.config.pause.is_zero() {
                tokio::time::sleep(self.config.pause).await;
            }
        }

        info!(queued, "trending prefetch cycle complete");
    }
}
