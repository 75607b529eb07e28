//! Prefetch task handlers.
//!
//! The handlers only need to run searches: populating the search cache and
//! the permanent link-hash cache is a side effect of scraping. Per-query
//! failures are logged and ignored.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::scraper::ScrapeRequest;
use crate::stream::MediaKind;

use super::pool::WorkerContext;
use super::task::{BackgroundTask, TaskKind};

const SERIES_DEADLINE: Duration = Duration::from_secs(5 * 60);
const MOVIE_DEADLINE: Duration = Duration::from_secs(3 * 60);
const SERIES_PARALLELISM: usize = 5;

pub(crate) async fn run(ctx: Arc<WorkerContext>, task: BackgroundTask) {
    match task.kind {
        TaskKind::SeriesPrefetch => {
            if tokio::time::timeout(SERIES_DEADLINE, prefetch_series(&ctx, &task))
                .await
                .is_err()
            {
                warn!(title = %task.title, "series prefetch hit its deadline");
            }
        }
        TaskKind::MoviePrefetch => {
            if tokio::time::timeout(MOVIE_DEADLINE, prefetch_movie(&ctx, &task))
                .await
                .is_err()
            {
                warn!(title = %task.title, "movie prefetch hit its deadline");
            }
        }
        // The trending work itself happens in the feeder; nothing to do.
        TaskKind::TrendingPrefetch => {}
    }
}

fn background_request(task: &BackgroundTask, query: String) -> ScrapeRequest {
    // Background queries search as plain text so no series-scope filtering
    // drops the pack results we want to warm.
    ScrapeRequest {
        title: query,
        kind: MediaKind::Movie,
        external_id: task.external_id.clone(),
        season: None,
        episode: None,
    }
}

async fn prefetch_series(ctx: &WorkerContext, task: &BackgroundTask) {
    info!(title = %task.title, external_id = %task.external_id, "prefetching series seasons");

    let mut queries = vec![
        format!("{} complet", task.title),
        format!("{} pack", task.title),
    ];
    for season in 1..=task.total_seasons {
        queries.push(format!("{} S{season:02}", task.title));
    }

    let semaphore = Arc::new(Semaphore::new(SERIES_PARALLELISM));
    let searches = queries.into_iter().map(|query| {
        let semaphore = Arc::clone(&semaphore);
        let search = Arc::clone(&ctx.search);
        let request = background_request(task, query.clone());
        async move {
            let _permit = semaphore.acquire().await.expect("semaphore closed");
            let torrents = search(request).await;
            info!(%query, torrents = torrents.len(), "background search complete");
            torrents
        }
    });

    let results = join_all(searches).await;
    let unique: HashSet<String> = results
        .into_iter()
        .flatten()
        .map(|t| t.info_hash)
        .filter(|h| !h.is_empty())
        .collect();

    info!(
        title = %task.title,
        hashes = unique.len(),
        "series prefetch complete"
    );
}

async fn prefetch_movie(ctx: &WorkerContext, task: &BackgroundTask) {
    info!(title = %task.title, external_id = %task.external_id, "prefetching movie");

    let query = if task.year.is_empty() {
        task.title.clone()
    } else {
        format!("{} {}", task.title, task.year)
    };

    let torrents = (ctx.search)(background_request(task, query)).await;
    let unique: HashSet<&str> = torrents
        .iter()
        .map(|t| t.info_hash.as_str())
        .filter(|h| !h.is_empty())
        .collect();

    info!(
        title = %task.title,
        hashes = unique.len(),
        "movie prefetch complete"
    );
}
