//! Mock indexer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::scraper::{Indexer, IndexerResult, ScrapeError};

/// Controllable [`Indexer`] for tests: fixed results, per-query handlers,
/// failure injection, and a fetch counter.
#[derive(Default)]
pub struct MockIndexer {
    results: Mutex<Vec<IndexerResult>>,
    queries: Mutex<Vec<String>>,
    fetch_count: AtomicUsize,
    fail_remaining: AtomicUsize,
    #[allow(clippy::type_complexity)]
    handler: Mutex<Option<Box<dyn Fn(&str) -> Vec<IndexerResult> + Send + Sync>>>,
}

impl MockIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Results returned for every query (unless a handler is set).
    pub fn set_results(&self, results: Vec<IndexerResult>) {
        *self.results.lock().unwrap() = results;
    }

    /// Per-query result generation.
    pub fn set_handler<F>(&self, handler: F)
    where
        F: Fn(&str) -> Vec<IndexerResult> + Send + Sync + 'static,
    {
        *self.handler.lock().unwrap() = Some(Box::new(handler));
    }

    /// Make the next `n` fetches fail.
    pub fn fail_next(&self, n: usize) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn recorded_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Indexer for MockIndexer {
    async fn fetch_raw(&self, query: &str) -> Result<Vec<IndexerResult>, ScrapeError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());

        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(ScrapeError::UpstreamStatus(503));
        }

        if let Some(handler) = self.handler.lock().unwrap().as_ref() {
            return Ok(handler(query));
        }

        Ok(self.results.lock().unwrap().clone())
    }
}
