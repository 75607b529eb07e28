use std::sync::Arc;

use strembox_core::{CacheStore, StreamPipeline, WorkerPool};

/// Shared application state.
pub struct AppState {
    pipeline: Arc<StreamPipeline>,
    cache: Arc<CacheStore>,
    worker: Arc<WorkerPool>,
}

impl AppState {
    pub fn new(
        pipeline: Arc<StreamPipeline>,
        cache: Arc<CacheStore>,
        worker: Arc<WorkerPool>,
    ) -> Self {
        Self {
            pipeline,
            cache,
            worker,
        }
    }

    pub fn pipeline(&self) -> &StreamPipeline {
        &self.pipeline
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn worker(&self) -> &Arc<WorkerPool> {
        &self.worker
    }
}
