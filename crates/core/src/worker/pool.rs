//! Bounded worker pool for background tasks.
//!
//! Submission never blocks: a full queue drops the task with a diagnostic.
//! Two shutdown modes exist. The stop signal makes workers finish only the
//! task in hand and exit without draining the queue; closing the queue
//! makes them drain the remaining entries and exit. The shipped
//! [`WorkerPool::shutdown`] does both and waits up to 30 seconds.

use std::sync::{Arc, Mutex as StdMutex, RwLock as StdRwLock};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::metadata::MetadataProvider;
use crate::scraper::{ScrapeRequest, Torrent};
use crate::stream::{MediaKind, StreamRequest};

use super::prefetch;
use super::task::{BackgroundTask, TaskKind, PRIORITY_USER};
use super::TaskDeduplicator;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
const USER_DEDUP_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// The search entry point handed to the pool; breaks the cycle between
/// the pipeline (which owns the scraper) and the workers (which need it).
pub type SearchFn =
    Arc<dyn Fn(ScrapeRequest) -> BoxFuture<'static, Vec<Torrent>> + Send + Sync>;

/// Pool sizing.
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            queue_capacity: 50,
        }
    }
}

pub(crate) struct WorkerContext {
    pub search: SearchFn,
    pub dedup: Arc<TaskDeduplicator>,
}

/// Bounded queue plus N draining workers.
pub struct WorkerPool {
    queue_tx: StdRwLock<Option<mpsc::Sender<BackgroundTask>>>,
    queue_capacity: usize,
    stop_tx: broadcast::Sender<()>,
    handles: StdMutex<Vec<JoinHandle<()>>>,
    dedup: Arc<TaskDeduplicator>,
}

impl WorkerPool {
    /// Create the pool and start its workers.
    pub fn new(search: SearchFn, config: WorkerPoolConfig) -> Arc<Self> {
        let (queue_tx, queue_rx) = mpsc::channel(config.queue_capacity);
        let (stop_tx, _) = broadcast::channel(1);
        let dedup = Arc::new(TaskDeduplicator::new());

        let pool = Arc::new(Self {
            queue_tx: StdRwLock::new(Some(queue_tx)),
            queue_capacity: config.queue_capacity,
            stop_tx: stop_tx.clone(),
            handles: StdMutex::new(Vec::new()),
            dedup: Arc::clone(&dedup),
        });

        let ctx = Arc::new(WorkerContext {
            search,
            dedup: Arc::clone(&dedup),
        });
        let queue_rx = Arc::new(Mutex::new(queue_rx));

        let mut handles = pool.handles.lock().expect("handles lock poisoned");
        for worker_id in 0..config.workers.max(1) {
            let queue_rx = Arc::clone(&queue_rx);
            let stop_rx = stop_tx.subscribe();
            let ctx = Arc::clone(&ctx);
            handles.push(tokio::spawn(worker_loop(worker_id, queue_rx, stop_rx, ctx)));
        }
        drop(handles);

        info!(workers = config.workers.max(1), "background workers started");
        pool
    }

    pub fn dedup(&self) -> &Arc<TaskDeduplicator> {
        &self.dedup
    }

    /// Start the dedup sweep loop alongside the pool.
    pub fn start_maintenance(&self, shutdown: &broadcast::Sender<()>) {
        self.dedup.start_sweep(shutdown);
    }

    /// Tasks currently waiting in the queue.
    pub fn queue_len(&self) -> usize {
        let guard = self.queue_tx.read().expect("queue lock poisoned");
        match guard.as_ref() {
            Some(tx) => self.queue_capacity - tx.capacity(),
            None => 0,
        }
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Non-blocking submission. A full or closed queue drops the task.
    pub fn try_submit(&self, task: BackgroundTask) -> bool {
        let guard = self.queue_tx.read().expect("queue lock poisoned");
        let Some(tx) = guard.as_ref() else {
            warn!(title = %task.title, "queue closed, dropping task");
            return false;
        };
        match tx.try_send(task) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(task)) => {
                warn!(title = %task.title, "queue full, dropping task");
                false
            }
            Err(mpsc::error::TrySendError::Closed(task)) => {
                warn!(title = %task.title, "queue closed, dropping task");
                false
            }
        }
    }

    /// Enqueue a user-triggered series prefetch for a just-served request.
    pub async fn queue_user_prefetch(
        &self,
        request: &StreamRequest,
        metadata: &dyn MetadataProvider,
    ) {
        if request.kind != MediaKind::Series {
            return;
        }

        let meta = match metadata.resolve(&request.id).await {
            Ok(meta) => meta,
            Err(e) => {
                debug!(id = %request.id, error = %e, "prefetch metadata lookup failed");
                return;
            }
        };
        let details = match metadata.tv_details(&meta.provider_id).await {
            Ok(details) => details,
            Err(e) => {
                debug!(id = %request.id, error = %e, "prefetch show details failed");
                return;
            }
        };

        if !self.dedup.should_queue(&meta.provider_id, USER_DEDUP_WINDOW) {
            debug!(title = %details.name, "prefetch already queued recently");
            return;
        }

        let task = BackgroundTask {
            kind: TaskKind::SeriesPrefetch,
            id: meta.provider_id,
            external_id: request.id.clone(),
            title: details.name,
            year: details.year,
            total_seasons: details.number_of_seasons,
            priority: PRIORITY_USER,
        };

        if self.try_submit(task) {
            debug!(id = %request.id, "queued series prefetch");
        }
    }

    /// Signal workers to finish their current task and exit, abandoning
    /// whatever is still queued.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(());
    }

    /// Close the queue; workers drain the remaining entries and exit.
    pub fn close_queue(&self) {
        self.queue_tx.write().expect("queue lock poisoned").take();
    }

    /// Join all workers, bounded by `timeout`. Returns false on timeout.
    pub async fn wait(&self, timeout: Duration) -> bool {
        let handles: Vec<JoinHandle<()>> = {
            let mut guard = self.handles.lock().expect("handles lock poisoned");
            guard.drain(..).collect()
        };

        let join = async {
            for handle in handles {
                let _ = handle.await;
            }
        };

        tokio::time::timeout(timeout, join).await.is_ok()
    }

    /// The shipped shutdown path: stop signal, queue close, bounded wait.
    pub async fn shutdown(&self) {
        info!("stopping background workers");
        self.stop();
        self.close_queue();
        if self.wait(SHUTDOWN_TIMEOUT).await {
            info!("all background workers stopped");
        } else {
            warn!("background workers did not stop within timeout");
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    queue_rx: Arc<Mutex<mpsc::Receiver<BackgroundTask>>>,
    mut stop_rx: broadcast::Receiver<()>,
    ctx: Arc<WorkerContext>,
) {
    debug!(worker_id, "worker started");
    loop {
        let task = {
            let mut rx = queue_rx.lock().await;
            tokio::select! {
                biased;
                _ = stop_rx.recv() => {
                    debug!(worker_id, "worker received stop signal");
                    return;
                }
                task = rx.recv() => match task {
                    Some(task) => task,
                    None => {
                        debug!(worker_id, "queue closed, worker exiting");
                        return;
                    }
                },
            }
        };

        let task_id = task.id.clone();
        let title = task.title.clone();
        info!(worker_id, kind = task.kind.as_str(), %title, "task started");

        // Run the handler in its own task so a panic never takes the
        // worker down with it.
        let handler_ctx = Arc::clone(&ctx);
        let join = tokio::spawn(async move { prefetch::run(handler_ctx, task).await });
        if let Err(e) = join.await {
            if e.is_panic() {
                error!(worker_id, %title, "task handler panicked");
            }
        }

        ctx.dedup.remove(&task_id);
        info!(worker_id, %title, "task complete");
    }
}
