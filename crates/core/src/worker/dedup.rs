//! Task deduplication.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::debug;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);
const MAX_ENTRY_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Remembers recently queued task ids so the same work is not enqueued
/// twice within a caller-chosen window.
#[derive(Default)]
pub struct TaskDeduplicator {
    pending: Mutex<HashMap<String, Instant>>,
}

impl TaskDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically decide whether `id` may be queued: yes when it has no
    /// record or its record is older than `max_age`. An accept replaces
    /// the timestamp.
    pub fn should_queue(&self, id: &str, max_age: Duration) -> bool {
        let mut pending = self.pending.lock().expect("dedup lock poisoned");
        if let Some(queued_at) = pending.get(id) {
            if queued_at.elapsed() < max_age {
                return false;
            }
        }
        pending.insert(id.to_string(), Instant::now());
        true
    }

    /// Clear a record once its task completed.
    pub fn remove(&self, id: &str) {
        self.pending.lock().expect("dedup lock poisoned").remove(id);
    }

    pub fn len(&self) -> usize {
        self.pending.lock().expect("dedup lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries older than 24 hours. Called hourly by the sweep loop;
    /// public for tests.
    pub fn sweep(&self) {
        let mut pending = self.pending.lock().expect("dedup lock poisoned");
        let before = pending.len();
        pending.retain(|_, queued_at| queued_at.elapsed() <= MAX_ENTRY_AGE);
        let removed = before - pending.len();
        if removed > 0 {
            debug!(removed, "swept stale dedup entries");
        }
    }

    /// Spawn the hourly sweep loop; exits on the shutdown signal.
    pub fn start_sweep(self: &Arc<Self>, shutdown: &broadcast::Sender<()>) {
        let dedup = Arc::clone(self);
        let mut shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(SWEEP_INTERVAL);
            tick.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = tick.tick() => dedup.sweep(),
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_queue_accepted() {
        let dedup = TaskDeduplicator::new();
        assert!(dedup.should_queue("id1", Duration::from_secs(60)));
    }

    #[test]
    fn test_repeat_within_window_rejected() {
        let dedup = TaskDeduplicator::new();
        assert!(dedup.should_queue("id1", Duration::from_secs(60)));
        assert!(!dedup.should_queue("id1", Duration::from_secs(60)));
    }

    #[test]
    fn test_accepted_again_after_window() {
        let dedup = TaskDeduplicator::new();
        assert!(dedup.should_queue("id1", Duration::from_millis(10)));
        std::thread::sleep(Duration::from_millis(30));
        assert!(dedup.should_queue("id1", Duration::from_millis(10)));
    }

    #[test]
    fn test_remove_reopens_immediately() {
        let dedup = TaskDeduplicator::new();
        assert!(dedup.should_queue("id1", Duration::from_secs(60)));
        dedup.remove("id1");
        assert!(dedup.should_queue("id1", Duration::from_secs(60)));
    }

    #[test]
    fn test_independent_ids() {
        let dedup = TaskDeduplicator::new();
        assert!(dedup.should_queue("id1", Duration::from_secs(60)));
        assert!(dedup.should_queue("id2", Duration::from_secs(60)));
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn test_sweep_keeps_recent_entries() {
        let dedup = TaskDeduplicator::new();
        dedup.should_queue("fresh", Duration::from_secs(60));
        dedup.sweep();
        assert_eq!(dedup.len(), 1);
    }
}
