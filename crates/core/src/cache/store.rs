//! Cache store implementation.
//!
//! Reads are lock-free of expiry bookkeeping: an expired entry is simply
//! invisible until the periodic sweep removes it. Writes mark a dirty flag
//! that the snapshotter consumes; the snapshot file is rewritten atomically
//! (temp file + rename) so a crash never leaves a half-written blob.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);
const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(30);

/// Errors from cache persistence.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to write snapshot: {0}")]
    Write(#[from] std::io::Error),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A single cached entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheItem {
    value: Value,
    expires_at: DateTime<Utc>,
    never_expires: bool,
}

impl CacheItem {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.never_expires && now > self.expires_at
    }
}

/// Serialized snapshot layout.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotData {
    items: HashMap<String, CacheItem>,
}

/// Counts reported by [`CacheStore::stats`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub permanent_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

/// Thread-safe cache with TTL and permanent entries, persisted to disk.
#[derive(Debug)]
pub struct CacheStore {
    items: RwLock<HashMap<String, CacheItem>>,
    dirty: AtomicBool,
    snapshot_path: PathBuf,
}

impl CacheStore {
    /// Create a store, loading any existing snapshot from `snapshot_path`.
    ///
    /// A missing snapshot is not an error; a corrupted one is discarded
    /// with a warning and the store starts empty.
    pub async fn open(snapshot_path: impl AsRef<Path>) -> Self {
        let snapshot_path = snapshot_path.as_ref().to_path_buf();
        let items = match Self::load_snapshot(&snapshot_path).await {
            Ok(Some(items)) => {
                info!(entries = items.len(), path = %snapshot_path.display(), "loaded cache snapshot");
                items
            }
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!(error = %e, path = %snapshot_path.display(), "could not load cache snapshot, starting fresh");
                HashMap::new()
            }
        };

        Self {
            items: RwLock::new(items),
            dirty: AtomicBool::new(false),
            snapshot_path,
        }
    }

    /// Spawn the sweep and snapshot loops. Both exit on the shutdown signal.
    pub fn start_maintenance(self: &Arc<Self>, shutdown: &broadcast::Sender<()>) {
        let store = Arc::clone(self);
        let mut shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(SWEEP_INTERVAL);
            tick.tick().await; // immediate first tick is a no-op
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = tick.tick() => store.sweep().await,
                }
            }
            debug!("cache sweep loop stopped");
        });

        let store = Arc::clone(self);
        let mut shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(SNAPSHOT_INTERVAL);
            tick.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = tick.tick() => {
                        if store.dirty.swap(false, Ordering::SeqCst) {
                            if let Err(e) = store.write_snapshot().await {
                                warn!(error = %e, "failed to save cache snapshot");
                                store.dirty.store(true, Ordering::SeqCst);
                            }
                        }
                    }
                }
            }
            debug!("cache snapshot loop stopped");
        });
    }

    /// Look up a raw value. Never returns an expired entry.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let items = self.items.read().await;
        let item = items.get(key)?;
        if item.is_expired(Utc::now()) {
            return None;
        }
        Some(item.value.clone())
    }

    /// Look up a value and deserialize it into `T`.
    ///
    /// Entries whose stored shape no longer matches `T` behave as misses.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key).await?;
        serde_json::from_value(value).ok()
    }

    /// Store a value with a TTL.
    pub async fn set(&self, key: &str, value: Value, ttl: Duration) {
        let item = CacheItem {
            value,
            expires_at: Utc::now()
                + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero()),
            never_expires: false,
        };
        self.items.write().await.insert(key.to_string(), item);
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Serialize `value` and store it with a TTL.
    pub async fn set_as<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        if let Ok(value) = serde_json::to_value(value) {
            self.set(key, value, ttl).await;
        }
    }

    /// Store a value that never expires.
    pub async fn set_permanent(&self, key: &str, value: Value) {
        let item = CacheItem {
            value,
            expires_at: Utc::now(),
            never_expires: true,
        };
        self.items.write().await.insert(key.to_string(), item);
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Serialize `value` and store it permanently.
    pub async fn set_permanent_as<T: Serialize>(&self, key: &str, value: &T) {
        if let Ok(value) = serde_json::to_value(value) {
            self.set_permanent(key, value).await;
        }
    }

    /// Remove a single entry.
    pub async fn delete(&self, key: &str) {
        self.items.write().await.remove(key);
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Remove every entry.
    pub async fn clear(&self) {
        self.items.write().await.clear();
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Number of entries, including not-yet-swept expired ones.
    pub async fn size(&self) -> usize {
        self.items.read().await.len()
    }

    /// Entry counts by state.
    pub async fn stats(&self) -> CacheStats {
        let items = self.items.read().await;
        let now = Utc::now();
        let total = items.len();
        let permanent = items.values().filter(|i| i.never_expires).count();
        let expired = items.values().filter(|i| i.is_expired(now)).count();
        CacheStats {
            total_entries: total,
            permanent_entries: permanent,
            expired_entries: expired,
            active_entries: total - expired,
        }
    }

    /// Remove expired entries. Called by the sweep loop; public for tests.
    pub async fn sweep(&self) {
        let mut items = self.items.write().await;
        let now = Utc::now();
        let before = items.len();
        items.retain(|_, item| !item.is_expired(now));
        let removed = before - items.len();
        drop(items);

        if removed > 0 {
            debug!(removed, "swept expired cache entries");
            self.dirty.store(true, Ordering::SeqCst);
        }
    }

    /// Write the snapshot unconditionally. Used at shutdown.
    pub async fn flush(&self) -> Result<(), CacheError> {
        self.write_snapshot().await?;
        self.dirty.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn write_snapshot(&self) -> Result<(), CacheError> {
        let data = {
            let items = self.items.read().await;
            SnapshotData {
                items: items.clone(),
            }
        };

        let encoded = serde_json::to_vec(&data)?;
        let tmp_path = self.snapshot_path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &encoded).await?;
        tokio::fs::rename(&tmp_path, &self.snapshot_path).await?;
        Ok(())
    }

    async fn load_snapshot(path: &Path) -> Result<Option<HashMap<String, CacheItem>>, CacheError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let data: SnapshotData = serde_json::from_slice(&bytes)?;
        Ok(Some(data.items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn temp_store_path(dir: &TempDir) -> PathBuf {
        dir.path().join("cache.json")
    }

    #[tokio::test]
    async fn test_get_after_set() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(temp_store_path(&dir)).await;

        store
            .set("key", json!("value"), Duration::from_secs(60))
            .await;

        assert_eq!(store.get("key").await, Some(json!("value")));
        assert_eq!(store.size().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(temp_store_path(&dir)).await;

        assert!(store.get("nope").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_invisible() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(temp_store_path(&dir)).await;

        store
            .set("key", json!("value"), Duration::from_millis(10))
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(store.get("key").await.is_none());
        // The entry itself lingers until the sweep.
        assert_eq!(store.size().await, 1);
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_keeps_permanent() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(temp_store_path(&dir)).await;

        store
            .set("ttl", json!(1), Duration::from_millis(10))
            .await;
        store.set_permanent("forever", json!(2)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        store.sweep().await;

        assert_eq!(store.size().await, 1);
        assert_eq!(store.get("forever").await, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(temp_store_path(&dir)).await;

        store.set("a", json!(1), Duration::from_secs(60)).await;
        store.set("b", json!(2), Duration::from_secs(60)).await;

        store.delete("a").await;
        assert!(store.get("a").await.is_none());
        assert_eq!(store.size().await, 1);

        store.clear().await;
        assert_eq!(store.size().await, 0);
    }

    #[tokio::test]
    async fn test_typed_roundtrip() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Entry {
            hash: String,
            sources: Vec<String>,
        }

        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(temp_store_path(&dir)).await;

        let entry = Entry {
            hash: "abc".into(),
            sources: vec!["udp://tracker".into()],
        };
        store.set_permanent_as("hash_link", &entry).await;

        let read: Entry = store.get_as("hash_link").await.unwrap();
        assert_eq!(read, entry);
    }

    #[tokio::test]
    async fn test_snapshot_durability() {
        let dir = TempDir::new().unwrap();
        let path = temp_store_path(&dir);

        {
            let store = CacheStore::open(&path).await;
            store.set("ttl", json!("t"), Duration::from_secs(3600)).await;
            store.set_permanent("perm", json!("p")).await;
            store
                .set("expired", json!("x"), Duration::from_millis(1))
                .await;
            tokio::time::sleep(Duration::from_millis(20)).await;
            store.flush().await.unwrap();
        }

        let reloaded = CacheStore::open(&path).await;
        assert_eq!(reloaded.get("ttl").await, Some(json!("t")));
        assert_eq!(reloaded.get("perm").await, Some(json!("p")));
        assert!(reloaded.get("expired").await.is_none());
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path().join("does-not-exist.json")).await;
        assert_eq!(store.size().await, 0);
    }

    #[tokio::test]
    async fn test_corrupted_snapshot_fails_open() {
        let dir = TempDir::new().unwrap();
        let path = temp_store_path(&dir);
        tokio::fs::write(&path, b"this is not json").await.unwrap();

        let store = CacheStore::open(&path).await;
        assert_eq!(store.size().await, 0);

        // The store stays usable and can overwrite the bad file.
        store.set("k", json!(1), Duration::from_secs(60)).await;
        store.flush().await.unwrap();
        let reloaded = CacheStore::open(&path).await;
        assert_eq!(reloaded.get("k").await, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_stats() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(temp_store_path(&dir)).await;

        store.set("a", json!(1), Duration::from_secs(60)).await;
        store.set_permanent("b", json!(2)).await;
        store.set("c", json!(3), Duration::from_millis(1)).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let stats = store.stats().await;
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.permanent_entries, 1);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.active_entries, 2);
    }

    #[tokio::test]
    async fn test_maintenance_loops_stop_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(CacheStore::open(temp_store_path(&dir)).await);
        let (shutdown_tx, _) = broadcast::channel(1);
        store.start_maintenance(&shutdown_tx);

        store.set("k", json!(1), Duration::from_secs(60)).await;
        let _ = shutdown_tx.send(());
        tokio::time::sleep(Duration::from_millis(20)).await;
        // Flush still works after the loops exit.
        store.flush().await.unwrap();
    }
}
