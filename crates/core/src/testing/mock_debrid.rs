//! Mock debrid client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::debrid::{CacheCheck, CachedFileInfo, DebridClient, DebridError};

/// Controllable [`DebridClient`]: declare which hashes are cached with
/// which files, and make individual operations fail.
#[derive(Default)]
pub struct MockDebrid {
    cached: Mutex<HashMap<String, Vec<CachedFileInfo>>>,
    check_count: AtomicUsize,
    list_count: AtomicUsize,
    resolve_count: AtomicUsize,
    fail_list_files: AtomicBool,
    fail_resolve_url: AtomicBool,
}

impl MockDebrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a hash as instantly available with the given files.
    pub fn add_cached(&self, hash: &str, files: Vec<CachedFileInfo>) {
        self.cached.lock().unwrap().insert(hash.to_string(), files);
    }

    pub fn set_fail_list_files(&self, fail: bool) {
        self.fail_list_files.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_resolve_url(&self, fail: bool) {
        self.fail_resolve_url.store(fail, Ordering::SeqCst);
    }

    pub fn check_count(&self) -> usize {
        self.check_count.load(Ordering::SeqCst)
    }

    pub fn list_count(&self) -> usize {
        self.list_count.load(Ordering::SeqCst)
    }

    pub fn resolve_count(&self) -> usize {
        self.resolve_count.load(Ordering::SeqCst)
    }

    /// The URL shape handed out by [`DebridClient::resolve_url`].
    pub fn url_for(torrent_id: &str, file_index: u32) -> String {
        format!("https://cdn.mock/{torrent_id}/{file_index}")
    }
}

#[async_trait]
impl DebridClient for MockDebrid {
    async fn check_cached(&self, hashes: &[String]) -> Result<Vec<CacheCheck>, DebridError> {
        self.check_count.fetch_add(1, Ordering::SeqCst);
        let cached = self.cached.lock().unwrap();
        Ok(hashes
            .iter()
            .filter_map(|hash| {
                cached.get(hash).map(|files| CacheCheck {
                    hash: hash.clone(),
                    cached: true,
                    files: files.clone(),
                })
            })
            .collect())
    }

    async fn create_by_magnet(&self, magnet: &str) -> Result<String, DebridError> {
        let hash = magnet
            .split("btih:")
            .nth(1)
            .unwrap_or_default()
            .chars()
            .take(40)
            .collect::<String>();
        Ok(format!("torrent-{hash}"))
    }

    async fn list_files(
        &self,
        hash: &str,
    ) -> Result<(Vec<CachedFileInfo>, String), DebridError> {
        self.list_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_list_files.load(Ordering::SeqCst) {
            return Err(DebridError::Rejected("listing disabled".into()));
        }
        let cached = self.cached.lock().unwrap();
        let files = cached.get(hash).cloned().unwrap_or_default();
        Ok((files, format!("torrent-{hash}")))
    }

    async fn resolve_url(
        &self,
        torrent_id: &str,
        file_index: u32,
    ) -> Result<String, DebridError> {
        self.resolve_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_resolve_url.load(Ordering::SeqCst) {
            return Err(DebridError::Rejected("downloads disabled".into()));
        }
        Ok(Self::url_for(torrent_id, file_index))
    }
}
