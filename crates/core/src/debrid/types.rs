//! Debrid capability set and shared types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Availability of one hash on the debrid cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheCheck {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub files: Vec<CachedFileInfo>,
}

/// One file inside a cached torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFileInfo {
    pub name: String,
    pub size: i64,
    pub index: u32,
}

/// Errors from debrid operations.
#[derive(Debug, Error)]
pub enum DebridError {
    #[error("debrid request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("debrid API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("debrid API rejected the operation: {0}")]
    Rejected(String),

    #[error("API key is required")]
    MissingApiKey,
}

/// The debrid operations the pipeline depends on.
#[async_trait]
pub trait DebridClient: Send + Sync {
    /// Bulk availability check over a list of infohashes.
    async fn check_cached(&self, hashes: &[String]) -> Result<Vec<CacheCheck>, DebridError>;

    /// Register a torrent by magnet; instant for cached content.
    /// Returns the provider-side torrent id.
    async fn create_by_magnet(&self, magnet: &str) -> Result<String, DebridError>;

    /// List the files of a cached torrent, returning them together with
    /// the provider-side torrent id needed to request downloads.
    async fn list_files(&self, hash: &str)
        -> Result<(Vec<CachedFileInfo>, String), DebridError>;

    /// Resolve a direct download URL for one file of a torrent.
    async fn resolve_url(&self, torrent_id: &str, file_index: u32)
        -> Result<String, DebridError>;
}
