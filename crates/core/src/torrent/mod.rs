//! Torrent metainfo handling.
//!
//! Extracts the canonical infohash (SHA-1 of the bencoded `info`
//! dictionary), file listings and tracker lists from .torrent blobs and
//! magnet URIs, and normalizes the hash representations upstream indexers
//! hand back.

mod hash;
mod magnet;
mod metainfo;

pub use hash::normalize_info_hash;
pub use magnet::{info_hash_from_magnet, trackers_from_magnet};
pub use metainfo::{parse_metainfo, TorrentFileEntry, TorrentMetadata};

use thiserror::Error;

/// Errors from metainfo parsing.
#[derive(Debug, Error)]
pub enum TorrentError {
    #[error("bad torrent: {0}")]
    BadTorrent(String),
}
