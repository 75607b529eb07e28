//! Bencoded metainfo parsing.
//!
//! The infohash is the SHA-1 of the `info` dictionary in its canonical
//! bencoded form, so the dictionary is re-encoded after parsing rather
//! than hashed from the raw input slice.

use std::collections::HashMap;

use serde_bencode::value::Value;
use sha1::{Digest, Sha1};

use super::TorrentError;

/// A file inside a torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentFileEntry {
    /// Path within the torrent, `/`-joined for multi-file torrents.
    pub name: String,
    /// Zero-based index within the torrent's file list.
    pub index: u32,
    pub size_bytes: i64,
}

/// Everything the pipeline needs from a metainfo blob.
#[derive(Debug, Clone)]
pub struct TorrentMetadata {
    /// Lowercase 40-hex infohash.
    pub info_hash: String,
    pub files: Vec<TorrentFileEntry>,
    /// Deduplicated announce + announce-list tracker URLs.
    pub trackers: Vec<String>,
}

/// Parse a .torrent blob into [`TorrentMetadata`].
pub fn parse_metainfo(bytes: &[u8]) -> Result<TorrentMetadata, TorrentError> {
    if bytes.is_empty() {
        return Err(TorrentError::BadTorrent("empty content".into()));
    }

    let root: Value = serde_bencode::from_bytes(bytes)
        .map_err(|e| TorrentError::BadTorrent(format!("failed to decode: {e}")))?;

    let dict = match &root {
        Value::Dict(dict) => dict,
        _ => return Err(TorrentError::BadTorrent("root is not a dictionary".into())),
    };

    let info = dict
        .get(&b"info"[..])
        .ok_or_else(|| TorrentError::BadTorrent("info dictionary not found".into()))?;

    let info_bytes = serde_bencode::to_bytes(info)
        .map_err(|e| TorrentError::BadTorrent(format!("failed to re-encode info: {e}")))?;

    let mut hasher = Sha1::new();
    hasher.update(&info_bytes);
    let info_hash = hex::encode(hasher.finalize());

    let files = match info {
        Value::Dict(info_dict) => extract_files(info_dict),
        _ => return Err(TorrentError::BadTorrent("info is not a dictionary".into())),
    };

    Ok(TorrentMetadata {
        info_hash,
        files,
        trackers: extract_trackers(dict),
    })
}

fn extract_files(info: &HashMap<Vec<u8>, Value>) -> Vec<TorrentFileEntry> {
    if let Some(Value::List(entries)) = info.get(&b"files"[..]) {
        // Multi-file torrent: each entry has `length` and a `path` list.
        let mut files = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let Value::Dict(entry) = entry else { continue };

            let length = match entry.get(&b"length"[..]) {
                Some(Value::Int(n)) => *n,
                _ => 0,
            };

            let mut parts = Vec::new();
            if let Some(Value::List(path)) = entry.get(&b"path"[..]) {
                for part in path {
                    if let Value::Bytes(part) = part {
                        parts.push(String::from_utf8_lossy(part).into_owned());
                    }
                }
            }
            if parts.is_empty() {
                continue;
            }

            files.push(TorrentFileEntry {
                name: parts.join("/"),
                index: index as u32,
                size_bytes: length,
            });
        }
        return files;
    }

    // Single-file torrent: `name` and `length` directly in info.
    let name = match info.get(&b"name"[..]) {
        Some(Value::Bytes(name)) => String::from_utf8_lossy(name).into_owned(),
        _ => return Vec::new(),
    };
    let length = match info.get(&b"length"[..]) {
        Some(Value::Int(n)) => *n,
        _ => 0,
    };

    vec![TorrentFileEntry {
        name,
        index: 0,
        size_bytes: length,
    }]
}

fn extract_trackers(root: &HashMap<Vec<u8>, Value>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut trackers = Vec::new();

    if let Some(Value::Bytes(announce)) = root.get(&b"announce"[..]) {
        let announce = String::from_utf8_lossy(announce).into_owned();
        if !announce.is_empty() && seen.insert(announce.clone()) {
            trackers.push(announce);
        }
    }

    if let Some(Value::List(tiers)) = root.get(&b"announce-list"[..]) {
        for tier in tiers {
            let Value::List(tier) = tier else { continue };
            for tracker in tier {
                if let Value::Bytes(tracker) = tracker {
                    let tracker = String::from_utf8_lossy(tracker).into_owned();
                    if !tracker.is_empty() && seen.insert(tracker.clone()) {
                        trackers.push(tracker);
                    }
                }
            }
        }
    }

    trackers
}
