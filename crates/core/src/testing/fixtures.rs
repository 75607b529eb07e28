//! Test data builders.

use std::collections::HashMap;

use serde_bencode::value::Value;

use crate::debrid::CachedFileInfo;
use crate::scraper::IndexerResult;

fn bytes(s: &str) -> Value {
    Value::Bytes(s.as_bytes().to_vec())
}

fn base_info(name: &str) -> HashMap<Vec<u8>, Value> {
    let mut info = HashMap::new();
    info.insert(b"name".to_vec(), bytes(name));
    info.insert(b"piece length".to_vec(), Value::Int(16384));
    info.insert(b"pieces".to_vec(), Value::Bytes(vec![0u8; 20]));
    info
}

fn with_trackers(mut root: HashMap<Vec<u8>, Value>, trackers: &[&str]) -> Vec<u8> {
    if let Some(first) = trackers.first() {
        root.insert(b"announce".to_vec(), bytes(first));
        let tiers: Vec<Value> = trackers
            .iter()
            .map(|t| Value::List(vec![bytes(t)]))
            .collect();
        root.insert(b"announce-list".to_vec(), Value::List(tiers));
    }
    serde_bencode::to_bytes(&Value::Dict(root)).expect("bencode fixture")
}

/// A well-formed single-file metainfo blob.
pub fn single_file_metainfo(name: &str, length: i64, trackers: &[&str]) -> Vec<u8> {
    let mut info = base_info(name);
    info.insert(b"length".to_vec(), Value::Int(length));

    let mut root = HashMap::new();
    root.insert(b"info".to_vec(), Value::Dict(info));
    with_trackers(root, trackers)
}

/// A well-formed multi-file metainfo blob; each file is (path parts, size).
pub fn multi_file_metainfo(
    root_name: &str,
    files: &[(&[&str], i64)],
    trackers: &[&str],
) -> Vec<u8> {
    let mut info = base_info(root_name);

    let entries: Vec<Value> = files
        .iter()
        .map(|(path, length)| {
            let mut entry = HashMap::new();
            entry.insert(b"length".to_vec(), Value::Int(*length));
            entry.insert(
                b"path".to_vec(),
                Value::List(path.iter().map(|p| bytes(p)).collect()),
            );
            Value::Dict(entry)
        })
        .collect();
    info.insert(b"files".to_vec(), Value::List(entries));

    let mut root = HashMap::new();
    root.insert(b"info".to_vec(), Value::Dict(info));
    with_trackers(root, trackers)
}

/// An indexer result carrying a raw infohash.
pub fn indexer_result(title: &str, info_hash: Option<&str>, details: &str) -> IndexerResult {
    IndexerResult {
        title: title.to_string(),
        info_hash: info_hash.map(str::to_string),
        seeders: Some(10),
        size: 1024 * 1024 * 1024,
        tracker: "mock".into(),
        details: details.to_string(),
        ..Default::default()
    }
}

/// A cached file entry.
pub fn cached_file(name: &str, size: i64, index: u32) -> CachedFileInfo {
    CachedFileInfo {
        name: name.to_string(),
        size,
        index,
    }
}
