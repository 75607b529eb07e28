//! Generic TTL/permanent key-value cache with disk snapshots.
//!
//! One store backs every cached namespace in the addon (indexer searches,
//! resolved link hashes, debrid availability, metadata), distinguished by
//! key prefix.

mod store;

pub use store::{CacheError, CacheStats, CacheStore};
