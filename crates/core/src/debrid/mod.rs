//! Debrid provider abstraction.
//!
//! The pipeline needs four operations from a debrid service: a bulk
//! availability check, torrent creation from a magnet, file listing, and
//! per-file download-URL resolution. Everything else about the provider's
//! wire format stays inside the adapter.

mod torbox;
mod types;

pub use torbox::{TorBoxClient, TorBoxConfig};
pub use types::{CacheCheck, CachedFileInfo, DebridClient, DebridError};
