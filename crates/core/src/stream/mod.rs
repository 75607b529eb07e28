//! Stream request/response model and presentation helpers.

mod format;
mod types;

pub use format::{extract_codec, extract_quality, extract_source, format_bytes};
pub use types::{
    BehaviorHints, MediaKind, StreamOutput, StreamRequest, StreamResponse, ADDON_NAME,
};
