//! Infohash normalization.
//!
//! Some indexers return the infohash hex-encoded twice (80 characters);
//! the double encoding is undone before validation.

use tracing::warn;

/// Normalize a raw infohash string to lowercase 40-hex.
///
/// Returns `None` for anything that does not resolve to a valid hash.
/// Idempotent: feeding the output back in yields the same output.
pub fn normalize_info_hash(raw: &str) -> Option<String> {
    let mut hash = raw.trim().to_string();

    if hash.len() == 80 {
        match hex::decode(&hash) {
            Ok(decoded) => match String::from_utf8(decoded) {
                Ok(inner) => hash = inner,
                Err(_) => {
                    warn!("80-char hash did not decode to text");
                    return None;
                }
            },
            Err(e) => {
                warn!(error = %e, "failed to decode 80-char hash");
                return None;
            }
        }
    }

    let hash = hash.to_lowercase();
    if hash.len() != 40 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    Some(hash)
}
