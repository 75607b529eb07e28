//! File selection within a cached torrent.
//!
//! A file is playable for a request when it has a video extension, clears
//! the size floor, and (for series) its name resolves to the requested
//! episode. Season information may live in the parent directory instead of
//! the leaf name.

use regex::Regex;

use crate::debrid::CachedFileInfo;
use crate::stream::StreamRequest;

const VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".mkv", ".avi", ".mov", ".wmv", ".flv", ".webm", ".m4v", ".mpg", ".mpeg", ".m2ts",
    ".ts", ".vob", ".ogv",
];

const MIN_EPISODE_SIZE: i64 = 50 * 1024 * 1024;
const MIN_MOVIE_SIZE: i64 = 500 * 1024 * 1024;

/// True if the filename carries one of the known video extensions.
pub fn is_video_file(filename: &str) -> bool {
    let lowered = filename.to_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext))
}

/// Size floor: 50 MiB for series episodes, 500 MiB for movies.
pub fn is_file_size_valid(size_bytes: i64, is_series: bool) -> bool {
    if is_series {
        size_bytes >= MIN_EPISODE_SIZE
    } else {
        size_bytes >= MIN_MOVIE_SIZE
    }
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex")
}

/// True if `filename` (a path within the torrent) names the requested
/// episode. Episode ranges in the leaf name are always rejected.
pub fn is_episode_file(filename: &str, season: u32, episode: u32) -> bool {
    let lowered = filename.to_lowercase();
    let parts: Vec<&str> = lowered.split('/').collect();
    let leaf = parts.last().copied().unwrap_or_default();

    // A range like e01-e03 can never be the single requested episode.
    if re(r"e0*\d+[\s._-]*-[\s._-]*e?0*\d+").is_match(leaf) {
        return false;
    }

    // Season + episode in the leaf name, zero padding free.
    let full_patterns = [
        format!(r"\bs0*{season}e0*{episode}(\D|$)"),
        format!(r"\b0*{season}x0*{episode}(\D|$)"),
        format!(r"\bs0*{season}-e0*{episode}(\D|$)"),
        format!(r"\bs0*{season}\s+e0*{episode}(\D|$)"),
        format!(r"\bseason\s+0*{season}[.\s]+0*{episode}(\D|$)"),
        format!(r"\b0*{season}\.0*{episode}(\D|$)"),
    ];
    if full_patterns.iter().any(|p| re(p).is_match(leaf)) {
        return true;
    }

    // Season in the parent directory, episode alone in the leaf.
    if parts.len() > 1 {
        let parent = parts[parts.len() - 2];
        let season_patterns = [
            format!(r"\bs0*{season}(\D|$)"),
            format!(r"\bseason[\s._-]*0*{season}(\D|$)"),
            format!(r"\btemporada[\s._-]*0*{season}(\D|$)"),
        ];
        if season_patterns.iter().any(|p| re(p).is_match(parent)) {
            let episode_only = format!(r"\b(episode|ep|e)[\s._-]*0*{episode}(\D|$)");
            if re(&episode_only).is_match(leaf) {
                return true;
            }
        }
    }

    false
}

/// Filter a torrent's files down to the ones that satisfy the request.
pub fn select_files<'a>(
    files: &'a [CachedFileInfo],
    request: &StreamRequest,
) -> Vec<&'a CachedFileInfo> {
    let is_series = request.is_series();
    files
        .iter()
        .filter(|file| is_video_file(&file.name))
        .filter(|file| is_file_size_valid(file.size, is_series))
        .filter(|file| {
            if !is_series {
                return true;
            }
            match (request.season, request.episode) {
                (Some(season), Some(episode)) => is_episode_file(&file.name, season, episode),
                _ => false,
            }
        })
        .collect()
}
