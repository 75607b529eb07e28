//! Wire types for the stream endpoint.
//!
//! Field names follow the Stremio stream object conventions
//! (`infoHash`, `fileIdx`, `behaviorHints`), so the structs serialize
//! straight into the response body.

use serde::{Deserialize, Serialize};

/// Display name attached to every stream.
pub const ADDON_NAME: &str = "TorBox";

/// Kind of work being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Series,
}

/// A parsed client stream request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub kind: MediaKind,
    /// IMDb-style external id (`tt…`).
    pub id: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl StreamRequest {
    pub fn movie(id: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Movie,
            id: id.into(),
            season: None,
            episode: None,
        }
    }

    pub fn series(id: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            kind: MediaKind::Series,
            id: id.into(),
            season: Some(season),
            episode: Some(episode),
        }
    }

    pub fn is_movie(&self) -> bool {
        self.kind == MediaKind::Movie
    }

    pub fn is_series(&self) -> bool {
        self.kind == MediaKind::Series
    }

    /// Grouping key so a client keeps the same source across episodes.
    pub fn binge_group(&self, info_hash: &str) -> String {
        format!("torbox|{}|{}", self.id, info_hash)
    }
}

impl std::fmt::Display for StreamRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.season, self.episode) {
            (Some(season), Some(episode)) => write!(f, "{}:{}:{}", self.id, season, episode),
            _ => write!(f, "{}", self.id),
        }
    }
}

/// Client-facing hints on a stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorHints {
    #[serde(rename = "bingeGroup", skip_serializing_if = "String::is_empty", default)]
    pub binge_group: String,
    #[serde(rename = "videoSize", skip_serializing_if = "is_zero", default)]
    pub video_size: i64,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub filename: String,
    #[serde(rename = "notWebReady", skip_serializing_if = "is_false", default)]
    pub not_web_ready: bool,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// One playable stream: either a resolved direct URL or an
/// infohash + file-index fallback the client can fetch itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamOutput {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub url: Option<String>,
    #[serde(rename = "infoHash", skip_serializing_if = "Option::is_none", default)]
    pub info_hash: Option<String>,
    #[serde(rename = "fileIdx", skip_serializing_if = "Option::is_none", default)]
    pub file_idx: Option<u32>,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub sources: Vec<String>,
    #[serde(rename = "behaviorHints", skip_serializing_if = "Option::is_none", default)]
    pub behavior_hints: Option<BehaviorHints>,
}

impl StreamOutput {
    /// Declared size, used for ranking.
    pub fn video_size(&self) -> i64 {
        self.behavior_hints
            .as_ref()
            .map(|h| h.video_size)
            .unwrap_or(0)
    }
}

/// Body of the stream endpoint response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamResponse {
    pub streams: Vec<StreamOutput>,
}
