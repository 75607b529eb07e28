//! HTTP handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use strembox_core::{MediaKind, StreamRequest, StreamResponse};

use crate::state::AppState;

const MANIFEST_ID: &str = "com.strembox.addon";
const MANIFEST_VERSION: &str = "0.1.0";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "addon": "strembox",
        "version": MANIFEST_VERSION,
    }))
}

/// GET /manifest.json
pub async fn manifest() -> Json<serde_json::Value> {
    Json(json!({
        "id": MANIFEST_ID,
        "version": MANIFEST_VERSION,
        "name": "Strembox",
        "description": "Search torrents via Jackett and stream with TorBox",
        "resources": ["stream"],
        "types": ["movie", "series"],
        "idPrefixes": ["tt"],
        "behaviorHints": {
            "p2p": false,
            "configurable": false,
            "configurationRequired": false,
        },
    }))
}

/// GET /api/v1/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = state.cache().stats().await;
    Json(json!({
        "status": "ok",
        "cache_entries": stats.active_entries,
        "queue_len": state.worker().queue_len(),
        "queue_capacity": state.worker().queue_capacity(),
    }))
}

/// GET /stream/{type}/{id}.json
///
/// `id` is `tt<digits>` for movies, `tt<digits>:<season>:<episode>` for
/// series; the `.json` suffix is part of the path segment.
pub async fn stream(
    State(state): State<Arc<AppState>>,
    Path((media_type, id)): Path<(String, String)>,
) -> Result<Json<StreamResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request = parse_stream_request(&media_type, &id).map_err(|message| {
        warn!(%media_type, %id, message, "bad stream request");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
    })?;

    let streams = state.pipeline().resolve(&request).await;
    Ok(Json(StreamResponse { streams }))
}

fn parse_stream_request(media_type: &str, id: &str) -> Result<StreamRequest, &'static str> {
    let kind = match media_type {
        "movie" => MediaKind::Movie,
        "series" => MediaKind::Series,
        _ => return Err("unsupported type"),
    };

    let id = id.strip_suffix(".json").unwrap_or(id);
    let mut parts = id.split(':');
    let external_id = parts.next().unwrap_or_default();

    if !external_id.starts_with("tt")
        || external_id.len() < 3
        || !external_id[2..].bytes().all(|b| b.is_ascii_digit())
    {
        return Err("invalid id");
    }

    match kind {
        MediaKind::Movie => Ok(StreamRequest::movie(external_id)),
        MediaKind::Series => {
            let season: u32 = parts
                .next()
                .and_then(|s| s.parse().ok())
                .ok_or("invalid season")?;
            let episode: u32 = parts
                .next()
                .and_then(|e| e.parse().ok())
                .ok_or("invalid episode")?;
            if season == 0 || episode == 0 {
                return Err("season and episode must be positive");
            }
            Ok(StreamRequest::series(external_id, season, episode))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_movie_request() {
        let request = parse_stream_request("movie", "tt0111161.json").unwrap();
        assert_eq!(request, StreamRequest::movie("tt0111161"));
    }

    #[test]
    fn test_parse_series_request() {
        let request = parse_stream_request("series", "tt0903747:2:5.json").unwrap();
        assert_eq!(request, StreamRequest::series("tt0903747", 2, 5));
    }

    #[test]
    fn test_parse_without_suffix() {
        let request = parse_stream_request("movie", "tt0111161").unwrap();
        assert_eq!(request.id, "tt0111161");
    }

    #[test]
    fn test_parse_rejects_bad_type() {
        assert!(parse_stream_request("channel", "tt0111161.json").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_ids() {
        assert!(parse_stream_request("movie", "0111161.json").is_err());
        assert!(parse_stream_request("movie", "ttabc.json").is_err());
        assert!(parse_stream_request("movie", "tt.json").is_err());
    }

    #[test]
    fn test_parse_rejects_missing_or_zero_episode() {
        assert!(parse_stream_request("series", "tt0903747.json").is_err());
        assert!(parse_stream_request("series", "tt0903747:2.json").is_err());
        assert!(parse_stream_request("series", "tt0903747:0:1.json").is_err());
        assert!(parse_stream_request("series", "tt0903747:2:x.json").is_err());
    }
}
