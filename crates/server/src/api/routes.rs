use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use super::handlers;
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/manifest.json", get(handlers::manifest))
        .route("/stream/{media_type}/{id}", get(handlers::stream))
        .route("/api/v1/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
