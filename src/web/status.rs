//! Health and status handlers.

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::trace;

use crate::gallery::CacheStats;
use crate::state::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    version: String,
    commit: String,
    uptime_secs: u64,
    cache_ttl_secs: u64,
    cache: CacheStats,
    pages: usize,
}

/// Health check endpoint
pub(super) async fn health() -> Json<Value> {
    trace!("health check requested");
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Build and cache status
pub(super) async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: env!("GIT_COMMIT_SHORT").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        cache_ttl_secs: state.gallery_cache.ttl().as_secs(),
        cache: state.gallery_cache.stats(),
        pages: state.pages.pages().len(),
    })
}
