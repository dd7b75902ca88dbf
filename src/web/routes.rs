//! Web API router construction.

use axum::{Router, routing::get};
use std::time::Duration;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer};

use crate::state::AppState;
use crate::web::middleware::request_id::RequestIdLayer;
use crate::web::{galleries, pages, status};

/// Creates the web server router
pub fn create_router(app_state: AppState, request_timeout: Duration) -> Router {
    let api_router = Router::new()
        .route("/health", get(status::health))
        .route("/status", get(status::status))
        .route("/users/{user}/galleries", get(galleries::list_galleries))
        .route("/galleries/{id}/photos", get(galleries::list_photos))
        .route("/photos/search", get(galleries::search_photos))
        .route("/photos/{id}", get(galleries::get_photo))
        .route("/slideshow", get(pages::slideshow))
        .route("/resolve", get(pages::resolve))
        .route("/render", get(pages::render))
        .with_state(app_state);

    Router::new().nest("/api", api_router).layer((
        // Outermost: per-request ID span + severity-proportional response logging.
        RequestIdLayer,
        CompressionLayer::new()
            .br(true)
            .gzip(true)
            .quality(tower_http::CompressionLevel::Fastest),
        // Upstream calls have their own timeout; this bounds the whole request.
        TimeoutLayer::new(request_timeout * 3),
    ))
}
