//! Router configuration for the Depot Web API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{delete_file, download_file, list_files, upload_file, AppState};
use super::middleware::create_cors_layer;

/// Slack on top of the configured upload ceiling for multipart framing
/// (boundaries, part headers, the description field).
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Create the main API router.
///
/// The body limit rejects oversized uploads before any handler code runs,
/// so nothing is written to disk for them.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let file_routes = Router::new()
        .route("/files", get(list_files).post(upload_file))
        .route("/files/:id", delete(delete_file))
        .route("/files/:id/download", get(download_file));

    let body_limit = (app_state.max_upload_size + MULTIPART_OVERHEAD) as usize;

    Router::new()
        .nest("/api", file_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
