//! Health endpoint for the notifier.

use axum::{response::Json, routing::get, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

/// Create the API router.
pub fn create_router() -> Router {
    Router::new().route("/health", get(health_handler))
}

/// Health check endpoint.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
