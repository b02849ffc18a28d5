//! Service info endpoints: welcome and health

use axum::{routing::get, Json, Router};
use mcat_common::api::{HealthResponse, WelcomeResponse};

use crate::AppState;

/// Routes advertised by `GET /`
const ENDPOINTS: [&str; 9] = [
    "GET /health",
    "GET|POST /api/songs",
    "GET|PUT|DELETE /api/songs/:id",
    "PUT /api/songs/:id/favorite",
    "GET /api/genres",
    "GET /api/artists",
    "GET /api/favorites",
    "GET /api/stats",
    "GET|POST /api/playlists",
];

/// GET /
pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Music catalogue API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
    })
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build service info routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
}
