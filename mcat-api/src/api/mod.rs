//! HTTP API handlers for mcat-api

pub mod catalog;
pub mod health;
pub mod playlists;
pub mod songs;

use axum::{http::StatusCode, Json};
use mcat_common::api::ErrorResponse;
use uuid::Uuid;

use crate::error::ApiError;

pub use catalog::catalog_routes;
pub use health::health_routes;
pub use playlists::playlist_routes;
pub use songs::song_routes;

/// Fallback for unmatched routes
pub async fn route_not_found() -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Route not found")))
}

/// Path id as a song id; anything that is not a UUID names no song
pub(crate) fn song_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::song_not_found(raw))
}

pub(crate) fn playlist_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::playlist_not_found(raw))
}
