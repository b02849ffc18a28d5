//! Song endpoints
//!
//! Bodies are taken as untyped JSON and run through the shared validator,
//! so a wrong type in one field is reported against that field.

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use mcat_common::api::SongListResponse;
use mcat_common::{normalize, Song};
use serde_json::Value;
use tracing::info;

use super::song_id;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/songs
///
/// Query parameters: `search`, `genre`, `artist`, `sortBy`, `order`,
/// `page`, `limit`. Invalid values fall back to defaults.
pub async fn list_songs(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<SongListResponse>> {
    let descriptor = normalize(&params, state.schema());
    let page = db::query_songs(&state.db, &descriptor).await?;

    Ok(Json(SongListResponse {
        total_pages: descriptor.total_pages(page.total),
        songs: page.songs,
        total: page.total,
        page: descriptor.page,
        limit: descriptor.page_limit,
    }))
}

/// GET /api/songs/:id
pub async fn get_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Song>> {
    let song_id = song_id(&id)?;
    db::get_song(&state.db, song_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::song_not_found(song_id))
}

/// POST /api/songs
pub async fn create_song(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Song>)> {
    let Json(body) = payload?;
    let draft = state.validator.check_value(&body).map_err(ApiError::Validation)?;

    let song = db::insert_song(&state.db, draft).await?;
    info!("Created song {} ({} - {})", song.id, song.title, song.artist);

    Ok((StatusCode::CREATED, Json(song)))
}

/// PUT /api/songs/:id
///
/// Full replace: fields missing from the body are reset to their defaults.
pub async fn replace_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Song>> {
    let song_id = song_id(&id)?;
    let Json(body) = payload?;
    let draft = state.validator.check_value(&body).map_err(ApiError::Validation)?;

    db::replace_song(&state.db, song_id, draft)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::song_not_found(song_id))
}

/// DELETE /api/songs/:id
///
/// Also removes the song from every playlist.
pub async fn delete_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let song_id = song_id(&id)?;
    if !db::delete_song(&state.db, song_id).await? {
        return Err(ApiError::song_not_found(song_id));
    }

    info!("Deleted song {}", song_id);
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/songs/:id/favorite
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Song>> {
    let song_id = song_id(&id)?;
    db::toggle_favorite(&state.db, song_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::song_not_found(song_id))
}

/// Build song routes
pub fn song_routes() -> Router<AppState> {
    Router::new()
        .route("/api/songs", get(list_songs).post(create_song))
        .route(
            "/api/songs/:id",
            get(get_song).put(replace_song).delete(delete_song),
        )
        .route("/api/songs/:id/favorite", put(toggle_favorite))
}
