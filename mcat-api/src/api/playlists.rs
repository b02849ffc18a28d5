//! Playlist endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use mcat_common::api::AddSongRequest;
use mcat_common::validation::{check_playlist, Candidate};
use mcat_common::{FieldErrors, Playlist, PlaylistDraft};
use serde_json::Value;
use tracing::info;

use super::playlist_id;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

fn playlist_draft(body: &Value) -> ApiResult<PlaylistDraft> {
    let empty = Candidate::new();
    let candidate = body.as_object().unwrap_or(&empty);
    check_playlist(candidate).map_err(ApiError::Validation)
}

/// GET /api/playlists
pub async fn list_playlists(State(state): State<AppState>) -> ApiResult<Json<Vec<Playlist>>> {
    Ok(Json(db::list_playlists(&state.db).await?))
}

/// GET /api/playlists/:id
pub async fn get_playlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Playlist>> {
    let playlist_id = playlist_id(&id)?;
    db::get_playlist(&state.db, playlist_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::playlist_not_found(playlist_id))
}

/// POST /api/playlists
pub async fn create_playlist(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Playlist>)> {
    let Json(body) = payload?;
    let draft = playlist_draft(&body)?;

    let playlist = db::insert_playlist(&state.db, draft).await?;
    info!("Created playlist {} ({})", playlist.id, playlist.name);

    Ok((StatusCode::CREATED, Json(playlist)))
}

/// PUT /api/playlists/:id
pub async fn replace_playlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Playlist>> {
    let playlist_id = playlist_id(&id)?;
    let Json(body) = payload?;
    let draft = playlist_draft(&body)?;

    db::replace_playlist(&state.db, playlist_id, draft)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::playlist_not_found(playlist_id))
}

/// DELETE /api/playlists/:id
pub async fn delete_playlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let playlist_id = playlist_id(&id)?;
    if !db::delete_playlist(&state.db, playlist_id).await? {
        return Err(ApiError::playlist_not_found(playlist_id));
    }

    info!("Deleted playlist {}", playlist_id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/playlists/:id/songs
///
/// Body `{ "songId": "..." }`. Adding a song already present is a no-op.
pub async fn add_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Playlist>> {
    let playlist_id = playlist_id(&id)?;
    let Json(body) = payload?;
    let request: AddSongRequest = serde_json::from_value(body).map_err(|_| {
        let mut errors = FieldErrors::new();
        errors.insert("songId", "Song id is required");
        ApiError::Validation(errors)
    })?;

    let playlist = db::add_song_to_playlist(&state.db, playlist_id, request.song_id).await?;
    Ok(Json(playlist))
}

/// Build playlist routes
pub fn playlist_routes() -> Router<AppState> {
    Router::new()
        .route("/api/playlists", get(list_playlists).post(create_playlist))
        .route(
            "/api/playlists/:id",
            get(get_playlist).put(replace_playlist).delete(delete_playlist),
        )
        .route("/api/playlists/:id/songs", post(add_song))
}
