//! Catalogue-wide read endpoints: genres, artists, favorites, stats

use axum::{extract::State, routing::get, Json, Router};
use mcat_common::api::StatsResponse;
use mcat_common::Song;

use crate::db;
use crate::error::ApiResult;
use crate::AppState;

/// GET /api/genres (also /api/songs/genres)
///
/// The configured genre set, in display order.
pub async fn list_genres(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.schema().genres.clone())
}

/// GET /api/artists
pub async fn list_artists(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(db::distinct_artists(&state.db).await?))
}

/// GET /api/favorites
pub async fn list_favorites(State(state): State<AppState>) -> ApiResult<Json<Vec<Song>>> {
    Ok(Json(db::list_favorites(&state.db, state.schema()).await?))
}

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let total_songs = db::count_songs(&state.db).await?;
    let genres = db::count_by_genre(&state.db).await?;
    let favorite_count = db::count_favorites(&state.db).await?;

    Ok(Json(StatsResponse {
        total_songs,
        genres,
        favorite_count,
    }))
}

/// Build catalogue routes
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/genres", get(list_genres))
        .route("/api/songs/genres", get(list_genres))
        .route("/api/artists", get(list_artists))
        .route("/api/favorites", get(list_favorites))
        .route("/api/stats", get(stats))
}
