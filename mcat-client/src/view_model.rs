//! Song view-model
//!
//! Wraps the catalogue API for a front end. Writes are validated locally
//! first (advisory; the server checks again) so obviously bad input never
//! leaves the client.

use std::collections::HashMap;
use std::sync::Arc;

use mcat_common::api::{AddSongRequest, SongListResponse, StatsResponse};
use mcat_common::validation::{check_playlist, Candidate};
use mcat_common::{FieldErrors, Playlist, PlaylistId, Song, SongId, SongValidator};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Where a genre list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenreSource {
    /// The server answered
    Primary,
    /// The server could not be used; the local schema's genres
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreList {
    pub source: GenreSource,
    pub genres: Vec<String>,
}

/// Catalogue operations over an injected transport
#[derive(Clone)]
pub struct SongViewModel {
    transport: Arc<dyn Transport>,
    validator: SongValidator,
}

impl SongViewModel {
    pub fn new(transport: Arc<dyn Transport>, validator: SongValidator) -> Self {
        Self {
            transport,
            validator,
        }
    }

    pub fn validator(&self) -> &SongValidator {
        &self.validator
    }

    // ========================================
    // Songs
    // ========================================

    /// One page of songs; `params` are passed through as the query string
    pub async fn get_songs(&self, params: &HashMap<String, String>) -> ClientResult<SongListResponse> {
        let mut query: Vec<(String, String)> =
            params.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        query.sort();

        self.call(ApiRequest::get("/api/songs").with_query(query)).await
    }

    pub async fn get_song(&self, id: SongId) -> ClientResult<Song> {
        self.call(ApiRequest::get(format!("/api/songs/{}", id))).await
    }

    /// Validate locally, then create
    pub async fn create_song(&self, candidate: &Candidate) -> ClientResult<Song> {
        let draft = self.validator.check(candidate).map_err(ClientError::Validation)?;
        let body = Value::Object(draft.to_candidate());

        self.call(ApiRequest::post("/api/songs", body)).await
    }

    /// Validate locally, then replace every field of song `id`
    pub async fn update_song(&self, id: SongId, candidate: &Candidate) -> ClientResult<Song> {
        let draft = self.validator.check(candidate).map_err(ClientError::Validation)?;
        let body = Value::Object(draft.to_candidate());

        self.call(ApiRequest::put(format!("/api/songs/{}", id)).with_body(body))
            .await
    }

    pub async fn delete_song(&self, id: SongId) -> ClientResult<()> {
        let response = self
            .transport
            .send(ApiRequest::delete(format!("/api/songs/{}", id)))
            .await?;
        check_status(response).map(|_| ())
    }

    pub async fn toggle_favorite(&self, id: SongId) -> ClientResult<Song> {
        self.call(ApiRequest::put(format!("/api/songs/{}/favorite", id)))
            .await
    }

    // ========================================
    // Catalogue
    // ========================================

    /// Server genre list, or the local schema's when the server cannot
    /// provide one
    pub async fn get_genres(&self) -> GenreList {
        match self.call::<Vec<String>>(ApiRequest::get("/api/genres")).await {
            Ok(genres) => GenreList {
                source: GenreSource::Primary,
                genres,
            },
            Err(e) => {
                warn!("Genre list unavailable ({}), using local genres", e);
                GenreList {
                    source: GenreSource::Fallback,
                    genres: self.validator.schema().genres.clone(),
                }
            }
        }
    }

    pub async fn get_artists(&self) -> ClientResult<Vec<String>> {
        self.call(ApiRequest::get("/api/artists")).await
    }

    pub async fn get_favorites(&self) -> ClientResult<Vec<Song>> {
        self.call(ApiRequest::get("/api/favorites")).await
    }

    pub async fn get_stats(&self) -> ClientResult<StatsResponse> {
        self.call(ApiRequest::get("/api/stats")).await
    }

    // ========================================
    // Playlists
    // ========================================

    pub async fn get_playlists(&self) -> ClientResult<Vec<Playlist>> {
        self.call(ApiRequest::get("/api/playlists")).await
    }

    pub async fn get_playlist(&self, id: PlaylistId) -> ClientResult<Playlist> {
        self.call(ApiRequest::get(format!("/api/playlists/{}", id)))
            .await
    }

    /// Validate locally, then create from the canonical draft
    pub async fn create_playlist(&self, candidate: &Candidate) -> ClientResult<Playlist> {
        let body = playlist_body(candidate)?;
        self.call(ApiRequest::post("/api/playlists", body)).await
    }

    pub async fn update_playlist(&self, id: PlaylistId, candidate: &Candidate) -> ClientResult<Playlist> {
        let body = playlist_body(candidate)?;
        self.call(ApiRequest::put(format!("/api/playlists/{}", id)).with_body(body))
            .await
    }

    pub async fn delete_playlist(&self, id: PlaylistId) -> ClientResult<()> {
        let response = self
            .transport
            .send(ApiRequest::delete(format!("/api/playlists/{}", id)))
            .await?;
        check_status(response).map(|_| ())
    }

    pub async fn add_song_to_playlist(&self, playlist: PlaylistId, song: SongId) -> ClientResult<Playlist> {
        let body = serde_json::to_value(AddSongRequest { song_id: song })
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        self.call(ApiRequest::post(format!("/api/playlists/{}/songs", playlist), body))
            .await
    }

    /// Send, check the status, decode the body
    async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        debug!(path = %request.path, "API call");
        let response = self.transport.send(request).await?;
        let body = check_status(response)?;
        serde_json::from_value(body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Trimmed, deduplicated playlist body, or the local validation errors
fn playlist_body(candidate: &Candidate) -> ClientResult<Value> {
    let draft = check_playlist(candidate).map_err(ClientError::Validation)?;
    serde_json::to_value(draft).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Body of a success response, or the error the status stands for
fn check_status(response: ApiResponse) -> ClientResult<Value> {
    if response.is_success() {
        return Ok(response.body.unwrap_or(Value::Null));
    }

    let body = response.body.unwrap_or(Value::Null);
    let message = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("request failed")
        .to_string();

    match response.status {
        400 => match body.get("errors").cloned().map(serde_json::from_value::<FieldErrors>) {
            Some(Ok(errors)) => Err(ClientError::Validation(errors)),
            _ => Err(ClientError::Server {
                status: 400,
                message,
            }),
        },
        404 => Err(ClientError::NotFound(message)),
        status => Err(ClientError::Server { status, message }),
    }
}
