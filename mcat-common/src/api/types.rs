//! Request/response bodies of the catalogue API

use serde::{Deserialize, Serialize};

use crate::song::{Song, SongId};
use crate::validation::FieldErrors;

// ========================================
// Listing
// ========================================

/// One page of a song listing
///
/// `total` counts every song matching the filter, not just this page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongListResponse {
    pub songs: Vec<Song>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    #[serde(default)]
    pub total_pages: u64,
}

/// Songs per genre, as `{ "_id": genre, "count": n }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreCount {
    #[serde(rename = "_id")]
    pub genre: String,
    pub count: u64,
}

/// Catalogue statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_songs: u64,
    pub genres: Vec<GenreCount>,
    pub favorite_count: u64,
}

// ========================================
// Requests
// ========================================

/// Body of `POST /api/playlists/:id/songs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSongRequest {
    pub song_id: SongId,
}

// ========================================
// Service info
// ========================================

/// Body of `GET /`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
    pub version: String,
    pub endpoints: Vec<String>,
}

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

// ========================================
// Errors
// ========================================

/// Generic error body: `{ "error": "..." }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Validation failure body: `{ "errors": { field: message } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorResponse {
    pub errors: FieldErrors,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stats_wire_shape() {
        let stats = StatsResponse {
            total_songs: 3,
            genres: vec![GenreCount {
                genre: "Rock".to_string(),
                count: 2,
            }],
            favorite_count: 1,
        };
        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            json!({
                "totalSongs": 3,
                "genres": [{ "_id": "Rock", "count": 2 }],
                "favoriteCount": 1
            })
        );
    }

    #[test]
    fn test_add_song_request_rejects_bad_id() {
        let result: Result<AddSongRequest, _> = serde_json::from_value(json!({ "songId": "nope" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_error_body() {
        let mut errors = FieldErrors::new();
        errors.insert("title", "Title is required");
        let body = serde_json::to_value(ValidationErrorResponse { errors }).unwrap();
        assert_eq!(body, json!({ "errors": { "title": "Title is required" } }));
    }
}
