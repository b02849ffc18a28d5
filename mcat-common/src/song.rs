//! Song value types
//!
//! `Song` is a stored record; `SongDraft` is everything a client may set.
//! Both are plain values: edits go through the free functions below, which
//! return a new value instead of mutating in place.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::duration;

/// Storage-assigned song identifier
pub type SongId = Uuid;

/// A stored catalogue song
///
/// Serialized in camelCase with the identifier as `_id`, the shape the
/// catalogue's web clients expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    #[serde(rename = "_id")]
    pub id: SongId,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: String,
    pub year: Option<i32>,
    pub genre: String,
    /// Whole seconds
    pub duration: Option<u32>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}

/// Client-settable song fields, in canonical form
///
/// Produced by [`crate::SongValidator::check`]: strings trimmed, duration in
/// seconds, tags trimmed and deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDraft {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album: String,
    pub year: Option<i32>,
    pub genre: String,
    pub duration: Option<u32>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl SongDraft {
    /// Draft with the three required fields set
    pub fn new(title: impl Into<String>, artist: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            genre: genre.into(),
            ..Self::default()
        }
    }

    /// Untyped JSON object view, as the validator consumes it
    pub fn to_candidate(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

impl Song {
    /// Materialize a stored record from a draft plus storage-assigned fields
    pub fn from_draft(id: SongId, created_at: DateTime<Utc>, draft: SongDraft) -> Self {
        Self {
            id,
            title: draft.title,
            artist: draft.artist,
            album: draft.album,
            year: draft.year,
            genre: draft.genre,
            duration: draft.duration,
            rating: draft.rating,
            tags: draft.tags,
            is_favorite: draft.is_favorite,
            created_at,
        }
    }

    /// Client-settable fields of this song
    pub fn to_draft(&self) -> SongDraft {
        SongDraft {
            title: self.title.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
            year: self.year,
            genre: self.genre.clone(),
            duration: self.duration,
            rating: self.rating,
            tags: self.tags.clone(),
            is_favorite: self.is_favorite,
        }
    }

    /// Duration as `M:SS`, or `N/A`
    pub fn formatted_duration(&self) -> String {
        duration::format_optional_duration(self.duration)
    }
}

/// Full replace: every client-settable field comes from `draft`, identity
/// and creation time are kept.
pub fn with_changes(song: &Song, draft: SongDraft) -> Song {
    Song::from_draft(song.id, song.created_at, draft)
}

/// Copy of `song` with the favorite flag flipped
pub fn toggled_favorite(song: &Song) -> Song {
    Song {
        is_favorite: !song.is_favorite,
        ..song.clone()
    }
}

/// Copy of `draft` carrying `tag` (trimmed); blank tags are ignored
pub fn with_tag(draft: &SongDraft, tag: &str) -> SongDraft {
    let mut next = draft.clone();
    let tag = tag.trim();
    if !tag.is_empty() {
        next.tags.insert(tag.to_string());
    }
    next
}

/// Copy of `draft` without `tag`
pub fn without_tag(draft: &SongDraft, tag: &str) -> SongDraft {
    let mut next = draft.clone();
    next.tags.remove(tag.trim());
    next
}

/// One-line summary: `Title - Artist (Year)`
pub fn full_info(song: &Song) -> String {
    let year = song
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| duration::MISSING.to_string());
    format!("{} - {} ({})", song.title, song.artist, year)
}
