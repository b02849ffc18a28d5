//! Playlist value types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::song::SongId;

/// Storage-assigned playlist identifier
pub type PlaylistId = Uuid;

/// Named, ordered collection of song references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(rename = "_id")]
    pub id: PlaylistId,
    pub name: String,
    /// Song ids in play order, no duplicates
    #[serde(default)]
    pub songs: Vec<SongId>,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Client-settable playlist fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDraft {
    pub name: String,
    #[serde(default)]
    pub songs: Vec<SongId>,
    pub cover_image: Option<String>,
}

impl PlaylistDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Playlist {
    pub fn from_draft(id: PlaylistId, created_at: DateTime<Utc>, draft: PlaylistDraft) -> Self {
        Self {
            id,
            name: draft.name,
            songs: draft.songs,
            cover_image: draft.cover_image,
            created_at,
        }
    }

    pub fn contains(&self, song: &SongId) -> bool {
        self.songs.contains(song)
    }
}

/// Copy of `playlist` with `song` appended, unless already present
pub fn with_song(playlist: &Playlist, song: SongId) -> Playlist {
    let mut next = playlist.clone();
    if !next.contains(&song) {
        next.songs.push(song);
    }
    next
}

/// Copy of `playlist` without `song`; other entries keep their order
pub fn without_song(playlist: &Playlist, song: &SongId) -> Playlist {
    Playlist {
        songs: playlist.songs.iter().filter(|s| *s != song).copied().collect(),
        ..playlist.clone()
    }
}
