//! Playlist storage
//!
//! Membership lives in `playlist_songs` with an explicit position; the
//! `(playlist, song)` primary key keeps each song at most once per list.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mcat_common::{Error, Playlist, PlaylistDraft, PlaylistId, Result, SongId};
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct PlaylistRow {
    guid: String,
    name: String,
    cover_image: Option<String>,
    created_at: DateTime<Utc>,
}

fn parse_guid(guid: &str) -> Result<Uuid> {
    Uuid::parse_str(guid).map_err(|e| Error::Internal(format!("Corrupt id {:?}: {}", guid, e)))
}

impl PlaylistRow {
    fn into_playlist(self, songs: Vec<SongId>) -> Result<Playlist> {
        Ok(Playlist {
            id: parse_guid(&self.guid)?,
            name: self.name,
            songs,
            cover_image: self.cover_image,
            created_at: self.created_at,
        })
    }
}

async fn playlist_song_ids(pool: &SqlitePool, guid: &str) -> Result<Vec<SongId>> {
    let ids: Vec<String> = sqlx::query_scalar(
        "SELECT song_guid FROM playlist_songs WHERE playlist_guid = ? ORDER BY position",
    )
    .bind(guid)
    .fetch_all(pool)
    .await?;

    ids.iter().map(|id| parse_guid(id)).collect()
}

/// Reject song ids that are not in the catalogue
async fn ensure_songs_exist(tx: &mut Transaction<'_, Sqlite>, songs: &[SongId]) -> Result<()> {
    for song in songs {
        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM songs WHERE guid = ?")
            .bind(song.to_string())
            .fetch_optional(&mut **tx)
            .await?;
        if exists.is_none() {
            return Err(Error::InvalidInput(format!("Unknown song id: {}", song)));
        }
    }
    Ok(())
}

/// Write the membership rows of a playlist, in order
async fn write_songs(tx: &mut Transaction<'_, Sqlite>, guid: &str, songs: &[SongId]) -> Result<()> {
    for (position, song) in songs.iter().enumerate() {
        sqlx::query(
            "INSERT OR IGNORE INTO playlist_songs (playlist_guid, song_guid, position) VALUES (?, ?, ?)",
        )
        .bind(guid)
        .bind(song.to_string())
        .bind(i64::try_from(position).unwrap_or(i64::MAX))
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// All playlists, oldest first
pub async fn list_playlists(pool: &SqlitePool) -> Result<Vec<Playlist>> {
    let rows: Vec<PlaylistRow> = sqlx::query_as(
        "SELECT guid, name, cover_image, created_at FROM playlists ORDER BY created_at, guid",
    )
    .fetch_all(pool)
    .await?;

    let links: Vec<(String, String)> = sqlx::query_as(
        "SELECT playlist_guid, song_guid FROM playlist_songs ORDER BY playlist_guid, position",
    )
    .fetch_all(pool)
    .await?;

    let mut members: HashMap<String, Vec<SongId>> = HashMap::new();
    for (playlist, song) in links {
        let song = parse_guid(&song)?;
        members.entry(playlist).or_default().push(song);
    }

    rows.into_iter()
        .map(|row| {
            let songs = members.remove(&row.guid).unwrap_or_default();
            row.into_playlist(songs)
        })
        .collect()
}

pub async fn get_playlist(pool: &SqlitePool, id: PlaylistId) -> Result<Option<Playlist>> {
    let guid = id.to_string();
    let row: Option<PlaylistRow> =
        sqlx::query_as("SELECT guid, name, cover_image, created_at FROM playlists WHERE guid = ?")
            .bind(&guid)
            .fetch_optional(pool)
            .await?;

    match row {
        Some(row) => {
            let songs = playlist_song_ids(pool, &guid).await?;
            row.into_playlist(songs).map(Some)
        }
        None => Ok(None),
    }
}

/// Store a validated draft; fails with `InvalidInput` on unknown song ids
pub async fn insert_playlist(pool: &SqlitePool, draft: PlaylistDraft) -> Result<Playlist> {
    let playlist = Playlist::from_draft(Uuid::new_v4(), mcat_common::time::now(), draft);
    let guid = playlist.id.to_string();

    let mut tx = pool.begin().await?;
    ensure_songs_exist(&mut tx, &playlist.songs).await?;

    sqlx::query("INSERT INTO playlists (guid, name, cover_image, created_at) VALUES (?, ?, ?, ?)")
        .bind(&guid)
        .bind(&playlist.name)
        .bind(&playlist.cover_image)
        .bind(playlist.created_at)
        .execute(&mut *tx)
        .await?;

    write_songs(&mut tx, &guid, &playlist.songs).await?;
    tx.commit().await?;

    Ok(playlist)
}

/// Full replace of name, songs and cover; `None` if `id` is unknown
pub async fn replace_playlist(
    pool: &SqlitePool,
    id: PlaylistId,
    draft: PlaylistDraft,
) -> Result<Option<Playlist>> {
    let guid = id.to_string();
    let mut tx = pool.begin().await?;

    let result = sqlx::query("UPDATE playlists SET name = ?, cover_image = ? WHERE guid = ?")
        .bind(&draft.name)
        .bind(&draft.cover_image)
        .bind(&guid)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(None);
    }

    ensure_songs_exist(&mut tx, &draft.songs).await?;

    sqlx::query("DELETE FROM playlist_songs WHERE playlist_guid = ?")
        .bind(&guid)
        .execute(&mut *tx)
        .await?;
    write_songs(&mut tx, &guid, &draft.songs).await?;
    tx.commit().await?;

    get_playlist(pool, id).await
}

/// Returns false if `id` is unknown
pub async fn delete_playlist(pool: &SqlitePool, id: PlaylistId) -> Result<bool> {
    let guid = id.to_string();
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM playlist_songs WHERE playlist_guid = ?")
        .bind(&guid)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM playlists WHERE guid = ?")
        .bind(&guid)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    tx.commit().await?;
    Ok(true)
}

/// Append `song` to the playlist unless already present
///
/// `NotFound` if either id is unknown.
pub async fn add_song_to_playlist(
    pool: &SqlitePool,
    playlist: PlaylistId,
    song: SongId,
) -> Result<Playlist> {
    let playlist_guid = playlist.to_string();
    let song_guid = song.to_string();
    let mut tx = pool.begin().await?;

    let playlist_exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM playlists WHERE guid = ?")
        .bind(&playlist_guid)
        .fetch_optional(&mut *tx)
        .await?;
    if playlist_exists.is_none() {
        return Err(Error::NotFound(format!("Playlist not found: {}", playlist)));
    }

    let song_exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM songs WHERE guid = ?")
        .bind(&song_guid)
        .fetch_optional(&mut *tx)
        .await?;
    if song_exists.is_none() {
        return Err(Error::NotFound(format!("Song not found: {}", song)));
    }

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO playlist_songs (playlist_guid, song_guid, position)
        SELECT ?, ?, COALESCE(MAX(position) + 1, 0)
        FROM playlist_songs WHERE playlist_guid = ?
        "#,
    )
    .bind(&playlist_guid)
    .bind(&song_guid)
    .bind(&playlist_guid)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    get_playlist(pool, playlist)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Playlist not found: {}", playlist)))
}
