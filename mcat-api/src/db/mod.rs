//! Database access layer for mcat-api
//!
//! SQLite through sqlx. Tables are created idempotently at startup; songs
//! carry lower-cased shadow columns (`title_folded`, `artist_folded`) so
//! substring search in SQL agrees with [`mcat_common::Filter::matches`].

use std::path::Path;
use std::str::FromStr;

use mcat_common::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

mod filter;
pub mod playlists;
pub mod songs;

pub use playlists::{
    add_song_to_playlist, delete_playlist, get_playlist, insert_playlist, list_playlists,
    replace_playlist,
};
pub use songs::{
    count_by_genre, count_favorites, count_songs, delete_song, distinct_artists, get_song,
    insert_song, list_favorites, list_songs, query_songs, replace_song, toggle_favorite, SongPage,
};

/// Open (creating if needed) the catalogue database at `db_path`
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    Ok(pool)
}

/// Private in-memory database, gone when the pool closes
///
/// A single connection that never idles out, so every query sees the same
/// database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            guid TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            artist TEXT NOT NULL,
            album TEXT NOT NULL DEFAULT '',
            year INTEGER,
            genre TEXT NOT NULL,
            duration INTEGER CHECK (duration IS NULL OR duration >= 0),
            rating REAL CHECK (rating IS NULL OR (rating >= 0 AND rating <= 5)),
            tags TEXT NOT NULL DEFAULT '[]',
            is_favorite INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL,
            title_folded TEXT NOT NULL,
            artist_folded TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_songs_genre ON songs(genre)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_songs_artist ON songs(artist)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_songs_favorite ON songs(is_favorite)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlists (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            cover_image TEXT,
            created_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlist_songs (
            playlist_guid TEXT NOT NULL REFERENCES playlists(guid) ON DELETE CASCADE,
            song_guid TEXT NOT NULL REFERENCES songs(guid) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            PRIMARY KEY (playlist_guid, song_guid)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_playlist_songs_song ON playlist_songs(song_guid)")
        .execute(pool)
        .await?;

    Ok(())
}
