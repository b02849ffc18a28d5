//! Song storage

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use mcat_common::api::GenreCount;
use mcat_common::query::fold_case;
use mcat_common::{Error, QueryDescriptor, Result, Song, SongDraft, SongId};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::filter::{push_filter, push_order};

const SONG_COLUMNS: &str =
    "guid, title, artist, album, year, genre, duration, rating, tags, is_favorite, created_at";

/// One page of a listing plus the unpaged match count
#[derive(Debug, Clone, PartialEq)]
pub struct SongPage {
    pub songs: Vec<Song>,
    pub total: u64,
}

#[derive(sqlx::FromRow)]
struct SongRow {
    guid: String,
    title: String,
    artist: String,
    album: String,
    year: Option<i64>,
    genre: String,
    duration: Option<i64>,
    rating: Option<f64>,
    tags: Json<BTreeSet<String>>,
    is_favorite: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<SongRow> for Song {
    type Error = Error;

    fn try_from(row: SongRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.guid)
            .map_err(|e| Error::Internal(format!("Corrupt song id {:?}: {}", row.guid, e)))?;
        let year = row
            .year
            .map(i32::try_from)
            .transpose()
            .map_err(|_| Error::Internal(format!("Year out of range for song {}", id)))?;
        let duration = row
            .duration
            .map(u32::try_from)
            .transpose()
            .map_err(|_| Error::Internal(format!("Duration out of range for song {}", id)))?;

        Ok(Song {
            id,
            title: row.title,
            artist: row.artist,
            album: row.album,
            year,
            genre: row.genre,
            duration,
            rating: row.rating,
            tags: row.tags.0,
            is_favorite: row.is_favorite,
            created_at: row.created_at,
        })
    }
}

fn into_songs(rows: Vec<SongRow>) -> Result<Vec<Song>> {
    rows.into_iter().map(Song::try_from).collect()
}

/// Store a validated draft; assigns id and creation time
pub async fn insert_song(pool: &SqlitePool, draft: SongDraft) -> Result<Song> {
    let song = Song::from_draft(Uuid::new_v4(), mcat_common::time::now(), draft);

    sqlx::query(
        r#"
        INSERT INTO songs (
            guid, title, artist, album, year, genre, duration, rating, tags,
            is_favorite, created_at, title_folded, artist_folded
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(song.id.to_string())
    .bind(&song.title)
    .bind(&song.artist)
    .bind(&song.album)
    .bind(song.year)
    .bind(&song.genre)
    .bind(song.duration.map(i64::from))
    .bind(song.rating)
    .bind(Json(&song.tags))
    .bind(song.is_favorite)
    .bind(song.created_at)
    .bind(fold_case(&song.title))
    .bind(fold_case(&song.artist))
    .execute(pool)
    .await?;

    Ok(song)
}

pub async fn get_song(pool: &SqlitePool, id: SongId) -> Result<Option<Song>> {
    let row: Option<SongRow> =
        sqlx::query_as(&format!("SELECT {} FROM songs WHERE guid = ?", SONG_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(pool)
            .await?;

    row.map(Song::try_from).transpose()
}

/// Full replace of the client-settable fields; `None` if `id` is unknown
pub async fn replace_song(pool: &SqlitePool, id: SongId, draft: SongDraft) -> Result<Option<Song>> {
    let result = sqlx::query(
        r#"
        UPDATE songs SET
            title = ?, artist = ?, album = ?, year = ?, genre = ?, duration = ?,
            rating = ?, tags = ?, is_favorite = ?, title_folded = ?, artist_folded = ?
        WHERE guid = ?
        "#,
    )
    .bind(&draft.title)
    .bind(&draft.artist)
    .bind(&draft.album)
    .bind(draft.year)
    .bind(&draft.genre)
    .bind(draft.duration.map(i64::from))
    .bind(draft.rating)
    .bind(Json(&draft.tags))
    .bind(draft.is_favorite)
    .bind(fold_case(&draft.title))
    .bind(fold_case(&draft.artist))
    .bind(id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_song(pool, id).await
}

/// Delete a song and retract it from every playlist, atomically.
/// Returns false if `id` is unknown.
pub async fn delete_song(pool: &SqlitePool, id: SongId) -> Result<bool> {
    let guid = id.to_string();
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM playlist_songs WHERE song_guid = ?")
        .bind(&guid)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM songs WHERE guid = ?")
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

/// Flip the favorite flag; `None` if `id` is unknown
pub async fn toggle_favorite(pool: &SqlitePool, id: SongId) -> Result<Option<Song>> {
    let result = sqlx::query("UPDATE songs SET is_favorite = NOT is_favorite WHERE guid = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_song(pool, id).await
}

/// One page of songs matching `descriptor`, with the total match count
pub async fn query_songs(pool: &SqlitePool, descriptor: &QueryDescriptor) -> Result<SongPage> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM songs WHERE ");
    push_filter(&mut count, &descriptor.filter);
    let total: i64 = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM songs WHERE ", SONG_COLUMNS));
    push_filter(&mut select, &descriptor.filter);
    push_order(&mut select, descriptor.sort_key, descriptor.sort_direction);
    select
        .push(" LIMIT ")
        .push_bind(i64::from(descriptor.page_limit))
        .push(" OFFSET ")
        .push_bind(i64::try_from(descriptor.page_offset).unwrap_or(i64::MAX));

    let rows: Vec<SongRow> = select.build_query_as::<SongRow>().fetch_all(pool).await?;

    Ok(SongPage {
        songs: into_songs(rows)?,
        total: u64::try_from(total).unwrap_or(0),
    })
}

/// Every song matching `descriptor`'s filter, in its order; paging ignored
pub async fn list_songs(pool: &SqlitePool, descriptor: &QueryDescriptor) -> Result<Vec<Song>> {
    let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM songs WHERE ", SONG_COLUMNS));
    push_filter(&mut select, &descriptor.filter);
    push_order(&mut select, descriptor.sort_key, descriptor.sort_direction);

    let rows: Vec<SongRow> = select.build_query_as::<SongRow>().fetch_all(pool).await?;
    into_songs(rows)
}

/// Every favorite song, in the schema's default order
pub async fn list_favorites(
    pool: &SqlitePool,
    schema: &mcat_common::CatalogSchema,
) -> Result<Vec<Song>> {
    list_songs(pool, &mcat_common::query::favorites_query(schema)).await
}

/// Distinct artist names, sorted
pub async fn distinct_artists(pool: &SqlitePool) -> Result<Vec<String>> {
    let artists: Vec<String> = sqlx::query_scalar("SELECT DISTINCT artist FROM songs ORDER BY artist")
        .fetch_all(pool)
        .await?;
    Ok(artists)
}

/// Songs per genre, most populous first
pub async fn count_by_genre(pool: &SqlitePool) -> Result<Vec<GenreCount>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT genre, COUNT(*) AS n FROM songs GROUP BY genre ORDER BY n DESC, genre ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(genre, count)| GenreCount {
            genre,
            count: u64::try_from(count).unwrap_or(0),
        })
        .collect())
}

pub async fn count_songs(pool: &SqlitePool) -> Result<u64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
        .fetch_one(pool)
        .await?;
    Ok(u64::try_from(n).unwrap_or(0))
}

pub async fn count_favorites(pool: &SqlitePool) -> Result<u64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs WHERE is_favorite = 1")
        .fetch_one(pool)
        .await?;
    Ok(u64::try_from(n).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;
    use mcat_common::{normalize, CatalogSchema, SortDirection, SortField};
    use std::collections::HashMap;

    async fn seed(pool: &SqlitePool) {
        let songs = [
            ("Kashmir", "Led Zeppelin", "Rock", Some(1975)),
            ("Stairway to Heaven", "Led Zeppelin", "Rock", Some(1971)),
            ("So What", "Miles Davis", "Jazz", Some(1959)),
            ("Zephyr Song", "Red Hot Chili Peppers", "Rock", Some(2002)),
            ("Clair de Lune", "Claude Debussy", "Classical", None),
        ];
        for (title, artist, genre, year) in songs {
            let mut draft = SongDraft::new(title, artist, genre);
            draft.year = year;
            insert_song(pool, draft).await.unwrap();
        }
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[tokio::test]
    async fn test_insert_then_get_equal_except_storage_fields() {
        let pool = init_memory_database().await.unwrap();
        let mut draft = SongDraft::new("Blue in Green", "Miles Davis", "Jazz");
        draft.year = Some(1959);
        draft.duration = Some(337);
        draft.rating = Some(4.5);
        draft.tags = ["modal".to_string(), "ballad".to_string()].into_iter().collect();

        let stored = insert_song(&pool, draft.clone()).await.unwrap();
        let fetched = get_song(&pool, stored.id).await.unwrap().unwrap();

        assert_eq!(fetched.to_draft(), draft);
        assert_eq!(fetched.id, stored.id);
        assert_eq!(fetched.created_at, stored.created_at);
    }

    #[tokio::test]
    async fn test_query_search_and_genre() {
        let pool = init_memory_database().await.unwrap();
        seed(&pool).await;
        let schema = CatalogSchema::default();

        let q = normalize(&params(&[("search", "ZEP"), ("genre", "Rock")]), &schema);
        let page = query_songs(&pool, &q).await.unwrap();

        let titles: Vec<_> = page.songs.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Kashmir", "Stairway to Heaven", "Zephyr Song"]);
        assert_eq!(page.total, 3);
        assert!(page.songs.iter().all(|s| q.filter.matches(s)));
    }

    #[tokio::test]
    async fn test_query_paging_total_counts_all_matches() {
        let pool = init_memory_database().await.unwrap();
        seed(&pool).await;

        let q = normalize(
            &params(&[("sortBy", "year"), ("order", "desc"), ("page", "2"), ("limit", "2")]),
            &CatalogSchema::default(),
        );
        assert_eq!((q.sort_key, q.sort_direction), (SortField::Year, SortDirection::Desc));

        let page = query_songs(&pool, &q).await.unwrap();
        assert_eq!(page.total, 5);
        let years: Vec<_> = page.songs.iter().map(|s| s.year).collect();
        assert_eq!(years, vec![Some(1971), Some(1959)]);
    }

    #[tokio::test]
    async fn test_query_search_is_unicode_case_insensitive() {
        let pool = init_memory_database().await.unwrap();
        insert_song(&pool, SongDraft::new("L'ÀNIMA", "Sopa de Cabra", "Rock")).await.unwrap();

        let q = normalize(&params(&[("search", "ànima")]), &CatalogSchema::default());
        assert_eq!(query_songs(&pool, &q).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_replace_and_toggle() {
        let pool = init_memory_database().await.unwrap();
        let song = insert_song(&pool, SongDraft::new("a", "b", "Pop")).await.unwrap();

        let replaced = replace_song(&pool, song.id, SongDraft::new("c", "d", "Jazz"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced.title, "c");
        assert_eq!(replaced.created_at, song.created_at);

        let toggled = toggle_favorite(&pool, song.id).await.unwrap().unwrap();
        assert!(toggled.is_favorite);
        assert_eq!(count_favorites(&pool).await.unwrap(), 1);

        assert!(replace_song(&pool, Uuid::new_v4(), SongDraft::default()).await.unwrap().is_none());
        assert!(toggle_favorite(&pool, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_aggregates() {
        let pool = init_memory_database().await.unwrap();
        seed(&pool).await;

        assert_eq!(count_songs(&pool).await.unwrap(), 5);
        assert_eq!(
            distinct_artists(&pool).await.unwrap(),
            vec!["Claude Debussy", "Led Zeppelin", "Miles Davis", "Red Hot Chili Peppers"]
        );

        let genres = count_by_genre(&pool).await.unwrap();
        assert_eq!(genres[0], GenreCount { genre: "Rock".to_string(), count: 3 });
        assert_eq!(genres.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_unknown_song() {
        let pool = init_memory_database().await.unwrap();
        assert!(!delete_song(&pool, Uuid::new_v4()).await.unwrap());
    }
}
