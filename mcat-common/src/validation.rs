//! Field-level validation for songs and playlists
//!
//! Candidates arrive as untyped JSON objects (a decoded request body or a
//! form) so that a wrong type is reported against its own field instead of
//! failing the whole payload. Every rule runs on every call; a client can
//! highlight all offending fields at once.
//!
//! The same code runs as the authoritative gate in the service and as an
//! advisory pre-flight check in clients. Client results never replace the
//! server check.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::duration;
use crate::playlist::PlaylistDraft;
use crate::schema::{CatalogSchema, MAX_RATING, MIN_RATING, MIN_YEAR};
use crate::song::{SongDraft, SongId};
use crate::time::{Clock, SystemClock};

/// Untyped candidate record
pub type Candidate = Map<String, Value>;

/// Field name → human-readable message; empty means valid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Offending field names, sorted
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

// Messages
const TITLE_REQUIRED: &str = "Title is required";
const ARTIST_REQUIRED: &str = "Artist is required";
const ALBUM_TEXT: &str = "Album must be text";
const DURATION_NEGATIVE: &str = "Duration cannot be negative";
const DURATION_MALFORMED: &str = "Duration must be a whole number of seconds";
const DURATION_MALFORMED_CLOCK: &str = "Duration must be a whole number of seconds or M:SS";
const RATING_RANGE: &str = "Rating must be between 0 and 5";
const TAGS_MALFORMED: &str = "Tags must be a list of text labels";
const FAVORITE_MALFORMED: &str = "Favorite flag must be true or false";
const PLAYLIST_NAME_REQUIRED: &str = "Playlist name is required";
const PLAYLIST_SONGS_MALFORMED: &str = "Songs must be a list of song ids";
const COVER_IMAGE_TEXT: &str = "Cover image must be text";

/// Validate a song candidate. Empty result means valid.
///
/// `current_year` bounds the year rule; pass the value read from a
/// [`Clock`] at call time.
pub fn validate(candidate: &Candidate, schema: &CatalogSchema, current_year: i32) -> FieldErrors {
    match check_song(candidate, schema, current_year) {
        Ok(_) => FieldErrors::new(),
        Err(errors) => errors,
    }
}

/// Validate a song candidate and, when valid, return its canonical draft
pub fn check_song(
    candidate: &Candidate,
    schema: &CatalogSchema,
    current_year: i32,
) -> Result<SongDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = required_text(candidate, "title", TITLE_REQUIRED);
    let artist = required_text(candidate, "artist", ARTIST_REQUIRED);
    let genre = genre_rule(candidate, schema);
    let album = album_rule(candidate);
    let year = year_rule(candidate, current_year);
    let duration = duration_rule(candidate, schema);
    let rating = rating_rule(candidate);
    let tags = tags_rule(candidate);
    let is_favorite = favorite_rule(candidate);

    let title = collect(&mut errors, "title", title);
    let artist = collect(&mut errors, "artist", artist);
    let genre = collect(&mut errors, "genre", genre);
    let album = collect(&mut errors, "album", album);
    let year = collect(&mut errors, "year", year);
    let duration = collect(&mut errors, "duration", duration);
    let rating = collect(&mut errors, "rating", rating);
    let tags = collect(&mut errors, "tags", tags);
    let is_favorite = collect(&mut errors, "isFavorite", is_favorite);

    match (title, artist, genre, album, year, duration, rating, tags, is_favorite) {
        (
            Some(title),
            Some(artist),
            Some(genre),
            Some(album),
            Some(year),
            Some(duration),
            Some(rating),
            Some(tags),
            Some(is_favorite),
        ) if errors.is_empty() => Ok(SongDraft {
            title,
            artist,
            album,
            year,
            genre,
            duration,
            rating,
            tags,
            is_favorite,
        }),
        _ => Err(errors),
    }
}

/// Check a single field in isolation, as a form does on blur.
///
/// Returns the message the full validation would report for `field`, or
/// `None` when the value passes. Unknown fields always pass.
pub fn validate_field(
    field: &str,
    value: &Value,
    schema: &CatalogSchema,
    current_year: i32,
) -> Option<String> {
    let mut candidate = Candidate::new();
    candidate.insert(field.to_string(), value.clone());

    match field {
        "title" => required_text(&candidate, field, TITLE_REQUIRED).err(),
        "artist" => required_text(&candidate, field, ARTIST_REQUIRED).err(),
        "genre" => genre_rule(&candidate, schema).err(),
        "album" => album_rule(&candidate).err(),
        "year" => year_rule(&candidate, current_year).err(),
        "duration" => duration_rule(&candidate, schema).err(),
        "rating" => rating_rule(&candidate).err(),
        "tags" => tags_rule(&candidate).err(),
        "isFavorite" => favorite_rule(&candidate).err(),
        _ => None,
    }
}

/// Validate a playlist candidate and, when valid, return its draft.
///
/// Song references are deduplicated keeping first occurrence order.
pub fn check_playlist(candidate: &Candidate) -> Result<PlaylistDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = required_text(candidate, "name", PLAYLIST_NAME_REQUIRED);
    let songs = playlist_songs_rule(candidate);
    let cover_image = cover_image_rule(candidate);

    let name = collect(&mut errors, "name", name);
    let songs = collect(&mut errors, "songs", songs);
    let cover_image = collect(&mut errors, "coverImage", cover_image);

    match (name, songs, cover_image) {
        (Some(name), Some(songs), Some(cover_image)) if errors.is_empty() => Ok(PlaylistDraft {
            name,
            songs,
            cover_image,
        }),
        _ => Err(errors),
    }
}

/// Playlist counterpart of [`validate`]
pub fn validate_playlist(candidate: &Candidate) -> FieldErrors {
    check_playlist(candidate).err().unwrap_or_default()
}

/// Validation bound to a schema and a clock
///
/// Cheap to clone; share one per service or view-model.
#[derive(Clone)]
pub struct SongValidator {
    schema: Arc<CatalogSchema>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for SongValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SongValidator")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl Default for SongValidator {
    fn default() -> Self {
        Self::new(CatalogSchema::default())
    }
}

impl SongValidator {
    /// Validator reading the wall clock
    pub fn new(schema: CatalogSchema) -> Self {
        Self::with_clock(schema, Arc::new(SystemClock))
    }

    pub fn with_clock(schema: CatalogSchema, clock: Arc<dyn Clock>) -> Self {
        Self {
            schema: Arc::new(schema),
            clock,
        }
    }

    pub fn schema(&self) -> &CatalogSchema {
        &self.schema
    }

    pub fn validate(&self, candidate: &Candidate) -> FieldErrors {
        validate(candidate, &self.schema, self.clock.current_year())
    }

    pub fn check(&self, candidate: &Candidate) -> Result<SongDraft, FieldErrors> {
        check_song(candidate, &self.schema, self.clock.current_year())
    }

    /// Like [`Self::check`] for any JSON value; a non-object fails every
    /// required field.
    pub fn check_value(&self, value: &Value) -> Result<SongDraft, FieldErrors> {
        match value {
            Value::Object(candidate) => self.check(candidate),
            _ => self.check(&Candidate::new()),
        }
    }

    pub fn validate_field(&self, field: &str, value: &Value) -> Option<String> {
        validate_field(field, value, &self.schema, self.clock.current_year())
    }

    /// Advisory check of an already-typed draft
    pub fn validate_draft(&self, draft: &SongDraft) -> FieldErrors {
        self.validate(&draft.to_candidate())
    }
}

// ============================================================================
// Field rules
// ============================================================================

type Rule<T> = Result<T, String>;

fn collect<T>(errors: &mut FieldErrors, field: &str, result: Rule<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(message) => {
            errors.insert(field, message);
            None
        }
    }
}

/// Value under `key` unless missing or null
fn present<'a>(candidate: &'a Candidate, key: &str) -> Option<&'a Value> {
    match candidate.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value),
    }
}

/// Like [`present`], also treating blank strings as absent (form inputs)
fn present_scalar<'a>(candidate: &'a Candidate, key: &str) -> Option<&'a Value> {
    match present(candidate, key) {
        Some(Value::String(s)) if s.trim().is_empty() => None,
        other => other,
    }
}

fn required_text(candidate: &Candidate, key: &str, message: &str) -> Rule<String> {
    match present(candidate, key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(message.to_string()),
    }
}

fn genre_rule(candidate: &Candidate, schema: &CatalogSchema) -> Rule<String> {
    match present(candidate, "genre") {
        Some(Value::String(s)) if schema.has_genre(s.trim()) => Ok(s.trim().to_string()),
        _ => Err(format!("Genre must be one of: {}", schema.genres.join(", "))),
    }
}

fn album_rule(candidate: &Candidate) -> Rule<String> {
    match present(candidate, "album") {
        None => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(_) => Err(ALBUM_TEXT.to_string()),
    }
}

/// Integer view of a JSON scalar: integers, integral floats, integer strings
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Number view of a JSON scalar: numbers and numeric strings, finite only
fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|f| f.is_finite())
}

fn year_rule(candidate: &Candidate, current_year: i32) -> Rule<Option<i32>> {
    let Some(value) = present_scalar(candidate, "year") else {
        return Ok(None);
    };

    let message = || format!("Year must be between {} and {}", MIN_YEAR, current_year);
    match as_integer(value) {
        Some(year) if year >= i64::from(MIN_YEAR) && year <= i64::from(current_year) => {
            i32::try_from(year).map(Some).map_err(|_| message())
        }
        _ => Err(message()),
    }
}

fn duration_rule(candidate: &Candidate, schema: &CatalogSchema) -> Rule<Option<u32>> {
    let Some(value) = present_scalar(candidate, "duration") else {
        return Ok(None);
    };
    let malformed = if schema.accept_clock_durations {
        DURATION_MALFORMED_CLOCK
    } else {
        DURATION_MALFORMED
    };

    if let Value::String(s) = value {
        if s.contains(':') {
            if !schema.accept_clock_durations {
                return Err(malformed.to_string());
            }
            if s.trim_start().starts_with('-') {
                return Err(DURATION_NEGATIVE.to_string());
            }
            return duration::parse_clock(s)
                .map(Some)
                .ok_or_else(|| malformed.to_string());
        }
    }

    if as_number(value).is_some_and(|n| n < 0.0) {
        return Err(DURATION_NEGATIVE.to_string());
    }
    match as_integer(value) {
        Some(seconds) => u32::try_from(seconds)
            .map(Some)
            .map_err(|_| malformed.to_string()),
        None => Err(malformed.to_string()),
    }
}

fn rating_rule(candidate: &Candidate) -> Rule<Option<f64>> {
    let Some(value) = present_scalar(candidate, "rating") else {
        return Ok(None);
    };
    match as_number(value) {
        Some(rating) if (MIN_RATING..=MAX_RATING).contains(&rating) => Ok(Some(rating)),
        _ => Err(RATING_RANGE.to_string()),
    }
}

fn tags_rule(candidate: &Candidate) -> Rule<BTreeSet<String>> {
    match present(candidate, "tags") {
        None => Ok(BTreeSet::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.trim().to_string()),
                _ => Err(TAGS_MALFORMED.to_string()),
            })
            .filter(|tag| !matches!(tag, Ok(t) if t.is_empty()))
            .collect(),
        Some(_) => Err(TAGS_MALFORMED.to_string()),
    }
}

fn favorite_rule(candidate: &Candidate) -> Rule<bool> {
    match present(candidate, "isFavorite") {
        None => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(_) => Err(FAVORITE_MALFORMED.to_string()),
    }
}

fn playlist_songs_rule(candidate: &Candidate) -> Rule<Vec<SongId>> {
    let items = match present(candidate, "songs") {
        None => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(PLAYLIST_SONGS_MALFORMED.to_string()),
    };

    let mut seen = BTreeSet::new();
    let mut songs = Vec::with_capacity(items.len());
    for item in items {
        let id = item
            .as_str()
            .and_then(|s| SongId::parse_str(s.trim()).ok())
            .ok_or_else(|| PLAYLIST_SONGS_MALFORMED.to_string())?;
        if seen.insert(id) {
            songs.push(id);
        }
    }
    Ok(songs)
}

fn cover_image_rule(candidate: &Candidate) -> Rule<Option<String>> {
    match present(candidate, "coverImage") {
        None => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(_) => Err(COVER_IMAGE_TEXT.to_string()),
    }
}
