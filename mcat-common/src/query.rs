//! Query normalization for song listings
//!
//! Raw listing parameters (`search`, `genre`, `artist`, `sortBy`, `order`,
//! `page`, `limit`) arrive as untyped strings. [`normalize`] turns them into
//! a [`QueryDescriptor`]: a filter tree, a whitelisted sort key and a
//! bounded page window. It never fails; anything unusable falls back to
//! the schema defaults.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::CatalogSchema;
use crate::song::Song;

/// Parameters [`normalize`] understands
pub const KNOWN_PARAMS: [&str; 7] = ["search", "genre", "artist", "sortBy", "order", "page", "limit"];

/// Case folding shared by the in-memory matcher and the storage layer
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Fields free-text search looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Artist,
}

impl SearchField {
    fn value<'a>(&self, song: &'a Song) -> &'a str {
        match self {
            SearchField::Title => &song.title,
            SearchField::Artist => &song.artist,
        }
    }
}

/// Fields that support exact-match filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    Artist,
    Album,
    Genre,
}

impl TextField {
    /// Storage column name
    pub fn column(&self) -> &'static str {
        match self {
            TextField::Title => "title",
            TextField::Artist => "artist",
            TextField::Album => "album",
            TextField::Genre => "genre",
        }
    }

    fn value<'a>(&self, song: &'a Song) -> &'a str {
        match self {
            TextField::Title => &song.title,
            TextField::Artist => &song.artist,
            TextField::Album => &song.album,
            TextField::Genre => &song.genre,
        }
    }
}

/// Filter predicate tree
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every song
    MatchAll,
    /// Case-insensitive literal substring; `term` is already case-folded
    Contains { field: SearchField, term: String },
    /// Exact, case-sensitive equality
    Equals { field: TextField, value: String },
    IsFavorite(bool),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    /// Substring predicate; folds `term` once here
    pub fn contains(field: SearchField, term: &str) -> Self {
        Filter::Contains {
            field,
            term: fold_case(term),
        }
    }

    pub fn equals(field: TextField, value: impl Into<String>) -> Self {
        Filter::Equals {
            field,
            value: value.into(),
        }
    }

    /// Conjunction with `MatchAll` members dropped and trivial shapes
    /// collapsed
    pub fn all(filters: Vec<Filter>) -> Self {
        let mut filters: Vec<Filter> = filters
            .into_iter()
            .filter(|f| *f != Filter::MatchAll)
            .collect();
        match filters.len() {
            0 => Filter::MatchAll,
            1 => filters.remove(0),
            _ => Filter::And(filters),
        }
    }

    /// Evaluate against an in-memory song
    pub fn matches(&self, song: &Song) -> bool {
        match self {
            Filter::MatchAll => true,
            Filter::Contains { field, term } => fold_case(field.value(song)).contains(term.as_str()),
            Filter::Equals { field, value } => field.value(song) == value,
            Filter::IsFavorite(flag) => song.is_favorite == *flag,
            Filter::And(filters) => filters.iter().all(|f| f.matches(song)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(song)),
        }
    }
}

/// Whitelisted sort keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Title,
    Artist,
    Album,
    Year,
    Genre,
    Duration,
    Rating,
    CreatedAt,
    IsFavorite,
}

impl SortField {
    /// Parse a wire name (`createdAt`) or its snake_case alias
    /// (`created_at`). Anything else is rejected.
    pub fn parse(name: &str) -> Option<Self> {
        let field = match name.trim().to_ascii_lowercase().as_str() {
            "title" => SortField::Title,
            "artist" => SortField::Artist,
            "album" => SortField::Album,
            "year" => SortField::Year,
            "genre" => SortField::Genre,
            "duration" => SortField::Duration,
            "rating" => SortField::Rating,
            "createdat" | "created_at" => SortField::CreatedAt,
            "isfavorite" | "is_favorite" => SortField::IsFavorite,
            _ => return None,
        };
        Some(field)
    }

    /// Storage column name
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Artist => "artist",
            SortField::Album => "album",
            SortField::Year => "year",
            SortField::Genre => "genre",
            SortField::Duration => "duration",
            SortField::Rating => "rating",
            SortField::CreatedAt => "created_at",
            SortField::IsFavorite => "is_favorite",
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Artist => "artist",
            SortField::Album => "album",
            SortField::Year => "year",
            SortField::Genre => "genre",
            SortField::Duration => "duration",
            SortField::Rating => "rating",
            SortField::CreatedAt => "createdAt",
            SortField::IsFavorite => "isFavorite",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Some(SortDirection::Asc),
            "desc" | "descending" | "-1" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Canonical, safe listing request
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub filter: Filter,
    pub sort_key: SortField,
    pub sort_direction: SortDirection,
    /// 1-based page number
    pub page: u32,
    /// Rows skipped before the page starts
    pub page_offset: u64,
    /// Rows per page, within `1..=max_limit`
    pub page_limit: u32,
}

impl QueryDescriptor {
    /// Unfiltered first page with schema defaults
    pub fn new(schema: &CatalogSchema) -> Self {
        Self {
            filter: Filter::MatchAll,
            sort_key: schema.default_sort,
            sort_direction: SortDirection::Asc,
            page: 1,
            page_offset: 0,
            page_limit: schema.default_limit.clamp(1, schema.max_limit.max(1)),
        }
    }

    /// Number of pages needed for `total` matching rows
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.page_limit.max(1)))
    }
}

/// Normalize raw listing parameters against `schema`
pub fn normalize(raw: &HashMap<String, String>, schema: &CatalogSchema) -> QueryDescriptor {
    for key in raw.keys().filter(|k| !KNOWN_PARAMS.contains(&k.as_str())) {
        debug!("Ignoring unknown listing parameter: {}", key);
    }

    let mut descriptor = QueryDescriptor::new(schema);
    let param = |key: &str| {
        raw.get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    };

    let mut filters = Vec::new();
    if let Some(term) = param("search") {
        filters.push(Filter::Or(vec![
            Filter::contains(SearchField::Title, term),
            Filter::contains(SearchField::Artist, term),
        ]));
    }
    if let Some(genre) = param("genre") {
        filters.push(Filter::equals(TextField::Genre, genre));
    }
    if let Some(artist) = param("artist") {
        filters.push(Filter::equals(TextField::Artist, artist));
    }
    descriptor.filter = Filter::all(filters);

    if let Some(sort_by) = param("sortBy") {
        match SortField::parse(sort_by) {
            Some(field) => descriptor.sort_key = field,
            None => debug!(
                "Unknown sort field {:?}, using {}",
                sort_by,
                schema.default_sort.as_str()
            ),
        }
    }

    if let Some(order) = param("order") {
        descriptor.sort_direction = SortDirection::parse(order).unwrap_or_default();
    }

    if let Some(page) = param("page").and_then(positive) {
        descriptor.page = page;
    }
    if let Some(limit) = param("limit").and_then(positive) {
        descriptor.page_limit = limit.min(schema.max_limit.max(1));
    }
    descriptor.page_offset =
        u64::from(descriptor.page - 1).saturating_mul(u64::from(descriptor.page_limit));

    descriptor
}

/// Descriptor for the favorites listing: every favorite, default order
pub fn favorites_query(schema: &CatalogSchema) -> QueryDescriptor {
    QueryDescriptor {
        filter: Filter::IsFavorite(true),
        ..QueryDescriptor::new(schema)
    }
}

/// Positive integer, saturating at `u32::MAX`
fn positive(value: &str) -> Option<u32> {
    let n: u64 = value.parse().ok()?;
    if n == 0 {
        return None;
    }
    Some(u32::try_from(n).unwrap_or(u32::MAX))
}
