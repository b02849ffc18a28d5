//! Catalogue schema configuration
//!
//! The catalogue has shipped with several song shapes (different genre
//! lists, numeric vs clock-string durations). Rather than forking the
//! entity, those differences are options on one versioned schema.

use serde::{Deserialize, Serialize};

use crate::query::SortField;

/// Current schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Earliest accepted release year
pub const MIN_YEAR: i32 = 1900;

/// Rating bounds (inclusive)
pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 5.0;

/// Default page size for listings
pub const DEFAULT_LIMIT: u32 = 10;

/// Upper bound on page size
pub const MAX_LIMIT: u32 = 100;

/// Genre list of the default preset
pub const DEFAULT_GENRES: [&str; 6] = ["Pop", "Rock", "Jazz", "Classical", "Electronic", "Other"];

/// Genre list of the original Catalan deployment
pub const CATALAN_GENRES: [&str; 6] = ["Pop", "Rock", "Jazz", "Clàssica", "Electrònica", "Altres"];

/// Versioned description of what a valid catalogue looks like
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSchema {
    /// Schema version, bumped when validation rules change
    pub version: u32,
    /// Closed set of accepted genres, in display order
    pub genres: Vec<String>,
    /// Sort field used when a listing names none or an unknown one
    pub default_sort: SortField,
    /// Page size used when a listing names none or an invalid one
    pub default_limit: u32,
    /// Largest page size a listing may request
    pub max_limit: u32,
    /// Accept legacy `M:SS` duration strings on input (converted to seconds)
    pub accept_clock_durations: bool,
}

impl Default for CatalogSchema {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            genres: DEFAULT_GENRES.iter().map(|g| g.to_string()).collect(),
            default_sort: SortField::Title,
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
            accept_clock_durations: true,
        }
    }
}

impl CatalogSchema {
    /// Schema of the original Catalan deployment
    pub fn catalan() -> Self {
        Self {
            genres: CATALAN_GENRES.iter().map(|g| g.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Look up a preset by name (`"default"` or `"catalan"`)
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "default" => Some(Self::default()),
            "catalan" | "ca" => Some(Self::catalan()),
            _ => None,
        }
    }

    /// Whether `genre` belongs to the configured set (exact match)
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }
}
