//! # Music Catalogue Common Library
//!
//! Shared code for the catalogue service and its clients:
//! - Song and playlist value types
//! - Field-level validation (authoritative on the server, advisory on clients)
//! - Query normalization for song listings
//! - Catalogue schema configuration
//! - API request/response types
//! - Configuration loading
//! - Duration and time helpers

pub mod api;
pub mod config;
pub mod duration;
pub mod error;
pub mod playlist;
pub mod query;
pub mod schema;
pub mod song;
pub mod time;
pub mod validation;

pub use error::{Error, Result};
pub use playlist::{Playlist, PlaylistDraft, PlaylistId};
pub use query::{normalize, Filter, QueryDescriptor, SortDirection, SortField};
pub use schema::CatalogSchema;
pub use song::{Song, SongDraft, SongId};
pub use validation::{validate, FieldErrors, SongValidator};
