//! Shared HTTP API types
//!
//! Request and response bodies exchanged between `mcat-api` and
//! `mcat-client`. Pure serde types with no HTTP framework dependencies.

pub mod types;

pub use types::{
    AddSongRequest, ErrorResponse, GenreCount, HealthResponse, SongListResponse, StatsResponse,
    ValidationErrorResponse, WelcomeResponse,
};
