//! mcat-api library - music catalogue HTTP service
//!
//! Songs and playlists over a SQLite store. Every write goes through the
//! shared validator; listings go through the query normalizer.

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware, Router,
};
use mcat_common::{CatalogSchema, SongValidator};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod api;
pub mod db;
pub mod error;

pub use error::{ApiError, ApiResult};

/// Largest accepted request body
pub const BODY_LIMIT: usize = 10 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Authoritative song validator (schema + clock)
    pub validator: SongValidator,
    /// Put internal error details in 500 responses
    pub expose_internal_errors: bool,
    /// Front-end origin allowed by CORS
    pub cors_origin: String,
}

impl AppState {
    /// State with default CORS origin and internal errors hidden
    pub fn new(db: SqlitePool, validator: SongValidator) -> Self {
        Self {
            db,
            validator,
            expose_internal_errors: false,
            cors_origin: mcat_common::config::DEFAULT_CORS_ORIGIN.to_string(),
        }
    }

    pub fn with_cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_origin = origin.into();
        self
    }

    pub fn with_exposed_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }

    pub fn schema(&self) -> &CatalogSchema {
        self.validator.schema()
    }
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!("Invalid CORS origin {:?}, cross-origin requests disabled", origin);
            layer
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origin);

    Router::new()
        .merge(api::health_routes())
        .merge(api::song_routes())
        .merge(api::catalog_routes())
        .merge(api::playlist_routes())
        .fallback(api::route_not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            error::expose_internal_errors,
        ))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
