//! Error types for mcat-api
//!
//! Handlers return [`ApiResult`]. Client mistakes map to 4xx with a message
//! the client can show; everything else is a 500 whose details are logged
//! and, unless the service is configured to expose them, withheld from the
//! response body.

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use mcat_common::api::{ErrorResponse, ValidationErrorResponse};
use mcat_common::FieldErrors;
use thiserror::Error;
use tracing::error;

use crate::AppState;

/// Body of every 500 unless internal errors are exposed
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Candidate failed field validation (400, `{errors}`)
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Malformed request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Request body over the size limit (413)
    #[error("Request body too large")]
    PayloadTooLarge,

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Storage failure (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// mcat-common error
    #[error("{0}")]
    Common(#[from] mcat_common::Error),
}

/// Detail of a 500, attached to the response for [`expose_internal_errors`]
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

impl ApiError {
    pub fn song_not_found(id: impl std::fmt::Display) -> Self {
        ApiError::NotFound(format!("Song not found: {}", id))
    }

    pub fn playlist_not_found(id: impl std::fmt::Display) -> Self {
        ApiError::NotFound(format!("Playlist not found: {}", id))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, Json(ValidationErrorResponse { errors }))
                    .into_response();
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large".to_string(),
            ),
            ApiError::Common(mcat_common::Error::NotFound(msg)) => (StatusCode::NOT_FOUND, msg),
            ApiError::Common(mcat_common::Error::InvalidInput(msg)) => (StatusCode::BAD_REQUEST, msg),
            internal => return internal_error(internal.to_string()),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

fn internal_error(detail: String) -> Response {
    error!("Request failed: {}", detail);

    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(INTERNAL_ERROR_MESSAGE)),
    )
        .into_response();
    response.extensions_mut().insert(InternalErrorDetail(detail));
    response
}

/// Middleware replacing the generic 500 body with the logged detail when
/// `expose_internal_errors` is on
pub async fn expose_internal_errors(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !state.expose_internal_errors {
        return response;
    }

    match response.extensions().get::<InternalErrorDetail>().cloned() {
        Some(InternalErrorDetail(detail)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(detail)),
        )
            .into_response(),
        None => response,
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
