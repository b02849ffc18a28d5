//! Client error types

use mcat_common::FieldErrors;
use thiserror::Error;

/// Client result type
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Request never got a response (connection refused, timeout, ...)
    #[error("Network error: {0}")]
    Transport(String),

    /// Rejected field by field, locally or by the server
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}
