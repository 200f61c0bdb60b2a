//! Error types for the Matrix client.

use thiserror::Error;

/// Errors that can occur when talking to a Matrix homeserver.
#[derive(Debug, Error)]
pub enum MatrixError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error response from the homeserver.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// An operation requiring authentication was called before login.
    #[error("not logged in")]
    NotLoggedIn,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
