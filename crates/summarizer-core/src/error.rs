//! Error types for summarizer operations.

use thiserror::Error;

/// Errors that can occur while completing a context document.
///
/// Transport and API failures are retryable by the caller's next cycle;
/// malformed model output is never an error (it degrades into a raw-text
/// [`crate::ProcessResult`] instead).
#[derive(Debug, Error)]
pub enum SummarizerError {
    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network failure talking to the completion endpoint.
    #[error("network error: {0}")]
    Network(String),

    /// The completion endpoint returned an error.
    #[error("completion failed: {0}")]
    Completion(String),
}
