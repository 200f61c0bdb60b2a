//! The Summarizer trait definition.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::ContextDocument;
use crate::error::SummarizerError;
use crate::result::ProcessResult;

/// A backend that turns a [`ContextDocument`] into a [`ProcessResult`].
///
/// Implementations must be `Send + Sync` so the worker can share one
/// instance across its whole run.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Complete a context document into a structured result.
    ///
    /// Transport or API failures return a [`SummarizerError`]; a reply
    /// the backend could not parse must degrade into
    /// [`ProcessResult::degraded`] rather than error.
    async fn complete(&self, context: &ContextDocument) -> Result<ProcessResult, SummarizerError>;

    /// Human-readable backend name, for logging.
    fn name(&self) -> &str;
}

#[async_trait]
impl<S: Summarizer + ?Sized> Summarizer for Arc<S> {
    async fn complete(&self, context: &ContextDocument) -> Result<ProcessResult, SummarizerError> {
        (**self).complete(context).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
