//! Core trait and types for conversation summarizers.
//!
//! This crate provides the shared interface between the worker loop and
//! the LLM backends. It defines:
//!
//! - [`Summarizer`] - the trait every completion backend implements
//! - [`ContextDocument`] / [`ProcessResult`] - the structured request
//!   and response exchanged with a backend
//! - [`build_context`] - assembles a [`ContextDocument`] from raw
//!   messages, prior state, and pending tasks
//! - [`SummarizerError`] - error type for summarizer operations
//!
//! # Example
//!
//! ```rust
//! use summarizer_core::{async_trait, ContextDocument, ProcessResult, Summarizer, SummarizerError};
//!
//! struct MySummarizer;
//!
//! #[async_trait]
//! impl Summarizer for MySummarizer {
//!     async fn complete(&self, _context: &ContextDocument) -> Result<ProcessResult, SummarizerError> {
//!         Ok(ProcessResult::degraded("nothing to report"))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "MySummarizer"
//!     }
//! }
//! ```

mod context;
mod error;
mod result;
mod trait_def;

pub use context::{
    build_context, ContextDocument, ContextMessage, DisplayNameResolver, Goals, OutputFormat,
    PendingTask, PreviousRun, ResponseRules, RoomDescriptor, SELF_SENTINEL,
};
pub use error::SummarizerError;
pub use result::{ProcessResult, TaskUpdate};
pub use trait_def::Summarizer;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
