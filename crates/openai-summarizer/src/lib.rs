//! OpenAI-backed summarizer implementation.
//!
//! Sends a serialized [`summarizer_core::ContextDocument`] to an
//! OpenAI-compatible chat-completion endpoint and parses the structured
//! [`summarizer_core::ProcessResult`] out of the reply. A reply without
//! a parseable JSON object degrades into a raw-text summary instead of
//! failing the run.

mod api_types;
mod config;
mod parse;
mod summarizer;

pub use config::{OpenAiConfig, OpenAiConfigBuilder};
pub use parse::parse_process_result;
pub use summarizer::OpenAiSummarizer;

// Re-export core types for convenience
pub use summarizer_core::{ContextDocument, ProcessResult, Summarizer, SummarizerError};
