//! Mock summarizer implementations for testing.
//!
//! This crate provides test doubles for the `Summarizer` trait:
//! - `CannedSummarizer` - returns queued or fixed results
//! - `FailingSummarizer` - always fails with a completion error
//!
//! For production processing, use the `openai-summarizer` crate instead.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// Re-export core types for convenience
pub use summarizer_core::{
    async_trait, ContextDocument, ProcessResult, Summarizer, SummarizerError,
};

/// A summarizer that returns canned results.
///
/// Queued results are returned in order; once the queue is empty the
/// default result is returned for every further call.
#[derive(Debug, Default)]
pub struct CannedSummarizer {
    queue: Mutex<VecDeque<ProcessResult>>,
    default: ProcessResult,
    calls: AtomicUsize,
}

impl CannedSummarizer {
    /// Create a summarizer that always returns `result`.
    pub fn new(result: ProcessResult) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            default: result,
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a summarizer that returns `results` in order, then the
    /// last one for every further call.
    pub fn with_queue(mut results: Vec<ProcessResult>) -> Self {
        let default = results.pop().unwrap_or_default();
        Self {
            queue: Mutex::new(results.into()),
            default,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for CannedSummarizer {
    async fn complete(&self, _context: &ContextDocument) -> Result<ProcessResult, SummarizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        Ok(next.unwrap_or_else(|| self.default.clone()))
    }

    fn name(&self) -> &str {
        "CannedSummarizer"
    }
}

/// A summarizer that always fails.
///
/// Useful for exercising the failed-state path in the worker.
#[derive(Debug, Clone)]
pub struct FailingSummarizer {
    message: String,
}

impl FailingSummarizer {
    /// Create a failing summarizer with the given error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for FailingSummarizer {
    fn default() -> Self {
        Self::new("mock completion failure")
    }
}

#[async_trait]
impl Summarizer for FailingSummarizer {
    async fn complete(&self, _context: &ContextDocument) -> Result<ProcessResult, SummarizerError> {
        Err(SummarizerError::Completion(self.message.clone()))
    }

    fn name(&self) -> &str {
        "FailingSummarizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use summarizer_core::{Goals, OutputFormat, ResponseRules, RoomDescriptor};

    fn context() -> ContextDocument {
        ContextDocument {
            room: RoomDescriptor {
                alias: "ab2c".to_string(),
                name: None,
            },
            messages: Vec::new(),
            sender_map: BTreeMap::new(),
            previous_summary: None,
            previous_tasks: None,
            pending_tasks: Vec::new(),
            goals: Goals::default(),
            response_rules: ResponseRules::default(),
            output_format: OutputFormat::default(),
        }
    }

    #[tokio::test]
    async fn test_canned_returns_fixed_result() {
        let canned = CannedSummarizer::new(ProcessResult::degraded("fixed"));

        let first = canned.complete(&context()).await.unwrap();
        let second = canned.complete(&context()).await.unwrap();

        assert_eq!(first.summary, "fixed");
        assert_eq!(second.summary, "fixed");
        assert_eq!(canned.calls(), 2);
    }

    #[tokio::test]
    async fn test_canned_queue_drains_in_order() {
        let canned = CannedSummarizer::with_queue(vec![
            ProcessResult::degraded("first"),
            ProcessResult::degraded("second"),
        ]);

        assert_eq!(canned.complete(&context()).await.unwrap().summary, "first");
        assert_eq!(canned.complete(&context()).await.unwrap().summary, "second");
        // Queue exhausted: the last result repeats.
        assert_eq!(canned.complete(&context()).await.unwrap().summary, "second");
    }

    #[tokio::test]
    async fn test_failing_summarizer_errors() {
        let failing = FailingSummarizer::new("boom");

        let err = failing.complete(&context()).await.unwrap_err();
        assert!(matches!(err, SummarizerError::Completion(_)));
        assert!(err.to_string().contains("boom"));
    }
}
