//! Structured result returned by a summarizer backend.

use serde::{Deserialize, Serialize};

/// A proposed mutation to an existing task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    /// Id of the task to update.
    pub id: i64,
    /// Proposed status. Values outside {pending, done, cancelled} are
    /// ignored by the reconciler.
    #[serde(default)]
    pub status: String,
    /// Optional note to append to the task.
    #[serde(default)]
    pub note: Option<String>,
}

/// The structured outcome of one completion run.
///
/// Every field defaults so a partial model reply still deserializes;
/// a reply with no parseable JSON at all becomes
/// [`ProcessResult::degraded`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProcessResult {
    /// Short summary of the conversation.
    #[serde(default)]
    pub summary: String,

    /// Suggested reply the operator could send, if the model produced one.
    #[serde(default)]
    pub reply: Option<String>,

    /// Whether the model judged the conversation to need more
    /// information before a useful reply is possible.
    #[serde(default)]
    pub needs_more_information: bool,

    /// Proposed mutations to existing tasks.
    #[serde(default)]
    pub task_updates: Vec<TaskUpdate>,

    /// Descriptions of new tasks to create.
    #[serde(default, alias = "todo_list")]
    pub new_todos: Vec<String>,
}

impl ProcessResult {
    /// Build the degraded fallback used when model output has no
    /// parseable JSON object: the raw text becomes the summary and
    /// everything else is empty.
    pub fn degraded(raw: impl Into<String>) -> Self {
        Self {
            summary: raw.into(),
            reply: None,
            needs_more_information: false,
            task_updates: Vec::new(),
            new_todos: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_object_deserializes_with_defaults() {
        let result: ProcessResult =
            serde_json::from_str(r#"{"summary": "short", "reply": "hi"}"#).unwrap();

        assert_eq!(result.summary, "short");
        assert_eq!(result.reply.as_deref(), Some("hi"));
        assert!(!result.needs_more_information);
        assert!(result.task_updates.is_empty());
        assert!(result.new_todos.is_empty());
    }

    #[test]
    fn test_todo_list_alias_accepted() {
        let result: ProcessResult =
            serde_json::from_str(r#"{"summary": "s", "todo_list": ["buy milk"]}"#).unwrap();
        assert_eq!(result.new_todos, vec!["buy milk".to_string()]);
    }

    #[test]
    fn test_task_updates_parse() {
        let result: ProcessResult = serde_json::from_str(
            r#"{"summary": "s", "task_updates": [{"id": 3, "status": "done", "note": "shipped"}]}"#,
        )
        .unwrap();

        assert_eq!(result.task_updates.len(), 1);
        assert_eq!(result.task_updates[0].id, 3);
        assert_eq!(result.task_updates[0].status, "done");
        assert_eq!(result.task_updates[0].note.as_deref(), Some("shipped"));
    }

    #[test]
    fn test_degraded_shape() {
        let result = ProcessResult::degraded("raw model text");

        assert_eq!(result.summary, "raw model text");
        assert!(result.reply.is_none());
        assert!(!result.needs_more_information);
        assert!(result.task_updates.is_empty());
        assert!(result.new_todos.is_empty());
    }
}
