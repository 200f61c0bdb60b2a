//! Context document assembly.
//!
//! A [`ContextDocument`] is the structured request handed to a
//! [`crate::Summarizer`]: the conversation, an identity map, the prior
//! run's output, the operator's open tasks, and a fixed policy block
//! declaring goals, response rules, and the expected output shape.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sentinel the configured self identity maps to in the sender map.
pub const SELF_SENTINEL: &str = "yourself";

/// Resolves a raw platform user id to a display name, best-effort.
#[async_trait]
pub trait DisplayNameResolver: Send + Sync {
    /// Resolve `user_id` to a display name, or `None` when unknown.
    async fn resolve(&self, user_id: &str) -> Option<String>;
}

/// The room a context document describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDescriptor {
    /// Short alias the operator refers to the room by.
    pub alias: String,
    /// Cached display name, if known.
    pub name: Option<String>,
}

impl RoomDescriptor {
    /// The name to show the operator: display name, else alias.
    pub fn title(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.alias,
        }
    }
}

/// One conversation message, chronological position preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMessage {
    /// Raw platform sender id; the sender map translates it.
    pub sender: String,
    /// Plain-text content.
    pub content: String,
}

/// An open task carried into the context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTask {
    pub id: i64,
    pub description: String,
    pub notes: String,
}

/// The prior run's output for the same room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousRun {
    pub summary: String,
    pub tasks: Vec<String>,
}

/// What the model is asked to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goals {
    pub reply_generation: ReplyGeneration,
    pub task_extraction: TaskExtraction,
    pub task_reconciliation: TaskReconciliation,
    pub conversation_summary: ConversationSummaryGoal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyGeneration {
    pub direct_answer_if_possible: bool,
    pub acknowledge_if_unclear: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskExtraction {
    pub enabled: bool,
    pub only_if_actionable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReconciliation {
    pub enabled: bool,
    pub update_existing_by_id: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummaryGoal {
    pub enabled: bool,
    pub length: String,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            reply_generation: ReplyGeneration {
                direct_answer_if_possible: true,
                acknowledge_if_unclear: true,
            },
            task_extraction: TaskExtraction {
                enabled: true,
                only_if_actionable: true,
            },
            task_reconciliation: TaskReconciliation {
                enabled: true,
                update_existing_by_id: true,
            },
            conversation_summary: ConversationSummaryGoal {
                enabled: true,
                length: "short".to_string(),
            },
        }
    }
}

/// How the model should write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRules {
    pub language: String,
    pub tone: String,
    pub emoji_usage: String,
    pub no_markdown: bool,
}

impl Default for ResponseRules {
    fn default() -> Self {
        Self {
            language: "same as sender".to_string(),
            tone: "natural, polite, concise".to_string(),
            emoji_usage: "only_if_user_used".to_string(),
            no_markdown: true,
        }
    }
}

/// Declares exactly which fields and types the model must return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFormat {
    pub summary: String,
    pub reply: String,
    pub needs_more_information: String,
    pub task_updates: String,
    pub new_todos: String,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self {
            summary: "string".to_string(),
            reply: "string | null".to_string(),
            needs_more_information: "boolean".to_string(),
            task_updates:
                "array of {id: integer, status: \"pending\" | \"done\" | \"cancelled\", note: string | null} | empty"
                    .to_string(),
            new_todos: "array of strings | empty".to_string(),
        }
    }
}

/// The structured request handed to a summarizer backend.
///
/// `previous_summary` and `previous_tasks` serialize as explicit nulls
/// when absent so the model always sees the keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDocument {
    pub room: RoomDescriptor,
    pub messages: Vec<ContextMessage>,
    pub sender_map: BTreeMap<String, String>,
    pub previous_summary: Option<String>,
    pub previous_tasks: Option<Vec<String>>,
    pub pending_tasks: Vec<PendingTask>,
    pub goals: Goals,
    pub response_rules: ResponseRules,
    pub output_format: OutputFormat,
}

/// Assemble a context document from new messages.
///
/// Returns `None` when there are no messages: callers treat that as
/// nothing-to-do, not an error. The sender map binds the configured
/// self identity to [`SELF_SENTINEL`]; every other observed sender
/// resolves through `resolver`, memoized per call, falling back to the
/// raw identifier when the lookup fails or is empty.
pub async fn build_context<R>(
    room: RoomDescriptor,
    messages: &[ContextMessage],
    self_id: &str,
    previous: Option<PreviousRun>,
    pending_tasks: Vec<PendingTask>,
    resolver: &R,
) -> Option<ContextDocument>
where
    R: DisplayNameResolver + ?Sized,
{
    if messages.is_empty() {
        return None;
    }

    let mut sender_map: BTreeMap<String, String> = BTreeMap::new();
    sender_map.insert(self_id.to_string(), SELF_SENTINEL.to_string());

    for message in messages {
        let sender = message.sender.as_str();
        if sender.is_empty() || sender_map.contains_key(sender) {
            continue;
        }
        let name = match resolver.resolve(sender).await {
            Some(name) if !name.trim().is_empty() => name,
            _ => sender.to_string(),
        };
        sender_map.insert(sender.to_string(), name);
    }

    let (previous_summary, previous_tasks) = match previous {
        Some(run) => (Some(run.summary), Some(run.tasks)),
        None => (None, None),
    };

    Some(ContextDocument {
        room,
        messages: messages.to_vec(),
        sender_map,
        previous_summary,
        previous_tasks,
        pending_tasks,
        goals: Goals::default(),
        response_rules: ResponseRules::default(),
        output_format: OutputFormat::default(),
    })
}
