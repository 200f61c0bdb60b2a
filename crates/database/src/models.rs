//! Database models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A subscriber to the room observation service.
///
/// Created by the signup/admin flow; the worker only reads these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Subscriber {
    pub id: i64,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    /// Room the bot polls for commands and replies into.
    pub control_room_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a subscriber.
#[derive(Debug, Clone, Default)]
pub struct NewSubscriber {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub control_room_id: Option<String>,
}

/// A room a subscriber wants observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WatchedRoom {
    pub id: i64,
    pub subscriber_id: i64,
    /// Remote room identifier on the messaging platform.
    pub room_id: String,
    /// Short code the subscriber refers to the room by, unique per subscriber.
    pub alias: String,
    pub display_name: Option<String>,
    /// Timestamp of the newest message already summarized.
    pub last_read_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WatchedRoom {
    /// The name to show the subscriber: display name, else the remote id.
    pub fn title(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.room_id,
        }
    }
}

/// Processing lifecycle of a watched room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Idle,
    Ready,
    Processing,
    Failed,
}

impl ProcessingStatus {
    /// Stable string form, matching the stored value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Ready => "ready",
            Self::Processing => "processing",
            Self::Failed => "failed",
        }
    }
}

/// Per-room processing state. At most one row per room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProcessingState {
    pub id: i64,
    pub room_id: i64,
    pub status: ProcessingStatus,
    /// Serialized context document staged for the model, if any.
    pub staged_context: Option<String>,
    /// Newest message timestamp covered so far; never moves backward.
    pub last_message_synced_at: Option<DateTime<Utc>>,
    pub last_summarized_at: Option<DateTime<Utc>>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub failure_reason: String,
    pub updated_at: DateTime<Utc>,
}

/// An immutable record of one completed processing run.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Summary {
    pub id: i64,
    pub room_id: i64,
    pub summary: String,
    pub reply: Option<String>,
    pub needs_more_information: bool,
    /// Descriptions of the tasks this run created.
    pub new_task_descriptions: Json<Vec<String>>,
    pub message_count: i64,
    pub from_timestamp: Option<DateTime<Utc>>,
    pub to_timestamp: Option<DateTime<Utc>>,
    /// Delivery outcome: sent XOR failed, recorded exactly once.
    pub sent_at: Option<DateTime<Utc>>,
    pub send_failed_at: Option<DateTime<Utc>>,
    pub send_error: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a summary record.
#[derive(Debug, Clone, Default)]
pub struct NewSummary {
    pub summary: String,
    pub reply: Option<String>,
    pub needs_more_information: bool,
    pub new_task_descriptions: Vec<String>,
    pub message_count: i64,
    pub from_timestamp: Option<DateTime<Utc>>,
    pub to_timestamp: Option<DateTime<Utc>>,
}

/// Task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Done,
    Cancelled,
}

impl TaskStatus {
    /// Parse a status value, rejecting anything outside the valid set.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "done" => Some(Self::Done),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Stable string form, matching the stored value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A task extracted from a conversation or created by the subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    /// Owning room; `None` for general tasks.
    pub room_id: Option<i64>,
    pub description: String,
    pub status: TaskStatus,
    /// Free-text notes, newline-joined on append.
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task joined with the alias of its room, for cross-room listings.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TaggedTask {
    pub id: i64,
    pub room_id: Option<i64>,
    pub description: String,
    pub status: TaskStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub alias: String,
}
