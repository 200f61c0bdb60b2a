//! Reply formatting for the control room.
//!
//! All replies are plain multi-line text, sections separated by blank
//! lines. No rich markup.

use lookout_database::{TaggedTask, Task, WatchedRoom};
use summarizer_core::ProcessResult;

/// Help text mirroring the command table in [`crate::commands`].
pub fn help_text() -> &'static str {
    "Available commands:\n\
     \n\
     • help - Show this help message\n\
     • rooms - List your watched rooms\n\
     • summary all - Get summaries for all rooms\n\
     • summary <room code> - Get a summary for a specific room\n\
     • todo all - Show all pending tasks\n\
     • todo <room code> - Show tasks for a specific room"
}

/// Guidance reply for messages that look like a command but do not parse.
pub fn unknown_command() -> &'static str {
    "Sorry, I didn't recognize that command. Type 'help' to see what I can do."
}

/// Reply when the subscriber has no watched rooms.
pub fn no_rooms() -> &'static str {
    "You don't have any watched rooms yet."
}

/// Fallback notice when no room had anything to summarize.
pub fn nothing_to_summarize() -> &'static str {
    "No new messages to summarize."
}

/// Reply when an alias does not resolve for this subscriber.
pub fn room_not_found(alias: &str) -> String {
    format!(
        "Room '{}' not found. Use 'rooms' to see your room codes.",
        alias
    )
}

/// Cooldown reply with the remaining wait.
pub fn cooldown(remaining_minutes: i64) -> String {
    format!(
        "Please wait {} more minutes for the next summary.",
        remaining_minutes
    )
}

/// List the subscriber's watched rooms with their aliases.
pub fn rooms_list(rooms: &[WatchedRoom]) -> String {
    let mut lines = vec!["Your watched rooms:".to_string(), String::new()];
    for room in rooms {
        lines.push(format!("• {} - {}", room.alias, room.title()));
    }
    lines.join("\n")
}

/// Pending tasks across all rooms, each line tagged with its room alias.
pub fn todo_list_all(tasks: &[TaggedTask]) -> String {
    if tasks.is_empty() {
        return "No pending tasks. You're all caught up!".to_string();
    }

    let mut lines = vec!["Your pending tasks:".to_string(), String::new()];
    for task in tasks {
        lines.push(format!("• [{}] {}", task.alias, task.description));
    }
    lines.join("\n")
}

/// Pending tasks for one room.
pub fn todo_list_room(room_title: &str, tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return format!("No pending tasks for {}.", room_title);
    }

    let mut lines = vec![format!("Pending tasks for {}:", room_title), String::new()];
    for task in tasks {
        lines.push(format!("• {}", task.description));
    }
    lines.join("\n")
}

/// The multi-section summary reply.
///
/// Sections in order: header, summary, optional suggested reply,
/// optional needs-more-info note, newly created tasks, remaining
/// pending tasks, trailer with message count and today's run count.
pub fn summary_message(
    room: &WatchedRoom,
    result: &ProcessResult,
    created: &[Task],
    remaining_pending: &[Task],
    message_count: usize,
    daily_count: i64,
) -> String {
    let mut sections: Vec<String> = Vec::new();

    sections.push(format!("Summary for {} ({})", room.title(), room.alias));
    sections.push(result.summary.clone());

    if let Some(reply) = result.reply.as_deref().filter(|r| !r.trim().is_empty()) {
        sections.push(format!("Suggested reply:\n{}", reply));
    }

    if result.needs_more_information {
        sections.push("I could use more information to answer confidently.".to_string());
    }

    if !created.is_empty() {
        let mut lines = vec!["New tasks:".to_string()];
        for task in created {
            lines.push(format!("• {}", task.description));
        }
        sections.push(lines.join("\n"));
    }

    if !remaining_pending.is_empty() {
        let mut lines = vec!["Pending tasks:".to_string()];
        for task in remaining_pending {
            lines.push(format!("• {}", task.description));
        }
        sections.push(lines.join("\n"));
    }

    sections.push(format!(
        "Covered {} messages. Summary #{} for this room today.",
        message_count, daily_count
    ));

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lookout_database::TaskStatus;

    fn room() -> WatchedRoom {
        WatchedRoom {
            id: 1,
            subscriber_id: 1,
            room_id: "!family:example.org".to_string(),
            alias: "k7pw".to_string(),
            display_name: Some("Family".to_string()),
            last_read_at: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn task(id: i64, description: &str) -> Task {
        Task {
            id,
            room_id: Some(1),
            description: description.to_string(),
            status: TaskStatus::Pending,
            notes: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_message_full_sections() {
        let result = ProcessResult {
            summary: "Asked about meeting time".to_string(),
            reply: Some("It's at 3pm".to_string()),
            needs_more_information: true,
            task_updates: Vec::new(),
            new_todos: Vec::new(),
        };
        let created = vec![task(10, "confirm meeting time")];
        let pending = vec![task(7, "send the agenda")];

        let text = summary_message(&room(), &result, &created, &pending, 4, 2);

        assert!(text.starts_with("Summary for Family (k7pw)"));
        assert!(text.contains("Asked about meeting time"));
        assert!(text.contains("Suggested reply:\nIt's at 3pm"));
        assert!(text.contains("more information"));
        assert!(text.contains("New tasks:\n• confirm meeting time"));
        assert!(text.contains("Pending tasks:\n• send the agenda"));
        assert!(text.contains("Covered 4 messages. Summary #2 for this room today."));
        // Sections separated by blank lines, plain text only.
        assert!(text.contains("\n\n"));
        assert!(!text.contains("**"));
    }

    #[test]
    fn test_summary_message_omits_empty_sections() {
        let result = ProcessResult {
            summary: "Quiet day".to_string(),
            reply: None,
            needs_more_information: false,
            task_updates: Vec::new(),
            new_todos: Vec::new(),
        };

        let text = summary_message(&room(), &result, &[], &[], 1, 1);

        assert!(!text.contains("Suggested reply"));
        assert!(!text.contains("more information"));
        assert!(!text.contains("New tasks"));
        assert!(!text.contains("Pending tasks"));
    }

    #[test]
    fn test_rooms_list_uses_alias_and_title() {
        let text = rooms_list(&[room()]);
        assert!(text.contains("• k7pw - Family"));
    }

    #[test]
    fn test_todo_list_all_tags_room_alias() {
        let tasks = vec![TaggedTask {
            id: 1,
            room_id: Some(1),
            description: "call the plumber".to_string(),
            status: TaskStatus::Pending,
            notes: String::new(),
            created_at: Utc::now(),
            alias: "k7pw".to_string(),
        }];

        let text = todo_list_all(&tasks);
        assert!(text.contains("• [k7pw] call the plumber"));
    }

    #[test]
    fn test_todo_list_room_empty() {
        let text = todo_list_room("Family", &[]);
        assert_eq!(text, "No pending tasks for Family.");
    }
}
