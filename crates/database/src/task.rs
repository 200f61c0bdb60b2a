//! Task persistence and reconciliation.
//!
//! [`reconcile`] is the only writer of task state besides explicit
//! subscriber actions. It applies model-proposed mutations in one
//! transaction, scoped by task id *and* room so a stale or cross-room
//! id can never touch another room's tasks.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{TaggedTask, Task, TaskStatus};

const TASK_COLUMNS: &str = "id, room_id, description, status, notes, created_at, updated_at";

/// A model-proposed mutation to one task.
#[derive(Debug, Clone, Default)]
pub struct TaskChange {
    /// Target task id, resolved within the reconciled room only.
    pub task_id: i64,
    /// Proposed status; values outside the valid set are ignored.
    pub status: Option<String>,
    /// Note to append, newline-joined onto existing notes.
    pub note: Option<String>,
}

/// Outcome of a reconcile run.
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    /// Changes that touched an existing task.
    pub updated: usize,
    /// Changes that resolved to no task in the room (stale ids).
    pub skipped: usize,
    /// Tasks created from new descriptions, in creation order.
    pub created: Vec<Task>,
}

/// Apply model-proposed task mutations for one room, transactionally.
///
/// Unknown or cross-room ids are skipped silently; invalid status
/// values leave the status unchanged (a supplied note still appends);
/// empty new-task descriptions are dropped. Field updates are single
/// statements so a concurrent manual edit to a different field is
/// never lost.
pub async fn reconcile(
    pool: &SqlitePool,
    room_id: i64,
    changes: &[TaskChange],
    new_descriptions: &[String],
) -> Result<ReconcileReport> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();
    let mut report = ReconcileReport::default();

    for change in changes {
        let mut touched = false;

        if let Some(status) = change.status.as_deref().and_then(TaskStatus::parse) {
            let result = sqlx::query(
                r#"
                UPDATE tasks
                SET status = ?, updated_at = ?
                WHERE id = ? AND room_id = ?
                "#,
            )
            .bind(status)
            .bind(now)
            .bind(change.task_id)
            .bind(room_id)
            .execute(&mut *tx)
            .await?;
            touched |= result.rows_affected() > 0;
        }

        if let Some(note) = change.note.as_deref().filter(|n| !n.trim().is_empty()) {
            let result = sqlx::query(
                r#"
                UPDATE tasks
                SET notes = CASE WHEN notes = '' THEN ? ELSE notes || char(10) || ? END,
                    updated_at = ?
                WHERE id = ? AND room_id = ?
                "#,
            )
            .bind(note)
            .bind(note)
            .bind(now)
            .bind(change.task_id)
            .bind(room_id)
            .execute(&mut *tx)
            .await?;
            touched |= result.rows_affected() > 0;
        }

        if touched {
            report.updated += 1;
        } else {
            report.skipped += 1;
        }
    }

    for description in new_descriptions {
        let description = description.trim();
        if description.is_empty() {
            continue;
        }

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (room_id, description, status, notes, created_at, updated_at)
            VALUES (?, ?, 'pending', '', ?, ?)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(room_id)
        .bind(description)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        report.created.push(task);
    }

    tx.commit().await?;
    Ok(report)
}

/// Create a task directly (the explicit subscriber-facing path).
pub async fn create_task(
    pool: &SqlitePool,
    room_id: Option<i64>,
    description: &str,
    notes: &str,
) -> Result<Task> {
    let now = Utc::now();

    let task = sqlx::query_as::<_, Task>(&format!(
        r#"
        INSERT INTO tasks (room_id, description, status, notes, created_at, updated_at)
        VALUES (?, ?, 'pending', ?, ?, ?)
        RETURNING {}
        "#,
        TASK_COLUMNS
    ))
    .bind(room_id)
    .bind(description)
    .bind(notes)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(task)
}

/// Get a task by id.
pub async fn get_task(pool: &SqlitePool, id: i64) -> Result<Task> {
    sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Task",
            id: id.to_string(),
        })
}

/// Set a task's status (the explicit subscriber-facing path).
pub async fn set_status(pool: &SqlitePool, id: i64, status: TaskStatus) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE tasks
        SET status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(status)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Task",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Pending tasks for one room, newest first.
pub async fn pending_for_room(pool: &SqlitePool, room_id: i64, limit: usize) -> Result<Vec<Task>> {
    let tasks = sqlx::query_as::<_, Task>(&format!(
        r#"
        SELECT {}
        FROM tasks
        WHERE room_id = ? AND status = 'pending'
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
        TASK_COLUMNS
    ))
    .bind(room_id)
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    Ok(tasks)
}

/// Pending tasks across all of a subscriber's rooms, newest first,
/// tagged with each task's room alias.
pub async fn pending_for_subscriber(
    pool: &SqlitePool,
    subscriber_id: i64,
    limit: usize,
) -> Result<Vec<TaggedTask>> {
    let tasks = sqlx::query_as::<_, TaggedTask>(
        r#"
        SELECT t.id, t.room_id, t.description, t.status, t.notes, t.created_at,
               r.alias AS alias
        FROM tasks t
        JOIN watched_rooms r ON r.id = t.room_id
        WHERE r.subscriber_id = ? AND t.status = 'pending'
        ORDER BY t.created_at DESC, t.id DESC
        LIMIT ?
        "#,
    )
    .bind(subscriber_id)
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    Ok(tasks)
}
