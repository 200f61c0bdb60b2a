//! Per-room processing state transitions.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{ProcessingState, ProcessingStatus};

const STATE_COLUMNS: &str = "id, room_id, status, staged_context, last_message_synced_at, \
                             last_summarized_at, processing_started_at, failure_reason, updated_at";

/// Get the processing state for a room, creating an idle one if absent.
///
/// There is at most one state row per room (unique constraint); a
/// concurrent insert loses the race and the existing row is returned.
pub async fn get_or_create(pool: &SqlitePool, room_id: i64) -> Result<ProcessingState> {
    sqlx::query(
        r#"
        INSERT INTO processing_states (room_id, status, failure_reason, updated_at)
        VALUES (?, 'idle', '', ?)
        ON CONFLICT(room_id) DO NOTHING
        "#,
    )
    .bind(room_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    get_for_room(pool, room_id).await
}

/// Get the processing state for a room.
pub async fn get_for_room(pool: &SqlitePool, room_id: i64) -> Result<ProcessingState> {
    sqlx::query_as::<_, ProcessingState>(&format!(
        "SELECT {} FROM processing_states WHERE room_id = ?",
        STATE_COLUMNS
    ))
    .bind(room_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "ProcessingState",
        id: room_id.to_string(),
    })
}

/// Enter the processing phase, staging the serialized context payload.
pub async fn mark_processing(
    pool: &SqlitePool,
    state_id: i64,
    staged_context: &str,
    started_at: DateTime<Utc>,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE processing_states
        SET status = ?, staged_context = ?, processing_started_at = ?, failure_reason = '', updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(ProcessingStatus::Processing)
    .bind(staged_context)
    .bind(started_at)
    .bind(Utc::now())
    .bind(state_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "ProcessingState",
            id: state_id.to_string(),
        });
    }

    Ok(())
}

/// Finish a run successfully: back to idle, staged context cleared,
/// watermarks advanced. The synced timestamp never moves backward.
pub async fn complete(
    pool: &SqlitePool,
    state_id: i64,
    synced_at: DateTime<Utc>,
    summarized_at: DateTime<Utc>,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE processing_states
        SET status = ?,
            staged_context = NULL,
            processing_started_at = NULL,
            failure_reason = '',
            last_message_synced_at = CASE
                WHEN last_message_synced_at IS NULL OR ? > last_message_synced_at THEN ?
                ELSE last_message_synced_at
            END,
            last_summarized_at = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(ProcessingStatus::Idle)
    .bind(synced_at)
    .bind(synced_at)
    .bind(summarized_at)
    .bind(Utc::now())
    .bind(state_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "ProcessingState",
            id: state_id.to_string(),
        });
    }

    Ok(())
}

/// Record a failed run. The staged context is kept for inspection and
/// the next cycle retries from the unchanged watermark.
pub async fn mark_failed(pool: &SqlitePool, state_id: i64, reason: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE processing_states
        SET status = ?, failure_reason = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(ProcessingStatus::Failed)
    .bind(reason)
    .bind(Utc::now())
    .bind(state_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "ProcessingState",
            id: state_id.to_string(),
        });
    }

    Ok(())
}
