//! Per-room daily summarization counters.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::error::Result;

/// Increment the counter for (room, date) and return the new count.
///
/// A single upsert statement, so the increment is atomic in the
/// database even if cycles ever run in parallel.
pub async fn increment(pool: &SqlitePool, room_id: i64, date: NaiveDate) -> Result<i64> {
    let now = Utc::now();

    let count = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO daily_summary_counts (room_id, date, count, created_at, updated_at)
        VALUES (?, ?, 1, ?, ?)
        ON CONFLICT(room_id, date) DO UPDATE SET
            count = count + 1,
            updated_at = excluded.updated_at
        RETURNING count
        "#,
    )
    .bind(room_id)
    .bind(date)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Current count for (room, date); zero when no run happened yet.
pub async fn get(pool: &SqlitePool, room_id: i64, date: NaiveDate) -> Result<i64> {
    let count = sqlx::query_scalar::<_, Option<i64>>(
        r#"
        SELECT count FROM daily_summary_counts
        WHERE room_id = ? AND date = ?
        "#,
    )
    .bind(room_id)
    .bind(date)
    .fetch_optional(pool)
    .await?
    .flatten();

    Ok(count.unwrap_or(0))
}
