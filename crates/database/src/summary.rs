//! Summary record persistence.
//!
//! Summaries are append-only: a row is created per completed processing
//! run and only its delivery outcome is ever updated, exactly once.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{NewSummary, Summary};

const SUMMARY_COLUMNS: &str = "id, room_id, summary, reply, needs_more_information, \
                               new_task_descriptions, message_count, from_timestamp, \
                               to_timestamp, sent_at, send_failed_at, send_error, created_at";

/// Create a summary record for a completed run, delivery pending.
pub async fn create_summary(
    pool: &SqlitePool,
    room_id: i64,
    new: NewSummary,
) -> Result<Summary> {
    let result = sqlx::query(
        r#"
        INSERT INTO summaries (room_id, summary, reply, needs_more_information,
                               new_task_descriptions, message_count, from_timestamp,
                               to_timestamp, send_error, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, '', ?)
        "#,
    )
    .bind(room_id)
    .bind(&new.summary)
    .bind(&new.reply)
    .bind(new.needs_more_information)
    .bind(Json(&new.new_task_descriptions))
    .bind(new.message_count)
    .bind(new.from_timestamp)
    .bind(new.to_timestamp)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    get_summary(pool, result.last_insert_rowid()).await
}

/// Get a summary by id.
pub async fn get_summary(pool: &SqlitePool, id: i64) -> Result<Summary> {
    sqlx::query_as::<_, Summary>(&format!(
        "SELECT {} FROM summaries WHERE id = ?",
        SUMMARY_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Summary",
        id: id.to_string(),
    })
}

/// Most recent summary created for a room, delivered or not.
///
/// This is the prior-run context carried into the next summarization.
pub async fn latest_for_room(pool: &SqlitePool, room_id: i64) -> Result<Option<Summary>> {
    let summary = sqlx::query_as::<_, Summary>(&format!(
        r#"
        SELECT {}
        FROM summaries
        WHERE room_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
        SUMMARY_COLUMNS
    ))
    .bind(room_id)
    .fetch_optional(pool)
    .await?;

    Ok(summary)
}

/// Most recently *delivered* summary across all of a subscriber's
/// rooms. The cooldown gate reads this, not the most recently created
/// one.
pub async fn latest_delivered_for_subscriber(
    pool: &SqlitePool,
    subscriber_id: i64,
) -> Result<Option<Summary>> {
    let summary = sqlx::query_as::<_, Summary>(
        r#"
        SELECT s.id, s.room_id, s.summary, s.reply, s.needs_more_information,
               s.new_task_descriptions, s.message_count, s.from_timestamp,
               s.to_timestamp, s.sent_at, s.send_failed_at, s.send_error, s.created_at
        FROM summaries s
        JOIN watched_rooms r ON r.id = s.room_id
        WHERE r.subscriber_id = ? AND s.sent_at IS NOT NULL
        ORDER BY s.sent_at DESC, s.id DESC
        LIMIT 1
        "#,
    )
    .bind(subscriber_id)
    .fetch_optional(pool)
    .await?;

    Ok(summary)
}

/// Count summaries for a room, for tests and admin listings.
pub async fn count_for_room(pool: &SqlitePool, room_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM summaries WHERE room_id = ?
        "#,
    )
    .bind(room_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Record successful delivery. Returns false when the outcome was
/// already recorded (either way); the row is never rewritten.
pub async fn mark_sent(pool: &SqlitePool, id: i64, sent_at: DateTime<Utc>) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE summaries
        SET sent_at = ?
        WHERE id = ? AND sent_at IS NULL AND send_failed_at IS NULL
        "#,
    )
    .bind(sent_at)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Record failed delivery. Returns false when the outcome was already
/// recorded.
pub async fn mark_send_failed(
    pool: &SqlitePool,
    id: i64,
    failed_at: DateTime<Utc>,
    error: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE summaries
        SET send_failed_at = ?, send_error = ?
        WHERE id = ? AND sent_at IS NULL AND send_failed_at IS NULL
        "#,
    )
    .bind(failed_at)
    .bind(error)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn new_summary(text: &str) -> NewSummary {
        NewSummary {
            summary: text.to_string(),
            reply: None,
            needs_more_information: false,
            new_task_descriptions: vec!["follow up".to_string()],
            message_count: 3,
            from_timestamp: None,
            to_timestamp: None,
        }
    }

    #[tokio::test]
    async fn test_delivery_outcome_recorded_exactly_once() {
        let db = testing::db().await;
        let subscriber = testing::subscriber(&db, "alice").await;
        let room = testing::watched_room(&db, subscriber.id, "!a:example.org").await;

        let summary = create_summary(db.pool(), room.id, new_summary("first"))
            .await
            .unwrap();
        assert!(summary.sent_at.is_none());
        assert!(summary.send_failed_at.is_none());

        let now = Utc::now();
        assert!(mark_sent(db.pool(), summary.id, now).await.unwrap());
        // Second attempt of either outcome is refused.
        assert!(!mark_sent(db.pool(), summary.id, now).await.unwrap());
        assert!(!mark_send_failed(db.pool(), summary.id, now, "late")
            .await
            .unwrap());

        let stored = get_summary(db.pool(), summary.id).await.unwrap();
        assert_eq!(stored.sent_at, Some(now));
        assert!(stored.send_failed_at.is_none());
        assert_eq!(stored.new_task_descriptions.0, vec!["follow up".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_delivery_blocks_sent() {
        let db = testing::db().await;
        let subscriber = testing::subscriber(&db, "bob").await;
        let room = testing::watched_room(&db, subscriber.id, "!b:example.org").await;
        let summary = create_summary(db.pool(), room.id, new_summary("first"))
            .await
            .unwrap();

        let now = Utc::now();
        assert!(mark_send_failed(db.pool(), summary.id, now, "network down")
            .await
            .unwrap());
        assert!(!mark_sent(db.pool(), summary.id, now).await.unwrap());

        let stored = get_summary(db.pool(), summary.id).await.unwrap();
        assert!(stored.sent_at.is_none());
        assert_eq!(stored.send_error, "network down");
    }

    #[tokio::test]
    async fn test_latest_delivered_spans_subscriber_rooms() {
        let db = testing::db().await;
        let subscriber = testing::subscriber(&db, "carol").await;
        let room_a = testing::watched_room(&db, subscriber.id, "!a:example.org").await;
        let room_b = testing::watched_room(&db, subscriber.id, "!b:example.org").await;

        let older = Utc::now() - chrono::Duration::minutes(30);
        let newer = Utc::now() - chrono::Duration::minutes(5);

        let first = create_summary(db.pool(), room_a.id, new_summary("room a"))
            .await
            .unwrap();
        mark_sent(db.pool(), first.id, older).await.unwrap();

        let second = create_summary(db.pool(), room_b.id, new_summary("room b"))
            .await
            .unwrap();
        mark_sent(db.pool(), second.id, newer).await.unwrap();

        // A newer but undelivered summary must not win.
        create_summary(db.pool(), room_a.id, new_summary("pending"))
            .await
            .unwrap();

        let latest = latest_delivered_for_subscriber(db.pool(), subscriber.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.sent_at, Some(newer));
    }

    #[tokio::test]
    async fn test_latest_delivered_ignores_other_subscribers() {
        let db = testing::db().await;
        let alice = testing::subscriber(&db, "alice").await;
        let bob = testing::subscriber(&db, "bob").await;
        let bob_room = testing::watched_room(&db, bob.id, "!bob:example.org").await;

        let summary = create_summary(db.pool(), bob_room.id, new_summary("bob's"))
            .await
            .unwrap();
        mark_sent(db.pool(), summary.id, Utc::now()).await.unwrap();

        let latest = latest_delivered_for_subscriber(db.pool(), alice.id)
            .await
            .unwrap();
        assert!(latest.is_none());
    }
}
