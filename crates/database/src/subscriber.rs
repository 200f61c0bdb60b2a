//! Subscriber CRUD operations.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{NewSubscriber, Subscriber};

const SUBSCRIBER_COLUMNS: &str = "id, full_name, email, phone_number, control_room_id, \
                                  is_active, created_at, updated_at";

/// Create a new subscriber.
pub async fn create_subscriber(pool: &SqlitePool, new: &NewSubscriber) -> Result<Subscriber> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO subscribers (full_name, email, phone_number, control_room_id, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(&new.full_name)
    .bind(&new.email)
    .bind(&new.phone_number)
    .bind(&new.control_room_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    get_subscriber(pool, result.last_insert_rowid()).await
}

/// Get a subscriber by id.
pub async fn get_subscriber(pool: &SqlitePool, id: i64) -> Result<Subscriber> {
    sqlx::query_as::<_, Subscriber>(&format!(
        "SELECT {} FROM subscribers WHERE id = ?",
        SUBSCRIBER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Subscriber",
        id: id.to_string(),
    })
}

/// List active subscribers that have a control room configured.
///
/// These are the subscribers the worker serves each cycle.
pub async fn list_active_with_control_room(pool: &SqlitePool) -> Result<Vec<Subscriber>> {
    let subscribers = sqlx::query_as::<_, Subscriber>(&format!(
        r#"
        SELECT {}
        FROM subscribers
        WHERE is_active = 1
          AND control_room_id IS NOT NULL
          AND control_room_id != ''
        ORDER BY id
        "#,
        SUBSCRIBER_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(subscribers)
}

/// Activate or deactivate a subscriber. Deactivation stops processing.
pub async fn set_active(pool: &SqlitePool, id: i64, active: bool) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE subscribers
        SET is_active = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(active)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Subscriber",
            id: id.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use crate::models::NewSubscriber;

    #[tokio::test]
    async fn test_active_listing_requires_control_room() {
        let db = testing::db().await;

        testing::subscriber(&db, "with-room").await;
        create_subscriber(
            db.pool(),
            &NewSubscriber {
                full_name: Some("no-room".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        create_subscriber(
            db.pool(),
            &NewSubscriber {
                full_name: Some("empty-room".to_string()),
                control_room_id: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let active = list_active_with_control_room(db.pool()).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].full_name.as_deref(), Some("with-room"));
    }

    #[tokio::test]
    async fn test_deactivation_removes_from_listing() {
        let db = testing::db().await;
        let subscriber = testing::subscriber(&db, "carol").await;

        set_active(db.pool(), subscriber.id, false).await.unwrap();

        let active = list_active_with_control_room(db.pool()).await.unwrap();
        assert!(active.is_empty());
    }

    #[tokio::test]
    async fn test_set_active_unknown_subscriber() {
        let db = testing::db().await;
        let result = set_active(db.pool(), 999, false).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }
}
