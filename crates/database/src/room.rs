//! Watched room operations and alias generation.

use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DatabaseError, Result};
use crate::models::WatchedRoom;

/// Alphanumeric alphabet without visually ambiguous characters
/// (0/O, 1/l/I).
const ALIAS_ALPHABET: &[u8] = b"23456789abcdefghjkmnpqrstuvwxyz";

/// Length of a generated alias.
const ALIAS_LENGTH: usize = 4;

/// Generation attempts before falling back to an extended alias.
const ALIAS_MAX_ATTEMPTS: usize = 10;

const ROOM_COLUMNS: &str = "id, subscriber_id, room_id, alias, display_name, last_read_at, \
                            is_active, created_at, updated_at";

/// Create a watched room with a freshly generated alias.
pub async fn create_room(
    pool: &SqlitePool,
    subscriber_id: i64,
    remote_room_id: &str,
    display_name: Option<&str>,
) -> Result<WatchedRoom> {
    let alias = generate_alias(pool, subscriber_id).await?;
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO watched_rooms (subscriber_id, room_id, alias, display_name, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(subscriber_id)
    .bind(remote_room_id)
    .bind(&alias)
    .bind(display_name)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "WatchedRoom",
                    id: remote_room_id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    get_room(pool, result.last_insert_rowid()).await
}

/// Get a watched room by id.
pub async fn get_room(pool: &SqlitePool, id: i64) -> Result<WatchedRoom> {
    sqlx::query_as::<_, WatchedRoom>(&format!(
        "SELECT {} FROM watched_rooms WHERE id = ?",
        ROOM_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "WatchedRoom",
        id: id.to_string(),
    })
}

/// List a subscriber's active watched rooms, oldest first.
pub async fn list_active_for_subscriber(
    pool: &SqlitePool,
    subscriber_id: i64,
) -> Result<Vec<WatchedRoom>> {
    let rooms = sqlx::query_as::<_, WatchedRoom>(&format!(
        r#"
        SELECT {}
        FROM watched_rooms
        WHERE subscriber_id = ? AND is_active = 1
        ORDER BY id
        "#,
        ROOM_COLUMNS
    ))
    .bind(subscriber_id)
    .fetch_all(pool)
    .await?;

    Ok(rooms)
}

/// Find a subscriber's active room by alias, case-insensitive.
///
/// Scoped to the subscriber's own rooms only; another subscriber's
/// identical alias never resolves here.
pub async fn find_by_alias(
    pool: &SqlitePool,
    subscriber_id: i64,
    alias: &str,
) -> Result<Option<WatchedRoom>> {
    let room = sqlx::query_as::<_, WatchedRoom>(&format!(
        r#"
        SELECT {}
        FROM watched_rooms
        WHERE subscriber_id = ? AND is_active = 1 AND LOWER(alias) = LOWER(?)
        "#,
        ROOM_COLUMNS
    ))
    .bind(subscriber_id)
    .bind(alias)
    .fetch_optional(pool)
    .await?;

    Ok(room)
}

/// Advance a room's read watermark. Never moves backward.
pub async fn advance_last_read(
    pool: &SqlitePool,
    room_id: i64,
    read_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE watched_rooms
        SET last_read_at = CASE
                WHEN last_read_at IS NULL OR ? > last_read_at THEN ?
                ELSE last_read_at
            END,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(read_at)
    .bind(read_at)
    .bind(Utc::now())
    .bind(room_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Upsert a watched room from a platform room listing, refreshing the
/// cached display name. Existing aliases and watermarks are preserved.
pub async fn sync_room(
    pool: &SqlitePool,
    subscriber_id: i64,
    remote_room_id: &str,
    display_name: Option<&str>,
) -> Result<WatchedRoom> {
    let existing = sqlx::query_as::<_, WatchedRoom>(&format!(
        "SELECT {} FROM watched_rooms WHERE subscriber_id = ? AND room_id = ?",
        ROOM_COLUMNS
    ))
    .bind(subscriber_id)
    .bind(remote_room_id)
    .fetch_optional(pool)
    .await?;

    match existing {
        Some(room) => {
            sqlx::query(
                r#"
                UPDATE watched_rooms
                SET display_name = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(display_name)
            .bind(Utc::now())
            .bind(room.id)
            .execute(pool)
            .await?;
            get_room(pool, room.id).await
        }
        None => create_room(pool, subscriber_id, remote_room_id, display_name).await,
    }
}

/// Generate an alias unique among the subscriber's rooms.
///
/// Retries with fresh random codes; after the attempt budget, falls
/// back to the last candidate with one extra random character.
async fn generate_alias(pool: &SqlitePool, subscriber_id: i64) -> Result<String> {
    let mut last = String::new();

    for _ in 0..ALIAS_MAX_ATTEMPTS {
        let candidate = random_alias(ALIAS_LENGTH);
        if !alias_taken(pool, subscriber_id, &candidate).await? {
            return Ok(candidate);
        }
        debug!(subscriber_id, alias = %candidate, "alias collision, retrying");
        last = candidate;
    }

    Ok(format!("{}{}", last, random_alias(1)))
}

fn random_alias(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| ALIAS_ALPHABET[rng.gen_range(0..ALIAS_ALPHABET.len())] as char)
        .collect()
}

async fn alias_taken(pool: &SqlitePool, subscriber_id: i64, alias: &str) -> Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM watched_rooms
        WHERE subscriber_id = ? AND LOWER(alias) = LOWER(?)
        "#,
    )
    .bind(subscriber_id)
    .bind(alias)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}
