//! SQLite persistence layer for Lookout.
//!
//! This crate provides async database operations for subscribers,
//! watched rooms, processing state, summaries, tasks, and daily counts
//! using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{room, subscriber, Database, NewSubscriber};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:lookout.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Register a subscriber and a watched room
//!     let sub = subscriber::create_subscriber(
//!         db.pool(),
//!         &NewSubscriber {
//!             full_name: Some("Alice".to_string()),
//!             email: None,
//!             phone_number: None,
//!             control_room_id: Some("!control:example.org".to_string()),
//!         },
//!     )
//!     .await?;
//!     let watched =
//!         room::create_room(db.pool(), sub.id, "!family:example.org", Some("Family")).await?;
//!     println!("watching {} as '{}'", watched.room_id, watched.alias);
//!
//!     Ok(())
//! }
//! ```

pub mod daily_count;
pub mod error;
pub mod models;
pub mod processing_state;
pub mod room;
pub mod subscriber;
pub mod summary;
pub mod task;

pub use error::{DatabaseError, Result};
pub use models::{
    NewSubscriber, NewSummary, ProcessingState, ProcessingStatus, Subscriber, Summary, TaggedTask,
    Task, TaskStatus, WatchedRoom,
};
pub use task::{ReconcileReport, TaskChange};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    ///
    /// Tests against `sqlite::memory:` should use a pool size of 1 so
    /// every query sees the same in-memory database.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::models::{NewSubscriber, Subscriber, WatchedRoom};

    /// Fresh in-memory database with the schema applied.
    pub async fn db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }

    /// A subscriber with a control room, for fixtures.
    pub async fn subscriber(db: &Database, name: &str) -> Subscriber {
        crate::subscriber::create_subscriber(
            db.pool(),
            &NewSubscriber {
                full_name: Some(name.to_string()),
                email: None,
                phone_number: None,
                control_room_id: Some(format!("!control-{}:example.org", name)),
            },
        )
        .await
        .unwrap()
    }

    /// A watched room for the given subscriber.
    pub async fn watched_room(db: &Database, subscriber_id: i64, remote: &str) -> WatchedRoom {
        crate::room::create_room(db.pool(), subscriber_id, remote, None)
            .await
            .unwrap()
    }
}
