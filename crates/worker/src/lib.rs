//! Background worker for Lookout.
//!
//! The worker polls each active subscriber's control room for command
//! messages, dispatches the small command language (`help`, `rooms`,
//! `summary ...`, `todo ...`), and drives summarization: fetch unread
//! messages, build the model context, reconcile proposed task changes,
//! and deliver a formatted reply. Failures are isolated per subscriber
//! and per room; one bad room never blocks its siblings.
//!
//! # Example
//!
//! ```no_run
//! use lookout_database::Database;
//! use matrix_client::{HomeserverConfig, MatrixClient};
//! use openai_summarizer::OpenAiSummarizer;
//! use tokio_util::sync::CancellationToken;
//! use worker::{Worker, WorkerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:lookout.db?mode=rwc").await?;
//! db.migrate().await?;
//!
//! let client = MatrixClient::new(HomeserverConfig::from_env()?)?;
//! let session = client.login().await?;
//!
//! let summarizer = OpenAiSummarizer::from_env()?;
//! let config = WorkerConfig::new(session.user_id);
//!
//! let worker = Worker::new(db, client, summarizer, config);
//! worker.run(CancellationToken::new()).await;
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod config;
pub mod formatting;
pub mod gateway;
pub mod processor;

pub use commands::Command;
pub use config::WorkerConfig;
pub use gateway::{Gateway, GatewayResolver};
pub use processor::{Worker, WorkerError};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
