//! Matrix client-server API client library.
//!
//! This crate provides a Rust client for talking to a Matrix homeserver
//! over HTTP. It supports:
//!
//! - Password login with an in-memory cached session
//! - Fetching room messages (paginated, time-bounded, chronological)
//! - Sending plain-text messages
//! - Best-effort display-name lookup
//! - Listing rooms via the Synapse admin API
//!
//! # Example
//!
//! ```no_run
//! use matrix_client::{HomeserverConfig, MatrixClient};
//!
//! # async fn example() -> Result<(), matrix_client::MatrixError> {
//! let config = HomeserverConfig::new("https://matrix.example.org", "bot", "secret");
//! let client = MatrixClient::new(config)?;
//!
//! let session = client.login().await?;
//! println!("Logged in as {}", session.user_id);
//!
//! let receipt = client.send_message("!room:example.org", "Hello!").await?;
//! println!("Sent event {}", receipt.event_id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::MatrixClient;
pub use config::HomeserverConfig;
pub use error::MatrixError;
pub use types::{Message, RoomInfo, SendReceipt, Session};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
