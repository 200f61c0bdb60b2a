//! Gateway abstraction over the chat platform.
//!
//! The worker talks to the platform through this trait so tests can
//! substitute an in-memory implementation. [`MatrixClient`] is the
//! production gateway.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use matrix_client::MatrixClient;
use summarizer_core::DisplayNameResolver;
use tracing::debug;

pub use matrix_client::{MatrixError, Message};

/// Chat platform operations the worker needs.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Most recent message in a room, if any.
    async fn last_message(&self, room_id: &str) -> Result<Option<Message>, MatrixError>;

    /// Messages newer than `since`, oldest first, at most `limit`.
    async fn fetch_messages(
        &self,
        room_id: &str,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<Message>, MatrixError>;

    /// Send a plain-text message; returns the delivery receipt event id.
    async fn send_message(&self, room_id: &str, body: &str) -> Result<String, MatrixError>;

    /// Best-effort display name lookup.
    async fn display_name(&self, user_id: &str) -> Result<Option<String>, MatrixError>;
}

#[async_trait]
impl Gateway for MatrixClient {
    async fn last_message(&self, room_id: &str) -> Result<Option<Message>, MatrixError> {
        MatrixClient::last_message(self, room_id).await
    }

    async fn fetch_messages(
        &self,
        room_id: &str,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<Message>, MatrixError> {
        MatrixClient::fetch_messages(self, room_id, since, limit).await
    }

    async fn send_message(&self, room_id: &str, body: &str) -> Result<String, MatrixError> {
        let receipt = MatrixClient::send_message(self, room_id, body).await?;
        Ok(receipt.event_id)
    }

    async fn display_name(&self, user_id: &str) -> Result<Option<String>, MatrixError> {
        MatrixClient::display_name(self, user_id).await
    }
}

/// Adapts a [`Gateway`] into the context builder's resolver. Lookup
/// failures degrade to `None`; the context builder then falls back to
/// the raw identifier.
pub struct GatewayResolver<'a, G: Gateway + ?Sized> {
    gateway: &'a G,
}

impl<'a, G: Gateway + ?Sized> GatewayResolver<'a, G> {
    /// Wrap a gateway reference.
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl<G: Gateway + ?Sized> DisplayNameResolver for GatewayResolver<'_, G> {
    async fn resolve(&self, user_id: &str) -> Option<String> {
        match self.gateway.display_name(user_id).await {
            Ok(name) => name,
            Err(e) => {
                debug!("display name lookup failed for {}: {}", user_id, e);
                None
            }
        }
    }
}
