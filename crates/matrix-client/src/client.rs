//! Matrix homeserver HTTP client.

use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::HomeserverConfig;
use crate::error::MatrixError;
use crate::types::{
    AdminRoomsResponse, ApiErrorBody, DisplayNameResponse, LoginRequest, Message,
    MessagesResponse, RawEvent, RoomInfo, SendReceipt, SendRequest, Session,
};

/// Page size used when draining the `/messages` endpoint.
const MESSAGES_PAGE_SIZE: usize = 100;

/// How many recent events to scan when asking for the latest message.
const LAST_MESSAGE_WINDOW: usize = 10;

/// Client for a Matrix homeserver.
///
/// The login session is cached in memory after [`MatrixClient::login`];
/// there is no automatic token refresh. Any authenticated call made
/// before login fails with [`MatrixError::NotLoggedIn`].
pub struct MatrixClient {
    http: Client,
    config: HomeserverConfig,
    session: RwLock<Option<Session>>,
}

impl MatrixClient {
    /// Create a new client. Does not touch the network.
    pub fn new(config: HomeserverConfig) -> Result<Self, MatrixError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(MatrixError::Http)?;

        Ok(Self {
            http,
            config,
            session: RwLock::new(None),
        })
    }

    /// Log in with the configured credentials and cache the session.
    pub async fn login(&self) -> Result<Session, MatrixError> {
        let payload = LoginRequest::password(&self.config.username, &self.config.password);

        let response = self
            .http
            .post(self.config.login_url())
            .json(&payload)
            .send()
            .await
            .map_err(MatrixError::Http)?;

        let session: Session = Self::check(response).await?.json().await.map_err(MatrixError::Http)?;

        info!("Logged in to {} as {}", self.config.base_url, session.user_id);
        *self.write_lock() = Some(session.clone());

        Ok(session)
    }

    /// Get the cached session, if logged in.
    pub fn session(&self) -> Option<Session> {
        self.read_lock().clone()
    }

    /// Get the logged-in user id.
    pub fn user_id(&self) -> Result<String, MatrixError> {
        self.read_lock()
            .as_ref()
            .map(|s| s.user_id.clone())
            .ok_or(MatrixError::NotLoggedIn)
    }

    /// Get the configuration.
    pub fn config(&self) -> &HomeserverConfig {
        &self.config
    }

    /// Fetch messages from a room, oldest first.
    ///
    /// The endpoint pages backward from the most recent event; pages are
    /// drained until the room history ends, `limit` message events have
    /// been collected, or every remaining event is not newer than
    /// `since`. The `since` cutoff itself is applied client-side after
    /// draining: no returned message has `timestamp <= since`.
    pub async fn fetch_messages(
        &self,
        room_id: &str,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<Message>, MatrixError> {
        let token = self.access_token()?;
        let since_millis = since.map(|t| t.timestamp_millis());

        let mut events: Vec<RawEvent> = Vec::new();
        let mut from: Option<String> = None;
        let page_size = MESSAGES_PAGE_SIZE.to_string();

        loop {
            let mut request = self
                .http
                .get(self.config.messages_url(room_id))
                .bearer_auth(&token)
                .query(&[("dir", "b"), ("limit", page_size.as_str())]);
            if let Some(ref page_token) = from {
                request = request.query(&[("from", page_token.as_str())]);
            }

            let response = request.send().await.map_err(MatrixError::Http)?;
            let page: MessagesResponse =
                Self::check(response).await?.json().await.map_err(MatrixError::Http)?;

            if page.chunk.is_empty() {
                break;
            }

            // Pages run newest to oldest; once a page bottoms out past the
            // cutoff there is nothing newer left behind it.
            let page_oldest = page.chunk.iter().map(|e| e.origin_server_ts).min();
            events.extend(page.chunk);

            let collected = events
                .iter()
                .filter(|e| e.event_type == "m.room.message")
                .count();
            if collected >= limit {
                break;
            }
            if let (Some(oldest), Some(cutoff)) = (page_oldest, since_millis) {
                if oldest <= cutoff {
                    break;
                }
            }

            match page.end {
                Some(next) => from = Some(next),
                None => break,
            }
        }

        debug!(room_id, events = events.len(), "drained message pages");
        Ok(collect_messages(events, since, limit))
    }

    /// Get the most recent message in a room, if any.
    pub async fn last_message(&self, room_id: &str) -> Result<Option<Message>, MatrixError> {
        let mut messages = self
            .fetch_messages(room_id, None, LAST_MESSAGE_WINDOW)
            .await?;
        Ok(messages.pop())
    }

    /// Send a plain-text message to a room.
    pub async fn send_message(
        &self,
        room_id: &str,
        body: &str,
    ) -> Result<SendReceipt, MatrixError> {
        let token = self.access_token()?;
        let txn_id = Uuid::new_v4().to_string();

        let response = self
            .http
            .put(self.config.send_url(room_id, &txn_id))
            .bearer_auth(&token)
            .json(&SendRequest {
                msgtype: "m.text",
                body,
            })
            .send()
            .await
            .map_err(MatrixError::Http)?;

        let receipt: SendReceipt =
            Self::check(response).await?.json().await.map_err(MatrixError::Http)?;
        debug!(room_id, event_id = %receipt.event_id, "sent message");

        Ok(receipt)
    }

    /// Look up a user's display name. Best-effort: an unknown user or a
    /// profile without a display name resolves to `None`.
    pub async fn display_name(&self, user_id: &str) -> Result<Option<String>, MatrixError> {
        let token = self.access_token()?;

        let response = self
            .http
            .get(self.config.displayname_url(user_id))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(MatrixError::Http)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body: DisplayNameResponse =
            Self::check(response).await?.json().await.map_err(MatrixError::Http)?;
        Ok(body.displayname.filter(|name| !name.trim().is_empty()))
    }

    /// List rooms from the Synapse admin API, filtered to those created
    /// by `creator`. Pages are drained via the `next_batch` token.
    pub async fn admin_rooms(&self, creator: &str) -> Result<Vec<RoomInfo>, MatrixError> {
        let token = self.access_token()?;
        let mut rooms = Vec::new();
        let mut next_batch: Option<String> = None;
        let page_size = MESSAGES_PAGE_SIZE.to_string();

        loop {
            let mut request = self
                .http
                .get(self.config.admin_rooms_url())
                .bearer_auth(&token)
                .query(&[("limit", page_size.as_str())]);
            if let Some(ref from) = next_batch {
                request = request.query(&[("from", from.as_str())]);
            }

            let response = request.send().await.map_err(MatrixError::Http)?;
            let page: AdminRoomsResponse =
                Self::check(response).await?.json().await.map_err(MatrixError::Http)?;

            rooms.extend(
                page.rooms
                    .into_iter()
                    .filter(|room| room.creator.as_deref() == Some(creator)),
            );

            match page.next_batch {
                Some(batch) if !batch.is_null() => {
                    // Synapse returns the offset as a number.
                    next_batch = Some(batch.to_string().trim_matches('"').to_string());
                }
                _ => break,
            }
        }

        Ok(rooms)
    }

    fn access_token(&self) -> Result<String, MatrixError> {
        self.read_lock()
            .as_ref()
            .map(|s| s.access_token.clone())
            .ok_or(MatrixError::NotLoggedIn)
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        self.session.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.session.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Turn a non-2xx response into a [`MatrixError::Api`].
    async fn check(response: Response) -> Result<Response, MatrixError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorBody>(&text) {
            Ok(body) => {
                let errcode = body.errcode.unwrap_or_default();
                let error = body.error.unwrap_or_default();
                format!("{} {}", errcode, error).trim().to_string()
            }
            Err(_) => text,
        };

        Err(MatrixError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl std::fmt::Debug for MatrixClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixClient")
            .field("base_url", &self.config.base_url)
            .field("logged_in", &self.read_lock().is_some())
            .finish()
    }
}

/// Normalize drained raw events into chronological messages.
///
/// Keeps only `m.room.message` events, drops everything with
/// `timestamp <= since`, sorts ascending by timestamp, and keeps the
/// newest `limit` messages when more were collected.
fn collect_messages(
    events: Vec<RawEvent>,
    since: Option<DateTime<Utc>>,
    limit: usize,
) -> Vec<Message> {
    let since_millis = since.map(|t| t.timestamp_millis());

    let mut messages: Vec<Message> = events
        .into_iter()
        .filter(|event| event.event_type == "m.room.message")
        .filter(|event| match since_millis {
            Some(cutoff) => event.origin_server_ts > cutoff,
            None => true,
        })
        .filter_map(|event| {
            let timestamp = DateTime::<Utc>::from_timestamp_millis(event.origin_server_ts)?;
            Some(Message {
                sender: event.sender,
                body: event.content.body.unwrap_or_default(),
                timestamp,
                event_id: event.event_id,
            })
        })
        .collect();

    messages.sort_by_key(|m| m.timestamp);

    if messages.len() > limit {
        let excess = messages.len() - limit;
        messages.drain(..excess);
    }

    messages
}
