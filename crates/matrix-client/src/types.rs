//! Wire and domain types for the Matrix client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached login session.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    /// Access token used as a bearer token on every call.
    pub access_token: String,
    /// Fully-qualified user id of the logged-in account.
    pub user_id: String,
    /// Device id assigned by the homeserver.
    pub device_id: Option<String>,
}

/// Login request payload (m.login.password).
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    #[serde(rename = "type")]
    pub login_type: &'static str,
    pub identifier: LoginIdentifier<'a>,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginIdentifier<'a> {
    #[serde(rename = "type")]
    pub id_type: &'static str,
    pub user: &'a str,
}

impl<'a> LoginRequest<'a> {
    pub fn password(user: &'a str, password: &'a str) -> Self {
        Self {
            login_type: "m.login.password",
            identifier: LoginIdentifier {
                id_type: "m.id.user",
                user,
            },
            password,
        }
    }
}

/// A single room message, normalized from the raw event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Fully-qualified sender user id.
    pub sender: String,
    /// Plain-text body.
    pub body: String,
    /// Server timestamp of the event.
    pub timestamp: DateTime<Utc>,
    /// Event id.
    pub event_id: String,
}

/// Raw event as returned by the `/messages` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub origin_server_ts: i64,
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub content: EventContent,
}

/// Content of a room event. Only message fields are modeled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventContent {
    #[serde(default)]
    pub msgtype: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// One page of the `/messages` endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    #[serde(default)]
    pub chunk: Vec<RawEvent>,
    /// Continuation token for the next (older) page; absent at history end.
    pub end: Option<String>,
}

/// Message send payload.
#[derive(Debug, Serialize)]
pub(crate) struct SendRequest<'a> {
    pub msgtype: &'static str,
    pub body: &'a str,
}

/// Delivery receipt returned by a message send.
#[derive(Debug, Clone, Deserialize)]
pub struct SendReceipt {
    pub event_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DisplayNameResponse {
    #[serde(default)]
    pub displayname: Option<String>,
}

/// A room as listed by the Synapse admin API.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomInfo {
    pub room_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub joined_members: i64,
    #[serde(default)]
    pub creation_ts: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AdminRoomsResponse {
    #[serde(default)]
    pub rooms: Vec<RoomInfo>,
    pub next_batch: Option<serde_json::Value>,
}

/// Error body returned by the homeserver.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub errcode: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
