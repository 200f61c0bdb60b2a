//! Configuration types for the Matrix client.

use std::env;

use crate::error::MatrixError;

/// Configuration for connecting to a Matrix homeserver.
#[derive(Debug, Clone)]
pub struct HomeserverConfig {
    /// Base URL of the homeserver (e.g., "https://matrix.example.org").
    pub base_url: String,
    /// Username of the bot account.
    pub username: String,
    /// Password of the bot account.
    pub password: String,
}

impl HomeserverConfig {
    /// Create a new configuration.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `MATRIX_HOMESERVER` - homeserver base URL
    /// - `MATRIX_USERNAME` - bot account username
    /// - `MATRIX_PASSWORD` - bot account password
    pub fn from_env() -> Result<Self, MatrixError> {
        let base_url = env::var("MATRIX_HOMESERVER")
            .map_err(|_| MatrixError::Config("MATRIX_HOMESERVER not set".to_string()))?;
        let username = env::var("MATRIX_USERNAME")
            .map_err(|_| MatrixError::Config("MATRIX_USERNAME not set".to_string()))?;
        let password = env::var("MATRIX_PASSWORD")
            .map_err(|_| MatrixError::Config("MATRIX_PASSWORD not set".to_string()))?;

        Ok(Self {
            base_url,
            username,
            password,
        })
    }

    /// Get the login endpoint URL.
    pub fn login_url(&self) -> String {
        format!("{}/_matrix/client/v3/login", self.base_url)
    }

    /// Get the messages endpoint URL for a room.
    pub fn messages_url(&self, room_id: &str) -> String {
        format!(
            "{}/_matrix/client/v3/rooms/{}/messages",
            self.base_url,
            urlencoding::encode(room_id)
        )
    }

    /// Get the send endpoint URL for a room and transaction id.
    pub fn send_url(&self, room_id: &str, txn_id: &str) -> String {
        format!(
            "{}/_matrix/client/v3/rooms/{}/send/m.room.message/{}",
            self.base_url,
            urlencoding::encode(room_id),
            txn_id
        )
    }

    /// Get the display-name endpoint URL for a user.
    pub fn displayname_url(&self, user_id: &str) -> String {
        format!(
            "{}/_matrix/client/v3/profile/{}/displayname",
            self.base_url,
            urlencoding::encode(user_id)
        )
    }

    /// Get the Synapse admin rooms listing URL.
    pub fn admin_rooms_url(&self) -> String {
        format!("{}/_synapse/admin/v1/rooms", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_helpers_encode_room_id() {
        let config = HomeserverConfig::new("https://hs.example", "bot", "pw");

        assert_eq!(config.login_url(), "https://hs.example/_matrix/client/v3/login");
        assert_eq!(
            config.messages_url("!abc:example.org"),
            "https://hs.example/_matrix/client/v3/rooms/%21abc%3Aexample.org/messages"
        );
        assert_eq!(
            config.send_url("!abc:example.org", "txn-1"),
            "https://hs.example/_matrix/client/v3/rooms/%21abc%3Aexample.org/send/m.room.message/txn-1"
        );
        assert_eq!(
            config.displayname_url("@alice:example.org"),
            "https://hs.example/_matrix/client/v3/profile/%40alice%3Aexample.org/displayname"
        );
    }
}
