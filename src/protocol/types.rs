use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default constants for validation (can be overridden by config)
pub const DEFAULT_MAX_LOBBY_ID_LENGTH: usize = 64;
pub const DEFAULT_MAX_USERNAME_LENGTH: usize = 32;

/// Opaque identifier for a participant.
///
/// For WebSocket clients this is the connection identifier; polling clients
/// receive a fresh one when they join.
pub type UserId = Uuid;

/// Client-supplied lobby name, typically an invite code.
pub type LobbyId = String;

/// A participant in a lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub is_ready: bool,
}

impl User {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            is_ready: false,
        }
    }
}
