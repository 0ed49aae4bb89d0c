use serde::{Deserialize, Serialize};

use super::error_codes::ErrorCode;
use super::snapshot::LobbySnapshot;
use super::types::{LobbyId, UserId};

/// Message types sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    /// Join a lobby, creating it if it does not exist yet
    JoinLobby { lobby_id: LobbyId, username: String },
    /// Flip the caller's ready flag
    ToggleReady { lobby_id: LobbyId },
    /// Owner only: add or remove a user from the active-player selection
    SelectActivePlayer { lobby_id: LobbyId, user_id: UserId },
    /// Owner only: start a game with the current selection, or with an
    /// explicit pair that replaces it
    StartGame {
        lobby_id: LobbyId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selected_players: Option<Vec<UserId>>,
    },
    /// Place the caller's symbol on a cell (0-8, row-major)
    MakeMove { lobby_id: LobbyId, index: usize },
    /// Discard the current game and return everyone to the lobby
    Rematch { lobby_id: LobbyId },
    /// Leave one lobby, or every joined lobby when `lobby_id` is omitted
    LeaveLobby {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lobby_id: Option<LobbyId>,
    },
    /// Heartbeat to maintain connection
    Ping,
}

/// Lobby identifier plus the full snapshot that goes with an event.
/// Boxed in ServerMessage to reduce enum size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyEventPayload {
    pub lobby_id: LobbyId,
    pub lobby: LobbySnapshot,
}

/// Message types sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    /// First frame on every connection; carries the caller's identity
    Connected { user_id: UserId },
    /// Lobby membership, roles or readiness changed
    LobbyUpdate(Box<LobbyEventPayload>),
    /// A game has started in the lobby
    GameStart(Box<LobbyEventPayload>),
    /// A move was applied
    GameUpdate(Box<LobbyEventPayload>),
    /// A rematch was requested; clients should show the lobby view again
    ReturnToLobby { lobby_id: LobbyId },
    /// Confirmation that the caller left a lobby
    LeftLobby { lobby_id: LobbyId },
    /// Pong response to ping
    Pong,
    /// Error message
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_code: Option<ErrorCode>,
    },
}

impl ServerMessage {
    pub fn lobby_update(lobby_id: &str, lobby: LobbySnapshot) -> Self {
        Self::LobbyUpdate(Box::new(LobbyEventPayload {
            lobby_id: lobby_id.to_string(),
            lobby,
        }))
    }

    pub fn game_start(lobby_id: &str, lobby: LobbySnapshot) -> Self {
        Self::GameStart(Box::new(LobbyEventPayload {
            lobby_id: lobby_id.to_string(),
            lobby,
        }))
    }

    pub fn game_update(lobby_id: &str, lobby: LobbySnapshot) -> Self {
        Self::GameUpdate(Box::new(LobbyEventPayload {
            lobby_id: lobby_id.to_string(),
            lobby,
        }))
    }

    pub fn error(message: impl Into<String>, error_code: ErrorCode) -> Self {
        Self::Error {
            message: message.into(),
            error_code: Some(error_code),
        }
    }

    /// Snapshot carried by lobby events, if any.
    pub fn snapshot(&self) -> Option<&LobbySnapshot> {
        match self {
            Self::LobbyUpdate(payload) | Self::GameStart(payload) | Self::GameUpdate(payload) => {
                Some(&payload.lobby)
            }
            _ => None,
        }
    }
}
