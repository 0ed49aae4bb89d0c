use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for structured error handling
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    InvalidInput,
    InvalidLobbyId,
    InvalidUsername,
    MessageTooLarge,

    // Lobby errors
    LobbyNotFound,

    // Connection errors
    TooManyConnections,

    // Server errors
    InternalError,
}

impl ErrorCode {
    /// Returns a human-readable description of this error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => {
                "The request is malformed or names an unknown action. Check the message format."
            }
            Self::InvalidLobbyId => {
                "The lobby id is invalid. Lobby ids must be non-empty and use letters, digits, '-' or '_'."
            }
            Self::InvalidUsername => {
                "The username is invalid. Usernames must be non-empty and within the length limit."
            }
            Self::MessageTooLarge => "The message exceeds the maximum allowed size.",
            Self::LobbyNotFound => "The requested lobby does not exist or has been closed.",
            Self::TooManyConnections => {
                "Too many connections from this address. Close an existing connection and retry."
            }
            Self::InternalError => "The server encountered an unexpected error.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}
