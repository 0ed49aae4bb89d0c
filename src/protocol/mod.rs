// Protocol module: wire messages, lobby snapshots and input validation

pub mod error_codes;
pub mod messages;
pub mod snapshot;
pub mod types;
pub mod validation;

pub use error_codes::ErrorCode;

pub use types::{
    LobbyId, User, UserId, DEFAULT_MAX_LOBBY_ID_LENGTH, DEFAULT_MAX_USERNAME_LENGTH,
};

pub use messages::{ClientMessage, LobbyEventPayload, ServerMessage};

pub use snapshot::LobbySnapshot;
