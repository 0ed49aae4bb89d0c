use thiserror::Error;

use crate::game::MoveRejection;
use crate::protocol::{LobbyId, UserId};

/// Why a lobby operation had no effect.
///
/// Only [`LobbyError::LobbyNotFound`] is reported back to the caller; every
/// other variant is a rejected transition that the gateway drops silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LobbyError {
    #[error("lobby '{0}' not found")]
    LobbyNotFound(LobbyId),

    #[error("only the lobby owner can do that")]
    NotOwner,

    #[error("invalid move: {0}")]
    InvalidMove(#[from] MoveRejection),

    #[error("two players are already selected")]
    SelectionFull,

    #[error("invalid player selection: {0}")]
    InvalidSelection(&'static str),

    #[error("a game is already in progress")]
    GameInProgress,

    #[error("no game is in progress")]
    NoActiveGame,

    #[error("user {0} is not an active player")]
    NotAPlayer(UserId),

    #[error("user {0} is not in this lobby")]
    NotAMember(UserId),
}

impl LobbyError {
    /// Whether the caller should receive no response for this rejection.
    pub fn is_silent(&self) -> bool {
        !matches!(self, Self::LobbyNotFound(_))
    }
}
