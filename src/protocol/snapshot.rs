use serde::{Deserialize, Serialize};

use super::types::{User, UserId};
use crate::game::{Game, GamePhase};

/// Point-in-time copy of a lobby, as broadcast to clients and returned by queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbySnapshot {
    pub users: Vec<User>,
    pub active_players: Vec<User>,
    pub spectators: Vec<User>,
    pub owner: Option<UserId>,
    pub game_in_progress: bool,
    pub game_state: Option<Game>,
}

impl LobbySnapshot {
    pub fn user(&self, user_id: &UserId) -> Option<&User> {
        self.users.iter().find(|user| user.id == *user_id)
    }

    pub fn phase(&self) -> GamePhase {
        self.game_state
            .as_ref()
            .map_or(GamePhase::NotStarted, Game::phase)
    }
}
