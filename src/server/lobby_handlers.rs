//! Lobby actions shared by the WebSocket router and the polling API.
//!
//! Each handler validates its input, runs one registry operation (which holds
//! the lobby lock only for the mutation itself) and then broadcasts the new
//! snapshot to the lobby's subscribers after the lock is gone.

use super::{ActionError, LobbyServer};
use crate::lobby::{Departure, LobbyError};
use crate::protocol::{validation, ErrorCode, LobbyId, LobbySnapshot, ServerMessage, UserId};

impl LobbyServer {
    fn validate_lobby_id(&self, lobby_id: &str) -> Result<(), ActionError> {
        validation::validate_lobby_id_with_config(lobby_id, &self.protocol_config)
            .map_err(|reason| ActionError::invalid(reason, ErrorCode::InvalidLobbyId))
    }

    fn note_rejection(&self, err: &LobbyError) {
        match err {
            LobbyError::LobbyNotFound(_) => self.metrics.increment_lobby_not_found(),
            LobbyError::InvalidMove(_) | LobbyError::NotAPlayer(_) | LobbyError::NoActiveGame => {
                self.metrics.increment_moves_rejected();
            }
            _ => self.metrics.increment_ignored_actions(),
        }
    }

    /// Add `user_id` to the lobby, creating it if needed.
    ///
    /// WebSocket callers are subscribed to the lobby's broadcast group; polling
    /// callers only get the returned snapshot.
    pub async fn handle_join_lobby(
        &self,
        user_id: UserId,
        lobby_id: &str,
        username: &str,
    ) -> Result<LobbySnapshot, ActionError> {
        self.validate_lobby_id(lobby_id)?;
        validation::validate_username_with_config(username, &self.protocol_config)
            .map_err(|reason| ActionError::invalid(reason, ErrorCode::InvalidUsername))?;

        let outcome = self
            .registry
            .join_lobby_as(lobby_id, user_id, username.trim())
            .await;
        if outcome.created {
            self.metrics.increment_lobbies_created();
        }

        let lobby_key: LobbyId = lobby_id.to_string();
        if self.connection_manager.track_lobby(&user_id, lobby_id) {
            if let Err(err) = self
                .message_coordinator
                .join_group(&lobby_key, user_id)
                .await
            {
                tracing::warn!(%user_id, %lobby_id, %err, "Failed to subscribe to lobby");
            }
        }

        let update = ServerMessage::lobby_update(lobby_id, outcome.snapshot.clone());
        if outcome.joined {
            self.metrics.increment_lobby_joins();
            self.broadcast_to_lobby(&lobby_key, update).await;
        } else {
            self.send_to_player(&user_id, update).await;
        }
        Ok(outcome.snapshot)
    }

    pub async fn handle_toggle_ready(
        &self,
        user_id: UserId,
        lobby_id: &str,
    ) -> Result<LobbySnapshot, ActionError> {
        let snapshot = self
            .registry
            .toggle_ready(lobby_id, user_id)
            .await
            .inspect_err(|err| self.note_rejection(err))?;
        self.broadcast_snapshot(lobby_id, &snapshot, ServerMessage::lobby_update)
            .await;
        Ok(snapshot)
    }

    pub async fn handle_select_active_player(
        &self,
        caller: UserId,
        lobby_id: &str,
        target: UserId,
    ) -> Result<LobbySnapshot, ActionError> {
        let snapshot = self
            .registry
            .select_active_player(lobby_id, caller, target)
            .await
            .inspect_err(|err| self.note_rejection(err))?;
        self.broadcast_snapshot(lobby_id, &snapshot, ServerMessage::lobby_update)
            .await;
        Ok(snapshot)
    }

    /// Start a game with the current selection, or with `selected_players`
    /// when given. An explicit list must name exactly two players.
    pub async fn handle_start_game(
        &self,
        caller: UserId,
        lobby_id: &str,
        selected_players: Option<Vec<UserId>>,
    ) -> Result<LobbySnapshot, ActionError> {
        let explicit_pair = match selected_players {
            None => None,
            Some(players) => match <[UserId; 2]>::try_from(players) {
                Ok(pair) => Some(pair),
                Err(_) => {
                    let err = LobbyError::InvalidSelection("exactly two players must be named");
                    self.note_rejection(&err);
                    return Err(err.into());
                }
            },
        };

        let snapshot = self
            .registry
            .start_game(lobby_id, caller, explicit_pair)
            .await
            .inspect_err(|err| self.note_rejection(err))?;
        self.metrics.increment_games_started();
        self.broadcast_snapshot(lobby_id, &snapshot, ServerMessage::game_start)
            .await;
        Ok(snapshot)
    }

    pub async fn handle_make_move(
        &self,
        user_id: UserId,
        lobby_id: &str,
        index: usize,
    ) -> Result<LobbySnapshot, ActionError> {
        let (snapshot, applied) = self
            .registry
            .make_move(lobby_id, user_id, index)
            .await
            .inspect_err(|err| self.note_rejection(err))?;

        self.metrics.increment_moves_applied();
        if applied.winner.is_some() {
            self.metrics.increment_games_won();
        }
        self.broadcast_snapshot(lobby_id, &snapshot, ServerMessage::game_update)
            .await;
        Ok(snapshot)
    }

    /// Any participant may reset the lobby. Subscribers get `ReturnToLobby`
    /// followed by the reset snapshot.
    pub async fn handle_rematch(
        &self,
        user_id: UserId,
        lobby_id: &str,
    ) -> Result<LobbySnapshot, ActionError> {
        let snapshot = self
            .registry
            .rematch(lobby_id)
            .await
            .inspect_err(|err| self.note_rejection(err))?;
        self.metrics.increment_rematches();
        tracing::info!(%user_id, %lobby_id, "Rematch requested");

        let lobby_key: LobbyId = lobby_id.to_string();
        self.broadcast_to_lobby(
            &lobby_key,
            ServerMessage::ReturnToLobby {
                lobby_id: lobby_key.clone(),
            },
        )
        .await;
        self.broadcast_snapshot(lobby_id, &snapshot, ServerMessage::lobby_update)
            .await;
        Ok(snapshot)
    }

    /// Explicit leave: the caller is removed and told so with `LeftLobby`.
    pub async fn handle_leave_lobby(
        &self,
        user_id: UserId,
        lobby_id: &str,
    ) -> Result<Departure, ActionError> {
        let departure = self.depart_lobby(&user_id, lobby_id).await?;
        self.send_to_player(
            &user_id,
            ServerMessage::LeftLobby {
                lobby_id: lobby_id.to_string(),
            },
        )
        .await;
        Ok(departure)
    }

    /// Remove `user_id` from one lobby and tell whoever is left.
    pub(crate) async fn depart_lobby(
        &self,
        user_id: &UserId,
        lobby_id: &str,
    ) -> Result<Departure, LobbyError> {
        let lobby_key: LobbyId = lobby_id.to_string();
        self.connection_manager.untrack_lobby(user_id, lobby_id);
        if let Err(err) = self
            .message_coordinator
            .leave_group(&lobby_key, user_id)
            .await
        {
            tracing::warn!(%user_id, %lobby_id, %err, "Failed to unsubscribe from lobby");
        }

        let departure = self
            .registry
            .remove_participant(lobby_id, *user_id)
            .await
            .inspect_err(|err| self.note_rejection(err))?;

        match &departure {
            Departure::NotPresent => {}
            Departure::Left(snapshot) => {
                self.metrics.increment_lobby_leaves();
                self.broadcast_snapshot(lobby_id, snapshot, ServerMessage::lobby_update)
                    .await;
            }
            Departure::LobbyDeleted => {
                self.metrics.increment_lobby_leaves();
                self.metrics.increment_lobbies_deleted();
            }
        }
        Ok(departure)
    }

    async fn broadcast_snapshot(
        &self,
        lobby_id: &str,
        snapshot: &LobbySnapshot,
        event: fn(&str, LobbySnapshot) -> ServerMessage,
    ) {
        self.broadcast_to_lobby(&lobby_id.to_string(), event(lobby_id, snapshot.clone()))
            .await;
    }
}
