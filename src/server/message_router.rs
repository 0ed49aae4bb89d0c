use crate::protocol::{ClientMessage, ServerMessage, UserId};

use super::{ActionError, LobbyServer};

impl LobbyServer {
    /// Dispatch one parsed frame from a WebSocket connection.
    ///
    /// Frames that arrive after the connection was unregistered are dropped,
    /// so a closing socket cannot join a lobby it would never leave.
    pub async fn handle_client_message(&self, user_id: &UserId, message: ClientMessage) {
        let user_id = *user_id;
        if !self.connection_manager.has_client(&user_id) {
            tracing::debug!(%user_id, "Dropping frame from a closed connection");
            return;
        }
        let result: Result<(), ActionError> = match message {
            ClientMessage::JoinLobby { lobby_id, username } => self
                .handle_join_lobby(user_id, &lobby_id, &username)
                .await
                .map(drop),
            ClientMessage::ToggleReady { lobby_id } => self
                .handle_toggle_ready(user_id, &lobby_id)
                .await
                .map(drop),
            ClientMessage::SelectActivePlayer {
                lobby_id,
                user_id: target,
            } => self
                .handle_select_active_player(user_id, &lobby_id, target)
                .await
                .map(drop),
            ClientMessage::StartGame {
                lobby_id,
                selected_players,
            } => self
                .handle_start_game(user_id, &lobby_id, selected_players)
                .await
                .map(drop),
            ClientMessage::MakeMove { lobby_id, index } => self
                .handle_make_move(user_id, &lobby_id, index)
                .await
                .map(drop),
            ClientMessage::Rematch { lobby_id } => {
                self.handle_rematch(user_id, &lobby_id).await.map(drop)
            }
            ClientMessage::LeaveLobby { lobby_id } => {
                self.handle_leave_request(user_id, lobby_id).await
            }
            ClientMessage::Ping => {
                self.send_to_player(&user_id, ServerMessage::Pong).await;
                Ok(())
            }
        };

        if let Err(err) = result {
            self.report_action_error(&user_id, err).await;
        }
    }

    /// Leave the named lobby, or every lobby this connection joined.
    async fn handle_leave_request(
        &self,
        user_id: UserId,
        lobby_id: Option<String>,
    ) -> Result<(), ActionError> {
        match lobby_id {
            Some(lobby_id) => self.handle_leave_lobby(user_id, &lobby_id).await.map(drop),
            None => {
                for lobby_id in self.connection_manager.lobbies_of(&user_id) {
                    if let Err(err) = self.handle_leave_lobby(user_id, &lobby_id).await {
                        tracing::debug!(%user_id, %lobby_id, error = %err, "Leave failed");
                    }
                }
                Ok(())
            }
        }
    }
}
