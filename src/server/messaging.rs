use super::{ActionError, LobbyServer};
use crate::protocol::{ErrorCode, LobbyId, ServerMessage, UserId};
use std::sync::Arc;

impl LobbyServer {
    /// Send a message to one connection, counting it if its queue is full.
    pub async fn send_to_player(&self, user_id: &UserId, message: ServerMessage) {
        match self
            .message_coordinator
            .send_to_player(user_id, Arc::new(message))
            .await
        {
            Ok(delivery) => self
                .metrics
                .add_websocket_messages_dropped(delivery.dropped),
            Err(err) => tracing::warn!(%user_id, %err, "Failed to send message to player"),
        }
    }

    pub async fn send_error_to_player(
        &self,
        user_id: &UserId,
        message: impl Into<String>,
        error_code: ErrorCode,
    ) {
        self.send_to_player(user_id, ServerMessage::error(message, error_code))
            .await;
    }

    /// Fan a message out to every connection subscribed to `lobby_id`.
    pub async fn broadcast_to_lobby(&self, lobby_id: &LobbyId, message: ServerMessage) {
        match self
            .message_coordinator
            .broadcast_to_lobby(lobby_id, Arc::new(message))
            .await
        {
            Ok(delivery) => self
                .metrics
                .add_websocket_messages_dropped(delivery.dropped),
            Err(err) => tracing::warn!(%lobby_id, %err, "Failed to broadcast to lobby"),
        }
    }

    /// Report a failed action back to a WebSocket caller, or drop it if the
    /// rejection is one that callers never hear about.
    pub async fn report_action_error(&self, user_id: &UserId, err: ActionError) {
        if err.is_silent() {
            tracing::debug!(%user_id, error = %err, "Ignoring rejected action");
            return;
        }
        let code = err.error_code();
        self.send_error_to_player(user_id, err.to_string(), code)
            .await;
    }
}
