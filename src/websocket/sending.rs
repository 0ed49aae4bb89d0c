use crate::protocol::{ServerMessage, UserId};
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;

pub(super) type SocketSink = SplitSink<WebSocket, Message>;

/// Write a frame straight to the socket, bypassing the outbound queue.
/// Used before the connection is registered.
pub(super) async fn send_immediate_server_message(
    sender: &mut SocketSink,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let payload = match serde_json::to_string(message) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::error!(error = %err, "Failed to serialize server message");
            "{\"type\":\"Error\",\"data\":{\"message\":\"Internal error\"}}".to_string()
        }
    };

    sender.send(Message::Text(payload.into())).await
}

/// Serialize and write one queued frame. `Err` means the socket is gone.
pub(super) async fn send_text_message(
    sender: &mut SocketSink,
    message: &ServerMessage,
    user_id: &UserId,
) -> Result<(), ()> {
    let json_message = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(%user_id, "Failed to serialize message: {}", e);
            return Ok(());
        }
    };

    if sender
        .send(Message::Text(json_message.into()))
        .await
        .is_err()
    {
        tracing::warn!(%user_id, "Failed to send message, connection closed");
        return Err(());
    }

    Ok(())
}
