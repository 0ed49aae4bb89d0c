use crate::server::LobbyServer;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use std::net::SocketAddr;
use std::sync::Arc;

use super::connection::handle_socket;

/// WebSocket handler for the lobby protocol
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(server): State<Arc<LobbyServer>>,
) -> Response {
    let max_message_size = server.config().max_message_size;
    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, server, addr))
}
