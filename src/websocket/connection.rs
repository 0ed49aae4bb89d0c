use crate::protocol::{ClientMessage, ErrorCode, ServerMessage};
use crate::server::{LobbyServer, RegisterClientError};
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::sending::{send_immediate_server_message, send_text_message};

pub(super) async fn handle_socket(socket: WebSocket, server: Arc<LobbyServer>, addr: SocketAddr) {
    let (mut sender, mut receiver) = socket.split();
    let queue_capacity = server.config().outbound_queue_capacity.max(1);
    let (tx, mut rx) = mpsc::channel::<Arc<ServerMessage>>(queue_capacity);

    let user_id = match server.register_client(tx.clone(), addr).await {
        Ok(user_id) => {
            tracing::info!(%user_id, client_addr = %addr, "WebSocket connection established");
            user_id
        }
        Err(err @ RegisterClientError::IpLimitExceeded { .. }) => {
            let error_message = ServerMessage::error(err.to_string(), ErrorCode::TooManyConnections);
            if let Err(err) = send_immediate_server_message(&mut sender, &error_message).await {
                tracing::debug!(
                    client_addr = %addr,
                    error = %err,
                    "Failed to send IP limit error frame"
                );
            }
            let _ = sender.close().await;
            return;
        }
    };

    // Queued before anything else can reach this connection.
    if tx
        .try_send(Arc::new(ServerMessage::Connected { user_id }))
        .is_err()
    {
        tracing::warn!(%user_id, "Failed to enqueue Connected frame");
    }
    drop(tx);

    let server_clone = server.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if send_text_message(&mut sender, &message, &user_id)
                .await
                .is_err()
            {
                break;
            }
        }
        let _ = sender.close().await;
        server_clone.unregister_client(&user_id).await;
    });

    let server_clone = server.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!(%user_id, "WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let max_size = server_clone.config().max_message_size;
                    if text.len() > max_size {
                        tracing::warn!(
                            %user_id,
                            size = text.len(),
                            max = max_size,
                            "Message exceeds size limit"
                        );
                        server_clone
                            .send_error_to_player(
                                &user_id,
                                format!(
                                    "Message too large ({} bytes, max {} bytes)",
                                    text.len(),
                                    max_size
                                ),
                                ErrorCode::MessageTooLarge,
                            )
                            .await;
                        continue;
                    }

                    let client_message = match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => message,
                        Err(err) => {
                            tracing::warn!(
                                %user_id,
                                error = %err,
                                "Rejected client WebSocket frame"
                            );
                            server_clone.metrics.increment_malformed_messages();
                            server_clone
                                .send_error_to_player(
                                    &user_id,
                                    format!("Invalid message format: {err}"),
                                    ErrorCode::InvalidInput,
                                )
                                .await;
                            continue;
                        }
                    };

                    server_clone
                        .handle_client_message(&user_id, client_message)
                        .await;
                }
                Message::Binary(_) => {
                    server_clone.metrics.increment_malformed_messages();
                    server_clone
                        .send_error_to_player(
                            &user_id,
                            "Binary frames are not supported",
                            ErrorCode::InvalidInput,
                        )
                        .await;
                }
                Message::Close(_) => {
                    tracing::info!(%user_id, "WebSocket connection closed");
                    break;
                }
                // Protocol-level ping/pong is answered by the socket itself.
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }

        server_clone.unregister_client(&user_id).await;
    });

    // The surviving half must not outlive the connection.
    tokio::select! {
        _ = &mut send_task => {
            tracing::debug!(%user_id, "Send task completed");
            receive_task.abort();
        }
        _ = &mut receive_task => {
            tracing::debug!(%user_id, "Receive task completed");
            send_task.abort();
        }
    }

    server.unregister_client(&user_id).await;
}

#[cfg(test)]
mod tests {
    use crate::config::{ProtocolConfig, SecurityConfig};
    use crate::protocol::{ErrorCode, ServerMessage};
    use crate::server::{LobbyServer, ServerConfig};
    use crate::websocket::create_router;
    use futures_util::{SinkExt, StreamExt};
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio_tungstenite::{connect_async, tungstenite::Message as TungsteniteMessage};

    async fn spawn_server(config: ServerConfig) -> SocketAddr {
        let server = LobbyServer::new(config, ProtocolConfig::default());
        let security = SecurityConfig {
            cors_origins: "*".to_string(),
            ..SecurityConfig::default()
        };
        let app = create_router(server, &security);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });
        addr
    }

    async fn next_frame<S>(stream: &mut S) -> ServerMessage
    where
        S: StreamExt<Item = Result<TungsteniteMessage, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        let frame = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("timed out waiting for frame")
            .expect("socket closed")
            .expect("socket error");
        match frame {
            TungsteniteMessage::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn first_frame_is_connected_and_bad_frames_get_errors() {
        let addr = spawn_server(ServerConfig::default()).await;
        let (socket, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
        let (mut write, mut read) = socket.split();

        assert!(matches!(
            next_frame(&mut read).await,
            ServerMessage::Connected { .. }
        ));

        write
            .send(TungsteniteMessage::Text("{not json".into()))
            .await
            .unwrap();
        match next_frame(&mut read).await {
            ServerMessage::Error { error_code, .. } => {
                assert_eq!(error_code, Some(ErrorCode::InvalidInput));
            }
            other => panic!("expected Error, got {other:?}"),
        }

        write
            .send(TungsteniteMessage::Text(r#"{"type":"Ping"}"#.into()))
            .await
            .unwrap();
        assert!(matches!(next_frame(&mut read).await, ServerMessage::Pong));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn connections_over_the_ip_limit_are_refused() {
        let config = ServerConfig {
            max_connections_per_ip: 1,
            ..ServerConfig::default()
        };
        let addr = spawn_server(config).await;

        let (first, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
        let (_first_write, mut first_read) = first.split();
        assert!(matches!(
            next_frame(&mut first_read).await,
            ServerMessage::Connected { .. }
        ));

        let (second, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
        let (_second_write, mut second_read) = second.split();
        match next_frame(&mut second_read).await {
            ServerMessage::Error { error_code, .. } => {
                assert_eq!(error_code, Some(ErrorCode::TooManyConnections));
            }
            other => panic!("expected Error, got {other:?}"),
        }
    }
}
