use crate::config::{Config, ProtocolConfig};
use crate::coordination::{InMemoryMessageCoordinator, MessageCoordinator};
use crate::lobby::{LobbyError, LobbyRegistry};
use crate::metrics::{MetricsSnapshot, ServerMetrics};
use crate::protocol::{ErrorCode, ServerMessage, UserId};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

mod connection_manager;
mod lobby_handlers;
mod message_router;
mod messaging;

use connection_manager::ConnectionManager;

/// Session gateway: binds client actions to the lobby registry and fans the
/// resulting snapshots out to every connection subscribed to the lobby.
pub struct LobbyServer {
    /// Owner of every lobby
    registry: Arc<LobbyRegistry>,
    /// Live WebSocket connections, their IPs and joined lobbies
    connection_manager: ConnectionManager,
    config: ServerConfig,
    protocol_config: ProtocolConfig,
    pub(crate) metrics: Arc<ServerMetrics>,
    /// Per-lobby broadcast groups
    message_coordinator: Arc<dyn MessageCoordinator>,
}

#[derive(Debug, Error)]
pub enum RegisterClientError {
    #[error("Too many connections from your IP ({current}/{limit})")]
    IpLimitExceeded { current: usize, limit: usize },
}

/// Why a client action produced no new state.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The request itself was malformed; always reported to the caller.
    #[error("{message}")]
    Invalid { message: String, code: ErrorCode },
    #[error(transparent)]
    Lobby(#[from] LobbyError),
}

impl ActionError {
    pub fn invalid(message: impl Into<String>, code: ErrorCode) -> Self {
        Self::Invalid {
            message: message.into(),
            code,
        }
    }

    /// Rejected transitions are dropped without telling the caller.
    pub fn is_silent(&self) -> bool {
        match self {
            Self::Invalid { .. } => false,
            Self::Lobby(err) => err.is_silent(),
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Invalid { code, .. } => *code,
            Self::Lobby(LobbyError::LobbyNotFound(_)) => ErrorCode::LobbyNotFound,
            Self::Lobby(_) => ErrorCode::InvalidInput,
        }
    }
}

/// Runtime settings for the gateway and its transports.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub max_message_size: usize,
    pub max_connections_per_ip: usize,
    pub outbound_queue_capacity: usize,
    pub require_metrics_auth: bool,
    pub metrics_auth_token: Option<String>,
    pub enable_websocket: bool,
    pub enable_polling_api: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ServerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_message_size: config.security.max_message_size,
            max_connections_per_ip: config.security.max_connections_per_ip,
            outbound_queue_capacity: config.server.outbound_queue_capacity,
            require_metrics_auth: config.security.require_metrics_auth,
            metrics_auth_token: config.security.metrics_auth_token.clone(),
            enable_websocket: config.server.enable_websocket,
            enable_polling_api: config.server.enable_polling_api,
        }
    }
}

impl LobbyServer {
    pub fn new(config: ServerConfig, protocol_config: ProtocolConfig) -> Arc<Self> {
        Self::with_coordinator(
            config,
            protocol_config,
            Arc::new(InMemoryMessageCoordinator::new()),
        )
    }

    pub fn with_coordinator(
        config: ServerConfig,
        protocol_config: ProtocolConfig,
        message_coordinator: Arc<dyn MessageCoordinator>,
    ) -> Arc<Self> {
        let metrics = Arc::new(ServerMetrics::new());
        let connection_manager = ConnectionManager::new(
            config.max_connections_per_ip,
            Arc::clone(&metrics),
            Arc::clone(&message_coordinator),
        );

        Arc::new(Self {
            registry: Arc::new(LobbyRegistry::new()),
            connection_manager,
            config,
            protocol_config,
            metrics,
            message_coordinator,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn protocol_config(&self) -> &ProtocolConfig {
        &self.protocol_config
    }

    pub fn registry(&self) -> &LobbyRegistry {
        &self.registry
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.registry.lobby_count())
    }

    pub fn connected_clients(&self) -> usize {
        self.connection_manager.client_count()
    }

    /// Register a new WebSocket connection and hand back its identity.
    pub async fn register_client(
        &self,
        sender: mpsc::Sender<Arc<ServerMessage>>,
        client_addr: SocketAddr,
    ) -> Result<UserId, RegisterClientError> {
        self.connection_manager
            .register_client(sender, client_addr)
            .await
    }

    /// Register a connection under a known id, bypassing the per-IP limit.
    pub async fn connect_client(
        &self,
        user_id: UserId,
        sender: mpsc::Sender<Arc<ServerMessage>>,
        client_addr: SocketAddr,
    ) {
        self.connection_manager
            .connect_test_client(user_id, sender, client_addr)
            .await;
    }

    /// Tear down a connection: leave every lobby it joined, telling the
    /// survivors, then forget the connection.
    pub async fn unregister_client(&self, user_id: &UserId) {
        for lobby_id in self.connection_manager.lobbies_of(user_id) {
            if let Err(err) = self.depart_lobby(user_id, &lobby_id).await {
                tracing::debug!(%user_id, %lobby_id, error = %err, "Lobby already gone on disconnect");
            }
        }

        if self
            .connection_manager
            .unregister_client(user_id)
            .await
            .is_some()
        {
            tracing::info!(%user_id, "Client disconnected");
        }
    }
}
