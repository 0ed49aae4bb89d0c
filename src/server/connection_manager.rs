use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::coordination::MessageCoordinator;
use crate::metrics::ServerMetrics;
use crate::protocol::{LobbyId, ServerMessage, UserId};

use super::RegisterClientError;

#[derive(Debug, Clone)]
pub(crate) struct ClientConnection {
    /// Lobbies this connection joined and has not left.
    pub lobbies: HashSet<LobbyId>,
    pub client_addr: SocketAddr,
    pub connected_at: Instant,
}

impl ClientConnection {
    fn new(client_addr: SocketAddr) -> Self {
        Self {
            lobbies: HashSet::new(),
            client_addr,
            connected_at: Instant::now(),
        }
    }
}

pub(crate) struct ConnectionManager {
    clients: DashMap<UserId, ClientConnection>,
    connections_per_ip: DashMap<IpAddr, usize>,
    metrics: Arc<ServerMetrics>,
    message_coordinator: Arc<dyn MessageCoordinator>,
    max_connections_per_ip: usize,
}

impl ConnectionManager {
    pub fn new(
        max_connections_per_ip: usize,
        metrics: Arc<ServerMetrics>,
        message_coordinator: Arc<dyn MessageCoordinator>,
    ) -> Self {
        Self {
            clients: DashMap::new(),
            connections_per_ip: DashMap::new(),
            metrics,
            message_coordinator,
            max_connections_per_ip,
        }
    }

    pub async fn register_client(
        &self,
        sender: mpsc::Sender<Arc<ServerMessage>>,
        client_addr: SocketAddr,
    ) -> Result<UserId, RegisterClientError> {
        let ip = client_addr.ip();
        if let Err(current) = self.try_reserve_ip_slot(ip) {
            warn!(
                %ip,
                current,
                max = self.max_connections_per_ip,
                "IP connection limit exceeded"
            );
            self.metrics.increment_connection_rejections();
            return Err(RegisterClientError::IpLimitExceeded {
                current,
                limit: self.max_connections_per_ip,
            });
        }

        let user_id = Uuid::new_v4();
        self.clients
            .insert(user_id, ClientConnection::new(client_addr));
        self.metrics.increment_connections();
        self.register_with_coordinator(user_id, sender).await;

        info!(%user_id, %client_addr, "Client registered");
        Ok(user_id)
    }

    pub async fn connect_test_client(
        &self,
        user_id: UserId,
        sender: mpsc::Sender<Arc<ServerMessage>>,
        client_addr: SocketAddr,
    ) {
        self.increment_ip_slot_unbounded(client_addr.ip());
        self.clients
            .insert(user_id, ClientConnection::new(client_addr));
        self.metrics.increment_connections();
        self.register_with_coordinator(user_id, sender).await;
    }

    async fn register_with_coordinator(
        &self,
        user_id: UserId,
        sender: mpsc::Sender<Arc<ServerMessage>>,
    ) {
        if let Err(err) = self
            .message_coordinator
            .register_local_client(user_id, sender)
            .await
        {
            warn!(%user_id, %err, "Failed to register client with coordinator");
        }
    }

    pub fn has_client(&self, user_id: &UserId) -> bool {
        self.clients.contains_key(user_id)
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Record that `user_id` joined `lobby_id`. Returns `false` for unknown clients.
    pub fn track_lobby(&self, user_id: &UserId, lobby_id: &str) -> bool {
        match self.clients.get_mut(user_id) {
            Some(mut client) => {
                client.lobbies.insert(lobby_id.to_string());
                true
            }
            None => false,
        }
    }

    pub fn untrack_lobby(&self, user_id: &UserId, lobby_id: &str) {
        if let Some(mut client) = self.clients.get_mut(user_id) {
            client.lobbies.remove(lobby_id);
        }
    }

    pub fn lobbies_of(&self, user_id: &UserId) -> Vec<LobbyId> {
        let mut lobbies: Vec<LobbyId> = self
            .clients
            .get(user_id)
            .map(|client| client.lobbies.iter().cloned().collect())
            .unwrap_or_default();
        lobbies.sort();
        lobbies
    }

    /// Forget the connection, release its IP slot and drop it from every broadcast group.
    pub async fn unregister_client(&self, user_id: &UserId) -> Option<ClientConnection> {
        let connection = self.remove_client(user_id)?;

        if let Err(err) = self
            .message_coordinator
            .unregister_local_client(user_id)
            .await
        {
            warn!(%user_id, %err, "Failed to unregister client from coordinator");
        }
        self.metrics.decrement_active_connections();
        info!(
            %user_id,
            connected_secs = connection.connected_at.elapsed().as_secs(),
            "Client unregistered"
        );
        Some(connection)
    }

    fn remove_client(&self, user_id: &UserId) -> Option<ClientConnection> {
        self.clients.remove(user_id).map(|(_, connection)| {
            self.release_ip_slot(connection.client_addr.ip());
            connection
        })
    }

    fn try_reserve_ip_slot(&self, ip: IpAddr) -> Result<usize, usize> {
        match self.connections_per_ip.entry(ip) {
            Entry::Occupied(mut entry) => {
                let current = *entry.get();
                if current >= self.max_connections_per_ip {
                    Err(current)
                } else {
                    let count = entry.get_mut();
                    *count += 1;
                    Ok(*count)
                }
            }
            Entry::Vacant(entry) => {
                if self.max_connections_per_ip == 0 {
                    Err(0)
                } else {
                    entry.insert(1);
                    Ok(1)
                }
            }
        }
    }

    fn increment_ip_slot_unbounded(&self, ip: IpAddr) {
        *self.connections_per_ip.entry(ip).or_insert(0) += 1;
    }

    fn release_ip_slot(&self, ip: IpAddr) {
        if let Some(mut entry) = self.connections_per_ip.get_mut(&ip) {
            if *entry > 1 {
                *entry -= 1;
                return;
            }
        }
        self.connections_per_ip.remove(&ip);
    }
}
