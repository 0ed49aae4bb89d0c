use super::{Delivery, MessageCoordinator};
use crate::protocol::{LobbyId, ServerMessage, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// Single-process coordinator backed by the connections' outbound channels.
#[derive(Default)]
pub struct InMemoryMessageCoordinator {
    local_clients: RwLock<HashMap<UserId, mpsc::Sender<Arc<ServerMessage>>>>,
    lobby_members: RwLock<HashMap<LobbyId, HashSet<UserId>>>,
}

impl InMemoryMessageCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_deliver(
        user_id: &UserId,
        sender: &mpsc::Sender<Arc<ServerMessage>>,
        message: &Arc<ServerMessage>,
    ) -> bool {
        match sender.try_send(Arc::clone(message)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(%user_id, "Outbound queue full; dropping message");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(%user_id, "Outbound queue closed; dropping message");
                false
            }
        }
    }
}

#[async_trait::async_trait]
impl MessageCoordinator for InMemoryMessageCoordinator {
    async fn register_local_client(
        &self,
        user_id: UserId,
        sender: mpsc::Sender<Arc<ServerMessage>>,
    ) -> anyhow::Result<()> {
        self.local_clients.write().await.insert(user_id, sender);
        Ok(())
    }

    async fn unregister_local_client(&self, user_id: &UserId) -> anyhow::Result<()> {
        self.local_clients.write().await.remove(user_id);

        let mut lobby_members = self.lobby_members.write().await;
        lobby_members.retain(|_, members| {
            members.remove(user_id);
            !members.is_empty()
        });
        Ok(())
    }

    async fn join_group(&self, lobby_id: &LobbyId, user_id: UserId) -> anyhow::Result<()> {
        if !self.local_clients.read().await.contains_key(&user_id) {
            anyhow::bail!("client {user_id} is not registered");
        }
        self.lobby_members
            .write()
            .await
            .entry(lobby_id.clone())
            .or_default()
            .insert(user_id);
        Ok(())
    }

    async fn leave_group(&self, lobby_id: &LobbyId, user_id: &UserId) -> anyhow::Result<()> {
        let mut lobby_members = self.lobby_members.write().await;
        if let Some(members) = lobby_members.get_mut(lobby_id) {
            members.remove(user_id);
            if members.is_empty() {
                lobby_members.remove(lobby_id);
            }
        }
        Ok(())
    }

    async fn send_to_player(
        &self,
        user_id: &UserId,
        message: Arc<ServerMessage>,
    ) -> anyhow::Result<Delivery> {
        let mut delivery = Delivery::default();
        match self.local_clients.read().await.get(user_id) {
            Some(sender) => delivery.record(Self::try_deliver(user_id, sender, &message)),
            None => tracing::debug!(%user_id, "No local client; message not sent"),
        }
        Ok(delivery)
    }

    async fn broadcast_to_lobby(
        &self,
        lobby_id: &LobbyId,
        message: Arc<ServerMessage>,
    ) -> anyhow::Result<Delivery> {
        let lobby_members = self.lobby_members.read().await;
        let clients = self.local_clients.read().await;

        let mut delivery = Delivery::default();
        if let Some(members) = lobby_members.get(lobby_id) {
            for user_id in members {
                if let Some(sender) = clients.get(user_id) {
                    delivery.record(Self::try_deliver(user_id, sender, &message));
                }
            }
        }
        tracing::trace!(
            %lobby_id,
            delivered = delivery.delivered,
            dropped = delivery.dropped,
            "Broadcast to lobby"
        );
        Ok(delivery)
    }

    async fn group_members(&self, lobby_id: &LobbyId) -> Vec<UserId> {
        self.lobby_members
            .read()
            .await
            .get(lobby_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }
}
