//! Fan-out of server messages to connected clients.
//!
//! A broadcast group is the set of connections subscribed to one lobby.
//! Delivery is `try_send` into each connection's bounded outbound queue, so a
//! slow consumer loses frames instead of stalling the sender.

pub mod in_memory;

pub use in_memory::InMemoryMessageCoordinator;

use crate::protocol::{LobbyId, ServerMessage, UserId};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Outcome of a send or broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    /// Recipients whose queue was full or closed.
    pub dropped: usize,
}

impl Delivery {
    fn record(&mut self, sent: bool) {
        if sent {
            self.delivered += 1;
        } else {
            self.dropped += 1;
        }
    }
}

#[async_trait::async_trait]
pub trait MessageCoordinator: Send + Sync {
    async fn register_local_client(
        &self,
        user_id: UserId,
        sender: mpsc::Sender<Arc<ServerMessage>>,
    ) -> anyhow::Result<()>;

    /// Forget the client and remove it from every group.
    async fn unregister_local_client(&self, user_id: &UserId) -> anyhow::Result<()>;

    async fn join_group(&self, lobby_id: &LobbyId, user_id: UserId) -> anyhow::Result<()>;

    async fn leave_group(&self, lobby_id: &LobbyId, user_id: &UserId) -> anyhow::Result<()>;

    async fn send_to_player(
        &self,
        user_id: &UserId,
        message: Arc<ServerMessage>,
    ) -> anyhow::Result<Delivery>;

    async fn broadcast_to_lobby(
        &self,
        lobby_id: &LobbyId,
        message: Arc<ServerMessage>,
    ) -> anyhow::Result<Delivery>;

    async fn group_members(&self, lobby_id: &LobbyId) -> Vec<UserId>;
}
