//! Process-wide map from lobby id to lobby.
//!
//! Each lobby sits behind its own async mutex so operations on different
//! lobbies never contend. The map's shard locks only cover creating and
//! dropping entries and are never held across an `.await`.
//!
//! Deleting an empty lobby races with a concurrent join that already holds a
//! handle to it. The remover marks the lobby closed under its lock and then
//! removes the map entry only if it still points at the same allocation; a
//! joiner that wakes up holding a closed lobby goes back to the map and
//! either finds or creates a fresh entry.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::Instrument;
use uuid::Uuid;

use super::{Lobby, LobbyError};
use crate::game::MoveApplied;
use crate::protocol::{LobbyId, LobbySnapshot, UserId};

type LobbyHandle = Arc<Mutex<Lobby>>;

/// Result of a join.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub snapshot: LobbySnapshot,
    /// The lobby did not exist before this call.
    pub created: bool,
    /// `false` when the user id was already a member.
    pub joined: bool,
}

/// Result of removing a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    /// The user was not in the lobby.
    NotPresent,
    /// The user left; survivors should see this snapshot.
    Left(LobbySnapshot),
    /// The user was the last one and the lobby no longer exists.
    LobbyDeleted,
}

/// Sole owner of every lobby.
#[derive(Debug, Default)]
pub struct LobbyRegistry {
    lobbies: DashMap<LobbyId, LobbyHandle>,
}

impl LobbyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lobby_count(&self) -> usize {
        self.lobbies.len()
    }

    /// Join with a freshly generated identity.
    pub async fn join_lobby(&self, lobby_id: &str, username: &str) -> (LobbySnapshot, UserId) {
        let user_id = Uuid::new_v4();
        let outcome = self.join_lobby_as(lobby_id, user_id, username).await;
        (outcome.snapshot, user_id)
    }

    /// Join with a caller-supplied identity, creating the lobby on demand.
    ///
    /// Never fails. Joining twice with the same id leaves the lobby unchanged.
    pub async fn join_lobby_as(
        &self,
        lobby_id: &str,
        user_id: UserId,
        username: &str,
    ) -> JoinOutcome {
        let span = tracing::info_span!(
            "lobby.join",
            %lobby_id,
            %user_id,
            username,
            created = tracing::field::Empty
        );

        async move {
            loop {
                let (handle, created) = self.get_or_create(lobby_id);
                let mut lobby = handle.lock().await;
                if lobby.is_closed() {
                    tracing::debug!("lobby closed while waiting for its lock; retrying");
                    continue;
                }

                let was_ownerless = lobby.owner().is_none();
                let joined = lobby.add_user(user_id, username);
                tracing::Span::current().record("created", created);

                if created {
                    tracing::info!("Created new lobby");
                }
                if joined {
                    if was_ownerless {
                        tracing::info!("User is now lobby owner");
                    }
                    tracing::info!(users = lobby.user_count(), "User joined lobby");
                } else {
                    tracing::debug!("User already in lobby; join ignored");
                }

                return JoinOutcome {
                    snapshot: lobby.snapshot(),
                    created,
                    joined,
                };
            }
        }
        .instrument(span)
        .await
    }

    pub async fn toggle_ready(
        &self,
        lobby_id: &str,
        user_id: UserId,
    ) -> Result<LobbySnapshot, LobbyError> {
        let mut lobby = self.lock_existing(lobby_id).await?;
        let ready = lobby.toggle_ready(&user_id)?;
        tracing::debug!(%lobby_id, %user_id, ready, "Toggled ready state");
        Ok(lobby.snapshot())
    }

    /// Owner-only: add `target` to the selection, or remove them if already selected.
    pub async fn select_active_player(
        &self,
        lobby_id: &str,
        caller: UserId,
        target: UserId,
    ) -> Result<LobbySnapshot, LobbyError> {
        let mut lobby = self.lock_existing(lobby_id).await?;
        lobby.toggle_selection(&caller, &target)?;
        tracing::debug!(%lobby_id, %caller, %target, "Toggled active player selection");
        Ok(lobby.snapshot())
    }

    pub async fn start_game(
        &self,
        lobby_id: &str,
        caller: UserId,
        explicit_pair: Option<[UserId; 2]>,
    ) -> Result<LobbySnapshot, LobbyError> {
        let mut lobby = self.lock_existing(lobby_id).await?;
        lobby.start_game(&caller, explicit_pair)?;
        let snapshot = lobby.snapshot();
        tracing::info!(
            %lobby_id,
            %caller,
            spectators = snapshot.spectators.len(),
            "Game started"
        );
        Ok(snapshot)
    }

    #[tracing::instrument(name = "lobby.move", level = "debug", skip(self))]
    pub async fn make_move(
        &self,
        lobby_id: &str,
        user_id: UserId,
        index: usize,
    ) -> Result<(LobbySnapshot, MoveApplied), LobbyError> {
        let mut lobby = self.lock_existing(lobby_id).await?;
        match lobby.make_move(&user_id, index) {
            Ok(applied) => {
                tracing::debug!(
                    %lobby_id,
                    %user_id,
                    index,
                    evicted = ?applied.evicted,
                    winner = ?applied.winner,
                    "Move applied"
                );
                if let Some(winner) = applied.winner {
                    tracing::info!(%lobby_id, %winner, "Game won");
                }
                Ok((lobby.snapshot(), applied))
            }
            Err(err) => {
                tracing::debug!(%lobby_id, %user_id, index, error = %err, "Move rejected");
                Err(err)
            }
        }
    }

    /// Any participant may ask for a rematch.
    pub async fn rematch(&self, lobby_id: &str) -> Result<LobbySnapshot, LobbyError> {
        let mut lobby = self.lock_existing(lobby_id).await?;
        lobby.rematch();
        tracing::info!(%lobby_id, users = lobby.user_count(), "Lobby reset for rematch");
        Ok(lobby.snapshot())
    }

    /// Remove a user from a lobby, deleting the lobby once nobody is left.
    pub async fn remove_participant(
        &self,
        lobby_id: &str,
        user_id: UserId,
    ) -> Result<Departure, LobbyError> {
        let handle = self.handle(lobby_id)?;
        let mut lobby = handle.lock().await;
        if lobby.is_closed() {
            return Err(LobbyError::LobbyNotFound(lobby_id.to_string()));
        }

        let previous_owner = lobby.owner();
        if !lobby.remove_user(&user_id) {
            return Ok(Departure::NotPresent);
        }

        if lobby.is_empty() {
            lobby.close();
            self.lobbies
                .remove_if(lobby_id, |_, current| Arc::ptr_eq(current, &handle));
            tracing::info!(%lobby_id, %user_id, "Last user left; lobby deleted");
            return Ok(Departure::LobbyDeleted);
        }

        if previous_owner != lobby.owner() {
            if let Some(owner) = lobby.owner() {
                tracing::info!(%lobby_id, new_owner = %owner, "Lobby ownership transferred");
            }
        }
        tracing::info!(%lobby_id, %user_id, users = lobby.user_count(), "User left lobby");
        Ok(Departure::Left(lobby.snapshot()))
    }

    pub async fn snapshot(&self, lobby_id: &str) -> Result<LobbySnapshot, LobbyError> {
        let lobby = self.lock_existing(lobby_id).await?;
        Ok(lobby.snapshot())
    }

    fn handle(&self, lobby_id: &str) -> Result<LobbyHandle, LobbyError> {
        self.lobbies
            .get(lobby_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LobbyError::LobbyNotFound(lobby_id.to_string()))
    }

    fn get_or_create(&self, lobby_id: &str) -> (LobbyHandle, bool) {
        match self.lobbies.entry(lobby_id.to_string()) {
            Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
            Entry::Vacant(entry) => {
                let handle = Arc::new(Mutex::new(Lobby::new(lobby_id)));
                entry.insert(Arc::clone(&handle));
                (handle, true)
            }
        }
    }

    async fn lock_existing(&self, lobby_id: &str) -> Result<OwnedMutexGuard<Lobby>, LobbyError> {
        let handle = self.handle(lobby_id)?;
        let lobby = handle.lock_owned().await;
        if lobby.is_closed() {
            return Err(LobbyError::LobbyNotFound(lobby_id.to_string()));
        }
        Ok(lobby)
    }
}
