use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counters, exposed as JSON on `/metrics`.
#[derive(Debug, Default)]
pub struct ServerMetrics {
    // Connections
    pub total_connections: AtomicU64,
    pub active_connections: AtomicU64,
    pub disconnections: AtomicU64,
    pub connection_rejections: AtomicU64,
    pub websocket_messages_dropped: AtomicU64,
    pub malformed_messages: AtomicU64,

    // Lobbies
    pub lobbies_created: AtomicU64,
    pub lobbies_deleted: AtomicU64,
    pub lobby_joins: AtomicU64,
    pub lobby_leaves: AtomicU64,
    pub lobby_not_found: AtomicU64,

    // Games
    pub games_started: AtomicU64,
    pub moves_applied: AtomicU64,
    pub moves_rejected: AtomicU64,
    pub games_won: AtomicU64,
    pub rematches: AtomicU64,
    /// Lobby operations dropped without a reply (not owner, bad selection, ...)
    pub ignored_actions: AtomicU64,

    // Polling API
    pub polling_requests: AtomicU64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MetricsSnapshot {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub connections: ConnectionMetrics,
    pub lobbies: LobbyMetrics,
    pub games: GameMetrics,
    pub polling_requests: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConnectionMetrics {
    pub total_connections: u64,
    pub active_connections: u64,
    pub disconnections: u64,
    pub connection_rejections: u64,
    pub websocket_messages_dropped: u64,
    pub malformed_messages: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LobbyMetrics {
    /// Lobbies currently in the registry
    pub active_lobbies: u64,
    pub lobbies_created: u64,
    pub lobbies_deleted: u64,
    pub lobby_joins: u64,
    pub lobby_leaves: u64,
    pub lobby_not_found: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GameMetrics {
    pub games_started: u64,
    pub moves_applied: u64,
    pub moves_rejected: u64,
    pub games_won: u64,
    pub rematches: u64,
    pub ignored_actions: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

fn read(counter: &AtomicU64) -> u64 {
    counter.load(Ordering::Relaxed)
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_connections(&self) {
        bump(&self.total_connections);
        bump(&self.active_connections);
    }

    pub fn decrement_active_connections(&self) {
        // Saturating so a double decrement can never wrap.
        let _ = self
            .active_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_sub(1)
            });
        bump(&self.disconnections);
    }

    pub fn increment_connection_rejections(&self) {
        bump(&self.connection_rejections);
    }

    pub fn add_websocket_messages_dropped(&self, count: usize) {
        if count > 0 {
            self.websocket_messages_dropped
                .fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    pub fn increment_malformed_messages(&self) {
        bump(&self.malformed_messages);
    }

    pub fn increment_lobbies_created(&self) {
        bump(&self.lobbies_created);
    }

    pub fn increment_lobbies_deleted(&self) {
        bump(&self.lobbies_deleted);
    }

    pub fn increment_lobby_joins(&self) {
        bump(&self.lobby_joins);
    }

    pub fn increment_lobby_leaves(&self) {
        bump(&self.lobby_leaves);
    }

    pub fn increment_lobby_not_found(&self) {
        bump(&self.lobby_not_found);
    }

    pub fn increment_games_started(&self) {
        bump(&self.games_started);
    }

    pub fn increment_moves_applied(&self) {
        bump(&self.moves_applied);
    }

    pub fn increment_moves_rejected(&self) {
        bump(&self.moves_rejected);
    }

    pub fn increment_games_won(&self) {
        bump(&self.games_won);
    }

    pub fn increment_rematches(&self) {
        bump(&self.rematches);
    }

    pub fn increment_ignored_actions(&self) {
        bump(&self.ignored_actions);
    }

    pub fn increment_polling_requests(&self) {
        bump(&self.polling_requests);
    }

    /// Point-in-time copy of every counter. `active_lobbies` comes from the registry.
    pub fn snapshot(&self, active_lobbies: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: chrono::Utc::now(),
            connections: ConnectionMetrics {
                total_connections: read(&self.total_connections),
                active_connections: read(&self.active_connections),
                disconnections: read(&self.disconnections),
                connection_rejections: read(&self.connection_rejections),
                websocket_messages_dropped: read(&self.websocket_messages_dropped),
                malformed_messages: read(&self.malformed_messages),
            },
            lobbies: LobbyMetrics {
                active_lobbies: active_lobbies as u64,
                lobbies_created: read(&self.lobbies_created),
                lobbies_deleted: read(&self.lobbies_deleted),
                lobby_joins: read(&self.lobby_joins),
                lobby_leaves: read(&self.lobby_leaves),
                lobby_not_found: read(&self.lobby_not_found),
            },
            games: GameMetrics {
                games_started: read(&self.games_started),
                moves_applied: read(&self.moves_applied),
                moves_rejected: read(&self.moves_rejected),
                games_won: read(&self.games_won),
                rematches: read(&self.rematches),
                ignored_actions: read(&self.ignored_actions),
            },
            polling_requests: read(&self.polling_requests),
        }
    }
}
