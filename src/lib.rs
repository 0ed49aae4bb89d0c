#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_excessive_bools,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::similar_names
)]

//! # Tic-tac-toe Lobby Server
//!
//! An in-memory lobby and game session server for "fading" tic-tac-toe, where
//! each player keeps at most three marks on the board and the oldest one
//! disappears when a fourth is placed.
//!
//! Clients talk to it over a WebSocket push channel or a stateless HTTP
//! polling API; both drive the same [`lobby::LobbyRegistry`].

/// Server configuration and environment variables
pub mod config;

/// Per-lobby broadcast groups
pub mod coordination;

/// Board rules: moves, the sliding mark window and win detection
pub mod game;

/// Lobby state and the registry that owns every lobby
pub mod lobby;

/// Structured logging configuration
pub mod logging;

/// Metrics collection and reporting
pub mod metrics;

/// Wire message and snapshot definitions
pub mod protocol;

/// Session gateway between transports and the registry
pub mod server;

/// WebSocket, polling and operational HTTP endpoints
pub mod websocket;
