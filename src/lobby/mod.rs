//! Lobby aggregates and the registry that owns them.

pub mod error;
pub mod registry;
pub mod state;

#[cfg(test)]
mod registry_tests;

pub use error::LobbyError;
pub use registry::{Departure, JoinOutcome, LobbyRegistry};
pub use state::Lobby;
