//! Server behaviour configuration.

use super::defaults::{
    default_bind_address, default_enable_polling_api, default_enable_websocket,
    default_outbound_queue_capacity,
};
use serde::{Deserialize, Serialize};

/// Listener and delivery adapter settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Per-connection outbound frame buffer
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,
    /// Mount the `/ws` push adapter
    #[serde(default = "default_enable_websocket")]
    pub enable_websocket: bool,
    /// Mount the `/api/lobby` polling adapter
    #[serde(default = "default_enable_polling_api")]
    pub enable_polling_api: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
            enable_websocket: default_enable_websocket(),
            enable_polling_api: default_enable_polling_api(),
        }
    }
}
