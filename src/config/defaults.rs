//! Default value functions used by `#[serde(default = ...)]` attributes.

use super::logging::LogFormat;
use crate::protocol::types::{DEFAULT_MAX_LOBBY_ID_LENGTH, DEFAULT_MAX_USERNAME_LENGTH};

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

pub const fn default_port() -> u16 {
    3001
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

pub fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

/// Frames buffered per connection before further broadcasts to it are dropped.
pub const fn default_outbound_queue_capacity() -> usize {
    64
}

pub const fn default_enable_websocket() -> bool {
    true
}

pub const fn default_enable_polling_api() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Protocol
// ---------------------------------------------------------------------------

pub const fn default_max_lobby_id_length() -> usize {
    DEFAULT_MAX_LOBBY_ID_LENGTH
}

pub const fn default_max_username_length() -> usize {
    DEFAULT_MAX_USERNAME_LENGTH
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "tictac-lobby.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub const fn default_enable_file_logging() -> bool {
    false
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

// ---------------------------------------------------------------------------
// Security
// ---------------------------------------------------------------------------

pub fn default_cors_origins() -> String {
    "http://localhost:3000".to_string()
}

pub const fn default_require_metrics_auth() -> bool {
    false
}

pub const fn default_max_message_size() -> usize {
    16 * 1024
}

pub const fn default_max_connections_per_ip() -> usize {
    10
}
