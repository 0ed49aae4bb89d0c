//! Limits applied to client-supplied identifiers.

use super::defaults::{default_max_lobby_id_length, default_max_username_length};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Maximum length of a lobby id, in bytes
    #[serde(default = "default_max_lobby_id_length")]
    pub max_lobby_id_length: usize,
    /// Maximum length of a display name, in characters
    #[serde(default = "default_max_username_length")]
    pub max_username_length: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_lobby_id_length: default_max_lobby_id_length(),
            max_username_length: default_max_username_length(),
        }
    }
}
