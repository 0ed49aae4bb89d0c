//! Security configuration.

use super::defaults::{
    default_cors_origins, default_max_connections_per_ip, default_max_message_size,
    default_require_metrics_auth,
};
use serde::{Deserialize, Serialize};

/// Security configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SecurityConfig {
    /// Allowed CORS origins, comma separated, or `*` for any
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
    /// Require a bearer token for the `/metrics` endpoint
    #[serde(default = "default_require_metrics_auth")]
    pub require_metrics_auth: bool,
    /// Shared bearer token for `/metrics`
    #[serde(default)]
    pub metrics_auth_token: Option<String>,
    /// Largest accepted inbound WebSocket frame, in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Concurrent WebSocket connections allowed from one IP address
    #[serde(default = "default_max_connections_per_ip")]
    pub max_connections_per_ip: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_origins: default_cors_origins(),
            require_metrics_auth: default_require_metrics_auth(),
            metrics_auth_token: None,
            max_message_size: default_max_message_size(),
            max_connections_per_ip: default_max_connections_per_ip(),
        }
    }
}

impl SecurityConfig {
    /// Origins from [`Self::cors_origins`], or `None` when any origin is allowed.
    pub fn allowed_origins(&self) -> Option<Vec<String>> {
        let trimmed = self.cors_origins.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return None;
        }
        Some(
            trimmed
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(ToString::to_string)
                .collect(),
        )
    }
}
