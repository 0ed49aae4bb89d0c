//! Configuration validation functions.

use super::Config;
use std::env;

const MIN_MESSAGE_SIZE: usize = 256;
const MIN_RECOMMENDED_TOKEN_LEN: usize = 16;

/// Reject configurations the server cannot run with, and warn on risky ones.
pub fn validate_config(config: &Config) -> anyhow::Result<()> {
    if config.port == 0 {
        anyhow::bail!("port must be non-zero");
    }

    if !config.server.enable_websocket && !config.server.enable_polling_api {
        anyhow::bail!(
            "at least one of server.enable_websocket and server.enable_polling_api must be true"
        );
    }

    if config.server.outbound_queue_capacity == 0 {
        anyhow::bail!("server.outbound_queue_capacity must be at least 1");
    }

    if config.protocol.max_lobby_id_length == 0 || config.protocol.max_username_length == 0 {
        anyhow::bail!("protocol length limits must be at least 1");
    }

    if config.security.max_message_size < MIN_MESSAGE_SIZE {
        anyhow::bail!(
            "security.max_message_size must be at least {MIN_MESSAGE_SIZE} bytes, got {}",
            config.security.max_message_size
        );
    }

    if config.security.max_connections_per_ip == 0 {
        anyhow::bail!("security.max_connections_per_ip must be at least 1");
    }

    validate_metrics_auth(config)
}

fn validate_metrics_auth(config: &Config) -> anyhow::Result<()> {
    if config.security.require_metrics_auth {
        let token = config
            .security
            .metrics_auth_token
            .as_deref()
            .filter(|t| !t.is_empty());

        let Some(token) = token else {
            anyhow::bail!(
                "\nMetrics authentication is enabled but no token is configured.\n\
                 Configure a shared bearer token:\n\
                 export TICTAC_LOBBY__SECURITY__METRICS_AUTH_TOKEN=\"$(openssl rand -hex 32)\"\n\
                 or disable metrics auth:\n\
                 export TICTAC_LOBBY__SECURITY__REQUIRE_METRICS_AUTH=false\n"
            );
        };

        if token.len() < MIN_RECOMMENDED_TOKEN_LEN {
            eprintln!(
                "WARNING: metrics auth token is very short ({} chars); use at least 32.",
                token.len()
            );
        }
    } else if is_production_mode() {
        eprintln!(
            "SECURITY WARNING: /metrics is publicly accessible in production.\n\
             Set TICTAC_LOBBY__SECURITY__REQUIRE_METRICS_AUTH=true and a token."
        );
    }

    Ok(())
}

/// Production is signalled by `TICTAC_LOBBY__ENVIRONMENT=production` or a bare
/// `PRODUCTION` variable.
pub fn is_production_mode() -> bool {
    if let Ok(mode) = env::var("TICTAC_LOBBY__ENVIRONMENT") {
        return mode.eq_ignore_ascii_case("production") || mode.eq_ignore_ascii_case("prod");
    }
    env::var("PRODUCTION").is_ok()
}
