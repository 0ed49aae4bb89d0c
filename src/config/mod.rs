//! Configuration for the lobby server.
//!
//! Settings come from JSON documents (env var, stdin or file) layered over
//! compiled-in defaults, with per-field `TICTAC_LOBBY__*` environment overrides.
//!
//! - [`crate::config::types`]: root `Config`
//! - [`server`]: listener and delivery adapters
//! - [`protocol`]: identifier limits
//! - [`security`]: CORS, frame size, connection caps, metrics auth
//! - [`logging`]: log level, format and file output
//! - [`crate::config::loader`]: source precedence and env overrides
//! - [`crate::config::validation`]: startup checks

pub mod defaults;
pub mod loader;
pub mod logging;
pub mod protocol;
pub mod security;
pub mod server;
pub mod types;
pub mod validation;

pub use loader::{load, load_from_file};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use protocol::ProtocolConfig;
pub use security::SecurityConfig;
pub use server::ServerConfig;
pub use types::Config;
pub use validation::{is_production_mode, validate_config};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();

        assert_eq!(config.port, 3001);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.outbound_queue_capacity, 64);
        assert!(config.server.enable_websocket);
        assert!(config.server.enable_polling_api);

        assert_eq!(config.protocol.max_lobby_id_length, 64);
        assert_eq!(config.protocol.max_username_length, 32);

        assert_eq!(config.security.cors_origins, "http://localhost:3000");
        assert!(!config.security.require_metrics_auth);
        assert_eq!(config.security.max_message_size, 16 * 1024);
        assert_eq!(config.security.max_connections_per_ip, 10);

        assert_eq!(config.logging.dir, "logs");
        assert_eq!(config.logging.filename, "tictac-lobby.log");
        assert_eq!(config.logging.rotation, "daily");
        assert_eq!(config.logging.level, None);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"port": 9000, "protocol": {"max_username_length": 8}}"#)
                .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.protocol.max_username_length, 8);
        assert_eq!(config.protocol.max_lobby_id_length, 64);
        assert_eq!(config.server.outbound_queue_capacity, 64);
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!(" err ".parse::<LogLevel>(), Ok(LogLevel::Error));
        assert!("verbose".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Trace.to_string(), "trace");
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_unset() {
        let logging: LoggingConfig = serde_json::from_str(r#"{"level": "loud"}"#).unwrap();
        assert_eq!(logging.level, None);

        let logging: LoggingConfig = serde_json::from_str(r#"{"level": "Debug"}"#).unwrap();
        assert_eq!(logging.level, Some(LogLevel::Debug));
    }

    #[test]
    fn test_wildcard_cors_allows_any_origin() {
        let security = SecurityConfig {
            cors_origins: "*".into(),
            ..SecurityConfig::default()
        };
        assert_eq!(security.allowed_origins(), None);
        assert_eq!(
            SecurityConfig::default().allowed_origins(),
            Some(vec!["http://localhost:3000".to_string()])
        );
    }
}
