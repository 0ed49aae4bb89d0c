use serial_test::serial;
use std::env;
use std::fs;
use tempfile::tempdir;
use tictac_lobby_server::config::{self, LogFormat, LogLevel};

const SOURCE_VARS: &[&str] = &[
    "TICTAC_LOBBY_CONFIG_JSON",
    "TICTAC_LOBBY_CONFIG_STDIN",
    "TICTAC_LOBBY_CONFIG_PATH",
    "TICTAC_LOBBY__PORT",
    "TICTAC_LOBBY__PROTOCOL__MAX_USERNAME_LENGTH",
    "TICTAC_LOBBY__SECURITY__CORS_ORIGINS",
    "TICTAC_LOBBY__LOGGING__LEVEL",
];

fn clear_env() {
    for var in SOURCE_VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_without_sources() {
    clear_env();
    let cfg = config::load();
    assert_eq!(cfg.port, 3001);
    assert_eq!(cfg.server.bind_address, "0.0.0.0");
    assert!(cfg.server.enable_websocket);
    assert!(cfg.server.enable_polling_api);
    assert_eq!(cfg.security.cors_origins, "http://localhost:3000");
    assert_eq!(cfg.logging.format, LogFormat::Json);
}

#[test]
#[serial]
fn test_file_then_env_override_precedence() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("lobby.json");
    fs::write(
        &path,
        r#"{
            "port": 4100,
            "protocol": { "max_username_length": 12, "max_lobby_id_length": 20 },
            "logging": { "format": "text" }
        }"#,
    )
    .unwrap();

    env::set_var("TICTAC_LOBBY_CONFIG_PATH", &path);
    env::set_var("TICTAC_LOBBY__PROTOCOL__MAX_USERNAME_LENGTH", "8");
    env::set_var("TICTAC_LOBBY__LOGGING__LEVEL", "debug");

    let cfg = config::load();
    clear_env();

    assert_eq!(cfg.port, 4100);
    assert_eq!(cfg.protocol.max_username_length, 8);
    assert_eq!(cfg.protocol.max_lobby_id_length, 20);
    assert_eq!(cfg.logging.format, LogFormat::Text);
    assert_eq!(cfg.logging.level, Some(LogLevel::Debug));
}

#[test]
#[serial]
fn test_inline_json_beats_config_path() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("lobby.json");
    fs::write(&path, r#"{"port": 4100, "security": {"max_connections_per_ip": 3}}"#).unwrap();

    env::set_var("TICTAC_LOBBY_CONFIG_PATH", &path);
    env::set_var("TICTAC_LOBBY_CONFIG_JSON", r#"{"port": 4200}"#);
    let cfg = config::load();
    clear_env();

    assert_eq!(cfg.port, 4200);
    assert_eq!(cfg.security.max_connections_per_ip, 3);
}

#[test]
#[serial]
fn test_unparseable_sources_fall_back_to_defaults() {
    clear_env();
    env::set_var("TICTAC_LOBBY_CONFIG_JSON", "{ this is not json");
    env::set_var("TICTAC_LOBBY__LOGGING__LEVEL", "chatty");
    let cfg = config::load();
    clear_env();

    assert_eq!(cfg.port, 3001);
    assert_eq!(cfg.logging.level, None);
}

#[test]
#[serial]
fn test_cors_list_override_stays_a_string() {
    clear_env();
    env::set_var(
        "TICTAC_LOBBY__SECURITY__CORS_ORIGINS",
        "http://a.test,http://b.test",
    );
    let cfg = config::load();
    clear_env();

    assert_eq!(
        cfg.security.allowed_origins(),
        Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
    );
}

#[test]
fn test_load_from_file_is_strict() {
    let dir = tempdir().unwrap();

    let good = dir.path().join("good.json");
    fs::write(&good, r#"{"server": {"enable_polling_api": false}}"#).unwrap();
    let cfg = config::load_from_file(&good).unwrap();
    assert!(!cfg.server.enable_polling_api);
    assert!(cfg.server.enable_websocket);

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{").unwrap();
    let err = config::load_from_file(&broken).unwrap_err();
    assert!(err.to_string().contains("failed to parse config file"));

    let wrong_type = dir.path().join("wrong.json");
    fs::write(&wrong_type, r#"{"port": "eighty"}"#).unwrap();
    assert!(config::load_from_file(&wrong_type).is_err());

    assert!(config::load_from_file(&dir.path().join("missing.json")).is_err());
}

#[test]
fn test_validation_rejects_disabling_every_adapter() {
    let mut cfg = config::Config::default();
    cfg.server.enable_websocket = false;
    cfg.server.enable_polling_api = false;
    assert!(config::validate_config(&cfg).is_err());

    cfg.server.enable_polling_api = true;
    assert!(config::validate_config(&cfg).is_ok());
}
