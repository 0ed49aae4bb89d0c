#![cfg_attr(not(test), deny(clippy::panic))]

use clap::Parser;
use std::net::SocketAddr;
use tictac_lobby_server::config;
use tictac_lobby_server::logging;
use tictac_lobby_server::server::{LobbyServer, ServerConfig};
use tictac_lobby_server::websocket;

/// In-memory lobby and game session server for fading tic-tac-toe
#[derive(Parser, Debug)]
#[command(name = "tictac-lobby-server")]
#[command(about = "An in-memory lobby and game session server for fading tic-tac-toe")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines and pre-deployment checks.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    /// Useful for debugging configuration loading from multiple sources.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load();

    if cli.print_config {
        let json = serde_json::to_string_pretty(&cfg)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    // load() only reports problems on stderr; here they decide the exit code.
    let validation_result = config::validate_config(&cfg);

    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Listen: {}:{}", cfg.server.bind_address, cfg.port);
                println!("  WebSocket adapter: {}", cfg.server.enable_websocket);
                println!("  Polling adapter: {}", cfg.server.enable_polling_api);
                println!("  CORS origins: {}", cfg.security.cors_origins);
                println!(
                    "  Metrics auth required: {}",
                    cfg.security.require_metrics_auth
                );
                println!(
                    "  Max connections per IP: {}",
                    cfg.security.max_connections_per_ip
                );
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    validation_result?;

    // Dropping the guard stops the file writer, so it lives as long as main.
    let _log_guard = logging::init_with_config(&cfg.logging);

    let addr: SocketAddr = format!("{}:{}", cfg.server.bind_address, cfg.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address {}: {e}", cfg.server.bind_address))?;

    let server = LobbyServer::new(ServerConfig::from_config(&cfg), cfg.protocol.clone());
    tracing::info!(
        %addr,
        cors_origins = %cfg.security.cors_origins,
        websocket = cfg.server.enable_websocket,
        polling = cfg.server.enable_polling_api,
        production = config::is_production_mode(),
        "Configuration loaded"
    );

    websocket::run_server(addr, server, &cfg.security).await
}
