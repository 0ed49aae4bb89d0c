use crate::config::SecurityConfig;
use crate::server::LobbyServer;
use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handler::websocket_handler;
use super::metrics::metrics_handler;
use super::polling::{lobby_action_handler, lobby_query_handler};

const ROOT_TEXT: &str = "Tic-tac-toe lobby server. Endpoints: GET /ws (WebSocket), \
GET|POST /api/lobby (polling), GET /health, GET /metrics";

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let Some(configured) = security.allowed_origins() else {
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = configured
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("No valid CORS origins configured, using permissive CORS");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Build the HTTP surface for `server`. Each delivery adapter is mounted only
/// when enabled in the server config.
pub fn create_router(server: Arc<LobbyServer>, security: &SecurityConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler));

    if server.config().enable_websocket {
        router = router.route("/ws", get(websocket_handler));
    }
    if server.config().enable_polling_api {
        router = router.route(
            "/api/lobby",
            get(lobby_query_handler).post(lobby_action_handler),
        );
    }

    router
        .fallback(fallback)
        .layer(cors_layer(security))
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn fallback() -> &'static str {
    ROOT_TEXT
}

/// Bind `addr` and serve until the listener fails.
pub async fn run_server(
    addr: SocketAddr,
    server: Arc<LobbyServer>,
    security: &SecurityConfig,
) -> anyhow::Result<()> {
    let app = create_router(server, security);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Starting lobby server");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
