use crate::metrics::MetricsSnapshot;
use crate::server::LobbyServer;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use std::sync::Arc;

fn enforce_metrics_auth(headers: &HeaderMap, server: &LobbyServer) -> Result<(), StatusCode> {
    let Some(raw_header) = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    else {
        tracing::warn!("Unauthorized metrics access attempt: missing Authorization header");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let Some(token) = raw_header.strip_prefix("Bearer ") else {
        tracing::warn!("Unauthorized metrics access attempt: invalid Authorization scheme");
        return Err(StatusCode::UNAUTHORIZED);
    };

    if let Some(expected) = server.config().metrics_auth_token.as_deref() {
        if token == expected {
            tracing::debug!("Metrics access authorized via bearer token");
            return Ok(());
        }
    }

    tracing::warn!("Unauthorized metrics access attempt: token rejected");
    Err(StatusCode::UNAUTHORIZED)
}

/// Counter snapshot as JSON. Requires `Authorization: Bearer <token>` when
/// metrics auth is enabled.
pub async fn metrics_handler(
    headers: HeaderMap,
    State(server): State<Arc<LobbyServer>>,
) -> Result<Json<MetricsSnapshot>, StatusCode> {
    if server.config().require_metrics_auth {
        enforce_metrics_auth(&headers, server.as_ref())?;
    }
    Ok(Json(server.metrics_snapshot()))
}
