//! Stateless HTTP adapter for clients that cannot hold a socket open.
//!
//! Every request names its caller with `playerId` (except `joinLobby`, which
//! hands one out). Mutations go through the same [`LobbyServer`] handlers as
//! WebSocket frames, so socket subscribers of the lobby see them too.

use crate::lobby::{Departure, LobbyError};
use crate::protocol::{LobbyId, LobbySnapshot, UserId};
use crate::server::{ActionError, LobbyServer};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Body of `POST /api/lobby`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyActionRequest {
    pub action: String,
    #[serde(default)]
    pub lobby_id: Option<LobbyId>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub player_id: Option<UserId>,
    #[serde(default)]
    pub target_player_id: Option<UserId>,
    #[serde(default)]
    pub selected_players: Option<Vec<UserId>>,
    #[serde(default)]
    pub index: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyQuery {
    pub lobby_id: Option<LobbyId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JoinResponse {
    lobby: LobbySnapshot,
    player_id: UserId,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Lobby not found")
}

/// `GET /api/lobby?lobbyId=…`
pub async fn lobby_query_handler(
    State(server): State<Arc<LobbyServer>>,
    Query(query): Query<LobbyQuery>,
) -> Response {
    server.metrics.increment_polling_requests();
    let Some(lobby_id) = query.lobby_id else {
        return error_response(StatusCode::BAD_REQUEST, "lobbyId is required");
    };

    match server.registry().snapshot(&lobby_id).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(_) => not_found(),
    }
}

/// `POST /api/lobby`
pub async fn lobby_action_handler(
    State(server): State<Arc<LobbyServer>>,
    payload: Result<Json<LobbyActionRequest>, JsonRejection>,
) -> Response {
    server.metrics.increment_polling_requests();
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected polling request body");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let Some(lobby_id) = request.lobby_id.clone() else {
        return error_response(StatusCode::BAD_REQUEST, "lobbyId is required");
    };
    tracing::debug!(action = %request.action, %lobby_id, "Polling action");

    if request.action == "joinLobby" {
        return join(&server, &lobby_id, request).await;
    }

    let Some(player_id) = request.player_id else {
        // Rematch has no caller requirement.
        if request.action == "rematch" {
            let result = server.handle_rematch(Uuid::nil(), &lobby_id).await;
            return respond(&server, &lobby_id, result).await;
        }
        return error_response(StatusCode::BAD_REQUEST, "playerId is required");
    };

    let result = match request.action.as_str() {
        "toggleReady" => server.handle_toggle_ready(player_id, &lobby_id).await,
        "togglePlayerSelection" | "selectActivePlayer" => {
            let target = request.target_player_id.unwrap_or(player_id);
            server
                .handle_select_active_player(player_id, &lobby_id, target)
                .await
        }
        "startGame" => {
            server
                .handle_start_game(player_id, &lobby_id, request.selected_players)
                .await
        }
        "makeMove" => {
            let Some(index) = request.index else {
                return error_response(StatusCode::BAD_REQUEST, "index is required");
            };
            server.handle_make_move(player_id, &lobby_id, index).await
        }
        "rematch" => server.handle_rematch(player_id, &lobby_id).await,
        "leaveLobby" => {
            return match server.handle_leave_lobby(player_id, &lobby_id).await {
                Ok(Departure::Left(snapshot)) => Json(snapshot).into_response(),
                Ok(Departure::LobbyDeleted) => Json(LobbySnapshot::default()).into_response(),
                Ok(Departure::NotPresent) => {
                    respond(&server, &lobby_id, Err(LobbyError::NotAMember(player_id).into()))
                        .await
                }
                Err(err) => respond(&server, &lobby_id, Err(err)).await,
            };
        }
        _ => return error_response(StatusCode::BAD_REQUEST, "Invalid action"),
    };

    respond(&server, &lobby_id, result).await
}

async fn join(server: &LobbyServer, lobby_id: &str, request: LobbyActionRequest) -> Response {
    let Some(username) = request.username else {
        return error_response(StatusCode::BAD_REQUEST, "username is required");
    };
    // A known playerId rejoins as the same user.
    let player_id = request.player_id.unwrap_or_else(Uuid::new_v4);

    match server.handle_join_lobby(player_id, lobby_id, &username).await {
        Ok(lobby) => Json(JoinResponse { lobby, player_id }).into_response(),
        Err(err) => error_response(StatusCode::BAD_REQUEST, err.to_string()),
    }
}

/// Map an action result to a response. Silently rejected actions still
/// answer `200` with the unchanged lobby.
async fn respond(
    server: &LobbyServer,
    lobby_id: &str,
    result: Result<LobbySnapshot, ActionError>,
) -> Response {
    match result {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(ActionError::Lobby(LobbyError::LobbyNotFound(_))) => not_found(),
        Err(err) if err.is_silent() => {
            tracing::debug!(%lobby_id, error = %err, "Ignoring rejected polling action");
            match server.registry().snapshot(lobby_id).await {
                Ok(snapshot) => Json(snapshot).into_response(),
                Err(_) => not_found(),
            }
        }
        Err(err) => error_response(StatusCode::BAD_REQUEST, err.to_string()),
    }
}
