
use axum_test::TestServer;
use serde_json::{json, Value};
use test_helpers::*;

fn polling_client() -> TestServer {
    TestServer::new(test_router(create_test_server())).expect("test server should start")
}

async fn post(client: &TestServer, body: Value) -> axum_test::TestResponse {
    client.post("/api/lobby").json(&body).await
}

async fn join(client: &TestServer, lobby_id: &str, username: &str) -> String {
    let response = post(
        client,
        json!({"action": "joinLobby", "lobbyId": lobby_id, "username": username}),
    )
    .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["playerId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_join_returns_lobby_and_player_id() {
    let client = polling_client();
    let response = post(
        &client,
        json!({"action": "joinLobby", "lobbyId": "abc", "username": "alice"}),
    )
    .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let player_id = body["playerId"].as_str().unwrap();
    assert_eq!(body["lobby"]["owner"], player_id);
    assert_eq!(body["lobby"]["users"][0]["username"], "alice");
    assert_eq!(body["lobby"]["gameInProgress"], false);

    let fetched: Value = client
        .get("/api/lobby")
        .add_query_param("lobbyId", "abc")
        .await
        .json();
    assert_eq!(fetched, body["lobby"]);
}

#[tokio::test]
async fn test_full_game_over_polling() {
    let client = polling_client();
    let alice = join(&client, "abc", "alice").await;
    let bob = join(&client, "abc", "bob").await;

    for target in [&alice, &bob] {
        post(
            &client,
            json!({"action": "togglePlayerSelection", "lobbyId": "abc",
                   "playerId": alice, "targetPlayerId": target}),
        )
        .await
        .assert_status_ok();
    }

    let started: Value = post(
        &client,
        json!({"action": "startGame", "lobbyId": "abc", "playerId": alice}),
    )
    .await
    .json();
    assert_eq!(started["gameInProgress"], true);
    assert_eq!(started["activePlayers"][0]["id"], alice);
    assert_eq!(started["gameState"]["currentPlayer"], "X");

    // X takes the left column.
    let mut last = Value::Null;
    for (player, index) in [(&alice, 0), (&bob, 1), (&alice, 3), (&bob, 2), (&alice, 6)] {
        last = post(
            &client,
            json!({"action": "makeMove", "lobbyId": "abc", "playerId": player, "index": index}),
        )
        .await
        .json();
    }
    assert_eq!(last["gameState"]["winner"], "X");
    assert_eq!(last["gameState"]["board"][6], "X");

    let reset: Value = post(&client, json!({"action": "rematch", "lobbyId": "abc"}))
        .await
        .json();
    assert_eq!(reset["gameInProgress"], false);
    assert!(reset["gameState"].is_null());
    assert_eq!(reset["activePlayers"], json!([]));
}

#[tokio::test]
async fn test_ignored_actions_return_current_lobby() {
    let client = polling_client();
    let alice = join(&client, "abc", "alice").await;
    let bob = join(&client, "abc", "bob").await;

    // Only the owner may start a game.
    let response = post(
        &client,
        json!({"action": "startGame", "lobbyId": "abc", "playerId": bob,
               "selectedPlayers": [alice, bob]}),
    )
    .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["gameInProgress"], false);

    // No game yet, so no move.
    let body: Value = post(
        &client,
        json!({"action": "makeMove", "lobbyId": "abc", "playerId": alice, "index": 0}),
    )
    .await
    .json();
    assert!(body["gameState"].is_null());
}

#[tokio::test]
async fn test_bad_requests_are_rejected() {
    let client = polling_client();
    let alice = join(&client, "abc", "alice").await;

    let response = post(&client, json!({"action": "teleport", "lobbyId": "abc", "playerId": alice})).await;
    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"], "Invalid action");

    post(&client, json!({"action": "toggleReady", "lobbyId": "abc"}))
        .await
        .assert_status_bad_request();

    post(
        &client,
        json!({"action": "joinLobby", "lobbyId": "has space", "username": "x"}),
    )
    .await
    .assert_status_bad_request();

    client
        .post("/api/lobby")
        .text("{not json")
        .content_type("application/json")
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_unknown_lobby_is_not_found() {
    let client = polling_client();

    let response = client
        .get("/api/lobby")
        .add_query_param("lobbyId", "missing")
        .await;
    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["error"], "Lobby not found");

    let player = uuid::Uuid::new_v4();
    post(
        &client,
        json!({"action": "toggleReady", "lobbyId": "missing", "playerId": player}),
    )
    .await
    .assert_status_not_found();
}

#[tokio::test]
async fn test_leaving_last_user_deletes_lobby() {
    let client = polling_client();
    let alice = join(&client, "abc", "alice").await;
    let bob = join(&client, "abc", "bob").await;

    let body: Value = post(
        &client,
        json!({"action": "leaveLobby", "lobbyId": "abc", "playerId": alice}),
    )
    .await
    .json();
    assert_eq!(body["owner"], bob);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);

    let body: Value = post(
        &client,
        json!({"action": "leaveLobby", "lobbyId": "abc", "playerId": bob}),
    )
    .await
    .json();
    assert_eq!(body["users"], json!([]));

    client
        .get("/api/lobby")
        .add_query_param("lobbyId", "abc")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_rejoin_with_known_player_id_keeps_identity() {
    let client = polling_client();
    let alice = join(&client, "abc", "alice").await;

    let body: Value = post(
        &client,
        json!({"action": "joinLobby", "lobbyId": "abc", "username": "alice", "playerId": alice}),
    )
    .await
    .json();
    assert_eq!(body["playerId"], alice);
    assert_eq!(body["lobby"]["users"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_player_who_leaves_and_rejoins_mid_game_cannot_move() {
    let client = polling_client();
    let alice = join(&client, "abc", "alice").await;
    let bob = join(&client, "abc", "bob").await;
    post(
        &client,
        json!({"action": "startGame", "lobbyId": "abc", "playerId": alice,
               "selectedPlayers": [alice, bob]}),
    )
    .await
    .assert_status_ok();

    post(
        &client,
        json!({"action": "leaveLobby", "lobbyId": "abc", "playerId": alice}),
    )
    .await
    .assert_status_ok();
    let rejoined: Value = post(
        &client,
        json!({"action": "joinLobby", "lobbyId": "abc", "username": "alice", "playerId": alice}),
    )
    .await
    .json();
    assert_eq!(rejoined["lobby"]["spectators"][0]["id"], alice);
    assert_eq!(rejoined["lobby"]["activePlayers"].as_array().unwrap().len(), 1);

    let response = post(
        &client,
        json!({"action": "makeMove", "lobbyId": "abc", "playerId": alice, "index": 4}),
    )
    .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["gameState"]["board"][4].is_null());
    assert_eq!(body["gameState"]["currentPlayer"], "X");
}

#[tokio::test]
async fn test_metrics_count_polling_requests() {
    let client = polling_client();
    join(&client, "abc", "alice").await;
    client
        .get("/api/lobby")
        .add_query_param("lobbyId", "abc")
        .await
        .assert_status_ok();

    let metrics: Value = client.get("/metrics").await.json();
    assert_eq!(metrics["polling_requests"], 2);
    assert_eq!(metrics["lobbies"]["lobbies_created"], 1);
    assert_eq!(metrics["lobbies"]["active_lobbies"], 1);
}
