use super::{Departure, LobbyError, LobbyRegistry};
use crate::game::{MoveRecord, MoveRejection, Symbol};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

async fn started_game(registry: &LobbyRegistry) -> (Uuid, Uuid) {
    let (_, alice) = registry.join_lobby("abc", "alice").await;
    let (_, bob) = registry.join_lobby("abc", "bob").await;
    registry.start_game("abc", alice, Some([alice, bob])).await.unwrap();
    (alice, bob)
}

#[tokio::test]
async fn join_creates_lobby_and_assigns_owner() {
    let registry = LobbyRegistry::new();
    let (snapshot, alice) = registry.join_lobby("abc", "alice").await;

    assert_eq!(registry.lobby_count(), 1);
    assert_eq!(snapshot.owner, Some(alice));
    assert_eq!(snapshot.users.len(), 1);
    assert_eq!(snapshot.users[0].username, "alice");
    assert!(!snapshot.users[0].is_ready);
}

#[tokio::test]
async fn join_as_reports_creation_and_deduplicates() {
    let registry = LobbyRegistry::new();
    let id = Uuid::new_v4();

    let first = registry.join_lobby_as("abc", id, "alice").await;
    assert!(first.created);
    assert!(first.joined);

    let again = registry.join_lobby_as("abc", id, "alice").await;
    assert!(!again.created);
    assert!(!again.joined);
    assert_eq!(again.snapshot, first.snapshot);
}

#[tokio::test]
async fn operations_on_unknown_lobby_report_not_found() {
    let registry = LobbyRegistry::new();
    let someone = Uuid::new_v4();
    let missing = LobbyError::LobbyNotFound("nope".to_string());

    assert_eq!(registry.snapshot("nope").await, Err(missing.clone()));
    assert_eq!(registry.toggle_ready("nope", someone).await, Err(missing.clone()));
    assert_eq!(registry.rematch("nope").await, Err(missing.clone()));
    assert_eq!(
        registry.make_move("nope", someone, 0).await.map(|_| ()),
        Err(missing.clone())
    );
    assert_eq!(registry.remove_participant("nope", someone).await, Err(missing));
    assert_eq!(registry.lobby_count(), 0);
}

#[tokio::test]
async fn sliding_window_scenario() {
    let registry = LobbyRegistry::new();
    let (alice, bob) = started_game(&registry).await;

    let script = [
        (alice, 4),
        (bob, 0),
        (alice, 1),
        (bob, 3),
        (alice, 8),
        (bob, 5),
    ];
    for (user, index) in script {
        registry.make_move("abc", user, index).await.unwrap();
    }

    let (snapshot, applied) = registry.make_move("abc", alice, 2).await.unwrap();
    assert_eq!(applied.evicted, Some(4));

    let game = snapshot.game_state.unwrap();
    assert_eq!(game.board()[4], None);
    assert_eq!(game.winner(), None);
    let x_moves: Vec<usize> = game
        .move_history()
        .iter()
        .filter(|record| record.player == Symbol::X)
        .map(|record| record.index)
        .collect();
    assert_eq!(x_moves, [1, 8, 2]);
}

#[tokio::test]
async fn early_win_freezes_further_moves() {
    let registry = LobbyRegistry::new();
    let (alice, bob) = started_game(&registry).await;

    for (user, index) in [(alice, 0), (bob, 3), (alice, 1), (bob, 4), (alice, 2)] {
        registry.make_move("abc", user, index).await.unwrap();
    }
    let before = registry.snapshot("abc").await.unwrap();
    assert_eq!(before.game_state.as_ref().unwrap().winner(), Some(Symbol::X));
    assert!(before.game_in_progress);

    let rejected = registry.make_move("abc", bob, 5).await;
    assert_eq!(
        rejected.map(|_| ()),
        Err(LobbyError::InvalidMove(MoveRejection::GameOver {
            winner: Symbol::X
        }))
    );
    assert_eq!(registry.snapshot("abc").await.unwrap(), before);
}

#[tokio::test]
async fn spectators_cannot_move() {
    let registry = LobbyRegistry::new();
    started_game(&registry).await;
    let (snapshot, carol) = registry.join_lobby("abc", "carol").await;
    assert_eq!(snapshot.spectators.len(), 1);

    let result = registry.make_move("abc", carol, 4).await;
    assert_eq!(result.map(|_| ()), Err(LobbyError::NotAPlayer(carol)));
}

#[tokio::test]
async fn former_player_rejoining_mid_game_cannot_move() {
    let registry = LobbyRegistry::new();
    let (alice, bob) = started_game(&registry).await;
    let (_, carol) = registry.join_lobby("abc", "carol").await;

    let departure = registry.remove_participant("abc", alice).await.unwrap();
    assert!(matches!(departure, Departure::Left(_)));
    let rejoined = registry.join_lobby_as("abc", alice, "alice").await;
    assert!(rejoined.joined);
    assert!(rejoined.snapshot.spectators.iter().any(|user| user.id == alice));
    assert!(rejoined.snapshot.active_players.iter().all(|user| user.id != alice));

    // X's seat is vacant; neither the returning player nor an old spectator takes it.
    for user in [alice, carol] {
        let result = registry.make_move("abc", user, 4).await;
        assert_eq!(result.map(|_| ()), Err(LobbyError::NotAPlayer(user)));
    }
    let rejected = registry.make_move("abc", bob, 4).await;
    assert!(matches!(
        rejected,
        Err(LobbyError::InvalidMove(MoveRejection::NotYourTurn { .. }))
    ));

    let snapshot = registry.snapshot("abc").await.unwrap();
    assert!(snapshot.game_state.unwrap().move_history().is_empty());
}

#[tokio::test]
async fn rematch_and_restart_reassign_symbols() {
    let registry = LobbyRegistry::new();
    let (alice, bob) = started_game(&registry).await;
    registry.make_move("abc", alice, 4).await.unwrap();

    let reset = registry.rematch("abc").await.unwrap();
    assert!(!reset.game_in_progress);
    assert!(reset.game_state.is_none());

    registry.select_active_player("abc", alice, bob).await.unwrap();
    registry.select_active_player("abc", alice, alice).await.unwrap();
    let restarted = registry.start_game("abc", alice, None).await.unwrap();
    assert_eq!(restarted.active_players[0].id, bob);
    assert_eq!(restarted.active_players[1].id, alice);

    // bob is X now and moves first.
    registry.make_move("abc", bob, 0).await.unwrap();
    let (snapshot, _) = registry.make_move("abc", alice, 1).await.unwrap();
    assert_eq!(
        snapshot.game_state.unwrap().move_history(),
        &[
            MoveRecord {
                player: Symbol::X,
                index: 0
            },
            MoveRecord {
                player: Symbol::O,
                index: 1
            },
        ]
    );
}

#[tokio::test]
async fn owner_leaving_transfers_and_last_leaving_deletes() {
    let registry = LobbyRegistry::new();
    let (_, alice) = registry.join_lobby("abc", "alice").await;
    let (_, bob) = registry.join_lobby("abc", "bob").await;

    match registry.remove_participant("abc", alice).await.unwrap() {
        Departure::Left(snapshot) => {
            assert_eq!(snapshot.owner, Some(bob));
            assert_eq!(snapshot.users.len(), 1);
        }
        other => panic!("expected Left, got {other:?}"),
    }
    assert_eq!(
        registry.remove_participant("abc", alice).await,
        Ok(Departure::NotPresent)
    );
    assert_eq!(
        registry.remove_participant("abc", bob).await,
        Ok(Departure::LobbyDeleted)
    );
    assert_eq!(registry.lobby_count(), 0);
    assert!(registry.snapshot("abc").await.is_err());

    // The id is free to be reused by a fresh lobby.
    let (snapshot, carol) = registry.join_lobby("abc", "carol").await;
    assert_eq!(snapshot.owner, Some(carol));
    assert_eq!(snapshot.users.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_joins_are_all_recorded_once() {
    let registry = Arc::new(LobbyRegistry::new());

    let tasks: Vec<_> = (0..64)
        .map(|n| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                registry
                    .join_lobby(&format!("lobby-{}", n % 4), &format!("user-{n}"))
                    .await
                    .1
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for task in tasks {
        ids.insert(task.await.unwrap());
    }
    assert_eq!(ids.len(), 64);
    assert_eq!(registry.lobby_count(), 4);

    for n in 0..4 {
        let snapshot = registry.snapshot(&format!("lobby-{n}")).await.unwrap();
        assert_eq!(snapshot.users.len(), 16);
        let unique: HashSet<_> = snapshot.users.iter().map(|user| user.id).collect();
        assert_eq!(unique.len(), 16);
        assert!(snapshot.owner.is_some());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn joins_racing_with_deletion_never_land_in_a_dropped_lobby() {
    let registry = Arc::new(LobbyRegistry::new());

    for round in 0..50 {
        let (_, leaver) = registry.join_lobby("race", "leaver").await;

        let leave = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.remove_participant("race", leaver).await })
        };
        let join = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.join_lobby("race", &format!("joiner-{round}")).await })
        };

        leave.await.unwrap().unwrap();
        let (_, joiner) = join.await.unwrap();

        // Whatever the interleaving, the joiner is visible in the live lobby.
        let snapshot = registry.snapshot("race").await.unwrap();
        assert!(snapshot.user(&joiner).is_some());
        assert!(snapshot.user(&leaver).is_none());
        assert_eq!(snapshot.owner, Some(joiner));

        registry.remove_participant("race", joiner).await.unwrap();
        assert_eq!(registry.lobby_count(), 0);
    }
}
