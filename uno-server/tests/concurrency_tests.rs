
use std::sync::Arc;

use futures::future::join_all;
use uno_persistence::GameStore;
use uno_types::{ErrorKind, GameStatus};
use test_helpers::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_draws_take_exactly_one_turn() {
    let server = TestServer::new();
    let (game_id, tokens) = server.started(&["Alice", "Bob"]).await;
    let alice = Arc::new(tokens[0].clone());

    let attempts: Vec<_> = (0..16)
        .map(|_| {
            let session = server.session.clone();
            let token = alice.clone();
            tokio::spawn(async move { session.draw(&token).await })
        })
        .collect();

    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    for failure in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(
            failure.kind(),
            ErrorKind::NotYourTurn | ErrorKind::Busy
        ));
    }

    let view = server.session.poll(&tokens[0]).await.unwrap();
    assert_eq!(view.hand.len(), 8);
    assert!(!view.is_viewer_turn());

    let game = server.engine.store().read_game(game_id).await.unwrap();
    assert_eq!(game.total_cards(), 108);
    game.check_invariants().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_keep_one_host() {
    let server = TestServer::new();
    let game_id = server.session.create_game().await.unwrap().game_id;

    let joins: Vec<_> = (0..10)
        .map(|i| {
            let session = server.session.clone();
            tokio::spawn(async move {
                session
                    .join(game_id, &format!("Player{}", i), None)
                    .await
            })
        })
        .collect();

    let mut hosts = 0;
    for result in join_all(joins).await {
        let joined = result.unwrap().unwrap();
        if server.tokens.verify(&joined.token).unwrap().is_host {
            hosts += 1;
        }
    }
    assert_eq!(hosts, 1);

    let game = server.engine.store().read_game(game_id).await.unwrap();
    assert_eq!(game.players.len(), 10);
    assert_eq!(game.status, GameStatus::Created);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_separate_games_progress_independently() {
    let server = TestServer::new();
    let (_, first) = server.started(&["Alice", "Bob"]).await;
    let (_, second) = server.started(&["Carol", "Dave"]).await;

    let (a, b) = tokio::join!(
        server.session.draw(&first[0]),
        server.session.draw(&second[0])
    );
    assert_eq!(a.unwrap().hand.len(), 8);
    assert_eq!(b.unwrap().hand.len(), 8);
    assert_eq!(server.engine.active_games_count(), 2);
}
