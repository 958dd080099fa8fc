mod test_helpers;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use test_helpers::{fast_config, harness_with, wait_for};
use tokio::sync::Barrier;
use turing_hunt_server::config::GameConfig;
use turing_hunt_server::llm::ScriptedClient;
use turing_hunt_server::protocol::{GameError, GameEvent, Phase, PlayerId};
use uuid::Uuid;

/// Config that flips to voting as soon as every human has spoken, so
/// multi-threaded tests reach the voting phase without waiting out timers.
fn all_spoken_config() -> GameConfig {
    GameConfig {
        end_discussion_when_all_spoken: true,
        min_discussion_seconds: 0,
        ..fast_config()
    }
}

/// Racing joins: seats are a permutation, never duplicated, and exactly
/// `max_humans` joins succeed.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_joins_assign_unique_seats() {
    let h = harness_with(fast_config(), Arc::new(ScriptedClient::new()));
    let code = h.server.create_room(4, 8).unwrap();

    let attempts = 8usize;
    let barrier = Arc::new(Barrier::new(attempts));
    let mut handles = Vec::new();
    for _ in 0..attempts {
        let server = Arc::clone(&h.server);
        let code = code.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            server.join(&code, Uuid::new_v4())
        }));
    }

    let mut seats: Vec<PlayerId> = Vec::new();
    let mut rejections = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(seat) => seats.push(seat),
            Err(GameError::RoomFull | GameError::AlreadyStarted) => rejections += 1,
            Err(other) => panic!("unexpected join error: {other:?}"),
        }
    }

    assert_eq!(seats.len(), 4, "exactly max_humans joins may succeed");
    assert_eq!(rejections, 4);
    let distinct: HashSet<_> = seats.iter().collect();
    assert_eq!(distinct.len(), seats.len(), "duplicate seat numbers: {seats:?}");
    for seat in &seats {
        assert!((1..=8).contains(&seat.number()));
    }
}

/// Racing ballots from every seat: exactly one elimination, and repeat
/// ballots from the same voter are rejected.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_votes_produce_one_elimination() {
    let h = harness_with(all_spoken_config(), Arc::new(ScriptedClient::failing()));
    let code = h.server.create_room(4, 6).unwrap();
    let players: Vec<PlayerId> = (0..4)
        .map(|_| h.server.join(&code, Uuid::new_v4()).unwrap())
        .collect();
    let mut events = h.server.subscribe(&code).unwrap();

    // Everyone speaks once; the last message flips the room to voting.
    for player in &players {
        h.server.send_message(&code, *player, "checking in").unwrap();
    }
    assert_eq!(h.server.get_room_info(&code).unwrap().phase, Phase::Voting);

    // All four humans vote for the same target at once, each submitting
    // the ballot twice.
    let target = players[0];
    let barrier = Arc::new(Barrier::new(6));
    let mut handles = Vec::new();
    for voter in &players[1..] {
        for _ in 0..2 {
            let server = Arc::clone(&h.server);
            let code = code.clone();
            let barrier = Arc::clone(&barrier);
            let voter = *voter;
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                server.vote(&code, voter, target).await
            }));
        }
    }

    let mut ok = 0;
    let mut already_voted = 0;
    let mut other = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => ok += 1,
            Err(GameError::AlreadyVoted) => already_voted += 1,
            // A duplicate landing after the last needed ballot concluded
            // the round sees the phase already moved on.
            Err(GameError::PhaseMismatch { .. } | GameError::Terminated | GameError::NotFound) => {
                other += 1
            }
            Err(error) => panic!("unexpected vote error: {error:?}"),
        }
    }
    assert_eq!(ok, 3, "each voter lands exactly one ballot");
    assert_eq!(already_voted + other, 3);

    let mut eliminations = 0;
    loop {
        let envelope = wait_for(&mut events, |e| {
            matches!(
                e,
                GameEvent::Elimination { .. } | GameEvent::RoomTerminated { .. }
            )
        })
        .await;
        match envelope.event {
            GameEvent::Elimination { player_id, .. } => {
                eliminations += 1;
                assert_eq!(player_id, target);
            }
            GameEvent::RoomTerminated { .. } => break,
            _ => unreachable!(),
        }
    }
    assert_eq!(eliminations, 1, "exactly one elimination per round");
}

/// Message ingress stays responsive while agent generations are slow.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn operations_do_not_block_on_generation() {
    let llm = Arc::new(ScriptedClient::new().with_delay(Duration::from_millis(200)));
    let h = harness_with(fast_config(), llm);
    let code = h.server.create_room(1, 6).unwrap();
    let player = h.server.join(&code, Uuid::new_v4()).unwrap();

    h.server.send_message(&code, player, "kick things off").unwrap();

    // While five agents sit in 200ms probes/generations, state reads and
    // writes return immediately.
    let started = std::time::Instant::now();
    for i in 0..10 {
        h.server
            .send_message(&code, player, &format!("quick message {i}"))
            .unwrap();
        let _ = h.server.get_room_info(&code).unwrap();
    }
    assert!(
        started.elapsed() < Duration::from_millis(100),
        "operations must not wait behind LLM latency, took {:?}",
        started.elapsed()
    );
}
