mod test_helpers;

use std::time::Duration;
use test_helpers::{harness, next_event};
use turing_hunt_server::protocol::{GameEvent, PlayerKind, Sender, Winner};
use turing_hunt_server::server::stats::GameStats;
use uuid::Uuid;

/// P7: the record written on game over, parsed back, reproduces the final
/// roster, roles, and the complete message log.
#[tokio::test(start_paused = true)]
async fn stats_record_round_trips() {
    let h = harness();
    let code = h.server.create_room(1, 4).unwrap();
    let mut events = h.server.subscribe(&code).unwrap();
    // Drain the snapshot so only live events remain.
    next_event(&mut events).await;

    let player = h.server.join(&code, Uuid::new_v4()).unwrap();
    h.server
        .send_message(&code, player, "hello table, who seems off?")
        .unwrap();

    // Let the scheduler cycle finish, then run out the discussion timer.
    tokio::time::sleep(Duration::from_secs(6)).await;

    let target = h
        .server
        .get_room_info(&code)
        .unwrap()
        .players
        .iter()
        .map(|p| p.id)
        .find(|id| *id != player)
        .unwrap();
    h.server.vote(&code, player, target).await.unwrap();

    // Collect the chat log as subscribers saw it, up to termination.
    let mut observed: Vec<(String, String)> = Vec::new();
    loop {
        let envelope = events.recv().await.expect("stream closed early");
        match &envelope.event {
            GameEvent::Message { sender, text, .. } => {
                observed.push((sender.to_string(), text.clone()));
            }
            GameEvent::GameOver { winner, .. } => {
                assert_eq!(*winner, Winner::Humans);
            }
            GameEvent::RoomTerminated { .. } => break,
            _ => {}
        }
    }

    // Exactly one record lands in the stats directory.
    let entries: Vec<_> = std::fs::read_dir(h.stats_dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 1, "expected one stats file: {entries:?}");
    let file_name = entries[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.starts_with(&format!("{code}-")));
    assert!(file_name.ends_with(".json"));

    let raw = std::fs::read(&entries[0]).unwrap();
    let stats: GameStats = serde_json::from_slice(&raw).unwrap();

    // Metadata and roles.
    assert_eq!(stats.room_code, code);
    assert_eq!(stats.winner, Winner::Humans);
    assert_eq!(stats.rounds_played, 1);
    assert_eq!(stats.total_players, 4);
    assert_eq!(stats.players.len(), 4);
    assert_eq!(
        stats
            .players
            .iter()
            .filter(|p| p.kind == PlayerKind::Human)
            .count(),
        1
    );
    assert!(stats
        .players
        .iter()
        .filter(|p| p.kind == PlayerKind::Ai)
        .all(|p| p.persona.is_some()));
    assert!(stats
        .players
        .iter()
        .any(|p| p.id == target && p.eliminated));

    // The message log matches what subscribers observed, in order.
    let logged: Vec<(String, String)> = stats
        .messages
        .iter()
        .map(|m| (m.sender.to_string(), m.text.clone()))
        .collect();
    assert_eq!(logged, observed);
    assert!(logged
        .iter()
        .any(|(sender, text)| sender == &player.to_string()
            && text == "hello table, who seems off?"));
    assert!(matches!(
        stats.messages.first().map(|m| m.sender),
        Some(Sender::Player(_))
    ));

    // Ballots and totals for the single round.
    assert_eq!(stats.rounds.len(), 1);
    assert_eq!(stats.rounds[0].ballots.get(&player), Some(&target));
    assert_eq!(stats.rounds[0].totals.get(&target), Some(&1));
    assert_eq!(stats.rounds[0].eliminated, Some(target));

    // Serialize-parse-serialize is a fixed point.
    let reserialized = serde_json::to_value(&stats).unwrap();
    let original: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(reserialized, original);
}
