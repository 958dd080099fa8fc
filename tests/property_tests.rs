use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use turing_hunt_server::config::GameConfig;
use turing_hunt_server::llm::ScriptedClient;
use turing_hunt_server::protocol::PlayerId;
use turing_hunt_server::room::Room;
use turing_hunt_server::server::voting::tally_votes;

fn test_room(max_humans: u8, total_players: u8) -> Room {
    Room::new(
        "PROPTS".to_string(),
        max_humans,
        total_players,
        &GameConfig::default(),
        Arc::new(ScriptedClient::new()),
    )
}

proptest! {
    /// P1: under any join/leave sequence, seat numbers held by players
    /// plus the free pool always form exactly the permutation 1..=total.
    #[test]
    fn seat_numbers_stay_a_permutation(
        total in 2u8..=12,
        humans in 1u8..=4,
        ops in proptest::collection::vec(any::<bool>(), 0..40),
    ) {
        let max_humans = humans.min(total);
        let room = test_room(max_humans, total);
        let mut state = room.lock_state();
        let mut seated: Vec<PlayerId> = Vec::new();

        for join in ops {
            if join {
                if let Ok(id) = state.claim_seat(Uuid::new_v4()) {
                    seated.push(id);
                }
            } else if let Some(id) = seated.pop() {
                state.release_seat(id);
            }

            let mut numbers: Vec<u8> = state
                .players
                .iter()
                .map(|p| p.id.number())
                .chain(state.available_numbers.iter().copied())
                .collect();
            numbers.sort_unstable();
            prop_assert_eq!(numbers, (1..=total).collect::<Vec<u8>>());

            prop_assert!(state.seated_human_count() <= usize::from(max_humans));
        }
    }

    /// P3 + tie-break: the eliminated seat always carries the maximum
    /// vote count, and no tied seat has a smaller number.
    #[test]
    fn tally_picks_a_maximum_with_smallest_seat_tiebreak(
        raw in proptest::collection::btree_map(1u8..=12, 1u8..=12, 0..12),
    ) {
        let votes: HashMap<PlayerId, PlayerId> = raw
            .into_iter()
            .filter(|(voter, target)| voter != target)
            .map(|(voter, target)| (PlayerId(voter), PlayerId(target)))
            .collect();

        let tally = tally_votes(&votes);

        if votes.is_empty() {
            prop_assert!(tally.eliminated.is_none());
        } else {
            let (eliminated, count) = tally.eliminated.unwrap();
            let max = *tally.totals.values().max().unwrap();
            prop_assert_eq!(count, max);
            prop_assert_eq!(tally.totals[&eliminated], max);
            for (seat, votes_received) in &tally.totals {
                if *votes_received == max {
                    prop_assert!(*seat >= eliminated, "tie-break must pick the smallest seat");
                }
            }
        }
    }

    /// The tally must not depend on ballot-map iteration order.
    #[test]
    fn tally_is_insertion_order_independent(
        raw in proptest::collection::vec((1u8..=12, 1u8..=12), 0..12),
    ) {
        // Dedupe by voter first so both maps hold identical ballots.
        let pairs: Vec<(PlayerId, PlayerId)> = raw
            .into_iter()
            .filter(|(voter, target)| voter != target)
            .map(|(voter, target)| (PlayerId(voter), PlayerId(target)))
            .collect::<std::collections::BTreeMap<_, _>>()
            .into_iter()
            .collect();

        let forward: HashMap<_, _> = pairs.iter().copied().collect();
        let reverse: HashMap<_, _> = pairs.iter().rev().copied().collect();

        prop_assert_eq!(tally_votes(&forward), tally_votes(&reverse));
    }

    /// Every room starts with the advertised AI seat count and a full
    /// human pool.
    #[test]
    fn room_creation_partitions_seats(total in 2u8..=12, humans in 1u8..=4) {
        let max_humans = humans.min(total);
        let room = test_room(max_humans, total);
        let state = room.lock_state();

        prop_assert_eq!(state.players.len(), usize::from(total - max_humans));
        prop_assert_eq!(state.available_numbers.len(), usize::from(max_humans));
        prop_assert!(state.players.iter().all(|p| p.is_ai() && p.persona.is_some()));
    }
}
