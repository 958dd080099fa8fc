//! Vote collection and tallying.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::protocol::{GameError, GameEvent, Phase, PlayerId, RoomStatus};
use crate::room::RoundResult;

use super::phases::PostVoting;
use super::GameServer;

/// Result of counting one round's ballots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    /// Votes received per target.
    pub totals: BTreeMap<PlayerId, u32>,
    /// The seat to eliminate, with its vote count. `None` when no ballots
    /// were cast.
    pub eliminated: Option<(PlayerId, u32)>,
}

/// Count ballots and pick the elimination target.
///
/// Abstentions are allowed; zero ballots means nobody is eliminated. Ties
/// for the maximum are broken toward the smallest seat number, which is
/// deterministic and documented to transports.
pub fn tally_votes(votes: &HashMap<PlayerId, PlayerId>) -> Tally {
    let mut totals: BTreeMap<PlayerId, u32> = BTreeMap::new();
    for target in votes.values() {
        *totals.entry(*target).or_insert(0) += 1;
    }

    let max = totals.values().copied().max();
    let eliminated = max.map(|max| {
        // BTreeMap iterates in ascending seat order, so the first maximum
        // is the smallest seat number.
        let target = totals
            .iter()
            .find(|(_, count)| **count == max)
            .map(|(id, _)| *id)
            .unwrap_or(PlayerId(1));
        (target, max)
    });

    Tally { totals, eliminated }
}

impl GameServer {
    /// Record a ballot. Short-circuits the voting timer once every live
    /// human has voted.
    pub async fn vote(
        self: &Arc<Self>,
        code: &str,
        voter: PlayerId,
        target: PlayerId,
    ) -> Result<(), GameError> {
        let room = self.registry.get(code).ok_or(GameError::NotFound)?;

        let (batch, post) = {
            let mut state = room.lock_state();
            match state.status {
                RoomStatus::Waiting => {
                    return Err(GameError::PhaseMismatch {
                        actual: state.phase,
                    })
                }
                RoomStatus::Ended => return Err(GameError::Terminated),
                RoomStatus::InProgress => {}
            }
            if state.phase != Phase::Voting {
                return Err(GameError::PhaseMismatch {
                    actual: state.phase,
                });
            }

            let voter_player = state.player(voter).ok_or(GameError::NotFound)?;
            if !voter_player.is_active() {
                return Err(GameError::InvalidParams(
                    "voter is no longer in the game".to_string(),
                ));
            }
            let target_player = state.player(target).ok_or(GameError::NotFound)?;
            if target_player.eliminated {
                return Err(GameError::InvalidParams(
                    "target is already eliminated".to_string(),
                ));
            }
            if voter == target {
                return Err(GameError::InvalidParams(
                    "players cannot vote for themselves".to_string(),
                ));
            }
            if state.votes.contains_key(&voter) {
                return Err(GameError::AlreadyVoted);
            }

            state.votes.insert(voter, target);
            tracing::debug!(
                room_code = %room.code,
                %voter,
                round = state.round,
                ballots = state.votes.len(),
                "vote recorded"
            );

            let mut events = vec![GameEvent::VoteCast {
                voter,
                target: self.config.reveal_vote_targets.then_some(target),
            }];

            // Every live human has a ballot: no need to wait out the timer.
            // (Agents abstain by design in the core; see conclude_voting.)
            let all_voted = state
                .live_humans()
                .all(|p| state.votes.contains_key(&p.id));
            let post = if all_voted {
                Some(self.conclude_voting(&room.code, &mut state, &mut events))
            } else {
                None
            };

            (state.stamp_all(events), post)
        };

        room.bus.deliver(batch);
        if let Some(post) = post {
            self.after_voting(&room, post).await;
        }
        Ok(())
    }

    /// Tally, eliminate, evaluate win conditions, and stage the next step.
    /// Runs under the room lock; the caller acts on the returned
    /// [`PostVoting`] after releasing it.
    pub(crate) fn conclude_voting(
        &self,
        code: &str,
        state: &mut crate::room::RoomState,
        events: &mut Vec<GameEvent>,
    ) -> PostVoting {
        let tally = tally_votes(&state.votes);

        state.round_results.push(RoundResult {
            round: state.round,
            ballots: state.votes.iter().map(|(v, t)| (*v, *t)).collect(),
            totals: tally.totals.clone(),
            eliminated: tally.eliminated.map(|(id, _)| id),
        });

        let eliminated_kind = match tally.eliminated {
            Some((target, votes)) => {
                let kind = state.player(target).map(|p| p.kind);
                if let Some(player) = state.player_mut(target) {
                    player.eliminated = true;
                }
                events.push(GameEvent::Elimination {
                    player_id: target,
                    votes: votes as u8,
                    round: state.round,
                });
                kind
            }
            None => {
                events.push(GameEvent::NoElimination { round: state.round });
                None
            }
        };

        match self.evaluate_winner(state, eliminated_kind) {
            Some(winner) => self.finish_game(code, state, winner, events),
            None => self.start_next_round(state, events),
        }
    }

    fn evaluate_winner(
        &self,
        state: &crate::room::RoomState,
        eliminated_kind: Option<crate::protocol::PlayerKind>,
    ) -> Option<crate::protocol::Winner> {
        use crate::protocol::{PlayerKind, Winner};

        if state.live_humans().count() == 0 {
            return Some(Winner::Ai);
        }
        let ai_fell = eliminated_kind == Some(PlayerKind::Ai);
        if ai_fell && !self.config.require_full_rounds && state.round >= self.config.rounds_to_win {
            return Some(Winner::Humans);
        }
        // Reaching the configured round count with humans standing is a
        // survival win, in both rule variants.
        if state.round >= self.config.rounds_to_win {
            return Some(Winner::Humans);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn votes(pairs: &[(u8, u8)]) -> HashMap<PlayerId, PlayerId> {
        pairs
            .iter()
            .map(|(v, t)| (PlayerId(*v), PlayerId(*t)))
            .collect()
    }

    #[test]
    fn no_ballots_means_no_elimination() {
        let tally = tally_votes(&HashMap::new());
        assert_eq!(tally.eliminated, None);
        assert!(tally.totals.is_empty());
    }

    #[test]
    fn unique_maximum_is_eliminated() {
        let tally = tally_votes(&votes(&[(1, 3), (2, 3), (4, 2)]));
        assert_eq!(tally.eliminated, Some((PlayerId(3), 2)));
        assert_eq!(tally.totals[&PlayerId(3)], 2);
        assert_eq!(tally.totals[&PlayerId(2)], 1);
    }

    #[test]
    fn tie_breaks_toward_smallest_seat_number() {
        // Seats 2 and 5 tie with two votes each.
        let tally = tally_votes(&votes(&[(1, 5), (3, 5), (4, 2), (6, 2)]));
        assert_eq!(tally.eliminated, Some((PlayerId(2), 2)));
    }

    #[test]
    fn single_ballot_decides() {
        let tally = tally_votes(&votes(&[(1, 4)]));
        assert_eq!(tally.eliminated, Some((PlayerId(4), 1)));
    }
}
