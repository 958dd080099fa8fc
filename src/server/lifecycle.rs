//! Room lifecycle operations: create, join, leave.

use std::sync::Arc;

use crate::protocol::{
    validation, GameError, GameEvent, HumanKey, PlayerId, PlayerPublic, RoomStatus,
    TerminationReason,
};
use crate::room::Room;

use super::GameServer;

/// What a leave operation decided while holding the lock.
enum LeaveOutcome {
    /// Player removed; room keeps running.
    Stay,
    /// Tear the room down with this reason.
    Terminate(TerminationReason),
    /// The leaver was the last unvoted human in a voting phase.
    ConcludeVoting(super::phases::PostVoting),
}

impl GameServer {
    /// Create a room. Returns its code; the room sits in Waiting until
    /// enough humans join.
    pub fn create_room(&self, max_humans: u8, total_players: u8) -> Result<String, GameError> {
        validation::validate_player_counts(max_humans, total_players, &self.config)
            .map_err(GameError::InvalidParams)?;

        let room = self.registry.create(|code| {
            Room::new(
                code,
                max_humans,
                total_players,
                &self.config,
                Arc::clone(&self.llm),
            )
        })?;

        tracing::info!(
            room_code = %room.code,
            max_humans,
            total_players,
            "room opened for players"
        );
        Ok(room.code.clone())
    }

    /// Seat a human. Filling the last human seat starts the game.
    pub fn join(self: &Arc<Self>, code: &str, key: HumanKey) -> Result<PlayerId, GameError> {
        let room = self.registry.get(code).ok_or(GameError::NotFound)?;

        let (player_id, batch, started_epoch) = {
            let mut state = room.lock_state();
            match state.status {
                RoomStatus::Waiting => {}
                RoomStatus::InProgress => return Err(GameError::AlreadyStarted),
                RoomStatus::Ended => return Err(GameError::Terminated),
            }
            if state.seated_human_count() >= usize::from(state.max_humans) {
                return Err(GameError::RoomFull);
            }

            let player_id = state.claim_seat(key)?;
            let mut events = vec![GameEvent::PlayerJoined {
                player: PlayerPublic {
                    id: player_id,
                    eliminated: false,
                },
            }];

            let started_epoch = if state.seated_human_count() == usize::from(state.max_humans) {
                let epoch = self.start_game(&mut state, &mut events);
                events.push(GameEvent::PlayerList {
                    players: state.public_players(),
                });
                Some(epoch)
            } else {
                events.push(GameEvent::PlayerList {
                    players: state.public_players(),
                });
                None
            };

            (player_id, state.stamp_all(events), started_epoch)
        };

        room.bus.deliver(batch);
        if let Some(epoch) = started_epoch {
            tracing::info!(room_code = %room.code, "all human seats filled, game started");
            self.schedule_phase_timer(
                &room,
                crate::protocol::Phase::Discussion,
                epoch,
                self.config.discussion_duration(),
            );
        }
        tracing::info!(room_code = %room.code, player_id = %player_id, "player joined");
        Ok(player_id)
    }

    /// Remove a human. The creator leaving, or the last human leaving,
    /// terminates the room.
    pub async fn leave(self: &Arc<Self>, code: &str, player_id: PlayerId) -> Result<(), GameError> {
        let room = self.registry.get(code).ok_or(GameError::NotFound)?;

        let (batch, outcome) = {
            let mut state = room.lock_state();
            let player = state.player(player_id).ok_or(GameError::NotFound)?;
            if !player.is_human() || player.left_at.is_some() {
                return Err(GameError::NotFound);
            }

            if state.creator_player == Some(player_id) {
                // Termination events are emitted by terminate_room.
                (
                    Vec::new(),
                    LeaveOutcome::Terminate(TerminationReason::CreatorLeft),
                )
            } else {
                let mut events = Vec::new();
                if state.status == RoomStatus::Waiting {
                    state.release_seat(player_id);
                } else {
                    state.retire_seat(player_id);
                }
                events.push(GameEvent::PlayerLeft { player_id });
                events.push(GameEvent::PlayerList {
                    players: state.public_players(),
                });

                let outcome = if state.seated_human_count() == 0 {
                    LeaveOutcome::Terminate(TerminationReason::AllHumansLeft)
                } else if state.status == RoomStatus::InProgress
                    && state.phase == crate::protocol::Phase::Voting
                    && state.live_humans().all(|p| state.votes.contains_key(&p.id))
                {
                    // The departed seat may have been the only ballot still
                    // outstanding.
                    LeaveOutcome::ConcludeVoting(self.conclude_voting(
                        &room.code,
                        &mut state,
                        &mut events,
                    ))
                } else {
                    LeaveOutcome::Stay
                };

                (state.stamp_all(events), outcome)
            }
        };

        room.bus.deliver(batch);
        match outcome {
            LeaveOutcome::Stay => {
                tracing::info!(room_code = %room.code, player_id = %player_id, "player left");
            }
            LeaveOutcome::Terminate(reason) => {
                self.terminate_room(&room, reason).await;
            }
            LeaveOutcome::ConcludeVoting(post) => {
                tracing::info!(
                    room_code = %room.code,
                    player_id = %player_id,
                    "player left, voting concluded early"
                );
                self.after_voting(&room, post).await;
            }
        }
        Ok(())
    }
}
