//! Human message ingress.

use std::sync::Arc;

use crate::protocol::{validation, GameError, Phase, PlayerId, RoomStatus, Sender};

use super::GameServer;

impl GameServer {
    /// Append a human chat message and kick the agent scheduler.
    ///
    /// Returns before any agent work happens: the scheduler runs on its own
    /// tasks and never blocks the caller on LLM latency.
    pub fn send_message(
        self: &Arc<Self>,
        code: &str,
        player_id: PlayerId,
        text: &str,
    ) -> Result<(), GameError> {
        let room = self.registry.get(code).ok_or(GameError::NotFound)?;
        let text = validation::validate_message_text(text, &self.config)
            .map_err(GameError::InvalidParams)?;

        let (batch, voting_epoch) = {
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
            if state.phase != Phase::Discussion {
                return Err(GameError::PhaseMismatch {
                    actual: state.phase,
                });
            }

            let player = state.player(player_id).ok_or(GameError::NotFound)?;
            if !player.is_human() || player.left_at.is_some() {
                return Err(GameError::NotFound);
            }
            if player.eliminated {
                return Err(GameError::InvalidParams(
                    "eliminated players cannot send messages".to_string(),
                ));
            }

            let mut batch = vec![state.record_message(Sender::Player(player_id), text)];

            // Optional early end: every live human has spoken and the
            // discussion floor has elapsed.
            let voting_epoch = if self.config.end_discussion_when_all_spoken
                && state
                    .discussion_started
                    .is_some_and(|t| t.elapsed() >= self.config.min_discussion_duration())
                && state
                    .live_humans()
                    .all(|p| state.humans_spoken.contains(&p.id))
            {
                let mut events = Vec::new();
                let epoch = self.begin_voting(&mut state, &mut events);
                batch.extend(state.stamp_all(events));
                Some(epoch)
            } else {
                None
            };

            (batch, voting_epoch)
        };

        room.bus.deliver(batch);

        match voting_epoch {
            Some(epoch) => {
                tracing::info!(
                    room_code = %room.code,
                    "all humans have spoken, discussion ended early"
                );
                self.schedule_phase_timer(&room, Phase::Voting, epoch, self.config.voting_duration());
            }
            None => {
                // Fire-and-forget: duplicate triggers are dropped by the
                // room's trigger lock.
                self.trigger_agents(&room);
            }
        }
        Ok(())
    }
}
