//! Phase controller: one-shot timers and the transition helpers every
//! operation shares.
//!
//! Each phase arms a single one-shot timer carrying the room's current
//! `timer_epoch`. Transitions bump the epoch, so a late callback that
//! lost the race observes a stale epoch and becomes a no-op. The only
//! fallible timer work is the game-over stats flush, which is retried
//! briefly and then terminates the room.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::protocol::{
    GameEvent, Phase, PlayerRole, RoomStatus, TerminationReason, Winner,
};
use crate::room::Room;

use super::stats::{self, GameStats};
use super::GameServer;

const STATS_FLUSH_ATTEMPTS: u32 = 3;
const STATS_FLUSH_RETRY_DELAY: Duration = Duration::from_secs(1);

/// What happens after a voting phase concludes.
pub(crate) enum PostVoting {
    /// Back to discussion; arm the discussion timer for this epoch.
    NextRound { epoch: u64 },
    /// A side won; flush the record, then tear the room down.
    GameOver { stats: GameStats },
}

impl GameServer {
    /// Transition Waiting -> Discussion. Called when the last human seat
    /// fills. Returns the timer epoch to arm.
    pub(crate) fn start_game(
        &self,
        state: &mut crate::room::RoomState,
        events: &mut Vec<GameEvent>,
    ) -> u64 {
        state.status = RoomStatus::InProgress;
        state.round = 1;
        state.started_at = Some(chrono::Utc::now());
        state.topic = self.topics.draw(None);
        self.enter_discussion(state, events)
    }

    /// Start a new round after an elimination without a winner.
    pub(crate) fn start_next_round(
        &self,
        state: &mut crate::room::RoomState,
        events: &mut Vec<GameEvent>,
    ) -> PostVoting {
        state.round += 1;
        let previous = state.topic.clone();
        state.topic = self.topics.draw(Some(&previous));
        let epoch = self.enter_discussion(state, events);
        events.push(GameEvent::NewRound { round: state.round });
        PostVoting::NextRound { epoch }
    }

    /// Shared Discussion entry: reset per-round bookkeeping, bump the
    /// epoch, and emit `PhaseChanged` + `Topic`.
    fn enter_discussion(
        &self,
        state: &mut crate::room::RoomState,
        events: &mut Vec<GameEvent>,
    ) -> u64 {
        state.phase = Phase::Discussion;
        state.votes.clear();
        state.humans_spoken.clear();
        state.discussion_started = Some(Instant::now());
        state.timer_epoch += 1;
        events.push(GameEvent::PhaseChanged {
            phase: Phase::Discussion,
            round: state.round,
            ends_in_secs: Some(self.config.discussion_seconds),
        });
        events.push(GameEvent::Topic {
            topic: state.topic.clone(),
            round: state.round,
        });
        state.timer_epoch
    }

    /// Transition Discussion -> Voting. Returns the timer epoch to arm.
    pub(crate) fn begin_voting(
        &self,
        state: &mut crate::room::RoomState,
        events: &mut Vec<GameEvent>,
    ) -> u64 {
        state.phase = Phase::Voting;
        state.timer_epoch += 1;
        events.push(GameEvent::PhaseChanged {
            phase: Phase::Voting,
            round: state.round,
            ends_in_secs: Some(self.config.voting_seconds),
        });
        state.timer_epoch
    }

    /// Transition to Ended with a winner; stages the stats record.
    pub(crate) fn finish_game(
        &self,
        code: &str,
        state: &mut crate::room::RoomState,
        winner: Winner,
        events: &mut Vec<GameEvent>,
    ) -> PostVoting {
        state.status = RoomStatus::Ended;
        state.phase = Phase::Ended;
        state.ended_at = Some(chrono::Utc::now());
        state.winner = Some(winner);
        state.timer_epoch += 1;

        let mut roles: Vec<PlayerRole> = state.players.iter().map(PlayerRole::from).collect();
        roles.sort_by_key(|r| r.id);
        events.push(GameEvent::GameOver {
            winner,
            roles,
            rounds_played: state.round,
        });

        PostVoting::GameOver {
            stats: GameStats::capture(code, state, winner),
        }
    }

    /// Act on a concluded voting phase, outside the room lock.
    pub(crate) async fn after_voting(self: &Arc<Self>, room: &Arc<Room>, post: PostVoting) {
        match post {
            PostVoting::NextRound { epoch } => {
                self.schedule_phase_timer(
                    room,
                    Phase::Discussion,
                    epoch,
                    self.config.discussion_duration(),
                );
            }
            PostVoting::GameOver { stats } => {
                // Off the caller's path: a vote that ends the game must not
                // wait on stats I/O.
                let server = Arc::clone(self);
                let room = Arc::clone(room);
                tokio::spawn(async move {
                    server.flush_stats_and_close(&room, stats).await;
                });
            }
        }
    }

    /// Write the stats record (with a short retry), then terminate the
    /// room. A record that cannot be written downgrades the termination
    /// reason to `Internal`.
    async fn flush_stats_and_close(self: &Arc<Self>, room: &Arc<Room>, stats: GameStats) {
        let mut attempt = 1;
        let reason = loop {
            match stats::write_stats(&self.stats_dir, &stats).await {
                Ok(_) => break TerminationReason::GameComplete,
                Err(error) if attempt < STATS_FLUSH_ATTEMPTS => {
                    tracing::warn!(
                        room_code = %room.code,
                        attempt,
                        %error,
                        "stats flush failed, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(STATS_FLUSH_RETRY_DELAY).await;
                }
                Err(error) => {
                    tracing::error!(
                        room_code = %room.code,
                        %error,
                        "stats flush failed permanently"
                    );
                    break TerminationReason::Internal;
                }
            }
        };
        self.terminate_room(room, reason).await;
    }

    /// Arm the one-shot timer for the current phase. The task dies with
    /// the room's cancellation token.
    pub(crate) fn schedule_phase_timer(
        self: &Arc<Self>,
        room: &Arc<Room>,
        phase: Phase,
        epoch: u64,
        after: Duration,
    ) {
        let server = Arc::clone(self);
        let room = Arc::clone(room);
        tokio::spawn(async move {
            tokio::select! {
                () = room.cancel.cancelled() => {}
                () = tokio::time::sleep(after) => {
                    server.advance_phase(&room, phase, epoch).await;
                }
            }
        });
    }

    /// Drive the transition a fired timer asked for. Idempotent: a stale
    /// epoch or a phase that already moved on is a no-op.
    async fn advance_phase(
        self: &Arc<Self>,
        room: &Arc<Room>,
        expected: Phase,
        epoch: u64,
    ) {
        enum FollowUp {
            None,
            ArmVoting(u64),
            Post(PostVoting),
        }

        let (batch, follow_up) = {
            let mut state = room.lock_state();
            if state.status != RoomStatus::InProgress
                || state.phase != expected
                || state.timer_epoch != epoch
            {
                tracing::debug!(
                    room_code = %room.code,
                    ?expected,
                    epoch,
                    current_epoch = state.timer_epoch,
                    "stale phase timer ignored"
                );
                return;
            }

            let mut events = Vec::new();
            let follow_up = match expected {
                Phase::Discussion => {
                    let next_epoch = self.begin_voting(&mut state, &mut events);
                    FollowUp::ArmVoting(next_epoch)
                }
                Phase::Voting => {
                    FollowUp::Post(self.conclude_voting(&room.code, &mut state, &mut events))
                }
                Phase::Waiting | Phase::Ended => FollowUp::None,
            };
            (state.stamp_all(events), follow_up)
        };

        room.bus.deliver(batch);

        match follow_up {
            FollowUp::None => {}
            FollowUp::ArmVoting(epoch) => {
                self.schedule_phase_timer(room, Phase::Voting, epoch, self.config.voting_duration());
            }
            FollowUp::Post(post) => self.after_voting(room, post).await,
        }
    }

    /// Emit the terminal event and delete the room. Safe to call from any
    /// state; deletion itself is idempotent.
    pub(crate) async fn terminate_room(&self, room: &Arc<Room>, reason: TerminationReason) {
        let batch = {
            let mut state = room.lock_state();
            state.status = RoomStatus::Ended;
            state.phase = Phase::Ended;
            state.timer_epoch += 1;
            if state.ended_at.is_none() {
                state.ended_at = Some(chrono::Utc::now());
            }
            vec![state.stamp(GameEvent::RoomTerminated { reason })]
        };
        room.bus.deliver(batch);
        self.registry.delete(&room.code);
        tracing::info!(room_code = %room.code, ?reason, "room terminated");
    }
}
