//! Multi-agent message scheduler.
//!
//! Decides which agents respond to a newly observed message, then runs
//! probes and generations without blocking the orchestrator and without
//! duplicating work under racing triggers.
//!
//! The whole cycle runs while holding the room's trigger lock, acquired
//! with try-lock semantics: a trigger that loses the race returns
//! immediately and is dropped, because the holder's cycle already covers
//! every agent eligible at that moment. This is a correctness mechanism
//! (it is what prevents duplicate agent responses), not a throttle.

use futures_util::future::join_all;
use std::sync::Arc;
use tokio::time::timeout;

use crate::agents::{AgentContext, AgentPolicy, TranscriptLine};
use crate::protocol::{GameEvent, Phase, PlayerId, Sender};
use crate::room::Room;

use super::GameServer;

/// An agent that passed its probe and holds a processing slot.
struct Speaker {
    id: PlayerId,
    ctx: AgentContext,
    policy: Arc<dyn AgentPolicy>,
}

impl GameServer {
    /// Kick one scheduler cycle for the room, unless one is already
    /// running. Never blocks the caller.
    pub(crate) fn trigger_agents(self: &Arc<Self>, room: &Arc<Room>) {
        if room.cancel.is_cancelled() {
            return;
        }
        let Ok(guard) = Arc::clone(&room.trigger_lock).try_lock_owned() else {
            tracing::debug!(
                room_code = %room.code,
                "scheduler cycle in flight, concurrent trigger dropped"
            );
            return;
        };

        let server = Arc::clone(self);
        let room = Arc::clone(room);
        tokio::spawn(async move {
            tokio::select! {
                () = room.cancel.cancelled() => {}
                () = server.run_scheduler_cycle(&room) => {}
            }
            // Cycle finished (or the room died): release the trigger lock.
            drop(guard);
        });
    }

    async fn run_scheduler_cycle(&self, room: &Arc<Room>) {
        // Snapshot eligible agents and shared context under the room lock.
        let candidates = {
            let state = room.lock_state();
            if state.phase != Phase::Discussion {
                return;
            }

            let window = self.config.snapshot_message_window;
            let skip = state.messages.len().saturating_sub(window);
            let recent: Vec<TranscriptLine> = state
                .messages
                .iter()
                .skip(skip)
                .map(|m| TranscriptLine {
                    speaker: m.sender.to_string(),
                    text: m.text.clone(),
                })
                .collect();
            let last_speaker = state.messages.last().map(|m| m.sender.to_string());

            state
                .live_ai()
                .filter(|p| !state.processing.contains(&p.id))
                .filter_map(|p| {
                    let policy = room.policy(p.id)?;
                    Some(Speaker {
                        id: p.id,
                        ctx: AgentContext {
                            player_id: p.id,
                            topic: state.topic.clone(),
                            round: state.round,
                            recent: recent.clone(),
                            last_speaker: last_speaker.clone(),
                            since_last_utterance: state
                                .last_spoke
                                .get(&p.id)
                                .map(std::time::Instant::elapsed),
                        },
                        policy,
                    })
                })
                .collect::<Vec<_>>()
        };
        if candidates.is_empty() {
            return;
        }

        // Probe everyone in parallel under a shared per-probe deadline.
        let probe_timeout = self.config.probe_timeout();
        let verdicts = join_all(candidates.into_iter().map(|speaker| async move {
            let verdict = timeout(probe_timeout, speaker.policy.should_respond(&speaker.ctx)).await;
            match verdict {
                Ok(Ok(true)) => Some(speaker),
                Ok(Ok(false)) => None,
                Ok(Err(error)) => {
                    tracing::debug!(agent = %speaker.id, %error, "probe failed, agent stays quiet");
                    None
                }
                Err(_) => {
                    tracing::debug!(agent = %speaker.id, "probe deadline exceeded");
                    None
                }
            }
        }))
        .await;

        // Reserve processing slots under the lock, honoring the per-room
        // concurrency cap, and announce typing.
        let (speakers, typing_batch) = {
            let mut state = room.lock_state();
            if state.phase != Phase::Discussion {
                return;
            }
            let cap = self.config.concurrent_agent_cap(state.total_players);

            let mut speakers = Vec::new();
            let mut events = Vec::new();
            for speaker in verdicts.into_iter().flatten() {
                if state.processing.len() >= cap {
                    tracing::debug!(
                        room_code = %room.code,
                        cap,
                        "agent concurrency cap reached, remaining speakers skipped"
                    );
                    break;
                }
                let live = state
                    .player(speaker.id)
                    .is_some_and(|p| p.is_ai() && !p.eliminated);
                if live && state.processing.insert(speaker.id) {
                    events.push(GameEvent::Typing {
                        player_id: speaker.id,
                    });
                    speakers.push(speaker);
                }
            }
            (speakers, state.stamp_all(events))
        };
        room.bus.deliver(typing_batch);
        if speakers.is_empty() {
            return;
        }

        // Generate replies on the bounded worker pool. Completion re-checks
        // the phase: a reply finishing after discussion ended is discarded.
        let generate_timeout = self.config.generate_timeout();
        join_all(speakers.into_iter().map(|speaker| {
            let room = Arc::clone(room);
            let permits = Arc::clone(&self.generation_permits);
            async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    room.lock_state().processing.remove(&speaker.id);
                    return;
                };
                let outcome = timeout(generate_timeout, speaker.policy.generate(&speaker.ctx)).await;

                let batch = {
                    let mut state = room.lock_state();
                    state.processing.remove(&speaker.id);
                    match outcome {
                        Ok(Ok(text)) => {
                            let live = state
                                .player(speaker.id)
                                .is_some_and(|p| !p.eliminated);
                            if state.phase == Phase::Discussion && live {
                                vec![state.record_message(Sender::Player(speaker.id), text)]
                            } else {
                                tracing::debug!(
                                    agent = %speaker.id,
                                    "generation completed after phase change, discarded"
                                );
                                Vec::new()
                            }
                        }
                        Ok(Err(error)) => {
                            tracing::debug!(agent = %speaker.id, %error, "generation failed");
                            Vec::new()
                        }
                        Err(_) => {
                            tracing::debug!(agent = %speaker.id, "generation deadline exceeded");
                            Vec::new()
                        }
                    }
                };
                room.bus.deliver(batch);
            }
        }))
        .await;
    }
}
