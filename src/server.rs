//! Game orchestrator: owns the registry, sequences the phase controller,
//! scheduler, and vote collector, and is the single producer of broadcast
//! events.
//!
//! Every operation follows the same shape: acquire the room lock, mutate,
//! stamp the resulting events, release the lock, then hand the stamped
//! batch to the bus. Nothing that can suspend (LLM calls, stats I/O,
//! timers) ever runs under the lock.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::agents::TopicPool;
use crate::bus::EventStream;
use crate::config::{GameConfig, StatsConfig};
use crate::llm::LlmClient;
use crate::protocol::{GameError, RoomInfo, RoomSummary};
use crate::registry::RoomRegistry;

mod lifecycle;
mod messaging;
mod phases;
mod scheduler;
pub mod stats;
pub mod voting;

pub struct GameServer {
    pub(crate) registry: RoomRegistry,
    pub(crate) config: GameConfig,
    pub(crate) llm: Arc<dyn LlmClient>,
    pub(crate) topics: TopicPool,
    /// Bounded worker pool for utterance generation, shared process-wide.
    pub(crate) generation_permits: Arc<Semaphore>,
    pub(crate) stats_dir: PathBuf,
}

impl GameServer {
    pub fn new(config: GameConfig, stats: &StatsConfig, llm: Arc<dyn LlmClient>) -> Arc<Self> {
        Self::with_topics(config, stats, llm, TopicPool::new())
    }

    /// Constructor with an injected topic pool (tests, themed deployments).
    pub fn with_topics(
        config: GameConfig,
        stats: &StatsConfig,
        llm: Arc<dyn LlmClient>,
        topics: TopicPool,
    ) -> Arc<Self> {
        let registry = RoomRegistry::new(config.max_rooms);
        let generation_permits = Arc::new(Semaphore::new(config.worker_pool_size.max(1)));
        Arc::new(Self {
            registry,
            config,
            llm,
            topics,
            generation_permits,
            stats_dir: PathBuf::from(&stats.dir),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Waiting rooms, oldest first.
    pub fn list_rooms(&self, page: usize, per_page: usize) -> (Vec<RoomSummary>, usize) {
        self.registry.list_waiting(page, per_page)
    }

    pub fn get_room_info(&self, code: &str) -> Result<RoomInfo, GameError> {
        let room = self.registry.get(code).ok_or(GameError::NotFound)?;
        let state = room.lock_state();
        Ok(RoomInfo {
            code: room.code.clone(),
            status: state.status,
            phase: state.phase,
            round: state.round,
            topic: state.topic.clone(),
            humans_joined: state.seated_human_count() as u8,
            max_humans: state.max_humans,
            total_players: state.total_players,
            players: state.public_players(),
            created_at: room.created_at,
        })
    }

    /// Attach a subscriber to a room's bus. The first event is always the
    /// `Snapshot`, taken atomically with the registration.
    pub fn subscribe(&self, code: &str) -> Result<EventStream, GameError> {
        let room = self.registry.get(code).ok_or(GameError::NotFound)?;
        let state = room.lock_state();
        let snapshot = state.snapshot(&room.code, self.config.snapshot_message_window);
        Ok(room.bus.subscribe(snapshot))
    }

    /// Detach a subscriber without waiting for it to drop its stream.
    pub fn unsubscribe(&self, code: &str, subscriber_id: uuid::Uuid) {
        if let Some(room) = self.registry.get(code) {
            room.bus.unsubscribe(subscriber_id);
        }
    }

    pub fn room_count(&self) -> usize {
        self.registry.count()
    }
}
