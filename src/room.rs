//! A single game room: locked mutable state, the trigger lock guarding the
//! agent scheduler, the broadcast bus, and the cancellation token that tears
//! down timers and in-flight generations.
//!
//! Locking rules (enforced by construction):
//! - `Room::state` is a `std::sync::Mutex`, so no task can hold it across an
//!   await point. All mutations happen inside short critical sections.
//! - Events are stamped with their sequence number inside the critical
//!   section and handed to the bus afterwards.
//! - `Room::trigger_lock` is only ever `try_lock`ed; a losing trigger is
//!   dropped, never queued.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

use crate::agents::{persona_for_seat, AgentPolicy, LlmPolicy};
use crate::bus::RoomBus;
use crate::config::GameConfig;
use crate::llm::LlmClient;
use crate::protocol::{
    ChatMessage, EventEnvelope, GameError, GameEvent, HumanKey, Phase, Player, PlayerId,
    PlayerKind, PlayerPublic, RoomSnapshot, RoomStatus, Sender, Winner,
};

/// Mutable game state, guarded by the room lock.
pub struct RoomState {
    pub status: RoomStatus,
    pub phase: Phase,
    pub round: u32,
    pub topic: String,
    pub max_humans: u8,
    pub total_players: u8,
    /// Seats, AI first in creation order, humans appended as they join.
    pub players: Vec<Player>,
    /// Seat numbers not currently held by a human.
    pub available_numbers: BTreeSet<u8>,
    /// Transport key of the first human to join.
    pub creator: Option<HumanKey>,
    pub creator_player: Option<PlayerId>,
    /// Append-only chat log, ordered by `seq`.
    pub messages: Vec<ChatMessage>,
    /// Ballots for the current round: voter -> target.
    pub votes: HashMap<PlayerId, PlayerId>,
    /// Agents currently generating a message.
    pub processing: HashSet<PlayerId>,
    /// When each player last produced a message (spacing throttle input).
    pub last_spoke: HashMap<PlayerId, Instant>,
    /// Humans who have spoken in the current round (early-end rule input).
    pub humans_spoken: HashSet<PlayerId>,
    /// When the current discussion phase began.
    pub discussion_started: Option<Instant>,
    /// Invalidates stale one-shot phase timers; bumped on every transition.
    pub timer_epoch: u64,
    /// Next broadcast sequence number is `event_seq + 1`.
    pub event_seq: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub winner: Option<Winner>,
    /// Outcome of every completed voting phase, for the stats record.
    pub round_results: Vec<RoundResult>,
}

/// What one voting phase produced.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoundResult {
    pub round: u32,
    /// Ballots as cast: voter -> target.
    pub ballots: BTreeMap<PlayerId, PlayerId>,
    /// Votes received per target.
    pub totals: BTreeMap<PlayerId, u32>,
    /// Seat eliminated this round, if any.
    pub eliminated: Option<PlayerId>,
}

impl RoomState {
    /// Stamp one event with the next sequence number.
    pub fn stamp(&mut self, event: GameEvent) -> EventEnvelope {
        self.event_seq += 1;
        EventEnvelope {
            seq: self.event_seq,
            event,
        }
    }

    /// Stamp a batch in order.
    pub fn stamp_all(&mut self, events: Vec<GameEvent>) -> Vec<EventEnvelope> {
        events.into_iter().map(|e| self.stamp(e)).collect()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Humans currently seated (joined and not left).
    pub fn seated_humans(&self) -> impl Iterator<Item = &Player> {
        self.players
            .iter()
            .filter(|p| p.is_human() && p.left_at.is_none())
    }

    pub fn seated_human_count(&self) -> usize {
        self.seated_humans().count()
    }

    /// Humans still in the game: seated and not eliminated.
    pub fn live_humans(&self) -> impl Iterator<Item = &Player> {
        self.seated_humans().filter(|p| !p.eliminated)
    }

    pub fn live_ai(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_ai() && !p.eliminated)
    }

    /// Everyone eligible to vote or be voted for.
    pub fn live_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_active())
    }

    /// Seat-number-ordered public roster for broadcasts.
    pub fn public_players(&self) -> Vec<PlayerPublic> {
        let mut players: Vec<PlayerPublic> = self
            .players
            .iter()
            .filter(|p| p.is_ai() || p.left_at.is_none())
            .map(PlayerPublic::from)
            .collect();
        players.sort_by_key(|p| p.id);
        players
    }

    /// Seat the next human: smallest available number wins.
    pub fn claim_seat(&mut self, key: HumanKey) -> Result<PlayerId, GameError> {
        let number = self
            .available_numbers
            .pop_first()
            .ok_or(GameError::RoomFull)?;
        let id = PlayerId(number);
        self.players.push(Player {
            id,
            kind: PlayerKind::Human,
            eliminated: false,
            persona: None,
            joined_at: Some(Utc::now()),
            left_at: None,
            human_key: Some(key),
        });
        if self.creator.is_none() {
            self.creator = Some(key);
            self.creator_player = Some(id);
        }
        Ok(id)
    }

    /// Return a seat to the pool (waiting-room leave). The player record is
    /// removed entirely.
    pub fn release_seat(&mut self, id: PlayerId) {
        self.players.retain(|p| p.id != id);
        self.available_numbers.insert(id.number());
        self.void_votes_touching(id);
    }

    /// Mid-game leave: the seat record stays (for role reveal) but the
    /// player stops participating.
    pub fn retire_seat(&mut self, id: PlayerId) {
        if let Some(player) = self.player_mut(id) {
            player.left_at = Some(Utc::now());
            player.eliminated = true;
        }
        self.void_votes_touching(id);
    }

    fn void_votes_touching(&mut self, id: PlayerId) {
        self.votes.retain(|voter, target| *voter != id && *target != id);
    }

    /// Append a chat line and update the speaking bookkeeping.
    ///
    /// The chat message and its broadcast event share one sequence number,
    /// which keeps the bus's delivery sequence contiguous.
    pub fn record_message(&mut self, sender: Sender, text: String) -> EventEnvelope {
        self.event_seq += 1;
        let message = ChatMessage {
            sender,
            text: text.clone(),
            seq: self.event_seq,
            round: self.round,
            sent_at: Utc::now(),
        };
        self.messages.push(message);
        if let Sender::Player(id) = sender {
            self.last_spoke.insert(id, Instant::now());
            if self.player(id).is_some_and(Player::is_human) {
                self.humans_spoken.insert(id);
            }
        }
        EventEnvelope {
            seq: self.event_seq,
            event: GameEvent::Message {
                sender,
                text,
                round: self.round,
            },
        }
    }

    /// Snapshot for a new subscriber, taken under the room lock.
    pub fn snapshot(&self, code: &str, message_window: usize) -> RoomSnapshot {
        let skip = self.messages.len().saturating_sub(message_window);
        RoomSnapshot {
            code: code.to_string(),
            status: self.status,
            phase: self.phase,
            round: self.round,
            topic: self.topic.clone(),
            players: self.public_players(),
            recent_messages: self.messages.iter().skip(skip).cloned().collect(),
            last_seq: self.event_seq,
        }
    }
}

/// One live room. Shared as `Arc<Room>` between the registry, timers, and
/// in-flight scheduler cycles.
pub struct Room {
    pub code: String,
    pub created_at: DateTime<Utc>,
    state: Mutex<RoomState>,
    /// Guards the agent scheduler pipeline. Try-acquire only: a concurrent
    /// trigger is dropped because the holder covers all eligible agents.
    pub trigger_lock: Arc<AsyncMutex<()>>,
    pub bus: RoomBus,
    /// Cancels phase timers and discards in-flight generations on deletion.
    pub cancel: CancellationToken,
    /// Immutable per-agent policies, fixed at creation.
    agents: HashMap<PlayerId, Arc<dyn AgentPolicy>>,
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("code", &self.code)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl Room {
    /// Build a room: shuffle seat numbers, fill the AI seats with personas
    /// in roster order, and leave the rest for humans.
    pub fn new(
        code: String,
        max_humans: u8,
        total_players: u8,
        config: &GameConfig,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        let mut numbers: Vec<u8> = (1..=total_players).collect();
        numbers.shuffle(&mut rand::rng());

        let ai_count = usize::from(total_players - max_humans);
        let mut players = Vec::with_capacity(usize::from(total_players));
        let mut agents: HashMap<PlayerId, Arc<dyn AgentPolicy>> = HashMap::new();

        for (seat, &number) in numbers.iter().take(ai_count).enumerate() {
            let id = PlayerId(number);
            let persona = persona_for_seat(seat);
            players.push(Player {
                id,
                kind: PlayerKind::Ai,
                eliminated: false,
                persona: Some(persona.name.to_string()),
                joined_at: None,
                left_at: None,
                human_key: None,
            });
            agents.insert(
                id,
                Arc::new(LlmPolicy::new(Arc::clone(&llm), persona, config)) as Arc<dyn AgentPolicy>,
            );
        }

        let available_numbers: BTreeSet<u8> = numbers.iter().skip(ai_count).copied().collect();

        let state = RoomState {
            status: RoomStatus::Waiting,
            phase: Phase::Waiting,
            round: 0,
            topic: String::new(),
            max_humans,
            total_players,
            players,
            available_numbers,
            creator: None,
            creator_player: None,
            messages: Vec::new(),
            votes: HashMap::new(),
            processing: HashSet::new(),
            last_spoke: HashMap::new(),
            humans_spoken: HashSet::new(),
            discussion_started: None,
            timer_epoch: 0,
            event_seq: 0,
            started_at: None,
            ended_at: None,
            winner: None,
            round_results: Vec::new(),
        };

        Self {
            code,
            created_at: Utc::now(),
            state: Mutex::new(state),
            trigger_lock: Arc::new(AsyncMutex::new(())),
            bus: RoomBus::new(config.bus_buffer_size),
            cancel: CancellationToken::new(),
            agents,
        }
    }

    /// Enter the room's critical section. Never hold the guard across an
    /// await point; the type system enforces this inside async fns.
    pub fn lock_state(&self) -> MutexGuard<'_, RoomState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn policy(&self, id: PlayerId) -> Option<Arc<dyn AgentPolicy>> {
        self.agents.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedClient;
    use uuid::Uuid;

    fn test_room(max_humans: u8, total_players: u8) -> Room {
        Room::new(
            "TEST01".to_string(),
            max_humans,
            total_players,
            &GameConfig::default(),
            Arc::new(ScriptedClient::new()),
        )
    }

    #[test]
    fn seats_form_a_permutation() {
        let room = test_room(2, 6);
        let state = room.lock_state();

        let mut numbers: Vec<u8> = state
            .players
            .iter()
            .map(|p| p.id.number())
            .chain(state.available_numbers.iter().copied())
            .collect();
        numbers.sort_unstable();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(state.players.len(), 4);
        assert_eq!(state.available_numbers.len(), 2);
    }

    #[test]
    fn ai_seats_have_personas_and_policies() {
        let room = test_room(1, 5);
        let state = room.lock_state();
        for player in &state.players {
            assert_eq!(player.kind, PlayerKind::Ai);
            assert!(player.persona.is_some());
            assert!(room.policy(player.id).is_some());
        }
    }

    #[test]
    fn humans_claim_smallest_available_seat() {
        let room = test_room(3, 6);
        let mut state = room.lock_state();
        let expected = *state.available_numbers.iter().next().unwrap();
        let id = state.claim_seat(Uuid::new_v4()).unwrap();
        assert_eq!(id.number(), expected);
        assert!(!state.available_numbers.contains(&expected));
    }

    #[test]
    fn first_human_becomes_creator() {
        let room = test_room(2, 5);
        let mut state = room.lock_state();
        let key = Uuid::new_v4();
        let id = state.claim_seat(key).unwrap();
        assert_eq!(state.creator, Some(key));
        assert_eq!(state.creator_player, Some(id));

        let other = state.claim_seat(Uuid::new_v4()).unwrap();
        assert_eq!(state.creator_player, Some(id));
        assert_ne!(id, other);
    }

    #[test]
    fn released_seat_returns_to_pool() {
        let room = test_room(2, 5);
        let mut state = room.lock_state();
        let id = state.claim_seat(Uuid::new_v4()).unwrap();
        state.release_seat(id);
        assert!(state.available_numbers.contains(&id.number()));
        assert!(state.player(id).is_none());
    }

    #[test]
    fn claim_fails_when_no_seats_left() {
        let room = test_room(1, 5);
        let mut state = room.lock_state();
        state.claim_seat(Uuid::new_v4()).unwrap();
        assert_eq!(
            state.claim_seat(Uuid::new_v4()).unwrap_err(),
            GameError::RoomFull
        );
    }

    #[test]
    fn leave_voids_votes_in_both_directions() {
        let room = test_room(3, 6);
        let mut state = room.lock_state();
        let a = state.claim_seat(Uuid::new_v4()).unwrap();
        let b = state.claim_seat(Uuid::new_v4()).unwrap();
        let c = state.claim_seat(Uuid::new_v4()).unwrap();

        state.votes.insert(a, b);
        state.votes.insert(b, c);
        state.votes.insert(c, b);
        state.retire_seat(b);

        assert!(!state.votes.contains_key(&b));
        assert!(!state.votes.values().any(|t| *t == b));
        assert!(state.votes.is_empty());
    }

    #[test]
    fn record_message_is_append_only_and_ordered() {
        let room = test_room(1, 4);
        let mut state = room.lock_state();
        let id = state.claim_seat(Uuid::new_v4()).unwrap();
        let first = state.record_message(Sender::Player(id), "one".to_string());
        let second = state.record_message(Sender::System, "two".to_string());
        assert!(second.seq > first.seq);
        assert_eq!(second.seq, state.event_seq);
        assert_eq!(state.messages.len(), 2);
        assert!(state.humans_spoken.contains(&id));
    }

    #[test]
    fn snapshot_windows_recent_messages() {
        let room = test_room(1, 4);
        let mut state = room.lock_state();
        let id = state.claim_seat(Uuid::new_v4()).unwrap();
        for i in 0..10 {
            state.record_message(Sender::Player(id), format!("m{i}"));
        }
        let snapshot = state.snapshot("TEST01", 3);
        assert_eq!(snapshot.recent_messages.len(), 3);
        assert_eq!(snapshot.recent_messages[2].text, "m9");
        assert_eq!(snapshot.last_seq, state.event_seq);
    }
}
