//! Broadcast event model.
//!
//! Every state transition the orchestrator performs is published to the
//! room's bus as one of these events. Subscribers receive them wrapped in
//! an [`EventEnvelope`] whose `seq` is assigned in production order, so a
//! transport can both preserve ordering and deduplicate after a snapshot
//! resume.

use serde::{Deserialize, Serialize};

use super::types::{
    ChatMessage, Phase, PlayerId, PlayerPublic, PlayerRole, RoomStatus, Sender, TerminationReason,
    Winner,
};

/// Events delivered to room subscribers, in orchestrator production order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// First event on every subscription: enough state to render the room
    /// without replaying history.
    Snapshot(RoomSnapshot),
    PlayerJoined {
        player: PlayerPublic,
    },
    PlayerLeft {
        player_id: PlayerId,
    },
    PlayerList {
        players: Vec<PlayerPublic>,
    },
    PhaseChanged {
        phase: Phase,
        round: u32,
        /// Seconds until the phase timer fires, when one is armed.
        #[serde(skip_serializing_if = "Option::is_none")]
        ends_in_secs: Option<u64>,
    },
    Topic {
        topic: String,
        round: u32,
    },
    Message {
        sender: Sender,
        text: String,
        round: u32,
    },
    /// Hint that an agent accepted its probe and is composing a reply.
    Typing {
        player_id: PlayerId,
    },
    VoteCast {
        voter: PlayerId,
        /// Present only when vote targets are configured as public.
        #[serde(skip_serializing_if = "Option::is_none")]
        target: Option<PlayerId>,
    },
    NoElimination {
        round: u32,
    },
    Elimination {
        player_id: PlayerId,
        votes: u8,
        round: u32,
    },
    NewRound {
        round: u32,
    },
    GameOver {
        winner: Winner,
        roles: Vec<PlayerRole>,
        rounds_played: u32,
    },
    RoomTerminated {
        reason: TerminationReason,
    },
}

/// Wire framing for a bus event: the room-monotonic sequence number plus
/// the event itself, flattened into one JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub seq: u64,
    #[serde(flatten)]
    pub event: GameEvent,
}

/// State carried by the synthetic `Snapshot` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub code: String,
    pub status: RoomStatus,
    pub phase: Phase,
    pub round: u32,
    pub topic: String,
    pub players: Vec<PlayerPublic>,
    /// Last K messages (`snapshot_message_window`), oldest first.
    pub recent_messages: Vec<ChatMessage>,
    /// Sequence number the snapshot was taken at. Envelopes with
    /// `seq <= last_seq` are already reflected in this state.
    pub last_seq: u64,
}
