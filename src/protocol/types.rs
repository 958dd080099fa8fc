use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Number of characters in a generated room code.
pub const ROOM_CODE_LENGTH: usize = 6;

/// Opaque key identifying a connected human across operations.
/// Handed out by the transport on join and echoed back on leave.
pub type HumanKey = Uuid;

/// Identifier of a seat at the table: `"Player N"`, N in `[1, total_players]`.
///
/// Ordering follows the seat number, which is what the deterministic
/// vote tie-break relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u8);

impl PlayerId {
    pub fn number(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

impl FromStr for PlayerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number = s
            .strip_prefix("Player ")
            .and_then(|n| n.parse::<u8>().ok())
            .ok_or_else(|| format!("invalid player id: {s:?}"))?;
        if number == 0 {
            return Err("player numbers start at 1".to_string());
        }
        Ok(Self(number))
    }
}

impl Serialize for PlayerId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Who produced a chat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    Player(PlayerId),
    System,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(id) => write!(f, "{id}"),
            Self::System => write!(f, "System"),
        }
    }
}

impl FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "System" {
            return Ok(Self::System);
        }
        s.parse::<PlayerId>().map(Self::Player)
    }
}

impl Serialize for Sender {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Sender {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Coarse room lifecycle state, visible in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    InProgress,
    Ended,
}

/// Sub-state driven by the phase controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Waiting,
    Discussion,
    Voting,
    Ended,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Waiting => "waiting",
            Self::Discussion => "discussion",
            Self::Voting => "voting",
            Self::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// Whether a seat is occupied by a person or an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    Human,
    Ai,
}

/// Full per-seat record. Role information stays server-side until game over.
#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub kind: PlayerKind,
    pub eliminated: bool,
    /// Persona name for AI seats; `None` for humans.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_at: Option<DateTime<Utc>>,
    /// Transport-issued key for the human occupying this seat.
    #[serde(skip)]
    pub human_key: Option<HumanKey>,
}

impl Player {
    pub fn is_human(&self) -> bool {
        self.kind == PlayerKind::Human
    }

    pub fn is_ai(&self) -> bool {
        self.kind == PlayerKind::Ai
    }

    /// A human who left mid-game keeps the seat record but stops playing.
    pub fn is_active(&self) -> bool {
        !self.eliminated && self.left_at.is_none()
    }
}

/// Role-free view of a player, safe to broadcast while the game runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPublic {
    pub id: PlayerId,
    pub eliminated: bool,
}

impl From<&Player> for PlayerPublic {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            eliminated: player.eliminated,
        }
    }
}

/// Revealed role, included in `GameOver` and the stats record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRole {
    pub id: PlayerId,
    pub kind: PlayerKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
}

impl From<&Player> for PlayerRole {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            kind: player.kind,
            persona: player.persona.clone(),
        }
    }
}

/// One chat line. `seq` is the room-monotonic timestamp of the data model;
/// `sent_at` is wall-clock and only informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub seq: u64,
    pub round: u32,
    pub sent_at: DateTime<Utc>,
}

/// Which side won, reported in `GameOver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Humans,
    Ai,
}

/// Why a room shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    CreatorLeft,
    AllHumansLeft,
    GameComplete,
    Internal,
}

/// Listing entry returned by the registry for rooms awaiting players.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummary {
    pub code: String,
    pub status: RoomStatus,
    pub humans_joined: u8,
    pub max_humans: u8,
    pub total_players: u8,
    pub created_at: DateTime<Utc>,
}

/// Detailed room view for the info endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomInfo {
    pub code: String,
    pub status: RoomStatus,
    pub phase: Phase,
    pub round: u32,
    pub topic: String,
    pub humans_joined: u8,
    pub max_humans: u8,
    pub total_players: u8,
    pub players: Vec<PlayerPublic>,
    pub created_at: DateTime<Utc>,
}
