//! Post-game stats record, written once per finished game.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::protocol::{ChatMessage, PlayerId, PlayerKind, Winner};
use crate::room::{RoomState, RoundResult};

/// One roster entry with its revealed role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsPlayer {
    pub id: PlayerId,
    pub kind: PlayerKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    pub eliminated: bool,
}

/// The persisted record for a finished game: room metadata, final topic,
/// the full roster with roles, the complete message log, and every round's
/// ballots and outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStats {
    pub room_code: String,
    pub max_humans: u8,
    pub total_players: u8,
    pub topic: String,
    pub winner: Winner,
    pub rounds_played: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: DateTime<Utc>,
    pub players: Vec<StatsPlayer>,
    pub messages: Vec<ChatMessage>,
    pub rounds: Vec<RoundResult>,
}

impl GameStats {
    /// Capture the record from final room state. Called under the room
    /// lock, after the winner has been decided.
    pub fn capture(code: &str, state: &RoomState, winner: Winner) -> Self {
        let mut players: Vec<StatsPlayer> = state
            .players
            .iter()
            .map(|p| StatsPlayer {
                id: p.id,
                kind: p.kind,
                persona: p.persona.clone(),
                eliminated: p.eliminated,
            })
            .collect();
        players.sort_by_key(|p| p.id);

        Self {
            room_code: code.to_string(),
            max_humans: state.max_humans,
            total_players: state.total_players,
            topic: state.topic.clone(),
            winner,
            rounds_played: state.round,
            started_at: state.started_at,
            ended_at: state.ended_at.unwrap_or_else(Utc::now),
            players,
            messages: state.messages.clone(),
            rounds: state.round_results.clone(),
        }
    }

    /// Target filename: `{room_code}-{unix_seconds}.json`.
    pub fn filename(&self) -> String {
        format!("{}-{}.json", self.room_code, self.ended_at.timestamp())
    }
}

/// Write the record under `dir`, creating the directory if needed.
/// Returns the path written.
pub async fn write_stats(dir: &Path, stats: &GameStats) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(stats.filename());
    let body = serde_json::to_vec_pretty(stats)?;
    tokio::fs::write(&path, body).await?;
    tracing::info!(
        room_code = %stats.room_code,
        path = %path.display(),
        "game stats flushed"
    );
    Ok(path)
}
