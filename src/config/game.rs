//! Game behavior configuration: lifecycle bounds, phase timers, and the
//! agent scheduler knobs.

use super::defaults::{
    default_bus_buffer_size, default_discussion_seconds, default_generate_timeout_ms,
    default_max_humans_cap, default_max_message_chars, default_max_rooms,
    default_max_utterance_chars, default_min_agent_spacing_seconds,
    default_min_discussion_seconds, default_probe_timeout_ms, default_rounds_to_win,
    default_snapshot_message_window, default_total_players_cap, default_voting_seconds,
    default_worker_pool_size,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for room lifecycle, phase timers, and agent scheduling.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GameConfig {
    /// Cap on live rooms across the process
    #[serde(default = "default_max_rooms")]
    pub max_rooms: usize,
    /// Length of the discussion phase (seconds)
    #[serde(default = "default_discussion_seconds")]
    pub discussion_seconds: u64,
    /// Length of the voting phase (seconds)
    #[serde(default = "default_voting_seconds")]
    pub voting_seconds: u64,
    /// Round count humans must reach (or an AI must fall by) to win
    #[serde(default = "default_rounds_to_win")]
    pub rounds_to_win: u32,
    /// Stricter win rule: humans must survive `rounds_to_win` full rounds
    /// even when an AI is eliminated earlier
    #[serde(default)]
    pub require_full_rounds: bool,
    /// Maximum human seats per room
    #[serde(default = "default_max_humans_cap")]
    pub max_humans_cap: u8,
    /// Maximum total seats per room
    #[serde(default = "default_total_players_cap")]
    pub total_players_cap: u8,
    /// Minimum spacing between two utterances of the same agent (seconds)
    #[serde(default = "default_min_agent_spacing_seconds")]
    pub min_agent_spacing_seconds: u64,
    /// Deadline for a single "should this agent speak" probe (milliseconds)
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Deadline for a single utterance generation (milliseconds)
    #[serde(default = "default_generate_timeout_ms")]
    pub generate_timeout_ms: u64,
    /// Number of concurrent generation workers shared by all rooms
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,
    /// How many recent messages a subscription snapshot carries
    #[serde(default = "default_snapshot_message_window")]
    pub snapshot_message_window: usize,
    /// Per-subscriber event buffer; overflowing subscribers are dropped
    #[serde(default = "default_bus_buffer_size")]
    pub bus_buffer_size: usize,
    /// Cap on agents generating simultaneously in one room.
    /// `None` means `ceil(total_players / 2)`.
    #[serde(default)]
    pub max_concurrent_agents: Option<usize>,
    /// End discussion early once every live human has spoken this round
    #[serde(default)]
    pub end_discussion_when_all_spoken: bool,
    /// Floor for the early-end rule (seconds)
    #[serde(default = "default_min_discussion_seconds")]
    pub min_discussion_seconds: u64,
    /// Include the vote target in broadcast `VoteCast` events
    #[serde(default)]
    pub reveal_vote_targets: bool,
    /// Hard cap on generated agent utterances (characters)
    #[serde(default = "default_max_utterance_chars")]
    pub max_utterance_chars: usize,
    /// Hard cap on human chat messages (characters)
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

impl GameConfig {
    pub fn discussion_duration(&self) -> Duration {
        Duration::from_secs(self.discussion_seconds)
    }

    pub fn voting_duration(&self) -> Duration {
        Duration::from_secs(self.voting_seconds)
    }

    pub fn min_discussion_duration(&self) -> Duration {
        Duration::from_secs(self.min_discussion_seconds)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn generate_timeout(&self) -> Duration {
        Duration::from_millis(self.generate_timeout_ms)
    }

    pub fn agent_spacing(&self) -> Duration {
        Duration::from_secs(self.min_agent_spacing_seconds)
    }

    /// Effective cap on simultaneously generating agents for a room of the
    /// given size.
    pub fn concurrent_agent_cap(&self, total_players: u8) -> usize {
        self.max_concurrent_agents
            .unwrap_or_else(|| usize::from(total_players).div_ceil(2))
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_rooms: default_max_rooms(),
            discussion_seconds: default_discussion_seconds(),
            voting_seconds: default_voting_seconds(),
            rounds_to_win: default_rounds_to_win(),
            require_full_rounds: false,
            max_humans_cap: default_max_humans_cap(),
            total_players_cap: default_total_players_cap(),
            min_agent_spacing_seconds: default_min_agent_spacing_seconds(),
            probe_timeout_ms: default_probe_timeout_ms(),
            generate_timeout_ms: default_generate_timeout_ms(),
            worker_pool_size: default_worker_pool_size(),
            snapshot_message_window: default_snapshot_message_window(),
            bus_buffer_size: default_bus_buffer_size(),
            max_concurrent_agents: None,
            end_discussion_when_all_spoken: false,
            min_discussion_seconds: default_min_discussion_seconds(),
            reveal_vote_targets: false,
            max_utterance_chars: default_max_utterance_chars(),
            max_message_chars: default_max_message_chars(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrent_cap_defaults_to_half_the_table() {
        let config = GameConfig::default();
        assert_eq!(config.concurrent_agent_cap(5), 3);
        assert_eq!(config.concurrent_agent_cap(6), 3);
        assert_eq!(config.concurrent_agent_cap(12), 6);
    }

    #[test]
    fn concurrent_cap_honors_explicit_override() {
        let config = GameConfig {
            max_concurrent_agents: Some(2),
            ..GameConfig::default()
        };
        assert_eq!(config.concurrent_agent_cap(12), 2);
    }
}
