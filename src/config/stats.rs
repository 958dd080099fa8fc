//! Post-game stats persistence configuration.

use super::defaults::default_stats_dir;
use serde::{Deserialize, Serialize};

/// Where finished-game records are written.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StatsConfig {
    /// Directory for `{room_code}-{unix_seconds}.json` records
    #[serde(default = "default_stats_dir")]
    pub dir: String,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            dir: default_stats_dir(),
        }
    }
}
