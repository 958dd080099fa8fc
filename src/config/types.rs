//! Root configuration types.

use super::defaults::{default_cors_origins, default_port};
use super::game::GameConfig;
use super::llm::LlmConfig;
use super::logging::LoggingConfig;
use super::stats::StatsConfig;
use serde::{Deserialize, Serialize};

/// Root configuration struct for the server.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Comma-separated allowed CORS origins, or "*" for permissive
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors_origins: default_cors_origins(),
            game: GameConfig::default(),
            llm: LlmConfig::default(),
            stats: StatsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
