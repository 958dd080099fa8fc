//! Configuration module.
//!
//! Provides configuration management with support for JSON configuration
//! files, environment variable overrides, and sensible defaults.
//!
//! # Module Structure
//!
//! - [`types`]: Root `Config` struct
//! - [`game`]: Game behavior (rooms, phases, scheduler)
//! - [`llm`]: LLM provider selection and request parameters
//! - [`stats`]: Post-game record persistence
//! - [`logging`]: Logging configuration
//! - [`loader`]: Configuration loading functions
//! - [`validation`]: Configuration validation functions
//! - [`defaults`]: Default value functions

pub mod defaults;
pub mod game;
pub mod llm;
pub mod loader;
pub mod logging;
pub mod stats;
pub mod types;
pub mod validation;

pub use game::GameConfig;
pub use llm::{LlmConfig, LlmProviderKind};
pub use loader::load;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use stats::StatsConfig;
pub use types::Config;
pub use validation::validate_config;
