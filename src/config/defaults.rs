//! Default value functions for configuration fields.
//!
//! All defaults used by serde's `#[serde(default = ...)]` attributes live
//! here so the serde defaults and the `Default` impls cannot drift apart.

use super::logging::LogFormat;

// =============================================================================
// Port & Root Config
// =============================================================================

pub const fn default_port() -> u16 {
    3547
}

// =============================================================================
// Game Defaults
// =============================================================================

pub const fn default_max_rooms() -> usize {
    1024
}

pub const fn default_discussion_seconds() -> u64 {
    180
}

pub const fn default_voting_seconds() -> u64 {
    60
}

pub const fn default_rounds_to_win() -> u32 {
    1
}

pub const fn default_max_humans_cap() -> u8 {
    4
}

pub const fn default_total_players_cap() -> u8 {
    12
}

pub const fn default_min_agent_spacing_seconds() -> u64 {
    4
}

pub const fn default_probe_timeout_ms() -> u64 {
    5_000
}

pub const fn default_generate_timeout_ms() -> u64 {
    15_000
}

pub const fn default_worker_pool_size() -> usize {
    10
}

pub const fn default_snapshot_message_window() -> usize {
    50
}

pub const fn default_bus_buffer_size() -> usize {
    256
}

/// Floor below which a discussion cannot end early even when every human
/// has already spoken.
pub const fn default_min_discussion_seconds() -> u64 {
    30
}

pub const fn default_max_utterance_chars() -> usize {
    280
}

pub const fn default_max_message_chars() -> usize {
    2_000
}

// =============================================================================
// LLM Defaults
// =============================================================================

pub fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

pub fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

// =============================================================================
// Stats Defaults
// =============================================================================

pub fn default_stats_dir() -> String {
    "stats".to_string()
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "server.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub const fn default_enable_file_logging() -> bool {
    true
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

// =============================================================================
// Transport Defaults
// =============================================================================

pub fn default_cors_origins() -> String {
    "http://localhost:3000,http://localhost:5173".to_string()
}
