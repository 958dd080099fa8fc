#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_excessive_bools
)]

//! # Turing Hunt Server
//!
//! A multi-room social-deduction game server: a few humans share a chat
//! room with several LLM-driven players, then vote each round to find the
//! AI. Everything lives in one process and in memory; plug in a transport
//! adapter and go.

/// AI participants: personas, topics, decision/generation policy
pub mod agents;

/// Per-room ordered event fan-out
pub mod bus;

/// Server configuration and environment variables
pub mod config;

/// Text-generation backends
pub mod llm;

/// Structured logging configuration
pub mod logging;

/// Wire types, events, and the error taxonomy
pub mod protocol;

/// Process-wide room registry
pub mod registry;

/// Retry logic utilities
pub mod retry;

/// Room state and locking
pub mod room;

/// Game orchestration: lifecycle, phases, scheduler, votes, stats
pub mod server;

/// Bundled HTTP/WebSocket transport adapter
pub mod transport;
