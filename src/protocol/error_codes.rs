use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::Phase;

/// Wire-level error codes for structured error handling
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Lookup errors
    NotFound,
    Terminated,

    // Validation errors
    InvalidParams,

    // Join errors
    RoomFull,
    AlreadyStarted,
    CapacityExceeded,

    // Gameplay errors
    PhaseMismatch,
    AlreadyVoted,

    // Server errors
    Unavailable,
    InternalError,
}

impl ErrorCode {
    /// Returns a human-readable description of this error code, suitable
    /// for direct display by transport adapters.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => {
                "The requested room or player could not be found. The room may have closed or the code is incorrect."
            }
            Self::Terminated => {
                "The room has ended. Create or join a different room to keep playing."
            }
            Self::InvalidParams => {
                "The provided input is invalid or malformed. Check your request parameters."
            }
            Self::RoomFull => {
                "The room has reached its human capacity. Try joining a different room."
            }
            Self::AlreadyStarted => {
                "The game is already in progress and no longer accepts new players."
            }
            Self::CapacityExceeded => {
                "The server has reached its room limit. Please try again later."
            }
            Self::PhaseMismatch => {
                "That action is not available in the current game phase."
            }
            Self::AlreadyVoted => {
                "You have already cast a vote this round."
            }
            Self::Unavailable => {
                "The language model backend is temporarily unavailable. Please try again in a few moments."
            }
            Self::InternalError => {
                "An internal server error occurred. Please reconnect and try again."
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Error taxonomy visible to transport adapters.
///
/// User-initiated operations fail fast with one of these; no operation
/// partially mutates room state. Agent-side failures never surface here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("room or player not found")]
    NotFound,
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    #[error("room is full")]
    RoomFull,
    #[error("game already started")]
    AlreadyStarted,
    #[error("operation not allowed during the {actual} phase")]
    PhaseMismatch { actual: Phase },
    #[error("voter already has a vote this round")]
    AlreadyVoted,
    #[error("room has ended")]
    Terminated,
    #[error("room capacity exceeded")]
    CapacityExceeded,
    #[error("language model backend unavailable")]
    Unavailable,
    #[error("internal error: {0}")]
    Internal(String),
}

impl GameError {
    /// Wire code for this error, for transports that report structured errors.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound => ErrorCode::NotFound,
            Self::InvalidParams(_) => ErrorCode::InvalidParams,
            Self::RoomFull => ErrorCode::RoomFull,
            Self::AlreadyStarted => ErrorCode::AlreadyStarted,
            Self::PhaseMismatch { .. } => ErrorCode::PhaseMismatch,
            Self::AlreadyVoted => ErrorCode::AlreadyVoted,
            Self::Terminated => ErrorCode::Terminated,
            Self::CapacityExceeded => ErrorCode::CapacityExceeded,
            Self::Unavailable => ErrorCode::Unavailable,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }
}
