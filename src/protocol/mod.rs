//! Wire types shared by the game core and transport adapters: player and
//! room types, the broadcast event model, room codes, input validation,
//! and the caller-visible error taxonomy.

pub mod error_codes;
pub mod events;
pub mod room_codes;
pub mod types;
pub mod validation;

pub use error_codes::{ErrorCode, GameError};
pub use events::{EventEnvelope, GameEvent, RoomSnapshot};
pub use types::{
    ChatMessage, HumanKey, Phase, Player, PlayerId, PlayerKind, PlayerPublic, PlayerRole,
    RoomInfo, RoomStatus, RoomSummary, Sender, TerminationReason, Winner, ROOM_CODE_LENGTH,
};
