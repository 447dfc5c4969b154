use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Stable, machine-readable failure kinds shown to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ErrorKind {
    // Capability token
    MissingToken,
    InvalidSignature,
    MalformedToken,
    TokenExpired,
    // Turn engine
    GameNotFound,
    GameAlreadyStarted,
    AlreadyJoined,
    GameFull,
    NotEnoughPlayers,
    NotHost,
    NotYourTurn,
    IllegalCard,
    CardNotInHand,
    GameNotInProgress,
    PlayerNotInGame,
    InvalidUsername,
    // Request layer
    InvalidRequest,
    // Store
    Busy,
    Internal,
}

impl ErrorKind {
    /// Whether the same request may succeed if simply sent again
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Busy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
}
