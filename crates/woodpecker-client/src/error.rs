//! Client error types

use chess_core::NotationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Notation(#[from] NotationError),

    #[error("Could not start session: {0}")]
    SessionCreate(String),

    #[error("No active session")]
    NoSession,

    #[error("No puzzle loaded")]
    NoPuzzle,

    #[error("Input is locked while {0}")]
    InputLocked(&'static str),

    #[error("Hint not available")]
    HintUnavailable,

    #[error("Rating not available")]
    RatingUnavailable,

    #[error("Session timer is already running")]
    TimerAlreadyArmed,

    #[error("Server sent a move that does not fit the board: {0}")]
    MalformedServerMove(String),
}

impl ClientError {
    /// True for failures of the round trip itself, as opposed to client-side guards.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Http(_) | ClientError::Status { .. } | ClientError::Json(_)
        )
    }
}
