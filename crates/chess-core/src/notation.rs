//! FEN and UCI helpers on top of shakmaty.

use shakmaty::{
    fen::Fen, uci::UciMove, CastlingMode, Chess, Color, EnPassantMode, Position, Square,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    #[error("Invalid FEN '{fen}': {reason}")]
    Fen { fen: String, reason: String },

    #[error("Invalid position '{fen}': {reason}")]
    Position { fen: String, reason: String },

    #[error("Invalid UCI move '{0}'")]
    Uci(String),

    #[error("Invalid square '{0}'")]
    Square(String),

    #[error("Illegal move {uci} in {fen}")]
    IllegalMove { uci: String, fen: String },
}

/// Parse a FEN record into a playable position (standard castling rules).
pub fn parse_fen(fen: &str) -> Result<Chess, NotationError> {
    let parsed: Fen = fen.trim().parse().map_err(|e| NotationError::Fen {
        fen: fen.to_string(),
        reason: format!("{e}"),
    })?;

    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|e| NotationError::Position {
            fen: fen.to_string(),
            reason: format!("{e}"),
        })
}

pub fn to_fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Parse a 4-or-5 character UCI move ("e2e4", "e7e8q").
/// Drops and null moves are not valid puzzle moves.
pub fn parse_uci(text: &str) -> Result<UciMove, NotationError> {
    let trimmed = text.trim();
    if !(4..=5).contains(&trimmed.len()) {
        return Err(NotationError::Uci(text.to_string()));
    }

    let uci: UciMove = trimmed
        .parse()
        .map_err(|_| NotationError::Uci(text.to_string()))?;

    match uci {
        UciMove::Normal { .. } => Ok(uci),
        _ => Err(NotationError::Uci(text.to_string())),
    }
}

pub fn parse_square(text: &str) -> Result<Square, NotationError> {
    text.trim()
        .parse()
        .map_err(|_| NotationError::Square(text.to_string()))
}

/// Play one UCI move on a copy of `pos`, checking legality.
pub fn play_uci(pos: &Chess, uci: &UciMove) -> Result<Chess, NotationError> {
    let mv = uci.to_move(pos).map_err(|_| NotationError::IllegalMove {
        uci: uci.to_string(),
        fen: to_fen(pos),
    })?;

    let mut next = pos.clone();
    next.play_unchecked(mv);
    Ok(next)
}

/// Board orientation for a puzzle's base position.
///
/// The side to move in the base position is the opponent (its move is the
/// forced opening move), so the learner sits on the other side.
pub fn orientation(pos: &Chess) -> Color {
    pos.turn().other()
}

/// Same rule as [`orientation`], reading only the active-color field.
pub fn orientation_from_fen(fen: &str) -> Result<Color, NotationError> {
    match fen.split_whitespace().nth(1) {
        Some("w") => Ok(Color::Black),
        Some("b") => Ok(Color::White),
        _ => Err(NotationError::Fen {
            fen: fen.to_string(),
            reason: "missing or invalid active color".to_string(),
        }),
    }
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}
