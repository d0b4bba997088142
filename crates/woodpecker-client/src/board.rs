//! Displayed board state, always derived by folding moves over a base position.

use chess_core::shakmaty::{uci::UciMove, Chess, Color, Position};
use chess_core::{play_uci, to_fen, NotationError};

/// `position == fold(moves, origin)` holds after every public operation.
/// There is no way to edit `position` other than through the move list.
#[derive(Debug, Clone)]
pub struct BoardState {
    origin: Chess,
    moves: Vec<UciMove>,
    position: Chess,
    last_move: Option<UciMove>,
}

impl BoardState {
    pub fn new(origin: Chess) -> Self {
        Self {
            position: origin.clone(),
            origin,
            moves: Vec::new(),
            last_move: None,
        }
    }

    /// Rebuild from scratch: fold `moves` over `origin`.
    /// The last folded move becomes the highlighted last move.
    pub fn replay(origin: &Chess, moves: &[UciMove]) -> Result<Self, NotationError> {
        let position = moves
            .iter()
            .try_fold(origin.clone(), |pos, mv| play_uci(&pos, mv))?;

        Ok(Self {
            origin: origin.clone(),
            moves: moves.to_vec(),
            position,
            last_move: moves.last().cloned(),
        })
    }

    /// Extend the fold by one move and mark it as the last move.
    pub fn push(&mut self, mv: UciMove) -> Result<(), NotationError> {
        self.position = play_uci(&self.position, &mv)?;
        self.moves.push(mv.clone());
        self.last_move = Some(mv);
        Ok(())
    }

    /// Drop the most recent move by re-folding what remains.
    pub fn rollback(&mut self) -> Option<UciMove> {
        let undone = self.moves.pop()?;
        match Self::replay(&self.origin, &self.moves) {
            Ok(rebuilt) => {
                *self = rebuilt;
                Some(undone)
            }
            Err(_) => {
                self.moves.push(undone);
                None
            }
        }
    }

    pub fn set_last_move(&mut self, mv: Option<UciMove>) {
        self.last_move = mv;
    }

    pub fn origin(&self) -> &Chess {
        &self.origin
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn moves(&self) -> &[UciMove] {
        &self.moves
    }

    pub fn last_move(&self) -> Option<&UciMove> {
        self.last_move.as_ref()
    }

    pub fn fen(&self) -> String {
        to_fen(&self.position)
    }

    pub fn side_to_move(&self) -> Color {
        self.position.turn()
    }
}
