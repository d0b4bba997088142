//! Turns a server puzzle into an initial board state and orientation.

use chess_core::shakmaty::{uci::UciMove, Chess, Color};
use chess_core::{orientation, parse_fen, parse_uci, play_uci};

use crate::api::Puzzle;
use crate::board::BoardState;
use crate::error::ClientError;

/// A puzzle accepted by the client, tagged with the generation it was loaded under.
#[derive(Debug, Clone)]
pub struct LoadedPuzzle {
    puzzle: Puzzle,
    generation: u64,
    base: Chess,
    opening_move: Option<UciMove>,
    orientation: Color,
}

impl LoadedPuzzle {
    /// Parse and validate the puzzle. The returned board shows the bare base
    /// position; the forced opening move (if any) is applied later.
    pub fn load(puzzle: Puzzle, generation: u64) -> Result<(Self, BoardState), ClientError> {
        let base = parse_fen(&puzzle.fen)?;

        let opening_move = match puzzle.initial_move.as_deref() {
            Some(text) if !text.trim().is_empty() => {
                let mv = parse_uci(text)?;
                play_uci(&base, &mv)
                    .map_err(|_| ClientError::MalformedServerMove(text.to_string()))?;
                Some(mv)
            }
            _ => None,
        };

        let loaded = Self {
            orientation: orientation(&base),
            puzzle,
            generation,
            opening_move,
            base,
        };

        tracing::debug!(
            puzzle_id = loaded.puzzle.id,
            generation,
            opening_move = ?loaded.opening_move.as_ref().map(|m| m.to_string()),
            "Puzzle loaded"
        );

        let board = BoardState::new(loaded.base.clone());
        Ok((loaded, board))
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn id(&self) -> i64 {
        self.puzzle.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn base(&self) -> &Chess {
        &self.base
    }

    pub fn opening_move(&self) -> Option<&UciMove> {
        self.opening_move.as_ref()
    }

    /// Side the learner plays, i.e. the side *not* to move in the base position.
    pub fn orientation(&self) -> Color {
        self.orientation
    }

    /// Moves that lead from the base position to the learner's first decision.
    pub fn opening_line(&self) -> Vec<UciMove> {
        self.opening_move.iter().cloned().collect()
    }

    /// Base position folded with the forced opening move.
    pub fn starting_board(&self) -> Result<BoardState, ClientError> {
        Ok(BoardState::replay(&self.base, &self.opening_line())?)
    }

    /// Apply the forced opening move to a board still showing the base position.
    pub fn apply_opening_move(&self, board: &mut BoardState) -> Result<bool, ClientError> {
        match &self.opening_move {
            Some(mv) if board.moves().is_empty() => {
                board.push(mv.clone())?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
