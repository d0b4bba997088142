//! Post-mistake solution review: a cursor over a known move list.
//!
//! Every step backward rebuilds the board by folding the first `index`
//! solution moves over the starting position, so the displayed board is a
//! pure function of `(base, opening line, index)`.

use chess_core::parse_uci;
use chess_core::shakmaty::{uci::UciMove, Chess};

use crate::board::BoardState;
use crate::error::ClientError;

/// Drop a leading duplicate of the forced opening move.
pub fn strip_opening_move(solution: Vec<UciMove>, opening: Option<&UciMove>) -> Vec<UciMove> {
    let duplicated = matches!(
        (solution.first(), opening),
        (Some(first), Some(opening)) if first == opening
    );
    if duplicated {
        solution.into_iter().skip(1).collect()
    } else {
        solution
    }
}

#[derive(Debug, Clone)]
pub struct SolutionReplay {
    origin: Chess,
    opening: Vec<UciMove>,
    moves: Vec<UciMove>,
    index: usize,
}

impl SolutionReplay {
    /// Parse the server's solution and check it replays cleanly from the
    /// post-opening position. The cursor starts at 0.
    pub fn new(
        origin: Chess,
        opening: Option<UciMove>,
        solution: &[String],
    ) -> Result<Self, ClientError> {
        let parsed = solution
            .iter()
            .map(|text| parse_uci(text).map_err(|_| ClientError::MalformedServerMove(text.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        let moves = strip_opening_move(parsed, opening.as_ref());
        let replay = Self {
            origin,
            opening: opening.into_iter().collect(),
            moves,
            index: 0,
        };

        replay
            .board_at(replay.moves.len())
            .map_err(|e| ClientError::MalformedServerMove(e.to_string()))?;

        Ok(replay)
    }

    pub fn moves(&self) -> &[UciMove] {
        &self.moves
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Fold the opening line plus `moves[..index]` over the base position.
    /// The highlighted last move falls back to the opening move at index 0.
    pub fn board_at(&self, index: usize) -> Result<BoardState, ClientError> {
        let index = index.min(self.moves.len());
        let line: Vec<UciMove> = self
            .opening
            .iter()
            .chain(self.moves[..index].iter())
            .cloned()
            .collect();
        Ok(BoardState::replay(&self.origin, &line)?)
    }

    pub fn board(&self) -> Result<BoardState, ClientError> {
        self.board_at(self.index)
    }

    /// Apply the next solution move to `board`. No-op at the end of the line.
    pub fn step_forward(&mut self, board: &mut BoardState) -> Result<bool, ClientError> {
        let Some(mv) = self.moves.get(self.index).cloned() else {
            return Ok(false);
        };
        board.push(mv)?;
        self.index += 1;
        Ok(true)
    }

    /// Move the cursor back and rebuild the board from scratch.
    /// No-op (returns `None`) at index 0.
    pub fn step_backward(&mut self) -> Result<Option<BoardState>, ClientError> {
        if self.index == 0 {
            return Ok(None);
        }
        self.index -= 1;
        self.board().map(Some)
    }
}
