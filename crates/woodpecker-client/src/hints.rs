//! One-shot hint reveal and free-form square highlighting.

use std::collections::BTreeSet;

use chess_core::shakmaty::Square;

/// At most one hint per puzzle instance. The hint is consumed as soon as it is
/// requested, so a second request cannot be issued while the first is in flight.
#[derive(Debug, Clone, Default)]
pub struct HintState {
    consumed: bool,
    square: Option<Square>,
}

impl HintState {
    pub fn is_available(&self) -> bool {
        !self.consumed
    }

    /// Claim the hint. Returns false if it was already used.
    pub fn consume(&mut self) -> bool {
        if self.consumed {
            return false;
        }
        self.consumed = true;
        true
    }

    pub fn reveal(&mut self, square: Square) {
        self.consumed = true;
        self.square = Some(square);
    }

    /// Give the hint back after a failed request.
    pub fn release(&mut self) {
        if self.square.is_none() {
            self.consumed = false;
        }
    }

    pub fn square(&self) -> Option<Square> {
        self.square
    }
}

/// Squares the learner marked for themselves. Purely cosmetic.
#[derive(Debug, Clone, Default)]
pub struct HighlightSet {
    squares: BTreeSet<Square>,
}

impl HighlightSet {
    /// Returns true if the square is highlighted after the toggle.
    pub fn toggle(&mut self, square: Square) -> bool {
        if self.squares.remove(&square) {
            false
        } else {
            self.squares.insert(square);
            true
        }
    }

    pub fn contains(&self, square: Square) -> bool {
        self.squares.contains(&square)
    }

    pub fn squares(&self) -> impl Iterator<Item = Square> + '_ {
        self.squares.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.squares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }
}
