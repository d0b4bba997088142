//! Rules-legality capability injected into the puzzle client.

use shakmaty::{uci::UciMove, Chess, Move, Position, Role, Square};

/// A move accepted by a [`RulesEngine`], with the position it produces.
#[derive(Debug, Clone)]
pub struct LegalMove {
    pub uci: UciMove,
    pub position: Chess,
}

impl LegalMove {
    pub fn is_promotion(&self) -> bool {
        matches!(self.uci, UciMove::Normal { promotion: Some(_), .. })
    }
}

/// Validates a proposed (from, to, promotion) against a position.
/// Returns `None` when the move is illegal.
pub trait RulesEngine {
    fn attempt_move(
        &self,
        position: &Chess,
        from: Square,
        to: Square,
        promotion: Option<Role>,
    ) -> Option<LegalMove>;
}

/// Standard chess rules backed by shakmaty. Unchosen promotions become queens.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

impl StandardRules {
    fn try_uci(position: &Chess, uci: UciMove) -> Option<LegalMove> {
        let mv: Move = uci.to_move(position).ok()?;
        let mut next = position.clone();
        next.play_unchecked(mv);
        Some(LegalMove { uci, position: next })
    }
}

impl RulesEngine for StandardRules {
    fn attempt_move(
        &self,
        position: &Chess,
        from: Square,
        to: Square,
        promotion: Option<Role>,
    ) -> Option<LegalMove> {
        let as_given = UciMove::Normal { from, to, promotion };
        if let Some(legal) = Self::try_uci(position, as_given) {
            return Some(legal);
        }

        if promotion.is_some() {
            return None;
        }

        // Plain pawn move to the last rank: default to a queen
        Self::try_uci(
            position,
            UciMove::Normal {
                from,
                to,
                promotion: Some(Role::Queen),
            },
        )
    }
}
