//! Chess primitives shared by the Woodpecker client: position notation,
//! UCI move encoding and the rules-legality capability.

pub mod notation;
pub mod rules;

pub use notation::{
    color_name, orientation, orientation_from_fen, parse_fen, parse_square, parse_uci, play_uci,
    to_fen, NotationError,
};
pub use rules::{LegalMove, RulesEngine, StandardRules};

pub use shakmaty;
