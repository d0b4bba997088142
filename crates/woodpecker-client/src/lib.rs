//! Woodpecker-method puzzle trainer client.
//!
//! Serves puzzles from a set, checks moves locally before sending them,
//! applies the server's verdicts and lets the learner step through the
//! solution after a mistake.

pub mod api;
pub mod board;
pub mod clients;
pub mod config;
pub mod error;
pub mod events;
pub mod hints;
pub mod history;
pub mod loader;
pub mod replay;
pub mod runtime;
pub mod session;
pub mod submission;
pub mod trainer;

pub use api::{PuzzleApi, Rating};
pub use clients::HttpApi;
pub use config::ClientConfig;
pub use error::ClientError;
pub use runtime::TrainerRuntime;
pub use submission::{MoveOutcome, Phase};
pub use trainer::{Key, KeyAction, NextOutcome, Trainer};
