//! Move submission state machine: local legality check, optimistic update,
//! and branching on the server verdict.

use chess_core::parse_uci;
use chess_core::shakmaty::{uci::UciMove, Role, Square};
use chess_core::RulesEngine;

use crate::api::MoveVerdict;
use crate::board::BoardState;
use crate::error::ClientError;
use crate::loader::LoadedPuzzle;
use crate::replay::SolutionReplay;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Forced opening move scheduled but not yet played
    AwaitingOpening,
    /// Waiting for the learner's move
    Idle,
    /// A move is on the board optimistically and awaiting the verdict
    Pending { uci: String },
    /// Puzzle solved; only rating and "next" remain
    Solved,
    /// Wrong move; stepping through the solution
    SolutionReveal,
    /// Puzzle over without a reveal (no solution, or server moves that do not fit); the next puzzle is due
    Exhausted,
    /// Next puzzle requested
    Advancing,
    /// The set is used up; the session summary is still to be fetched
    Ending,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::AwaitingOpening => "awaiting the opening move",
            Phase::Idle => "idle",
            Phase::Pending { .. } => "a move is pending",
            Phase::Solved => "the puzzle is solved",
            Phase::SolutionReveal => "the solution is shown",
            Phase::Exhausted => "the puzzle is over",
            Phase::Advancing => "loading the next puzzle",
            Phase::Ending => "ending the session",
        }
    }

    /// The board accepts drops only while idle.
    pub fn accepts_moves(&self) -> bool {
        matches!(self, Phase::Idle)
    }

    /// States from which "next puzzle" may be requested.
    pub fn can_advance(&self) -> bool {
        matches!(self, Phase::Solved | Phase::SolutionReveal | Phase::Exhausted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Illegal locally; nothing was sent and nothing changed
    Rejected,
    /// Correct, puzzle continues; `reply` is the scripted answer already on the board
    Continue { reply: Option<String> },
    Solved,
    /// Incorrect; the board was reset and the solution is ready to step through
    SolutionShown { moves: usize },
    /// Incorrect without a solution; the next puzzle should be fetched
    PuzzleExhausted,
    /// The response belonged to a puzzle that is no longer shown
    Stale,
}

#[derive(Debug, Clone)]
pub struct MoveSubmissionPipeline {
    phase: Phase,
    failed_move: Option<UciMove>,
}

impl MoveSubmissionPipeline {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            failed_move: None,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn set_phase(&mut self, phase: Phase) {
        tracing::debug!(from = self.phase.name(), to = phase.name(), "Phase change");
        self.phase = phase;
    }

    pub fn failed_move(&self) -> Option<&UciMove> {
        self.failed_move.as_ref()
    }

    /// Check a drop with the rules engine and, if legal, play it optimistically.
    /// `Ok(None)` is a local rejection: no state was touched.
    pub fn attempt(
        &mut self,
        rules: &dyn RulesEngine,
        board: &mut BoardState,
        from: Square,
        to: Square,
        promotion: Option<Role>,
    ) -> Result<Option<UciMove>, ClientError> {
        if !self.phase.accepts_moves() {
            return Err(ClientError::InputLocked(self.phase.name()));
        }

        let Some(legal) = rules.attempt_move(board.position(), from, to, promotion) else {
            tracing::debug!(%from, %to, "Move rejected locally");
            return Ok(None);
        };

        self.play_optimistic(board, legal.uci.clone())?;
        Ok(Some(legal.uci))
    }

    /// Re-play a move whose submission failed, so it can be sent again.
    pub fn retry(&mut self, board: &mut BoardState) -> Result<Option<UciMove>, ClientError> {
        if !self.phase.accepts_moves() {
            return Err(ClientError::InputLocked(self.phase.name()));
        }
        let Some(mv) = self.failed_move.clone() else {
            return Ok(None);
        };
        self.play_optimistic(board, mv.clone())?;
        Ok(Some(mv))
    }

    fn play_optimistic(&mut self, board: &mut BoardState, mv: UciMove) -> Result<(), ClientError> {
        board.push(mv.clone())?;
        self.failed_move = None;
        self.set_phase(Phase::Pending {
            uci: mv.to_string(),
        });
        Ok(())
    }

    /// The round trip failed: take the optimistic move back and remember it.
    pub fn fail(&mut self, board: &mut BoardState) {
        if let Phase::Pending { .. } = self.phase {
            self.failed_move = board.rollback();
            self.set_phase(Phase::Idle);
        }
    }

    /// Apply the server verdict for the pending move.
    ///
    /// A verdict whose moves do not fit the board ends the puzzle: the
    /// learner's move is taken back and the phase becomes `Exhausted`, so
    /// "next" stays available.
    pub fn resolve(
        &mut self,
        verdict: &MoveVerdict,
        puzzle: &LoadedPuzzle,
        board: &mut BoardState,
    ) -> Result<(MoveOutcome, Option<SolutionReplay>), ClientError> {
        if verdict.correct {
            let reply = match verdict.next_move.as_deref() {
                Some(text) => {
                    let played = parse_uci(text)
                        .map_err(ClientError::from)
                        .and_then(|mv| board.push(mv).map_err(ClientError::from));
                    if played.is_err() {
                        return Err(self.abandon(board, text));
                    }
                    Some(text.to_string())
                }
                None => None,
            };

            if verdict.puzzle_solved {
                self.set_phase(Phase::Solved);
                return Ok((MoveOutcome::Solved, None));
            }

            self.set_phase(Phase::Idle);
            return Ok((MoveOutcome::Continue { reply }, None));
        }

        match verdict.solution.as_deref() {
            Some(solution) => {
                let revealed = SolutionReplay::new(
                    puzzle.base().clone(),
                    puzzle.opening_move().cloned(),
                    solution,
                )
                .and_then(|replay| replay.board().map(|start| (replay, start)));

                let (replay, start) = match revealed {
                    Ok(revealed) => revealed,
                    Err(_) => return Err(self.abandon(board, &solution.join(" "))),
                };

                // Discard every learner move: back to the post-opening position
                *board = start;
                self.set_phase(Phase::SolutionReveal);
                Ok((
                    MoveOutcome::SolutionShown {
                        moves: replay.len(),
                    },
                    Some(replay),
                ))
            }
            None => {
                board.rollback();
                self.set_phase(Phase::Exhausted);
                Ok((MoveOutcome::PuzzleExhausted, None))
            }
        }
    }

    fn abandon(&mut self, board: &mut BoardState, server_moves: &str) -> ClientError {
        tracing::warn!(moves = server_moves, "Server moves do not fit the board; abandoning puzzle");
        if matches!(self.phase, Phase::Pending { .. }) {
            board.rollback();
        }
        self.set_phase(Phase::Exhausted);
        ClientError::MalformedServerMove(server_moves.to_string())
    }
}
