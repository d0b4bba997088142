//! The puzzle-session state machine.
//!
//! `Trainer` is synchronous: every network round trip is split into a
//! `begin_*` call that yields a ticket and a `finish_*` call that consumes it.
//! Tickets carry the session id and puzzle generation they were issued under,
//! and completions for anything other than the current puzzle are discarded.

use chess_core::shakmaty::{uci::UciMove, Color, Role, Square};
use chess_core::{parse_square, RulesEngine, StandardRules};

use crate::api::{Hint, MoveVerdict, PerformanceRecord, Puzzle, Rating, SessionStart, Summary};
use crate::board::BoardState;
use crate::error::ClientError;
use crate::events::{Event, OpeningTimer, Scheduler};
use crate::hints::{HighlightSet, HintState};
use crate::history::PerformanceHistoryView;
use crate::loader::LoadedPuzzle;
use crate::replay::SolutionReplay;
use crate::session::{Session, SessionController};
use crate::submission::{MoveOutcome, MoveSubmissionPipeline, Phase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    session_id: String,
    generation: u64,
}

impl Ticket {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone)]
pub struct MoveTicket {
    pub ticket: Ticket,
    uci: UciMove,
}

impl MoveTicket {
    /// Wire form of the move, with a promotion suffix only for promotions.
    pub fn uci(&self) -> String {
        self.uci.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct NextTicket {
    pub ticket: Ticket,
    resume: Phase,
}

#[derive(Debug, Clone)]
pub struct RatingTicket {
    pub ticket: Ticket,
    pub puzzle_id: i64,
    pub rating: Rating,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextOutcome {
    Loaded { puzzle_id: i64 },
    /// The set has no more puzzles; the session should end
    SetExhausted,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Enter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Ignored,
    Stepped,
    NextPuzzle,
    /// The set is used up and the session still has to be ended
    EndSession,
}

/// Everything scoped to one puzzle instance; dropped wholesale on "next".
struct PuzzleContext {
    loaded: LoadedPuzzle,
    board: BoardState,
    pipeline: MoveSubmissionPipeline,
    replay: Option<SolutionReplay>,
    hint: HintState,
    highlights: HighlightSet,
    rated: bool,
    opening_timer: Option<OpeningTimer>,
}

pub struct Trainer {
    rules: Box<dyn RulesEngine + Send + Sync>,
    scheduler: Scheduler,
    session: Option<SessionController>,
    puzzle: Option<PuzzleContext>,
    generation: u64,
    finished: Option<Session>,
    summary: Option<Summary>,
    history: PerformanceHistoryView,
}

impl Trainer {
    pub fn new(scheduler: Scheduler) -> Self {
        Self::with_rules(Box::new(StandardRules), scheduler)
    }

    pub fn with_rules(rules: Box<dyn RulesEngine + Send + Sync>, scheduler: Scheduler) -> Self {
        Self {
            rules,
            scheduler,
            session: None,
            puzzle: None,
            generation: 0,
            finished: None,
            summary: None,
            history: PerformanceHistoryView::default(),
        }
    }

    // ---- Session lifecycle ----

    /// Adopt a freshly created server session and load its first puzzle.
    /// A session still running is retired first.
    pub fn start_session(
        &mut self,
        puzzle_set_id: i64,
        start: SessionStart,
    ) -> Result<(), ClientError> {
        if let Some(previous) = self.session.take() {
            tracing::warn!(session_id = %previous.id(), "Replacing a running session");
            previous.retire();
        }
        self.teardown_puzzle();
        self.finished = None;
        self.summary = None;

        let mut controller = SessionController::new(Session {
            id: start.id,
            puzzle_set_id,
            score: start.score,
            elapsed_seconds: start.elapsed_seconds,
        });
        controller.arm(&self.scheduler)?;
        self.session = Some(controller);

        if let Err(e) = self.load_puzzle(start.puzzle) {
            tracing::warn!("First puzzle could not be loaded: {e}");
            if let Some(controller) = self.session.take() {
                controller.retire();
            }
            return Err(e);
        }
        Ok(())
    }

    /// Stop the ticker, drop the puzzle and keep the summary for display.
    pub fn end_session(&mut self, summary: Summary) -> Result<Session, ClientError> {
        let controller = self.session.take().ok_or(ClientError::NoSession)?;
        self.teardown_puzzle();
        let session = controller.retire();
        self.finished = Some(session.clone());
        self.summary = Some(summary);
        Ok(session)
    }

    /// Replace the history list, highlighting the record of the last summary.
    pub fn refresh_history(&mut self, records: Vec<PerformanceRecord>) {
        let current = self
            .summary
            .as_ref()
            .and_then(|s| s.performance_id.clone());
        self.history.refresh(records, current);
    }

    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Tick { session_id } => self
                .session
                .as_mut()
                .is_some_and(|s| s.tick(&session_id)),
            Event::OpeningMoveDue { generation } => self.play_opening_move(generation),
        }
    }

    // ---- Puzzle loading ----

    fn teardown_puzzle(&mut self) {
        // Dropping the context aborts a pending opening-move timer
        self.puzzle = None;
    }

    fn load_puzzle(&mut self, puzzle: Puzzle) -> Result<(), ClientError> {
        self.teardown_puzzle();
        self.generation += 1;

        let (loaded, board) = LoadedPuzzle::load(puzzle, self.generation)?;
        let (phase, opening_timer) = if loaded.opening_move().is_some() {
            (
                Phase::AwaitingOpening,
                Some(self.scheduler.schedule_opening_move(self.generation)),
            )
        } else {
            (Phase::Idle, None)
        };

        self.puzzle = Some(PuzzleContext {
            loaded,
            board,
            pipeline: MoveSubmissionPipeline::new(phase),
            replay: None,
            hint: HintState::default(),
            highlights: HighlightSet::default(),
            rated: false,
            opening_timer,
        });
        Ok(())
    }

    fn play_opening_move(&mut self, generation: u64) -> bool {
        let Some(ctx) = self.puzzle.as_mut() else {
            return false;
        };
        if ctx.loaded.generation() != generation || ctx.pipeline.phase() != &Phase::AwaitingOpening {
            tracing::warn!(generation, current = ctx.loaded.generation(), "Discarding stale opening move");
            return false;
        }

        ctx.opening_timer = None;
        match ctx.loaded.apply_opening_move(&mut ctx.board) {
            Ok(applied) => {
                ctx.pipeline.set_phase(Phase::Idle);
                applied
            }
            Err(e) => {
                tracing::warn!("Failed to play opening move: {e}");
                ctx.pipeline.set_phase(Phase::Idle);
                false
            }
        }
    }

    // ---- Tickets ----

    fn ticket(&self) -> Result<Ticket, ClientError> {
        let session = self.session.as_ref().ok_or(ClientError::NoSession)?;
        let ctx = self.puzzle.as_ref().ok_or(ClientError::NoPuzzle)?;
        Ok(Ticket {
            session_id: session.id().to_string(),
            generation: ctx.loaded.generation(),
        })
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        let session_matches = self
            .session
            .as_ref()
            .is_some_and(|s| s.id() == ticket.session_id);
        let puzzle_matches = self
            .puzzle
            .as_ref()
            .is_some_and(|p| p.loaded.generation() == ticket.generation);
        session_matches && puzzle_matches
    }

    fn context_mut(&mut self) -> Result<&mut PuzzleContext, ClientError> {
        self.puzzle.as_mut().ok_or(ClientError::NoPuzzle)
    }

    // ---- Moves ----

    /// Handle a drop of the piece on `from` onto `to`.
    /// `Ok(None)` means the move was rejected locally and nothing is to be sent.
    pub fn begin_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Role>,
    ) -> Result<Option<MoveTicket>, ClientError> {
        let ticket = self.ticket()?;
        let rules = self.rules.as_ref();
        let ctx = self.puzzle.as_mut().ok_or(ClientError::NoPuzzle)?;

        let uci = ctx
            .pipeline
            .attempt(rules, &mut ctx.board, from, to, promotion)?;
        Ok(uci.map(|uci| MoveTicket { ticket, uci }))
    }

    /// Re-send the move whose last submission failed.
    pub fn retry_ticket(&mut self) -> Result<Option<MoveTicket>, ClientError> {
        let ticket = self.ticket()?;
        let ctx = self.context_mut()?;
        let uci = ctx.pipeline.retry(&mut ctx.board)?;
        Ok(uci.map(|uci| MoveTicket { ticket, uci }))
    }

    pub fn finish_move(
        &mut self,
        ticket: MoveTicket,
        result: Result<MoveVerdict, ClientError>,
    ) -> Result<MoveOutcome, ClientError> {
        if !self.is_current(&ticket.ticket) {
            tracing::warn!(uci = %ticket.uci, "Discarding move response for a replaced puzzle");
            return Ok(MoveOutcome::Stale);
        }

        let verdict = match result {
            Ok(verdict) => verdict,
            Err(e) => {
                let ctx = self.context_mut()?;
                ctx.pipeline.fail(&mut ctx.board);
                return Err(e);
            }
        };

        if let Some(session) = self.session.as_mut() {
            session.set_score(verdict.score);
        }

        let ctx = self.context_mut()?;
        let (outcome, replay) = ctx.pipeline.resolve(&verdict, &ctx.loaded, &mut ctx.board)?;
        if replay.is_some() {
            ctx.replay = replay;
        }

        tracing::debug!(uci = %ticket.uci, correct = verdict.correct, ?outcome, "Move resolved");
        Ok(outcome)
    }

    // ---- Next puzzle ----

    pub fn begin_next(&mut self) -> Result<NextTicket, ClientError> {
        let ticket = self.ticket()?;
        let ctx = self.context_mut()?;
        let phase = ctx.pipeline.phase().clone();
        if !phase.can_advance() {
            return Err(ClientError::InputLocked(phase.name()));
        }
        ctx.pipeline.set_phase(Phase::Advancing);
        Ok(NextTicket {
            ticket,
            resume: phase,
        })
    }

    pub fn finish_next(
        &mut self,
        ticket: NextTicket,
        result: Result<Option<Puzzle>, ClientError>,
    ) -> Result<NextOutcome, ClientError> {
        if !self.is_current(&ticket.ticket) {
            tracing::warn!("Discarding next-puzzle response for a replaced puzzle");
            return Ok(NextOutcome::Stale);
        }

        match result {
            Ok(Some(puzzle)) => {
                let puzzle_id = puzzle.id;
                self.load_puzzle(puzzle)?;
                Ok(NextOutcome::Loaded { puzzle_id })
            }
            Ok(None) => {
                tracing::info!("Puzzle set exhausted");
                self.context_mut()?.pipeline.set_phase(Phase::Ending);
                Ok(NextOutcome::SetExhausted)
            }
            Err(e) => {
                self.context_mut()?.pipeline.set_phase(ticket.resume);
                Err(e)
            }
        }
    }

    // ---- Hints & highlights ----

    pub fn begin_hint(&mut self) -> Result<Ticket, ClientError> {
        let ticket = self.ticket()?;
        let ctx = self.context_mut()?;
        let allowed = matches!(
            ctx.pipeline.phase(),
            Phase::AwaitingOpening | Phase::Idle | Phase::Pending { .. }
        );
        if !allowed || !ctx.hint.consume() {
            return Err(ClientError::HintUnavailable);
        }
        Ok(ticket)
    }

    /// Returns the hinted square, or `None` if the response was stale.
    pub fn finish_hint(
        &mut self,
        ticket: Ticket,
        result: Result<Hint, ClientError>,
    ) -> Result<Option<Square>, ClientError> {
        if !self.is_current(&ticket) {
            tracing::warn!("Discarding hint for a replaced puzzle");
            return Ok(None);
        }

        let ctx = self.context_mut()?;
        let hint = match result {
            Ok(hint) => hint,
            Err(e) => {
                ctx.hint.release();
                return Err(e);
            }
        };

        match parse_square(&hint.square) {
            Ok(square) => {
                ctx.hint.reveal(square);
                Ok(Some(square))
            }
            Err(e) => {
                ctx.hint.release();
                Err(e.into())
            }
        }
    }

    pub fn toggle_highlight(&mut self, square: Square) -> Result<bool, ClientError> {
        Ok(self.context_mut()?.highlights.toggle(square))
    }

    // ---- Rating ----

    pub fn begin_rating(&mut self, rating: Rating) -> Result<RatingTicket, ClientError> {
        let ticket = self.ticket()?;
        let ctx = self.context_mut()?;
        let allowed = matches!(ctx.pipeline.phase(), Phase::Solved | Phase::SolutionReveal);
        if !allowed || ctx.rated {
            return Err(ClientError::RatingUnavailable);
        }
        ctx.rated = true;
        Ok(RatingTicket {
            ticket,
            puzzle_id: ctx.loaded.id(),
            rating,
        })
    }

    pub fn finish_rating(
        &mut self,
        ticket: RatingTicket,
        result: Result<(), ClientError>,
    ) -> Result<(), ClientError> {
        if let Err(e) = result {
            if self.is_current(&ticket.ticket) {
                self.context_mut()?.rated = false;
            }
            return Err(e);
        }
        Ok(())
    }

    // ---- Solution replay ----

    pub fn step_forward(&mut self) -> Result<bool, ClientError> {
        let ctx = self.context_mut()?;
        if ctx.pipeline.phase() != &Phase::SolutionReveal {
            return Ok(false);
        }
        match ctx.replay.as_mut() {
            Some(replay) => replay.step_forward(&mut ctx.board),
            None => Ok(false),
        }
    }

    pub fn step_backward(&mut self) -> Result<bool, ClientError> {
        let ctx = self.context_mut()?;
        if ctx.pipeline.phase() != &Phase::SolutionReveal {
            return Ok(false);
        }
        let Some(replay) = ctx.replay.as_mut() else {
            return Ok(false);
        };
        match replay.step_backward()? {
            Some(board) => {
                ctx.board = board;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn key(&mut self, key: Key) -> Result<KeyAction, ClientError> {
        let stepped = match key {
            Key::Left => self.step_backward()?,
            Key::Right => self.step_forward()?,
            Key::Enter => {
                return Ok(match self.phase() {
                    Some(Phase::Ending) => KeyAction::EndSession,
                    Some(phase) if phase.can_advance() => KeyAction::NextPuzzle,
                    _ => KeyAction::Ignored,
                });
            }
        };
        Ok(if stepped {
            KeyAction::Stepped
        } else {
            KeyAction::Ignored
        })
    }

    // ---- Read access ----

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref().map(SessionController::session)
    }

    pub fn is_ticking(&self) -> bool {
        self.session.as_ref().is_some_and(SessionController::is_ticking)
    }

    pub fn finished_session(&self) -> Option<&Session> {
        self.finished.as_ref()
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    pub fn history(&self) -> &PerformanceHistoryView {
        &self.history
    }

    pub fn score(&self) -> Option<i64> {
        self.session().map(|s| s.score)
    }

    pub fn elapsed_seconds(&self) -> Option<u64> {
        self.session().map(|s| s.elapsed_seconds)
    }

    pub fn puzzle(&self) -> Option<&Puzzle> {
        self.puzzle.as_ref().map(|p| p.loaded.puzzle())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn board(&self) -> Option<&BoardState> {
        self.puzzle.as_ref().map(|p| &p.board)
    }

    pub fn fen(&self) -> Option<String> {
        self.board().map(BoardState::fen)
    }

    pub fn orientation(&self) -> Option<Color> {
        self.puzzle.as_ref().map(|p| p.loaded.orientation())
    }

    pub fn side_to_move(&self) -> Option<Color> {
        self.board().map(BoardState::side_to_move)
    }

    pub fn last_move(&self) -> Option<String> {
        self.board()?.last_move().map(|m| m.to_string())
    }

    pub fn phase(&self) -> Option<&Phase> {
        self.puzzle.as_ref().map(|p| p.pipeline.phase())
    }

    /// Whether the board surface should accept drags right now.
    pub fn input_enabled(&self) -> bool {
        self.phase().is_some_and(Phase::accepts_moves)
    }

    pub fn has_failed_move(&self) -> bool {
        self.puzzle
            .as_ref()
            .is_some_and(|p| p.pipeline.failed_move().is_some())
    }

    /// `(index, length)` of the solution replay, while one is shown.
    pub fn replay_cursor(&self) -> Option<(usize, usize)> {
        let replay = self.puzzle.as_ref()?.replay.as_ref()?;
        Some((replay.index(), replay.len()))
    }

    pub fn solution(&self) -> Option<Vec<String>> {
        let replay = self.puzzle.as_ref()?.replay.as_ref()?;
        Some(replay.moves().iter().map(|m| m.to_string()).collect())
    }

    pub fn hint_available(&self) -> bool {
        self.puzzle.as_ref().is_some_and(|p| {
            p.hint.is_available()
                && matches!(
                    p.pipeline.phase(),
                    Phase::AwaitingOpening | Phase::Idle | Phase::Pending { .. }
                )
        })
    }

    pub fn hint_square(&self) -> Option<Square> {
        self.puzzle.as_ref()?.hint.square()
    }

    pub fn highlights(&self) -> Vec<Square> {
        self.puzzle
            .as_ref()
            .map(|p| p.highlights.squares().collect())
            .unwrap_or_default()
    }

    pub fn can_rate(&self) -> bool {
        self.puzzle.as_ref().is_some_and(|p| {
            !p.rated && matches!(p.pipeline.phase(), Phase::Solved | Phase::SolutionReveal)
        })
    }
}
