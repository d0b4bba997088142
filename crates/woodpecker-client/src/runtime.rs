//! Async driver: performs the network round trips the trainer asks for and
//! feeds scheduled events back into it.

use chess_core::shakmaty::{Role, Square};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::api::{PuzzleApi, PuzzleSet, Rating};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::events::{Event, Scheduler};
use crate::submission::{MoveOutcome, Phase};
use crate::trainer::{Key, KeyAction, MoveTicket, NextOutcome, Trainer};

pub struct TrainerRuntime<A> {
    api: A,
    trainer: Trainer,
    events: UnboundedReceiver<Event>,
    puzzle_sets: Vec<PuzzleSet>,
}

impl<A: PuzzleApi> TrainerRuntime<A> {
    pub fn new(api: A, config: &ClientConfig) -> Self {
        let (scheduler, events) = Scheduler::new(config);
        Self {
            api,
            trainer: Trainer::new(scheduler),
            events,
            puzzle_sets: Vec::new(),
        }
    }

    pub fn trainer(&self) -> &Trainer {
        &self.trainer
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn puzzle_sets(&mut self) -> Result<&[PuzzleSet], ClientError> {
        self.puzzle_sets = self.api.puzzle_sets().await?;
        Ok(&self.puzzle_sets)
    }

    /// Start a session on `puzzle_set_id` and show its first puzzle.
    pub async fn start(&mut self, puzzle_set_id: i64) -> Result<(), ClientError> {
        if puzzle_set_id <= 0 {
            return Err(ClientError::SessionCreate(format!(
                "invalid puzzle set id {puzzle_set_id}"
            )));
        }
        if !self.puzzle_sets.is_empty() && !self.puzzle_sets.iter().any(|s| s.id == puzzle_set_id)
        {
            return Err(ClientError::SessionCreate(format!(
                "unknown puzzle set {puzzle_set_id}"
            )));
        }

        let start = self.api.start_session(puzzle_set_id).await?;
        self.trainer.start_session(puzzle_set_id, start)
    }

    /// Drop a piece: local check, optimistic update, server verdict.
    /// An incorrect move without a solution moves straight on to the next puzzle.
    pub async fn drop_piece(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Role>,
    ) -> Result<MoveOutcome, ClientError> {
        match self.trainer.begin_move(from, to, promotion)? {
            Some(ticket) => self.submit(ticket).await,
            None => Ok(MoveOutcome::Rejected),
        }
    }

    /// Resend the move whose last submission failed.
    pub async fn retry_move(&mut self) -> Result<MoveOutcome, ClientError> {
        match self.trainer.retry_ticket()? {
            Some(ticket) => self.submit(ticket).await,
            None => Ok(MoveOutcome::Rejected),
        }
    }

    async fn submit(&mut self, ticket: MoveTicket) -> Result<MoveOutcome, ClientError> {
        let session_id = ticket.ticket.session_id().to_string();
        let result = self.api.submit_move(&session_id, &ticket.uci()).await;
        let outcome = self.trainer.finish_move(ticket, result)?;

        if outcome == MoveOutcome::PuzzleExhausted {
            self.next_puzzle().await?;
        }
        Ok(outcome)
    }

    /// Load the next puzzle, or run the end-of-set sequence if there is none.
    pub async fn next_puzzle(&mut self) -> Result<NextOutcome, ClientError> {
        if self.trainer.phase() == Some(&Phase::Ending) {
            self.end().await?;
            return Ok(NextOutcome::SetExhausted);
        }

        let ticket = self.trainer.begin_next()?;
        let session_id = ticket.ticket.session_id().to_string();
        let result = self.api.next_puzzle(&session_id).await;
        let outcome = self.trainer.finish_next(ticket, result)?;

        if outcome == NextOutcome::SetExhausted {
            self.end().await?;
        }
        Ok(outcome)
    }

    /// Fetch the summary, retire the session and refresh the history list.
    /// If the summary request fails the session stays in `Phase::Ending` and
    /// Enter tries again.
    pub async fn end(&mut self) -> Result<(), ClientError> {
        let session_id = self
            .trainer
            .session()
            .map(|s| s.id.clone())
            .ok_or(ClientError::NoSession)?;

        let summary = self.api.summary(&session_id).await?;
        self.trainer.end_session(summary)?;

        match self.api.performances().await {
            Ok(records) => self.trainer.refresh_history(records),
            Err(e) => tracing::warn!("Failed to refresh performance history: {e}"),
        }
        Ok(())
    }

    pub async fn hint(&mut self) -> Result<Option<Square>, ClientError> {
        let ticket = self.trainer.begin_hint()?;
        let result = self.api.hint(ticket.session_id()).await;
        self.trainer.finish_hint(ticket, result)
    }

    pub async fn rate(&mut self, rating: Rating) -> Result<(), ClientError> {
        let ticket = self.trainer.begin_rating(rating)?;
        let result = self.api.rate(ticket.puzzle_id, ticket.rating).await;
        self.trainer.finish_rating(ticket, result)
    }

    pub fn toggle_highlight(&mut self, square: Square) -> Result<bool, ClientError> {
        self.trainer.toggle_highlight(square)
    }

    pub fn step_forward(&mut self) -> Result<bool, ClientError> {
        self.trainer.step_forward()
    }

    pub fn step_backward(&mut self) -> Result<bool, ClientError> {
        self.trainer.step_backward()
    }

    pub async fn key(&mut self, key: Key) -> Result<KeyAction, ClientError> {
        let action = self.trainer.key(key)?;
        match action {
            KeyAction::NextPuzzle => {
                self.next_puzzle().await?;
            }
            KeyAction::EndSession => self.end().await?,
            KeyAction::Ignored | KeyAction::Stepped => {}
        }
        Ok(action)
    }

    /// Wait for the next scheduled event without applying it.
    pub async fn recv_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    pub fn apply_event(&mut self, event: Event) -> bool {
        self.trainer.handle_event(event)
    }

    /// Wait for one scheduled event and apply it.
    pub async fn process_next_event(&mut self) -> Option<Event> {
        let event = self.events.recv().await?;
        self.trainer.handle_event(event.clone());
        Some(event)
    }

    /// Apply every event already queued; returns how many were applied.
    pub fn drain_events(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.events.try_recv() {
            self.trainer.handle_event(event);
            count += 1;
        }
        count
    }
}
