//! Session identity, score and elapsed-time ticking.

use crate::error::ClientError;
use crate::events::{Scheduler, Ticker};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub puzzle_set_id: i64,
    pub score: i64,
    pub elapsed_seconds: u64,
}

/// Owns the active session and its ticker. Retiring consumes the controller,
/// so the ticker is cancelled exactly once.
#[derive(Debug)]
pub struct SessionController {
    session: Session,
    ticker: Option<Ticker>,
}

impl SessionController {
    pub fn new(session: Session) -> Self {
        tracing::info!(
            session_id = %session.id,
            puzzle_set_id = session.puzzle_set_id,
            "Session started"
        );
        Self {
            session,
            ticker: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn id(&self) -> &str {
        &self.session.id
    }

    /// Start the elapsed-time ticker. A session may only arm it once.
    pub fn arm(&mut self, scheduler: &Scheduler) -> Result<(), ClientError> {
        if self.ticker.is_some() {
            return Err(ClientError::TimerAlreadyArmed);
        }
        self.ticker = Some(scheduler.arm_ticker(&self.session.id));
        Ok(())
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(Ticker::is_running)
    }

    /// Count one elapsed second. Ticks tagged with another session are ignored.
    pub fn tick(&mut self, session_id: &str) -> bool {
        if session_id != self.session.id || self.ticker.is_none() {
            return false;
        }
        self.session.elapsed_seconds += 1;
        true
    }

    pub fn set_score(&mut self, score: i64) {
        self.session.score = score;
    }

    /// Stop the ticker and hand back the final session values.
    pub fn retire(mut self) -> Session {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        tracing::info!(
            session_id = %self.session.id,
            score = self.session.score,
            elapsed_seconds = self.session.elapsed_seconds,
            "Session retired"
        );
        self.session.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use std::time::Duration;

    fn session() -> Session {
        Session {
            id: "s1".into(),
            puzzle_set_id: 1,
            score: 0,
            elapsed_seconds: 10,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_arm_twice_is_rejected() {
        let (scheduler, _rx) = Scheduler::new(&ClientConfig::default());
        let mut controller = SessionController::new(session());
        controller.arm(&scheduler).unwrap();
        assert!(matches!(
            controller.arm(&scheduler),
            Err(ClientError::TimerAlreadyArmed)
        ));
        assert!(controller.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_counts_only_own_session() {
        let (scheduler, _rx) = Scheduler::new(&ClientConfig::default());
        let mut controller = SessionController::new(session());

        // Not armed yet
        assert!(!controller.tick("s1"));

        controller.arm(&scheduler).unwrap();
        assert!(controller.tick("s1"));
        assert!(!controller.tick("s2"));
        assert_eq!(controller.session().elapsed_seconds, 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retire_stops_ticks() {
        let (scheduler, mut rx) = Scheduler::new(&ClientConfig::default());
        let mut controller = SessionController::new(session());
        controller.arm(&scheduler).unwrap();
        controller.set_score(4);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let finished = controller.retire();
        assert_eq!(finished.score, 4);

        while rx.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(rx.try_recv().is_err());
    }
}
