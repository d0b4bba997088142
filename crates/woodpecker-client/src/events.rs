//! Scheduled callbacks delivered back to the trainer as events.

use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};

use crate::config::ClientConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// One elapsed-time unit for the tagged session
    Tick { session_id: String },
    /// The forced opening move of the tagged puzzle generation is due
    OpeningMoveDue { generation: u64 },
}

/// Spawns timer tasks that report back over a single channel.
#[derive(Debug, Clone)]
pub struct Scheduler {
    tx: UnboundedSender<Event>,
    opening_move_delay: Duration,
    tick_period: Duration,
}

impl Scheduler {
    pub fn new(config: &ClientConfig) -> (Self, UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            tx,
            opening_move_delay: config.opening_move_delay,
            tick_period: config.tick_period,
        };
        (scheduler, rx)
    }

    /// Start a repeating ticker. The first tick arrives one period from now.
    pub fn arm_ticker(&self, session_id: &str) -> Ticker {
        let tx = self.tx.clone();
        let period = self.tick_period;
        let session_id = session_id.to_string();

        tracing::debug!(session_id = %session_id, ?period, "Arming session ticker");
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                let event = Event::Tick {
                    session_id: session_id.clone(),
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        Ticker { handle }
    }

    /// One-shot timer for the forced opening move of `generation`.
    pub fn schedule_opening_move(&self, generation: u64) -> OpeningTimer {
        let tx = self.tx.clone();
        let delay = self.opening_move_delay;

        let handle = tokio::spawn(async move {
            sleep(delay).await;
            let _ = tx.send(Event::OpeningMoveDue { generation });
        });

        OpeningTimer { generation, handle }
    }
}

/// Repeating elapsed-time task owned by a session.
#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn cancel(self) {
        tracing::debug!("Cancelling session ticker");
        self.handle.abort();
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Pending forced-move callback, aborted when its puzzle is torn down.
#[derive(Debug)]
pub struct OpeningTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

impl OpeningTimer {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for OpeningTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
