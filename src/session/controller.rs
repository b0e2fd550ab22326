use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::engine::scoring::Score;
use crate::error::CoreError;
use crate::session::clock::Clock;
use crate::session::state::{SessionConfig, SessionState};
use crate::session::transition;

#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Snapshot(SessionState),
    Completed(Score),
}

/// Owns the live snapshot of one attempt. Input and tick events go through
/// `&mut self`, so a session is never mutated from two places at once.
pub struct TypingSession {
    state: SessionState,
    clock: Arc<dyn Clock>,
    subscribers: Vec<Sender<SessionEvent>>,
    completion_taken: bool,
}

impl TypingSession {
    pub fn create(config: SessionConfig, clock: Arc<dyn Clock>) -> Result<Self, CoreError> {
        let state = transition::create_session(config)?;
        Ok(Self {
            state,
            clock,
            subscribers: Vec::new(),
            completion_taken: false,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Receive a `Snapshot` after every change and one `Completed`.
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn submit_input(&mut self, buffer: &str) -> Result<&SessionState, CoreError> {
        let next = transition::submit_input(&self.state, buffer, self.clock.now())?;
        self.replace(next);
        Ok(&self.state)
    }

    pub fn tick(&mut self) -> Result<&SessionState, CoreError> {
        let next = transition::tick(&self.state, self.clock.now())?;
        self.replace(next);
        Ok(&self.state)
    }

    pub fn completed_score(&self) -> Option<Score> {
        transition::completed_score(&self.state)
    }

    /// Hands out the finished snapshot exactly once, for persisting.
    pub fn take_completion(&mut self) -> Option<(SessionState, Score)> {
        if self.completion_taken {
            return None;
        }
        let score = self.completed_score()?;
        self.completion_taken = true;
        Some((self.state.clone(), score))
    }

    pub fn reset(&mut self) -> &SessionState {
        self.completion_taken = false;
        self.replace(transition::reset_session());
        &self.state
    }

    fn replace(&mut self, next: SessionState) {
        if next == self.state {
            return;
        }
        let newly_completed = !self.state.is_completed() && next.is_completed();
        self.state = next;

        let mut events = vec![SessionEvent::Snapshot(self.state.clone())];
        if newly_completed && let Some(score) = self.state.score().copied() {
            events.push(SessionEvent::Completed(score));
        }
        // Drop subscribers whose receiver is gone.
        self.subscribers
            .retain(|tx| events.iter().all(|ev| tx.send(ev.clone()).is_ok()));
    }
}
