//! Job iteration session state machine
//!
//! Every `JobIter` implementation tracks its session with this machine so
//! that exhaustion is sticky and any use after close is rejected the same way.

use crate::error::JobError;

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Open,
    Exhausted,
    Closed,
}

impl SessionState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [SessionState] {
        match self {
            Self::Open => &[Self::Exhausted, Self::Closed],
            Self::Exhausted => &[Self::Closed],
            Self::Closed => &[],
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Events that move a session between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The source reported it will never produce another job
    SourceDone,
    /// The consumer released the session
    Close,
}

/// Session state machine
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    resource: &'static str,
    state: SessionState,
}

impl SessionStateMachine {
    pub fn new(resource: &'static str) -> Self {
        Self {
            resource,
            state: SessionState::Open,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Fail with `AlreadyStopped` once the session is closed
    pub fn ensure_open(&self) -> Result<(), JobError> {
        if self.state.is_terminal() {
            return Err(JobError::AlreadyStopped {
                resource: self.resource.to_string(),
            });
        }
        Ok(())
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == SessionState::Exhausted
    }

    /// Apply `event`, returning whether the state changed.
    ///
    /// Repeating an event that was already applied is a no-op, which is what
    /// makes `close()` idempotent.
    pub fn apply(&mut self, event: SessionEvent) -> bool {
        let next = match (self.state, event) {
            (SessionState::Open, SessionEvent::SourceDone) => SessionState::Exhausted,
            (SessionState::Open | SessionState::Exhausted, SessionEvent::Close) => {
                SessionState::Closed
            }
            _ => return false,
        };
        self.state = next;
        true
    }
}
