//! Change-detecting dispatch to the external publishing service.

use crate::error::{PresenceError, Result};
use crate::status::{StatusDecision, StatusKey};

/// External presence state. Presence and status text are distinct concepts
/// on the publishing side; setting one never touches the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Auto,
    Away,
}

impl Presence {
    pub fn as_str(self) -> &'static str {
        match self {
            Presence::Auto => "auto",
            Presence::Away => "away",
        }
    }
}

/// The external publishing interface. Implementations may block on I/O but
/// must bound their own waits.
pub trait StatusPublisher: Send {
    fn publish_status(&self, text: &str, emoji: &str) -> std::result::Result<(), String>;
    fn publish_presence(&self, presence: Presence) -> std::result::Result<(), String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The decision differed from the last dispatched one and was published.
    Published,
    /// Structurally equal to the last dispatched decision; no external call.
    Unchanged,
}

/// Forwards status decisions to the publisher, suppressing no-op updates.
///
/// `last_dispatched` updates only after a successful publish. A failed
/// dispatch leaves it stale, so the same decision still differs on the next
/// evaluation and is retried with no special-case logic.
pub struct Dispatcher<P> {
    publisher: P,
    last_dispatched: Option<StatusDecision>,
}

impl<P: StatusPublisher> Dispatcher<P> {
    pub fn new(publisher: P) -> Self {
        Self {
            publisher,
            last_dispatched: None,
        }
    }

    pub fn last_dispatched(&self) -> Option<&StatusDecision> {
        self.last_dispatched.as_ref()
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }

    pub fn dispatch(&mut self, decision: StatusDecision) -> Result<DispatchOutcome> {
        if self.last_dispatched.as_ref() == Some(&decision) {
            tracing::debug!(key = ?decision.key, "Decision unchanged; skipping dispatch");
            return Ok(DispatchOutcome::Unchanged);
        }

        let leaving_away = self
            .last_dispatched
            .as_ref()
            .is_some_and(|last| last.key == StatusKey::Away);

        match decision.key {
            StatusKey::Away => {
                self.publisher
                    .publish_presence(Presence::Away)
                    .map_err(PresenceError::Publish)?;
            }
            _ => {
                self.publisher
                    .publish_status(&decision.text, &decision.emoji)
                    .map_err(PresenceError::Publish)?;
                if leaving_away {
                    self.publisher
                        .publish_presence(Presence::Auto)
                        .map_err(PresenceError::Publish)?;
                }
            }
        }

        tracing::info!(key = ?decision.key, text = %decision.text, "Status dispatched");
        self.last_dispatched = Some(decision);
        Ok(DispatchOutcome::Published)
    }
}
