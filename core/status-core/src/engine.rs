//! Mode-gated evaluation: the piece that decides whether a snapshot (or a
//! manual selection) is allowed to reach the dispatcher.

use crate::dispatcher::{DispatchOutcome, Dispatcher, StatusPublisher};
use crate::error::{PresenceError, Result};
use crate::mode::Mode;
use crate::resolver::{resolve, ResolveContext};
use crate::snapshot::SignalSnapshot;
use crate::status::{StatusCatalog, StatusDecision, StatusKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalOutcome {
    Dispatched(DispatchOutcome),
    /// The engine is in manual mode; the snapshot was discarded.
    SkippedManual,
}

/// Owns the mode state machine, the resolve context, and the dispatcher.
///
/// All entry points are plain callable operations so the scheduler and any
/// control surface drive the same object. Callers serialize access (the
/// daemon holds this behind a mutex shared by the tick and control paths).
pub struct Engine<P> {
    context: ResolveContext,
    mode: Mode,
    dispatcher: Dispatcher<P>,
}

impl<P: StatusPublisher> Engine<P> {
    pub fn new(context: ResolveContext, publisher: P) -> Self {
        Self {
            context,
            mode: Mode::Auto,
            dispatcher: Dispatcher::new(publisher),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn catalog(&self) -> &StatusCatalog {
        &self.context.catalog
    }

    pub fn last_dispatched(&self) -> Option<&StatusDecision> {
        self.dispatcher.last_dispatched()
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        self.dispatcher.publisher_mut()
    }

    /// Flip Auto <-> Manual and return the new mode. On a transition into
    /// Auto the caller must perform one immediate evaluation cycle rather
    /// than waiting for the next scheduled tick.
    pub fn toggle_mode(&mut self) -> Mode {
        self.mode = self.mode.toggled();
        tracing::info!(mode = ?self.mode, "Mode toggled");
        self.mode
    }

    /// Resolve and dispatch one snapshot. In manual mode the snapshot is
    /// cleanly skipped; automatic inference never overrides a user choice.
    pub fn evaluate(&mut self, snapshot: &SignalSnapshot) -> Result<EvalOutcome> {
        if !self.mode.is_auto() {
            tracing::debug!("Manual mode active; skipping evaluation");
            return Ok(EvalOutcome::SkippedManual);
        }
        let decision = resolve(snapshot, &self.context);
        let outcome = self.dispatcher.dispatch(decision)?;
        Ok(EvalOutcome::Dispatched(outcome))
    }

    /// Dispatch a catalog entry chosen by the user, bypassing resolution.
    /// Rejected while in auto mode.
    pub fn select_status(&mut self, key: &str) -> Result<DispatchOutcome> {
        if self.mode.is_auto() {
            return Err(PresenceError::ManualSelectionDisabled);
        }
        let entry = self
            .context
            .catalog
            .get(key)
            .ok_or_else(|| PresenceError::UnknownStatus(key.to_string()))?;
        let decision = StatusDecision::from_catalog(StatusKey::for_manual(key), entry);
        self.dispatcher.dispatch(decision)
    }

    /// Clear any published status while in manual mode.
    pub fn clear_status(&mut self) -> Result<DispatchOutcome> {
        if self.mode.is_auto() {
            return Err(PresenceError::ManualSelectionDisabled);
        }
        self.dispatcher.dispatch(StatusDecision::office())
    }
}
