//! Shared daemon state: the engine behind a mutex, plus the collectors.
//!
//! The scheduler thread and the control-socket threads drive the same
//! `SharedState`. Mode and the last dispatched status live inside the
//! engine, so every path that touches them serializes on one lock. Signal
//! collection happens outside the lock; the mode is re-checked under the
//! lock before dispatch, so a toggle racing a tick either fully applies or
//! cleanly skips.

use crate::collect::Collectors;
use presence_core::{
    DispatchOutcome, Engine, EvalOutcome, Mode, PresenceError, ResolveContext, Result,
    StatusDecision, StatusKey, StatusPublisher,
};
use presenced_protocol::{CatalogEntryView, ModeView, StatusReport, StatusView};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Dispatched(DispatchOutcome),
    SkippedManual,
    CollectFailed,
    PublishFailed,
}

pub struct SharedState<P> {
    engine: Mutex<Engine<P>>,
    collectors: Collectors,
    poll_interval_secs: u64,
}

impl<P: StatusPublisher> SharedState<P> {
    pub fn new(
        context: ResolveContext,
        publisher: P,
        collectors: Collectors,
        poll_interval_secs: u64,
    ) -> Self {
        Self {
            engine: Mutex::new(Engine::new(context, publisher)),
            collectors,
            poll_interval_secs,
        }
    }

    pub fn poll_interval_secs(&self) -> u64 {
        self.poll_interval_secs
    }

    pub fn mode(&self) -> Mode {
        self.lock_engine().mode()
    }

    /// One full acquire -> resolve -> dispatch cycle.
    pub fn run_tick(&self, reason: &str) -> TickOutcome {
        if !self.lock_engine().mode().is_auto() {
            tracing::debug!(reason, "Tick skipped; manual mode");
            return TickOutcome::SkippedManual;
        }

        let snapshot = match self.collectors.snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(reason, error = %err, "Signal collection failed; skipping tick");
                return TickOutcome::CollectFailed;
            }
        };

        match self.lock_engine().evaluate(&snapshot) {
            Ok(EvalOutcome::Dispatched(outcome)) => {
                tracing::debug!(reason, ?outcome, "Tick evaluated");
                TickOutcome::Dispatched(outcome)
            }
            Ok(EvalOutcome::SkippedManual) => TickOutcome::SkippedManual,
            Err(err) => {
                tracing::warn!(reason, error = %err, "Dispatch failed; will retry next tick");
                TickOutcome::PublishFailed
            }
        }
    }

    /// Flip the mode. Entering auto mode performs one immediate cycle
    /// instead of waiting for the next scheduled tick.
    pub fn toggle_mode(&self) -> Mode {
        let mode = self.lock_engine().toggle_mode();
        if mode.is_auto() {
            self.run_tick("mode-toggle");
        }
        mode
    }

    pub fn select_status(&self, key: &str) -> Result<DispatchOutcome> {
        self.lock_engine().select_status(key)
    }

    pub fn clear_status(&self) -> Result<DispatchOutcome> {
        self.lock_engine().clear_status()
    }

    pub fn update_publisher<F>(&self, update: F)
    where
        F: FnOnce(&mut P),
    {
        update(self.lock_engine().publisher_mut());
    }

    pub fn status_report(&self) -> StatusReport {
        let engine = self.lock_engine();
        StatusReport {
            mode: mode_view(engine.mode()),
            last_status: engine.last_dispatched().map(status_view),
            poll_interval_secs: self.poll_interval_secs,
        }
    }

    pub fn catalog_entries(&self) -> Vec<CatalogEntryView> {
        self.lock_engine()
            .catalog()
            .iter()
            .map(|(key, entry)| CatalogEntryView {
                key: key.to_string(),
                text: entry.text.clone(),
                emoji: entry.emoji.clone(),
            })
            .collect()
    }

    fn lock_engine(&self) -> std::sync::MutexGuard<'_, Engine<P>> {
        match self.engine.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn mode_view(mode: Mode) -> ModeView {
    match mode {
        Mode::Auto => ModeView::Auto,
        Mode::Manual => ModeView::Manual,
    }
}

fn status_view(decision: &StatusDecision) -> StatusView {
    StatusView {
        key: key_label(decision.key).to_string(),
        text: decision.text.clone(),
        emoji: decision.emoji.clone(),
        source_detail: decision.source_detail.clone(),
    }
}

fn key_label(key: StatusKey) -> &'static str {
    match key {
        StatusKey::Vacation => "vacation",
        StatusKey::Meeting => "meeting",
        StatusKey::RemoteKnownLocation => "remote_known_location",
        StatusKey::RemoteUnknown => "remote_unknown",
        StatusKey::Office => "office",
        StatusKey::Away => "away",
        StatusKey::Manual => "manual",
    }
}

/// Maps engine errors onto protocol error codes.
pub fn error_code(err: &PresenceError) -> &'static str {
    match err {
        PresenceError::UnknownStatus(_) => "unknown_status",
        PresenceError::ManualSelectionDisabled => "manual_selection_disabled",
        PresenceError::Publish(_) => "publish_failed",
        PresenceError::Collect(_) => "collect_failed",
        _ => "internal_error",
    }
}
