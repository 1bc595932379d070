//! Point-in-time signal readings used for one resolution.

use chrono::{DateTime, Utc};

/// A calendar event reference. Only the title is consumed downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRef {
    pub title: String,
}

impl EventRef {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

/// An immutable bundle of all signal readings captured at one instant.
///
/// Every scheduler tick produces a fresh snapshot; a snapshot is never
/// mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalSnapshot {
    pub captured_at: DateTime<Utc>,
    /// Present if a vacation calendar has an event covering "now".
    pub vacation_event: Option<EventRef>,
    /// Present if a work calendar has an event covering "now".
    pub meeting_event: Option<EventRef>,
    /// Current wireless network identifier. Absent when no wireless
    /// interface is associated (e.g. wired-only).
    pub network_id: Option<String>,
    pub screen_locked: bool,
}

impl SignalSnapshot {
    pub fn empty(captured_at: DateTime<Utc>) -> Self {
        Self {
            captured_at,
            vacation_event: None,
            meeting_event: None,
            network_id: None,
            screen_locked: false,
        }
    }
}
