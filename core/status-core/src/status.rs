//! Status catalog, location map, and the resolved status decision.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catalog key for the vacation status entry.
pub const KEY_VACATION: &str = "vacation";
/// Catalog key for the meeting status entry.
pub const KEY_MEETING: &str = "meeting";
/// Catalog key for the generic working-from-remote status entry.
pub const KEY_REMOTE: &str = "wfr";

/// Enumerated category of presence outcome.
///
/// The first six are resolution-engine outcomes. `Manual` marks a decision
/// for a user-selected catalog entry with no automatic counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKey {
    Vacation,
    Meeting,
    RemoteKnownLocation,
    RemoteUnknown,
    Office,
    Away,
    Manual,
}

impl StatusKey {
    /// Key for a manually selected catalog entry. The canonical entries map
    /// to their resolution counterparts so dedup treats a manual "meeting"
    /// and an inferred one as the same status.
    pub fn for_manual(catalog_key: &str) -> StatusKey {
        match catalog_key {
            KEY_VACATION => StatusKey::Vacation,
            KEY_MEETING => StatusKey::Meeting,
            KEY_REMOTE => StatusKey::RemoteUnknown,
            _ => StatusKey::Manual,
        }
    }
}

/// Display text and emoji for one catalog status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogEntry {
    pub text: String,
    pub emoji: String,
}

/// Mapping from status key to display text and emoji, supplied by
/// configuration. Keys beyond the required `vacation`/`meeting`/`wfr`
/// entries are selectable in manual mode only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl StatusCatalog {
    pub fn new(entries: BTreeMap<String, CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries in deterministic key order, for selection listings.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One named remote-work location keyed by wireless network identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteLocation {
    pub network: String,
    pub text: String,
    pub emoji: String,
}

/// Per-location status mapping, matched by exact string equality on the
/// network identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationMap {
    locations: Vec<RemoteLocation>,
}

impl LocationMap {
    pub fn new(locations: Vec<RemoteLocation>) -> Self {
        Self { locations }
    }

    pub fn entry_for(&self, network_id: &str) -> Option<&RemoteLocation> {
        self.locations
            .iter()
            .find(|location| location.network == network_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemoteLocation> {
        self.locations.iter()
    }
}

/// Output of the resolution engine: exactly one status per evaluation.
///
/// `text` is the final composed display text. Decisions are structurally
/// comparable; the dispatcher's change detection relies on that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDecision {
    pub key: StatusKey,
    pub text: String,
    pub emoji: String,
    #[serde(default)]
    pub source_detail: Option<String>,
}

impl StatusDecision {
    /// The office decision clears any previously published status: empty
    /// text and emoji signal "no status" to the publishing service.
    pub fn office() -> Self {
        Self {
            key: StatusKey::Office,
            text: String::new(),
            emoji: String::new(),
            source_detail: None,
        }
    }

    /// Away carries no status text; the dispatcher translates it into a
    /// presence-only update.
    pub fn away() -> Self {
        Self {
            key: StatusKey::Away,
            text: String::new(),
            emoji: String::new(),
            source_detail: None,
        }
    }

    pub fn from_catalog(key: StatusKey, entry: &CatalogEntry) -> Self {
        Self {
            key,
            text: entry.text.clone(),
            emoji: entry.emoji.clone(),
            source_detail: None,
        }
    }

    pub fn from_location(location: &RemoteLocation) -> Self {
        Self {
            key: StatusKey::RemoteKnownLocation,
            text: location.text.clone(),
            emoji: location.emoji.clone(),
            source_detail: None,
        }
    }
}
