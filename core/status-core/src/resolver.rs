//! The status resolution engine.
//!
//! A fixed, priority-ordered rule list reconciles possibly-contradictory
//! signals into exactly one decision: offline commitments (vacation) outrank
//! meetings, which outrank location inference, which outranks device lock
//! state. Evaluation is pure; the first matching rule wins.

use crate::config::Config;
use crate::snapshot::SignalSnapshot;
use crate::status::{
    LocationMap, StatusCatalog, StatusDecision, StatusKey, KEY_MEETING, KEY_REMOTE, KEY_VACATION,
};

/// Everything a rule may consult besides the snapshot itself.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    pub catalog: StatusCatalog,
    pub locations: LocationMap,
    pub home_network: String,
    pub append_event_title: bool,
}

impl ResolveContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            catalog: config.statuses.clone(),
            locations: config.remote_locations.clone(),
            home_network: config.home_network.clone(),
            append_event_title: config.append_event_title,
        }
    }

    /// Decision for a calendar-derived status. Detail is appended to the
    /// display text only when configured; location- and lock-derived
    /// statuses never carry detail.
    fn calendar_decision(
        &self,
        key: StatusKey,
        catalog_key: &str,
        detail: &str,
    ) -> StatusDecision {
        let entry = self.catalog.get(catalog_key);
        let base = entry.map(|entry| entry.text.as_str()).unwrap_or_default();
        let emoji = entry.map(|entry| entry.emoji.clone()).unwrap_or_default();
        let text = if self.append_event_title && !detail.is_empty() {
            format!("{}: {}", base, detail)
        } else {
            base.to_string()
        };
        StatusDecision {
            key,
            text,
            emoji,
            source_detail: Some(detail.to_string()),
        }
    }

    fn catalog_decision(&self, key: StatusKey, catalog_key: &str) -> StatusDecision {
        match self.catalog.get(catalog_key) {
            Some(entry) => StatusDecision::from_catalog(key, entry),
            None => StatusDecision {
                key,
                text: String::new(),
                emoji: String::new(),
                source_detail: None,
            },
        }
    }
}

type RuleFn = fn(&SignalSnapshot, &ResolveContext) -> Option<StatusDecision>;

/// One step of the cascade. Rules are evaluated in slice order with early
/// exit on first match, which keeps each rule independently testable.
pub struct Rule {
    pub name: &'static str,
    pub evaluate: RuleFn,
}

pub const RULES: &[Rule] = &[
    Rule {
        name: "vacation",
        evaluate: vacation_rule,
    },
    Rule {
        name: "meeting",
        evaluate: meeting_rule,
    },
    Rule {
        name: "remote-network",
        evaluate: remote_network_rule,
    },
    Rule {
        name: "screen-locked",
        evaluate: screen_locked_rule,
    },
];

/// Resolve one snapshot into exactly one status decision.
pub fn resolve(snapshot: &SignalSnapshot, ctx: &ResolveContext) -> StatusDecision {
    for rule in RULES {
        if let Some(decision) = (rule.evaluate)(snapshot, ctx) {
            tracing::debug!(rule = rule.name, key = ?decision.key, "Resolution rule matched");
            return decision;
        }
    }
    tracing::debug!("No resolution rule matched; defaulting to office");
    StatusDecision::office()
}

fn vacation_rule(snapshot: &SignalSnapshot, ctx: &ResolveContext) -> Option<StatusDecision> {
    snapshot
        .vacation_event
        .as_ref()
        .map(|event| ctx.calendar_decision(StatusKey::Vacation, KEY_VACATION, &event.title))
}

fn meeting_rule(snapshot: &SignalSnapshot, ctx: &ResolveContext) -> Option<StatusDecision> {
    snapshot
        .meeting_event
        .as_ref()
        .map(|event| ctx.calendar_decision(StatusKey::Meeting, KEY_MEETING, &event.title))
}

/// An absent network id falls through to the lock rule, same as being on
/// the home network.
fn remote_network_rule(snapshot: &SignalSnapshot, ctx: &ResolveContext) -> Option<StatusDecision> {
    let network = snapshot.network_id.as_deref()?;
    if network == ctx.home_network {
        return None;
    }
    Some(match ctx.locations.entry_for(network) {
        Some(location) => StatusDecision::from_location(location),
        None => ctx.catalog_decision(StatusKey::RemoteUnknown, KEY_REMOTE),
    })
}

fn screen_locked_rule(snapshot: &SignalSnapshot, _ctx: &ResolveContext) -> Option<StatusDecision> {
    snapshot.screen_locked.then(StatusDecision::away)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::EventRef;
    use crate::status::{CatalogEntry, RemoteLocation};
    use chrono::{DateTime, Utc};
    use std::collections::BTreeMap;

    fn at(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("parse")
            .with_timezone(&Utc)
    }

    fn context(append_event_title: bool) -> ResolveContext {
        let mut entries = BTreeMap::new();
        entries.insert(
            "vacation".to_string(),
            CatalogEntry {
                text: "On vacation".to_string(),
                emoji: ":palm_tree:".to_string(),
            },
        );
        entries.insert(
            "meeting".to_string(),
            CatalogEntry {
                text: "In a meeting".to_string(),
                emoji: ":calendar:".to_string(),
            },
        );
        entries.insert(
            "wfr".to_string(),
            CatalogEntry {
                text: "Working remotely".to_string(),
                emoji: ":house:".to_string(),
            },
        );
        ResolveContext {
            catalog: StatusCatalog::new(entries),
            locations: LocationMap::new(vec![RemoteLocation {
                network: "CoffeeShop".to_string(),
                text: "At the coffee shop".to_string(),
                emoji: ":coffee:".to_string(),
            }]),
            home_network: "HomeNet".to_string(),
            append_event_title,
        }
    }

    fn snapshot() -> SignalSnapshot {
        SignalSnapshot::empty(at("2026-08-07T10:00:00Z"))
    }

    #[test]
    fn vacation_wins_regardless_of_other_signals() {
        let ctx = context(true);
        let snapshot = SignalSnapshot {
            vacation_event: Some(EventRef::new("Trip")),
            meeting_event: Some(EventRef::new("Standup")),
            network_id: Some("CoffeeShop".to_string()),
            screen_locked: false,
            ..snapshot()
        };
        let decision = resolve(&snapshot, &ctx);
        assert_eq!(decision.key, StatusKey::Vacation);
        assert_eq!(decision.text, "On vacation: Trip");
        assert_eq!(decision.emoji, ":palm_tree:");
        assert_eq!(decision.source_detail.as_deref(), Some("Trip"));
    }

    #[test]
    fn meeting_wins_when_no_vacation() {
        let ctx = context(true);
        let snapshot = SignalSnapshot {
            meeting_event: Some(EventRef::new("Standup")),
            network_id: Some("CoffeeShop".to_string()),
            screen_locked: true,
            ..snapshot()
        };
        let decision = resolve(&snapshot, &ctx);
        assert_eq!(decision.key, StatusKey::Meeting);
        assert_eq!(decision.text, "In a meeting: Standup");
    }

    #[test]
    fn event_title_is_not_appended_when_disabled() {
        let ctx = context(false);
        let snapshot = SignalSnapshot {
            meeting_event: Some(EventRef::new("Standup")),
            ..snapshot()
        };
        let decision = resolve(&snapshot, &ctx);
        assert_eq!(decision.text, "In a meeting");
        assert_eq!(decision.source_detail.as_deref(), Some("Standup"));
    }

    #[test]
    fn known_remote_network_uses_location_entry_verbatim() {
        let ctx = context(true);
        let snapshot = SignalSnapshot {
            network_id: Some("CoffeeShop".to_string()),
            ..snapshot()
        };
        let decision = resolve(&snapshot, &ctx);
        assert_eq!(decision.key, StatusKey::RemoteKnownLocation);
        assert_eq!(decision.text, "At the coffee shop");
        assert_eq!(decision.emoji, ":coffee:");
        assert!(decision.source_detail.is_none());
    }

    #[test]
    fn unknown_remote_network_uses_generic_remote_entry() {
        let ctx = context(true);
        let snapshot = SignalSnapshot {
            network_id: Some("AirportWifi".to_string()),
            ..snapshot()
        };
        let decision = resolve(&snapshot, &ctx);
        assert_eq!(decision.key, StatusKey::RemoteUnknown);
        assert_eq!(decision.text, "Working remotely");
        assert!(decision.source_detail.is_none());
    }

    #[test]
    fn home_network_falls_through_to_lock_rule() {
        let ctx = context(true);
        let unlocked = SignalSnapshot {
            network_id: Some("HomeNet".to_string()),
            ..snapshot()
        };
        assert_eq!(resolve(&unlocked, &ctx), StatusDecision::office());

        let locked = SignalSnapshot {
            network_id: Some("HomeNet".to_string()),
            screen_locked: true,
            ..snapshot()
        };
        assert_eq!(resolve(&locked, &ctx).key, StatusKey::Away);
    }

    #[test]
    fn absent_network_behaves_like_home_network() {
        let ctx = context(true);
        let locked = SignalSnapshot {
            screen_locked: true,
            ..snapshot()
        };
        assert_eq!(resolve(&locked, &ctx).key, StatusKey::Away);

        let unlocked = snapshot();
        assert_eq!(resolve(&unlocked, &ctx), StatusDecision::office());
    }

    #[test]
    fn office_decision_clears_status() {
        let ctx = context(true);
        let decision = resolve(&snapshot(), &ctx);
        assert_eq!(decision.key, StatusKey::Office);
        assert!(decision.text.is_empty());
        assert!(decision.emoji.is_empty());
    }

    #[test]
    fn rules_are_ordered_vacation_first() {
        let names: Vec<&str> = RULES.iter().map(|rule| rule.name).collect();
        assert_eq!(
            names,
            vec!["vacation", "meeting", "remote-network", "screen-locked"]
        );
    }
}
