//! Signal collectors: thin read-only queries against external subsystems.
//!
//! Each source is a trait so tests can substitute fakes. The default
//! implementations shell out to the OS tools that expose each signal. A
//! failing source fails the whole snapshot; the caller skips that tick and
//! the next one retries independently.

use chrono::Utc;
use presence_core::{EventRef, SignalSnapshot};
use std::collections::BTreeSet;
use std::process::Command;

pub trait CalendarSource: Send + Sync {
    /// The title of an event covering "now" in any of the named calendars.
    fn current_event(&self, calendars: &BTreeSet<String>) -> Result<Option<EventRef>, String>;
}

pub trait NetworkSource: Send + Sync {
    /// The associated wireless network identifier, if any.
    fn current_network(&self) -> Result<Option<String>, String>;
}

pub trait LockSource: Send + Sync {
    fn screen_locked(&self) -> Result<bool, String>;
}

/// The full set of signal sources plus the calendar scoping config.
pub struct Collectors {
    calendar: Box<dyn CalendarSource>,
    network: Box<dyn NetworkSource>,
    lock: Box<dyn LockSource>,
    vacation_calendars: BTreeSet<String>,
    work_calendars: BTreeSet<String>,
}

impl Collectors {
    pub fn new(
        calendar: Box<dyn CalendarSource>,
        network: Box<dyn NetworkSource>,
        lock: Box<dyn LockSource>,
        vacation_calendars: BTreeSet<String>,
        work_calendars: BTreeSet<String>,
    ) -> Self {
        Self {
            calendar,
            network,
            lock,
            vacation_calendars,
            work_calendars,
        }
    }

    pub fn with_defaults(
        vacation_calendars: BTreeSet<String>,
        work_calendars: BTreeSet<String>,
    ) -> Self {
        Self::new(
            Box::new(IcalBuddyCalendar),
            Box::new(AirportNetwork::default()),
            Box::new(IoregLock),
            vacation_calendars,
            work_calendars,
        )
    }

    /// Acquire one immutable snapshot of every signal.
    pub fn snapshot(&self) -> Result<SignalSnapshot, String> {
        let captured_at = Utc::now();
        let vacation_event = self.calendar.current_event(&self.vacation_calendars)?;
        let meeting_event = self.calendar.current_event(&self.work_calendars)?;
        let network_id = self.network.current_network()?;
        let screen_locked = self.lock.screen_locked()?;
        Ok(SignalSnapshot {
            captured_at,
            vacation_event,
            meeting_event,
            network_id,
            screen_locked,
        })
    }
}

const EVENT_BULLET: &str = "• ";

/// Queries current events through `icalBuddy`, restricted to the given
/// calendars.
#[derive(Debug, Clone, Default)]
pub struct IcalBuddyCalendar;

impl CalendarSource for IcalBuddyCalendar {
    fn current_event(&self, calendars: &BTreeSet<String>) -> Result<Option<EventRef>, String> {
        if calendars.is_empty() {
            return Ok(None);
        }
        let scope = calendars
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let output = run_command(
            "icalBuddy",
            &[
                "-npn",
                "-nc",
                "-eep",
                "*",
                "-b",
                EVENT_BULLET,
                "-ic",
                scope.as_str(),
                "eventsNow",
            ],
        )?;
        Ok(parse_event_titles(&output))
    }
}

fn parse_event_titles(output: &str) -> Option<EventRef> {
    output
        .lines()
        .filter_map(|line| line.strip_prefix(EVENT_BULLET))
        .map(str::trim)
        .find(|title| !title.is_empty())
        .map(EventRef::new)
}

const NETWORK_PREFIX: &str = "Current Wi-Fi Network: ";

/// Reads the associated SSID through `networksetup`.
#[derive(Debug, Clone)]
pub struct AirportNetwork {
    device: String,
}

impl Default for AirportNetwork {
    fn default() -> Self {
        Self {
            device: "en0".to_string(),
        }
    }
}

impl NetworkSource for AirportNetwork {
    fn current_network(&self) -> Result<Option<String>, String> {
        let output = run_command("networksetup", &["-getairportnetwork", &self.device])?;
        Ok(parse_airport_network(&output))
    }
}

fn parse_airport_network(output: &str) -> Option<String> {
    output
        .lines()
        .filter_map(|line| line.strip_prefix(NETWORK_PREFIX))
        .map(str::trim)
        .find(|ssid| !ssid.is_empty())
        .map(str::to_string)
}

const LOCK_KEY: &str = "<key>CGSSessionScreenIsLocked</key>";

/// Reads the console session's lock flag from the I/O registry. The key is
/// absent entirely while the screen is unlocked.
#[derive(Debug, Clone, Default)]
pub struct IoregLock;

impl LockSource for IoregLock {
    fn screen_locked(&self) -> Result<bool, String> {
        let output = run_command("ioreg", &["-n", "Root", "-d1", "-a"])?;
        Ok(parse_screen_locked(&output))
    }
}

fn parse_screen_locked(output: &str) -> bool {
    let Some(index) = output.find(LOCK_KEY) else {
        return false;
    };
    let rest = &output[index + LOCK_KEY.len()..];
    match (rest.find("<true/>"), rest.find("<false/>")) {
        (Some(true_at), Some(false_at)) => true_at < false_at,
        (Some(_), None) => true,
        _ => false,
    }
}

fn run_command(program: &str, args: &[&str]) -> Result<String, String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|err| format!("failed to run {}: {}", program, err))?;
    if !output.status.success() {
        return Err(format!("{} exited with {}", program, output.status));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_event_title() {
        let raw = "\u{2022} Standup\n\u{2022} Planning\n";
        let event = parse_event_titles(raw).expect("event");
        assert_eq!(event.title, "Standup");
    }

    #[test]
    fn no_events_yields_none() {
        assert!(parse_event_titles("").is_none());
        assert!(parse_event_titles("no events\n").is_none());
    }

    #[test]
    fn parses_associated_network() {
        let raw = "Current Wi-Fi Network: HomeNet\n";
        assert_eq!(parse_airport_network(raw).as_deref(), Some("HomeNet"));
    }

    #[test]
    fn unassociated_network_yields_none() {
        let raw = "You are not associated with an AirPort network.\n";
        assert!(parse_airport_network(raw).is_none());
    }

    #[test]
    fn locked_session_is_detected() {
        let raw = "\
<dict>\n\
\t<key>CGSSessionScreenIsLocked</key>\n\
\t<true/>\n\
</dict>\n";
        assert!(parse_screen_locked(raw));
    }

    #[test]
    fn missing_lock_key_means_unlocked() {
        let raw = "<dict>\n\t<key>IOConsoleLocked</key>\n\t<false/>\n</dict>\n";
        assert!(!parse_screen_locked(raw));
    }

    #[test]
    fn explicit_false_means_unlocked() {
        let raw = "\
<dict>\n\
\t<key>CGSSessionScreenIsLocked</key>\n\
\t<false/>\n\
</dict>\n";
        assert!(!parse_screen_locked(raw));
    }

    struct FailingCalendar;

    impl CalendarSource for FailingCalendar {
        fn current_event(
            &self,
            _calendars: &BTreeSet<String>,
        ) -> Result<Option<EventRef>, String> {
            Err("calendar store unreachable".to_string())
        }
    }

    struct StaticNetwork(Option<String>);

    impl NetworkSource for StaticNetwork {
        fn current_network(&self) -> Result<Option<String>, String> {
            Ok(self.0.clone())
        }
    }

    struct StaticLock(bool);

    impl LockSource for StaticLock {
        fn screen_locked(&self) -> Result<bool, String> {
            Ok(self.0)
        }
    }

    struct StaticCalendar(Option<EventRef>);

    impl CalendarSource for StaticCalendar {
        fn current_event(
            &self,
            _calendars: &BTreeSet<String>,
        ) -> Result<Option<EventRef>, String> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn snapshot_bundles_all_signals() {
        let collectors = Collectors::new(
            Box::new(StaticCalendar(Some(EventRef::new("Standup")))),
            Box::new(StaticNetwork(Some("CoffeeShop".to_string()))),
            Box::new(StaticLock(false)),
            BTreeSet::from(["Vacation".to_string()]),
            BTreeSet::from(["Work".to_string()]),
        );
        let snapshot = collectors.snapshot().expect("snapshot");
        assert_eq!(
            snapshot.vacation_event.as_ref().map(|e| e.title.as_str()),
            Some("Standup")
        );
        assert_eq!(snapshot.network_id.as_deref(), Some("CoffeeShop"));
        assert!(!snapshot.screen_locked);
    }

    #[test]
    fn failing_source_fails_the_snapshot() {
        let collectors = Collectors::new(
            Box::new(FailingCalendar),
            Box::new(StaticNetwork(None)),
            Box::new(StaticLock(false)),
            BTreeSet::from(["Vacation".to_string()]),
            BTreeSet::new(),
        );
        assert!(collectors.snapshot().is_err());
    }
}
