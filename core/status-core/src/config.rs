//! Daemon configuration: loading and startup validation.
//!
//! The daemon must not start with an unusable configuration, so validation
//! failures here are fatal. Everything past startup treats the config as
//! read-only.

use crate::error::{PresenceError, Result};
use crate::status::{LocationMap, StatusCatalog, KEY_MEETING, KEY_REMOTE, KEY_VACATION};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const CONFIG_RELATIVE_PATH: &str = ".presenced/config.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Bearer token for the publishing service. May be empty at startup;
    /// publishes fail (and retry) until one is supplied via the control
    /// surface.
    #[serde(default)]
    pub token: String,

    #[serde(default)]
    pub debug: bool,

    /// Calendars whose current events mean "on vacation".
    #[serde(default)]
    pub vacation_calendars: BTreeSet<String>,

    /// Calendars whose current events mean "in a meeting".
    #[serde(default)]
    pub work_calendars: BTreeSet<String>,

    /// Being associated with this network means "not remote".
    pub home_network: String,

    #[serde(default)]
    pub remote_locations: LocationMap,

    pub statuses: StatusCatalog,

    /// Append the current event title to calendar-derived status text.
    #[serde(default)]
    pub append_event_title: bool,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.home_network.trim().is_empty() {
            return Err(PresenceError::ConfigInvalid(
                "home_network must not be empty".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(PresenceError::ConfigInvalid(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        for required in [KEY_VACATION, KEY_MEETING, KEY_REMOTE] {
            if !self.statuses.contains(required) {
                return Err(PresenceError::ConfigInvalid(format!(
                    "statuses must contain a \"{}\" entry",
                    required
                )));
            }
        }
        let mut seen_networks = BTreeSet::new();
        for location in self.remote_locations.iter() {
            if location.network.trim().is_empty() {
                return Err(PresenceError::ConfigInvalid(
                    "remote_locations entries must name a network".to_string(),
                ));
            }
            if !seen_networks.insert(location.network.as_str()) {
                return Err(PresenceError::ConfigInvalid(format!(
                    "remote_locations lists network \"{}\" more than once",
                    location.network
                )));
            }
        }
        Ok(())
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        PresenceError::ConfigInvalid("Home directory not found".to_string())
    })?;
    Ok(home.join(CONFIG_RELATIVE_PATH))
}

/// Load and validate the configuration file. Any failure here is fatal to
/// daemon startup.
pub fn load(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(path) => path,
        None => default_config_path()?,
    };

    if !config_path.exists() {
        return Err(PresenceError::ConfigNotFound(config_path));
    }

    let content =
        fs_err::read_to_string(&config_path).map_err(|err| PresenceError::ConfigRead {
            path: config_path.clone(),
            source: err,
        })?;
    let config: Config =
        toml::from_str(&content).map_err(|err| PresenceError::ConfigMalformed {
            path: config_path.clone(),
            details: err.to_string(),
        })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID_CONFIG: &str = r#"
token = "xoxp-test"
home_network = "HomeNet"
vacation_calendars = ["Vacation"]
work_calendars = ["Work"]
append_event_title = true

[[remote_locations]]
network = "CoffeeShop"
text = "At the coffee shop"
emoji = ":coffee:"

[statuses.vacation]
text = "On vacation"
emoji = ":palm_tree:"

[statuses.meeting]
text = "In a meeting"
emoji = ":calendar:"

[statuses.wfr]
text = "Working remotely"
emoji = ":house:"
"#;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp config");
        file.write_all(content.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn loads_valid_config_with_defaults() {
        let file = write_config(VALID_CONFIG);
        let config = load(Some(file.path().to_path_buf())).expect("load config");
        assert_eq!(config.token, "xoxp-test");
        assert_eq!(config.home_network, "HomeNet");
        assert_eq!(config.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
        assert!(config.append_event_title);
        assert!(!config.debug);
        assert!(config.remote_locations.entry_for("CoffeeShop").is_some());
        assert_eq!(config.statuses.len(), 3);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let err = load(Some(path)).expect_err("missing config must fail");
        assert!(matches!(err, PresenceError::ConfigNotFound(_)));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let file = write_config("home_network = [broken");
        let err = load(Some(file.path().to_path_buf())).expect_err("parse must fail");
        assert!(matches!(err, PresenceError::ConfigMalformed { .. }));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let content = format!("{}\nunexpected_field = 1\n", VALID_CONFIG);
        let file = write_config(&content);
        let err = load(Some(file.path().to_path_buf())).expect_err("unknown field must fail");
        assert!(matches!(err, PresenceError::ConfigMalformed { .. }));
    }

    #[test]
    fn rejects_missing_required_status_keys() {
        let content = VALID_CONFIG.replace("[statuses.wfr]", "[statuses.other]");
        let file = write_config(&content);
        let err = load(Some(file.path().to_path_buf())).expect_err("validation must fail");
        assert!(matches!(err, PresenceError::ConfigInvalid(_)));
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let content = format!("{}\npoll_interval_secs = 0\n", VALID_CONFIG);
        let file = write_config(&content);
        let err = load(Some(file.path().to_path_buf())).expect_err("validation must fail");
        assert!(matches!(err, PresenceError::ConfigInvalid(_)));
    }

    #[test]
    fn rejects_duplicate_location_networks() {
        let extra = r#"
[[remote_locations]]
network = "CoffeeShop"
text = "Duplicate"
emoji = ":coffee:"
"#;
        let content = format!("{}{}", VALID_CONFIG, extra);
        let file = write_config(&content);
        let err = load(Some(file.path().to_path_buf())).expect_err("validation must fail");
        assert!(matches!(err, PresenceError::ConfigInvalid(_)));
    }

    #[test]
    fn empty_token_is_allowed() {
        let content = VALID_CONFIG.replace("token = \"xoxp-test\"", "");
        let file = write_config(&content);
        let config = load(Some(file.path().to_path_buf())).expect("load config");
        assert!(config.token.is_empty());
    }
}
