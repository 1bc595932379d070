//! Slack publishing client.
//!
//! Mirrors the service's profile/presence split: `users.profile.set` carries
//! status text and emoji, `users.setPresence` carries only `auto`/`away`.
//! Calls are bounded by a client timeout well under the poll interval so a
//! slow publish can never hold a tick past the next one.

use presence_core::{Presence, StatusPublisher};
use serde_json::json;
use std::time::Duration;

const PROFILE_SET_URL: &str = "https://slack.com/api/users.profile.set";
const PRESENCE_SET_URL: &str = "https://slack.com/api/users.setPresence";
const REQUEST_TIMEOUT_SECS: u64 = 15;

pub struct SlackClient {
    http: reqwest::blocking::Client,
    token: String,
}

impl SlackClient {
    pub fn new(token: String) -> Result<Self, String> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|err| format!("failed to build HTTP client: {}", err))?;
        Ok(Self { http, token })
    }

    /// Replace the bearer token in memory. Nothing is written back to the
    /// configuration file.
    pub fn set_token(&mut self, token: String) {
        self.token = token;
    }

    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }

    fn call(&self, url: &str, params: &[(&str, &str)]) -> Result<(), String> {
        if !self.has_token() {
            return Err("no API token configured".to_string());
        }

        let response = self
            .http
            .get(url)
            .query(&[("token", self.token.as_str())])
            .query(params)
            .send()
            .map_err(|err| format!("request to {} failed: {}", url, err))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .map_err(|err| format!("invalid response from {}: {}", url, err))?;
        tracing::debug!(url, http_status = %status, body = %body, "Slack API response");

        if !status.is_success() {
            return Err(format!("{} returned HTTP {}", url, status));
        }
        match body.get("ok").and_then(|value| value.as_bool()) {
            Some(true) => Ok(()),
            _ => {
                let code = body
                    .get("error")
                    .and_then(|value| value.as_str())
                    .unwrap_or("unknown_error");
                Err(format!("{} rejected the call: {}", url, code))
            }
        }
    }
}

impl StatusPublisher for SlackClient {
    fn publish_status(&self, text: &str, emoji: &str) -> Result<(), String> {
        let profile = json!({
            "status_text": text,
            "status_emoji": emoji,
        })
        .to_string();
        self.call(PROFILE_SET_URL, &[("profile", profile.as_str())])
    }

    fn publish_presence(&self, presence: Presence) -> Result<(), String> {
        self.call(PRESENCE_SET_URL, &[("presence", presence.as_str())])
    }
}
