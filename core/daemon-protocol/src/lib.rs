//! IPC protocol types and validation for presenced.
//!
//! This crate is shared by the daemon and its clients to prevent schema
//! drift. The daemon remains the authority on validation, but clients can
//! reuse the same types to construct valid requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

const MAX_STATUS_KEY_CHARS: usize = 64;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Method {
    GetHealth,
    GetStatus,
    ListStatuses,
    ToggleMode,
    SetStatus,
    ClearStatus,
    SetToken,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Request {
    pub protocol_version: u32,
    pub method: Method,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl Response {
    pub fn ok(id: Option<String>, data: Value) -> Self {
        Self {
            ok: true,
            id,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(id: Option<String>, code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id,
            data: None,
            error: Some(ErrorInfo::new(code, message)),
        }
    }

    pub fn error_with_info(id: Option<String>, error: ErrorInfo) -> Self {
        Self {
            ok: false,
            id,
            data: None,
            error: Some(error),
        }
    }
}

/// Wire-level mirror of the control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeView {
    Auto,
    Manual,
}

/// Wire-level mirror of a dispatched status decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusView {
    pub key: String,
    pub text: String,
    pub emoji: String,
    #[serde(default)]
    pub source_detail: Option<String>,
}

/// One selectable catalog entry, for status listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntryView {
    pub key: String,
    pub text: String,
    pub emoji: String,
}

/// Snapshot of the daemon's publishing state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub mode: ModeView,
    #[serde(default)]
    pub last_status: Option<StatusView>,
    pub poll_interval_secs: u64,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SetStatusParams {
    pub key: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SetTokenParams {
    pub token: String,
}

pub fn parse_set_status(params: Value) -> Result<SetStatusParams, ErrorInfo> {
    let parsed: SetStatusParams = serde_json::from_value(params)
        .map_err(|err| ErrorInfo::new("invalid_params", format!("invalid params: {}", err)))?;
    if parsed.key.trim().is_empty() {
        return Err(ErrorInfo::new("invalid_params", "key is required"));
    }
    if parsed.key.chars().count() > MAX_STATUS_KEY_CHARS {
        return Err(ErrorInfo::new(
            "invalid_params",
            format!("key must be {} characters or fewer", MAX_STATUS_KEY_CHARS),
        ));
    }
    Ok(parsed)
}

pub fn parse_set_token(params: Value) -> Result<SetTokenParams, ErrorInfo> {
    let parsed: SetTokenParams = serde_json::from_value(params)
        .map_err(|err| ErrorInfo::new("invalid_params", format!("invalid params: {}", err)))?;
    if parsed.token.trim().is_empty() {
        return Err(ErrorInfo::new("invalid_params", "token is required"));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_set_status_params() {
        let parsed = parse_set_status(json!({"key": "lunch"})).expect("parse");
        assert_eq!(parsed.key, "lunch");
    }

    #[test]
    fn rejects_empty_status_key() {
        assert!(parse_set_status(json!({"key": "  "})).is_err());
    }

    #[test]
    fn rejects_overlong_status_key() {
        let key = "k".repeat(65);
        assert!(parse_set_status(json!({ "key": key })).is_err());
    }

    #[test]
    fn rejects_unknown_param_fields() {
        assert!(parse_set_status(json!({"key": "lunch", "extra": 1})).is_err());
    }

    #[test]
    fn rejects_empty_token() {
        assert!(parse_set_token(json!({"token": ""})).is_err());
    }

    #[test]
    fn request_roundtrips_through_json() {
        let request = Request {
            protocol_version: PROTOCOL_VERSION,
            method: Method::SetStatus,
            id: Some("req-1".to_string()),
            params: Some(json!({"key": "lunch"})),
        };
        let encoded = serde_json::to_string(&request).expect("encode");
        let decoded: Request = serde_json::from_str(&encoded).expect("decode");
        assert!(matches!(decoded.method, Method::SetStatus));
        assert_eq!(decoded.protocol_version, PROTOCOL_VERSION);
    }

    #[test]
    fn unknown_method_fails_to_decode() {
        let raw = format!(
            r#"{{"protocol_version": {}, "method": "reboot"}}"#,
            PROTOCOL_VERSION
        );
        assert!(serde_json::from_str::<Request>(&raw).is_err());
    }

    #[test]
    fn status_report_roundtrips() {
        let report = StatusReport {
            mode: ModeView::Manual,
            last_status: Some(StatusView {
                key: "meeting".to_string(),
                text: "In a meeting".to_string(),
                emoji: ":calendar:".to_string(),
                source_detail: Some("Standup".to_string()),
            }),
            poll_interval_secs: 60,
        };
        let encoded = serde_json::to_value(&report).expect("encode");
        let decoded: StatusReport = serde_json::from_value(encoded).expect("decode");
        assert_eq!(decoded.mode, ModeView::Manual);
        assert_eq!(
            decoded.last_status.expect("status").source_detail.as_deref(),
            Some("Standup")
        );
    }
}
