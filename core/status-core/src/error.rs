//! Error types for presence-core operations.

use std::path::PathBuf;

/// All errors that can occur in presence-core operations.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    #[error("Configuration file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("Configuration read failed: {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Configuration invalid: {0}")]
    ConfigInvalid(String),

    #[error("Unknown status key: {0}")]
    UnknownStatus(String),

    #[error("Manual status selection requires manual mode")]
    ManualSelectionDisabled,

    #[error("Status publish failed: {0}")]
    Publish(String),

    #[error("Signal collection failed: {0}")]
    Collect(String),
}

/// Convenience type alias for Results using PresenceError.
pub type Result<T> = std::result::Result<T, PresenceError>;

impl From<PresenceError> for String {
    fn from(err: PresenceError) -> String {
        err.to_string()
    }
}
