//! Auto/Manual control mode.

use serde::{Deserialize, Serialize};

/// Whether status publishing is driven by the engine or by the user.
///
/// Initializes to `Auto` at startup and transitions only via explicit
/// toggle. Lives for the process lifetime; nothing is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Auto,
    Manual,
}

impl Mode {
    pub fn toggled(self) -> Mode {
        match self {
            Mode::Auto => Mode::Manual,
            Mode::Manual => Mode::Auto,
        }
    }

    pub fn is_auto(self) -> bool {
        matches!(self, Mode::Auto)
    }
}
