// Haseq Key Type
// The six physical buttons available on the device

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A physical button on the device.
///
/// The set is closed: these are the only keys the input delegate can ever
/// deliver, and configuration referencing anything else is rejected when the
/// file is parsed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyCode {
    Up,
    Down,
    Ok,
    Back,
    Light,
    Menu,
}

impl KeyCode {
    /// Every key in a fixed order, for help text and diagnostics.
    pub const ALL: [KeyCode; 6] = [
        KeyCode::Up,
        KeyCode::Down,
        KeyCode::Ok,
        KeyCode::Back,
        KeyCode::Light,
        KeyCode::Menu,
    ];

    /// Canonical upper-case name, as used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            KeyCode::Up => "UP",
            KeyCode::Down => "DOWN",
            KeyCode::Ok => "OK",
            KeyCode::Back => "BACK",
            KeyCode::Light => "LIGHT",
            KeyCode::Menu => "MENU",
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unrecognized key name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key: {0}")]
pub struct UnknownKey(pub String);

impl FromStr for KeyCode {
    type Err = UnknownKey;

    /// Parse a key name, case-insensitively and ignoring surrounding
    /// whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UP" => Ok(KeyCode::Up),
            "DOWN" => Ok(KeyCode::Down),
            "OK" => Ok(KeyCode::Ok),
            "BACK" => Ok(KeyCode::Back),
            "LIGHT" => Ok(KeyCode::Light),
            "MENU" => Ok(KeyCode::Menu),
            other => Err(UnknownKey(other.to_string())),
        }
    }
}
