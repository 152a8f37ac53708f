// Haseq Sequence Definition
// One configured key chain bound to a remote action

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ActionSpec, KeyCode};

/// Abandonment timeout applied when a definition carries none.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// A configured key sequence and the action it triggers.
///
/// Created once at configuration load and immutable for the lifetime of the
/// running widget; a reload replaces the whole set. The `keys` field accepts
/// both the `sequence` and the legacy `keys` spelling in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceDefinition {
    /// Unique identifier within the active configuration
    pub id: String,

    /// Ordered keys to press, earliest first (duplicates allowed)
    #[serde(rename = "sequence", alias = "keys")]
    pub keys: Vec<KeyCode>,

    /// Inter-key tolerance in milliseconds
    #[serde(rename = "timeout", default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Service call to issue on completion
    pub action: ActionSpec,
}

impl SequenceDefinition {
    /// Inter-key tolerance as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Key chain rendered as `UP-DOWN-OK`, for listings and logs.
    pub fn key_chain(&self) -> String {
        self.keys
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join("-")
    }
}
