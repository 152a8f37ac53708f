// Haseq Action Spec
// The remote command bound to a completed key sequence

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A Home Assistant service call issued when a sequence completes.
///
/// `service` carries the `domain.service` identifier (the `action` field in
/// configuration JSON) and `entity` the target entity id. Any further fields
/// on the JSON action object are kept as extra call parameters and passed
/// through untouched.
///
/// Owned by its sequence definition and immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    /// Service identifier in `domain.service` form
    #[serde(rename = "action")]
    pub service: String,

    /// Target entity id
    pub entity: String,

    /// Extra service parameters, in file order
    #[serde(flatten, default, skip_serializing_if = "IndexMap::is_empty")]
    pub data: IndexMap<String, serde_json::Value>,
}

impl ActionSpec {
    /// Create an action with no extra parameters.
    pub fn new(service: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entity: entity.into(),
            data: IndexMap::new(),
        }
    }

    /// Split the service identifier into (domain, service) if well formed.
    fn split_service(&self) -> Option<(&str, &str)> {
        let (domain, service) = self.service.split_once('.')?;
        if domain.is_empty() || service.is_empty() || service.contains('.') {
            return None;
        }
        Some((domain, service))
    }

    /// Domain part of the service identifier (`light` in `light.toggle`).
    pub fn domain(&self) -> Option<&str> {
        self.split_service().map(|(domain, _)| domain)
    }

    /// Service part of the service identifier (`toggle` in `light.toggle`).
    pub fn service_name(&self) -> Option<&str> {
        self.split_service().map(|(_, service)| service)
    }

    /// True when the identifier is exactly `domain.service` with both parts
    /// non-empty.
    pub fn has_valid_service(&self) -> bool {
        self.split_service().is_some()
    }
}

impl fmt::Display for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.service, self.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_split() {
        let action = ActionSpec::new("light.toggle", "light.living_room");
        assert!(action.has_valid_service());
        assert_eq!(action.domain(), Some("light"));
        assert_eq!(action.service_name(), Some("toggle"));
    }

    #[test]
    fn test_invalid_service_formats() {
        for service in ["toggle", "light.", ".toggle", "a.b.c", ""] {
            let action = ActionSpec::new(service, "light.living_room");
            assert!(!action.has_valid_service(), "accepted {service:?}");
            assert_eq!(action.domain(), None);
        }
    }

    #[test]
    fn test_json_shape() {
        let action: ActionSpec = serde_json::from_str(
            r#"{"action": "light.turn_on", "entity": "light.bedroom", "brightness": 128}"#,
        )
        .unwrap();
        assert_eq!(action.service, "light.turn_on");
        assert_eq!(action.entity, "light.bedroom");
        assert_eq!(
            action.data.get("brightness"),
            Some(&serde_json::json!(128))
        );
    }

    #[test]
    fn test_display() {
        let action = ActionSpec::new("scene.turn_on", "scene.movie_time");
        assert_eq!(action.to_string(), "scene.turn_on on scene.movie_time");
    }
}
