//! Loader event types

use serde::{Deserialize, Serialize};
use trinket_module_api::ServiceMap;

/// Events published while modules load.
///
/// `Loaded` events fire in load order, strictly before the terminal
/// `Done` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoaderEvent {
    /// A module's lifecycle function completed successfully
    Loaded {
        /// Module name
        name: String,
        /// Owning bundle
        bundle: String,
        /// Accumulator snapshot as of this module
        services: ServiceMap,
    },
    /// A full load finished with every module initialized
    Done {
        /// Final accumulator
        services: ServiceMap,
    },
    /// A load aborted
    Error {
        /// Rendered loader error
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loaded_event_serializes_with_tag() {
        let event = LoaderEvent::Loaded {
            name: "auth".to_string(),
            bundle: "private".to_string(),
            services: ServiceMap::new(),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], json!("loaded"));
        assert_eq!(value["name"], json!("auth"));
    }

    #[test]
    fn event_roundtrips_through_json() {
        let mut services = ServiceMap::new();
        services.register("_", "db", json!({"pool": 4}), "_");

        let event = LoaderEvent::Done { services };
        let text = serde_json::to_string(&event).unwrap();
        let parsed: LoaderEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, event);
    }
}
