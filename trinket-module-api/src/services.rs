//! ServiceMap - the namespaced accumulator of module results

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Services registered by loaded modules.
///
/// A module whose bundle equals the loader's default bundle name registers
/// flat under its module name; any other module registers nested under its
/// bundle name, then its module name:
///
/// ```text
/// { "server": <_/server>, "private": { "auth": <private/auth> } }
/// ```
///
/// Module names are only unique within their bundle scope. Collisions
/// silently overwrite - best effort, not a guarantee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceMap {
    entries: Map<String, Value>,
}

impl ServiceMap {
    /// Create an empty service map
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module's service under the namespacing rule.
    ///
    /// Flat when `bundle == default_bundle_name`, nested under the bundle
    /// name otherwise. A flat entry sitting under the bundle name is
    /// replaced by the namespace object.
    pub fn register(&mut self, bundle: &str, name: &str, value: Value, default_bundle_name: &str) {
        if bundle == default_bundle_name {
            self.entries.insert(name.to_string(), value);
        } else {
            let slot = self
                .entries
                .entry(bundle.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Some(namespace) = slot.as_object_mut() {
                namespace.insert(name.to_string(), value);
            }
        }
    }

    /// Look up a flat entry (a default-bundle service, or a whole bundle
    /// namespace) by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Look up a service nested under a bundle namespace
    pub fn get_namespaced(&self, bundle: &str, name: &str) -> Option<&Value> {
        self.entries.get(bundle)?.as_object()?.get(name)
    }

    /// Number of top-level entries (flat services plus bundle namespaces)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether any service has been registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over top-level entries
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DEFAULT: &str = "_";

    #[test]
    fn register_flat_under_default_bundle() {
        let mut services = ServiceMap::new();
        services.register(DEFAULT, "server", json!({"port": 8080}), DEFAULT);

        assert_eq!(services.get("server"), Some(&json!({"port": 8080})));
        assert_eq!(services.len(), 1);
    }

    #[test]
    fn register_nested_under_named_bundle() {
        let mut services = ServiceMap::new();
        services.register("private", "auth", json!("token"), DEFAULT);
        services.register("private", "db", json!("pool"), DEFAULT);

        assert_eq!(services.get_namespaced("private", "auth"), Some(&json!("token")));
        assert_eq!(services.get_namespaced("private", "db"), Some(&json!("pool")));
        // One namespace entry, two services inside it
        assert_eq!(services.len(), 1);
    }

    #[test]
    fn named_bundle_matching_default_name_stays_flat() {
        let mut services = ServiceMap::new();
        services.register("_", "routes", json!([1, 2]), "_");

        assert_eq!(services.get("routes"), Some(&json!([1, 2])));
        assert!(services.get_namespaced("_", "routes").is_none());
    }

    #[test]
    fn collision_silently_overwrites() {
        let mut services = ServiceMap::new();
        services.register(DEFAULT, "cache", json!("first"), DEFAULT);
        services.register(DEFAULT, "cache", json!("second"), DEFAULT);

        assert_eq!(services.get("cache"), Some(&json!("second")));
        assert_eq!(services.len(), 1);
    }

    #[test]
    fn flat_entry_replaced_by_bundle_namespace() {
        let mut services = ServiceMap::new();
        services.register(DEFAULT, "public", json!("flat"), DEFAULT);
        services.register("public", "routes", json!("nested"), DEFAULT);

        assert_eq!(services.get_namespaced("public", "routes"), Some(&json!("nested")));
    }

    #[test]
    fn empty_map_reports_empty() {
        let services = ServiceMap::new();
        assert!(services.is_empty());
        assert_eq!(services.len(), 0);
        assert!(services.get("anything").is_none());
    }

    #[test]
    fn serializes_as_plain_object() {
        let mut services = ServiceMap::new();
        services.register(DEFAULT, "a", json!(1), DEFAULT);
        services.register("extra", "b", json!(2), DEFAULT);

        let value = serde_json::to_value(&services).unwrap();
        assert_eq!(value, json!({"a": 1, "extra": {"b": 2}}));

        let parsed: ServiceMap = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, services);
    }
}
