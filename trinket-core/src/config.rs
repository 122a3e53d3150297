//! Loader configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::LoaderError;

/// Bundle descriptor used when none is configured
pub const DEFAULT_BUNDLES: &str = "modules/*";

/// Bundle name used to mean flat, unnamespaced services
pub const DEFAULT_BUNDLE_NAME: &str = "_";

/// Loader configuration. Immutable once the loader is constructed.
///
/// The working directory is required and explicit - the loader never
/// infers it from its caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Working directory modules are discovered under
    pub cwd: PathBuf,
    /// Glob description of the module bundles
    #[serde(default = "default_bundles")]
    pub bundles: BundleDescriptor,
    /// Bundle name whose services register flat instead of namespaced
    #[serde(default = "default_bundle_name")]
    pub default_bundle_name: String,
    /// How a failed load is surfaced to event subscribers
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

fn default_bundles() -> BundleDescriptor {
    BundleDescriptor::Single(DEFAULT_BUNDLES.to_string())
}

fn default_bundle_name() -> String {
    DEFAULT_BUNDLE_NAME.to_string()
}

impl LoaderConfig {
    /// Create a configuration with defaults for everything but the
    /// working directory
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            bundles: default_bundles(),
            default_bundle_name: default_bundle_name(),
            error_policy: ErrorPolicy::default(),
        }
    }

    /// Builder: override the bundle descriptor
    pub fn with_bundles(mut self, bundles: BundleDescriptor) -> Self {
        self.bundles = bundles;
        self
    }

    /// Builder: override the default bundle name
    pub fn with_default_bundle_name(mut self, name: impl Into<String>) -> Self {
        self.default_bundle_name = name.into();
        self
    }

    /// Builder: override the error policy
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, LoaderError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| LoaderError::Config(e.to_string()))
    }
}

/// Declarative description of module bundles.
///
/// Either one glob pattern whose matches land in the default bundle, or a
/// mapping from bundle name to one or more patterns. Named bundles are
/// iterated in key order; that order is the load order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BundleDescriptor {
    /// One glob pattern; matches belong to the default bundle
    Single(String),
    /// Named bundles, each with one or more glob patterns
    Named(BTreeMap<String, Patterns>),
}

impl From<&str> for BundleDescriptor {
    fn from(pattern: &str) -> Self {
        Self::Single(pattern.to_string())
    }
}

/// One or more glob patterns for a named bundle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Patterns {
    One(String),
    Many(Vec<String>),
}

impl Patterns {
    /// View the patterns as a slice regardless of arity
    pub fn as_slice(&self) -> &[String] {
        match self {
            Patterns::One(pattern) => std::slice::from_ref(pattern),
            Patterns::Many(patterns) => patterns.as_slice(),
        }
    }
}

impl From<&str> for Patterns {
    fn from(pattern: &str) -> Self {
        Self::One(pattern.to_string())
    }
}

/// How a failed `load_modules` is surfaced to event subscribers.
///
/// The awaited `Result` always carries the error; this policy only
/// controls whether the failure is also published on the event bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Publish a `LoaderEvent::Error` when a load fails
    #[default]
    Emit,
    /// Surface failures only through the returned `Result`
    Silent,
}
