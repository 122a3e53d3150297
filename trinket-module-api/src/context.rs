//! ModuleContext - a module's interface to the loader

use crate::error::ModuleError;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A module's interface to the loader that is driving it.
///
/// Passed to the lifecycle function and provides access to:
/// - The module's identity (name and owning bundle)
/// - The working directory modules were discovered under
/// - Module configuration read from a TOML sidecar file
/// - Logging utilities
pub struct ModuleContext {
    module_name: String,
    bundle: String,
    cwd: PathBuf,
    config: ModuleConfig,
}

/// Module configuration - key-value store read from a TOML sidecar.
///
/// For a module discovered at `modules/db.so`, the loader reads
/// `modules/db.toml` when present.
#[derive(Debug, Default)]
pub struct ModuleConfig {
    values: HashMap<String, toml::Value>,
}

impl ModuleContext {
    /// Create a new module context
    pub fn new(module_name: String, bundle: String, cwd: PathBuf) -> Self {
        Self {
            module_name,
            bundle,
            cwd,
            config: ModuleConfig::new(),
        }
    }

    /// Create a context with a pre-loaded config
    pub fn with_config(
        module_name: String,
        bundle: String,
        cwd: PathBuf,
        config: ModuleConfig,
    ) -> Self {
        Self {
            module_name,
            bundle,
            cwd,
            config,
        }
    }

    /// The module's name (file basename, extension stripped)
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// The bundle this module was discovered through
    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    /// The working directory modules were discovered under
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Read a configuration value
    ///
    /// # Example
    /// ```ignore
    /// let port: Option<u16> = ctx.config_get("port");
    /// ```
    pub fn config_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config.get(key)
    }

    /// Write a configuration value for the duration of the load
    pub fn config_set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), ModuleError> {
        self.config.set(key, value)
    }

    // ─── Logging ─────────────────────────────────────────────────────

    /// Log an info message (automatically tagged with the module name)
    pub fn log_info(&self, message: &str) {
        tracing::info!(module = %self.module_name, "{}", message);
    }

    /// Log a warning message
    pub fn log_warn(&self, message: &str) {
        tracing::warn!(module = %self.module_name, "{}", message);
    }

    /// Log an error message
    pub fn log_error(&self, message: &str) {
        tracing::error!(module = %self.module_name, "{}", message);
    }

    /// Log a debug message
    pub fn log_debug(&self, message: &str) {
        tracing::debug!(module = %self.module_name, "{}", message);
    }
}

impl ModuleConfig {
    /// Create a new empty config
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Load configuration from a TOML file
    ///
    /// Returns an empty config if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ModuleError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        let values: HashMap<String, toml::Value> =
            toml::from_str(&content).map_err(|e| ModuleError::Config(e.to_string()))?;
        Ok(Self { values })
    }

    /// Get a configuration value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values.get(key).and_then(|v| v.clone().try_into().ok())
    }

    /// Set a configuration value
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), ModuleError> {
        let toml_value =
            toml::Value::try_from(value).map_err(|e| ModuleError::Serialization(e.to_string()))?;
        self.values.insert(key.to_string(), toml_value);
        Ok(())
    }

    /// Whether any value is set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
