//! Error types for trinket-core

use std::path::PathBuf;
use thiserror::Error;
use trinket_module_api::ModuleError;

/// Errors that can occur while resolving or loading modules
#[derive(Error, Debug)]
pub enum LoaderError {
    /// The bundle resolver cannot enumerate files
    #[error("Invalid bundle pattern '{pattern}': {message}")]
    Discovery { pattern: String, message: String },

    /// A discovered file failed to load as a module
    #[error("Failed to load module from {file}: {message}")]
    ModuleLoad { file: PathBuf, message: String },

    /// Failed to load a module's dynamic library
    #[error("Failed to load module library {file}: {source}")]
    LibraryLoad {
        file: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// API version mismatch between the loader and a module
    #[error("API version mismatch for {file}: loader expects {expected}, module has {found}")]
    ApiVersionMismatch {
        file: PathBuf,
        expected: u32,
        found: u32,
    },

    /// A module's lifecycle function signaled failure
    #[error("Module '{module}' in bundle '{bundle}' failed to initialize: {source}")]
    Lifecycle {
        module: String,
        bundle: String,
        #[source]
        source: ModuleError,
    },

    /// `load_modules` invoked more than once on one loader
    #[error("Modules have already been loaded on this loader")]
    AlreadyLoaded,

    /// Configuration error (parsing, invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
