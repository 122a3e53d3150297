//! trinket-module-api - Module API for the trinket bootstrap loader
//!
//! This crate provides the traits and types needed to write modules that
//! trinket can discover and load. Modules are native Rust dynamic libraries
//! (or statically registered units) that expose one async lifecycle
//! function and may register a service value with the loader.
//!
//! # Example
//!
//! ```ignore
//! use trinket_module_api::{Module, ModuleContext, ModuleError, ServiceMap, export_module};
//!
//! #[derive(Default)]
//! pub struct DatabaseModule;
//!
//! #[async_trait::async_trait]
//! impl Module for DatabaseModule {
//!     async fn init(
//!         &mut self,
//!         ctx: &mut ModuleContext,
//!         services: &ServiceMap,
//!     ) -> Result<Option<serde_json::Value>, ModuleError> {
//!         ctx.log_info("connecting");
//!         let url: String = ctx
//!             .config_get("url")
//!             .ok_or_else(|| ModuleError::config("missing url"))?;
//!         Ok(Some(serde_json::json!({ "url": url })))
//!     }
//! }
//!
//! export_module!(DatabaseModule);
//! ```

pub mod context;
pub mod error;
pub mod services;

pub use context::{ModuleConfig, ModuleContext};
pub use error::ModuleError;
pub use services::ServiceMap;

use async_trait::async_trait;
use serde_json::Value;

/// Current module API version. Modules must match this exactly.
/// Checked when loading dynamic-library modules to ensure compatibility.
pub const API_VERSION: u32 = 1;

/// The module lifecycle trait - implement this to create a trinket module.
///
/// `init` is called exactly once, in discovery order, while the loader
/// boots. Returning `Ok(Some(value))` registers the value as this module's
/// service; `Ok(None)` completes the load without registering anything.
/// Returning an error aborts the remaining load sequence.
#[async_trait]
pub trait Module: Send + Sync {
    /// Initialize the module.
    ///
    /// `services` holds the results of every module initialized before this
    /// one, namespaced by bundle.
    async fn init(
        &mut self,
        ctx: &mut ModuleContext,
        services: &ServiceMap,
    ) -> Result<Option<Value>, ModuleError>;
}

/// Export a module type for dynamic loading.
///
/// This macro generates the C ABI entry points that trinket uses to load
/// and unload modules dynamically.
///
/// # Usage
///
/// ```ignore
/// trinket_module_api::export_module!(DatabaseModule);
/// ```
///
/// # Generated Functions
///
/// - `_trinket_module_create()`: Creates a new module instance
/// - `_trinket_module_api_version()`: Returns the API version
/// - `_trinket_module_destroy()`: Destroys a module instance
#[macro_export]
macro_rules! export_module {
    ($module_type:ty) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn _trinket_module_create() -> *mut dyn $crate::Module {
            let module: Box<dyn $crate::Module> = Box::new(<$module_type>::default());
            Box::into_raw(module)
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn _trinket_module_api_version() -> u32 {
            $crate::API_VERSION
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn _trinket_module_destroy(ptr: *mut dyn $crate::Module) {
            if !ptr.is_null() {
                unsafe {
                    drop(Box::from_raw(ptr));
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version_is_set() {
        assert_eq!(API_VERSION, 1);
    }

    #[test]
    fn test_module_trait_is_object_safe() {
        // This compiles only if Module is object-safe
        fn _takes_boxed_module(_: Box<dyn Module>) {}
    }
}
