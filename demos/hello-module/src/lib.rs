//! Hello Module - a minimal example module for trinket
//!
//! This module demonstrates:
//! - Basic module structure with the `export_module!` macro
//! - Implementing the `Module` trait
//! - Reading sidecar configuration through `ModuleContext`
//! - Registering a service for later modules to see
//!
//! ## Building
//!
//! ```bash
//! cargo build --release
//! ```
//!
//! ## Installing
//!
//! Copy the built library into the application's module directory, named
//! after the module:
//!
//! ```bash
//! cp target/release/libhello_module.so /srv/app/modules/hello.so
//! ```
//!
//! An optional `modules/hello.toml` sidecar overrides the greeting:
//!
//! ```toml
//! greeting = "ahoy"
//! ```

use async_trait::async_trait;
use serde_json::{Value, json};
use trinket_module_api::{Module, ModuleContext, ModuleError, ServiceMap, export_module};

/// Registers a greeting service, configurable via sidecar config.
#[derive(Default)]
pub struct HelloModule;

#[async_trait]
impl Module for HelloModule {
    async fn init(
        &mut self,
        ctx: &mut ModuleContext,
        services: &ServiceMap,
    ) -> Result<Option<Value>, ModuleError> {
        let greeting: String = ctx
            .config_get("greeting")
            .unwrap_or_else(|| "hello".to_string());

        ctx.log_info(&format!(
            "starting with {} services already registered",
            services.len()
        ));

        Ok(Some(json!({ "greeting": greeting })))
    }
}

export_module!(HelloModule);
