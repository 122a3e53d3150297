//! trinket-core: asynchronous glob-bundle module loader
//!
//! This crate provides the foundational components for trinket:
//!
//! - **Configuration** - [`LoaderConfig`] and [`BundleDescriptor`] describe
//!   where modules live as glob "bundles"
//! - **Bundle resolution** - the [`BundleResolver`] seam with a
//!   glob-backed [`GlobResolver`] and an in-memory [`StaticResolver`]
//! - **Module sources** - the [`ModuleSource`] seam with a
//!   dynamic-library [`DylibSource`] and an in-memory [`StaticSource`]
//! - **Event system** - [`EventBus`] trait and [`MemoryEventBus`] for
//!   observing loads as they happen
//! - **The loader** - [`Loader`], which discovers modules and drives
//!   their lifecycle functions strictly in discovery order
//!
//! # Quick Start
//!
//! ```no_run
//! use trinket_core::{Loader, LoaderConfig};
//!
//! # async fn example() -> Result<(), trinket_core::LoaderError> {
//! // Discover and boot everything matching "modules/*" under /srv/app
//! let loader = Loader::new(LoaderConfig::new("/srv/app"));
//!
//! let services = loader.load_modules(None).await?;
//! println!("booted {} services", services.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Load semantics
//!
//! Modules initialize strictly one at a time, in bundle order then file
//! order. Each module sees the services registered by the modules before
//! it. A failing module aborts the remaining sequence; a second
//! `load_modules` call on the same loader is always rejected.

pub mod bundles;
pub mod config;
pub mod definitions;
pub mod error;
pub mod events;
pub mod loader;
mod pipeline;

// Re-export key types for convenience
pub use bundles::{BundleResolver, GlobResolver, ResolvedBundle, StaticResolver};
pub use config::{
    BundleDescriptor, DEFAULT_BUNDLE_NAME, DEFAULT_BUNDLES, ErrorPolicy, LoaderConfig, Patterns,
};
pub use definitions::{DylibSource, ModuleDefinition, ModuleSource, ModuleUnit, StaticSource};
pub use error::LoaderError;
pub use events::{EventBus, EventSeq, LoaderEvent, MemoryEventBus};
pub use loader::Loader;

// Module authors only need trinket-module-api, but embedders get the
// contract types through here as well.
pub use trinket_module_api::{Module, ModuleConfig, ModuleContext, ModuleError, ServiceMap};
