//! Module definitions - flattening resolved bundles into loadable units

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use trinket_module_api::{API_VERSION, Module, ModuleConfig, ModuleContext};

use crate::bundles::{ResolvedBundle, filter_bundles};
use crate::error::LoaderError;

/// A loaded code unit together with whatever keeps it alive
pub struct ModuleUnit {
    pub instance: Box<dyn Module>,
    library: Option<Library>,
}

impl ModuleUnit {
    /// A unit whose code lives in the host binary
    pub fn new(instance: Box<dyn Module>) -> Self {
        Self {
            instance,
            library: None,
        }
    }

    /// A unit backed by a dynamic library that must stay mapped while the
    /// instance lives
    pub fn with_library(instance: Box<dyn Module>, library: Library) -> Self {
        Self {
            instance,
            library: Some(library),
        }
    }
}

/// One discovered module, ready to initialize.
///
/// Created once per discovered file and consumed by the load pipeline.
pub struct ModuleDefinition {
    /// Derived from the file basename, extension stripped
    pub name: String,
    /// Owning bundle name
    pub bundle: String,
    /// File path relative to the working directory
    pub file: PathBuf,
    pub(crate) instance: Box<dyn Module>,
    // Declared after `instance`: the instance must drop before its
    // library is unmapped.
    _library: Option<Library>,
}

impl ModuleDefinition {
    /// Build the context handed to this module's lifecycle function.
    ///
    /// A `<stem>.toml` sidecar next to the module file, when present,
    /// seeds the module's configuration.
    pub(crate) fn context(&self, cwd: &Path) -> ModuleContext {
        let sidecar = cwd.join(self.file.with_extension("toml"));
        let config = ModuleConfig::load(&sidecar).unwrap_or_default();
        ModuleContext::with_config(
            self.name.clone(),
            self.bundle.clone(),
            cwd.to_path_buf(),
            config,
        )
    }
}

/// The host's code-loading mechanism.
///
/// Loading is eager and synchronous: any failure here is fatal and aborts
/// the load before any lifecycle function runs, as opposed to a module's
/// own lifecycle function reporting an error.
pub trait ModuleSource: Send + Sync {
    fn load(&self, cwd: &Path, file: &Path) -> Result<ModuleUnit, LoaderError>;
}

type CreateFn = extern "C" fn() -> *mut dyn Module;
type ApiVersionFn = extern "C" fn() -> u32;

/// Loads modules as dynamic libraries using the versioned C-ABI scheme
/// generated by `trinket_module_api::export_module!`.
#[derive(Debug, Default)]
pub struct DylibSource;

impl DylibSource {
    pub fn new() -> Self {
        Self
    }
}

impl ModuleSource for DylibSource {
    fn load(&self, cwd: &Path, file: &Path) -> Result<ModuleUnit, LoaderError> {
        let path = cwd.join(file);

        // SAFETY: We're loading a library the embedder's bundle
        // configuration explicitly points at. The module is expected to
        // follow the Module trait contract.
        let library = unsafe { Library::new(&path) }.map_err(|e| LoaderError::LibraryLoad {
            file: path.clone(),
            source: e,
        })?;

        // SAFETY: We're calling a C function exported by the module.
        let api_version_fn: libloading::Symbol<ApiVersionFn> = unsafe {
            library.get(b"_trinket_module_api_version")
        }
        .map_err(|e| LoaderError::LibraryLoad {
            file: path.clone(),
            source: e,
        })?;

        let found = api_version_fn();
        if found != API_VERSION {
            return Err(LoaderError::ApiVersionMismatch {
                file: path,
                expected: API_VERSION,
                found,
            });
        }

        // SAFETY: We're calling the module's create function which returns
        // a raw pointer that we convert back to a Box<dyn Module>.
        let create_fn: libloading::Symbol<CreateFn> = unsafe {
            library.get(b"_trinket_module_create")
        }
        .map_err(|e| LoaderError::LibraryLoad {
            file: path.clone(),
            source: e,
        })?;

        let instance = unsafe { Box::from_raw(create_fn()) };

        Ok(ModuleUnit::with_library(instance, library))
    }
}

type ModuleFactory = Arc<dyn Fn() -> Box<dyn Module> + Send + Sync>;

/// In-memory module registry for tests and embedders that compile their
/// modules in rather than shipping dynamic libraries.
///
/// Factories are keyed by the file path the bundle resolver reports,
/// relative to the working directory.
#[derive(Default)]
pub struct StaticSource {
    factories: HashMap<PathBuf, ModuleFactory>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: register a factory for a resolved file path
    pub fn register<F>(mut self, file: impl Into<PathBuf>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Module> + Send + Sync + 'static,
    {
        self.factories.insert(file.into(), Arc::new(factory));
        self
    }
}

impl ModuleSource for StaticSource {
    fn load(&self, _cwd: &Path, file: &Path) -> Result<ModuleUnit, LoaderError> {
        let factory = self
            .factories
            .get(file)
            .ok_or_else(|| LoaderError::ModuleLoad {
                file: file.to_path_buf(),
                message: "no module registered for this file".to_string(),
            })?;
        Ok(ModuleUnit::new(factory()))
    }
}

/// Derive a module name from its file: basename with the extension stripped
fn module_name(file: &Path) -> String {
    file.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Flatten resolved bundles into module definitions, loading each code
/// unit eagerly.
///
/// Output order equals the resolver's bundle order, then file order within
/// each bundle - this is the load order.
pub(crate) fn build_definitions(
    resolved: Vec<ResolvedBundle>,
    bundle_filter: Option<&str>,
    cwd: &Path,
    source: &dyn ModuleSource,
) -> Result<Vec<ModuleDefinition>, LoaderError> {
    let mut definitions = Vec::new();
    for bundle in filter_bundles(resolved, bundle_filter) {
        for file in bundle.files {
            let unit = source.load(cwd, &file)?;
            definitions.push(ModuleDefinition {
                name: module_name(&file),
                bundle: bundle.name.clone(),
                file,
                instance: unit.instance,
                _library: unit.library,
            });
        }
    }
    Ok(definitions)
}
