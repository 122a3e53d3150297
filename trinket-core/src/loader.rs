//! Loader facade - the public entry point

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{RwLock, broadcast};
use trinket_module_api::ServiceMap;

use crate::bundles::{BundleResolver, GlobResolver, ResolvedBundle, filter_bundles};
use crate::config::{ErrorPolicy, LoaderConfig};
use crate::definitions::{DylibSource, ModuleDefinition, ModuleSource, build_definitions};
use crate::error::LoaderError;
use crate::events::{EventBus, EventSeq, LoaderEvent, MemoryEventBus};
use crate::pipeline::run_sequence;

/// Broadcast capacity for loader events
const EVENT_CAPACITY: usize = 256;

/// The loader discovers modules through its bundle descriptor and drives
/// their lifecycle functions strictly in discovery order.
///
/// `load_modules` is single-shot per loader instance; the services it
/// registers stay readable on the loader afterwards.
pub struct Loader {
    config: LoaderConfig,
    resolver: Arc<dyn BundleResolver>,
    source: Arc<dyn ModuleSource>,
    bus: Arc<dyn EventBus>,
    /// Services registered by the (single) load
    services: RwLock<ServiceMap>,
    /// Set on the first `load_modules` call, never reset
    load_started: AtomicBool,
}

impl Loader {
    /// Create a loader with the default glob resolver and dynamic-library
    /// module source
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            resolver: Arc::new(GlobResolver::new()),
            source: Arc::new(DylibSource::new()),
            bus: Arc::new(MemoryEventBus::new(EVENT_CAPACITY)),
            services: RwLock::new(ServiceMap::new()),
            load_started: AtomicBool::new(false),
        }
    }

    /// Builder: replace the bundle resolver
    pub fn with_resolver(mut self, resolver: Arc<dyn BundleResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Builder: replace the module source
    pub fn with_source(mut self, source: Arc<dyn ModuleSource>) -> Self {
        self.source = source;
        self
    }

    /// The loader's configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Whether `load_modules` has been invoked on this loader
    pub fn has_loaded(&self) -> bool {
        self.load_started.load(Ordering::SeqCst)
    }

    /// Subscribe to loader events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<(EventSeq, LoaderEvent)> {
        self.bus.subscribe()
    }

    /// Events already published, starting from `seq`
    pub async fn events_from(&self, seq: EventSeq) -> Vec<(EventSeq, LoaderEvent)> {
        self.bus.events_from(seq).await
    }

    /// Snapshot of the services registered so far.
    ///
    /// Readable at any time; after a failed load it holds the services of
    /// the modules that initialized before the failure.
    pub async fn services(&self) -> ServiceMap {
        self.services.read().await.clone()
    }

    /// List resolved bundles, optionally restricted to one bundle name.
    ///
    /// Pure and side-effect-free. An unknown bundle name yields an empty
    /// listing, never an error.
    pub fn list(&self, bundle: Option<&str>) -> Result<Vec<ResolvedBundle>, LoaderError> {
        let resolved = self.resolver.resolve(
            &self.config.cwd,
            &self.config.bundles,
            &self.config.default_bundle_name,
        )?;
        Ok(filter_bundles(resolved, bundle))
    }

    /// Materialize module definitions without running any lifecycle
    /// function.
    ///
    /// Code units are loaded eagerly: a file that fails to load as a
    /// module is an error here, before anything initializes.
    pub fn resolve_modules(
        &self,
        bundle: Option<&str>,
    ) -> Result<Vec<ModuleDefinition>, LoaderError> {
        let resolved = self.resolver.resolve(
            &self.config.cwd,
            &self.config.bundles,
            &self.config.default_bundle_name,
        )?;
        build_definitions(resolved, bundle, &self.config.cwd, self.source.as_ref())
    }

    /// Resolve modules and run their lifecycle functions strictly in
    /// discovery order, optionally restricted to one bundle.
    ///
    /// Single-shot: a second call fails with [`LoaderError::AlreadyLoaded`]
    /// whether the first call succeeded, failed, or is still running.
    ///
    /// On success the final accumulator is returned and a `Done` event is
    /// published. On failure the error is returned and, under
    /// [`ErrorPolicy::Emit`], also published as an `Error` event.
    pub async fn load_modules(&self, bundle: Option<&str>) -> Result<ServiceMap, LoaderError> {
        if self.load_started.swap(true, Ordering::SeqCst) {
            return Err(LoaderError::AlreadyLoaded);
        }

        match self.load_inner(bundle).await {
            Ok(services) => {
                tracing::info!(services = services.len(), "Load complete");
                self.bus
                    .publish(LoaderEvent::Done {
                        services: services.clone(),
                    })
                    .await;
                Ok(services)
            }
            Err(e) => {
                tracing::error!(error = %e, "Load failed");
                if self.config.error_policy == ErrorPolicy::Emit {
                    self.bus
                        .publish(LoaderEvent::Error {
                            message: e.to_string(),
                        })
                        .await;
                }
                Err(e)
            }
        }
    }

    async fn load_inner(&self, bundle: Option<&str>) -> Result<ServiceMap, LoaderError> {
        let definitions = self.resolve_modules(bundle)?;
        tracing::info!(modules = definitions.len(), "Loading modules");

        let mut services = ServiceMap::new();
        let result = run_sequence(
            definitions,
            &mut services,
            &self.config.cwd,
            &self.config.default_bundle_name,
            self.bus.as_ref(),
        )
        .await;

        // Persist whatever registered, even after an aborted load
        *self.services.write().await = services.clone();

        result.map(|()| services)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundles::StaticResolver;
    use crate::definitions::StaticSource;
    use std::path::PathBuf;

    fn empty_loader() -> Loader {
        Loader::new(LoaderConfig::new("/srv/app"))
            .with_resolver(Arc::new(StaticResolver::new(vec![])))
            .with_source(Arc::new(StaticSource::new()))
    }

    #[test]
    fn new_loader_has_not_loaded() {
        let loader = empty_loader();
        assert!(!loader.has_loaded());
    }

    #[test]
    fn list_returns_resolved_bundles() {
        let loader = Loader::new(LoaderConfig::new("/srv/app"))
            .with_resolver(Arc::new(StaticResolver::new(vec![ResolvedBundle {
                name: "only".to_string(),
                files: vec![PathBuf::from("only/a.rs")],
            }])))
            .with_source(Arc::new(StaticSource::new()));

        let all = loader.list(None).unwrap();
        assert_eq!(all.len(), 1);

        let none = loader.list(Some("nonexistent")).unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn load_with_no_modules_yields_empty_services() {
        let loader = empty_loader();
        let services = loader.load_modules(None).await.unwrap();
        assert!(services.is_empty());
        assert!(loader.has_loaded());
        assert!(loader.services().await.is_empty());
    }

    #[tokio::test]
    async fn second_load_is_rejected() {
        let loader = empty_loader();
        loader.load_modules(None).await.unwrap();

        let second = loader.load_modules(None).await;
        assert!(matches!(second, Err(LoaderError::AlreadyLoaded)));
    }

    #[tokio::test]
    async fn empty_load_emits_done() {
        let loader = empty_loader();
        let mut rx = loader.subscribe();
        loader.load_modules(None).await.unwrap();

        let (_, event) = rx.recv().await.unwrap();
        assert!(matches!(event, LoaderEvent::Done { services } if services.is_empty()));
    }
}
