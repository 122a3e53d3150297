//! Sequential load pipeline

use std::path::Path;

use trinket_module_api::ServiceMap;

use crate::definitions::ModuleDefinition;
use crate::error::LoaderError;
use crate::events::{EventBus, LoaderEvent};

/// Run each definition's lifecycle function strictly in sequence.
///
/// Module *i + 1* is not started until module *i*'s `init` has resolved,
/// success or failure. A failing module aborts the rest of the sequence;
/// services registered before the failure stay in the accumulator. No
/// timeout is imposed: a module that never resolves stalls the load.
pub(crate) async fn run_sequence(
    definitions: Vec<ModuleDefinition>,
    services: &mut ServiceMap,
    cwd: &Path,
    default_bundle_name: &str,
    bus: &dyn EventBus,
) -> Result<(), LoaderError> {
    let mut definitions = definitions;

    for def in &mut definitions {
        let mut ctx = def.context(cwd);
        tracing::debug!(module = %def.name, bundle = %def.bundle, "Initializing module");

        match def.instance.init(&mut ctx, services).await {
            Ok(result) => {
                if let Some(value) = result {
                    services.register(&def.bundle, &def.name, value, default_bundle_name);
                }
                tracing::info!(module = %def.name, bundle = %def.bundle, "Module loaded");
                bus.publish(LoaderEvent::Loaded {
                    name: def.name.clone(),
                    bundle: def.bundle.clone(),
                    services: services.clone(),
                })
                .await;
            }
            Err(e) => {
                tracing::error!(
                    module = %def.name,
                    bundle = %def.bundle,
                    error = %e,
                    "Module failed to initialize"
                );
                return Err(LoaderError::Lifecycle {
                    module: def.name.clone(),
                    bundle: def.bundle.clone(),
                    source: e,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundles::ResolvedBundle;
    use crate::definitions::{StaticSource, build_definitions};
    use crate::events::MemoryEventBus;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use trinket_module_api::{Module, ModuleContext, ModuleError};

    struct ValueModule(Value);

    #[async_trait]
    impl Module for ValueModule {
        async fn init(
            &mut self,
            _ctx: &mut ModuleContext,
            _services: &ServiceMap,
        ) -> Result<Option<Value>, ModuleError> {
            Ok(Some(self.0.clone()))
        }
    }

    struct FailingModule;

    #[async_trait]
    impl Module for FailingModule {
        async fn init(
            &mut self,
            _ctx: &mut ModuleContext,
            _services: &ServiceMap,
        ) -> Result<Option<Value>, ModuleError> {
            Err(ModuleError::custom("boom"))
        }
    }

    struct CountingModule(Arc<AtomicUsize>);

    #[async_trait]
    impl Module for CountingModule {
        async fn init(
            &mut self,
            _ctx: &mut ModuleContext,
            _services: &ServiceMap,
        ) -> Result<Option<Value>, ModuleError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    fn bundle(name: &str, files: &[&str]) -> ResolvedBundle {
        ResolvedBundle {
            name: name.to_string(),
            files: files.iter().map(PathBuf::from).collect(),
        }
    }

    #[tokio::test]
    async fn registers_services_in_order_and_emits_loaded() {
        let source = StaticSource::new()
            .register("modules/one.rs", || Box::new(ValueModule(json!(1))))
            .register("modules/two.rs", || Box::new(ValueModule(json!(2))));
        let definitions = build_definitions(
            vec![bundle("_", &["modules/one.rs", "modules/two.rs"])],
            None,
            Path::new("/srv"),
            &source,
        )
        .unwrap();

        let bus = MemoryEventBus::new(16);
        let mut services = ServiceMap::new();

        run_sequence(definitions, &mut services, Path::new("/srv"), "_", &bus)
            .await
            .unwrap();

        assert_eq!(services.get("one"), Some(&json!(1)));
        assert_eq!(services.get("two"), Some(&json!(2)));

        let events = bus.events_from(0).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0].1,
            LoaderEvent::Loaded { name, .. } if name == "one"
        ));
        assert!(matches!(
            &events[1].1,
            LoaderEvent::Loaded { name, .. } if name == "two"
        ));
    }

    #[tokio::test]
    async fn loaded_snapshot_grows_with_each_module() {
        let source = StaticSource::new()
            .register("modules/a.rs", || Box::new(ValueModule(json!("a"))))
            .register("modules/b.rs", || Box::new(ValueModule(json!("b"))));
        let definitions = build_definitions(
            vec![bundle("_", &["modules/a.rs", "modules/b.rs"])],
            None,
            Path::new("/srv"),
            &source,
        )
        .unwrap();

        let bus = MemoryEventBus::new(16);
        let mut services = ServiceMap::new();
        run_sequence(definitions, &mut services, Path::new("/srv"), "_", &bus)
            .await
            .unwrap();

        let events = bus.events_from(0).await;
        let LoaderEvent::Loaded { services: first, .. } = &events[0].1 else {
            panic!("expected loaded event");
        };
        let LoaderEvent::Loaded { services: second, .. } = &events[1].1 else {
            panic!("expected loaded event");
        };
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn failure_aborts_remaining_modules() {
        let invoked = Arc::new(AtomicUsize::new(0));
        let invoked_clone = Arc::clone(&invoked);

        let source = StaticSource::new()
            .register("modules/ok.rs", || Box::new(ValueModule(json!("fine"))))
            .register("modules/bad.rs", || Box::new(FailingModule))
            .register("modules/never.rs", move || {
                Box::new(CountingModule(Arc::clone(&invoked_clone)))
            });
        let definitions = build_definitions(
            vec![bundle(
                "_",
                &["modules/ok.rs", "modules/bad.rs", "modules/never.rs"],
            )],
            None,
            Path::new("/srv"),
            &source,
        )
        .unwrap();

        let bus = MemoryEventBus::new(16);
        let mut services = ServiceMap::new();
        let result =
            run_sequence(definitions, &mut services, Path::new("/srv"), "_", &bus).await;

        assert!(matches!(
            result,
            Err(LoaderError::Lifecycle { module, .. }) if module == "bad"
        ));
        // The module after the failure never ran
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
        // Services registered before the failure survive
        assert_eq!(services.get("ok"), Some(&json!("fine")));
        assert_eq!(services.len(), 1);
        // Only the successful module emitted a loaded event
        assert_eq!(bus.events_from(0).await.len(), 1);
    }

    #[tokio::test]
    async fn module_without_result_still_emits_loaded() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        let source = StaticSource::new().register("modules/quiet.rs", move || {
            Box::new(CountingModule(Arc::clone(&counter_clone)))
        });
        let definitions = build_definitions(
            vec![bundle("_", &["modules/quiet.rs"])],
            None,
            Path::new("/srv"),
            &source,
        )
        .unwrap();

        let bus = MemoryEventBus::new(16);
        let mut services = ServiceMap::new();
        run_sequence(definitions, &mut services, Path::new("/srv"), "_", &bus)
            .await
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(services.is_empty());
        assert_eq!(bus.events_from(0).await.len(), 1);
    }

    #[tokio::test]
    async fn named_bundle_services_are_namespaced() {
        let source = StaticSource::new()
            .register("modules/auth.rs", || Box::new(ValueModule(json!("token"))));
        let definitions = build_definitions(
            vec![bundle("private", &["modules/auth.rs"])],
            None,
            Path::new("/srv"),
            &source,
        )
        .unwrap();

        let bus = MemoryEventBus::new(16);
        let mut services = ServiceMap::new();
        run_sequence(definitions, &mut services, Path::new("/srv"), "_", &bus)
            .await
            .unwrap();

        assert_eq!(
            services.get_namespaced("private", "auth"),
            Some(&json!("token"))
        );
    }
}
