//! Composition root
//!
//! `StandardConfig` registers the standard components on a
//! `FrameworkBuilder`. Singletons (configuration, class strategy, reflector,
//! metamodel, delegate cache, object store) live in the built
//! `NakedFramework`; session, services, lifecycle manager and transaction
//! manager are created per request by `NakedFramework::scope`.

use naked_metamodel::factory::registry::{instantiate_standard, register_replacement};
use naked_metamodel::{
    AssemblyInfo, ClassStrategy, DefaultClassStrategy, FacetFactory, FacetFactorySet,
    MenuDefinition, Metamodel, MetamodelManager, MethodId, ParallelReflector, Reflect, Reflector,
    ReflectorConfig,
};
use std::sync::Arc;

use crate::error::{NakedError, NakedResult};
use crate::lifecycle::{InMemoryLifecycleManager, InMemoryObjectStore, ObjectStore};
use crate::registry::{DelegateCache, MethodRegistry};
use crate::services::ServiceRegistry;
use crate::session::Session;
use crate::spec::{AuthorizerMap, RequestScope, TypeAuthorizer};
use crate::value::{DomainValue, ObjectHandle};

/// Registration of the standard framework components
pub struct StandardConfig;

impl StandardConfig {
    /// Configuration, class strategy; the reflector and metamodel follow from them at build
    pub fn register_core_singleton_types(builder: &mut FrameworkBuilder, config: ReflectorConfig) {
        let config = Arc::new(config);
        if builder.class_strategy.is_none() {
            builder.class_strategy = Some(Arc::new(DefaultClassStrategy::new(Arc::clone(&config))));
        }
        builder.config = Some(config);
    }

    /// Per-request components; the store they share defaults to an in-memory one
    pub fn register_core_scoped_types(builder: &mut FrameworkBuilder) {
        if builder.store.is_none() {
            builder.store = Some(Arc::new(InMemoryObjectStore::new()));
        }
        builder.scoped_registered = true;
    }

    /// The standard facet factory chain, each at its standard position
    pub fn register_standard_facet_factories(builder: &mut FrameworkBuilder) {
        builder.factories = instantiate_standard();
    }

    /// Builder with every standard registration applied
    pub fn builder(config: ReflectorConfig) -> FrameworkBuilder {
        let mut builder = FrameworkBuilder::new();
        Self::register_core_singleton_types(&mut builder, config);
        Self::register_core_scoped_types(&mut builder);
        Self::register_standard_facet_factories(&mut builder);
        builder
    }
}

/// Components gathered before the framework is built
#[derive(Default)]
pub struct FrameworkBuilder {
    config: Option<Arc<ReflectorConfig>>,
    class_strategy: Option<Arc<dyn ClassStrategy>>,
    factories: Vec<Box<dyn FacetFactory>>,
    menus: Vec<(String, MenuDefinition)>,
    methods: MethodRegistry,
    store: Option<Arc<dyn ObjectStore>>,
    authorizers: AuthorizerMap,
    scoped_registered: bool,
}

impl FrameworkBuilder {
    /// Nothing registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another class strategy
    pub fn with_class_strategy(mut self, strategy: Arc<dyn ClassStrategy>) -> Self {
        self.class_strategy = Some(strategy);
        self
    }

    /// Replace a standard facet factory, keeping its position
    pub fn replace_facet_factory(
        mut self,
        replaces: &str,
        make: impl FnOnce(usize) -> Box<dyn FacetFactory>,
    ) -> NakedResult<Self> {
        register_replacement(&mut self.factories, replaces, make)?;
        Ok(self)
    }

    /// Register the menu layout of a type
    pub fn with_menu(mut self, type_name: impl Into<String>, definition: MenuDefinition) -> Self {
        self.menus.push((type_name.into(), definition));
        self
    }

    /// Register the body of a domain method
    pub fn with_method<F>(mut self, id: MethodId, handler: F) -> Self
    where
        F: Fn(Option<&ObjectHandle>, &[DomainValue]) -> NakedResult<DomainValue> + Send + Sync + 'static,
    {
        self.methods.register(id, handler);
        self
    }

    /// Method registry, for bulk registration
    pub fn methods_mut(&mut self) -> &mut MethodRegistry {
        &mut self.methods
    }

    /// Use another object store
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Register a type authorizer under the name the configuration uses
    pub fn with_authorizer(mut self, name: impl Into<String>, authorizer: Arc<dyn TypeAuthorizer>) -> Self {
        self.authorizers.insert(name.into(), authorizer);
        self
    }

    /// Reflect over the assemblies and assemble the framework
    pub fn build(self, assemblies: &[AssemblyInfo]) -> NakedResult<NakedFramework> {
        let config = self.config.ok_or_else(|| {
            NakedError::Initialisation("core singleton types were not registered".into())
        })?;
        let class_strategy = self.class_strategy.ok_or_else(|| {
            NakedError::Initialisation("no class strategy registered".into())
        })?;
        if self.factories.is_empty() {
            return Err(NakedError::Initialisation("no facet factories registered".into()));
        }
        let store = match (self.scoped_registered, self.store) {
            (true, Some(store)) => store,
            _ => {
                return Err(NakedError::Initialisation(
                    "core scoped types were not registered".into(),
                ))
            }
        };

        let mut reflector = Reflector::new(
            Arc::clone(&config),
            class_strategy,
            Arc::new(FacetFactorySet::new(self.factories)),
        );
        for (type_name, definition) in self.menus {
            reflector = reflector.with_menu(type_name, definition);
        }
        let reflector: Box<dyn Reflect> = if config.parallel {
            Box::new(ParallelReflector::new(reflector).with_workers(config.worker_count()))
        } else {
            Box::new(reflector)
        };

        let metamodel = reflector.reflect(assemblies)?;
        log::info!(
            "framework built: {} specifications, {} menus, {} methods",
            metamodel.len(),
            metamodel.menus().len(),
            self.methods.len()
        );

        Ok(NakedFramework {
            reflector,
            metamodel: MetamodelManager::new(metamodel),
            delegates: Arc::new(DelegateCache::new(Arc::new(self.methods))),
            store,
            authorizers: Arc::new(self.authorizers),
        })
    }
}

/// The assembled framework: singletons plus a factory for request scopes
pub struct NakedFramework {
    reflector: Box<dyn Reflect>,
    metamodel: MetamodelManager,
    delegates: Arc<DelegateCache>,
    store: Arc<dyn ObjectStore>,
    authorizers: Arc<AuthorizerMap>,
}

impl NakedFramework {
    /// Current metamodel
    pub fn metamodel(&self) -> Arc<Metamodel> {
        self.metamodel.metamodel()
    }

    /// Shared delegate cache
    pub fn delegates(&self) -> &Arc<DelegateCache> {
        &self.delegates
    }

    /// Shared object store
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Fresh per-request components for a session
    pub fn scope(&self, session: Arc<dyn Session>) -> RequestScope {
        let metamodel = self.metamodel();
        let services = Arc::new(ServiceRegistry::from_metamodel(&metamodel));
        let lifecycle = Arc::new(InMemoryLifecycleManager::new(
            Arc::clone(&metamodel),
            Arc::clone(&self.delegates),
            Arc::clone(&self.store),
        ));
        RequestScope::new(
            metamodel,
            Arc::clone(&self.delegates),
            session,
            services,
            lifecycle,
            Arc::clone(&self.store),
        )
        .with_authorizers(Arc::clone(&self.authorizers))
    }

    /// Reflect again and swap the whole model; on error the current model stays
    pub fn rebuild(&self, assemblies: &[AssemblyInfo]) -> NakedResult<Arc<Metamodel>> {
        Ok(self.metamodel.rebuild(|| self.reflector.reflect(assemblies))?)
    }
}

impl std::fmt::Debug for NakedFramework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NakedFramework")
            .field("specifications", &self.metamodel().len())
            .field("delegates", &self.delegates)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_registrations() {
        let err = FrameworkBuilder::new().build(&[]).expect_err("nothing registered");
        assert!(matches!(err, NakedError::Initialisation(_)));

        let mut builder = FrameworkBuilder::new();
        StandardConfig::register_core_singleton_types(&mut builder, ReflectorConfig::default());
        StandardConfig::register_core_scoped_types(&mut builder);
        let err = builder.build(&[]).expect_err("no factories");
        assert!(err.to_string().contains("facet factories"));

        let mut builder = FrameworkBuilder::new();
        StandardConfig::register_core_singleton_types(&mut builder, ReflectorConfig::default());
        StandardConfig::register_standard_facet_factories(&mut builder);
        let err = builder.build(&[]).expect_err("no scoped types");
        assert!(err.to_string().contains("scoped"));
    }

    #[test]
    fn test_standard_factories_in_standard_positions() {
        let mut builder = FrameworkBuilder::new();
        StandardConfig::register_standard_facet_factories(&mut builder);
        let orders: Vec<usize> = builder.factories.iter().map(|f| f.numeric_order()).collect();
        assert_eq!(orders, (0..orders.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_model_builds() {
        let framework = StandardConfig::builder(ReflectorConfig::default())
            .build(&[])
            .expect("empty model");
        assert!(framework.metamodel().is_empty());
    }
}
