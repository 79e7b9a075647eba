//! Reflector: builds the metamodel from scanned assemblies
//!
//! Reflection runs in rounds. The first round seeds a placeholder for every
//! type the class strategy accepts; introspecting a type adds placeholders
//! for every type its members mention. Rounds repeat until no placeholder is
//! left, then a completion pass links services, contributions, subclasses and
//! menus and the result is frozen into a `Metamodel`.
//!
//! Introspecting one type only reads the catalog, so the result of a round
//! does not depend on the order of the types within it. `ParallelReflector`
//! relies on this.

pub mod parallel;

use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::sync::Arc;

pub use parallel::ParallelReflector;

use crate::class_strategy::{ClassStrategy, DefaultClassStrategy};
use crate::config::ReflectorConfig;
use crate::error::ReflectionResult;
use crate::facet::{
    ActionInvocationFacet, ContributedActionFacet, FacetHolder, FacetKind, MemberOrderFacet,
    MenuFacet, ServiceFacet,
};
use crate::factory::{FacetFactorySet, FactoryContext, MethodRemover, MethodSet, MethodState};
use crate::menu::{Menu, MenuBuilder, MenuDefinition};
use crate::metamodel::{ImmutableInMemorySpecCache, Metamodel, PartialMetamodel};
use crate::reflect::{AssemblyInfo, Attribute, MethodInfo, PropertyInfo, TypeCatalog, TypeRef};
use crate::spec::Specification;

type ActionsByType = FxHashMap<String, Vec<Arc<Specification>>>;

/// Builds a metamodel from assemblies
pub trait Reflect: Send + Sync {
    /// Reflect over the assemblies and freeze the result
    fn reflect(&self, assemblies: &[AssemblyInfo]) -> ReflectionResult<Metamodel>;
}

/// Sequential reflector
pub struct Reflector {
    config: Arc<ReflectorConfig>,
    class_strategy: Arc<dyn ClassStrategy>,
    factories: Arc<FacetFactorySet>,
    menus: FxHashMap<String, MenuDefinition>,
}

impl Reflector {
    /// Create a reflector from its collaborators
    pub fn new(
        config: Arc<ReflectorConfig>,
        class_strategy: Arc<dyn ClassStrategy>,
        factories: Arc<FacetFactorySet>,
    ) -> Self {
        Self {
            config,
            class_strategy,
            factories,
            menus: FxHashMap::default(),
        }
    }

    /// Reflector with the default class strategy and the standard factories
    pub fn standard(config: ReflectorConfig) -> Self {
        let config = Arc::new(config);
        let strategy = DefaultClassStrategy::new(Arc::clone(&config));
        Self::new(config, Arc::new(strategy), Arc::new(FacetFactorySet::standard()))
    }

    /// Register the menu layout of a type
    pub fn with_menu(mut self, type_name: impl Into<String>, definition: MenuDefinition) -> Self {
        self.menus.insert(type_name.into(), definition);
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &ReflectorConfig {
        &self.config
    }

    /// Class strategy in use
    pub fn class_strategy(&self) -> &Arc<dyn ClassStrategy> {
        &self.class_strategy
    }

    /// Factory chain in use
    pub fn factories(&self) -> &FacetFactorySet {
        &self.factories
    }

    /// Index the assemblies and check the configuration against them
    pub(crate) fn prepare(&self, assemblies: &[AssemblyInfo]) -> ReflectionResult<TypeCatalog> {
        let catalog = TypeCatalog::from_assemblies(assemblies);
        self.config.validate(&catalog)?;
        log::debug!(
            "reflecting {} types with {} factories",
            catalog.len(),
            self.factories.len()
        );
        Ok(catalog)
    }

    /// A placeholder for every type the class strategy accepts
    pub(crate) fn seed(&self, catalog: &TypeCatalog) -> PartialMetamodel {
        let mut metamodel = PartialMetamodel::new();
        for type_info in catalog.iter() {
            if let Some(name) = self.class_strategy.filter_type(type_info) {
                if name != type_info.full_name {
                    log::debug!("{} reflects as {}", type_info.full_name, name);
                }
                metamodel = metamodel.with_placeholder(&name);
            }
        }
        metamodel
    }

    /// Register speculative assemblies declaring pending types the scan missed
    pub(crate) fn load_speculative(&self, catalog: &mut TypeCatalog, pending: &[String]) {
        for name in pending {
            if catalog.contains(name) {
                continue;
            }
            if let Some(assembly) = self.class_strategy.load_speculative_assembly(name) {
                log::info!("loading assembly {} for {}", assembly.name, name);
                for type_info in assembly.types {
                    if !catalog.contains(&type_info.full_name) {
                        catalog.register(&assembly.name, type_info);
                    }
                }
            }
        }
    }

    /// Whether every type a reference mentions can take part in the model
    fn introspectable(&self, catalog: &TypeCatalog, type_ref: &TypeRef) -> Result<(), String> {
        for name in type_ref.referenced_spec_names() {
            let accepted = match catalog.get(&name) {
                Some(type_info) => self.class_strategy.is_type_to_be_introspected(&type_info),
                None => self
                    .class_strategy
                    .load_speculative_assembly(&name)
                    .map(|assembly| {
                        assembly.types.iter().any(|t| {
                            t.full_name == name && self.class_strategy.is_type_to_be_introspected(t)
                        })
                    })
                    .unwrap_or(false),
            };
            if !accepted {
                return Err(name);
            }
        }
        Ok(())
    }

    fn method_introspectable(&self, catalog: &TypeCatalog, method: &MethodInfo) -> Result<(), String> {
        self.introspectable(catalog, &method.return_type)?;
        for parameter in &method.parameters {
            self.introspectable(catalog, &parameter.parameter_type)?;
        }
        Ok(())
    }

    /// Introspect one pending type
    ///
    /// The returned version has `name` introspected, or removed when it
    /// cannot be introspected.
    pub(crate) fn introspect_type(
        &self,
        catalog: &TypeCatalog,
        name: &str,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        let Some(type_info) = catalog.get(name) else {
            log::warn!("{} is referenced but not declared in any assembly", name);
            return Ok(metamodel.without(name));
        };
        if !self.class_strategy.is_type_to_be_introspected(&type_info) {
            log::debug!("{} is not part of the model", name);
            return Ok(metamodel.without(name));
        }
        log::trace!("introspecting {}", name);

        let methods = self.class_strategy.filter_methods(catalog.all_methods(name));
        let properties: Vec<PropertyInfo> = catalog
            .all_properties(name)
            .into_iter()
            .filter(|p| {
                p.has_getter
                    && !p.is_static
                    && !p.attributes.iter().any(|a| matches!(a, Attribute::NakedObjectsIgnore))
            })
            .collect();
        let ctx = FactoryContext {
            catalog,
            class_strategy: self.class_strategy.as_ref(),
            config: &self.config,
            type_info: &type_info,
            methods: &methods,
            properties: &properties,
        };
        let mut remover = MethodSet::new(methods.clone());
        for property in &properties {
            remover.claim(&property.getter_id(), MethodState::Property);
            remover.claim(&property.setter_id(), MethodState::Property);
        }

        let mut spec = Specification::object(&type_info);
        let mut metamodel = self
            .factories
            .process_type(&ctx, &mut remover, &mut spec, metamodel)?;
        for related in type_info.superclass.iter().chain(type_info.interfaces.iter()) {
            if self.introspectable(catalog, &TypeRef::named(related.as_str())).is_ok() {
                metamodel = metamodel.with_placeholder(related);
            }
        }

        let mut fields = Vec::new();
        for property in &properties {
            if let Err(missing) = self.introspectable(catalog, &property.property_type) {
                log::warn!(
                    "{}.{}: type {} is not part of the model, property skipped",
                    name,
                    property.name,
                    missing
                );
                continue;
            }
            let mut field = if property.property_type.is_collection() {
                Specification::collection(property, name)
            } else {
                Specification::property(property, name)
            };
            let saved = metamodel.clone();
            match self
                .factories
                .process_property(&ctx, property, &mut remover, &mut field, metamodel)
            {
                Ok(next) => {
                    metamodel = ensure_introspected(next, &property.property_type);
                    fields.push(field);
                }
                Err(e) if !e.is_fatal() => {
                    log::warn!("{}.{}: {}; property skipped", name, property.name, e);
                    metamodel = saved;
                }
                Err(e) => return Err(e),
            }
        }

        let candidates: Vec<MethodInfo> = remover
            .unclassified()
            .into_iter()
            .filter(|m| {
                !m.is_static && !self.factories.recognises(&m.name) && !self.factories.filters(m, &ctx)
            })
            .collect();
        let mut actions = Vec::new();
        for method in &candidates {
            if !remover.claim(&method.id(), MethodState::Action) {
                continue;
            }
            if let Err(missing) = self.method_introspectable(catalog, method) {
                log::warn!(
                    "{}: type {} is not part of the model, action skipped",
                    method.id(),
                    missing
                );
                continue;
            }
            let mut action = Specification::action(method, name);
            let saved = metamodel.clone();
            match self
                .factories
                .process_action(&ctx, method, &mut remover, &mut action, metamodel)
            {
                Ok(mut next) => {
                    next = ensure_introspected(next, &method.return_type);
                    for parameter in &method.parameters {
                        next = ensure_introspected(next, &parameter.parameter_type);
                    }
                    metamodel = next;
                    actions.push(action);
                }
                Err(e) if !e.is_fatal() => {
                    log::warn!("{}: {}; action skipped", method.id(), e);
                    metamodel = saved;
                }
                Err(e) => return Err(e),
            }
        }

        sort_by_member_order(&mut fields);
        sort_by_member_order(&mut actions);
        let is_service = self.class_strategy.is_service(name);
        if is_service {
            spec.add_facet(ServiceFacet);
        }
        if let Some(object) = spec.as_object_mut() {
            object.fields = fields.into_iter().map(Arc::new).collect();
            object.actions = actions.into_iter().map(Arc::new).collect();
            object.is_service = is_service;
        }
        log::debug!(
            "{}: {} fields, {} actions, {} methods removed",
            name,
            spec.fields().len(),
            spec.actions().len(),
            remover.removed().len()
        );
        Ok(metamodel.with_introspected(spec))
    }

    /// Introspect placeholders until none is left, one round at a time
    fn introspect_all(
        &self,
        catalog: &mut TypeCatalog,
        mut metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        loop {
            let pending = metamodel.placeholders();
            if pending.is_empty() {
                return Ok(metamodel);
            }
            self.load_speculative(catalog, &pending);
            for name in &pending {
                metamodel = self.introspect_type(catalog, name, metamodel)?;
            }
        }
    }

    /// Link services, contributions, subclasses and menus, then freeze
    pub(crate) fn complete(
        &self,
        catalog: &TypeCatalog,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<Metamodel> {
        let mut specs = metamodel.into_specifications();
        let mut objects: Vec<String> = specs
            .iter()
            .filter(|(_, s)| s.as_object().is_some())
            .map(|(n, _)| n.clone())
            .collect();
        objects.sort();
        let services: Vec<String> = self
            .config
            .services
            .iter()
            .filter(|s| specs.contains_key(s.as_str()))
            .cloned()
            .collect();

        let (contributed, finders) = self.collect_service_actions(catalog, &specs, &services, &objects);
        for name in &objects {
            let subclasses: Vec<String> = catalog
                .direct_subtypes(name)
                .into_iter()
                .filter(|s| specs.contains_key(s))
                .collect();
            let Some(spec) = specs.get_mut(name) else {
                continue;
            };
            let Some(object) = Arc::make_mut(spec).as_object_mut() else {
                continue;
            };
            object.subclasses = subclasses;
            if let Some(actions) = contributed.get(name) {
                object.contributed_actions = actions.clone();
            }
            if let Some(actions) = finders.get(name) {
                object.finder_actions = actions.clone();
            }
        }

        let mut menus = Vec::new();
        for service in &services {
            let menu = self.menu_for(&specs, service)?;
            if !menu.is_empty() {
                menus.push(menu);
            }
        }

        let supertypes: FxHashMap<String, Vec<String>> = objects
            .iter()
            .map(|name| (name.clone(), supertypes_of(catalog, name)))
            .collect();
        let metamodel = Metamodel::new(
            Box::new(ImmutableInMemorySpecCache::new(specs)),
            menus,
            services,
            self.config.authorizers.clone(),
            supertypes,
        );
        log::info!(
            "metamodel built: {} specifications, {} services, {} menus",
            metamodel.len(),
            metamodel.services().len(),
            metamodel.menus().len()
        );
        Ok(metamodel)
    }

    /// Contributed and finder actions per target type
    fn collect_service_actions(
        &self,
        catalog: &TypeCatalog,
        specs: &FxHashMap<String, Arc<Specification>>,
        services: &[String],
        objects: &[String],
    ) -> (ActionsByType, ActionsByType) {
        let mut contributed = ActionsByType::default();
        let mut finders = ActionsByType::default();
        let targets: Vec<&String> = objects
            .iter()
            .filter(|n| specs.get(n.as_str()).map(|s| !s.is_service()).unwrap_or(false))
            .collect();
        for service in services {
            let Some(service_spec) = specs.get(service) else {
                continue;
            };
            for action in service_spec.actions() {
                if let Some(facet) = action.get::<ContributedActionFacet>() {
                    for target in &targets {
                        let matches = facet
                            .contributees
                            .iter()
                            .any(|c| catalog.is_assignable(target, &c.type_name));
                        if matches {
                            contributed
                                .entry((*target).clone())
                                .or_default()
                                .push(Arc::clone(action));
                        }
                    }
                }
                if action.contains_facet(FacetKind::FinderAction) {
                    let returned = action.get::<ActionInvocationFacet>().and_then(|i| {
                        i.element_type.clone().or_else(|| i.return_type.spec_name())
                    });
                    let Some(returned) = returned else {
                        continue;
                    };
                    for target in &targets {
                        if catalog.is_assignable(&returned, target) {
                            finders
                                .entry((*target).clone())
                                .or_default()
                                .push(Arc::clone(action));
                        }
                    }
                }
            }
        }
        (contributed, finders)
    }

    fn menu_for(
        &self,
        specs: &FxHashMap<String, Arc<Specification>>,
        service: &str,
    ) -> ReflectionResult<Menu> {
        if let Some(definition) = self.menus.get(service) {
            let name = specs.get(service).map(|s| s.name()).unwrap_or(service);
            let mut builder = MenuBuilder::new(specs, service, name);
            definition(&mut builder)?;
            return Ok(builder.build());
        }
        let via_method = specs
            .get(service)
            .and_then(|s| s.get::<MenuFacet>())
            .map(|m| matches!(m, MenuFacet::ViaMethod { .. }))
            .unwrap_or(false);
        if via_method {
            log::warn!(
                "{} declares a menu method but no menu definition is registered, using the default menu",
                service
            );
        }
        MenuBuilder::default_menu(specs, service)
    }
}

impl Reflect for Reflector {
    fn reflect(&self, assemblies: &[AssemblyInfo]) -> ReflectionResult<Metamodel> {
        let mut catalog = self.prepare(assemblies)?;
        let seeded = self.seed(&catalog);
        let metamodel = self.introspect_all(&mut catalog, seeded)?;
        self.complete(&catalog, metamodel)
    }
}

impl std::fmt::Debug for Reflector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reflector")
            .field("config", &self.config)
            .field("factories", &self.factories.len())
            .field("menus", &self.menus.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Placeholders for every type a member's declared type mentions
pub fn ensure_introspected(metamodel: PartialMetamodel, type_ref: &TypeRef) -> PartialMetamodel {
    type_ref
        .referenced_spec_names()
        .iter()
        .fold(metamodel, |m, name| m.with_placeholder(name))
}

/// Ordered members first by sequence, then the rest in declaration order
fn sort_by_member_order(members: &mut [Specification]) {
    members.sort_by(|a, b| {
        match (a.get::<MemberOrderFacet>(), b.get::<MemberOrderFacet>()) {
            (Some(x), Some(y)) => MemberOrderFacet::compare_sequences(&x.sequence, &y.sequence),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

/// Every superclass and interface of a type, sorted
fn supertypes_of(catalog: &TypeCatalog, name: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut stack = vec![name.to_string()];
    while let Some(current) = stack.pop() {
        let Some(type_info) = catalog.get(&current) else {
            continue;
        };
        for sup in type_info.superclass.iter().chain(type_info.interfaces.iter()) {
            if !found.contains(sup) {
                found.push(sup.clone());
                stack.push(sup.clone());
            }
        }
    }
    found.sort();
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{MethodInfo, PrimitiveType, TypeInfo};

    fn shop() -> AssemblyInfo {
        AssemblyInfo::new("Shop")
            .with_type(
                TypeInfo::class("Shop.Customer")
                    .property(PropertyInfo::new("Name", TypeRef::string()).settable())
                    .property(PropertyInfo::new("Orders", TypeRef::list_of(TypeRef::named("Shop.Order"))))
                    .method(MethodInfo::new("Rename", TypeRef::Void).param("name", TypeRef::string())),
            )
            .with_type(
                TypeInfo::class("Shop.Order")
                    .property(PropertyInfo::new("Quantity", TypeRef::Primitive(PrimitiveType::Int32))),
            )
    }

    #[test]
    fn test_referenced_types_are_introspected() {
        let config = ReflectorConfig::default().with_type("Shop.Customer");
        let metamodel = Reflector::standard(config).reflect(&[shop()]).expect("reflects");
        assert!(metamodel.get_specification("Shop.Customer").is_some());
        assert!(metamodel.get_specification("System.Int32").is_some());
        assert!(metamodel.get_specification("System.String").is_some());
        // Shop.Order is referenced but not registered
        assert!(metamodel.get_specification("Shop.Order").is_none());
        let customer = metamodel.specification("Shop.Customer").expect("customer");
        assert!(customer.field("Orders").is_none());
        assert!(customer.field("Name").is_some());
        assert!(customer.action_named("Rename").is_some());
    }

    #[test]
    fn test_namespace_registration_keeps_collections() {
        let config = ReflectorConfig::default().with_namespace("Shop");
        let metamodel = Reflector::standard(config).reflect(&[shop()]).expect("reflects");
        let customer = metamodel.specification("Shop.Customer").expect("customer");
        assert!(customer.field("Orders").is_some());
        assert!(metamodel.is_assignable("Shop.Order", "Shop.Order"));
    }

    #[test]
    fn test_member_order_sort_is_stable() {
        let mut members: Vec<Specification> = ["C", "A", "B"]
            .into_iter()
            .map(|n| Specification::action(&MethodInfo::new(n, TypeRef::Void), "Shop.T"))
            .collect();
        members[2].add_facet(MemberOrderFacet {
            sequence: "1".into(),
            name: String::new(),
        });
        sort_by_member_order(&mut members);
        let names: Vec<&str> = members.iter().map(|m| m.member_name()).collect();
        assert_eq!(names, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_invalid_configuration_is_fatal() {
        let config = ReflectorConfig::default().with_namespace("Billing");
        let err = Reflector::standard(config).reflect(&[shop()]).expect_err("unmatched namespace");
        assert!(err.is_fatal());
    }
}
