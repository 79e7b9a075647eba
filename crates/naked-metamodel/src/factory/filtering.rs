//! Factories that only remove or filter methods

use crate::class_strategy::PROXY_NAMESPACE;
use crate::config::in_namespace;
use crate::error::ReflectionResult;
use crate::facet::HiddenFacet;
use crate::metamodel::PartialMetamodel;
use crate::reflect::{Attribute, MethodInfo, PropertyInfo, TypeRef, WhenTo};
use crate::spec::Specification;

use super::{FacetFactory, FactoryContext, FactoryMeta, FeatureType, MethodRemover};

// ============================================================================
// [NakedObjectsIgnore]
// ============================================================================

static REMOVE_IGNORED_META: FactoryMeta = FactoryMeta {
    name: "RemoveIgnoredMethods",
    feature_types: FeatureType::OBJECTS_AND_INTERFACES,
    prefixes: &[],
};

/// Removes methods annotated `[NakedObjectsIgnore]`
pub struct RemoveIgnoredMethodsFacetFactory {
    order: usize,
}

impl RemoveIgnoredMethodsFacetFactory {
    /// Create the factory at a position in the chain
    pub fn new(order: usize) -> Self {
        Self { order }
    }
}

impl FacetFactory for RemoveIgnoredMethodsFacetFactory {
    fn meta(&self) -> &FactoryMeta {
        &REMOVE_IGNORED_META
    }

    fn numeric_order(&self) -> usize {
        self.order
    }

    fn process_type(
        &self,
        ctx: &FactoryContext<'_>,
        remover: &mut dyn MethodRemover,
        _spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        for method in ctx.methods {
            if method.attributes.contains(&Attribute::NakedObjectsIgnore) {
                remover.remove_method(&method.id());
            }
        }
        Ok(metamodel)
    }
}

// ============================================================================
// Persistence proxies
// ============================================================================

const PROXY_METHODS: &[&str] = &["GetBasePropertyValue", "SetBasePropertyValue", "SetChangeTracker"];
const RELATIONSHIP_MANAGER: &str = "RelationshipManager";

static REMOVE_PROXY_META: FactoryMeta = FactoryMeta {
    name: "RemoveDynamicProxyMethods",
    feature_types: FeatureType::OBJECTS.union(FeatureType::PROPERTIES),
    prefixes: &[],
};

/// Strips the plumbing persistence proxies add to domain types
pub struct RemoveDynamicProxyMethodsFacetFactory {
    order: usize,
}

impl RemoveDynamicProxyMethodsFacetFactory {
    /// Create the factory at a position in the chain
    pub fn new(order: usize) -> Self {
        Self { order }
    }

    fn is_proxy(name: &str) -> bool {
        in_namespace(name, PROXY_NAMESPACE)
    }
}

impl FacetFactory for RemoveDynamicProxyMethodsFacetFactory {
    fn meta(&self) -> &FactoryMeta {
        &REMOVE_PROXY_META
    }

    fn numeric_order(&self) -> usize {
        self.order
    }

    fn process_type(
        &self,
        ctx: &FactoryContext<'_>,
        remover: &mut dyn MethodRemover,
        _spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        if Self::is_proxy(ctx.owner()) {
            for method in ctx.methods {
                if PROXY_METHODS.contains(&method.name.as_str()) {
                    remover.remove_method(&method.id());
                }
            }
        }
        Ok(metamodel)
    }

    fn process_property(
        &self,
        ctx: &FactoryContext<'_>,
        property: &PropertyInfo,
        _remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        if Self::is_proxy(ctx.owner()) && property.name == RELATIONSHIP_MANAGER {
            spec.add_facet(HiddenFacet { when: WhenTo::Always });
        }
        Ok(metamodel)
    }
}

// ============================================================================
// Event accessors
// ============================================================================

static REMOVE_EVENT_HANDLER_META: FactoryMeta = FactoryMeta {
    name: "RemoveEventHandlerMethods",
    feature_types: FeatureType::OBJECTS,
    prefixes: &[],
};

/// Removes `add_X` / `remove_X` accessors of declared events
pub struct RemoveEventHandlerMethodsFacetFactory {
    order: usize,
}

impl RemoveEventHandlerMethodsFacetFactory {
    /// Create the factory at a position in the chain
    pub fn new(order: usize) -> Self {
        Self { order }
    }
}

impl FacetFactory for RemoveEventHandlerMethodsFacetFactory {
    fn meta(&self) -> &FactoryMeta {
        &REMOVE_EVENT_HANDLER_META
    }

    fn numeric_order(&self) -> usize {
        self.order
    }

    fn process_type(
        &self,
        ctx: &FactoryContext<'_>,
        remover: &mut dyn MethodRemover,
        _spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        for event in &ctx.type_info.events {
            let accessors = [format!("add_{}", event), format!("remove_{}", event)];
            for method in ctx.methods {
                if accessors.iter().any(|a| *a == method.name) {
                    remover.remove_method(&method.id());
                }
            }
        }
        Ok(metamodel)
    }
}

// ============================================================================
// Enumerator plumbing
// ============================================================================

const ITERATOR_METHODS: &[&str] = &["GetEnumerator", "MoveNext", "Reset", "Dispose", "get_Current"];
const ITERATOR_INTERFACES: &[&str] = &["IEnumerable", "IEnumerator", "IDisposable"];

static ITERATOR_FILTERING_META: FactoryMeta = FactoryMeta {
    name: "IteratorFiltering",
    feature_types: FeatureType::OBJECTS,
    prefixes: &[],
};

/// Keeps enumerator plumbing of enumerable domain types out of the actions
pub struct IteratorFilteringFacetFactory {
    order: usize,
}

impl IteratorFilteringFacetFactory {
    /// Create the factory at a position in the chain
    pub fn new(order: usize) -> Self {
        Self { order }
    }

    fn is_enumerable(ctx: &FactoryContext<'_>) -> bool {
        ctx.type_info.interfaces.iter().any(|i| {
            let short = i.rsplit('.').next().unwrap_or(i);
            ITERATOR_INTERFACES.contains(&short)
        })
    }
}

impl FacetFactory for IteratorFilteringFacetFactory {
    fn meta(&self) -> &FactoryMeta {
        &ITERATOR_FILTERING_META
    }

    fn numeric_order(&self) -> usize {
        self.order
    }

    fn filters(&self, method: &MethodInfo, ctx: &FactoryContext<'_>) -> bool {
        Self::is_enumerable(ctx) && ITERATOR_METHODS.contains(&method.name.as_str())
    }
}

// ============================================================================
// Unsupported signatures
// ============================================================================

static UNSUPPORTED_PARAMETERS_META: FactoryMeta = FactoryMeta {
    name: "UnsupportedParameterTypesMethodFiltering",
    feature_types: FeatureType::ACTIONS,
    prefixes: &[],
};

/// Keeps methods whose signature cannot be offered as an action out of the model
///
/// Filtered: open generic methods, `out` parameters, and parameter or return
/// types that name nothing the catalog or a speculative assembly knows.
pub struct UnsupportedParameterTypesFacetFactory {
    order: usize,
}

impl UnsupportedParameterTypesFacetFactory {
    /// Create the factory at a position in the chain
    pub fn new(order: usize) -> Self {
        Self { order }
    }

    fn unresolvable(ctx: &FactoryContext<'_>, type_ref: &TypeRef) -> Option<String> {
        type_ref.referenced_spec_names().into_iter().find(|name| {
            !ctx.catalog.contains(name) && ctx.class_strategy.load_speculative_assembly(name).is_none()
        })
    }
}

impl FacetFactory for UnsupportedParameterTypesFacetFactory {
    fn meta(&self) -> &FactoryMeta {
        &UNSUPPORTED_PARAMETERS_META
    }

    fn numeric_order(&self) -> usize {
        self.order
    }

    fn filters(&self, method: &MethodInfo, ctx: &FactoryContext<'_>) -> bool {
        if method.is_generic {
            log::debug!("filtering generic method {}", method.id());
            return true;
        }
        if method.parameters.iter().any(|p| p.is_out) {
            log::debug!("filtering method {} with out parameter", method.id());
            return true;
        }
        let unknown = method
            .parameters
            .iter()
            .map(|p| &p.parameter_type)
            .chain(std::iter::once(&method.return_type))
            .find_map(|t| Self::unresolvable(ctx, t));
        if let Some(name) = unknown {
            log::debug!("filtering method {}: unknown type {}", method.id(), name);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::test_support::Fixture;
    use crate::factory::MethodSet;
    use crate::reflect::{ParameterInfo, TypeInfo};

    #[test]
    fn test_ignored_methods_are_removed() {
        let fixture = Fixture::new(
            TypeInfo::class("Shop.Customer")
                .method(MethodInfo::new("Helper", TypeRef::Void).attribute(Attribute::NakedObjectsIgnore))
                .method(MethodInfo::new("Order", TypeRef::Void)),
        );
        let mut set = MethodSet::new(fixture.methods.clone());
        let mut spec = Specification::object(&fixture.type_info);
        RemoveIgnoredMethodsFacetFactory::new(0)
            .process_type(&fixture.ctx(), &mut set, &mut spec, PartialMetamodel::new())
            .expect("process");
        assert_eq!(set.removed().len(), 1);
        assert_eq!(set.removed()[0].method_name(), "Helper");
    }

    #[test]
    fn test_event_accessors_are_removed() {
        let fixture = Fixture::new(
            TypeInfo::class("Shop.Customer")
                .event("Changed")
                .method(MethodInfo::new("add_Changed", TypeRef::Void))
                .method(MethodInfo::new("remove_Changed", TypeRef::Void))
                .method(MethodInfo::new("add_Other", TypeRef::Void)),
        );
        let mut set = MethodSet::new(fixture.methods.clone());
        let mut spec = Specification::object(&fixture.type_info);
        RemoveEventHandlerMethodsFacetFactory::new(0)
            .process_type(&fixture.ctx(), &mut set, &mut spec, PartialMetamodel::new())
            .expect("process");
        let removed: Vec<&str> = set.removed().iter().map(|m| m.method_name()).collect();
        assert_eq!(removed, vec!["add_Changed", "remove_Changed"]);
    }

    #[test]
    fn test_unsupported_signatures_are_filtered() {
        let fixture = Fixture::new(TypeInfo::class("Shop.Customer"));
        let factory = UnsupportedParameterTypesFacetFactory::new(0);
        let ctx = fixture.ctx();

        let generic = MethodInfo::new("Find", TypeRef::Void).generic();
        let out = MethodInfo::new("TryGet", TypeRef::Void)
            .param_with(ParameterInfo::new("result", TypeRef::named("Shop.Product")).out());
        let unknown = MethodInfo::new("Ship", TypeRef::Void).param("to", TypeRef::named("Shop.Address"));
        let fine = MethodInfo::new("Buy", TypeRef::Void).param("what", TypeRef::named("Shop.Product"));

        assert!(factory.filters(&generic, &ctx));
        assert!(factory.filters(&out, &ctx));
        assert!(factory.filters(&unknown, &ctx));
        assert!(!factory.filters(&fine, &ctx));
    }

    #[test]
    fn test_iterator_methods_filtered_only_on_enumerables() {
        let plain = Fixture::new(TypeInfo::class("Shop.Customer"));
        let enumerable = Fixture::new(TypeInfo::class("Shop.Basket").implements("System.Collections.IEnumerable"));
        let factory = IteratorFilteringFacetFactory::new(0);
        let method = MethodInfo::new("GetEnumerator", TypeRef::Void);
        assert!(!factory.filters(&method, &plain.ctx()));
        assert!(factory.filters(&method, &enumerable.ctx()));
    }
}
