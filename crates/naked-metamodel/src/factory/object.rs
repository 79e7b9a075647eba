//! Object-level conventions: icon, lifecycle callbacks, title, object
//! validation, view models and menus

use crate::error::{ReflectionError, ReflectionResult};
use crate::facet::{
    CallbackFacet, IconFacet, LifecycleEvent, MenuFacet, TitleFacet, ValidateObjectFacet,
    ValidateObjectMethod, ViewModelFacet,
};
use crate::metamodel::PartialMetamodel;
use crate::reflect::{Attribute, MethodInfo, TypeKind, TypeRef};
use crate::spec::Specification;

use super::naming::*;
use super::{FacetFactory, FactoryContext, FactoryMeta, FeatureType, MethodRemover, MethodState};

/// Parameter type of error callbacks
pub const EXCEPTION_TYPE: &str = "System.Exception";
/// Interface marking view models
pub const VIEW_MODEL_INTERFACE: &str = "IViewModel";

macro_rules! object_factory {
    ($ty:ident, $meta:ident, $name:literal, $doc:literal) => {
        static $meta: FactoryMeta = FactoryMeta {
            name: $name,
            feature_types: FeatureType::OBJECTS,
            prefixes: &[],
        };

        #[doc = $doc]
        pub struct $ty {
            order: usize,
        }

        impl $ty {
            /// Create the factory at a position in the chain
            pub fn new(order: usize) -> Self {
                Self { order }
            }
        }
    };
}

macro_rules! meta_and_order {
    ($meta:ident) => {
        fn meta(&self) -> &FactoryMeta {
            &$meta
        }

        fn numeric_order(&self) -> usize {
            self.order
        }
    };
}

// ============================================================================
// Icon
// ============================================================================

object_factory!(IconMethodFacetFactory, ICON_META, "IconMethod", "`IconName()` supplies the icon");

impl FacetFactory for IconMethodFacetFactory {
    meta_and_order!(ICON_META);

    fn process_type(
        &self,
        ctx: &FactoryContext<'_>,
        remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        if let Some(method) = ctx.find_method(ICON_NAME_METHOD, &[]) {
            remover.remove_method(&method.id());
            if method.return_type == TypeRef::string() {
                spec.add_facet(IconFacet { method: method.id() });
            }
        }
        Ok(metamodel)
    }
}

// ============================================================================
// Lifecycle callbacks
// ============================================================================

object_factory!(
    CallbackMethodsFacetFactory,
    CALLBACK_META,
    "CallbackMethods",
    "Lifecycle callbacks; every event gets a facet, null when the type declares none"
);

impl CallbackMethodsFacetFactory {
    fn find_callback<'a>(ctx: &FactoryContext<'a>, event: LifecycleEvent) -> Option<&'a MethodInfo> {
        if event.takes_error() {
            ctx.find_method(event.method_name(), &[TypeRef::named(EXCEPTION_TYPE)])
        } else {
            ctx.find_method(event.method_name(), &[])
        }
    }
}

impl FacetFactory for CallbackMethodsFacetFactory {
    meta_and_order!(CALLBACK_META);

    fn process_type(
        &self,
        ctx: &FactoryContext<'_>,
        remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        for event in LifecycleEvent::ALL {
            let facet = match Self::find_callback(ctx, event) {
                Some(method) => {
                    let id = method.id();
                    remover.claim(&id, MethodState::Callback);
                    CallbackFacet {
                        event,
                        method: Some(id),
                    }
                }
                None => CallbackFacet::none(event),
            };
            spec.add_facet(facet);
        }
        Ok(metamodel)
    }
}

// ============================================================================
// Title
// ============================================================================

object_factory!(
    TitleMethodFacetFactory,
    TITLE_META,
    "TitleMethod",
    "Title source: a `[Title]` property, else `Title()`, else a declared `ToString()`"
);

impl FacetFactory for TitleMethodFacetFactory {
    meta_and_order!(TITLE_META);

    fn process_type(
        &self,
        ctx: &FactoryContext<'_>,
        remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        let title_method = ctx.find_method(TITLE_METHOD, &[]);
        let to_string = ctx.find_method(TO_STRING_METHOD, &[]);
        let to_string_mask = ctx.find_method(TO_STRING_METHOD, &[TypeRef::string()]);
        for method in [title_method, to_string, to_string_mask].into_iter().flatten() {
            remover.remove_method(&method.id());
        }

        let mut titled = ctx
            .properties
            .iter()
            .filter(|p| p.attributes.contains(&Attribute::Title));
        if let Some(property) = titled.next() {
            let ignored: Vec<&str> = titled.map(|p| p.name.as_str()).collect();
            if !ignored.is_empty() {
                log::warn!(
                    "{} has several [Title] properties; using {}, ignoring {}",
                    ctx.owner(),
                    property.name,
                    ignored.join(", ")
                );
            }
            spec.add_facet(TitleFacet::ViaProperty {
                property: property.name.clone(),
                getter: property.getter_id(),
            });
            return Ok(metamodel);
        }

        if let Some(method) = title_method.filter(|m| m.return_type == TypeRef::string()) {
            spec.add_facet(TitleFacet::ViaTitleMethod { method: method.id() });
            return Ok(metamodel);
        }

        if let Some(method) = to_string {
            spec.add_facet(TitleFacet::ViaToString {
                method: method.id(),
                mask_method: to_string_mask.map(MethodInfo::id),
            });
        }
        Ok(metamodel)
    }
}

// ============================================================================
// Object validation
// ============================================================================

object_factory!(
    ValidateObjectFacetFactory,
    VALIDATE_OBJECT_META,
    "ValidateObject",
    "`Validate(...)` methods whose parameters all name properties"
);

impl ValidateObjectFacetFactory {
    fn property_names(ctx: &FactoryContext<'_>, method: &MethodInfo) -> Option<Vec<String>> {
        method
            .parameters
            .iter()
            .map(|parameter| {
                ctx.properties
                    .iter()
                    .find(|p| {
                        p.name.eq_ignore_ascii_case(&parameter.name)
                            && p.property_type == parameter.parameter_type
                    })
                    .map(|p| p.name.clone())
            })
            .collect()
    }
}

impl FacetFactory for ValidateObjectFacetFactory {
    meta_and_order!(VALIDATE_OBJECT_META);

    fn process_type(
        &self,
        ctx: &FactoryContext<'_>,
        remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        let mut checks = Vec::new();
        for method in ctx.find_methods_named(VALIDATE_PREFIX) {
            if method.arity() == 0 || method.return_type != TypeRef::string() {
                continue;
            }
            if let Some(property_names) = Self::property_names(ctx, method) {
                remover.remove_method(&method.id());
                checks.push(ValidateObjectMethod {
                    method: method.id(),
                    property_names,
                });
            }
        }
        if !checks.is_empty() {
            spec.add_facet(ValidateObjectFacet { methods: checks });
        }
        Ok(metamodel)
    }
}

// ============================================================================
// View models
// ============================================================================

object_factory!(
    ViewModelFacetFactory,
    VIEW_MODEL_META,
    "ViewModel",
    "Types implementing `IViewModel`, identified by `DeriveKeys` / `PopulateUsingKeys`"
);

impl FacetFactory for ViewModelFacetFactory {
    meta_and_order!(VIEW_MODEL_META);

    fn process_type(
        &self,
        ctx: &FactoryContext<'_>,
        remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        let is_view_model = ctx
            .type_info
            .interfaces
            .iter()
            .any(|i| i.rsplit('.').next() == Some(VIEW_MODEL_INTERFACE));
        if !is_view_model {
            return Ok(metamodel);
        }
        let keys = TypeRef::array(TypeRef::string());
        let derive = ctx.find_method(DERIVE_KEYS_METHOD, &[]);
        let populate = ctx.find_method(POPULATE_USING_KEYS_METHOD, std::slice::from_ref(&keys));
        for method in [derive, populate].into_iter().flatten() {
            remover.remove_method(&method.id());
        }
        match (derive, populate) {
            (Some(derive), Some(populate)) if derive.return_type == keys => {
                spec.add_facet(ViewModelFacet {
                    derive_keys: derive.id(),
                    populate_using_keys: populate.id(),
                });
                Ok(metamodel)
            }
            _ => Err(ReflectionError::domain(
                ctx.owner(),
                "view model must declare string[] DeriveKeys() and PopulateUsingKeys(string[])",
            )),
        }
    }
}

// ============================================================================
// Menus
// ============================================================================

object_factory!(
    MenuFacetFactory,
    MENU_META,
    "Menu",
    "Menu source: a static `Menu(IMenu)` method, else every action"
);

impl FacetFactory for MenuFacetFactory {
    meta_and_order!(MENU_META);

    fn process_type(
        &self,
        ctx: &FactoryContext<'_>,
        remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        if matches!(ctx.type_info.kind, TypeKind::Primitive | TypeKind::Enum) {
            return Ok(metamodel);
        }
        let menu_method = ctx
            .find_methods_named(MENU_METHOD)
            .into_iter()
            .find(|m| m.is_static && m.arity() == 1);
        let facet = match menu_method {
            Some(method) => {
                remover.remove_method(&method.id());
                MenuFacet::ViaMethod { method: method.id() }
            }
            None => MenuFacet::Default,
        };
        spec.add_facet(facet);
        Ok(metamodel)
    }
}
