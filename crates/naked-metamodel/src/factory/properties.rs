//! Property conventions and the member helpers shared with collections and actions

use crate::error::{ReflectionError, ReflectionResult};
use crate::facet::{
    AutoCompleteFacet, AutoCompleteResult, ChoicesFacet, DefaultFacet, DisableForContextFacet,
    DisabledFacet, HideForContextFacet, NotPersistedFacet, PropertyAccessorFacet,
    PropertyClearFacet, PropertySetterFacet, ValidateFacet,
};
use crate::metamodel::PartialMetamodel;
use crate::reflect::{MethodInfo, PrimitiveType, PropertyInfo, TypeRef, WhenTo};
use crate::spec::Specification;

use super::naming::*;
use super::{FacetFactory, FactoryContext, FactoryMeta, FeatureType, MethodRemover};

/// Default result count of an auto-complete method
pub const AUTO_COMPLETE_PAGE_SIZE: u32 = 50;

fn bool_type() -> TypeRef {
    TypeRef::Primitive(PrimitiveType::Bool)
}

/// Attach `HideX()` / `DisableX()` for a member and consume them
pub(crate) fn add_hide_and_disable(
    ctx: &FactoryContext<'_>,
    member: &str,
    remover: &mut dyn MethodRemover,
    spec: &mut Specification,
) {
    if let Some(method) = ctx.find_method(&format!("{}{}", HIDE_PREFIX, member), &[]) {
        if method.return_type == bool_type() {
            spec.add_facet(HideForContextFacet { method: method.id() });
            remover.remove_method(&method.id());
        } else {
            log::warn!("{} must return bool, ignored", method.id());
        }
    }
    if let Some(method) = ctx.find_method(&format!("{}{}", DISABLE_PREFIX, member), &[]) {
        if method.return_type == TypeRef::string() {
            spec.add_facet(DisableForContextFacet { method: method.id() });
            remover.remove_method(&method.id());
        } else {
            log::warn!("{} must return string, ignored", method.id());
        }
    }
}

/// Shape of an auto-complete method's result for a member of `value_type`
pub(crate) fn auto_complete_result(
    method: &MethodInfo,
    value_type: &TypeRef,
) -> ReflectionResult<AutoCompleteResult> {
    let returns = &method.return_type;
    if returns.is_queryable() {
        return Ok(AutoCompleteResult::Queryable);
    }
    if returns.is_collection() && returns.element_type() == Some(&TypeRef::string()) {
        return Ok(AutoCompleteResult::Strings);
    }
    if returns == value_type {
        return Ok(AutoCompleteResult::Single);
    }
    Err(ReflectionError::domain(
        method.id().to_string(),
        "auto-complete method must return IQueryable, IEnumerable<string> or a single object",
    ))
}

/// Attach the auto-complete method `name(string)` if present; it is consumed even when invalid
pub(crate) fn add_auto_complete(
    ctx: &FactoryContext<'_>,
    name: &str,
    value_type: &TypeRef,
    remover: &mut dyn MethodRemover,
    spec: &mut Specification,
) -> ReflectionResult<()> {
    let Some(method) = ctx.find_method(name, &[TypeRef::string()]) else {
        return Ok(());
    };
    remover.remove_method(&method.id());
    let result = auto_complete_result(method, value_type)?;
    spec.add_facet(AutoCompleteFacet {
        method: method.id(),
        min_length: 0,
        page_size: AUTO_COMPLETE_PAGE_SIZE,
        result,
    });
    Ok(())
}

/// Attach a choices method if it returns a collection
pub(crate) fn add_choices(
    method: &MethodInfo,
    remover: &mut dyn MethodRemover,
    spec: &mut Specification,
) {
    remover.remove_method(&method.id());
    if !method.return_type.is_collection() {
        log::warn!("{} does not return a collection, ignored", method.id());
        return;
    }
    spec.add_facet(ChoicesFacet {
        method: method.id(),
        parameter_names: method.parameters.iter().map(|p| p.name.clone()).collect(),
    });
}

/// Attach `name()` as a default if it returns the member type
pub(crate) fn add_default(
    ctx: &FactoryContext<'_>,
    name: &str,
    value_type: &TypeRef,
    remover: &mut dyn MethodRemover,
    spec: &mut Specification,
) {
    if let Some(method) = ctx.find_method(name, &[]) {
        remover.remove_method(&method.id());
        if &method.return_type == value_type {
            spec.add_facet(DefaultFacet::Method(method.id()));
        } else {
            log::warn!("{} does not return {}, ignored", method.id(), value_type);
        }
    }
}

/// Attach `name(value)` as a validator if it returns string
pub(crate) fn add_validate(
    ctx: &FactoryContext<'_>,
    name: &str,
    value_type: &TypeRef,
    remover: &mut dyn MethodRemover,
    spec: &mut Specification,
) {
    if let Some(method) = ctx.find_method(name, std::slice::from_ref(value_type)) {
        if method.return_type == TypeRef::string() {
            spec.add_facet(ValidateFacet { method: method.id() });
            remover.remove_method(&method.id());
        }
    }
}

static PROPERTY_METHODS_META: FactoryMeta = FactoryMeta {
    name: "PropertyMethods",
    feature_types: FeatureType::PROPERTIES,
    prefixes: &[
        GETTER_PREFIX,
        SETTER_PREFIX,
        MODIFY_PREFIX,
        CLEAR_PREFIX,
        CHOICES_PREFIX,
        DEFAULT_PREFIX,
        VALIDATE_PREFIX,
        AUTO_COMPLETE_PREFIX,
        DISABLE_PREFIX,
        HIDE_PREFIX,
    ],
};

/// Accessors and complementary methods of scalar properties
pub struct PropertyMethodsFacetFactory {
    order: usize,
}

impl PropertyMethodsFacetFactory {
    /// Create the factory at a position in the chain
    pub fn new(order: usize) -> Self {
        Self { order }
    }
}

impl FacetFactory for PropertyMethodsFacetFactory {
    fn meta(&self) -> &FactoryMeta {
        &PROPERTY_METHODS_META
    }

    fn numeric_order(&self) -> usize {
        self.order
    }

    fn process_property(
        &self,
        ctx: &FactoryContext<'_>,
        property: &PropertyInfo,
        remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        let name = property.name.as_str();
        let value_type = &property.property_type;

        spec.add_facet(PropertyAccessorFacet {
            property: name.to_string(),
            getter: property.getter_id(),
        });

        let modify = ctx.find_method(
            &format!("{}{}", MODIFY_PREFIX, name),
            std::slice::from_ref(value_type),
        );
        if let Some(modify) = modify {
            remover.remove_method(&modify.id());
            spec.add_facet(PropertySetterFacet {
                method: modify.id(),
                via_modify: true,
            });
        } else if property.has_setter {
            spec.add_facet(PropertySetterFacet {
                method: property.setter_id(),
                via_modify: false,
            });
        } else {
            spec.add_facet(DisabledFacet { when: WhenTo::Always });
            spec.add_facet(NotPersistedFacet);
        }

        if let Some(clear) = ctx.find_method(&format!("{}{}", CLEAR_PREFIX, name), &[]) {
            remover.remove_method(&clear.id());
            spec.add_facet(PropertyClearFacet { method: clear.id() });
        }

        if let Some(choices) = ctx
            .find_methods_named(&format!("{}{}", CHOICES_PREFIX, name))
            .into_iter()
            .next()
        {
            add_choices(choices, remover, spec);
        }

        add_default(ctx, &format!("{}{}", DEFAULT_PREFIX, name), value_type, remover, spec);
        add_validate(ctx, &format!("{}{}", VALIDATE_PREFIX, name), value_type, remover, spec);
        add_hide_and_disable(ctx, name, remover, spec);
        add_auto_complete(
            ctx,
            &format!("{}{}", AUTO_COMPLETE_PREFIX, name),
            value_type,
            remover,
            spec,
        )?;

        Ok(metamodel)
    }
}
