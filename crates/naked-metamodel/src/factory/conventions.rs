//! Convention factories: defaults every holder gets before annotations run

use crate::error::ReflectionResult;
use crate::facet::{
    DescribedAsFacet, EnumFacet, ExecutedFacet, MandatoryFacet, PageSizeFacet, PageSizeOrigin,
    TitleFacet, TypeFacet, ValueFacet,
};
use crate::metamodel::PartialMetamodel;
use crate::reflect::{MethodInfo, PrimitiveType, PropertyInfo, TypeKind, TypeRef, Where};
use crate::spec::Specification;

use super::{FacetFactory, FactoryContext, FactoryMeta, FeatureType, MethodRemover};

// ============================================================================
// Fallback
// ============================================================================

static FALLBACK_META: FactoryMeta = FactoryMeta {
    name: "Fallback",
    feature_types: FeatureType::EVERYTHING,
    prefixes: &[],
};

/// Baseline facets so every holder answers the common questions
pub struct FallbackFacetFactory {
    order: usize,
}

impl FallbackFacetFactory {
    /// Create the factory at a position in the chain
    pub fn new(order: usize) -> Self {
        Self { order }
    }
}

impl FacetFactory for FallbackFacetFactory {
    fn meta(&self) -> &FactoryMeta {
        &FALLBACK_META
    }

    fn numeric_order(&self) -> usize {
        self.order
    }

    fn process_type(
        &self,
        _ctx: &FactoryContext<'_>,
        _remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        spec.facets_mut().add_if_absent(DescribedAsFacet::default());
        spec.facets_mut().add_if_absent(TitleFacet::None);
        Ok(metamodel)
    }

    fn process_property(
        &self,
        _ctx: &FactoryContext<'_>,
        _property: &PropertyInfo,
        _remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        spec.facets_mut().add_if_absent(DescribedAsFacet::default());
        Ok(metamodel)
    }

    fn process_method(
        &self,
        _ctx: &FactoryContext<'_>,
        method: &MethodInfo,
        _remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        spec.facets_mut().add_if_absent(DescribedAsFacet::default());
        spec.facets_mut().add_if_absent(ExecutedFacet {
            location: Where::Default,
        });
        if method.return_type.is_queryable() {
            spec.facets_mut().add_if_absent(PageSizeFacet {
                value: PageSizeFacet::DEFAULT,
                origin: PageSizeOrigin::Default,
            });
        }
        Ok(metamodel)
    }

    fn process_params(
        &self,
        _ctx: &FactoryContext<'_>,
        _method: &MethodInfo,
        _index: usize,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        spec.facets_mut().add_if_absent(DescribedAsFacet::default());
        Ok(metamodel)
    }
}

// ============================================================================
// Type markers
// ============================================================================

static TYPE_MARKER_META: FactoryMeta = FactoryMeta {
    name: "TypeMarker",
    feature_types: FeatureType::OBJECTS_AND_INTERFACES,
    prefixes: &[],
};

/// Records kind and modifiers of the type
pub struct TypeMarkerFacetFactory {
    order: usize,
}

impl TypeMarkerFacetFactory {
    /// Create the factory at a position in the chain
    pub fn new(order: usize) -> Self {
        Self { order }
    }
}

impl FacetFactory for TypeMarkerFacetFactory {
    fn meta(&self) -> &FactoryMeta {
        &TYPE_MARKER_META
    }

    fn numeric_order(&self) -> usize {
        self.order
    }

    fn process_type(
        &self,
        ctx: &FactoryContext<'_>,
        _remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        let t = ctx.type_info;
        spec.add_facet(TypeFacet {
            kind: t.kind,
            is_abstract: t.is_abstract,
            is_sealed: t.is_sealed,
            is_static: t.is_static,
        });
        Ok(metamodel)
    }
}

// ============================================================================
// Value types
// ============================================================================

static VALUE_TYPE_META: FactoryMeta = FactoryMeta {
    name: "ValueType",
    feature_types: FeatureType::OBJECTS,
    prefixes: &[],
};

/// Marks built-in value types parseable
pub struct ValueTypeFacetFactory {
    order: usize,
}

impl ValueTypeFacetFactory {
    /// Create the factory at a position in the chain
    pub fn new(order: usize) -> Self {
        Self { order }
    }
}

impl FacetFactory for ValueTypeFacetFactory {
    fn meta(&self) -> &FactoryMeta {
        &VALUE_TYPE_META
    }

    fn numeric_order(&self) -> usize {
        self.order
    }

    fn process_type(
        &self,
        ctx: &FactoryContext<'_>,
        _remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        if ctx.type_info.kind == TypeKind::Primitive {
            spec.add_facet(ValueFacet {
                primitive: PrimitiveType::from_full_name(ctx.owner()),
            });
        }
        Ok(metamodel)
    }
}

// ============================================================================
// Enums
// ============================================================================

static ENUM_META: FactoryMeta = FactoryMeta {
    name: "Enum",
    feature_types: FeatureType::OBJECTS
        .union(FeatureType::PROPERTIES)
        .union(FeatureType::ACTION_PARAMETERS),
    prefixes: &[],
};

/// Enumeration types and enum-typed properties and parameters
pub struct EnumFacetFactory {
    order: usize,
}

impl EnumFacetFactory {
    /// Create the factory at a position in the chain
    pub fn new(order: usize) -> Self {
        Self { order }
    }

    fn enum_facet(ctx: &FactoryContext<'_>, type_ref: &TypeRef) -> Option<EnumFacet> {
        let name = type_ref.spec_name()?;
        let info = ctx.catalog.get(&name)?;
        (info.kind == TypeKind::Enum).then(|| EnumFacet {
            type_name: info.full_name.clone(),
            values: info.enum_values.clone(),
        })
    }
}

impl FacetFactory for EnumFacetFactory {
    fn meta(&self) -> &FactoryMeta {
        &ENUM_META
    }

    fn numeric_order(&self) -> usize {
        self.order
    }

    fn process_type(
        &self,
        ctx: &FactoryContext<'_>,
        _remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        if ctx.type_info.kind == TypeKind::Enum {
            spec.add_facet(EnumFacet {
                type_name: ctx.owner().to_string(),
                values: ctx.type_info.enum_values.clone(),
            });
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
        if let Some(facet) = Self::enum_facet(ctx, &property.property_type) {
            spec.add_facet(facet);
        }
        Ok(metamodel)
    }

    fn process_params(
        &self,
        ctx: &FactoryContext<'_>,
        method: &MethodInfo,
        index: usize,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        let facet = method
            .parameters
            .get(index)
            .and_then(|p| Self::enum_facet(ctx, &p.parameter_type));
        if let Some(facet) = facet {
            spec.add_facet(facet);
        }
        Ok(metamodel)
    }
}

// ============================================================================
// Mandatory by default
// ============================================================================

static OPTIONAL_DEFAULT_META: FactoryMeta = FactoryMeta {
    name: "OptionalDefault",
    feature_types: FeatureType::PROPERTIES_AND_ACTION_PARAMETERS,
    prefixes: &[],
};

/// Default mandatoriness: values are required, references and strings are not
pub struct OptionalDefaultFacetFactory {
    order: usize,
}

impl OptionalDefaultFacetFactory {
    /// Create the factory at a position in the chain
    pub fn new(order: usize) -> Self {
        Self { order }
    }

    /// Default for a declared type
    pub fn default_for(ctx: &FactoryContext<'_>, type_ref: &TypeRef) -> MandatoryFacet {
        let is_value = match type_ref {
            TypeRef::Primitive(p) => !p.is_string(),
            // Nullable<T> and friends
            TypeRef::Generic { .. } => false,
            TypeRef::Named(_) => ctx.is_parseable(type_ref),
            _ => false,
        };
        if is_value {
            MandatoryFacet::MandatoryDefault
        } else {
            MandatoryFacet::OptionalDefault
        }
    }
}

impl FacetFactory for OptionalDefaultFacetFactory {
    fn meta(&self) -> &FactoryMeta {
        &OPTIONAL_DEFAULT_META
    }

    fn numeric_order(&self) -> usize {
        self.order
    }

    fn process_property(
        &self,
        ctx: &FactoryContext<'_>,
        property: &PropertyInfo,
        _remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        spec.add_facet(Self::default_for(ctx, &property.property_type));
        Ok(metamodel)
    }

    fn process_params(
        &self,
        ctx: &FactoryContext<'_>,
        method: &MethodInfo,
        index: usize,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        if let Some(parameter) = method.parameters.get(index) {
            spec.add_facet(Self::default_for(ctx, &parameter.parameter_type));
        }
        Ok(metamodel)
    }
}
