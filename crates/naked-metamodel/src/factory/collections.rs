//! Collection conventions

use crate::error::ReflectionResult;
use crate::facet::{CollectionFacet, PropertyAccessorFacet};
use crate::metamodel::PartialMetamodel;
use crate::reflect::PropertyInfo;
use crate::spec::Specification;

use super::naming::*;
use super::properties::add_hide_and_disable;
use super::{FacetFactory, FactoryContext, FactoryMeta, FeatureType, MethodRemover};

static COLLECTION_METHODS_META: FactoryMeta = FactoryMeta {
    name: "CollectionFieldMethods",
    feature_types: FeatureType::COLLECTIONS,
    prefixes: &[ADD_TO_PREFIX, REMOVE_FROM_PREFIX, CLEAR_PREFIX, HIDE_PREFIX, DISABLE_PREFIX],
};

/// Accessor, shape and complementary methods of collections
///
/// `AddToX`, `RemoveFromX` and `ClearX` are consumed but attach nothing;
/// collections are edited through their element actions.
pub struct CollectionFieldMethodsFacetFactory {
    order: usize,
}

impl CollectionFieldMethodsFacetFactory {
    /// Create the factory at a position in the chain
    pub fn new(order: usize) -> Self {
        Self { order }
    }
}

impl FacetFactory for CollectionFieldMethodsFacetFactory {
    fn meta(&self) -> &FactoryMeta {
        &COLLECTION_METHODS_META
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
        let shape = &property.property_type;

        spec.add_facet(PropertyAccessorFacet {
            property: name.to_string(),
            getter: property.getter_id(),
        });
        spec.add_facet(CollectionFacet {
            is_set: shape.is_set(),
            is_queryable: shape.is_queryable(),
            is_array: shape.is_array(),
        });

        for prefix in [ADD_TO_PREFIX, REMOVE_FROM_PREFIX, CLEAR_PREFIX] {
            for method in ctx.find_methods_named(&format!("{}{}", prefix, name)) {
                remover.remove_method(&method.id());
            }
        }
        add_hide_and_disable(ctx, name, remover, spec);

        Ok(metamodel)
    }
}
