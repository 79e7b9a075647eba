//! Element types of collections and contributed-action targets

use crate::error::ReflectionResult;
use crate::facet::{
    ContributedActionFacet, Contributee, ElementTypeFacet, TypeOfFacet, TypeOfOrigin,
};
use crate::metamodel::PartialMetamodel;
use crate::reflect::{find_attribute, Attribute, MethodInfo, PropertyInfo, TypeRef};
use crate::spec::Specification;

use super::{FacetFactory, FactoryContext, FactoryMeta, FeatureType, MethodRemover};

static TYPE_OF_META: FactoryMeta = FactoryMeta {
    name: "TypeOfAnnotation",
    feature_types: FeatureType::COLLECTIONS.union(FeatureType::ACTIONS),
    prefixes: &[],
};

/// Element type of collections and collection-returning actions
///
/// `[TypeOf]` wins over the type inferred from the array or generic argument.
pub struct TypeOfFacetFactory {
    order: usize,
}

impl TypeOfFacetFactory {
    /// Create the factory at a position in the chain
    pub fn new(order: usize) -> Self {
        Self { order }
    }

    /// Type-of facet for a collection shape and its annotations
    pub fn type_of(shape: &TypeRef, attributes: &[Attribute]) -> Option<TypeOfFacet> {
        let annotated = find_attribute(attributes, |a| match a {
            Attribute::TypeOf { type_name } => Some(type_name.clone()),
            _ => None,
        });
        if let Some(value) = annotated {
            return Some(TypeOfFacet {
                value,
                origin: TypeOfOrigin::Annotation,
            });
        }
        let element = shape.element_type()?.spec_name()?;
        let origin = if shape.is_array() {
            TypeOfOrigin::InferredFromArray
        } else {
            TypeOfOrigin::InferredFromGenerics
        };
        Some(TypeOfFacet { value: element, origin })
    }

    fn attach(
        shape: &TypeRef,
        attributes: &[Attribute],
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> PartialMetamodel {
        if !shape.is_collection() {
            return metamodel;
        }
        match Self::type_of(shape, attributes) {
            Some(facet) => {
                let element = facet.value.clone();
                spec.add_facet(facet);
                spec.add_facet(ElementTypeFacet {
                    value: element.clone(),
                });
                metamodel.with_placeholder(&element)
            }
            None => metamodel,
        }
    }
}

impl FacetFactory for TypeOfFacetFactory {
    fn meta(&self) -> &FactoryMeta {
        &TYPE_OF_META
    }

    fn numeric_order(&self) -> usize {
        self.order
    }

    fn process_property(
        &self,
        _ctx: &FactoryContext<'_>,
        property: &PropertyInfo,
        _remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        Ok(Self::attach(
            &property.property_type,
            &property.attributes,
            spec,
            metamodel,
        ))
    }

    fn process_method(
        &self,
        _ctx: &FactoryContext<'_>,
        method: &MethodInfo,
        _remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        Ok(Self::attach(
            &method.return_type,
            &method.attributes,
            spec,
            metamodel,
        ))
    }
}

static CONTRIBUTED_ACTION_META: FactoryMeta = FactoryMeta {
    name: "ContributedActionAnnotation",
    feature_types: FeatureType::ACTIONS,
    prefixes: &[],
};

/// Service actions whose parameters are marked `[ContributedAction]`
///
/// Each marked parameter names a contributee: its own type, or the element
/// type for a collection parameter. Value-typed parameters never contribute.
pub struct ContributedActionFacetFactory {
    order: usize,
}

impl ContributedActionFacetFactory {
    /// Create the factory at a position in the chain
    pub fn new(order: usize) -> Self {
        Self { order }
    }
}

impl FacetFactory for ContributedActionFacetFactory {
    fn meta(&self) -> &FactoryMeta {
        &CONTRIBUTED_ACTION_META
    }

    fn numeric_order(&self) -> usize {
        self.order
    }

    fn process_method(
        &self,
        ctx: &FactoryContext<'_>,
        method: &MethodInfo,
        _remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        let mut contributees = Vec::new();
        for parameter in &method.parameters {
            let marker = find_attribute(&parameter.attributes, |a| match a {
                Attribute::ContributedAction { sub_menu, id } => Some((sub_menu, id)),
                _ => None,
            });
            let Some((sub_menu, id)) = marker else {
                continue;
            };
            let target = match &parameter.parameter_type {
                shape if shape.is_collection() => shape.element_type(),
                other => Some(other),
            };
            let Some(target) = target.filter(|t| !ctx.is_parseable(t)) else {
                log::warn!(
                    "{}: [ContributedAction] on value parameter {} ignored",
                    method.id(),
                    parameter.name
                );
                continue;
            };
            if let Some(type_name) = target.spec_name() {
                contributees.push(Contributee {
                    type_name,
                    sub_menu: sub_menu.clone(),
                    id: id.clone(),
                });
            }
        }
        if !contributees.is_empty() {
            spec.add_facet(ContributedActionFacet { contributees });
        }
        Ok(metamodel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facet::FacetHolder;
    use crate::factory::test_support::Fixture;
    use crate::factory::MethodSet;
    use crate::reflect::{ParameterInfo, PrimitiveType, TypeInfo};

    #[test]
    fn test_annotation_beats_inference() {
        let list = TypeRef::list_of(TypeRef::named("Shop.Product"));
        let inferred = TypeOfFacetFactory::type_of(&list, &[]).expect("inferred");
        assert_eq!(inferred.origin, TypeOfOrigin::InferredFromGenerics);
        assert_eq!(inferred.value, "Shop.Product");

        let array = TypeRef::array(TypeRef::named("Shop.Product"));
        assert_eq!(
            TypeOfFacetFactory::type_of(&array, &[]).map(|f| f.origin),
            Some(TypeOfOrigin::InferredFromArray)
        );

        let annotated = TypeOfFacetFactory::type_of(
            &list,
            &[Attribute::TypeOf {
                type_name: "Shop.Special".into(),
            }],
        )
        .expect("annotated");
        assert_eq!(annotated.origin, TypeOfOrigin::Annotation);
        assert_eq!(annotated.value, "Shop.Special");
    }

    #[test]
    fn test_collection_return_adds_element_placeholder() {
        let fixture = Fixture::new(TypeInfo::class("Shop.Repository").method(MethodInfo::new(
            "AllProducts",
            TypeRef::queryable_of(TypeRef::named("Shop.Product")),
        )));
        let mut set = MethodSet::new(fixture.methods.clone());
        let method = fixture.method("AllProducts");
        let mut spec = Specification::action(method, "Shop.Repository");
        let metamodel = TypeOfFacetFactory::new(0)
            .process_method(&fixture.ctx(), method, &mut set, &mut spec, PartialMetamodel::new())
            .expect("processed");
        assert!(metamodel.contains("Shop.Product"));
        assert_eq!(
            spec.get::<ElementTypeFacet>().map(|e| e.value.as_str()),
            Some("Shop.Product")
        );
    }

    #[test]
    fn test_contributees_from_marked_parameters() {
        let fixture = Fixture::new(
            TypeInfo::class("Shop.Repository").method(
                MethodInfo::new("Discount", TypeRef::Void)
                    .param_with(
                        ParameterInfo::new("product", TypeRef::named("Shop.Product"))
                            .attribute(Attribute::ContributedAction {
                                sub_menu: Some("Pricing".into()),
                                id: None,
                            }),
                    )
                    .param_with(
                        ParameterInfo::new("percent", TypeRef::Primitive(PrimitiveType::Int32))
                            .attribute(Attribute::contributed()),
                    ),
            ),
        );
        let mut set = MethodSet::new(fixture.methods.clone());
        let method = fixture.method("Discount");
        let mut spec = Specification::action(method, "Shop.Repository");
        ContributedActionFacetFactory::new(0)
            .process_method(&fixture.ctx(), method, &mut set, &mut spec, PartialMetamodel::new())
            .expect("processed");
        let facet = spec.get::<ContributedActionFacet>().expect("contributed");
        assert_eq!(facet.contributees.len(), 1);
        let contributee = facet.contributee("Shop.Product").expect("product");
        assert_eq!(contributee.sub_menu.as_deref(), Some("Pricing"));
    }
}
