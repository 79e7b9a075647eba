//! Action conventions: invocation plus the `ValidateX`, `DisableX`, `HideX`
//! and per-parameter `ChoicesNX`, `DefaultNX`, `AutoCompleteNX`,
//! `ValidateNX` companions (parameter numbers are zero-based)

use crate::error::ReflectionResult;
use crate::facet::{ActionInvocationFacet, ActionValidationFacet};
use crate::metamodel::PartialMetamodel;
use crate::reflect::{MethodInfo, TypeRef};
use crate::spec::Specification;

use super::naming::*;
use super::properties::{add_auto_complete, add_choices, add_default, add_hide_and_disable, add_validate};
use super::{FacetFactory, FactoryContext, FactoryMeta, FeatureType, MethodRemover};

static ACTION_METHODS_META: FactoryMeta = FactoryMeta {
    name: "ActionMethods",
    feature_types: FeatureType::ACTIONS_AND_ACTION_PARAMETERS,
    prefixes: &[
        VALIDATE_PREFIX,
        DISABLE_PREFIX,
        HIDE_PREFIX,
        CHOICES_PREFIX,
        DEFAULT_PREFIX,
        AUTO_COMPLETE_PREFIX,
    ],
};

/// Invocation and complementary methods of actions
pub struct ActionMethodsFacetFactory {
    order: usize,
}

impl ActionMethodsFacetFactory {
    /// Create the factory at a position in the chain
    pub fn new(order: usize) -> Self {
        Self { order }
    }

    fn process_parameters(
        ctx: &FactoryContext<'_>,
        method: &MethodInfo,
        remover: &mut dyn MethodRemover,
        spec: &mut Specification,
    ) -> ReflectionResult<()> {
        let name = method.name.as_str();
        for (index, parameter) in method.parameters.iter().enumerate() {
            let Some(param_spec) = spec.parameter_mut(index) else {
                continue;
            };
            let value_type = &parameter.parameter_type;

            if let Some(choices) = ctx
                .find_methods_named(&format!("{}{}{}", CHOICES_PREFIX, index, name))
                .into_iter()
                .next()
            {
                add_choices(choices, remover, param_spec);
            }
            add_default(
                ctx,
                &format!("{}{}{}", DEFAULT_PREFIX, index, name),
                value_type,
                remover,
                param_spec,
            );
            add_validate(
                ctx,
                &format!("{}{}{}", VALIDATE_PREFIX, index, name),
                value_type,
                remover,
                param_spec,
            );
            add_auto_complete(
                ctx,
                &format!("{}{}{}", AUTO_COMPLETE_PREFIX, index, name),
                value_type,
                remover,
                param_spec,
            )?;
        }
        Ok(())
    }
}

impl FacetFactory for ActionMethodsFacetFactory {
    fn meta(&self) -> &FactoryMeta {
        &ACTION_METHODS_META
    }

    fn numeric_order(&self) -> usize {
        self.order
    }

    fn process_method(
        &self,
        ctx: &FactoryContext<'_>,
        method: &MethodInfo,
        remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        let name = method.name.as_str();
        spec.add_facet(ActionInvocationFacet {
            method: method.id(),
            on_type: ctx.owner().to_string(),
            return_type: method.return_type.clone(),
            element_type: method.return_type.element_type().and_then(TypeRef::spec_name),
            is_static: method.is_static,
        });

        let validate = ctx.find_method(&format!("{}{}", VALIDATE_PREFIX, name), &method.parameter_types());
        if let Some(validate) = validate {
            if validate.return_type == TypeRef::string() {
                remover.remove_method(&validate.id());
                spec.add_facet(ActionValidationFacet { method: validate.id() });
            }
        }
        add_hide_and_disable(ctx, name, remover, spec);
        Self::process_parameters(ctx, method, remover, spec)?;

        Ok(metamodel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facet::{AutoCompleteFacet, AutoCompleteResult, ChoicesFacet, DefaultFacet, FacetHolder, FacetKind};
    use crate::factory::test_support::Fixture;
    use crate::factory::MethodSet;
    use crate::reflect::{PrimitiveType, TypeInfo};

    fn place_order() -> MethodInfo {
        MethodInfo::new("PlaceOrder", TypeRef::Void)
            .param("product", TypeRef::named("Shop.Product"))
            .param("quantity", TypeRef::Primitive(PrimitiveType::Int32))
    }

    #[test]
    fn test_parameter_companions_attach_to_parameters() {
        let int = TypeRef::Primitive(PrimitiveType::Int32);
        let product = TypeRef::named("Shop.Product");
        let fixture = Fixture::new(
            TypeInfo::class("Shop.Customer")
                .method(place_order())
                .method(
                    MethodInfo::new("ValidatePlaceOrder", TypeRef::string())
                        .param("product", product.clone())
                        .param("quantity", int.clone()),
                )
                .method(MethodInfo::new("Default1PlaceOrder", int.clone()))
                .method(MethodInfo::new("Validate1PlaceOrder", TypeRef::string()).param("q", int))
                .method(
                    MethodInfo::new("Choices0PlaceOrder", TypeRef::list_of(product.clone()))
                        .param("category", TypeRef::string()),
                )
                .method(
                    MethodInfo::new("AutoComplete0PlaceOrder", product)
                        .param("search", TypeRef::string()),
                ),
        );
        let mut set = MethodSet::new(fixture.methods.clone());
        let method = fixture.method("PlaceOrder");
        let mut spec = Specification::action(method, "Shop.Customer");
        ActionMethodsFacetFactory::new(0)
            .process_method(&fixture.ctx(), method, &mut set, &mut spec, PartialMetamodel::new())
            .expect("processed");

        assert_eq!(set.removed().len(), 5);
        assert!(spec.contains_facet(FacetKind::ActionInvocation));
        assert!(spec.contains_facet(FacetKind::ActionValidation));

        let product_param = &spec.parameters()[0];
        let choices = product_param.get::<ChoicesFacet>().expect("choices");
        assert_eq!(choices.parameter_names, vec!["category".to_string()]);
        assert_eq!(
            product_param.get::<AutoCompleteFacet>().map(|a| a.result),
            Some(AutoCompleteResult::Single)
        );

        let quantity_param = &spec.parameters()[1];
        assert!(matches!(quantity_param.get::<DefaultFacet>(), Some(DefaultFacet::Method(_))));
        assert!(quantity_param.contains_facet(FacetKind::Validate));
    }

    #[test]
    fn test_invocation_records_element_type() {
        let fixture = Fixture::new(TypeInfo::class("Shop.Customer").method(MethodInfo::new(
            "RecentOrders",
            TypeRef::queryable_of(TypeRef::named("Shop.Product")),
        )));
        let mut set = MethodSet::new(fixture.methods.clone());
        let method = fixture.method("RecentOrders");
        let mut spec = Specification::action(method, "Shop.Customer");
        ActionMethodsFacetFactory::new(0)
            .process_method(&fixture.ctx(), method, &mut set, &mut spec, PartialMetamodel::new())
            .expect("processed");
        let invocation = spec.get::<ActionInvocationFacet>().expect("invocation");
        assert_eq!(invocation.element_type.as_deref(), Some("Shop.Product"));
        assert!(invocation.returns_queryable());
    }
}
