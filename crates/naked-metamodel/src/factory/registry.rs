//! The standard factory chain and the ordered set the reflector drives

use crate::error::{ReflectionError, ReflectionResult};
use crate::metamodel::PartialMetamodel;
use crate::reflect::{MethodInfo, PropertyInfo};
use crate::spec::Specification;

use super::actions::ActionMethodsFacetFactory;
use super::annotation::*;
use super::collections::CollectionFieldMethodsFacetFactory;
use super::conventions::*;
use super::filtering::*;
use super::naming::DefaultNamingFacetFactory;
use super::object::*;
use super::properties::PropertyMethodsFacetFactory;
use super::type_of::{ContributedActionFacetFactory, TypeOfFacetFactory};
use super::{FacetFactory, FactoryContext, FeatureType, MethodRemover};

/// Builds a factory at a given position
pub type FactoryConstructor = fn(usize) -> Box<dyn FacetFactory>;

macro_rules! entry {
    ($name:literal, $order:ident => $make:expr) => {{
        fn make($order: usize) -> Box<dyn FacetFactory> {
            Box::new($make)
        }
        ($name, make as FactoryConstructor)
    }};
}

/// The standard chain, in execution order
///
/// Convention factories come first; annotation factories follow the
/// conventions they override, and `DefaultNaming` follows `Named`/`Plural`.
pub fn standard_facet_factories() -> Vec<(&'static str, FactoryConstructor)> {
    vec![
        entry!("Fallback", o => FallbackFacetFactory::new(o)),
        entry!("IteratorFiltering", o => IteratorFilteringFacetFactory::new(o)),
        entry!("UnsupportedParameterTypesMethodFiltering", o => UnsupportedParameterTypesFacetFactory::new(o)),
        entry!("RemoveIgnoredMethods", o => RemoveIgnoredMethodsFacetFactory::new(o)),
        entry!("RemoveDynamicProxyMethods", o => RemoveDynamicProxyMethodsFacetFactory::new(o)),
        entry!("RemoveEventHandlerMethods", o => RemoveEventHandlerMethodsFacetFactory::new(o)),
        entry!("TypeMarker", o => TypeMarkerFacetFactory::new(o)),
        entry!("ValueType", o => ValueTypeFacetFactory::new(o)),
        entry!("Enum", o => EnumFacetFactory::new(o)),
        entry!("OptionalDefault", o => OptionalDefaultFacetFactory::new(o)),
        entry!("ActionMethods", o => ActionMethodsFacetFactory::new(o)),
        entry!("CollectionFieldMethods", o => CollectionFieldMethodsFacetFactory::new(o)),
        entry!("PropertyMethods", o => PropertyMethodsFacetFactory::new(o)),
        entry!("IconMethod", o => IconMethodFacetFactory::new(o)),
        entry!("CallbackMethods", o => CallbackMethodsFacetFactory::new(o)),
        entry!("TitleMethod", o => TitleMethodFacetFactory::new(o)),
        entry!("ValidateObject", o => ValidateObjectFacetFactory::new(o)),
        entry!("ComplexTypeAnnotation", o => AnnotationFacetFactory::new(o, &COMPLEX_TYPE_META, COMPLEX_TYPE_RULES)),
        entry!("ViewModel", o => ViewModelFacetFactory::new(o)),
        entry!("BoundedAnnotation", o => AnnotationFacetFactory::new(o, &BOUNDED_META, BOUNDED_RULES)),
        entry!("DefaultValueAnnotation", o => AnnotationFacetFactory::new(o, &DEFAULT_VALUE_META, DEFAULT_VALUE_RULES)),
        entry!("DescribedAsAnnotation", o => AnnotationFacetFactory::new(o, &DESCRIBED_AS_META, DESCRIBED_AS_RULES)),
        entry!("DisabledAnnotation", o => AnnotationFacetFactory::new(o, &DISABLED_META, DISABLED_RULES)),
        entry!("PasswordAnnotation", o => AnnotationFacetFactory::new(o, &PASSWORD_META, PASSWORD_RULES)),
        entry!("ExecutedAnnotation", o => AnnotationFacetFactory::new(o, &EXECUTED_META, EXECUTED_RULES)),
        entry!("PotencyAnnotation", o => AnnotationFacetFactory::new(o, &POTENCY_META, POTENCY_RULES)),
        entry!("PageSizeAnnotation", o => AnnotationFacetFactory::new(o, &PAGE_SIZE_META, PAGE_SIZE_RULES)),
        entry!("HiddenAnnotation", o => AnnotationFacetFactory::new(o, &HIDDEN_META, HIDDEN_RULES)),
        entry!("AuthorizeAnnotation", o => AnnotationFacetFactory::new(o, &AUTHORIZE_META, AUTHORIZE_RULES)),
        entry!("ImmutableAnnotation", o => AnnotationFacetFactory::new(o, &IMMUTABLE_META, IMMUTABLE_RULES)),
        entry!("MaxLengthAnnotation", o => AnnotationFacetFactory::new(o, &MAX_LENGTH_META, MAX_LENGTH_RULES)),
        entry!("RangeAnnotation", o => AnnotationFacetFactory::new(o, &RANGE_META, RANGE_RULES)),
        entry!("MemberOrderAnnotation", o => AnnotationFacetFactory::new(o, &MEMBER_ORDER_META, MEMBER_ORDER_RULES)),
        entry!("MultiLineAnnotation", o => AnnotationFacetFactory::new(o, &MULTI_LINE_META, MULTI_LINE_RULES)),
        entry!("NamedAnnotation", o => AnnotationFacetFactory::new(o, &NAMED_META, NAMED_RULES)),
        entry!("NotPersistedAnnotation", o => AnnotationFacetFactory::new(o, &NOT_PERSISTED_META, NOT_PERSISTED_RULES)),
        entry!("ProgramPersistableOnlyAnnotation", o => AnnotationFacetFactory::new(o, &PROGRAM_PERSISTABLE_META, PROGRAM_PERSISTABLE_RULES)),
        entry!("OptionalAnnotation", o => AnnotationFacetFactory::new(o, &OPTIONAL_META, OPTIONAL_RULES)),
        entry!("RequiredAnnotation", o => AnnotationFacetFactory::new(o, &REQUIRED_META, REQUIRED_RULES)),
        entry!("PluralAnnotation", o => AnnotationFacetFactory::new(o, &PLURAL_META, PLURAL_RULES)),
        entry!("DefaultNaming", o => DefaultNamingFacetFactory::new(o)),
        entry!("ConcurrencyCheckAnnotation", o => AnnotationFacetFactory::new(o, &CONCURRENCY_META, CONCURRENCY_RULES)),
        entry!("ContributedActionAnnotation", o => ContributedActionFacetFactory::new(o)),
        entry!("FinderActionAnnotation", o => AnnotationFacetFactory::new(o, &FINDER_ACTION_META, FINDER_ACTION_RULES)),
        entry!("MaskAnnotation", o => AnnotationFacetFactory::new(o, &MASK_META, MASK_RULES)),
        entry!("RegExAnnotation", o => AnnotationFacetFactory::new(o, &REGEX_META, REGEX_RULES)),
        entry!("TypeOfAnnotation", o => TypeOfFacetFactory::new(o)),
        entry!("TableViewAnnotation", o => AnnotationFacetFactory::new(o, &TABLE_VIEW_META, TABLE_VIEW_RULES)),
        entry!("EagerlyAnnotation", o => AnnotationFacetFactory::new(o, &EAGERLY_META, EAGERLY_RULES)),
        entry!("PresentationHintAnnotation", o => AnnotationFacetFactory::new(o, &PRESENTATION_HINT_META, PRESENTATION_HINT_RULES)),
        entry!("Menu", o => MenuFacetFactory::new(o)),
    ]
}

/// Position of a standard factory by name
pub fn standard_index_of(name: &str) -> Option<usize> {
    standard_facet_factories()
        .iter()
        .position(|(factory, _)| *factory == name)
}

/// Instantiate the standard chain
pub fn instantiate_standard() -> Vec<Box<dyn FacetFactory>> {
    standard_facet_factories()
        .into_iter()
        .enumerate()
        .map(|(order, (_, make))| make(order))
        .collect()
}

/// Swap a standard factory for a replacement that takes over its position
pub fn register_replacement(
    factories: &mut Vec<Box<dyn FacetFactory>>,
    replaces: &str,
    make: impl FnOnce(usize) -> Box<dyn FacetFactory>,
) -> ReflectionResult<()> {
    let order = standard_index_of(replaces).ok_or_else(|| {
        ReflectionError::initialisation(format!("no standard facet factory named {}", replaces))
    })?;
    let replacement = make(order);
    match factories.iter().position(|f| f.numeric_order() == order) {
        Some(slot) => factories[slot] = replacement,
        None => factories.push(replacement),
    }
    Ok(())
}

/// Factories sorted by order, with dispatch by feature type
pub struct FacetFactorySet {
    factories: Vec<Box<dyn FacetFactory>>,
    prefixes: Vec<&'static str>,
}

impl std::fmt::Debug for FacetFactorySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.factories.iter().map(|x| x.name()))
            .finish()
    }
}

impl Default for FacetFactorySet {
    fn default() -> Self {
        Self::new(instantiate_standard())
    }
}

impl FacetFactorySet {
    /// Order a set of factories; ties keep their given order
    pub fn new(mut factories: Vec<Box<dyn FacetFactory>>) -> Self {
        factories.sort_by_key(|f| f.numeric_order());
        let mut prefixes: Vec<&'static str> = factories
            .iter()
            .flat_map(|f| f.prefixes().iter().copied())
            .collect();
        prefixes.sort_unstable();
        prefixes.dedup();
        Self { factories, prefixes }
    }

    /// The standard chain
    pub fn standard() -> Self {
        Self::default()
    }

    /// Factories in execution order
    pub fn factories(&self) -> &[Box<dyn FacetFactory>] {
        &self.factories
    }

    /// Names in execution order
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.iter().map(|f| f.name()).collect()
    }

    /// Number of factories
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Whether a method name starts with a prefix some factory recognises
    pub fn recognises(&self, method_name: &str) -> bool {
        self.prefixes.iter().any(|p| method_name.starts_with(p))
    }

    /// Whether any factory filters a method out of the actions
    pub fn filters(&self, method: &MethodInfo, ctx: &FactoryContext<'_>) -> bool {
        self.factories.iter().any(|f| f.filters(method, ctx))
    }

    fn applying(&self, feature: FeatureType) -> impl Iterator<Item = &Box<dyn FacetFactory>> {
        self.factories
            .iter()
            .filter(move |f| f.feature_types().intersects(feature))
    }

    /// Run the type hooks; a factory failing with a domain error is skipped
    pub fn process_type(
        &self,
        ctx: &FactoryContext<'_>,
        remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        mut metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        let feature = if ctx.type_info.is_interface() {
            FeatureType::INTERFACES
        } else {
            FeatureType::OBJECTS
        };
        for factory in self.applying(feature) {
            let saved = metamodel.clone();
            metamodel = match factory.process_type(ctx, remover, spec, metamodel) {
                Ok(next) => next,
                Err(e) if !e.is_fatal() => {
                    log::warn!("{}: {} ({} skipped)", ctx.owner(), e, factory.name());
                    saved
                }
                Err(e) => return Err(e),
            };
        }
        Ok(metamodel)
    }

    /// Run the property or collection hooks
    pub fn process_property(
        &self,
        ctx: &FactoryContext<'_>,
        property: &PropertyInfo,
        remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        mut metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        let feature = if property.property_type.is_collection() {
            FeatureType::COLLECTIONS
        } else {
            FeatureType::PROPERTIES
        };
        for factory in self.applying(feature) {
            metamodel = factory.process_property(ctx, property, remover, spec, metamodel)?;
        }
        Ok(metamodel)
    }

    /// Run the action hooks, then the parameter hooks for every parameter
    pub fn process_action(
        &self,
        ctx: &FactoryContext<'_>,
        method: &MethodInfo,
        remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        mut metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        for factory in self.applying(FeatureType::ACTIONS) {
            metamodel = factory.process_method(ctx, method, remover, spec, metamodel)?;
        }
        for index in 0..method.arity() {
            let Some(param_spec) = spec.parameter_mut(index) else {
                continue;
            };
            for factory in self.applying(FeatureType::ACTION_PARAMETERS) {
                metamodel = factory.process_params(ctx, method, index, param_spec, metamodel)?;
            }
        }
        Ok(metamodel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::FactoryMeta;

    #[test]
    fn test_standard_chain_is_ordered_and_unique() {
        let set = FacetFactorySet::standard();
        let names = set.names();
        assert_eq!(names.len(), standard_facet_factories().len());
        let mut unique = names.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
        let orders: Vec<usize> = set.factories().iter().map(|f| f.numeric_order()).collect();
        assert!(orders.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_names_match_table() {
        let set = FacetFactorySet::standard();
        for (name, _) in standard_facet_factories() {
            assert!(set.names().contains(&name), "{} missing", name);
        }
    }

    #[test]
    fn test_recognised_prefixes() {
        let set = FacetFactorySet::standard();
        assert!(set.recognises("HideName"));
        assert!(set.recognises("Choices0PlaceOrder"));
        assert!(set.recognises("get_Name"));
        assert!(!set.recognises("PlaceOrder"));
    }

    static CUSTOM_META: FactoryMeta = FactoryMeta {
        name: "CustomTitle",
        feature_types: FeatureType::OBJECTS,
        prefixes: &[],
    };

    struct CustomTitle {
        order: usize,
    }

    impl FacetFactory for CustomTitle {
        fn meta(&self) -> &FactoryMeta {
            &CUSTOM_META
        }

        fn numeric_order(&self) -> usize {
            self.order
        }
    }

    #[test]
    fn test_replacement_inherits_position() {
        let mut factories = instantiate_standard();
        register_replacement(&mut factories, "TitleMethod", |order| Box::new(CustomTitle { order }))
            .expect("known factory");
        let set = FacetFactorySet::new(factories);
        let index = standard_index_of("TitleMethod").expect("standard");
        assert_eq!(set.names()[index], "CustomTitle");
        assert!(!set.names().contains(&"TitleMethod"));

        let mut factories = instantiate_standard();
        let err = register_replacement(&mut factories, "NoSuchFactory", |order| {
            Box::new(CustomTitle { order })
        });
        assert!(err.is_err());
    }
}
