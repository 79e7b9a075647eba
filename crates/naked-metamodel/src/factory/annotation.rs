//! Annotation factories as rule tables
//!
//! Every annotation factory is one `AnnotationFacetFactory` over a static
//! table of `AnnotationRule`s. Rules run in table order and the first
//! matching attribute per rule wins; a later rule producing the same facet
//! kind replaces the earlier one, which is how `[Hidden]` beats
//! `[ScaffoldColumn]` on the same member.

use crate::error::ReflectionResult;
use crate::facet::*;
use crate::metamodel::PartialMetamodel;
use crate::reflect::{
    Attribute, DataType, MethodInfo, ParameterInfo, PrimitiveType, PropertyInfo, TypeInfo, TypeRef,
    WhenTo,
};
use crate::spec::Specification;

use super::{FacetFactory, FactoryContext, FactoryMeta, FeatureType, MethodRemover};

/// The reflected element a rule is looking at
#[derive(Debug, Clone, Copy)]
pub enum Element<'a> {
    /// Object type or interface
    Type(&'a TypeInfo),
    /// Scalar property
    Property(&'a PropertyInfo),
    /// Collection property
    Collection(&'a PropertyInfo),
    /// Action method
    Action(&'a MethodInfo),
    /// Action parameter
    Parameter(&'a ParameterInfo),
}

impl<'a> Element<'a> {
    /// Annotations on the element
    pub fn attributes(&self) -> &'a [Attribute] {
        match self {
            Element::Type(t) => &t.attributes,
            Element::Property(p) | Element::Collection(p) => &p.attributes,
            Element::Action(m) => &m.attributes,
            Element::Parameter(p) => &p.attributes,
        }
    }

    /// Feature bit of the element
    pub fn feature(&self) -> FeatureType {
        match self {
            Element::Type(t) if t.is_interface() => FeatureType::INTERFACES,
            Element::Type(_) => FeatureType::OBJECTS,
            Element::Property(_) => FeatureType::PROPERTIES,
            Element::Collection(_) => FeatureType::COLLECTIONS,
            Element::Action(_) => FeatureType::ACTIONS,
            Element::Parameter(_) => FeatureType::ACTION_PARAMETERS,
        }
    }

    /// Declared value type; the return type for actions
    pub fn value_type(&self) -> Option<&'a TypeRef> {
        match self {
            Element::Type(_) => None,
            Element::Property(p) | Element::Collection(p) => Some(&p.property_type),
            Element::Action(m) => Some(&m.return_type),
            Element::Parameter(p) => Some(&p.parameter_type),
        }
    }

    /// Whether the element is, or returns, a string
    pub fn is_string(&self) -> bool {
        match self {
            Element::Type(t) => t.full_name == PrimitiveType::String.full_name(),
            _ => self
                .value_type()
                .and_then(TypeRef::as_primitive)
                .map(PrimitiveType::is_string)
                .unwrap_or(false),
        }
    }
}

/// One attribute-to-facet mapping
pub struct AnnotationRule {
    /// Rule name
    pub name: &'static str,
    /// Element kinds the rule applies to
    pub feature_types: FeatureType,
    /// Facet for an attribute, if the attribute matches
    pub build: fn(&Attribute, &Element<'_>) -> Option<Facet>,
}

/// Generic dispatcher over a rule table
pub struct AnnotationFacetFactory {
    order: usize,
    meta: &'static FactoryMeta,
    rules: &'static [AnnotationRule],
}

impl AnnotationFacetFactory {
    /// Create a factory at a position in the chain
    pub fn new(order: usize, meta: &'static FactoryMeta, rules: &'static [AnnotationRule]) -> Self {
        Self { order, meta, rules }
    }

    /// The rule table
    pub fn rules(&self) -> &'static [AnnotationRule] {
        self.rules
    }

    /// Apply every rule to an element
    pub fn apply(&self, element: Element<'_>, spec: &mut Specification) {
        let feature = element.feature();
        for rule in self.rules {
            if !rule.feature_types.intersects(feature) {
                continue;
            }
            let facet = element
                .attributes()
                .iter()
                .find_map(|attr| (rule.build)(attr, &element));
            if let Some(facet) = facet {
                if let Some(previous) = spec.add_facet(facet) {
                    log::trace!(
                        "{}: {} replaced {} on {}",
                        self.meta.name,
                        rule.name,
                        previous.kind(),
                        spec.identifier()
                    );
                }
            }
        }
    }
}

impl FacetFactory for AnnotationFacetFactory {
    fn meta(&self) -> &FactoryMeta {
        self.meta
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
        self.apply(Element::Type(ctx.type_info), spec);
        Ok(metamodel)
    }

    fn process_property(
        &self,
        _ctx: &FactoryContext<'_>,
        property: &PropertyInfo,
        _remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        let element = if property.property_type.is_collection() {
            Element::Collection(property)
        } else {
            Element::Property(property)
        };
        self.apply(element, spec);
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
        self.apply(Element::Action(method), spec);
        Ok(metamodel)
    }

    fn process_params(
        &self,
        _ctx: &FactoryContext<'_>,
        method: &MethodInfo,
        index: usize,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        if let Some(parameter) = method.parameters.get(index) {
            self.apply(Element::Parameter(parameter), spec);
        }
        Ok(metamodel)
    }
}

// ============================================================================
// Standard rule tables
// ============================================================================

macro_rules! meta {
    ($ident:ident, $name:literal, $features:expr) => {
        /// Metadata of the
        #[doc = $name]
        /// factory
        pub static $ident: FactoryMeta = FactoryMeta {
            name: $name,
            feature_types: $features,
            prefixes: &[],
        };
    };
}

const PROPS_AND_PARAMS: FeatureType = FeatureType::PROPERTIES_AND_ACTION_PARAMETERS;

meta!(DESCRIBED_AS_META, "DescribedAsAnnotation", FeatureType::EVERYTHING);
/// `[Description]`, then `[DescribedAs]`
pub static DESCRIBED_AS_RULES: &[AnnotationRule] = &[
    AnnotationRule {
        name: "Description",
        feature_types: FeatureType::EVERYTHING,
        build: |attr, _| match attr {
            Attribute::Description { value } => Some(DescribedAsFacet { value: value.clone() }.into()),
            _ => None,
        },
    },
    AnnotationRule {
        name: "DescribedAs",
        feature_types: FeatureType::EVERYTHING,
        build: |attr, _| match attr {
            Attribute::DescribedAs { value } => Some(DescribedAsFacet { value: value.clone() }.into()),
            _ => None,
        },
    },
];

meta!(DISABLED_META, "DisabledAnnotation", FeatureType::MEMBERS);
/// `[Disabled]`
pub static DISABLED_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "Disabled",
    feature_types: FeatureType::MEMBERS,
    build: |attr, _| match attr {
        Attribute::Disabled { when } => Some(DisabledFacet { when: *when }.into()),
        _ => None,
    },
}];

meta!(PASSWORD_META, "PasswordAnnotation", PROPS_AND_PARAMS);
/// `[DataType]`, and `[DataType(Password)]` as a password facet
pub static PASSWORD_RULES: &[AnnotationRule] = &[
    AnnotationRule {
        name: "DataType",
        feature_types: PROPS_AND_PARAMS,
        build: |attr, _| match attr {
            Attribute::DataType { data_type } => Some(DataTypeFacet { data_type: *data_type }.into()),
            _ => None,
        },
    },
    AnnotationRule {
        name: "Password",
        feature_types: PROPS_AND_PARAMS,
        build: |attr, _| match attr {
            Attribute::DataType {
                data_type: DataType::Password,
            } => Some(PasswordFacet.into()),
            _ => None,
        },
    },
];

meta!(EXECUTED_META, "ExecutedAnnotation", FeatureType::ACTIONS);
/// `[Executed]`
pub static EXECUTED_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "Executed",
    feature_types: FeatureType::ACTIONS,
    build: |attr, _| match attr {
        Attribute::Executed { location } => Some(ExecutedFacet { location: *location }.into()),
        _ => None,
    },
}];

meta!(POTENCY_META, "PotencyAnnotation", FeatureType::ACTIONS);
/// `[Idempotent]`, then `[QueryOnly]`
pub static POTENCY_RULES: &[AnnotationRule] = &[
    AnnotationRule {
        name: "Idempotent",
        feature_types: FeatureType::ACTIONS,
        build: |attr, _| match attr {
            Attribute::Idempotent => Some(PotencyFacet::Idempotent.into()),
            _ => None,
        },
    },
    AnnotationRule {
        name: "QueryOnly",
        feature_types: FeatureType::ACTIONS,
        build: |attr, _| match attr {
            Attribute::QueryOnly => Some(PotencyFacet::QueryOnly.into()),
            _ => None,
        },
    },
];

meta!(PAGE_SIZE_META, "PageSizeAnnotation", FeatureType::ACTIONS);
/// `[PageSize(n)]`
pub static PAGE_SIZE_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "PageSize",
    feature_types: FeatureType::ACTIONS,
    build: |attr, _| match attr {
        Attribute::PageSize { value } => Some(
            PageSizeFacet {
                value: *value,
                origin: PageSizeOrigin::Annotation,
            }
            .into(),
        ),
        _ => None,
    },
}];

meta!(HIDDEN_META, "HiddenAnnotation", FeatureType::MEMBERS);
/// `[ScaffoldColumn]`, then `[Hidden]` so that Hidden wins
pub static HIDDEN_RULES: &[AnnotationRule] = &[
    AnnotationRule {
        name: "ScaffoldColumn",
        feature_types: FeatureType::MEMBERS,
        build: |attr, _| match attr {
            Attribute::ScaffoldColumn { scaffold } => Some(
                HiddenFacet {
                    when: if *scaffold { WhenTo::Never } else { WhenTo::Always },
                }
                .into(),
            ),
            _ => None,
        },
    },
    AnnotationRule {
        name: "Hidden",
        feature_types: FeatureType::MEMBERS,
        build: |attr, _| match attr {
            Attribute::Hidden { when } => Some(HiddenFacet { when: *when }.into()),
            _ => None,
        },
    },
];

meta!(AUTHORIZE_META, "AuthorizeAnnotation", FeatureType::MEMBERS);
/// `[Authorize(Roles, Users)]`
pub static AUTHORIZE_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "Authorize",
    feature_types: FeatureType::MEMBERS,
    build: |attr, _| match attr {
        Attribute::Authorize { roles, users } => Some(
            AuthorizationFacet {
                roles: roles.clone(),
                users: users.clone(),
            }
            .into(),
        ),
        _ => None,
    },
}];

meta!(IMMUTABLE_META, "ImmutableAnnotation", FeatureType::OBJECTS);
/// `[Immutable]`
pub static IMMUTABLE_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "Immutable",
    feature_types: FeatureType::OBJECTS,
    build: |attr, _| match attr {
        Attribute::Immutable { when } => Some(ImmutableFacet { when: *when }.into()),
        _ => None,
    },
}];

meta!(MAX_LENGTH_META, "MaxLengthAnnotation", PROPS_AND_PARAMS);
/// `[StringLength]`, then `[MaxLength]`
pub static MAX_LENGTH_RULES: &[AnnotationRule] = &[
    AnnotationRule {
        name: "StringLength",
        feature_types: PROPS_AND_PARAMS,
        build: |attr, _| match attr {
            Attribute::StringLength { maximum } => Some(MaxLengthFacet { value: *maximum }.into()),
            _ => None,
        },
    },
    AnnotationRule {
        name: "MaxLength",
        feature_types: PROPS_AND_PARAMS,
        build: |attr, _| match attr {
            Attribute::MaxLength { value } => Some(MaxLengthFacet { value: *value }.into()),
            _ => None,
        },
    },
];

meta!(RANGE_META, "RangeAnnotation", PROPS_AND_PARAMS);
/// `[Range(min, max)]`
pub static RANGE_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "Range",
    feature_types: PROPS_AND_PARAMS,
    build: |attr, _| match attr {
        Attribute::Range { min, max } => Some(RangeFacet { min: *min, max: *max }.into()),
        _ => None,
    },
}];

meta!(MEMBER_ORDER_META, "MemberOrderAnnotation", FeatureType::MEMBERS);
/// `[MemberOrder(Sequence, Name)]`; the sequence stays text
pub static MEMBER_ORDER_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "MemberOrder",
    feature_types: FeatureType::MEMBERS,
    build: |attr, _| match attr {
        Attribute::MemberOrder { sequence, name } => Some(
            MemberOrderFacet {
                sequence: sequence.clone(),
                name: name.clone(),
            }
            .into(),
        ),
        _ => None,
    },
}];

meta!(MULTI_LINE_META, "MultiLineAnnotation", PROPS_AND_PARAMS);
/// `[MultiLine]`
pub static MULTI_LINE_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "MultiLine",
    feature_types: PROPS_AND_PARAMS,
    build: |attr, _| match attr {
        Attribute::MultiLine {
            number_of_lines,
            width,
        } => Some(
            MultiLineFacet {
                number_of_lines: *number_of_lines,
                width: *width,
            }
            .into(),
        ),
        _ => None,
    },
}];

meta!(NAMED_META, "NamedAnnotation", FeatureType::EVERYTHING);
/// `[DisplayName]`, then `[Named]`
pub static NAMED_RULES: &[AnnotationRule] = &[
    AnnotationRule {
        name: "DisplayName",
        feature_types: FeatureType::EVERYTHING,
        build: |attr, _| match attr {
            Attribute::DisplayName { value } => Some(
                NamedFacet {
                    value: value.clone(),
                    inferred: false,
                }
                .into(),
            ),
            _ => None,
        },
    },
    AnnotationRule {
        name: "Named",
        feature_types: FeatureType::EVERYTHING,
        build: |attr, _| match attr {
            Attribute::Named { value } => Some(
                NamedFacet {
                    value: value.clone(),
                    inferred: false,
                }
                .into(),
            ),
            _ => None,
        },
    },
];

meta!(
    NOT_PERSISTED_META,
    "NotPersistedAnnotation",
    FeatureType::OBJECTS.union(FeatureType::PROPERTIES_AND_COLLECTIONS)
);
/// `[NotPersisted]`
pub static NOT_PERSISTED_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "NotPersisted",
    feature_types: FeatureType::OBJECTS.union(FeatureType::PROPERTIES_AND_COLLECTIONS),
    build: |attr, _| match attr {
        Attribute::NotPersisted => Some(NotPersistedFacet.into()),
        _ => None,
    },
}];

meta!(PROGRAM_PERSISTABLE_META, "ProgramPersistableOnlyAnnotation", FeatureType::OBJECTS);
/// `[ProgramPersistableOnly]`
pub static PROGRAM_PERSISTABLE_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "ProgramPersistableOnly",
    feature_types: FeatureType::OBJECTS,
    build: |attr, _| match attr {
        Attribute::ProgramPersistableOnly => Some(ProgramPersistableOnlyFacet.into()),
        _ => None,
    },
}];

meta!(OPTIONAL_META, "OptionalAnnotation", PROPS_AND_PARAMS);
/// `[Optionally]`
pub static OPTIONAL_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "Optionally",
    feature_types: PROPS_AND_PARAMS,
    build: |attr, _| match attr {
        Attribute::Optionally => Some(MandatoryFacet::Optional.into()),
        _ => None,
    },
}];

meta!(REQUIRED_META, "RequiredAnnotation", PROPS_AND_PARAMS);
/// `[Required]`
pub static REQUIRED_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "Required",
    feature_types: PROPS_AND_PARAMS,
    build: |attr, _| match attr {
        Attribute::Required => Some(MandatoryFacet::Required.into()),
        _ => None,
    },
}];

meta!(PLURAL_META, "PluralAnnotation", FeatureType::OBJECTS);
/// `[Plural]`
pub static PLURAL_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "Plural",
    feature_types: FeatureType::OBJECTS,
    build: |attr, _| match attr {
        Attribute::Plural { value } => Some(
            PluralFacet {
                value: value.clone(),
                inferred: false,
            }
            .into(),
        ),
        _ => None,
    },
}];

meta!(CONCURRENCY_META, "ConcurrencyCheckAnnotation", FeatureType::PROPERTIES);
/// `[ConcurrencyCheck]`
pub static CONCURRENCY_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "ConcurrencyCheck",
    feature_types: FeatureType::PROPERTIES,
    build: |attr, _| match attr {
        Attribute::ConcurrencyCheck => Some(ConcurrencyCheckFacet.into()),
        _ => None,
    },
}];

meta!(FINDER_ACTION_META, "FinderActionAnnotation", FeatureType::ACTIONS);
/// `[FinderAction]`
pub static FINDER_ACTION_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "FinderAction",
    feature_types: FeatureType::ACTIONS,
    build: |attr, _| match attr {
        Attribute::FinderAction { prefix } => Some(FinderActionFacet { prefix: prefix.clone() }.into()),
        _ => None,
    },
}];

const MASKABLE: FeatureType = FeatureType::OBJECTS
    .union(FeatureType::PROPERTIES)
    .union(FeatureType::ACTION_PARAMETERS);

meta!(MASK_META, "MaskAnnotation", MASKABLE);
/// `[Mask]`
pub static MASK_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "Mask",
    feature_types: MASKABLE,
    build: |attr, _| match attr {
        Attribute::Mask { value } => Some(MaskFacet { value: value.clone() }.into()),
        _ => None,
    },
}];

const REGEX_FEATURES: FeatureType = FeatureType::OBJECTS
    .union(FeatureType::PROPERTIES)
    .union(FeatureType::ACTIONS)
    .union(FeatureType::ACTION_PARAMETERS);

meta!(REGEX_META, "RegExAnnotation", REGEX_FEATURES);
/// `[RegularExpression]`, then `[RegEx]`; strings only
pub static REGEX_RULES: &[AnnotationRule] = &[
    AnnotationRule {
        name: "RegularExpression",
        feature_types: REGEX_FEATURES,
        build: |attr, element| match attr {
            Attribute::RegularExpression {
                pattern,
                error_message,
            } if element.is_string() => {
                Some(RegExFacet::new(pattern.clone(), error_message.clone(), true).into())
            }
            _ => None,
        },
    },
    AnnotationRule {
        name: "RegEx",
        feature_types: REGEX_FEATURES,
        build: |attr, element| match attr {
            Attribute::RegEx {
                validation,
                message,
                case_sensitive,
                format,
            } if element.is_string() => {
                let mut facet = RegExFacet::new(validation.clone(), message.clone(), *case_sensitive);
                facet.format = format.clone();
                Some(facet.into())
            }
            _ => None,
        },
    },
];

const TABLE_VIEW_FEATURES: FeatureType = FeatureType::ACTIONS.union(FeatureType::COLLECTIONS);

meta!(TABLE_VIEW_META, "TableViewAnnotation", TABLE_VIEW_FEATURES);
/// `[TableView]`
pub static TABLE_VIEW_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "TableView",
    feature_types: TABLE_VIEW_FEATURES,
    build: |attr, element| match attr {
        Attribute::TableView { title, columns }
            if element.value_type().map(TypeRef::is_collection).unwrap_or(false) =>
        {
            Some(
                TableViewFacet {
                    title: *title,
                    columns: columns.clone(),
                }
                .into(),
            )
        }
        _ => None,
    },
}];

const EAGERLY_FEATURES: FeatureType = FeatureType::OBJECTS.union(FeatureType::MEMBERS);

meta!(EAGERLY_META, "EagerlyAnnotation", EAGERLY_FEATURES);
/// `[Eagerly]`
pub static EAGERLY_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "Eagerly",
    feature_types: EAGERLY_FEATURES,
    build: |attr, _| match attr {
        Attribute::Eagerly { what } => Some(EagerlyFacet { what: *what }.into()),
        _ => None,
    },
}];

meta!(PRESENTATION_HINT_META, "PresentationHintAnnotation", FeatureType::EVERYTHING);
/// `[PresentationHint]`
pub static PRESENTATION_HINT_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "PresentationHint",
    feature_types: FeatureType::EVERYTHING,
    build: |attr, _| match attr {
        Attribute::PresentationHint { value } => {
            Some(PresentationHintFacet { value: value.clone() }.into())
        }
        _ => None,
    },
}];

meta!(COMPLEX_TYPE_META, "ComplexTypeAnnotation", FeatureType::OBJECTS);
/// `[ComplexType]`
pub static COMPLEX_TYPE_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "ComplexType",
    feature_types: FeatureType::OBJECTS,
    build: |attr, _| match attr {
        Attribute::ComplexType => Some(ComplexTypeFacet.into()),
        _ => None,
    },
}];

meta!(BOUNDED_META, "BoundedAnnotation", FeatureType::OBJECTS);
/// `[Bounded]`
pub static BOUNDED_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "Bounded",
    feature_types: FeatureType::OBJECTS,
    build: |attr, _| match attr {
        Attribute::Bounded => Some(BoundedFacet.into()),
        _ => None,
    },
}];

meta!(DEFAULT_VALUE_META, "DefaultValueAnnotation", PROPS_AND_PARAMS);
/// `[DefaultValue(literal)]`
pub static DEFAULT_VALUE_RULES: &[AnnotationRule] = &[AnnotationRule {
    name: "DefaultValue",
    feature_types: PROPS_AND_PARAMS,
    build: |attr, _| match attr {
        Attribute::DefaultValue { value } => Some(DefaultFacet::Value(value.clone()).into()),
        _ => None,
    },
}];
