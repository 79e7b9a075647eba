//! Integration tests for facet inference and annotation overrides
//!
//! Each test reflects a small domain model with the standard chain and
//! inspects the facets on the resulting specifications.

use std::sync::Arc;

use naked_metamodel::facet::{
    HiddenFacet, MandatoryFacet, MemberOrderFacet, PageSizeFacet, PageSizeOrigin, TypeOfFacet,
    TypeOfOrigin,
};
use naked_metamodel::reflect::{Attribute, ParameterInfo, PrimitiveType, WhenTo};
use naked_metamodel::{
    AssemblyInfo, FacetHolder, Metamodel, MethodInfo, PropertyInfo, Reflect, Reflector,
    ReflectorConfig, Specification, TypeInfo, TypeRef,
};

fn reflect(types: Vec<TypeInfo>) -> Metamodel {
    let mut assembly = AssemblyInfo::new("Shop");
    for t in types {
        assembly = assembly.with_type(t);
    }
    Reflector::standard(ReflectorConfig::default().with_namespace("Shop"))
        .reflect(&[assembly])
        .expect("model reflects")
}

fn customer() -> TypeInfo {
    TypeInfo::class("Shop.Customer").property(PropertyInfo::new("Name", TypeRef::string()))
}

fn field(metamodel: &Metamodel, owner: &str, name: &str) -> Arc<Specification> {
    let spec = metamodel.specification(owner).expect("owner reflected");
    spec.field(name).cloned().expect("field reflected")
}

fn action(metamodel: &Metamodel, owner: &str, name: &str) -> Arc<Specification> {
    let spec = metamodel.specification(owner).expect("owner reflected");
    spec.action_named(name).cloned().expect("action reflected")
}

#[test]
fn test_hidden_priority_over_scaffold_annotation() {
    let metamodel = reflect(vec![TypeInfo::class("Shop.Customer")
        .property(
            PropertyInfo::new("Secret", TypeRef::string())
                .attribute(Attribute::hidden())
                .attribute(Attribute::ScaffoldColumn { scaffold: true }),
        )
        .property(
            PropertyInfo::new("Notes", TypeRef::string())
                .attribute(Attribute::ScaffoldColumn { scaffold: true })
                .attribute(Attribute::Hidden { when: WhenTo::Always }),
        )
        .property(
            PropertyInfo::new("Internal", TypeRef::string())
                .attribute(Attribute::ScaffoldColumn { scaffold: false }),
        )]);

    for name in ["Secret", "Notes", "Internal"] {
        let hidden = field(&metamodel, "Shop.Customer", name);
        assert_eq!(
            hidden.get::<HiddenFacet>().map(|h| h.when),
            Some(WhenTo::Always),
            "{} should be always hidden",
            name
        );
    }
}

#[test]
fn test_page_size_annotation_and_default() {
    let all_customers = || {
        MethodInfo::new("AllCustomers", TypeRef::queryable_of(TypeRef::named("Shop.Customer")))
    };
    let metamodel = reflect(vec![
        customer(),
        TypeInfo::class("Shop.Repository")
            .method(all_customers().attribute(Attribute::PageSize { value: 7 })),
        TypeInfo::class("Shop.Archive").method(all_customers()),
    ]);

    let annotated = action(&metamodel, "Shop.Repository", "AllCustomers");
    let page_size = annotated.get::<PageSizeFacet>().expect("page size");
    assert_eq!(page_size.value, 7);
    assert_eq!(page_size.origin, PageSizeOrigin::Annotation);

    let defaulted = action(&metamodel, "Shop.Archive", "AllCustomers");
    let page_size = defaulted.get::<PageSizeFacet>().expect("page size");
    assert_eq!(page_size.value, 20);
    assert_eq!(page_size.origin, PageSizeOrigin::Default);
}

#[test]
fn test_non_queryable_actions_get_no_default_page_size() {
    let metamodel = reflect(vec![
        customer(),
        TypeInfo::class("Shop.Repository").method(MethodInfo::new(
            "Recent",
            TypeRef::list_of(TypeRef::named("Shop.Customer")),
        )),
    ]);
    assert!(action(&metamodel, "Shop.Repository", "Recent")
        .get::<PageSizeFacet>()
        .is_none());
}

#[test]
fn test_member_order_sequence_is_kept_as_text() {
    let metamodel = reflect(vec![
        customer(),
        TypeInfo::class("Shop.Order")
            .property(
                PropertyInfo::new("Lines", TypeRef::list_of(TypeRef::named("Shop.Customer")))
                    .attribute(Attribute::member_order("2")),
            )
            .property(
                PropertyInfo::new("Reference", TypeRef::string())
                    .attribute(Attribute::member_order("1.10")),
            )
            .property(
                PropertyInfo::new("Placed", TypeRef::Primitive(PrimitiveType::DateTime))
                    .attribute(Attribute::member_order("1.9")),
            ),
    ]);

    let lines = field(&metamodel, "Shop.Order", "Lines");
    assert_eq!(
        lines.get::<MemberOrderFacet>().map(|o| o.sequence.as_str()),
        Some("2")
    );
    let order = metamodel.specification("Shop.Order").expect("order");
    let names: Vec<&str> = order.fields().iter().map(|f| f.member_name()).collect();
    assert_eq!(names, vec!["Placed", "Reference", "Lines"]);
}

#[test]
fn test_mandatory_defaults_by_type() {
    let metamodel = reflect(vec![
        customer(),
        TypeInfo::enumeration("Shop.Status", &["Open", "Closed"]),
        TypeInfo::class("Shop.Order")
            .property(PropertyInfo::new("Quantity", TypeRef::Primitive(PrimitiveType::Int32)))
            .property(PropertyInfo::new("Status", TypeRef::named("Shop.Status")))
            .property(PropertyInfo::new("Comment", TypeRef::string()))
            .property(PropertyInfo::new("Buyer", TypeRef::named("Shop.Customer")))
            .property(PropertyInfo::new(
                "Discount",
                TypeRef::generic("Nullable", vec![TypeRef::Primitive(PrimitiveType::Decimal)]),
            ))
            .property(
                PropertyInfo::new("Code", TypeRef::string()).attribute(Attribute::Required),
            )
            .property(
                PropertyInfo::new("Count", TypeRef::Primitive(PrimitiveType::Int16))
                    .attribute(Attribute::Optionally),
            ),
    ]);

    let expected = [
        ("Quantity", MandatoryFacet::MandatoryDefault),
        ("Status", MandatoryFacet::MandatoryDefault),
        ("Comment", MandatoryFacet::OptionalDefault),
        ("Buyer", MandatoryFacet::OptionalDefault),
        ("Discount", MandatoryFacet::OptionalDefault),
        ("Code", MandatoryFacet::Required),
        ("Count", MandatoryFacet::Optional),
    ];
    for (name, facet) in expected {
        let spec = field(&metamodel, "Shop.Order", name);
        assert_eq!(spec.get::<MandatoryFacet>().copied(), Some(facet), "{}", name);
    }
}

#[test]
fn test_mandatory_defaults_on_parameters() {
    let metamodel = reflect(vec![
        customer(),
        TypeInfo::class("Shop.Order").method(
            MethodInfo::new("Amend", TypeRef::Void)
                .param("quantity", TypeRef::Primitive(PrimitiveType::Int32))
                .param("buyer", TypeRef::named("Shop.Customer"))
                .param_with(
                    ParameterInfo::new("note", TypeRef::string()).attribute(Attribute::Required),
                ),
        ),
    ]);
    let amend = action(&metamodel, "Shop.Order", "Amend");
    let facets: Vec<Option<MandatoryFacet>> = amend
        .parameters()
        .iter()
        .map(|p| p.get::<MandatoryFacet>().copied())
        .collect();
    assert_eq!(
        facets,
        vec![
            Some(MandatoryFacet::MandatoryDefault),
            Some(MandatoryFacet::OptionalDefault),
            Some(MandatoryFacet::Required),
        ]
    );
}

#[test]
fn test_type_of_inference() {
    let metamodel = reflect(vec![
        customer(),
        TypeInfo::class("Shop.Special"),
        TypeInfo::class("Shop.Repository")
            .method(MethodInfo::new(
                "AsArray",
                TypeRef::array(TypeRef::named("Shop.Customer")),
            ))
            .method(MethodInfo::new(
                "AsList",
                TypeRef::list_of(TypeRef::named("Shop.Customer")),
            ))
            .method(
                MethodInfo::new("Annotated", TypeRef::array(TypeRef::named("Shop.Customer")))
                    .attribute(Attribute::TypeOf {
                        type_name: "Shop.Special".into(),
                    }),
            ),
    ]);

    let expect = |name: &str, value: &str, origin: TypeOfOrigin| {
        let spec = action(&metamodel, "Shop.Repository", name);
        let facet = spec.get::<TypeOfFacet>().expect("type-of facet");
        assert_eq!(facet.value, value, "{}", name);
        assert_eq!(facet.origin, origin, "{}", name);
    };
    expect("AsArray", "Shop.Customer", TypeOfOrigin::InferredFromArray);
    expect("AsList", "Shop.Customer", TypeOfOrigin::InferredFromGenerics);
    expect("Annotated", "Shop.Special", TypeOfOrigin::Annotation);
}
