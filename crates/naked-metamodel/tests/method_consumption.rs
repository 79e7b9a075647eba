//! Integration tests for method consumption
//!
//! A method claimed by a factory (accessor, companion, callback, title, ...)
//! must never reappear as an action.

use naked_metamodel::facet::{
    CallbackFacet, ChoicesFacet, DisableForContextFacet, IconFacet, LifecycleEvent, TitleFacet,
};
use naked_metamodel::reflect::{Attribute, PrimitiveType};
use naked_metamodel::{
    AssemblyInfo, FacetHolder, FacetKind, Metamodel, MethodInfo, PropertyInfo, Reflect, Reflector,
    ReflectorConfig, TypeInfo, TypeRef,
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

fn action_names(metamodel: &Metamodel, owner: &str) -> Vec<String> {
    metamodel
        .specification(owner)
        .expect("owner reflected")
        .actions()
        .iter()
        .map(|a| a.member_name().to_string())
        .collect()
}

fn customer() -> TypeInfo {
    let int = TypeRef::Primitive(PrimitiveType::Int32);
    TypeInfo::class("Shop.Customer")
        .property(PropertyInfo::new("Name", TypeRef::string()).settable())
        .property(PropertyInfo::new("Rating", int.clone()).settable())
        .method(MethodInfo::new("get_Name", TypeRef::string()))
        .method(MethodInfo::new("set_Name", TypeRef::Void).param("value", TypeRef::string()))
        .method(MethodInfo::new("ChoicesRating", TypeRef::list_of(int.clone())))
        .method(MethodInfo::new("DisableName", TypeRef::string()))
        .method(MethodInfo::new("Title", TypeRef::string()))
        .method(MethodInfo::new("ToString", TypeRef::string()))
        .method(MethodInfo::new("IconName", TypeRef::string()))
        .method(MethodInfo::new("Created", TypeRef::Void))
        .method(MethodInfo::new("Persisted", TypeRef::Void))
        .method(MethodInfo::new("Recalculate", TypeRef::Void).attribute(Attribute::NakedObjectsIgnore))
        .method(MethodInfo::new("PlaceOrder", TypeRef::Void).param("quantity", int.clone()))
        .method(MethodInfo::new("ValidatePlaceOrder", TypeRef::string()).param("quantity", int.clone()))
        .method(MethodInfo::new("Default0PlaceOrder", int))
        .method(MethodInfo::new("Find", TypeRef::Void).static_method())
        .method(MethodInfo::new("Merge", TypeRef::Void).generic())
        .method(MethodInfo::new("Resolve", TypeRef::named("Billing.Unknown")))
}

#[test]
fn test_only_plain_methods_become_actions() {
    let metamodel = reflect(vec![customer()]);
    assert_eq!(action_names(&metamodel, "Shop.Customer"), vec!["PlaceOrder"]);
}

#[test]
fn test_consumed_methods_become_facets() {
    let metamodel = reflect(vec![customer()]);
    let spec = metamodel.specification("Shop.Customer").expect("customer");

    assert!(matches!(spec.get::<TitleFacet>(), Some(TitleFacet::ViaTitleMethod { .. })));
    assert!(spec.get::<IconFacet>().is_some());
    let created = spec
        .facets()
        .iter()
        .find_map(|f| match f {
            naked_metamodel::Facet::Callback(c) if c.event == LifecycleEvent::Created => Some(c.clone()),
            _ => None,
        })
        .expect("created callback");
    assert!(created.method.is_some());
    assert!(spec.contains_facet(FacetKind::Callback(LifecycleEvent::Deleted)));

    let name = spec.field("Name").expect("name");
    assert!(name.get::<DisableForContextFacet>().is_some());
    let rating = spec.field("Rating").expect("rating");
    assert!(rating.get::<ChoicesFacet>().is_some());

    let place_order = spec.action_named("PlaceOrder").expect("place order");
    assert!(place_order.contains_facet(FacetKind::ActionValidation));
    assert!(place_order.parameters()[0].contains_facet(FacetKind::Default));
}

#[test]
fn test_missing_callbacks_get_null_facets() {
    let metamodel = reflect(vec![TypeInfo::class("Shop.Plain")]);
    let spec = metamodel.specification("Shop.Plain").expect("plain");
    let callbacks: Vec<&CallbackFacet> = spec
        .facets()
        .iter()
        .filter_map(|f| match f {
            naked_metamodel::Facet::Callback(c) => Some(c),
            _ => None,
        })
        .collect();
    assert_eq!(callbacks.len(), LifecycleEvent::ALL.len());
    assert!(callbacks.iter().all(|c| c.method.is_none()));
}

#[test]
fn test_inherited_methods_are_consumed_once() {
    let metamodel = reflect(vec![
        customer(),
        TypeInfo::class("Shop.VipCustomer")
            .extends("Shop.Customer")
            .method(MethodInfo::new("Upgrade", TypeRef::Void)),
    ]);
    let mut names = action_names(&metamodel, "Shop.VipCustomer");
    names.sort();
    assert_eq!(names, vec!["PlaceOrder", "Upgrade"]);
    let base = metamodel.specification("Shop.Customer").expect("customer");
    assert_eq!(base.as_object().map(|o| o.subclasses.clone()), Some(vec!["Shop.VipCustomer".to_string()]));
}

#[test]
fn test_bad_auto_complete_skips_only_that_property() {
    let metamodel = reflect(vec![TypeInfo::class("Shop.Order")
        .property(PropertyInfo::new("Reference", TypeRef::string()))
        .property(PropertyInfo::new("Product", TypeRef::string()))
        .method(
            MethodInfo::new("AutoCompleteProduct", TypeRef::Primitive(PrimitiveType::Int32))
                .param("search", TypeRef::string()),
        )]);
    let order = metamodel.specification("Shop.Order").expect("order");
    assert!(order.field("Reference").is_some());
    assert!(order.field("Product").is_none());
    assert!(order.actions().is_empty());
}
