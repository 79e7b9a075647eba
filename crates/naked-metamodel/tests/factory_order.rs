//! Integration tests for the standard facet factory order
//!
//! Priority between factories is encoded by position only, so these checks
//! pin the relative order the override rules depend on.

use naked_metamodel::factory::{
    register_replacement, standard_facet_factories, standard_index_of, FacetFactory, FacetFactorySet,
    FactoryMeta, FeatureType,
};

fn index(name: &str) -> usize {
    standard_index_of(name).unwrap_or_else(|| panic!("{} is a standard factory", name))
}

#[test]
fn test_method_removal_runs_before_consumers() {
    for remover in [
        "RemoveIgnoredMethods",
        "RemoveDynamicProxyMethods",
        "RemoveEventHandlerMethods",
        "IteratorFiltering",
        "UnsupportedParameterTypesMethodFiltering",
    ] {
        assert!(index(remover) < index("ActionMethods"), "{} runs too late", remover);
        assert!(index(remover) < index("PropertyMethods"), "{} runs too late", remover);
    }
}

#[test]
fn test_annotations_run_after_conventions() {
    assert!(index("PropertyMethods") < index("DisabledAnnotation"));
    assert!(index("PropertyMethods") < index("HiddenAnnotation"));
    assert!(index("OptionalDefault") < index("OptionalAnnotation"));
    assert!(index("OptionalDefault") < index("RequiredAnnotation"));
    assert!(index("Fallback") < index("PageSizeAnnotation"));
    assert!(index("Fallback") < index("DescribedAsAnnotation"));
    assert!(index("NamedAnnotation") < index("DefaultNaming"));
    assert!(index("PluralAnnotation") < index("DefaultNaming"));
}

#[test]
fn test_standard_set_runs_in_table_order() {
    let set = FacetFactorySet::standard();
    let table: Vec<&str> = standard_facet_factories().iter().map(|(n, _)| *n).collect();
    assert_eq!(set.names(), table);
    assert_eq!(set.len(), table.len());
    for (position, factory) in set.factories().iter().enumerate() {
        assert_eq!(factory.numeric_order(), position);
    }
}

#[test]
fn test_recognised_prefixes_cover_companion_methods() {
    let set = FacetFactorySet::standard();
    for name in [
        "ValidatePlaceOrder",
        "DisableName",
        "HideName",
        "Choices0PlaceOrder",
        "Default1PlaceOrder",
        "AutoCompleteProduct",
        "ModifyName",
        "ClearName",
        "AddToOrders",
        "RemoveFromOrders",
    ] {
        assert!(set.recognises(name), "{} should be recognised", name);
    }
    assert!(!set.recognises("PlaceOrder"));
}

static AUDIT_META: FactoryMeta = FactoryMeta {
    name: "AuditedNaming",
    feature_types: FeatureType::EVERYTHING,
    prefixes: &[],
};

struct AuditedNamingFacetFactory {
    order: usize,
}

impl FacetFactory for AuditedNamingFacetFactory {
    fn meta(&self) -> &FactoryMeta {
        &AUDIT_META
    }

    fn numeric_order(&self) -> usize {
        self.order
    }
}

#[test]
fn test_replacement_takes_the_original_position() {
    let mut factories = naked_metamodel::factory::registry::instantiate_standard();
    register_replacement(&mut factories, "DefaultNaming", |order| {
        Box::new(AuditedNamingFacetFactory { order })
    })
    .expect("DefaultNaming is standard");
    let set = FacetFactorySet::new(factories);
    let names = set.names();
    assert!(!names.contains(&"DefaultNaming"));
    assert_eq!(
        names.iter().position(|n| *n == "AuditedNaming"),
        Some(index("DefaultNaming"))
    );

    let mut factories = naked_metamodel::factory::registry::instantiate_standard();
    let err = register_replacement(&mut factories, "NoSuchFactory", |order| {
        Box::new(AuditedNamingFacetFactory { order })
    })
    .expect_err("unknown factory");
    assert!(err.is_fatal());
}
