//! Integration tests for action invocation
//!
//! Runs the shop model through a built framework: property and parameter
//! validation, contributed actions, service resolution and the mementos
//! attached to collection results.

mod common;

use std::sync::Arc;

use common::{framework, session};
use naked_core::{
    CollectionMemento, DomainValue, InMemoryLifecycleManager, MementoParameter, NakedError,
    ObjectAdapter, Oid, RequestScope, ScalarValue, ServiceRegistry, ServicesManager,
};

fn persisted(scope: &RequestScope, name: &str, rating: i64) -> ObjectAdapter {
    let mut adapter = scope.create_instance("Shop.Customer").expect("created");
    let spec = scope.spec_for(&adapter).expect("customer spec");
    spec.property("Name")
        .expect("Name")
        .set(&adapter, DomainValue::from(name))
        .expect("name accepted");
    spec.property("Rating")
        .expect("Rating")
        .set(&adapter, DomainValue::Int(rating))
        .expect("rating accepted");
    scope.make_persistent(&mut adapter).expect("persisted");
    adapter
}

fn names(result: &ObjectAdapter) -> Vec<String> {
    result
        .value()
        .as_collection()
        .expect("collection result")
        .iter()
        .map(|c| c.as_object().expect("customer").read().get("Name").title())
        .collect()
}

#[test]
fn test_property_violations_accumulate() {
    let (_, framework) = framework();
    let scope = framework.scope(session());
    let customer = scope.create_instance("Shop.Customer").expect("created");
    let name = scope
        .spec_for(&customer)
        .expect("spec")
        .property("Name")
        .expect("Name");

    assert!(name.is_visible(&customer).expect("visible"));
    assert!(name.is_usable(&customer).expect("usable").is_allowed());

    let consent = name
        .is_assoc_valid(&customer, &DomainValue::from("Bartholomew!!"))
        .expect("checked");
    assert_eq!(
        consent.reason(),
        Some("Too long, maximum 10 characters; No punctuation")
    );
    let err = name
        .set(&customer, DomainValue::from("Bartholomew!!"))
        .expect_err("rejected");
    assert!(matches!(err, NakedError::InvalidEntry(_)));
    assert!(customer.handle().expect("object").read().get("Name").is_null());
}

#[test]
fn test_persisting_runs_callbacks_and_assigns_identity() {
    let (store, framework) = framework();
    let scope = framework.scope(session());
    let alice = persisted(&scope, "Alice", 5);

    assert!(alice.is_persistent());
    assert_eq!(store.len(), 1);
    assert_eq!(store.commit_count(), 1);
    let handle = alice.handle().expect("object");
    assert_eq!(handle.read().get("Status"), DomainValue::from("saved"));

    let spec = scope.spec_for(&alice).expect("spec");
    assert_eq!(spec.title(&alice).expect("title"), "Customer Alice");

    let oid = alice.oid().expect("oid").clone();
    let restored = scope.restore_object(&oid).expect("restored");
    assert_eq!(restored.value(), alice.value());
}

#[test]
fn test_parameter_set_validation_accumulates() {
    let (_, framework) = framework();
    let scope = framework.scope(session());
    let repository = scope
        .object_spec("Shop.CustomerRepository")
        .expect("repository spec");
    let create = repository.action("CreateCustomer").expect("CreateCustomer");
    let service = scope
        .services()
        .service("Shop.CustomerRepository")
        .expect("service");

    let missing = [
        ObjectAdapter::for_value(DomainValue::Null, "System.String"),
        ObjectAdapter::for_value(DomainValue::Null, "System.Int32"),
    ];
    let consent = create
        .is_parameter_set_valid(Some(&service), &missing)
        .expect("checked");
    let reason = consent.reason().expect("vetoed");
    assert_eq!(reason.matches("Mandatory").count(), 2, "{}", reason);

    let taken = [
        ObjectAdapter::for_value(DomainValue::from("Alice"), "System.String"),
        ObjectAdapter::for_value(DomainValue::Int(3), "System.Int32"),
    ];
    let consent = create
        .is_parameter_set_valid(Some(&service), &taken)
        .expect("checked");
    assert_eq!(consent.reason(), Some("Name taken"));

    let taken_and_missing = [
        ObjectAdapter::for_value(DomainValue::from("Alice"), "System.String"),
        ObjectAdapter::for_value(DomainValue::Null, "System.Int32"),
    ];
    let consent = create
        .is_parameter_set_valid(Some(&service), &taken_and_missing)
        .expect("checked");
    assert_eq!(consent.reason(), Some("Rating: Mandatory; Name taken"));

    let fine = [
        ObjectAdapter::for_value(DomainValue::from("Bob"), "System.String"),
        ObjectAdapter::for_value(DomainValue::Int(3), "System.Int32"),
    ];
    assert!(create
        .is_parameter_set_valid(Some(&service), &fine)
        .expect("checked")
        .is_allowed());
    assert!(create
        .is_parameter_set_valid(Some(&service), &fine[..1])
        .expect("checked")
        .is_vetoed());

    let created = create
        .execute(Some(&service), Some(&fine[..]))
        .expect("executed")
        .expect("a customer");
    assert_eq!(created.spec_name(), "Shop.Customer");
    assert!(created.oid().is_none());
    let memento = created.memento().expect("memento identity");
    assert_eq!(memento.action_id(), "CreateCustomer");
    assert_eq!(
        memento.parameters(),
        &[
            MementoParameter::Value(ScalarValue::Str("Bob".into())),
            MementoParameter::Value(ScalarValue::Int(3)),
        ]
    );
}

#[test]
fn test_mismatched_arguments_are_invoke_errors() {
    let (store, framework) = framework();
    let scope = framework.scope(session());
    let create = scope
        .object_spec("Shop.CustomerRepository")
        .expect("spec")
        .action("CreateCustomer")
        .expect("CreateCustomer");

    let too_few = [ObjectAdapter::for_value(DomainValue::from("Bob"), "System.String")];
    let err = create
        .execute(None, Some(&too_few[..]))
        .expect_err("one argument for two parameters");
    assert!(matches!(err, NakedError::Invoke { .. }), "{:?}", err);

    let customer = scope.create_instance("Shop.Customer").expect("created");
    let wrong_kind = [
        customer,
        ObjectAdapter::for_value(DomainValue::Int(3), "System.Int32"),
    ];
    let err = create
        .execute(None, Some(&wrong_kind[..]))
        .expect_err("object for a string parameter");
    assert!(matches!(err, NakedError::Invoke { .. }), "{:?}", err);

    let remind = scope
        .object_spec("Shop.CustomerRepository")
        .expect("spec")
        .action("SendReminder")
        .expect("SendReminder");
    let scalar = [ObjectAdapter::for_value(DomainValue::from("Bob"), "System.String")];
    let err = remind
        .execute(None, Some(&scalar[..]))
        .expect_err("value for an object parameter");
    assert!(matches!(err, NakedError::Invoke { .. }), "{:?}", err);

    assert_eq!(store.commit_count(), 0);
    assert_eq!(store.abort_count(), 0);
}

#[test]
fn test_contributed_action_runs_on_its_service() {
    let (_, framework) = framework();
    let scope = framework.scope(session());
    let bob = persisted(&scope, "Bob", 2);
    let spec = scope.spec_for(&bob).expect("spec");

    let contributed: Vec<String> = spec
        .contributed_actions()
        .iter()
        .map(|a| a.id().to_string())
        .collect();
    assert_eq!(contributed, vec!["SendReminder".to_string()]);

    let remind = spec.action("SendReminder").expect("contributed action");
    assert!(remind.is_contributed_method());
    assert_eq!(remind.on_type(), "Shop.CustomerRepository");
    assert_eq!(
        remind.real_target(Some(&bob)).expect("service").spec_name(),
        "Shop.CustomerRepository"
    );
    let parameters = remind.real_parameters(Some(&bob), None);
    assert_eq!(parameters.len(), 1);
    assert_eq!(parameters[0].value(), bob.value());

    let result = remind
        .execute(Some(&bob), None)
        .expect("executed")
        .expect("a message");
    assert_eq!(result.value(), &DomainValue::from("Reminder sent to Bob"));
}

#[test]
fn test_missing_service_is_find_object_error() {
    let (_, framework) = framework();
    let metamodel = framework.metamodel();
    let lifecycle = InMemoryLifecycleManager::new(
        Arc::clone(&metamodel),
        Arc::clone(framework.delegates()),
        Arc::clone(framework.store()),
    );
    let scope = RequestScope::new(
        metamodel,
        Arc::clone(framework.delegates()),
        session(),
        Arc::new(ServiceRegistry::new()),
        Arc::new(lifecycle),
        Arc::clone(framework.store()),
    );
    let all = scope
        .object_spec("Shop.CustomerRepository")
        .expect("spec")
        .action("AllCustomers")
        .expect("AllCustomers");
    let err = all.execute(None, None).expect_err("no service instance");
    assert!(matches!(err, NakedError::FindObject(_)));
}

#[test]
fn test_collection_results_can_be_recovered() {
    let (_, framework) = framework();
    let scope = framework.scope(session());
    persisted(&scope, "Alice", 5);
    persisted(&scope, "Bob", 2);
    let cara = persisted(&scope, "Cara", 8);

    let rated_above = scope
        .object_spec("Shop.CustomerRepository")
        .expect("spec")
        .action("RatedAbove")
        .expect("RatedAbove");
    assert_eq!(rated_above.element_spec_name(), "Shop.Customer");

    let floor = [ObjectAdapter::for_value(DomainValue::Int(3), "System.Int32")];
    let result = rated_above
        .execute(None, Some(&floor[..]))
        .expect("executed")
        .expect("a collection");
    assert_eq!(names(&result), vec!["Alice", "Cara"]);

    let memento = result.memento().expect("memento identity").clone();
    assert_eq!(memento.action_id(), "RatedAbove");
    assert_eq!(memento.element_spec(), "Shop.Customer");
    assert_eq!(
        memento.target(),
        &Oid::Service {
            type_name: "Shop.CustomerRepository".into()
        }
    );
    assert_eq!(
        memento.parameters(),
        &[MementoParameter::Value(ScalarValue::Int(3))]
    );

    let slots = memento.to_encoded_strings().expect("encoded");
    let decoded = CollectionMemento::from_encoded_strings(&slots).expect("decoded");
    assert_eq!(decoded, memento);

    let recovered = decoded.recover_collection(&scope).expect("recovered");
    assert_eq!(names(&recovered), vec!["Alice", "Cara"]);
    assert_eq!(recovered.memento(), Some(&decoded));

    let cara_oid = cara.oid().expect("oid").clone();
    let selection = decoded.new_selection_memento(vec![cara_oid], false);
    let selected = selection.recover_collection(&scope).expect("recovered");
    assert_eq!(names(&selected), vec!["Cara"]);
}
