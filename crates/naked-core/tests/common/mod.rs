//! Shop model shared by the runtime integration tests

#![allow(dead_code)]

use std::sync::Arc;

use naked_core::{
    DomainObject, DomainValue, InMemoryObjectStore, NakedError, NakedFramework, ObjectStore,
    SimpleSession, StandardConfig,
};
use naked_metamodel::reflect::{Attribute, ParameterInfo, PrimitiveType};
use naked_metamodel::{AssemblyInfo, MethodId, MethodInfo, PropertyInfo, ReflectorConfig, TypeInfo, TypeRef};

pub fn int() -> TypeRef {
    TypeRef::Primitive(PrimitiveType::Int32)
}

pub fn customer() -> TypeRef {
    TypeRef::named("Shop.Customer")
}

pub fn shop() -> AssemblyInfo {
    AssemblyInfo::new("Shop")
        .with_type(
            TypeInfo::class("Shop.Customer")
                .property(
                    PropertyInfo::new("Name", TypeRef::string())
                        .settable()
                        .attribute(Attribute::MaxLength { value: 10 }),
                )
                .property(PropertyInfo::new("Rating", int()).settable())
                .method(MethodInfo::new("Title", TypeRef::string()))
                .method(MethodInfo::new("ValidateName", TypeRef::string()).param("name", TypeRef::string()))
                .method(MethodInfo::new("Persisted", TypeRef::Void)),
        )
        .with_type(
            TypeInfo::class("Shop.CustomerRepository")
                .method(
                    MethodInfo::new("CreateCustomer", customer())
                        .param_with(ParameterInfo::new("name", TypeRef::string()).attribute(Attribute::Required))
                        .param("rating", int()),
                )
                .method(
                    MethodInfo::new("ValidateCreateCustomer", TypeRef::string())
                        .param("name", TypeRef::string())
                        .param("rating", int()),
                )
                .method(MethodInfo::new("AllCustomers", TypeRef::queryable_of(customer())))
                .method(
                    MethodInfo::new("RatedAbove", TypeRef::list_of(customer()))
                        .param("rating", int()),
                )
                .method(
                    MethodInfo::new("SendReminder", TypeRef::string()).param_with(
                        ParameterInfo::new("customer", customer()).attribute(Attribute::contributed()),
                    ),
                )
                .method(MethodInfo::new("Fail", TypeRef::Void)),
        )
}

pub fn config() -> ReflectorConfig {
    ReflectorConfig::default()
        .with_namespace("Shop")
        .with_service("Shop.CustomerRepository")
}

pub fn repository(name: &str, parameters: &[TypeRef]) -> MethodId {
    MethodId::new("Shop.CustomerRepository", name, parameters)
}

pub fn on_customer(name: &str, parameters: &[TypeRef]) -> MethodId {
    MethodId::new("Shop.Customer", name, parameters)
}

fn customers(store: &InMemoryObjectStore) -> Vec<DomainValue> {
    store
        .instances("Shop.Customer")
        .into_iter()
        .map(DomainValue::Object)
        .collect()
}

/// Framework over the shop model, with handlers for every domain method
pub fn framework() -> (Arc<InMemoryObjectStore>, NakedFramework) {
    let store = Arc::new(InMemoryObjectStore::new());
    let all = Arc::clone(&store);
    let rated = Arc::clone(&store);

    let framework = StandardConfig::builder(config())
        .with_store(store.clone())
        .with_method(on_customer("Title", &[]), |target, _| {
            let name = target.map(|t| t.read().get("Name")).unwrap_or_default();
            Ok(DomainValue::Str(format!("Customer {}", name.title())))
        })
        .with_method(on_customer("ValidateName", &[TypeRef::string()]), |_, args| {
            let name = args.first().and_then(DomainValue::as_str).unwrap_or("");
            Ok(if name.contains('!') {
                DomainValue::from("No punctuation")
            } else {
                DomainValue::Null
            })
        })
        .with_method(on_customer("Persisted", &[]), |target, _| {
            if let Some(target) = target {
                target.write().set("Status", DomainValue::from("saved"));
            }
            Ok(DomainValue::Null)
        })
        .with_method(
            repository("CreateCustomer", &[TypeRef::string(), int()]),
            |_, args| {
                let customer = DomainObject::new("Shop.Customer")
                    .with("Name", args[0].clone())
                    .with("Rating", args[1].clone());
                Ok(DomainValue::object(customer))
            },
        )
        .with_method(
            repository("ValidateCreateCustomer", &[TypeRef::string(), int()]),
            |_, args| {
                Ok(match args[0].as_str() {
                    Some("Alice") => DomainValue::from("Name taken"),
                    _ => DomainValue::Null,
                })
            },
        )
        .with_method(repository("AllCustomers", &[]), move |_, _| {
            Ok(DomainValue::Collection(customers(&all)))
        })
        .with_method(repository("RatedAbove", &[int()]), move |_, args| {
            let floor = args.first().and_then(DomainValue::as_i64).unwrap_or(0);
            let above = customers(&rated)
                .into_iter()
                .filter(|c| {
                    c.as_object()
                        .and_then(|h| h.read().get("Rating").as_i64())
                        .map(|r| r > floor)
                        .unwrap_or(false)
                })
                .collect();
            Ok(DomainValue::Collection(above))
        })
        .with_method(repository("SendReminder", &[customer()]), |_, args| {
            let name = args
                .first()
                .and_then(DomainValue::as_object)
                .map(|h| h.read().get("Name").title())
                .unwrap_or_default();
            Ok(DomainValue::Str(format!("Reminder sent to {}", name)))
        })
        .with_method(repository("Fail", &[]), |_, _| {
            Err(NakedError::invoke("Shop.CustomerRepository::Fail()", "always fails"))
        })
        .build(&[shop()])
        .expect("framework builds");
    (store, framework)
}

pub fn session() -> Arc<SimpleSession> {
    Arc::new(SimpleSession::new("alice").with_role("clerk"))
}
