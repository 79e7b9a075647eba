//! Registered service instances

use naked_metamodel::Metamodel;

use crate::adapter::{ObjectAdapter, Oid};
use crate::value::{DomainObject, ObjectHandle};

/// Access to the service instances of a framework
pub trait ServicesManager: Send + Sync {
    /// Every service, in registration order
    fn services(&self) -> Vec<ObjectAdapter>;

    /// Service of exactly this type
    fn service(&self, type_name: &str) -> Option<ObjectAdapter> {
        self.services().into_iter().find(|s| s.spec_name() == type_name)
    }
}

/// One instance per registered service type
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    instances: Vec<ObjectHandle>,
}

impl ServiceRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate every service the metamodel knows about
    pub fn from_metamodel(metamodel: &Metamodel) -> Self {
        let mut registry = Self::new();
        for type_name in metamodel.services() {
            registry.register(DomainObject::new(type_name.as_str()));
        }
        registry
    }

    /// Register an instance; its identity becomes a service oid
    pub fn register(&mut self, mut instance: DomainObject) -> ObjectHandle {
        instance.oid = Some(Oid::Service {
            type_name: instance.type_name.clone(),
        });
        log::debug!("service {} registered", instance.type_name);
        let handle = instance.into_handle();
        self.instances.push(handle.clone());
        handle
    }

    /// Number of services
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no service is registered
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl ServicesManager for ServiceRegistry {
    fn services(&self) -> Vec<ObjectAdapter> {
        self.instances
            .iter()
            .map(|h| ObjectAdapter::for_object(h.clone()))
            .collect()
    }
}
