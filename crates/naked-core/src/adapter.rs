//! Object identity and adapters

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{NakedError, NakedResult};
use crate::memento::CollectionMemento;
use crate::value::{DomainValue, ObjectHandle};

/// Object identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Oid {
    /// Saved in the object store
    Persistent {
        /// Full type name
        type_name: String,
        /// Store key
        key: u64,
    },
    /// Created but not yet saved
    Transient {
        /// Full type name
        type_name: String,
        /// Serial number within the creating lifecycle manager
        serial: u64,
    },
    /// View model identified by its derived keys
    ViewModel {
        /// Full type name
        type_name: String,
        /// Keys produced by `DeriveKeys`
        keys: Vec<String>,
    },
    /// Registered service, one instance per type
    Service {
        /// Full type name
        type_name: String,
    },
}

impl Oid {
    /// Type of the identified object
    pub fn type_name(&self) -> &str {
        match self {
            Oid::Persistent { type_name, .. }
            | Oid::Transient { type_name, .. }
            | Oid::ViewModel { type_name, .. }
            | Oid::Service { type_name } => type_name,
        }
    }

    /// Whether the object has never been saved
    pub fn is_transient(&self) -> bool {
        matches!(self, Oid::Transient { .. })
    }

    /// Encoded form used inside mementos
    pub fn encode(&self) -> NakedResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Inverse of `encode`
    pub fn decode(encoded: &str) -> NakedResult<Self> {
        serde_json::from_str(encoded)
            .map_err(|e| NakedError::Memento(format!("bad oid '{}': {}", encoded, e)))
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Oid::Persistent { type_name, key } => write!(f, "{}#{}", type_name, key),
            Oid::Transient { type_name, serial } => write!(f, "{}~{}", type_name, serial),
            Oid::ViewModel { type_name, keys } => write!(f, "{}[{}]", type_name, keys.join(",")),
            Oid::Service { type_name } => write!(f, "{}@service", type_name),
        }
    }
}

/// How an adapter can be found again
#[derive(Debug, Clone)]
pub enum Identity {
    /// An object with an identifier
    Oid(Oid),
    /// An action result, re-created by executing the action again
    Memento(Box<CollectionMemento>),
    /// A plain value
    None,
}

/// A value paired with its specification name and identity
#[derive(Debug, Clone)]
pub struct ObjectAdapter {
    value: DomainValue,
    spec: String,
    identity: Identity,
}

impl ObjectAdapter {
    /// Adapter for a domain object; identity comes from the object's oid
    pub fn for_object(handle: ObjectHandle) -> Self {
        let (spec, identity) = {
            let object = handle.read();
            let identity = match &object.oid {
                Some(oid) => Identity::Oid(oid.clone()),
                None => Identity::None,
            };
            (object.type_name.clone(), identity)
        };
        Self {
            value: DomainValue::Object(handle),
            spec,
            identity,
        }
    }

    /// Adapter for a scalar or collection
    pub fn for_value(value: DomainValue, spec: impl Into<String>) -> Self {
        Self {
            value,
            spec: spec.into(),
            identity: Identity::None,
        }
    }

    /// Attach a memento as the transient identity of an action result
    pub fn with_memento(mut self, memento: CollectionMemento) -> Self {
        self.identity = Identity::Memento(Box::new(memento));
        self
    }

    /// Adapted value
    pub fn value(&self) -> &DomainValue {
        &self.value
    }

    /// Consume, keeping the value
    pub fn into_value(self) -> DomainValue {
        self.value
    }

    /// Name of the specification describing the value
    pub fn spec_name(&self) -> &str {
        &self.spec
    }

    /// Identity
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Object identifier, if any
    pub fn oid(&self) -> Option<&Oid> {
        match &self.identity {
            Identity::Oid(oid) => Some(oid),
            _ => None,
        }
    }

    /// Object identifier, failing for values and action results
    pub fn require_oid(&self) -> NakedResult<&Oid> {
        self.oid()
            .ok_or_else(|| NakedError::FindObject(format!("{} has no object identifier", self.spec)))
    }

    /// Memento of an action result, if any
    pub fn memento(&self) -> Option<&CollectionMemento> {
        match &self.identity {
            Identity::Memento(m) => Some(m),
            _ => None,
        }
    }

    /// Underlying object
    pub fn handle(&self) -> Option<&ObjectHandle> {
        self.value.as_object()
    }

    /// Whether the object has been saved
    pub fn is_persistent(&self) -> bool {
        matches!(self.oid(), Some(Oid::Persistent { .. }))
    }

    /// Whether the object exists only in memory
    pub fn is_transient(&self) -> bool {
        matches!(self.oid(), Some(Oid::Transient { .. }))
    }

    /// Re-read the identity after the object was persisted
    pub fn refresh_identity(&mut self) {
        if let Some(handle) = self.value.as_object() {
            if let Some(oid) = handle.read().oid.clone() {
                self.identity = Identity::Oid(oid);
            }
        }
    }
}
