//! Naked Objects runtime
//!
//! Everything that acts on domain objects through a built metamodel:
//!
//! 1. `value` / `adapter`: domain values, object identifiers and adapters
//! 2. `registry`: method handlers and the lazily bound delegate cache
//! 3. `lifecycle` / `transaction`: object store, lifecycle manager, nested transactions
//! 4. `spec`: session-scoped views of objects, properties, actions and parameters
//! 5. `memento`: re-creatable identities for collection results
//! 6. `framework`: the composition root

#![warn(missing_docs)]

pub mod adapter;
pub mod error;
pub mod framework;
pub mod interaction;
pub mod lifecycle;
pub mod memento;
pub mod registry;
pub mod services;
pub mod session;
pub mod spec;
pub mod transaction;
pub mod value;

pub use adapter::{Identity, ObjectAdapter, Oid};
pub use error::{NakedError, NakedResult};
pub use framework::{FrameworkBuilder, NakedFramework, StandardConfig};
pub use interaction::{Consent, InteractionBuffer};
pub use lifecycle::{
    InMemoryLifecycleManager, InMemoryObjectStore, LifecycleManager, ObjectStore,
    PersistenceContext,
};
pub use memento::{CollectionMemento, MementoParameter, ParameterType};
pub use registry::{DelegateCache, MethodHandler, MethodRegistry};
pub use services::{ServiceRegistry, ServicesManager};
pub use session::{Session, SimpleSession};
pub use spec::{
    ActionParameterSpec, ActionSpec, ObjectSpec, OneToManyAssociationSpec,
    OneToOneAssociationSpec, RequestScope, TypeAuthorizer,
};
pub use transaction::TransactionManager;
pub use value::{DomainObject, DomainValue, ObjectHandle, ScalarValue};
