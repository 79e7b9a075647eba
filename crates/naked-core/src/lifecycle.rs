//! Object lifecycle and the persistence collaborators
//!
//! Persistence itself is external: an `ObjectStore` stages saves and deletes
//! inside a store transaction and applies them on commit. The lifecycle
//! manager creates transient instances, persists them through the store and
//! fires the conventional lifecycle callbacks. Keys generated during one
//! unit of work are recorded in that unit's `PersistenceContext`.

use naked_metamodel::facet::{Facet, LifecycleEvent, ViewModelFacet};
use naked_metamodel::{FacetHolder, FacetKind, Metamodel, Specification};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::adapter::{ObjectAdapter, Oid};
use crate::error::{NakedError, NakedResult};
use crate::registry::DelegateCache;
use crate::value::{DomainObject, DomainValue, ObjectHandle};

/// Storage behind the lifecycle manager
pub trait ObjectStore: Send + Sync {
    /// Begin staging changes
    fn start_transaction(&self);

    /// Apply staged changes
    fn end_transaction(&self) -> NakedResult<()>;

    /// Discard staged changes
    fn abort_transaction(&self);

    /// Next key for a type; keys are never reused
    fn next_key(&self, type_name: &str) -> u64;

    /// Stage a save
    fn save(&self, oid: &Oid, object: ObjectHandle) -> NakedResult<()>;

    /// Stage a delete
    fn delete(&self, oid: &Oid) -> NakedResult<()>;

    /// Object by identifier, seeing staged changes
    fn load(&self, oid: &Oid) -> Option<ObjectHandle>;

    /// Every stored instance of a type, seeing staged changes
    fn instances(&self, type_name: &str) -> Vec<ObjectHandle>;
}

#[derive(Debug)]
enum Change {
    Save(Oid, ObjectHandle),
    Delete(Oid),
}

#[derive(Debug, Default)]
struct StoreState {
    committed: BTreeMap<Oid, ObjectHandle>,
    staged: Vec<Change>,
    in_transaction: bool,
    keys: FxHashMap<String, u64>,
    commits: usize,
    aborts: usize,
}

impl StoreState {
    fn view(&self) -> BTreeMap<Oid, ObjectHandle> {
        let mut view = self.committed.clone();
        for change in &self.staged {
            match change {
                Change::Save(oid, object) => {
                    view.insert(oid.clone(), object.clone());
                }
                Change::Delete(oid) => {
                    view.remove(oid);
                }
            }
        }
        view
    }
}

/// Object store kept in memory
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    state: Mutex<StoreState>,
}

impl InMemoryObjectStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commits so far
    pub fn commit_count(&self) -> usize {
        self.state.lock().commits
    }

    /// Number of aborts so far
    pub fn abort_count(&self) -> usize {
        self.state.lock().aborts
    }

    /// Number of committed objects
    pub fn len(&self) -> usize {
        self.state.lock().committed.len()
    }

    /// Whether nothing is committed
    pub fn is_empty(&self) -> bool {
        self.state.lock().committed.is_empty()
    }

    /// Whether a store transaction is open
    pub fn in_transaction(&self) -> bool {
        self.state.lock().in_transaction
    }

    fn stage(&self, change: Change) -> NakedResult<()> {
        let mut state = self.state.lock();
        if !state.in_transaction {
            return Err(NakedError::Persistence(
                "changes can only be made inside a transaction".into(),
            ));
        }
        state.staged.push(change);
        Ok(())
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn start_transaction(&self) {
        let mut state = self.state.lock();
        if state.in_transaction {
            log::warn!("store transaction already open");
        }
        state.in_transaction = true;
    }

    fn end_transaction(&self) -> NakedResult<()> {
        let mut state = self.state.lock();
        if !state.in_transaction {
            return Err(NakedError::Transaction("no store transaction to commit".into()));
        }
        state.committed = state.view();
        let applied = state.staged.len();
        state.staged.clear();
        state.in_transaction = false;
        state.commits += 1;
        log::debug!("committed {} changes", applied);
        Ok(())
    }

    fn abort_transaction(&self) {
        let mut state = self.state.lock();
        let discarded = state.staged.len();
        state.staged.clear();
        state.in_transaction = false;
        state.aborts += 1;
        log::debug!("aborted, {} changes discarded", discarded);
    }

    fn next_key(&self, type_name: &str) -> u64 {
        let mut state = self.state.lock();
        let key = state.keys.entry(type_name.to_string()).or_insert(0);
        *key += 1;
        *key
    }

    fn save(&self, oid: &Oid, object: ObjectHandle) -> NakedResult<()> {
        self.stage(Change::Save(oid.clone(), object))
    }

    fn delete(&self, oid: &Oid) -> NakedResult<()> {
        self.stage(Change::Delete(oid.clone()))
    }

    fn load(&self, oid: &Oid) -> Option<ObjectHandle> {
        self.state.lock().view().remove(oid)
    }

    fn instances(&self, type_name: &str) -> Vec<ObjectHandle> {
        self.state
            .lock()
            .view()
            .into_iter()
            .filter(|(oid, _)| oid.type_name() == type_name)
            .map(|(_, object)| object)
            .collect()
    }
}

/// State owned by one unit of work
#[derive(Debug, Default)]
pub struct PersistenceContext {
    generated_keys: FxHashMap<Oid, Oid>,
    persisted: Vec<Oid>,
}

impl PersistenceContext {
    /// Fresh context
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the key generated for a transient object
    pub fn record(&mut self, transient: Oid, persistent: Oid) {
        self.persisted.push(persistent.clone());
        self.generated_keys.insert(transient, persistent);
    }

    /// The identifier an object has now, following keys generated in this unit of work
    pub fn resolve(&self, oid: &Oid) -> Oid {
        self.generated_keys.get(oid).cloned().unwrap_or_else(|| oid.clone())
    }

    /// Objects persisted in this unit of work, in order
    pub fn persisted(&self) -> &[Oid] {
        &self.persisted
    }
}

/// Creates, persists, loads and deletes domain objects
pub trait LifecycleManager: Send + Sync {
    /// New transient instance of a type
    fn create_instance(&self, type_name: &str) -> NakedResult<ObjectAdapter>;

    /// Save a transient object
    fn make_persistent(
        &self,
        adapter: &mut ObjectAdapter,
        unit_of_work: &mut PersistenceContext,
    ) -> NakedResult<()>;

    /// Delete a persistent object
    fn destroy_instance(&self, adapter: &ObjectAdapter) -> NakedResult<()>;

    /// Object by persistent or view-model identifier
    fn load_object(&self, oid: &Oid) -> NakedResult<ObjectAdapter>;

    /// Transient object created earlier by this manager
    fn recreate_instance(&self, oid: &Oid) -> NakedResult<ObjectAdapter>;

    /// Derive the keys of a view model and give it a view-model identifier
    fn populate_view_model_keys(&self, adapter: &mut ObjectAdapter) -> NakedResult<()>;

    /// Every stored instance of a type
    fn all_instances(&self, type_name: &str) -> Vec<ObjectAdapter>;
}

/// Lifecycle manager over an `ObjectStore`, with callbacks run through the delegate cache
pub struct InMemoryLifecycleManager {
    metamodel: Arc<Metamodel>,
    delegates: Arc<DelegateCache>,
    store: Arc<dyn ObjectStore>,
    transients: Mutex<FxHashMap<u64, ObjectHandle>>,
    next_serial: AtomicU64,
}

impl InMemoryLifecycleManager {
    /// Manager over a store
    pub fn new(
        metamodel: Arc<Metamodel>,
        delegates: Arc<DelegateCache>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            metamodel,
            delegates,
            store,
            transients: Mutex::new(FxHashMap::default()),
            next_serial: AtomicU64::new(1),
        }
    }

    fn spec(&self, type_name: &str) -> NakedResult<Arc<Specification>> {
        let spec = self.metamodel.specification(type_name)?;
        if spec.as_object().is_none() {
            return Err(NakedError::FindObject(format!("{} is not an object type", type_name)));
        }
        Ok(spec)
    }

    /// Run a callback if the type declares one
    fn callback(
        &self,
        spec: &Specification,
        event: LifecycleEvent,
        target: &ObjectHandle,
        args: &[DomainValue],
    ) -> NakedResult<()> {
        let method = match spec.facets().get_kind(FacetKind::Callback(event)) {
            Some(Facet::Callback(callback)) => callback.method.clone(),
            _ => None,
        };
        if let Some(method) = method {
            log::trace!("{} callback on {}", event.method_name(), spec.full_name());
            self.delegates.invoke(&method, Some(target), args)?;
        }
        Ok(())
    }
}

impl LifecycleManager for InMemoryLifecycleManager {
    fn create_instance(&self, type_name: &str) -> NakedResult<ObjectAdapter> {
        let spec = self.spec(type_name)?;
        if spec.is_service() {
            return Err(NakedError::InvalidEntry(format!(
                "{} is a service and cannot be instantiated",
                type_name
            )));
        }
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        let mut object = DomainObject::new(type_name);
        object.oid = Some(Oid::Transient {
            type_name: type_name.to_string(),
            serial,
        });
        let handle = object.into_handle();
        self.transients.lock().insert(serial, handle.clone());
        self.callback(&spec, LifecycleEvent::Created, &handle, &[])?;
        Ok(ObjectAdapter::for_object(handle))
    }

    fn make_persistent(
        &self,
        adapter: &mut ObjectAdapter,
        unit_of_work: &mut PersistenceContext,
    ) -> NakedResult<()> {
        let handle = adapter
            .handle()
            .cloned()
            .ok_or_else(|| NakedError::Persistence(format!("{} is not an object", adapter.spec_name())))?;
        let transient = match adapter.oid() {
            Some(oid @ Oid::Transient { .. }) => oid.clone(),
            Some(Oid::Persistent { .. }) => return Ok(()),
            _ => {
                return Err(NakedError::Persistence(format!(
                    "{} cannot be persisted",
                    adapter.spec_name()
                )))
            }
        };
        let spec = self.spec(transient.type_name())?;
        if spec.contains_facet(FacetKind::ViewModel) {
            return Err(NakedError::Persistence(format!(
                "{} is a view model and is never persisted",
                spec.full_name()
            )));
        }

        self.callback(&spec, LifecycleEvent::Persisting, &handle, &[])?;
        let persistent = Oid::Persistent {
            type_name: transient.type_name().to_string(),
            key: self.store.next_key(transient.type_name()),
        };
        if let Err(e) = self.store.save(&persistent, handle.clone()) {
            self.callback(
                &spec,
                LifecycleEvent::OnPersistingError,
                &handle,
                &[DomainValue::Str(e.to_string())],
            )?;
            return Err(e);
        }
        handle.write().oid = Some(persistent.clone());
        log::debug!("{} persisted as {}", transient, persistent);
        unit_of_work.record(transient, persistent);
        self.callback(&spec, LifecycleEvent::Persisted, &handle, &[])?;
        adapter.refresh_identity();
        Ok(())
    }

    fn destroy_instance(&self, adapter: &ObjectAdapter) -> NakedResult<()> {
        let oid = adapter.require_oid()?;
        let handle = adapter
            .handle()
            .ok_or_else(|| NakedError::Persistence(format!("{} is not an object", oid)))?;
        let spec = self.spec(oid.type_name())?;
        self.callback(&spec, LifecycleEvent::Deleting, handle, &[])?;
        self.store.delete(oid)?;
        self.callback(&spec, LifecycleEvent::Deleted, handle, &[])
    }

    fn load_object(&self, oid: &Oid) -> NakedResult<ObjectAdapter> {
        match oid {
            Oid::Persistent { .. } => self
                .store
                .load(oid)
                .map(ObjectAdapter::for_object)
                .ok_or_else(|| NakedError::FindObject(format!("no object {}", oid))),
            Oid::Transient { .. } => self.recreate_instance(oid),
            Oid::ViewModel { type_name, keys } => {
                let spec = self.spec(type_name)?;
                let facet = spec.get::<ViewModelFacet>().ok_or_else(|| {
                    NakedError::FindObject(format!("{} is not a view model", type_name))
                })?;
                let mut object = DomainObject::new(type_name.as_str());
                object.oid = Some(oid.clone());
                let handle = object.into_handle();
                let keys = keys.iter().map(|k| DomainValue::Str(k.clone())).collect();
                self.delegates.invoke(
                    &facet.populate_using_keys,
                    Some(&handle),
                    &[DomainValue::Collection(keys)],
                )?;
                Ok(ObjectAdapter::for_object(handle))
            }
            Oid::Service { .. } => Err(NakedError::FindObject(format!(
                "{} is a service, ask the services manager",
                oid
            ))),
        }
    }

    fn recreate_instance(&self, oid: &Oid) -> NakedResult<ObjectAdapter> {
        let Oid::Transient { serial, .. } = oid else {
            return Err(NakedError::FindObject(format!("{} is not transient", oid)));
        };
        self.transients
            .lock()
            .get(serial)
            .cloned()
            .map(ObjectAdapter::for_object)
            .ok_or_else(|| NakedError::FindObject(format!("transient {} is gone", oid)))
    }

    fn populate_view_model_keys(&self, adapter: &mut ObjectAdapter) -> NakedResult<()> {
        let handle = adapter
            .handle()
            .cloned()
            .ok_or_else(|| NakedError::FindObject(format!("{} is not an object", adapter.spec_name())))?;
        let spec = self.spec(adapter.spec_name())?;
        let Some(facet) = spec.get::<ViewModelFacet>() else {
            return Ok(());
        };
        let derived = self.delegates.invoke(&facet.derive_keys, Some(&handle), &[])?;
        let keys = derived
            .as_collection()
            .ok_or_else(|| NakedError::invoke(&facet.derive_keys, "must return a collection of keys"))?
            .iter()
            .map(DomainValue::title)
            .collect();
        handle.write().oid = Some(Oid::ViewModel {
            type_name: spec.full_name().to_string(),
            keys,
        });
        adapter.refresh_identity();
        Ok(())
    }

    fn all_instances(&self, type_name: &str) -> Vec<ObjectAdapter> {
        self.store
            .instances(type_name)
            .into_iter()
            .map(ObjectAdapter::for_object)
            .collect()
    }
}
