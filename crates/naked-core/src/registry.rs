//! Method handlers and the delegate cache
//!
//! Facets only carry a `MethodId`. The code behind a method is registered
//! once in a `MethodRegistry` when the framework is assembled; a
//! `DelegateCache` binds ids to handlers the first time each is invoked.
//! Nothing in this module is ever serialised.

use dashmap::DashMap;
use naked_metamodel::reflect::MethodInfo;
use naked_metamodel::MethodId;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::error::{NakedError, NakedResult};
use crate::value::{DomainValue, ObjectHandle};

/// Body of a domain method: target (`None` for static methods) and arguments
pub type MethodHandler =
    Arc<dyn Fn(Option<&ObjectHandle>, &[DomainValue]) -> NakedResult<DomainValue> + Send + Sync>;

/// Handlers by method id, fixed once the framework is built
#[derive(Default)]
pub struct MethodRegistry {
    handlers: FxHashMap<MethodId, MethodHandler>,
}

impl MethodRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the body of a method; a second registration replaces the first
    pub fn register<F>(&mut self, id: MethodId, handler: F)
    where
        F: Fn(Option<&ObjectHandle>, &[DomainValue]) -> NakedResult<DomainValue> + Send + Sync + 'static,
    {
        if self.handlers.insert(id.clone(), Arc::new(handler)).is_some() {
            log::debug!("handler for {} replaced", id);
        }
    }

    /// Register the body of a described method
    pub fn register_method<F>(&mut self, method: &MethodInfo, handler: F)
    where
        F: Fn(Option<&ObjectHandle>, &[DomainValue]) -> NakedResult<DomainValue> + Send + Sync + 'static,
    {
        self.register(method.id(), handler);
    }

    /// Handler for a method
    pub fn get(&self, id: &MethodId) -> Option<&MethodHandler> {
        self.handlers.get(id)
    }

    /// Number of registered methods
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Shared cache binding method ids to handlers on first use
pub struct DelegateCache {
    registry: Arc<MethodRegistry>,
    bound: DashMap<MethodId, MethodHandler>,
}

impl DelegateCache {
    /// Cache over a registry
    pub fn new(registry: Arc<MethodRegistry>) -> Self {
        Self {
            registry,
            bound: DashMap::new(),
        }
    }

    /// Bound handler, binding it now if this is the first request
    pub fn try_delegate(&self, id: &MethodId) -> Option<MethodHandler> {
        if let Some(handler) = self.bound.get(id) {
            return Some(Arc::clone(handler.value()));
        }
        let handler = Arc::clone(self.registry.get(id)?);
        log::trace!("binding delegate for {}", id);
        self.bound.insert(id.clone(), Arc::clone(&handler));
        Some(handler)
    }

    /// Bound handler, failing when no code was registered for the method
    pub fn delegate(&self, id: &MethodId) -> NakedResult<MethodHandler> {
        self.try_delegate(id)
            .ok_or_else(|| NakedError::invoke(id, "no handler registered"))
    }

    /// Invoke a method
    pub fn invoke(
        &self,
        id: &MethodId,
        target: Option<&ObjectHandle>,
        args: &[DomainValue],
    ) -> NakedResult<DomainValue> {
        let handler = self.delegate(id)?;
        handler(target, args)
    }

    /// Number of delegates bound so far
    pub fn bound_count(&self) -> usize {
        self.bound.len()
    }
}

impl std::fmt::Debug for DelegateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegateCache")
            .field("registered", &self.registry.len())
            .field("bound", &self.bound.len())
            .finish()
    }
}
