//! The frozen metamodel
//!
//! Once reflection finishes, every specification is moved into an immutable
//! cache and shared behind `Arc`. Readers never lock the cache itself; the
//! `MetamodelManager` only guards which `Metamodel` is current, so a rebuild
//! swaps the whole model atomically while readers keep the old one.

pub mod partial;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

pub use partial::{PartialMetamodel, SpecEntry};

use crate::error::{ReflectionError, ReflectionResult};
use crate::menu::Menu;
use crate::spec::Specification;

/// Read access to introspected specifications
pub trait SpecificationCache: Send + Sync {
    /// Specification for a full type name
    fn get_specification(&self, name: &str) -> Option<Arc<Specification>>;

    /// Every specification, sorted by full name
    fn all_specifications(&self) -> Vec<Arc<Specification>>;

    /// Number of specifications
    fn len(&self) -> usize {
        self.all_specifications().len()
    }

    /// Whether the cache is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Specification cache that never changes after construction
#[derive(Debug, Default)]
pub struct ImmutableInMemorySpecCache {
    specs: FxHashMap<String, Arc<Specification>>,
    names: Vec<String>,
}

impl ImmutableInMemorySpecCache {
    /// Freeze a set of specifications
    pub fn new(specs: FxHashMap<String, Arc<Specification>>) -> Self {
        let mut names: Vec<String> = specs.keys().cloned().collect();
        names.sort();
        Self { specs, names }
    }

    /// Sorted full names
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl SpecificationCache for ImmutableInMemorySpecCache {
    fn get_specification(&self, name: &str) -> Option<Arc<Specification>> {
        self.specs.get(name).cloned()
    }

    fn all_specifications(&self) -> Vec<Arc<Specification>> {
        self.names
            .iter()
            .filter_map(|n| self.specs.get(n).cloned())
            .collect()
    }

    fn len(&self) -> usize {
        self.specs.len()
    }
}

/// The complete, immutable result of reflection
pub struct Metamodel {
    cache: Box<dyn SpecificationCache>,
    menus: Vec<Menu>,
    services: Vec<String>,
    /// Type name -> authorizer name
    authorizers: BTreeMap<String, String>,
    /// Type name -> the type and every supertype it is assignable to
    supertypes: FxHashMap<String, Vec<String>>,
}

impl std::fmt::Debug for Metamodel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metamodel")
            .field("specifications", &self.cache.len())
            .field("menus", &self.menus.len())
            .field("services", &self.services)
            .finish()
    }
}

impl Metamodel {
    /// Assemble a metamodel
    pub fn new(
        cache: Box<dyn SpecificationCache>,
        menus: Vec<Menu>,
        services: Vec<String>,
        authorizers: BTreeMap<String, String>,
        supertypes: FxHashMap<String, Vec<String>>,
    ) -> Self {
        Self {
            cache,
            menus,
            services,
            authorizers,
            supertypes,
        }
    }

    /// An empty metamodel
    pub fn empty() -> Self {
        Self::new(
            Box::new(ImmutableInMemorySpecCache::default()),
            Vec::new(),
            Vec::new(),
            BTreeMap::new(),
            FxHashMap::default(),
        )
    }

    /// Specification for a full type name
    pub fn get_specification(&self, name: &str) -> Option<Arc<Specification>> {
        self.cache.get_specification(name)
    }

    /// Specification for a full type name, or an error naming it
    pub fn specification(&self, name: &str) -> ReflectionResult<Arc<Specification>> {
        self.get_specification(name)
            .ok_or_else(|| ReflectionError::UnknownType { name: name.to_string() })
    }

    /// Every specification, sorted by full name
    pub fn all_specifications(&self) -> Vec<Arc<Specification>> {
        self.cache.all_specifications()
    }

    /// Main menus, in service registration order
    pub fn menus(&self) -> &[Menu] {
        &self.menus
    }

    /// Registered service type names
    pub fn services(&self) -> &[String] {
        &self.services
    }

    /// Authorizer registered for a type, if any
    pub fn authorizer_for(&self, type_name: &str) -> Option<&str> {
        self.authorizers.get(type_name).map(String::as_str)
    }

    /// Whether an instance of `sub` can stand where `sup` is expected
    pub fn is_assignable(&self, sub: &str, sup: &str) -> bool {
        sub == sup
            || self
                .supertypes
                .get(sub)
                .map(|supers| supers.iter().any(|s| s == sup))
                .unwrap_or(false)
    }

    /// Number of specifications
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the metamodel is empty
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Owner of the current metamodel
///
/// Readers take a cheap `Arc` snapshot; `replace` publishes a new model.
#[derive(Debug)]
pub struct MetamodelManager {
    current: RwLock<Arc<Metamodel>>,
}

impl MetamodelManager {
    /// Manage a metamodel
    pub fn new(metamodel: Metamodel) -> Self {
        Self {
            current: RwLock::new(Arc::new(metamodel)),
        }
    }

    /// Snapshot of the current metamodel
    pub fn metamodel(&self) -> Arc<Metamodel> {
        self.current.read().clone()
    }

    /// Publish a new metamodel, returning the previous one
    pub fn replace(&self, metamodel: Metamodel) -> Arc<Metamodel> {
        let next = Arc::new(metamodel);
        std::mem::replace(&mut *self.current.write(), next)
    }

    /// Rebuild with `build` and publish the result; on error the current model stays
    pub fn rebuild<F>(&self, build: F) -> ReflectionResult<Arc<Metamodel>>
    where
        F: FnOnce() -> ReflectionResult<Metamodel>,
    {
        let metamodel = build()?;
        self.replace(metamodel);
        Ok(self.metamodel())
    }

    /// Specification lookup against the current metamodel
    pub fn get_specification(&self, name: &str) -> Option<Arc<Specification>> {
        self.current.read().get_specification(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::TypeInfo;

    fn cache(names: &[&str]) -> ImmutableInMemorySpecCache {
        let specs = names
            .iter()
            .map(|n| (n.to_string(), Arc::new(Specification::object(&TypeInfo::class(*n)))))
            .collect();
        ImmutableInMemorySpecCache::new(specs)
    }

    #[test]
    fn test_cache_lists_sorted() {
        let cache = cache(&["Shop.Order", "Shop.Customer"]);
        let names: Vec<String> = cache
            .all_specifications()
            .iter()
            .map(|s| s.full_name().to_string())
            .collect();
        assert_eq!(names, vec!["Shop.Customer", "Shop.Order"]);
        assert!(cache.get_specification("Shop.Order").is_some());
        assert!(cache.get_specification("Shop.Missing").is_none());
    }

    #[test]
    fn test_is_assignable_uses_supertypes() {
        let mut supertypes = FxHashMap::default();
        supertypes.insert("Shop.Customer".to_string(), vec!["Shop.Party".to_string()]);
        let metamodel = Metamodel::new(
            Box::new(cache(&["Shop.Customer", "Shop.Party"])),
            Vec::new(),
            Vec::new(),
            BTreeMap::new(),
            supertypes,
        );
        assert!(metamodel.is_assignable("Shop.Customer", "Shop.Party"));
        assert!(metamodel.is_assignable("Shop.Party", "Shop.Party"));
        assert!(!metamodel.is_assignable("Shop.Party", "Shop.Customer"));
    }

    #[test]
    fn test_unknown_specification_is_an_error() {
        let metamodel = Metamodel::empty();
        let err = metamodel.specification("Shop.Missing").expect_err("unknown");
        assert!(matches!(err, ReflectionError::UnknownType { .. }));
    }

    #[test]
    fn test_manager_replace_keeps_old_snapshots() {
        let manager = MetamodelManager::new(Metamodel::empty());
        let before = manager.metamodel();
        let new_model = Metamodel::new(
            Box::new(cache(&["Shop.Customer"])),
            Vec::new(),
            Vec::new(),
            BTreeMap::new(),
            FxHashMap::default(),
        );
        manager.replace(new_model);
        assert!(before.is_empty());
        assert_eq!(manager.metamodel().len(), 1);
        assert!(manager.get_specification("Shop.Customer").is_some());
    }

    #[test]
    fn test_failed_rebuild_keeps_current() {
        let manager = MetamodelManager::new(Metamodel::empty());
        let result = manager.rebuild(|| Err(ReflectionError::initialisation("boom")));
        assert!(result.is_err());
        assert!(manager.metamodel().is_empty());
    }
}
