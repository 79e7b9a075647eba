//! The metamodel under construction
//!
//! A persistent map threaded through every factory call. Each step returns a
//! new version; clones share storage until one of them is written, so the
//! parallel reflector can hand every batch its own version and merge them
//! afterwards without locks.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::spec::Specification;

/// One entry of the partial metamodel
#[derive(Debug, Clone)]
pub enum SpecEntry {
    /// Referenced, not yet introspected
    Placeholder,
    /// Fully introspected
    Introspected(Arc<Specification>),
}

impl SpecEntry {
    /// Whether the entry is introspected
    pub fn is_introspected(&self) -> bool {
        matches!(self, SpecEntry::Introspected(_))
    }
}

/// Copy-on-write map from type full name to entry
///
/// Writes land in a small owned overlay and are folded into the shared map
/// once a type is introspected, so cloning a version mid-type copies only
/// the overlay.
#[derive(Debug, Clone, Default)]
pub struct PartialMetamodel {
    shared: Arc<FxHashMap<String, SpecEntry>>,
    /// Writes since the last fold; `None` marks a removal
    pending: FxHashMap<String, Option<SpecEntry>>,
}

impl PartialMetamodel {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// New version with a placeholder for `name` unless it is already present
    pub fn with_placeholder(mut self, name: &str) -> Self {
        if !self.contains(name) {
            self.pending.insert(name.to_string(), Some(SpecEntry::Placeholder));
        }
        self
    }

    /// New version with `spec` introspected under its full name
    pub fn with_introspected(mut self, spec: Specification) -> Self {
        let name = spec.full_name().to_string();
        self.pending
            .insert(name, Some(SpecEntry::Introspected(Arc::new(spec))));
        self.fold();
        self
    }

    /// New version without `name`, for references that cannot be introspected
    pub fn without(mut self, name: &str) -> Self {
        if self.contains(name) {
            self.pending.insert(name.to_string(), None);
        }
        self
    }

    /// Move pending writes into the shared map, copying it first if another version holds it
    fn fold(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let shared = Arc::make_mut(&mut self.shared);
        for (name, entry) in self.pending.drain() {
            match entry {
                Some(entry) => {
                    shared.insert(name, entry);
                }
                None => {
                    shared.remove(&name);
                }
            }
        }
    }

    fn entries(&self) -> impl Iterator<Item = (&String, &SpecEntry)> {
        let pending = &self.pending;
        self.shared
            .iter()
            .filter(move |(name, _)| !pending.contains_key(*name))
            .chain(
                pending
                    .iter()
                    .filter_map(|(name, entry)| entry.as_ref().map(|e| (name, e))),
            )
    }

    /// Entry for a name
    pub fn get(&self, name: &str) -> Option<&SpecEntry> {
        match self.pending.get(name) {
            Some(entry) => entry.as_ref(),
            None => self.shared.get(name),
        }
    }

    /// Introspected spec for a name
    pub fn specification(&self, name: &str) -> Option<&Arc<Specification>> {
        match self.get(name) {
            Some(SpecEntry::Introspected(spec)) => Some(spec),
            _ => None,
        }
    }

    /// Whether a name is present in any state
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether a name is introspected
    pub fn is_introspected(&self, name: &str) -> bool {
        self.get(name).map(SpecEntry::is_introspected).unwrap_or(false)
    }

    /// Names still waiting for introspection, sorted
    pub fn placeholders(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries()
            .filter(|(_, e)| !e.is_introspected())
            .map(|(n, _)| n.clone())
            .collect();
        names.sort();
        names
    }

    /// Number of entries in any state
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn shares_storage_with(&self, other: &PartialMetamodel) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Combine two versions; introspected entries beat placeholders
    pub fn merge(mut self, other: PartialMetamodel) -> Self {
        let same_base = Arc::ptr_eq(&self.shared, &other.shared);
        for (name, entry) in other.entries() {
            if same_base && !other.pending.contains_key(name) {
                continue;
            }
            let replace = match self.get(name) {
                None => true,
                Some(existing) => !existing.is_introspected() && entry.is_introspected(),
            };
            if replace {
                self.pending.insert(name.clone(), Some(entry.clone()));
            }
        }
        self.fold();
        self
    }

    /// Introspected specs, placeholders dropped
    pub fn into_specifications(mut self) -> FxHashMap<String, Arc<Specification>> {
        self.fold();
        let entries = Arc::try_unwrap(self.shared).unwrap_or_else(|shared| (*shared).clone());
        entries
            .into_iter()
            .filter_map(|(name, entry)| match entry {
                SpecEntry::Introspected(spec) => Some((name, spec)),
                SpecEntry::Placeholder => None,
            })
            .collect()
    }
}
