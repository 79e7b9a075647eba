//! Ordered facet collection with one facet per kind

use serde::{Deserialize, Serialize};

use super::{Facet, FacetKind, FacetMarker};

/// Facets of one holder, in attachment order
///
/// Adding a facet of a kind already present replaces it in place, so the
/// last factory to attach a kind wins while manifest order stays stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacetSet {
    facets: Vec<Facet>,
}

impl FacetSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a facet, returning the one it replaced
    pub fn add(&mut self, facet: impl Into<Facet>) -> Option<Facet> {
        let facet = facet.into();
        let kind = facet.kind();
        match self.facets.iter_mut().find(|f| f.kind() == kind) {
            Some(slot) => Some(std::mem::replace(slot, facet)),
            None => {
                self.facets.push(facet);
                None
            }
        }
    }

    /// Attach a facet only if its kind is not present yet
    pub fn add_if_absent(&mut self, facet: impl Into<Facet>) -> bool {
        let facet = facet.into();
        if self.contains(facet.kind()) {
            false
        } else {
            self.facets.push(facet);
            true
        }
    }

    /// Detach the facet of a kind
    pub fn remove(&mut self, kind: FacetKind) -> Option<Facet> {
        let index = self.facets.iter().position(|f| f.kind() == kind)?;
        Some(self.facets.remove(index))
    }

    /// Facet of a kind
    pub fn get_kind(&self, kind: FacetKind) -> Option<&Facet> {
        self.facets.iter().find(|f| f.kind() == kind)
    }

    /// Typed facet lookup
    pub fn get<F: FacetMarker>(&self) -> Option<&F> {
        self.get_kind(F::KIND).and_then(F::from_facet)
    }

    /// Whether a kind is present
    pub fn contains(&self, kind: FacetKind) -> bool {
        self.facets.iter().any(|f| f.kind() == kind)
    }

    /// Kinds present, in attachment order
    pub fn kinds(&self) -> Vec<FacetKind> {
        self.facets.iter().map(Facet::kind).collect()
    }

    /// Iterate facets
    pub fn iter(&self) -> impl Iterator<Item = &Facet> {
        self.facets.iter()
    }

    /// Number of facets
    pub fn len(&self) -> usize {
        self.facets.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }
}

/// Anything that carries a facet set
pub trait FacetHolder {
    /// The holder's facets
    fn facets(&self) -> &FacetSet;

    /// Typed facet lookup
    fn get<F: FacetMarker>(&self) -> Option<&F> {
        self.facets().get::<F>()
    }

    /// Whether a kind is present
    fn contains_facet(&self, kind: FacetKind) -> bool {
        self.facets().contains(kind)
    }

    /// Facet manifest
    fn facet_kinds(&self) -> Vec<FacetKind> {
        self.facets().kinds()
    }
}

impl FacetHolder for FacetSet {
    fn facets(&self) -> &FacetSet {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facet::{DescribedAsFacet, HiddenFacet, NamedFacet};
    use crate::reflect::WhenTo;

    #[test]
    fn test_add_replaces_in_place() {
        let mut set = FacetSet::new();
        set.add(NamedFacet { value: "A".into(), inferred: true });
        set.add(HiddenFacet { when: WhenTo::Never });
        let replaced = set.add(NamedFacet { value: "B".into(), inferred: false });

        assert!(replaced.is_some());
        assert_eq!(set.len(), 2);
        assert_eq!(set.kinds(), vec![FacetKind::Named, FacetKind::Hidden]);
        assert_eq!(set.get::<NamedFacet>().map(|n| n.value.as_str()), Some("B"));
    }

    #[test]
    fn test_add_if_absent_keeps_existing() {
        let mut set = FacetSet::new();
        set.add(DescribedAsFacet { value: "first".into() });
        assert!(!set.add_if_absent(DescribedAsFacet { value: "second".into() }));
        assert_eq!(set.get::<DescribedAsFacet>().map(|d| d.value.as_str()), Some("first"));
    }

    #[test]
    fn test_remove() {
        let mut set = FacetSet::new();
        set.add(HiddenFacet { when: WhenTo::Always });
        assert!(set.remove(FacetKind::Hidden).is_some());
        assert!(set.is_empty());
        assert!(set.remove(FacetKind::Hidden).is_none());
    }
}
