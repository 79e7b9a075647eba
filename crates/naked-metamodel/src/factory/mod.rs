//! Facet factories
//!
//! Each factory implements `FacetFactory` and provides static metadata
//! (`FactoryMeta`) plus whichever `process_*` hooks it needs. The default
//! hooks pass the partial metamodel through unchanged, so a factory only
//! overrides the element kinds it cares about.
//!
//! Factories run in ascending `numeric_order`. The standard order lives in
//! one table (`registry::standard_facet_factories`); annotation factories
//! appear after the convention factories they override.

pub mod actions;
pub mod annotation;
pub mod collections;
pub mod conventions;
pub mod filtering;
pub mod method_set;
pub mod naming;
pub mod object;
pub mod properties;
pub mod registry;
pub mod type_of;

#[cfg(test)]
pub(crate) mod test_support;

use std::fmt;
use std::ops::BitOr;

pub use method_set::{MethodRemover, MethodSet, MethodState};
pub use registry::{
    register_replacement, standard_facet_factories, standard_index_of, FacetFactorySet,
};

use crate::class_strategy::ClassStrategy;
use crate::config::ReflectorConfig;
use crate::error::ReflectionResult;
use crate::metamodel::PartialMetamodel;
use crate::reflect::{MethodInfo, PropertyInfo, TypeCatalog, TypeInfo, TypeRef};
use crate::spec::Specification;

/// Bit set of reflected element kinds a factory processes
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FeatureType(u8);

impl FeatureType {
    /// Nothing
    pub const NONE: FeatureType = FeatureType(0);
    /// Object types
    pub const OBJECTS: FeatureType = FeatureType(1);
    /// Interfaces
    pub const INTERFACES: FeatureType = FeatureType(1 << 1);
    /// Properties
    pub const PROPERTIES: FeatureType = FeatureType(1 << 2);
    /// Collections
    pub const COLLECTIONS: FeatureType = FeatureType(1 << 3);
    /// Actions
    pub const ACTIONS: FeatureType = FeatureType(1 << 4);
    /// Action parameters
    pub const ACTION_PARAMETERS: FeatureType = FeatureType(1 << 5);

    /// Objects and interfaces
    pub const OBJECTS_AND_INTERFACES: FeatureType = FeatureType(0b11);
    /// Properties and collections
    pub const PROPERTIES_AND_COLLECTIONS: FeatureType = FeatureType(0b1100);
    /// Properties, collections and actions
    pub const MEMBERS: FeatureType = FeatureType(0b1_1100);
    /// Properties and parameters
    pub const PROPERTIES_AND_ACTION_PARAMETERS: FeatureType = FeatureType(0b10_0100);
    /// Actions and parameters
    pub const ACTIONS_AND_ACTION_PARAMETERS: FeatureType = FeatureType(0b11_0000);
    /// Everything except parameters
    pub const EVERYTHING_BUT_PARAMETERS: FeatureType = FeatureType(0b1_1111);
    /// Everything
    pub const EVERYTHING: FeatureType = FeatureType(0b11_1111);

    /// Union of two sets
    pub const fn union(self, other: FeatureType) -> FeatureType {
        FeatureType(self.0 | other.0)
    }

    /// Whether any bit of `other` is set
    pub const fn intersects(self, other: FeatureType) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether every bit of `other` is set
    pub const fn contains(self, other: FeatureType) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for FeatureType {
    type Output = FeatureType;

    fn bitor(self, rhs: FeatureType) -> FeatureType {
        self.union(rhs)
    }
}

impl fmt::Debug for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(FeatureType, &str); 6] = [
            (FeatureType::OBJECTS, "Objects"),
            (FeatureType::INTERFACES, "Interfaces"),
            (FeatureType::PROPERTIES, "Properties"),
            (FeatureType::COLLECTIONS, "Collections"),
            (FeatureType::ACTIONS, "Actions"),
            (FeatureType::ACTION_PARAMETERS, "ActionParameters"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            f.write_str("None")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// Static metadata for a factory
#[derive(Debug)]
pub struct FactoryMeta {
    /// Factory name, e.g. "HiddenAnnotation"
    pub name: &'static str,
    /// Element kinds processed
    pub feature_types: FeatureType,
    /// Method-name prefixes this factory recognises
    pub prefixes: &'static [&'static str],
}

/// What factories can see of the type being introspected
pub struct FactoryContext<'a> {
    /// Every scanned type
    pub catalog: &'a TypeCatalog,
    /// Active class strategy
    pub class_strategy: &'a dyn ClassStrategy,
    /// Reflector configuration
    pub config: &'a ReflectorConfig,
    /// Type being introspected
    pub type_info: &'a TypeInfo,
    /// Methods visible on the type (declared and inherited, filtered)
    pub methods: &'a [MethodInfo],
    /// Properties visible on the type
    pub properties: &'a [PropertyInfo],
}

impl<'a> FactoryContext<'a> {
    /// Full name of the type being introspected
    pub fn owner(&self) -> &str {
        &self.type_info.full_name
    }

    /// Method with an exact name and parameter list
    pub fn find_method(&self, name: &str, parameter_types: &[TypeRef]) -> Option<&'a MethodInfo> {
        self.methods
            .iter()
            .find(|m| m.has_signature(name, parameter_types))
    }

    /// Methods with a given name, any signature
    pub fn find_methods_named(&self, name: &str) -> Vec<&'a MethodInfo> {
        self.methods.iter().filter(|m| m.name == name).collect()
    }

    /// Instance method with a given name and return type, any parameters
    pub fn find_method_returning(&self, name: &str, return_type: &TypeRef) -> Option<&'a MethodInfo> {
        self.methods
            .iter()
            .find(|m| m.name == name && !m.is_static && &m.return_type == return_type)
    }

    /// Whether a reference names a parseable value
    pub fn is_parseable(&self, type_ref: &TypeRef) -> bool {
        self.catalog.is_parseable(type_ref)
    }
}

/// An orderable rule that attaches facets to specifications
///
/// Factories are stateless apart from their order: the result depends only
/// on the element, the specification under construction, and the partial
/// metamodel, which is threaded through and returned.
pub trait FacetFactory: Send + Sync {
    /// Static metadata
    fn meta(&self) -> &FactoryMeta;

    /// Position in the factory chain; lower runs first
    fn numeric_order(&self) -> usize;

    /// Factory name
    fn name(&self) -> &'static str {
        self.meta().name
    }

    /// Element kinds processed
    fn feature_types(&self) -> FeatureType {
        self.meta().feature_types
    }

    /// Recognised method prefixes
    fn prefixes(&self) -> &'static [&'static str] {
        self.meta().prefixes
    }

    /// Whether a method must never become an action
    fn filters(&self, _method: &MethodInfo, _ctx: &FactoryContext<'_>) -> bool {
        false
    }

    /// Process an object type or interface
    fn process_type(
        &self,
        _ctx: &FactoryContext<'_>,
        _remover: &mut dyn MethodRemover,
        _spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        Ok(metamodel)
    }

    /// Process a property or collection
    fn process_property(
        &self,
        _ctx: &FactoryContext<'_>,
        _property: &PropertyInfo,
        _remover: &mut dyn MethodRemover,
        _spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        Ok(metamodel)
    }

    /// Process an action method
    fn process_method(
        &self,
        _ctx: &FactoryContext<'_>,
        _method: &MethodInfo,
        _remover: &mut dyn MethodRemover,
        _spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        Ok(metamodel)
    }

    /// Process one parameter of an action method
    fn process_params(
        &self,
        _ctx: &FactoryContext<'_>,
        _method: &MethodInfo,
        _index: usize,
        _spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        Ok(metamodel)
    }
}
