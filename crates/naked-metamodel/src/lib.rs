//! Naked Objects metamodel
//!
//! Builds an immutable description of a domain model from reflection
//! descriptors. The pipeline:
//!
//! 1. `reflect`: assemblies of `TypeInfo` descriptors, indexed by `TypeCatalog`
//! 2. `class_strategy`: which types and methods take part
//! 3. `factory`: ordered facet factories attach facets to specifications
//! 4. `reflector`: drives the factories over every type, sequentially or in parallel
//! 5. `metamodel`: the frozen specification cache, menus and type relations

#![warn(missing_docs)]

pub mod class_strategy;
pub mod config;
pub mod error;
pub mod facet;
pub mod factory;
pub mod menu;
pub mod metamodel;
pub mod reflect;
pub mod reflector;
pub mod spec;

pub use class_strategy::{ClassStrategy, DefaultClassStrategy};
pub use config::ReflectorConfig;
pub use error::{ReflectionError, ReflectionResult};
pub use facet::{Facet, FacetHolder, FacetKind, FacetSet};
pub use factory::{FacetFactory, FacetFactorySet, FeatureType};
pub use menu::{Menu, MenuBuilder, MenuDefinition, MenuItem};
pub use metamodel::{
    ImmutableInMemorySpecCache, Metamodel, MetamodelManager, PartialMetamodel, SpecificationCache,
};
pub use reflect::{AssemblyInfo, DomainModel, MethodId, MethodInfo, PropertyInfo, TypeInfo, TypeRef};
pub use reflector::{ParallelReflector, Reflect, Reflector};
pub use spec::{Identifier, SpecKind, Specification};
