//! Reflection input
//!
//! Descriptors of the domain assemblies the reflector scans, plus the
//! catalog that indexes them.

pub mod attribute;
pub mod catalog;
pub mod introspection;
pub mod types;

pub use attribute::{find_attribute, Attribute, DataType, EagerlyDo, WhenTo, Where};
pub use catalog::TypeCatalog;
pub use introspection::{
    AssemblyInfo, DomainModel, MethodId, MethodInfo, ParameterInfo, PropertyInfo, TypeInfo,
};
pub use types::{PrimitiveType, TypeKind, TypeRef, COLLECTION_GENERICS};
