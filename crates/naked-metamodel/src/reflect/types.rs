//! Type references used by reflected members
//!
//! A `TypeRef` names the type of a property, parameter or return value.
//! Value types resolve to synthesised specs keyed by their CLR-style full
//! name (`System.Int32`), named types resolve to domain specs, and arrays
//! or the known generic collection shapes resolve to collection members.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic type names recognised as collections
pub const COLLECTION_GENERICS: &[&str] = &[
    "List",
    "IList",
    "ICollection",
    "IEnumerable",
    "ISet",
    "HashSet",
    "IQueryable",
];

/// Built-in value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrimitiveType {
    /// Boolean
    Bool,
    /// Unsigned 8-bit integer
    Byte,
    /// Single character
    Char,
    /// 16-bit integer
    Int16,
    /// 32-bit integer
    Int32,
    /// 64-bit integer
    Int64,
    /// 32-bit float
    Single,
    /// 64-bit float
    Double,
    /// Decimal number
    Decimal,
    /// Text
    String,
    /// Date and time
    DateTime,
    /// Globally unique identifier
    Guid,
}

impl PrimitiveType {
    /// Every primitive, in declaration order
    pub const ALL: [PrimitiveType; 12] = [
        PrimitiveType::Bool,
        PrimitiveType::Byte,
        PrimitiveType::Char,
        PrimitiveType::Int16,
        PrimitiveType::Int32,
        PrimitiveType::Int64,
        PrimitiveType::Single,
        PrimitiveType::Double,
        PrimitiveType::Decimal,
        PrimitiveType::String,
        PrimitiveType::DateTime,
        PrimitiveType::Guid,
    ];

    /// Stable full name, used as the spec key of the value type
    pub fn full_name(self) -> &'static str {
        match self {
            PrimitiveType::Bool => "System.Boolean",
            PrimitiveType::Byte => "System.Byte",
            PrimitiveType::Char => "System.Char",
            PrimitiveType::Int16 => "System.Int16",
            PrimitiveType::Int32 => "System.Int32",
            PrimitiveType::Int64 => "System.Int64",
            PrimitiveType::Single => "System.Single",
            PrimitiveType::Double => "System.Double",
            PrimitiveType::Decimal => "System.Decimal",
            PrimitiveType::String => "System.String",
            PrimitiveType::DateTime => "System.DateTime",
            PrimitiveType::Guid => "System.Guid",
        }
    }

    /// Look up a primitive by its full name
    pub fn from_full_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.full_name() == name)
    }

    /// Integer and floating point types
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            PrimitiveType::Byte
                | PrimitiveType::Int16
                | PrimitiveType::Int32
                | PrimitiveType::Int64
                | PrimitiveType::Single
                | PrimitiveType::Double
                | PrimitiveType::Decimal
        )
    }

    /// Strings are reference types: optional by default, never collections
    pub fn is_string(self) -> bool {
        self == PrimitiveType::String
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}

/// The declared type of a property, parameter or return value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TypeRef {
    /// No value (`void` return)
    #[default]
    Void,
    /// A built-in value type
    Primitive(PrimitiveType),
    /// A domain type (class, interface, enum or struct) by full name
    Named(String),
    /// Array of an element type
    Array(Box<TypeRef>),
    /// Generic instantiation, e.g. `IList<Shop.Order>`
    Generic {
        /// Generic type name without arity (`IList`)
        name: String,
        /// Type arguments
        args: Vec<TypeRef>,
    },
}

impl TypeRef {
    /// A named domain type
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    /// An array of `element`
    pub fn array(element: TypeRef) -> Self {
        TypeRef::Array(Box::new(element))
    }

    /// A generic instantiation
    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Generic {
            name: name.into(),
            args,
        }
    }

    /// `IList<element>`
    pub fn list_of(element: TypeRef) -> Self {
        Self::generic("IList", vec![element])
    }

    /// `IQueryable<element>`
    pub fn queryable_of(element: TypeRef) -> Self {
        Self::generic("IQueryable", vec![element])
    }

    /// `System.String`
    pub fn string() -> Self {
        TypeRef::Primitive(PrimitiveType::String)
    }

    /// Returns true for `void`
    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    /// Returns true for arrays and the recognised generic collection shapes
    pub fn is_collection(&self) -> bool {
        match self {
            TypeRef::Array(_) => true,
            TypeRef::Generic { name, args } => {
                args.len() == 1 && COLLECTION_GENERICS.contains(&name.as_str())
            }
            _ => false,
        }
    }

    /// Returns true for `IQueryable<T>`
    pub fn is_queryable(&self) -> bool {
        matches!(self, TypeRef::Generic { name, .. } if name == "IQueryable")
    }

    /// Returns true for `ISet<T>` and `HashSet<T>`
    pub fn is_set(&self) -> bool {
        matches!(self, TypeRef::Generic { name, .. } if name == "ISet" || name == "HashSet")
    }

    /// Returns true for `T[]`
    pub fn is_array(&self) -> bool {
        matches!(self, TypeRef::Array(_))
    }

    /// The primitive, if this is a value type
    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            TypeRef::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    /// Element type of a collection shape
    pub fn element_type(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array(element) => Some(element),
            TypeRef::Generic { args, .. } if self.is_collection() => args.first(),
            _ => None,
        }
    }

    /// Spec key for this type; `None` for void and collections
    pub fn spec_name(&self) -> Option<String> {
        match self {
            TypeRef::Void => None,
            TypeRef::Primitive(p) => Some(p.full_name().to_string()),
            TypeRef::Named(name) => Some(name.clone()),
            TypeRef::Array(_) => None,
            TypeRef::Generic { name, args } => {
                if self.is_collection() {
                    None
                } else {
                    // Non-collection generics (Nullable<T>) reflect as their argument
                    args.first()
                        .and_then(|a| a.spec_name())
                        .or_else(|| Some(name.clone()))
                }
            }
        }
    }

    /// Every spec key this type mentions, collections unwrapped
    pub fn referenced_spec_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, out: &mut Vec<String>) {
        match self {
            TypeRef::Void => {}
            TypeRef::Primitive(p) => out.push(p.full_name().to_string()),
            TypeRef::Named(name) => out.push(name.clone()),
            TypeRef::Array(element) => element.collect_names(out),
            TypeRef::Generic { args, .. } => {
                for arg in args {
                    arg.collect_names(out);
                }
            }
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => f.write_str("System.Void"),
            TypeRef::Primitive(p) => write!(f, "{}", p),
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::Array(element) => write!(f, "{}[]", element),
            TypeRef::Generic { name, args } => {
                write!(f, "{}<", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
        }
    }
}

impl From<PrimitiveType> for TypeRef {
    fn from(p: PrimitiveType) -> Self {
        TypeRef::Primitive(p)
    }
}

/// Kind of a reflected type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TypeKind {
    /// Reference class
    #[default]
    Class,
    /// Interface
    Interface,
    /// Enumeration
    Enum,
    /// Value struct
    Struct,
    /// Built-in value type
    Primitive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_shapes() {
        let list = TypeRef::list_of(TypeRef::named("Shop.Order"));
        assert!(list.is_collection());
        assert!(!list.is_queryable());
        assert_eq!(list.element_type(), Some(&TypeRef::named("Shop.Order")));

        let arr = TypeRef::array(TypeRef::Primitive(PrimitiveType::Int32));
        assert!(arr.is_collection());
        assert!(arr.is_array());

        assert!(!TypeRef::string().is_collection());
        assert!(!TypeRef::generic("Nullable", vec![TypeRef::Primitive(PrimitiveType::Int32)]).is_collection());
    }

    #[test]
    fn test_spec_names() {
        assert_eq!(TypeRef::Primitive(PrimitiveType::Int32).spec_name().as_deref(), Some("System.Int32"));
        assert_eq!(TypeRef::Void.spec_name(), None);
        assert_eq!(TypeRef::queryable_of(TypeRef::named("A")).spec_name(), None);
        assert_eq!(
            TypeRef::generic("Nullable", vec![TypeRef::Primitive(PrimitiveType::Int32)]).spec_name().as_deref(),
            Some("System.Int32")
        );
        assert_eq!(
            TypeRef::generic("IDictionary", vec![TypeRef::string(), TypeRef::named("A")]).referenced_spec_names(),
            vec!["System.String".to_string(), "A".to_string()]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(TypeRef::list_of(TypeRef::named("A.B")).to_string(), "IList<A.B>");
        assert_eq!(TypeRef::array(TypeRef::string()).to_string(), "System.String[]");
    }

    #[test]
    fn test_primitive_lookup() {
        for p in PrimitiveType::ALL {
            assert_eq!(PrimitiveType::from_full_name(p.full_name()), Some(p));
        }
        assert_eq!(PrimitiveType::from_full_name("Shop.Customer"), None);
    }
}
