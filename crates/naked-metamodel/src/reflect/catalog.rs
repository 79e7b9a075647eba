//! Type catalog for reflection
//!
//! Indexes every type of the scanned assemblies by full name and answers the
//! questions reflection would: inherited members, assignability, and whether
//! a type reference is a parseable value.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::introspection::{AssemblyInfo, MethodInfo, PropertyInfo, TypeInfo};
use super::types::{PrimitiveType, TypeKind, TypeRef};

static PRIMITIVE_TYPES: Lazy<FxHashMap<&'static str, Arc<TypeInfo>>> = Lazy::new(|| {
    PrimitiveType::ALL
        .into_iter()
        .map(|p| {
            let mut info = TypeInfo::structure(p.full_name());
            info.kind = TypeKind::Primitive;
            (p.full_name(), Arc::new(info))
        })
        .collect()
});

/// Registry of reflected types, keyed by full name
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: FxHashMap<String, Arc<TypeInfo>>,
    /// Type name to assembly name
    assembly_of: FxHashMap<String, String>,
    /// Scan order of domain types
    order: Vec<String>,
}

impl TypeCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every type of the given assemblies; the first duplicate wins
    pub fn from_assemblies(assemblies: &[AssemblyInfo]) -> Self {
        let mut catalog = Self::new();
        for assembly in assemblies {
            for t in &assembly.types {
                catalog.register(&assembly.name, t.clone());
            }
        }
        catalog
    }

    /// Register a type
    pub fn register(&mut self, assembly: &str, mut type_info: TypeInfo) {
        if self.types.contains_key(&type_info.full_name) {
            log::warn!(
                "type {} declared twice, keeping the first declaration",
                type_info.full_name
            );
            return;
        }
        type_info.normalise();
        let name = type_info.full_name.clone();
        self.assembly_of.insert(name.clone(), assembly.to_string());
        self.order.push(name.clone());
        self.types.insert(name, Arc::new(type_info));
    }

    /// Look up a type; primitives resolve to synthesised value types
    pub fn get(&self, name: &str) -> Option<Arc<TypeInfo>> {
        self.types
            .get(name)
            .cloned()
            .or_else(|| PRIMITIVE_TYPES.get(name).cloned())
    }

    /// Whether a type name is known
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name) || PRIMITIVE_TYPES.contains_key(name)
    }

    /// Whether every type a reference mentions is known
    pub fn resolves(&self, type_ref: &TypeRef) -> Result<(), String> {
        for name in type_ref.referenced_spec_names() {
            if !self.contains(&name) {
                return Err(name);
            }
        }
        Ok(())
    }

    /// Assembly a type was declared in
    pub fn assembly_of(&self, name: &str) -> Option<&str> {
        self.assembly_of.get(name).map(String::as_str)
    }

    /// Domain types in scan order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TypeInfo>> {
        self.order.iter().filter_map(|n| self.types.get(n))
    }

    /// Number of domain types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the catalog has no domain types
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Whether the reference is a value the framework can parse from text
    pub fn is_parseable(&self, type_ref: &TypeRef) -> bool {
        match type_ref {
            TypeRef::Primitive(_) => true,
            TypeRef::Named(name) => self
                .types
                .get(name)
                .map(|t| t.kind == TypeKind::Enum)
                .unwrap_or(false),
            TypeRef::Generic { .. } if !type_ref.is_collection() => type_ref
                .spec_name()
                .map(|n| PRIMITIVE_TYPES.contains_key(n.as_str()))
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Superclasses of a type, nearest first
    pub fn superclass_chain(&self, name: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = self.types.get(name).and_then(|t| t.superclass.clone());
        while let Some(sup) = current {
            if chain.contains(&sup) {
                break;
            }
            current = self.types.get(&sup).and_then(|t| t.superclass.clone());
            chain.push(sup);
        }
        chain
    }

    /// Whether a value of `sub` can be used where `sup` is expected
    pub fn is_assignable(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }
        let mut stack = vec![sub.to_string()];
        let mut seen: Vec<String> = Vec::new();
        while let Some(current) = stack.pop() {
            if current == sup {
                return true;
            }
            if seen.contains(&current) {
                continue;
            }
            if let Some(t) = self.types.get(&current) {
                stack.extend(t.superclass.iter().cloned());
                stack.extend(t.interfaces.iter().cloned());
            }
            seen.push(current);
        }
        false
    }

    /// Declared and inherited methods; a redeclared signature hides the inherited one
    pub fn all_methods(&self, name: &str) -> Vec<MethodInfo> {
        let mut methods: Vec<MethodInfo> = Vec::new();
        let mut chain = vec![name.to_string()];
        chain.extend(self.superclass_chain(name));
        for type_name in chain {
            let Some(t) = self.types.get(&type_name) else {
                continue;
            };
            for method in &t.methods {
                let hidden = methods
                    .iter()
                    .any(|m| m.has_signature(&method.name, &method.parameter_types()));
                if !hidden {
                    methods.push(method.clone());
                }
            }
        }
        methods
    }

    /// Declared and inherited properties; a redeclared name hides the inherited one
    pub fn all_properties(&self, name: &str) -> Vec<PropertyInfo> {
        let mut properties: Vec<PropertyInfo> = Vec::new();
        let mut chain = vec![name.to_string()];
        chain.extend(self.superclass_chain(name));
        for type_name in chain {
            let Some(t) = self.types.get(&type_name) else {
                continue;
            };
            for property in &t.properties {
                if !properties.iter().any(|p| p.name == property.name) {
                    properties.push(property.clone());
                }
            }
        }
        properties
    }

    /// Direct subclasses and implementors of a type
    pub fn direct_subtypes(&self, name: &str) -> Vec<String> {
        self.iter()
            .filter(|t| {
                t.superclass.as_deref() == Some(name) || t.interfaces.iter().any(|i| i == name)
            })
            .map(|t| t.full_name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TypeCatalog {
        let assembly = AssemblyInfo::new("Shop")
            .with_type(TypeInfo::interface("Shop.IParty"))
            .with_type(
                TypeInfo::class("Shop.Person")
                    .implements("Shop.IParty")
                    .property(PropertyInfo::new("Name", TypeRef::string()))
                    .method(MethodInfo::new("Greet", TypeRef::Void)),
            )
            .with_type(
                TypeInfo::class("Shop.Customer")
                    .extends("Shop.Person")
                    .method(MethodInfo::new("Greet", TypeRef::Void))
                    .method(MethodInfo::new("Order", TypeRef::Void)),
            )
            .with_type(TypeInfo::enumeration("Shop.Status", &["Open", "Closed"]));
        TypeCatalog::from_assemblies(&[assembly])
    }

    #[test]
    fn test_assignability() {
        let c = catalog();
        assert!(c.is_assignable("Shop.Customer", "Shop.Person"));
        assert!(c.is_assignable("Shop.Customer", "Shop.IParty"));
        assert!(!c.is_assignable("Shop.Person", "Shop.Customer"));
        assert_eq!(c.superclass_chain("Shop.Customer"), vec!["Shop.Person".to_string()]);
    }

    #[test]
    fn test_inherited_members() {
        let c = catalog();
        let methods = c.all_methods("Shop.Customer");
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].declaring_type, "Shop.Customer");
        let properties = c.all_properties("Shop.Customer");
        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0].declaring_type, "Shop.Person");
    }

    #[test]
    fn test_parseable_and_primitives() {
        let c = catalog();
        assert!(c.is_parseable(&TypeRef::named("Shop.Status")));
        assert!(c.is_parseable(&TypeRef::string()));
        assert!(!c.is_parseable(&TypeRef::named("Shop.Customer")));
        assert!(c.contains("System.Int32"));
        assert_eq!(
            c.get("System.Int32").map(|t| t.kind),
            Some(TypeKind::Primitive)
        );
        assert_eq!(c.resolves(&TypeRef::named("Shop.Missing")), Err("Shop.Missing".to_string()));
    }
}
