//! Reflection descriptors for domain assemblies
//!
//! These values stand in for runtime reflection: a domain model is described
//! as assemblies of types, each carrying its properties, methods, parameters
//! and annotations. They can be built in code with the builder methods or
//! loaded from JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::attribute::Attribute;
use super::types::{TypeKind, TypeRef};

/// Stable identifier of a reflected method: `Declaring.Type::Name(ParamType,...)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodId(String);

impl MethodId {
    /// Build an id from its parts
    pub fn new(declaring_type: &str, name: &str, parameter_types: &[TypeRef]) -> Self {
        let params: Vec<String> = parameter_types.iter().map(|t| t.to_string()).collect();
        MethodId(format!("{}::{}({})", declaring_type, name, params.join(",")))
    }

    /// Wrap an already formatted id
    pub fn from_raw(raw: impl Into<String>) -> Self {
        MethodId(raw.into())
    }

    /// The id text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Declaring type part
    pub fn declaring_type(&self) -> &str {
        self.0.split("::").next().unwrap_or("")
    }

    /// Method name part
    pub fn method_name(&self) -> &str {
        let rest = self.0.split_once("::").map(|(_, r)| r).unwrap_or(&self.0);
        rest.split('(').next().unwrap_or(rest)
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Method parameter information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterInfo {
    /// Parameter name
    pub name: String,
    /// Position in the parameter list
    #[serde(default)]
    pub index: usize,
    /// Declared type
    pub parameter_type: TypeRef,
    /// Annotations on the parameter
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// `out` parameter
    #[serde(default)]
    pub is_out: bool,
}

impl ParameterInfo {
    /// Create a parameter; the index is assigned when added to a method
    pub fn new(name: impl Into<String>, parameter_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            index: 0,
            parameter_type,
            attributes: Vec::new(),
            is_out: false,
        }
    }

    /// Add an annotation
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Mark as an `out` parameter
    pub fn out(mut self) -> Self {
        self.is_out = true;
        self
    }
}

/// Method information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodInfo {
    /// Method name
    pub name: String,
    /// Declaring type (filled in when the type is normalised)
    #[serde(default)]
    pub declaring_type: String,
    /// Return type
    #[serde(default)]
    pub return_type: TypeRef,
    /// Parameters in order
    #[serde(default)]
    pub parameters: Vec<ParameterInfo>,
    /// Annotations on the method
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Static method
    #[serde(default)]
    pub is_static: bool,
    /// Public visibility
    #[serde(default = "public")]
    pub is_public: bool,
    /// Open generic method
    #[serde(default)]
    pub is_generic: bool,
}

fn public() -> bool {
    true
}

impl MethodInfo {
    /// Create a public instance method
    pub fn new(name: impl Into<String>, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            declaring_type: String::new(),
            return_type,
            parameters: Vec::new(),
            attributes: Vec::new(),
            is_static: false,
            is_public: true,
            is_generic: false,
        }
    }

    /// Append a parameter
    pub fn param(self, name: impl Into<String>, parameter_type: TypeRef) -> Self {
        self.param_with(ParameterInfo::new(name, parameter_type))
    }

    /// Append a fully described parameter
    pub fn param_with(mut self, mut parameter: ParameterInfo) -> Self {
        parameter.index = self.parameters.len();
        self.parameters.push(parameter);
        self
    }

    /// Add an annotation
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Mark as static
    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as non-public
    pub fn private(mut self) -> Self {
        self.is_public = false;
        self
    }

    /// Mark as an open generic method
    pub fn generic(mut self) -> Self {
        self.is_generic = true;
        self
    }

    /// Parameter types in order
    pub fn parameter_types(&self) -> Vec<TypeRef> {
        self.parameters.iter().map(|p| p.parameter_type.clone()).collect()
    }

    /// Stable id
    pub fn id(&self) -> MethodId {
        MethodId::new(&self.declaring_type, &self.name, &self.parameter_types())
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Exact signature match
    pub fn has_signature(&self, name: &str, parameter_types: &[TypeRef]) -> bool {
        self.name == name
            && self.parameters.len() == parameter_types.len()
            && self
                .parameters
                .iter()
                .zip(parameter_types)
                .all(|(p, t)| &p.parameter_type == t)
    }
}

/// Property information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInfo {
    /// Property name
    pub name: String,
    /// Declaring type (filled in when the type is normalised)
    #[serde(default)]
    pub declaring_type: String,
    /// Declared type
    pub property_type: TypeRef,
    /// Annotations on the property
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Has a public getter
    #[serde(default = "public")]
    pub has_getter: bool,
    /// Has a public setter
    #[serde(default)]
    pub has_setter: bool,
    /// Static property
    #[serde(default)]
    pub is_static: bool,
}

impl PropertyInfo {
    /// Create a read-only property
    pub fn new(name: impl Into<String>, property_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            declaring_type: String::new(),
            property_type,
            attributes: Vec::new(),
            has_getter: true,
            has_setter: false,
            is_static: false,
        }
    }

    /// Give the property a public setter
    pub fn settable(mut self) -> Self {
        self.has_setter = true;
        self
    }

    /// Add an annotation
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Id of the getter
    pub fn getter_id(&self) -> MethodId {
        MethodId::new(&self.declaring_type, &format!("get_{}", self.name), &[])
    }

    /// Id of the setter
    pub fn setter_id(&self) -> MethodId {
        MethodId::new(
            &self.declaring_type,
            &format!("set_{}", self.name),
            std::slice::from_ref(&self.property_type),
        )
    }
}

/// Type information for one reflected type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeInfo {
    /// Fully qualified name (`Shop.Customer`)
    pub full_name: String,
    /// Type kind
    #[serde(default)]
    pub kind: TypeKind,
    /// Superclass full name
    #[serde(default)]
    pub superclass: Option<String>,
    /// Implemented interfaces
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Type-level annotations
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Declared properties
    #[serde(default)]
    pub properties: Vec<PropertyInfo>,
    /// Declared methods
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
    /// Declared events
    #[serde(default)]
    pub events: Vec<String>,
    /// Enum members (enums only)
    #[serde(default)]
    pub enum_values: Vec<String>,
    /// Abstract type
    #[serde(default)]
    pub is_abstract: bool,
    /// Sealed type
    #[serde(default)]
    pub is_sealed: bool,
    /// Static type
    #[serde(default)]
    pub is_static: bool,
    /// Compiler generated
    #[serde(default)]
    pub is_generated: bool,
}

impl TypeInfo {
    fn with_kind(full_name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            full_name: full_name.into(),
            kind,
            superclass: None,
            interfaces: Vec::new(),
            attributes: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            events: Vec::new(),
            enum_values: Vec::new(),
            is_abstract: false,
            is_sealed: false,
            is_static: false,
            is_generated: false,
        }
    }

    /// Create a class
    pub fn class(full_name: impl Into<String>) -> Self {
        Self::with_kind(full_name, TypeKind::Class)
    }

    /// Create an interface
    pub fn interface(full_name: impl Into<String>) -> Self {
        let mut t = Self::with_kind(full_name, TypeKind::Interface);
        t.is_abstract = true;
        t
    }

    /// Create an enum
    pub fn enumeration(full_name: impl Into<String>, values: &[&str]) -> Self {
        let mut t = Self::with_kind(full_name, TypeKind::Enum);
        t.enum_values = values.iter().map(|v| v.to_string()).collect();
        t.is_sealed = true;
        t
    }

    /// Create a struct
    pub fn structure(full_name: impl Into<String>) -> Self {
        let mut t = Self::with_kind(full_name, TypeKind::Struct);
        t.is_sealed = true;
        t
    }

    /// Set the superclass
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Add an implemented interface
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Add a type-level annotation
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add a property
    pub fn property(mut self, mut property: PropertyInfo) -> Self {
        property.declaring_type = self.full_name.clone();
        self.properties.push(property);
        self
    }

    /// Add a method
    pub fn method(mut self, mut method: MethodInfo) -> Self {
        method.declaring_type = self.full_name.clone();
        self.methods.push(method);
        self
    }

    /// Add an event
    pub fn event(mut self, name: impl Into<String>) -> Self {
        self.events.push(name.into());
        self
    }

    /// Mark abstract
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Mark compiler generated
    pub fn generated(mut self) -> Self {
        self.is_generated = true;
        self
    }

    /// Short name after the last `.`
    pub fn name(&self) -> &str {
        self.full_name.rsplit('.').next().unwrap_or(&self.full_name)
    }

    /// Namespace before the last `.`
    pub fn namespace(&self) -> &str {
        self.full_name
            .rsplit_once('.')
            .map(|(ns, _)| ns)
            .unwrap_or("")
    }

    /// Fill in declaring types and parameter indices after deserialisation
    pub fn normalise(&mut self) {
        for property in &mut self.properties {
            if property.declaring_type.is_empty() {
                property.declaring_type = self.full_name.clone();
            }
        }
        for method in &mut self.methods {
            if method.declaring_type.is_empty() {
                method.declaring_type = self.full_name.clone();
            }
            for (i, parameter) in method.parameters.iter_mut().enumerate() {
                parameter.index = i;
            }
        }
    }

    /// Look up a declared method by name and parameter types
    pub fn find_method(&self, name: &str, parameter_types: &[TypeRef]) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.has_signature(name, parameter_types))
    }

    /// Look up a declared property
    pub fn find_property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Returns true for interfaces
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }
}

/// A named group of types, the unit the reflector scans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyInfo {
    /// Assembly name
    pub name: String,
    /// Types in the assembly
    #[serde(default)]
    pub types: Vec<TypeInfo>,
}

impl AssemblyInfo {
    /// Create an empty assembly
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
        }
    }

    /// Add a type
    pub fn with_type(mut self, type_info: TypeInfo) -> Self {
        self.types.push(type_info);
        self
    }

    /// Normalise every type
    pub fn normalise(&mut self) {
        for t in &mut self.types {
            t.normalise();
        }
    }
}

/// A serialised domain model: every assembly to scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainModel {
    /// Assemblies in scan order
    pub assemblies: Vec<AssemblyInfo>,
}

impl DomainModel {
    /// Parse a model from JSON and normalise it
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut model: DomainModel = serde_json::from_str(json)?;
        for assembly in &mut model.assemblies {
            assembly.normalise();
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::types::PrimitiveType;

    #[test]
    fn test_method_id_parts() {
        let id = MethodId::new(
            "Shop.Customer",
            "PlaceOrder",
            &[TypeRef::named("Shop.Product"), TypeRef::Primitive(PrimitiveType::Int32)],
        );
        assert_eq!(id.as_str(), "Shop.Customer::PlaceOrder(Shop.Product,System.Int32)");
        assert_eq!(id.declaring_type(), "Shop.Customer");
        assert_eq!(id.method_name(), "PlaceOrder");
    }

    #[test]
    fn test_builder_sets_declaring_type_and_indices() {
        let t = TypeInfo::class("Shop.Customer")
            .property(PropertyInfo::new("Name", TypeRef::string()).settable())
            .method(
                MethodInfo::new("Rename", TypeRef::Void)
                    .param("first", TypeRef::string())
                    .param("last", TypeRef::string()),
            );
        assert_eq!(t.properties[0].declaring_type, "Shop.Customer");
        assert_eq!(t.methods[0].parameters[1].index, 1);
        assert_eq!(t.properties[0].getter_id().as_str(), "Shop.Customer::get_Name()");
        assert_eq!(t.name(), "Customer");
        assert_eq!(t.namespace(), "Shop");
    }

    #[test]
    fn test_domain_model_from_json() {
        let json = r#"{
            "assemblies": [{
                "name": "Shop",
                "types": [{
                    "full_name": "Shop.Customer",
                    "properties": [{"name": "Name", "property_type": {"Primitive": "String"}}],
                    "methods": [{"name": "Act", "parameters": [{"name": "x", "parameter_type": {"Named": "Shop.Product"}}]}]
                }]
            }]
        }"#;
        let model = DomainModel::from_json(json).expect("valid model");
        let customer = &model.assemblies[0].types[0];
        assert_eq!(customer.methods[0].declaring_type, "Shop.Customer");
        assert!(customer.methods[0].return_type.is_void());
        assert!(customer.methods[0].is_public);
        assert!(customer.properties[0].has_getter);
    }
}
