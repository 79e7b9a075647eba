//! Specifications: the introspected description of types and members
//!
//! One record shape serves every kind of holder. The identifier and facet
//! set are common; kind-specific data lives in `SpecPayload`. Specifications
//! are built mutably during reflection and shared behind `Arc` once the
//! metamodel is frozen, after which nothing can mutate them.

pub mod identifier;

use serde::Serialize;
use std::sync::Arc;

pub use identifier::Identifier;

use crate::facet::{
    DescribedAsFacet, Facet, FacetHolder, FacetKind, FacetSet, NamedFacet, PluralFacet,
};
use crate::reflect::{MethodId, MethodInfo, ParameterInfo, PropertyInfo, TypeInfo, TypeKind, TypeRef};

/// Kind of specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SpecKind {
    /// Object type
    Object,
    /// Scalar or reference property
    Property,
    /// Collection property
    Collection,
    /// Action
    Action,
    /// Action parameter
    Parameter,
}

/// Object-type data
#[derive(Debug, Clone, Serialize)]
pub struct ObjectPayload {
    /// Full type name
    pub full_name: String,
    /// Short type name
    pub short_name: String,
    /// Type kind
    pub type_kind: TypeKind,
    /// Superclass, if reflected
    pub superclass: Option<String>,
    /// Implemented interfaces
    pub interfaces: Vec<String>,
    /// Direct subclasses and implementors, filled by the completion pass
    pub subclasses: Vec<String>,
    /// Properties and collections in member order
    pub fields: Vec<Arc<Specification>>,
    /// Declared actions in member order
    pub actions: Vec<Arc<Specification>>,
    /// Service actions contributed to this type
    pub contributed_actions: Vec<Arc<Specification>>,
    /// Service actions offered from this type's finder menu
    pub finder_actions: Vec<Arc<Specification>>,
    /// Registered as a service
    pub is_service: bool,
}

/// Property or collection data
#[derive(Debug, Clone, Serialize)]
pub struct AssociationPayload {
    /// Member name
    pub name: String,
    /// Owning type
    pub owner: String,
    /// Declared type
    pub value_type: TypeRef,
}

/// Action data
#[derive(Debug, Clone, Serialize)]
pub struct ActionPayload {
    /// Member name
    pub name: String,
    /// Declaring type
    pub owner: String,
    /// Underlying method
    pub method: MethodId,
    /// Declared return type
    pub return_type: TypeRef,
    /// Parameters in order
    pub parameters: Vec<Arc<Specification>>,
    /// Static method
    pub is_static: bool,
}

/// Action parameter data
#[derive(Debug, Clone, Serialize)]
pub struct ParameterPayload {
    /// Parameter name
    pub name: String,
    /// Position
    pub index: usize,
    /// Declared type
    pub parameter_type: TypeRef,
    /// Owning action name
    pub action: String,
}

/// Kind-specific data
#[derive(Debug, Clone, Serialize)]
pub enum SpecPayload {
    /// Object type
    Object(ObjectPayload),
    /// Property
    Property(AssociationPayload),
    /// Collection
    Collection(AssociationPayload),
    /// Action
    Action(ActionPayload),
    /// Parameter
    Parameter(ParameterPayload),
}

/// The description of one type or member
#[derive(Debug, Clone, Serialize)]
pub struct Specification {
    identifier: Identifier,
    facets: FacetSet,
    payload: SpecPayload,
}

impl Specification {
    /// Object-type skeleton
    pub fn object(type_info: &TypeInfo) -> Self {
        Self {
            identifier: Identifier::for_type(&type_info.full_name),
            facets: FacetSet::new(),
            payload: SpecPayload::Object(ObjectPayload {
                full_name: type_info.full_name.clone(),
                short_name: type_info.name().to_string(),
                type_kind: type_info.kind,
                superclass: type_info.superclass.clone(),
                interfaces: type_info.interfaces.clone(),
                subclasses: Vec::new(),
                fields: Vec::new(),
                actions: Vec::new(),
                contributed_actions: Vec::new(),
                finder_actions: Vec::new(),
                is_service: false,
            }),
        }
    }

    /// Property skeleton
    pub fn property(property: &PropertyInfo, owner: &str) -> Self {
        Self {
            identifier: Identifier::for_field(owner, &property.name),
            facets: FacetSet::new(),
            payload: SpecPayload::Property(AssociationPayload {
                name: property.name.clone(),
                owner: owner.to_string(),
                value_type: property.property_type.clone(),
            }),
        }
    }

    /// Collection skeleton
    pub fn collection(property: &PropertyInfo, owner: &str) -> Self {
        Self {
            identifier: Identifier::for_field(owner, &property.name),
            facets: FacetSet::new(),
            payload: SpecPayload::Collection(AssociationPayload {
                name: property.name.clone(),
                owner: owner.to_string(),
                value_type: property.property_type.clone(),
            }),
        }
    }

    /// Action skeleton with one parameter skeleton per method parameter
    pub fn action(method: &MethodInfo, owner: &str) -> Self {
        let identifier = Identifier::for_action(
            owner,
            &method.name,
            method.parameters.iter().map(|p| p.parameter_type.to_string()).collect(),
        );
        let parameters = method
            .parameters
            .iter()
            .map(|p| Arc::new(Self::parameter(p, &identifier, &method.name)))
            .collect();
        Self {
            identifier,
            facets: FacetSet::new(),
            payload: SpecPayload::Action(ActionPayload {
                name: method.name.clone(),
                owner: owner.to_string(),
                method: method.id(),
                return_type: method.return_type.clone(),
                parameters,
                is_static: method.is_static,
            }),
        }
    }

    fn parameter(parameter: &ParameterInfo, action: &Identifier, action_name: &str) -> Self {
        Self {
            identifier: Identifier::for_parameter(action, parameter.index),
            facets: FacetSet::new(),
            payload: SpecPayload::Parameter(ParameterPayload {
                name: parameter.name.clone(),
                index: parameter.index,
                parameter_type: parameter.parameter_type.clone(),
                action: action_name.to_string(),
            }),
        }
    }

    // ------------------------------------------------------------------------
    // Common accessors
    // ------------------------------------------------------------------------

    /// Identifier
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Kind
    pub fn kind(&self) -> SpecKind {
        match &self.payload {
            SpecPayload::Object(_) => SpecKind::Object,
            SpecPayload::Property(_) => SpecKind::Property,
            SpecPayload::Collection(_) => SpecKind::Collection,
            SpecPayload::Action(_) => SpecKind::Action,
            SpecPayload::Parameter(_) => SpecKind::Parameter,
        }
    }

    /// Kind-specific data
    pub fn payload(&self) -> &SpecPayload {
        &self.payload
    }

    /// Mutable facets, for factories
    pub fn facets_mut(&mut self) -> &mut FacetSet {
        &mut self.facets
    }

    /// Attach a facet, replacing any facet of the same kind
    pub fn add_facet(&mut self, facet: impl Into<Facet>) -> Option<Facet> {
        self.facets.add(facet)
    }

    /// Detach a facet
    pub fn remove_facet(&mut self, kind: FacetKind) -> Option<Facet> {
        self.facets.remove(kind)
    }

    /// Member name, or short type name for objects
    pub fn member_name(&self) -> &str {
        match &self.payload {
            SpecPayload::Object(o) => &o.short_name,
            SpecPayload::Property(a) | SpecPayload::Collection(a) => &a.name,
            SpecPayload::Action(a) => &a.name,
            SpecPayload::Parameter(p) => &p.name,
        }
    }

    /// Display name: the named facet, else the member name
    pub fn name(&self) -> &str {
        self.get::<NamedFacet>()
            .map(|n| n.value.as_str())
            .unwrap_or_else(|| self.member_name())
    }

    /// Description, empty when none
    pub fn description(&self) -> &str {
        self.get::<DescribedAsFacet>()
            .map(|d| d.value.as_str())
            .unwrap_or("")
    }

    /// Plural name of an object type
    pub fn plural_name(&self) -> Option<&str> {
        self.get::<PluralFacet>().map(|p| p.value.as_str())
    }

    // ------------------------------------------------------------------------
    // Object
    // ------------------------------------------------------------------------

    /// Object data
    pub fn as_object(&self) -> Option<&ObjectPayload> {
        match &self.payload {
            SpecPayload::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Mutable object data
    pub fn as_object_mut(&mut self) -> Option<&mut ObjectPayload> {
        match &mut self.payload {
            SpecPayload::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Full type name of an object spec, owner type for members
    pub fn full_name(&self) -> &str {
        self.identifier.type_name()
    }

    /// Fields of an object spec
    pub fn fields(&self) -> &[Arc<Specification>] {
        self.as_object().map(|o| o.fields.as_slice()).unwrap_or(&[])
    }

    /// Field by member name
    pub fn field(&self, name: &str) -> Option<&Arc<Specification>> {
        self.fields().iter().find(|f| f.member_name() == name)
    }

    /// Declared actions of an object spec
    pub fn actions(&self) -> &[Arc<Specification>] {
        self.as_object().map(|o| o.actions.as_slice()).unwrap_or(&[])
    }

    /// Declared action by member name
    pub fn action_named(&self, name: &str) -> Option<&Arc<Specification>> {
        self.actions().iter().find(|a| a.member_name() == name)
    }

    /// Contributed actions of an object spec
    pub fn contributed_actions(&self) -> &[Arc<Specification>] {
        self.as_object()
            .map(|o| o.contributed_actions.as_slice())
            .unwrap_or(&[])
    }

    /// Finder actions of an object spec
    pub fn finder_actions(&self) -> &[Arc<Specification>] {
        self.as_object()
            .map(|o| o.finder_actions.as_slice())
            .unwrap_or(&[])
    }

    /// Whether this object spec is a registered service
    pub fn is_service(&self) -> bool {
        self.as_object().map(|o| o.is_service).unwrap_or(false)
    }

    /// Whether values of this type are parseable from text
    pub fn is_parseable(&self) -> bool {
        self.facets.contains(FacetKind::Value) || self.facets.contains(FacetKind::Enum)
    }

    /// Whether this is a view model type
    pub fn is_view_model(&self) -> bool {
        self.facets.contains(FacetKind::ViewModel)
    }

    /// Whether this is an abstract type or interface
    pub fn is_abstract(&self) -> bool {
        self.get::<crate::facet::TypeFacet>()
            .map(|t| t.is_abstract || t.kind == TypeKind::Interface)
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------------

    /// Property or collection data
    pub fn as_association(&self) -> Option<&AssociationPayload> {
        match &self.payload {
            SpecPayload::Property(a) | SpecPayload::Collection(a) => Some(a),
            _ => None,
        }
    }

    /// Action data
    pub fn as_action(&self) -> Option<&ActionPayload> {
        match &self.payload {
            SpecPayload::Action(a) => Some(a),
            _ => None,
        }
    }

    /// Mutable action data
    pub fn as_action_mut(&mut self) -> Option<&mut ActionPayload> {
        match &mut self.payload {
            SpecPayload::Action(a) => Some(a),
            _ => None,
        }
    }

    /// Parameter data
    pub fn as_parameter(&self) -> Option<&ParameterPayload> {
        match &self.payload {
            SpecPayload::Parameter(p) => Some(p),
            _ => None,
        }
    }

    /// Parameters of an action spec
    pub fn parameters(&self) -> &[Arc<Specification>] {
        self.as_action()
            .map(|a| a.parameters.as_slice())
            .unwrap_or(&[])
    }

    /// Mutable parameter of an action spec under construction
    pub fn parameter_mut(&mut self, index: usize) -> Option<&mut Specification> {
        self.as_action_mut()
            .and_then(|a| a.parameters.get_mut(index))
            .map(Arc::make_mut)
    }

    /// Declared value type of a property, collection or parameter
    pub fn value_type(&self) -> Option<&TypeRef> {
        match &self.payload {
            SpecPayload::Property(a) | SpecPayload::Collection(a) => Some(&a.value_type),
            SpecPayload::Parameter(p) => Some(&p.parameter_type),
            SpecPayload::Action(a) => Some(&a.return_type),
            SpecPayload::Object(_) => None,
        }
    }
}

impl FacetHolder for Specification {
    fn facets(&self) -> &FacetSet {
        &self.facets
    }
}
