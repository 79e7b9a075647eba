//! Object type seen from a request

use naked_metamodel::facet::{IconFacet, TitleFacet, ValidateObjectFacet};
use naked_metamodel::{FacetHolder, SpecKind, Specification};
use std::sync::Arc;

use super::{ActionSpec, OneToManyAssociationSpec, OneToOneAssociationSpec, RequestScope};
use crate::adapter::ObjectAdapter;
use crate::error::{NakedError, NakedResult};
use crate::interaction::{Consent, InteractionBuffer};
use crate::value::DomainValue;

/// An object specification bound to a request
#[derive(Debug, Clone)]
pub struct ObjectSpec<'s> {
    scope: &'s RequestScope,
    spec: Arc<Specification>,
}

impl<'s> ObjectSpec<'s> {
    pub(crate) fn new(scope: &'s RequestScope, spec: Arc<Specification>) -> Self {
        Self { scope, spec }
    }

    /// Underlying specification
    pub fn specification(&self) -> &Arc<Specification> {
        &self.spec
    }

    /// Full type name
    pub fn full_name(&self) -> &str {
        self.spec.full_name()
    }

    /// Display name
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// Registered as a service
    pub fn is_service(&self) -> bool {
        self.spec.is_service()
    }

    /// View model type
    pub fn is_view_model(&self) -> bool {
        self.spec.is_view_model()
    }

    /// Superclass spec, when reflected
    pub fn superclass(&self) -> Option<ObjectSpec<'s>> {
        let name = self.spec.as_object()?.superclass.as_deref()?;
        self.scope.object_spec(name).ok()
    }

    /// Whether instances of this type can stand in for `other`
    pub fn is_of_type(&self, other: &str) -> bool {
        self.scope.metamodel().is_assignable(self.full_name(), other)
    }

    /// Scalar and reference properties in member order
    pub fn properties(&self) -> Vec<OneToOneAssociationSpec<'s>> {
        self.spec
            .fields()
            .iter()
            .filter(|f| f.kind() == SpecKind::Property)
            .map(|f| OneToOneAssociationSpec::new(self.scope, f.clone()))
            .collect()
    }

    /// Collection properties in member order
    pub fn collections(&self) -> Vec<OneToManyAssociationSpec<'s>> {
        self.spec
            .fields()
            .iter()
            .filter(|f| f.kind() == SpecKind::Collection)
            .map(|f| OneToManyAssociationSpec::new(self.scope, f.clone()))
            .collect()
    }

    /// Property by member name
    pub fn property(&self, name: &str) -> Option<OneToOneAssociationSpec<'s>> {
        self.spec
            .field(name)
            .filter(|f| f.kind() == SpecKind::Property)
            .map(|f| OneToOneAssociationSpec::new(self.scope, f.clone()))
    }

    /// Collection by member name
    pub fn collection(&self, name: &str) -> Option<OneToManyAssociationSpec<'s>> {
        self.spec
            .field(name)
            .filter(|f| f.kind() == SpecKind::Collection)
            .map(|f| OneToManyAssociationSpec::new(self.scope, f.clone()))
    }

    /// Actions declared on the type
    pub fn actions(&self) -> Vec<ActionSpec<'s>> {
        self.wrap(self.spec.actions())
    }

    /// Service actions contributed to the type
    pub fn contributed_actions(&self) -> Vec<ActionSpec<'s>> {
        self.wrap(self.spec.contributed_actions())
    }

    /// Service actions offered from the type's finder menu
    pub fn finder_actions(&self) -> Vec<ActionSpec<'s>> {
        self.wrap(self.spec.finder_actions())
    }

    /// Declared action by id, then contributed action
    pub fn action(&self, id: &str) -> Option<ActionSpec<'s>> {
        self.spec
            .actions()
            .iter()
            .chain(self.spec.contributed_actions())
            .find(|a| a.member_name() == id)
            .map(|a| ActionSpec::new(self.scope, a.clone()))
    }

    fn wrap(&self, actions: &[Arc<Specification>]) -> Vec<ActionSpec<'s>> {
        actions
            .iter()
            .map(|a| ActionSpec::new(self.scope, a.clone()))
            .collect()
    }

    /// Title of an instance
    pub fn title(&self, adapter: &ObjectAdapter) -> NakedResult<String> {
        let Some(handle) = adapter.handle() else {
            return Ok(adapter.value().title());
        };
        let title = match self.spec.get::<TitleFacet>() {
            Some(TitleFacet::ViaProperty { property, getter }) => {
                if self.scope.has_delegate(getter) {
                    self.scope.invoke(getter, Some(handle), &[])?
                } else {
                    handle.read().get(property)
                }
            }
            Some(TitleFacet::ViaTitleMethod { method })
            | Some(TitleFacet::ViaToString { method, .. }) => {
                self.scope.invoke(method, Some(handle), &[])?
            }
            Some(TitleFacet::None) | None => DomainValue::Str(self.name().to_string()),
        };
        Ok(title.title())
    }

    /// Icon name from `IconName()`, else the short type name
    pub fn icon_name(&self, adapter: &ObjectAdapter) -> NakedResult<String> {
        if let (Some(icon), Some(handle)) = (self.spec.get::<IconFacet>(), adapter.handle()) {
            let name = self.scope.invoke(&icon.method, Some(handle), &[])?;
            if let Some(name) = name.as_str().filter(|n| !n.is_empty()) {
                return Ok(name.to_string());
            }
        }
        Ok(self.spec.member_name().to_string())
    }

    /// Cross-property `Validate(...)` checks, every violation reported
    pub fn validate(&self, adapter: &ObjectAdapter) -> NakedResult<Consent> {
        let Some(facet) = self.spec.get::<ValidateObjectFacet>() else {
            return Ok(Consent::Allow);
        };
        let handle = adapter.handle().ok_or_else(|| {
            NakedError::InvalidEntry(format!("{} is not an object", adapter.spec_name()))
        })?;
        let mut buf = InteractionBuffer::new();
        for check in &facet.methods {
            let args = check
                .property_names
                .iter()
                .map(|name| self.property_value(handle, name))
                .collect::<NakedResult<Vec<_>>>()?;
            let reason = self.scope.invoke(&check.method, Some(handle), &args)?;
            if let Some(reason) = reason.as_str() {
                buf.append(reason);
            }
        }
        Ok(buf.to_consent())
    }

    /// Parameter names match property names ignoring case
    fn property_value(
        &self,
        handle: &crate::value::ObjectHandle,
        name: &str,
    ) -> NakedResult<DomainValue> {
        let property = self
            .properties()
            .into_iter()
            .find(|p| p.id().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                NakedError::InvalidEntry(format!("{} has no property {}", self.full_name(), name))
            })?;
        property.get_value(handle)
    }
}
