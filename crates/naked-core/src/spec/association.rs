//! Properties and collections seen from a request

use naked_metamodel::facet::{
    MandatoryFacet, PropertyAccessorFacet, PropertyClearFacet, PropertySetterFacet,
};
use naked_metamodel::{FacetHolder, Specification};
use std::sync::Arc;

use super::{
    member_choices, member_completions, member_default, member_usable, member_visible,
    validate_value, RequestScope,
};
use crate::adapter::ObjectAdapter;
use crate::error::{NakedError, NakedResult};
use crate::interaction::{Consent, InteractionBuffer};
use crate::value::{DomainValue, ObjectHandle};

fn require_handle(target: &ObjectAdapter) -> NakedResult<&ObjectHandle> {
    target.handle().ok_or_else(|| {
        NakedError::InvalidEntry(format!("{} is not an object", target.spec_name()))
    })
}

/// Read a field through its getter when code is registered, else from the object
fn read_field(
    scope: &RequestScope,
    spec: &Specification,
    handle: &ObjectHandle,
) -> NakedResult<DomainValue> {
    if let Some(accessor) = spec.get::<PropertyAccessorFacet>() {
        if scope.has_delegate(&accessor.getter) {
            return scope.invoke(&accessor.getter, Some(handle), &[]);
        }
    }
    Ok(handle.read().get(spec.member_name()))
}

/// A scalar or reference property bound to a request
#[derive(Debug, Clone)]
pub struct OneToOneAssociationSpec<'s> {
    scope: &'s RequestScope,
    spec: Arc<Specification>,
}

impl<'s> OneToOneAssociationSpec<'s> {
    pub(crate) fn new(scope: &'s RequestScope, spec: Arc<Specification>) -> Self {
        Self { scope, spec }
    }

    /// Member name
    pub fn id(&self) -> &str {
        self.spec.member_name()
    }

    /// Display name
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// Underlying specification
    pub fn specification(&self) -> &Arc<Specification> {
        &self.spec
    }

    /// Whether a value is required
    pub fn is_mandatory(&self) -> bool {
        self.spec
            .get::<MandatoryFacet>()
            .map(|m| m.is_mandatory())
            .unwrap_or(false)
    }

    pub(crate) fn get_value(&self, handle: &ObjectHandle) -> NakedResult<DomainValue> {
        read_field(self.scope, &self.spec, handle)
    }

    /// Current value
    pub fn get(&self, target: &ObjectAdapter) -> NakedResult<ObjectAdapter> {
        let value = self.get_value(require_handle(target)?)?;
        Ok(match self.spec.value_type() {
            Some(declared) => self.scope.adapt(value, declared),
            None => ObjectAdapter::for_value(value, ""),
        })
    }

    /// Whether the property is shown for the target
    pub fn is_visible(&self, target: &ObjectAdapter) -> NakedResult<bool> {
        member_visible(self.scope, &self.spec, Some(target))
    }

    /// Whether the property can be changed on the target
    pub fn is_usable(&self, target: &ObjectAdapter) -> NakedResult<Consent> {
        member_usable(self.scope, &self.spec, Some(target))
    }

    /// Every reason the proposed value is unacceptable
    pub fn is_assoc_valid(
        &self,
        target: &ObjectAdapter,
        proposed: &DomainValue,
    ) -> NakedResult<Consent> {
        let mut buf = InteractionBuffer::new();
        validate_value(self.scope, &self.spec, target.handle(), proposed, &mut buf)?;
        Ok(buf.to_consent())
    }

    /// Validate, then write through the setter or the field
    pub fn set(&self, target: &ObjectAdapter, value: DomainValue) -> NakedResult<()> {
        let handle = require_handle(target)?;
        if let Some(reason) = self.is_usable(target)?.reason() {
            return Err(NakedError::InvalidEntry(format!("{}: {}", self.id(), reason)));
        }
        if let Some(reason) = self.is_assoc_valid(target, &value)?.reason() {
            return Err(NakedError::InvalidEntry(format!("{}: {}", self.id(), reason)));
        }
        if value.is_null() {
            return self.clear(target);
        }
        match self.spec.get::<PropertySetterFacet>() {
            Some(setter) if self.scope.has_delegate(&setter.method) => {
                self.scope.invoke(&setter.method, Some(handle), &[value])?;
            }
            _ => handle.write().set(self.id(), value),
        }
        Ok(())
    }

    /// Remove the value through `ClearX` or the field
    pub fn clear(&self, target: &ObjectAdapter) -> NakedResult<()> {
        let handle = require_handle(target)?;
        match self.spec.get::<PropertyClearFacet>() {
            Some(clear) if self.scope.has_delegate(&clear.method) => {
                self.scope.invoke(&clear.method, Some(handle), &[])?;
            }
            _ => handle.write().clear(self.id()),
        }
        Ok(())
    }

    /// Offered values
    pub fn choices(&self, target: &ObjectAdapter) -> NakedResult<Vec<DomainValue>> {
        member_choices(self.scope, &self.spec, target.handle(), &[])
    }

    /// Default for a new instance
    pub fn default_value(&self, target: &ObjectAdapter) -> NakedResult<DomainValue> {
        member_default(self.scope, &self.spec, target.handle())
    }

    /// Completions for a search text
    pub fn auto_complete(
        &self,
        target: &ObjectAdapter,
        search: &str,
    ) -> NakedResult<Vec<DomainValue>> {
        member_completions(self.scope, &self.spec, target.handle(), search)
    }
}

/// A collection property bound to a request
#[derive(Debug, Clone)]
pub struct OneToManyAssociationSpec<'s> {
    scope: &'s RequestScope,
    spec: Arc<Specification>,
}

impl<'s> OneToManyAssociationSpec<'s> {
    pub(crate) fn new(scope: &'s RequestScope, spec: Arc<Specification>) -> Self {
        Self { scope, spec }
    }

    /// Member name
    pub fn id(&self) -> &str {
        self.spec.member_name()
    }

    /// Display name
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// Elements; an unset collection is empty
    pub fn get(&self, target: &ObjectAdapter) -> NakedResult<Vec<DomainValue>> {
        match read_field(self.scope, &self.spec, require_handle(target)?)? {
            DomainValue::Collection(items) => Ok(items),
            DomainValue::Null => Ok(Vec::new()),
            other => Err(NakedError::InvalidEntry(format!(
                "{} holds {} instead of a collection",
                self.id(),
                other
            ))),
        }
    }

    /// Number of elements
    pub fn count(&self, target: &ObjectAdapter) -> NakedResult<usize> {
        Ok(self.get(target)?.len())
    }

    /// Whether the collection is shown for the target
    pub fn is_visible(&self, target: &ObjectAdapter) -> NakedResult<bool> {
        member_visible(self.scope, &self.spec, Some(target))
    }
}
