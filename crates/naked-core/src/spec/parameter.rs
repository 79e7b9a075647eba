//! Action parameters seen from a request

use naked_metamodel::facet::MandatoryFacet;
use naked_metamodel::{FacetHolder, Specification, TypeRef};
use std::sync::Arc;

use super::{member_choices, member_completions, member_default, validate_value, RequestScope};
use crate::adapter::ObjectAdapter;
use crate::error::NakedResult;
use crate::interaction::InteractionBuffer;
use crate::value::DomainValue;

/// One parameter of an action
#[derive(Debug, Clone)]
pub struct ActionParameterSpec<'s> {
    scope: &'s RequestScope,
    spec: Arc<Specification>,
}

impl<'s> ActionParameterSpec<'s> {
    pub(crate) fn new(scope: &'s RequestScope, spec: Arc<Specification>) -> Self {
        Self { scope, spec }
    }

    /// Underlying specification
    pub fn specification(&self) -> &Arc<Specification> {
        &self.spec
    }

    /// Parameter name
    pub fn id(&self) -> &str {
        self.spec.member_name()
    }

    /// Display name
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// Position in the action's signature
    pub fn index(&self) -> usize {
        self.spec.as_parameter().map(|p| p.index).unwrap_or_default()
    }

    /// Declared type
    pub fn parameter_type(&self) -> Option<&TypeRef> {
        self.spec.value_type()
    }

    /// Whether an argument is required
    pub fn is_mandatory(&self) -> bool {
        self.spec
            .get::<MandatoryFacet>()
            .map(|m| m.is_mandatory())
            .unwrap_or(false)
    }

    /// Whether the parameter takes a collection
    pub fn is_collection(&self) -> bool {
        self.parameter_type().map(TypeRef::is_collection).unwrap_or(false)
    }

    /// Whether values (or elements) of the parameter are parseable scalars
    pub fn is_parseable(&self) -> bool {
        let Some(declared) = self.parameter_type() else {
            return false;
        };
        let element = declared.element_type().unwrap_or(declared);
        if element.as_primitive().is_some() {
            return true;
        }
        element
            .spec_name()
            .and_then(|name| self.scope.metamodel().get_specification(&name))
            .map(|spec| spec.is_parseable())
            .unwrap_or(false)
    }

    /// Record every reason the argument is unacceptable
    pub fn is_valid(
        &self,
        target: Option<&ObjectAdapter>,
        proposed: &DomainValue,
        buf: &mut InteractionBuffer,
    ) -> NakedResult<()> {
        let mut own = InteractionBuffer::new();
        validate_value(
            self.scope,
            &self.spec,
            target.and_then(ObjectAdapter::handle),
            proposed,
            &mut own,
        )?;
        for reason in own.reasons() {
            buf.append(format!("{}: {}", self.name(), reason));
        }
        Ok(())
    }

    /// Offered values, given the arguments chosen so far
    pub fn choices(
        &self,
        target: Option<&ObjectAdapter>,
        dependencies: &[DomainValue],
    ) -> NakedResult<Vec<DomainValue>> {
        member_choices(
            self.scope,
            &self.spec,
            target.and_then(ObjectAdapter::handle),
            dependencies,
        )
    }

    /// Default argument
    pub fn default_value(&self, target: Option<&ObjectAdapter>) -> NakedResult<DomainValue> {
        member_default(self.scope, &self.spec, target.and_then(ObjectAdapter::handle))
    }

    /// Completions for a search text
    pub fn auto_complete(
        &self,
        target: Option<&ObjectAdapter>,
        search: &str,
    ) -> NakedResult<Vec<DomainValue>> {
        member_completions(
            self.scope,
            &self.spec,
            target.and_then(ObjectAdapter::handle),
            search,
        )
    }
}
