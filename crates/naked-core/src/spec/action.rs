//! Actions seen from a request
//!
//! An action is invoked on its real target: the object it was offered on,
//! or the service declaring it when the action is static, contributed, or
//! invoked without a target. Results without an object identifier carry a
//! `CollectionMemento` so they can be re-created later.

use naked_metamodel::facet::{
    ActionInvocationFacet, ActionValidationFacet, ContributedActionFacet, FinderActionFacet,
};
use naked_metamodel::{FacetHolder, Specification, TypeRef};
use std::sync::Arc;

use super::{member_usable, member_visible, ActionParameterSpec, ObjectSpec, RequestScope};
use crate::adapter::ObjectAdapter;
use crate::error::{NakedError, NakedResult};
use crate::interaction::{Consent, InteractionBuffer};
use crate::memento::CollectionMemento;
use crate::value::DomainValue;

/// Element spec name for actions with nothing to return
pub const VOID_SPEC: &str = "System.Void";

/// Shape of an argument, `None` for a missing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgumentKind {
    Value,
    Object,
    Collection,
}

impl ArgumentKind {
    fn of(value: &DomainValue) -> Option<Self> {
        match value {
            DomainValue::Null => None,
            DomainValue::Object(_) => Some(ArgumentKind::Object),
            DomainValue::Collection(_) => Some(ArgumentKind::Collection),
            _ => Some(ArgumentKind::Value),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            ArgumentKind::Value => "a value",
            ArgumentKind::Object => "an object",
            ArgumentKind::Collection => "a collection",
        }
    }
}

/// An action bound to a request
#[derive(Debug, Clone)]
pub struct ActionSpec<'s> {
    scope: &'s RequestScope,
    spec: Arc<Specification>,
}

impl<'s> ActionSpec<'s> {
    pub(crate) fn new(scope: &'s RequestScope, spec: Arc<Specification>) -> Self {
        Self { scope, spec }
    }

    /// Underlying specification
    pub fn specification(&self) -> &Arc<Specification> {
        &self.spec
    }

    /// Action id (its member name)
    pub fn id(&self) -> &str {
        self.spec.member_name()
    }

    /// Display name
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// Parameters in order
    pub fn parameters(&self) -> Vec<ActionParameterSpec<'s>> {
        self.spec
            .parameters()
            .iter()
            .map(|p| ActionParameterSpec::new(self.scope, p.clone()))
            .collect()
    }

    fn invocation(&self) -> NakedResult<&ActionInvocationFacet> {
        self.spec.get::<ActionInvocationFacet>().ok_or_else(|| {
            NakedError::invoke(self.spec.full_name(), format!("{} cannot be invoked", self.id()))
        })
    }

    /// Type declaring the action
    pub fn on_type(&self) -> &str {
        self.spec
            .get::<ActionInvocationFacet>()
            .map(|f| f.on_type.as_str())
            .unwrap_or_else(|| self.spec.full_name())
    }

    /// Declared return type
    pub fn return_type(&self) -> Option<&TypeRef> {
        self.spec.value_type()
    }

    /// Object spec of the return type, when it is a reflected object
    pub fn return_spec(&self) -> Option<ObjectSpec<'s>> {
        let name = self.return_type()?.spec_name()?;
        self.scope.object_spec(&name).ok()
    }

    /// Name of the spec describing what the action returns, element type for collections
    pub fn element_spec_name(&self) -> String {
        let facet = self.spec.get::<ActionInvocationFacet>();
        facet
            .and_then(|f| f.element_type.clone())
            .or_else(|| self.return_type().and_then(TypeRef::spec_name))
            .unwrap_or_else(|| VOID_SPEC.to_string())
    }

    /// Object spec of the element type
    pub fn element_spec(&self) -> Option<ObjectSpec<'s>> {
        self.scope.object_spec(&self.element_spec_name()).ok()
    }

    /// Whether this is a service action contributed to other types
    pub fn is_contributed_method(&self) -> bool {
        self.spec
            .get::<ContributedActionFacet>()
            .map(|c| !c.contributees.is_empty())
            .unwrap_or(false)
    }

    /// Whether this is offered from a finder menu
    pub fn is_finder_method(&self) -> bool {
        self.spec.get::<FinderActionFacet>().is_some()
    }

    /// Whether the action is static
    pub fn is_static(&self) -> bool {
        self.spec.as_action().map(|a| a.is_static).unwrap_or(false)
    }

    /// The service declaring the action
    pub fn find_service(&self) -> NakedResult<ObjectAdapter> {
        let on_type = self.on_type();
        self.scope
            .services()
            .services()
            .into_iter()
            .find(|service| self.declares(service.spec_name(), on_type))
            .ok_or_else(|| {
                NakedError::FindObject(format!("failed to find service for action {}", self.id()))
            })
    }

    /// Whether `type_name` or one of its superclasses is `on_type`
    fn declares(&self, type_name: &str, on_type: &str) -> bool {
        let mut current = Some(type_name.to_string());
        while let Some(name) = current {
            if name == on_type {
                return true;
            }
            current = self
                .scope
                .metamodel()
                .get_specification(&name)
                .and_then(|s| s.as_object().and_then(|o| o.superclass.clone()));
        }
        false
    }

    /// Object the action is invoked on
    pub fn real_target(&self, target: Option<&ObjectAdapter>) -> NakedResult<ObjectAdapter> {
        match target {
            None => self.find_service(),
            Some(target) if self.is_service_adapter(target) => Ok(target.clone()),
            Some(_) if self.is_contributed_method() => self.find_service(),
            Some(target) => Ok(target.clone()),
        }
    }

    fn is_service_adapter(&self, adapter: &ObjectAdapter) -> bool {
        self.scope
            .metamodel()
            .get_specification(adapter.spec_name())
            .map(|s| s.is_service())
            .unwrap_or(false)
    }

    /// Arguments actually passed: as given, else the contributee for a contributed action
    pub fn real_parameters(
        &self,
        target: Option<&ObjectAdapter>,
        parameters: Option<&[ObjectAdapter]>,
    ) -> Vec<ObjectAdapter> {
        match (parameters, target) {
            (Some(parameters), _) => parameters.to_vec(),
            (None, Some(target)) if self.is_contributed_method() => vec![target.clone()],
            _ => Vec::new(),
        }
    }

    /// Whether the action is shown on the target
    pub fn is_visible(&self, target: Option<&ObjectAdapter>) -> NakedResult<bool> {
        member_visible(self.scope, &self.spec, target)
    }

    /// Whether the action can be invoked on the target
    pub fn is_usable(&self, target: Option<&ObjectAdapter>) -> NakedResult<Consent> {
        member_usable(self.scope, &self.spec, target)
    }

    /// Every reason the arguments are unacceptable, then `ValidateX(params...)`
    pub fn is_parameter_set_valid(
        &self,
        target: Option<&ObjectAdapter>,
        parameters: &[ObjectAdapter],
    ) -> NakedResult<Consent> {
        let expected = self.spec.parameters().len();
        if parameters.len() != expected {
            return Ok(Consent::Veto(format!(
                "{} takes {} parameters, {} given",
                self.id(),
                expected,
                parameters.len()
            )));
        }
        let real_target = self.real_target(target)?;
        let mut buf = InteractionBuffer::new();
        for (parameter, argument) in self.parameters().iter().zip(parameters) {
            parameter.is_valid(Some(&real_target), argument.value(), &mut buf)?;
        }
        if let Some(validation) = self.spec.get::<ActionValidationFacet>() {
            let args: Vec<DomainValue> = parameters.iter().map(|p| p.value().clone()).collect();
            let reason = self
                .scope
                .invoke(&validation.method, real_target.handle(), &args)?;
            if let Some(reason) = reason.as_str() {
                buf.append(reason);
            }
        }
        Ok(buf.to_consent())
    }

    /// Fails with `Invoke` unless the arguments match the signature in number and kind
    pub fn check_arguments(&self, arguments: &[ObjectAdapter]) -> NakedResult<()> {
        let parameters = self.parameters();
        if arguments.len() != parameters.len() {
            return Err(NakedError::invoke(
                self.spec.full_name(),
                format!(
                    "{} takes {} parameters, {} given",
                    self.id(),
                    parameters.len(),
                    arguments.len()
                ),
            ));
        }
        for (parameter, argument) in parameters.iter().zip(arguments) {
            let value = argument.value();
            let Some(given) = ArgumentKind::of(value) else {
                continue;
            };
            let expected = if parameter.is_collection() {
                ArgumentKind::Collection
            } else if parameter.is_parseable() {
                ArgumentKind::Value
            } else {
                ArgumentKind::Object
            };
            if given != expected {
                return Err(NakedError::invoke(
                    self.spec.full_name(),
                    format!(
                        "{} expects {}, given {}",
                        parameter.name(),
                        expected.describe(),
                        value
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Invoke the action in a transaction
    ///
    /// Returns `None` when the action returns nothing. Any result without
    /// an object identifier gets a memento identity.
    pub fn execute(
        &self,
        target: Option<&ObjectAdapter>,
        parameters: Option<&[ObjectAdapter]>,
    ) -> NakedResult<Option<ObjectAdapter>> {
        let invocation = self.invocation()?;
        let real_target = self.real_target(target)?;
        let real_parameters = self.real_parameters(target, parameters);
        self.check_arguments(&real_parameters)?;
        let args: Vec<DomainValue> = real_parameters.iter().map(|p| p.value().clone()).collect();
        let receiver = if invocation.is_static {
            None
        } else {
            real_target.handle()
        };

        log::debug!("executing {} on {}", self.id(), real_target.spec_name());
        let result = self
            .scope
            .in_transaction(|| self.scope.invoke(&invocation.method, receiver, &args))?;

        let adapter = match result {
            DomainValue::Null => return Ok(None),
            DomainValue::Collection(items) => ObjectAdapter::for_value(
                DomainValue::Collection(items),
                invocation.return_type.to_string(),
            ),
            other => self.scope.adapt(other, &invocation.return_type),
        };
        if adapter.oid().is_some() {
            return Ok(Some(adapter));
        }

        let memento_target = target.unwrap_or(&real_target);
        match CollectionMemento::new(self.scope, memento_target, self, &real_parameters) {
            Ok(memento) => Ok(Some(adapter.with_memento(memento))),
            Err(e) => {
                log::warn!("result of {} cannot be recreated: {}", self.id(), e);
                Ok(Some(adapter))
            }
        }
    }
}
