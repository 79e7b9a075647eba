//! Session-scoped specifications
//!
//! The metamodel describes types and members; these wrappers add what a
//! request needs to act on them: the session, services, lifecycle manager,
//! transaction manager and the delegate cache. A `RequestScope` is created
//! per request and every wrapper borrows it.

pub mod action;
pub mod association;
pub mod object;
pub mod parameter;

use naked_metamodel::facet::{
    AuthorizationFacet, AutoCompleteFacet, ChoicesFacet, DefaultFacet, DisableForContextFacet,
    DisabledFacet, HiddenFacet, HideForContextFacet, MandatoryFacet, MaxLengthFacet, RangeFacet,
    RegExFacet, ValidateFacet,
};
use naked_metamodel::{FacetHolder, Metamodel, MethodId, Specification, TypeRef};
use rustc_hash::FxHashMap;
use std::cell::{RefCell, RefMut};
use std::sync::Arc;

pub use action::ActionSpec;
pub use association::{OneToManyAssociationSpec, OneToOneAssociationSpec};
pub use object::ObjectSpec;
pub use parameter::ActionParameterSpec;

use crate::adapter::{ObjectAdapter, Oid};
use crate::error::{NakedError, NakedResult};
use crate::interaction::{Consent, InteractionBuffer};
use crate::lifecycle::{LifecycleManager, ObjectStore};
use crate::registry::DelegateCache;
use crate::services::ServicesManager;
use crate::session::Session;
use crate::transaction::TransactionManager;
use crate::value::{DomainValue, ObjectHandle};

/// Per-type member authorisation, registered by name
pub trait TypeAuthorizer: Send + Sync {
    /// Whether the user may see a member of the target
    fn is_visible(&self, session: &dyn Session, target: &ObjectAdapter, member: &str) -> bool;

    /// Whether the user may change or invoke a member of the target
    fn is_editable(&self, _session: &dyn Session, _target: &ObjectAdapter, _member: &str) -> bool {
        true
    }
}

/// Authorizers by the name the reflector configuration refers to
pub type AuthorizerMap = FxHashMap<String, Arc<dyn TypeAuthorizer>>;

/// Everything one request works with
pub struct RequestScope {
    metamodel: Arc<Metamodel>,
    delegates: Arc<DelegateCache>,
    session: Arc<dyn Session>,
    services: Arc<dyn ServicesManager>,
    lifecycle: Arc<dyn LifecycleManager>,
    authorizers: Arc<AuthorizerMap>,
    transactions: RefCell<TransactionManager>,
}

impl RequestScope {
    /// Scope over the shared singletons and this request's collaborators
    pub fn new(
        metamodel: Arc<Metamodel>,
        delegates: Arc<DelegateCache>,
        session: Arc<dyn Session>,
        services: Arc<dyn ServicesManager>,
        lifecycle: Arc<dyn LifecycleManager>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            metamodel,
            delegates,
            session,
            services,
            lifecycle,
            authorizers: Arc::new(AuthorizerMap::default()),
            transactions: RefCell::new(TransactionManager::new(store)),
        }
    }

    /// Use a set of type authorizers
    pub fn with_authorizers(mut self, authorizers: Arc<AuthorizerMap>) -> Self {
        self.authorizers = authorizers;
        self
    }

    /// Shared metamodel
    pub fn metamodel(&self) -> &Metamodel {
        &self.metamodel
    }

    /// Current user
    pub fn session(&self) -> &dyn Session {
        self.session.as_ref()
    }

    /// Services
    pub fn services(&self) -> &dyn ServicesManager {
        self.services.as_ref()
    }

    /// Lifecycle manager
    pub fn lifecycle(&self) -> &dyn LifecycleManager {
        self.lifecycle.as_ref()
    }

    /// This request's transaction manager
    pub fn transaction_manager(&self) -> RefMut<'_, TransactionManager> {
        self.transactions.borrow_mut()
    }

    /// Enter a (possibly nested) transaction
    pub fn start_transaction(&self) {
        self.transactions.borrow_mut().start_transaction();
    }

    /// Leave a transaction
    pub fn end_transaction(&self) -> NakedResult<()> {
        self.transactions.borrow_mut().end_transaction()
    }

    /// Abort at the user's request
    pub fn user_abort_transaction(&self) {
        self.transactions.borrow_mut().user_abort_transaction();
    }

    /// Run `work` in a transaction, aborting it when `work` fails
    pub fn in_transaction<T>(&self, work: impl FnOnce() -> NakedResult<T>) -> NakedResult<T> {
        self.start_transaction();
        match work() {
            Ok(value) => {
                self.end_transaction()?;
                Ok(value)
            }
            Err(e) => {
                self.transactions.borrow_mut().abort_transaction();
                Err(e)
            }
        }
    }

    /// Invoke a domain method through the delegate cache
    pub fn invoke(
        &self,
        method: &MethodId,
        target: Option<&ObjectHandle>,
        args: &[DomainValue],
    ) -> NakedResult<DomainValue> {
        self.delegates.invoke(method, target, args)
    }

    /// Whether code is registered for a method
    pub fn has_delegate(&self, method: &MethodId) -> bool {
        self.delegates.try_delegate(method).is_some()
    }

    /// Session-scoped view of an object type
    pub fn object_spec(&self, type_name: &str) -> NakedResult<ObjectSpec<'_>> {
        let spec = self.metamodel.specification(type_name)?;
        if spec.as_object().is_none() {
            return Err(NakedError::FindObject(format!("{} is not an object type", type_name)));
        }
        Ok(ObjectSpec::new(self, spec))
    }

    /// Session-scoped view of an adapter's type
    pub fn spec_for(&self, adapter: &ObjectAdapter) -> NakedResult<ObjectSpec<'_>> {
        self.object_spec(adapter.spec_name())
    }

    /// New transient instance
    pub fn create_instance(&self, type_name: &str) -> NakedResult<ObjectAdapter> {
        self.lifecycle.create_instance(type_name)
    }

    /// Save a transient object in its own (possibly nested) transaction
    pub fn make_persistent(&self, adapter: &mut ObjectAdapter) -> NakedResult<()> {
        self.in_transaction(|| {
            let mut transactions = self.transactions.borrow_mut();
            let unit_of_work = transactions.unit_of_work()?;
            self.lifecycle.make_persistent(adapter, unit_of_work)
        })
    }

    /// Find an object again from its identifier
    pub fn restore_object(&self, oid: &Oid) -> NakedResult<ObjectAdapter> {
        let oid = match self.transactions.borrow().current_unit_of_work() {
            Some(unit_of_work) => unit_of_work.resolve(oid),
            None => oid.clone(),
        };
        match &oid {
            Oid::Service { type_name } => self
                .services
                .service(type_name)
                .ok_or_else(|| NakedError::FindObject(format!("no service {}", type_name))),
            Oid::Transient { .. } => self.lifecycle.recreate_instance(&oid),
            _ => self.lifecycle.load_object(&oid),
        }
    }

    /// Adapter for a value of a declared type
    pub fn adapt(&self, value: DomainValue, declared: &TypeRef) -> ObjectAdapter {
        match value {
            DomainValue::Object(handle) => ObjectAdapter::for_object(handle),
            other => ObjectAdapter::for_value(
                other,
                declared.spec_name().unwrap_or_else(|| declared.to_string()),
            ),
        }
    }

    /// Type authorizer check for a member of the target
    fn authorizer_permits(&self, target: &ObjectAdapter, member: &str, edit: bool) -> bool {
        let Some(name) = self.metamodel.authorizer_for(target.spec_name()) else {
            return true;
        };
        match self.authorizers.get(name) {
            Some(authorizer) if edit => authorizer.is_editable(self.session(), target, member),
            Some(authorizer) => authorizer.is_visible(self.session(), target, member),
            None => {
                log::warn!(
                    "authorizer {} for {} is not registered, {} denied",
                    name,
                    target.spec_name(),
                    member
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestScope")
            .field("user", &self.session.user_name())
            .field("transactions", &self.transactions.borrow())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Checks shared by properties, collections, actions and parameters
// ----------------------------------------------------------------------------

fn is_persistent(target: Option<&ObjectAdapter>) -> bool {
    target.map(ObjectAdapter::is_persistent).unwrap_or(false)
}

/// Static hiding, authorisation, then `HideX()`
pub(crate) fn member_visible(
    scope: &RequestScope,
    member: &Specification,
    target: Option<&ObjectAdapter>,
) -> NakedResult<bool> {
    if member
        .get::<HiddenFacet>()
        .and_then(|h| h.hides(is_persistent(target)))
        .is_some()
    {
        return Ok(false);
    }
    if let Some(auth) = member.get::<AuthorizationFacet>() {
        let session = scope.session();
        if !auth.permits(session.user_name(), session.roles()) {
            return Ok(false);
        }
    }
    let Some(target) = target else {
        return Ok(true);
    };
    if !scope.authorizer_permits(target, member.member_name(), false) {
        return Ok(false);
    }
    if let (Some(hide), Some(handle)) = (member.get::<HideForContextFacet>(), target.handle()) {
        let hidden = scope.invoke(&hide.method, Some(handle), &[])?;
        if hidden.as_bool() == Some(true) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Static disabling, authorisation, then `DisableX()`
pub(crate) fn member_usable(
    scope: &RequestScope,
    member: &Specification,
    target: Option<&ObjectAdapter>,
) -> NakedResult<Consent> {
    if let Some(reason) = member
        .get::<DisabledFacet>()
        .and_then(|d| d.disables(is_persistent(target)))
    {
        return Ok(Consent::Veto(reason.to_string()));
    }
    let Some(target) = target else {
        return Ok(Consent::Allow);
    };
    if !scope.authorizer_permits(target, member.member_name(), true) {
        return Ok(Consent::Veto("Not authorized to edit".into()));
    }
    if let (Some(disable), Some(handle)) = (member.get::<DisableForContextFacet>(), target.handle()) {
        let reason = scope.invoke(&disable.method, Some(handle), &[])?;
        return Ok(Consent::from_reason(reason.as_str().map(str::to_string)));
    }
    Ok(Consent::Allow)
}

fn has_value(value: &DomainValue) -> bool {
    match value {
        DomainValue::Null => false,
        DomainValue::Str(s) => !s.is_empty(),
        _ => true,
    }
}

/// Declarative checks on a proposed value, then `ValidateX(value)`
pub(crate) fn validate_value(
    scope: &RequestScope,
    member: &Specification,
    target: Option<&ObjectHandle>,
    proposed: &DomainValue,
    buf: &mut InteractionBuffer,
) -> NakedResult<()> {
    let present = has_value(proposed);
    if let Some(reason) = member
        .get::<MandatoryFacet>()
        .and_then(|m| m.is_invalid(present))
    {
        buf.append(reason);
    }
    if !present {
        return Ok(());
    }
    if let Some(text) = proposed.as_str() {
        if let Some(reason) = member.get::<MaxLengthFacet>().and_then(|m| m.is_invalid(text)) {
            buf.append(reason);
        }
        if let Some(reason) = member.get::<RegExFacet>().and_then(|r| r.is_invalid(text)) {
            buf.append(reason);
        }
    }
    if let Some(number) = proposed.as_f64() {
        if let Some(reason) = member.get::<RangeFacet>().and_then(|r| r.is_invalid(number)) {
            buf.append(reason);
        }
    }
    if let Some(validate) = member.get::<ValidateFacet>() {
        let reason = scope.invoke(&validate.method, target, std::slice::from_ref(proposed))?;
        if let Some(reason) = reason.as_str() {
            buf.append(reason);
        }
    }
    Ok(())
}

/// Result of a `ChoicesX` method; no facet means no choices
pub(crate) fn member_choices(
    scope: &RequestScope,
    member: &Specification,
    target: Option<&ObjectHandle>,
    dependencies: &[DomainValue],
) -> NakedResult<Vec<DomainValue>> {
    let Some(choices) = member.get::<ChoicesFacet>() else {
        return Ok(Vec::new());
    };
    let mut args = dependencies.to_vec();
    args.resize(choices.parameter_names.len(), DomainValue::Null);
    match scope.invoke(&choices.method, target, &args)? {
        DomainValue::Collection(items) => Ok(items),
        DomainValue::Null => Ok(Vec::new()),
        _ => Err(NakedError::invoke(&choices.method, "choices must be a collection")),
    }
}

/// Computed or literal default
pub(crate) fn member_default(
    scope: &RequestScope,
    member: &Specification,
    target: Option<&ObjectHandle>,
) -> NakedResult<DomainValue> {
    match member.get::<DefaultFacet>() {
        Some(DefaultFacet::Method(method)) => scope.invoke(method, target, &[]),
        Some(DefaultFacet::Value(literal)) => Ok(DomainValue::Str(literal.clone())),
        None => Ok(DomainValue::Null),
    }
}

/// Matches for a search text; too-short searches find nothing
pub(crate) fn member_completions(
    scope: &RequestScope,
    member: &Specification,
    target: Option<&ObjectHandle>,
    search: &str,
) -> NakedResult<Vec<DomainValue>> {
    let Some(auto_complete) = member.get::<AutoCompleteFacet>() else {
        return Ok(Vec::new());
    };
    if search.chars().count() < auto_complete.min_length as usize {
        return Ok(Vec::new());
    }
    let found = scope.invoke(
        &auto_complete.method,
        target,
        &[DomainValue::Str(search.to_string())],
    )?;
    let mut items = match found {
        DomainValue::Collection(items) => items,
        DomainValue::Null => Vec::new(),
        single => vec![single],
    };
    items.truncate(auto_complete.page_size as usize);
    Ok(items)
}
