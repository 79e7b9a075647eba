//! Facet payloads
//!
//! Declarative facets carry literal configuration and answer value checks
//! themselves. Imperative facets carry only the `MethodId` of the domain
//! method that implements them; binding that id to something callable is
//! the runtime's business.

use once_cell::sync::OnceCell;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::reflect::{DataType, EagerlyDo, MethodId, PrimitiveType, TypeKind, TypeRef, WhenTo, Where};

// ============================================================================
// Naming and description
// ============================================================================

/// Display name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedFacet {
    /// Name shown to users
    pub value: String,
    /// Derived from the member name rather than annotated
    pub inferred: bool,
}

/// Description shown as a tooltip
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DescribedAsFacet {
    /// Description text
    pub value: String,
}

/// Plural name of an object type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluralFacet {
    /// Plural text
    pub value: String,
    /// Derived from the type name rather than annotated
    pub inferred: bool,
}

/// Ordering of a member within its type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberOrderFacet {
    /// Dewey-decimal sequence, compared as text segments
    pub sequence: String,
    /// Group name
    pub name: String,
}

impl MemberOrderFacet {
    /// Compare two sequences segment by segment (`1.10` sorts after `1.9`)
    pub fn compare_sequences(a: &str, b: &str) -> std::cmp::Ordering {
        let mut left = a.split('.');
        let mut right = b.split('.');
        loop {
            match (left.next(), right.next()) {
                (None, None) => return std::cmp::Ordering::Equal,
                (None, Some(_)) => return std::cmp::Ordering::Less,
                (Some(_), None) => return std::cmp::Ordering::Greater,
                (Some(l), Some(r)) => {
                    let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                        (Ok(l), Ok(r)) => l.cmp(&r),
                        _ => l.cmp(r),
                    };
                    if ord != std::cmp::Ordering::Equal {
                        return ord;
                    }
                }
            }
        }
    }
}

/// Presentation hint passed through to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationHintFacet {
    /// Hint text
    pub value: String,
}

/// Display mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskFacet {
    /// Mask text
    pub value: String,
}

/// Multi-line rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiLineFacet {
    /// Visible lines
    pub number_of_lines: u32,
    /// Visible width
    pub width: u32,
}

/// Table rendering of a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableViewFacet {
    /// Show the title column
    pub title: bool,
    /// Columns to show
    pub columns: Vec<String>,
}

/// Eager rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EagerlyFacet {
    /// What to do eagerly
    pub what: EagerlyDo,
}

/// Semantic data type of a string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTypeFacet {
    /// Data type
    pub data_type: DataType,
}

/// Obscured input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordFacet;

// ============================================================================
// Visibility, usability, mandatoriness
// ============================================================================

/// Statically hidden
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiddenFacet {
    /// When hidden
    pub when: WhenTo,
}

impl HiddenFacet {
    /// Reason to show when hidden, if in force
    pub fn hides(&self, is_persistent: bool) -> Option<&'static str> {
        match self.when {
            WhenTo::Always => Some("Always hidden"),
            WhenTo::OncePersisted if is_persistent => Some("Hidden once persisted"),
            WhenTo::UntilPersisted if !is_persistent => Some("Hidden until persisted"),
            _ => None,
        }
    }
}

/// Statically disabled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisabledFacet {
    /// When disabled
    pub when: WhenTo,
}

impl DisabledFacet {
    /// Reason to show when disabled, if in force
    pub fn disables(&self, is_persistent: bool) -> Option<&'static str> {
        match self.when {
            WhenTo::Always => Some("Always disabled"),
            WhenTo::OncePersisted if is_persistent => Some("Disabled once persisted"),
            WhenTo::UntilPersisted if !is_persistent => Some("Disabled until persisted"),
            _ => None,
        }
    }
}

/// Immutable object type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImmutableFacet {
    /// When immutable
    pub when: WhenTo,
}

/// Whether a property or parameter must have a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MandatoryFacet {
    /// Default for value types with no annotation
    MandatoryDefault,
    /// Default for references and strings with no annotation
    OptionalDefault,
    /// Annotated `[Required]`
    Required,
    /// Annotated `[Optionally]`
    Optional,
}

impl MandatoryFacet {
    /// Whether a value is required
    pub fn is_mandatory(self) -> bool {
        matches!(self, MandatoryFacet::MandatoryDefault | MandatoryFacet::Required)
    }

    /// Reason for rejecting a missing value
    pub fn is_invalid(self, has_value: bool) -> Option<&'static str> {
        if self.is_mandatory() && !has_value {
            Some("Mandatory")
        } else {
            None
        }
    }
}

/// Maximum text length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxLengthFacet {
    /// Maximum number of characters
    pub value: u32,
}

impl MaxLengthFacet {
    /// Reason for rejecting a proposed text value
    pub fn is_invalid(&self, text: &str) -> Option<String> {
        if self.value > 0 && text.chars().count() > self.value as usize {
            Some(format!("Too long, maximum {} characters", self.value))
        } else {
            None
        }
    }
}

/// Numeric range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeFacet {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl RangeFacet {
    /// Reason for rejecting a proposed number
    pub fn is_invalid(&self, value: f64) -> Option<String> {
        if value < self.min || value > self.max {
            Some(format!("Value is outside the range {} to {}", self.min, self.max))
        } else {
            None
        }
    }
}

/// Regular expression validation; the pattern is compiled on first use
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegExFacet {
    /// Validation pattern
    pub validation: String,
    /// Format pattern
    pub format: String,
    /// Case sensitive matching
    pub case_sensitive: bool,
    /// Failure message
    pub message: String,
    #[serde(skip)]
    compiled: OnceCell<Option<Regex>>,
}

impl PartialEq for RegExFacet {
    fn eq(&self, other: &Self) -> bool {
        self.validation == other.validation
            && self.format == other.format
            && self.case_sensitive == other.case_sensitive
            && self.message == other.message
    }
}

impl RegExFacet {
    /// Create a facet
    pub fn new(validation: impl Into<String>, message: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            validation: validation.into(),
            format: String::new(),
            case_sensitive,
            message: message.into(),
            compiled: OnceCell::new(),
        }
    }

    fn regex(&self) -> Option<&Regex> {
        self.compiled
            .get_or_init(|| {
                match RegexBuilder::new(&self.validation)
                    .case_insensitive(!self.case_sensitive)
                    .build()
                {
                    Ok(re) => Some(re),
                    Err(e) => {
                        log::warn!("invalid validation pattern '{}': {}", self.validation, e);
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Whether text fails validation; an uncompilable pattern never matches
    pub fn does_not_match(&self, text: &str) -> bool {
        match self.regex() {
            Some(re) => !re.is_match(text),
            None => true,
        }
    }

    /// Reason for rejecting a proposed text value
    pub fn is_invalid(&self, text: &str) -> Option<String> {
        if self.does_not_match(text) {
            Some(if self.message.is_empty() {
                "Doesn't match pattern".to_string()
            } else {
                self.message.clone()
            })
        } else {
            None
        }
    }
}

// ============================================================================
// Types and collections
// ============================================================================

/// Where a type-of facet came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeOfOrigin {
    /// `[TypeOf]`
    Annotation,
    /// Element type of `T[]`
    InferredFromArray,
    /// Argument of a generic collection
    InferredFromGenerics,
}

/// Element type of a collection member or collection-returning action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeOfFacet {
    /// Element type full name
    pub value: String,
    /// How it was determined
    pub origin: TypeOfOrigin,
}

/// Element spec of a collection, resolved alongside `TypeOfFacet`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementTypeFacet {
    /// Element type full name
    pub value: String,
}

/// Shape of a collection member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionFacet {
    /// Set semantics
    pub is_set: bool,
    /// Queryable
    pub is_queryable: bool,
    /// Array
    pub is_array: bool,
}

/// Kind and modifiers of an object type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeFacet {
    /// Type kind
    pub kind: TypeKind,
    /// Abstract
    pub is_abstract: bool,
    /// Sealed
    pub is_sealed: bool,
    /// Static
    pub is_static: bool,
}

/// Parseable value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueFacet {
    /// Primitive, if a built-in value
    pub primitive: Option<PrimitiveType>,
}

/// Enumeration type or enum-typed member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumFacet {
    /// Enum type full name
    pub type_name: String,
    /// Members in declaration order
    pub values: Vec<String>,
}

/// Inline value object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexTypeFacet;

/// Finite set of instances offered as choices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedFacet;

/// Not persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotPersistedFacet;

/// Only code may persist instances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramPersistableOnlyFacet;

/// Participates in optimistic concurrency checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcurrencyCheckFacet;

/// Registered as a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceFacet;

/// View model identified by derived keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModelFacet {
    /// `DeriveKeys()`
    pub derive_keys: MethodId,
    /// `PopulateUsingKeys(string[])`
    pub populate_using_keys: MethodId,
}

// ============================================================================
// Actions
// ============================================================================

/// How to invoke an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionInvocationFacet {
    /// The action method
    pub method: MethodId,
    /// Type the action is declared on
    pub on_type: String,
    /// Declared return type
    pub return_type: TypeRef,
    /// Element type when returning a collection
    pub element_type: Option<String>,
    /// Static action
    pub is_static: bool,
}

impl ActionInvocationFacet {
    /// Whether the action returns a collection
    pub fn returns_collection(&self) -> bool {
        self.return_type.is_collection()
    }

    /// Whether the action returns a queryable
    pub fn returns_queryable(&self) -> bool {
        self.return_type.is_queryable()
    }
}

/// Where a page size came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSizeOrigin {
    /// Framework default
    Default,
    /// `[PageSize(n)]`
    Annotation,
}

/// Page size for collection results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSizeFacet {
    /// Rows per page
    pub value: u32,
    /// How it was determined
    pub origin: PageSizeOrigin,
}

impl PageSizeFacet {
    /// Default page size for queryable results
    pub const DEFAULT: u32 = 20;
}

/// Execution location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutedFacet {
    /// Where
    pub location: Where,
}

/// Side-effect contract of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PotencyFacet {
    /// No side effects
    QueryOnly,
    /// Repeatable
    Idempotent,
}

/// Offered from the finder menu of its return type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinderActionFacet {
    /// Menu prefix
    pub prefix: String,
}

/// A type a service action is contributed to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributee {
    /// Type receiving the contribution
    pub type_name: String,
    /// Sub-menu on the contributee
    pub sub_menu: Option<String>,
    /// Contribution id
    pub id: Option<String>,
}

/// Service action contributed to other object types
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContributedActionFacet {
    /// Receiving types
    pub contributees: Vec<Contributee>,
}

impl ContributedActionFacet {
    /// Contributee entry matching a type name exactly
    pub fn contributee(&self, type_name: &str) -> Option<&Contributee> {
        self.contributees.iter().find(|c| c.type_name == type_name)
    }
}

/// Imperative action-level validation (`ValidateX(params...)`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionValidationFacet {
    /// Validation method
    pub method: MethodId,
}

// ============================================================================
// Member helpers (properties, collections, parameters)
// ============================================================================

/// Property getter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyAccessorFacet {
    /// Property name
    pub property: String,
    /// Getter id
    pub getter: MethodId,
}

/// Property setter, directly or via `ModifyX`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySetterFacet {
    /// Setter or modify method
    pub method: MethodId,
    /// Set through a `ModifyX` method
    pub via_modify: bool,
}

/// `ClearX`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyClearFacet {
    /// Clear method
    pub method: MethodId,
}

/// Imperative choices (`ChoicesX` / `ChoicesNX`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoicesFacet {
    /// Choices method
    pub method: MethodId,
    /// Names of the parameters the method depends on
    pub parameter_names: Vec<String>,
}

/// Default value, computed or literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultFacet {
    /// `DefaultX` / `DefaultNX`
    Method(MethodId),
    /// `[DefaultValue(literal)]`
    Value(String),
}

/// What an auto-complete method returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoCompleteResult {
    /// Queryable of objects
    Queryable,
    /// Enumerable of strings
    Strings,
    /// Single object
    Single,
}

/// `AutoCompleteX` / `AutoCompleteNX`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoCompleteFacet {
    /// Auto-complete method
    pub method: MethodId,
    /// Minimum search text length
    pub min_length: u32,
    /// Maximum results
    pub page_size: u32,
    /// Return shape
    pub result: AutoCompleteResult,
}

/// Member value validation (`ValidateX(value)` / `ValidateNX(value)`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateFacet {
    /// Validation method
    pub method: MethodId,
}

/// `HideX()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HideForContextFacet {
    /// Hide method
    pub method: MethodId,
}

/// `DisableX()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisableForContextFacet {
    /// Disable method
    pub method: MethodId,
}

/// Role/user authorisation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthorizationFacet {
    /// Permitted roles
    pub roles: Vec<String>,
    /// Permitted users
    pub users: Vec<String>,
}

impl AuthorizationFacet {
    /// Whether a user with the given roles may see the member
    pub fn permits(&self, user: &str, roles: &[String]) -> bool {
        if self.roles.is_empty() && self.users.is_empty() {
            return true;
        }
        self.users.iter().any(|u| u == user) || self.roles.iter().any(|r| roles.contains(r))
    }
}

// ============================================================================
// Object behaviour
// ============================================================================

/// How an object's title is produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TitleFacet {
    /// `[Title]` property
    ViaProperty {
        /// Property name
        property: String,
        /// Getter id
        getter: MethodId,
    },
    /// `Title()` method
    ViaTitleMethod {
        /// Title method
        method: MethodId,
    },
    /// Declared `ToString()`, optionally with a `ToString(string mask)` overload
    ViaToString {
        /// `ToString()`
        method: MethodId,
        /// `ToString(string)`
        mask_method: Option<MethodId>,
    },
    /// No title source
    None,
}

/// `IconName()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconFacet {
    /// Icon method
    pub method: MethodId,
}

/// One `Validate(props...)` cross-property check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateObjectMethod {
    /// Validation method
    pub method: MethodId,
    /// Properties supplying the arguments, by parameter name
    pub property_names: Vec<String>,
}

/// Object-level validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateObjectFacet {
    /// Checks in declaration order
    pub methods: Vec<ValidateObjectMethod>,
}

/// Lifecycle events with conventional callback methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// After creation
    Created,
    /// Before first save
    Persisting,
    /// After first save
    Persisted,
    /// Before update
    Updating,
    /// After update
    Updated,
    /// Before load
    Loading,
    /// After load
    Loaded,
    /// Before delete
    Deleting,
    /// After delete
    Deleted,
    /// First save failed
    OnPersistingError,
    /// Update failed
    OnUpdatingError,
}

impl LifecycleEvent {
    /// Every event, in callback-factory order
    pub const ALL: [LifecycleEvent; 11] = [
        LifecycleEvent::Created,
        LifecycleEvent::Persisting,
        LifecycleEvent::Persisted,
        LifecycleEvent::Updating,
        LifecycleEvent::Updated,
        LifecycleEvent::Loading,
        LifecycleEvent::Loaded,
        LifecycleEvent::Deleting,
        LifecycleEvent::Deleted,
        LifecycleEvent::OnPersistingError,
        LifecycleEvent::OnUpdatingError,
    ];

    /// Conventional method name
    pub fn method_name(self) -> &'static str {
        match self {
            LifecycleEvent::Created => "Created",
            LifecycleEvent::Persisting => "Persisting",
            LifecycleEvent::Persisted => "Persisted",
            LifecycleEvent::Updating => "Updating",
            LifecycleEvent::Updated => "Updated",
            LifecycleEvent::Loading => "Loading",
            LifecycleEvent::Loaded => "Loaded",
            LifecycleEvent::Deleting => "Deleting",
            LifecycleEvent::Deleted => "Deleted",
            LifecycleEvent::OnPersistingError => "OnPersistingError",
            LifecycleEvent::OnUpdatingError => "OnUpdatingError",
        }
    }

    /// Error callbacks take the exception as their single parameter
    pub fn takes_error(self) -> bool {
        matches!(
            self,
            LifecycleEvent::OnPersistingError | LifecycleEvent::OnUpdatingError
        )
    }
}

/// Lifecycle callback; `method` is `None` when the type declares none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackFacet {
    /// Event
    pub event: LifecycleEvent,
    /// Callback method
    pub method: Option<MethodId>,
}

impl CallbackFacet {
    /// Null callback
    pub fn none(event: LifecycleEvent) -> Self {
        Self { event, method: None }
    }

    /// Whether a real callback exists
    pub fn is_null(&self) -> bool {
        self.method.is_none()
    }
}

/// How a type's menu is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MenuFacet {
    /// Every action, in member order
    Default,
    /// Static `Menu(IMenu)` method
    ViaMethod {
        /// Menu method
        method: MethodId,
    },
}
