//! Facets: typed behaviour descriptors attached to specifications
//!
//! Every facet belongs to exactly one `FacetKind`; a holder keeps at most one
//! facet per kind. Typed lookup goes through `FacetMarker`:
//!
//! ```ignore
//! let hidden = spec.get::<HiddenFacet>();
//! ```

pub mod payload;
pub mod set;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use payload::*;
pub use set::{FacetHolder, FacetSet};

/// Payload types that map to a single facet kind
pub trait FacetMarker: Sized {
    /// The kind this payload is stored under
    const KIND: FacetKind;

    /// Borrow the payload out of a facet of the matching kind
    fn from_facet(facet: &Facet) -> Option<&Self>;
}

macro_rules! define_facets {
    ($( $(#[$doc:meta])* $variant:ident($payload:ty) ),* $(,)?) => {
        /// Marker identifying a facet slot on a holder
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum FacetKind {
            $( $(#[$doc])* $variant, )*
            /// Lifecycle callback, one slot per event
            Callback(LifecycleEvent),
        }

        /// A facet attached to a specification
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub enum Facet {
            $( $(#[$doc])* $variant($payload), )*
            /// Lifecycle callback
            Callback(CallbackFacet),
        }

        impl Facet {
            /// The slot this facet occupies
            pub fn kind(&self) -> FacetKind {
                match self {
                    $( Facet::$variant(_) => FacetKind::$variant, )*
                    Facet::Callback(c) => FacetKind::Callback(c.event),
                }
            }
        }

        $(
            impl FacetMarker for $payload {
                const KIND: FacetKind = FacetKind::$variant;

                fn from_facet(facet: &Facet) -> Option<&Self> {
                    match facet {
                        Facet::$variant(p) => Some(p),
                        _ => None,
                    }
                }
            }

            impl From<$payload> for Facet {
                fn from(p: $payload) -> Self {
                    Facet::$variant(p)
                }
            }
        )*
    };
}

define_facets! {
    /// Display name
    Named(NamedFacet),
    /// Description
    DescribedAs(DescribedAsFacet),
    /// Plural name
    Plural(PluralFacet),
    /// Member order
    MemberOrder(MemberOrderFacet),
    /// Presentation hint
    PresentationHint(PresentationHintFacet),
    /// Display mask
    Mask(MaskFacet),
    /// Multi-line rendering
    MultiLine(MultiLineFacet),
    /// Table view
    TableView(TableViewFacet),
    /// Eager rendering
    Eagerly(EagerlyFacet),
    /// Semantic data type
    DataType(DataTypeFacet),
    /// Password input
    Password(PasswordFacet),
    /// Static hiding
    Hidden(HiddenFacet),
    /// Static disabling
    Disabled(DisabledFacet),
    /// Immutable type
    Immutable(ImmutableFacet),
    /// Mandatory/optional
    Mandatory(MandatoryFacet),
    /// Maximum length
    MaxLength(MaxLengthFacet),
    /// Numeric range
    Range(RangeFacet),
    /// Pattern validation
    RegEx(RegExFacet),
    /// Collection element type
    TypeOf(TypeOfFacet),
    /// Collection element spec
    ElementType(ElementTypeFacet),
    /// Collection shape
    Collection(CollectionFacet),
    /// Type kind and modifiers
    Type(TypeFacet),
    /// Parseable value type
    Value(ValueFacet),
    /// Enumeration
    Enum(EnumFacet),
    /// Inline value object
    ComplexType(ComplexTypeFacet),
    /// Bounded type
    Bounded(BoundedFacet),
    /// Not persisted
    NotPersisted(NotPersistedFacet),
    /// Program persistable only
    ProgramPersistableOnly(ProgramPersistableOnlyFacet),
    /// Concurrency check
    ConcurrencyCheck(ConcurrencyCheckFacet),
    /// Service type
    Service(ServiceFacet),
    /// View model
    ViewModel(ViewModelFacet),
    /// Action invocation
    ActionInvocation(ActionInvocationFacet),
    /// Page size
    PageSize(PageSizeFacet),
    /// Execution location
    Executed(ExecutedFacet),
    /// Query-only / idempotent
    Potency(PotencyFacet),
    /// Finder action
    FinderAction(FinderActionFacet),
    /// Contributed action
    ContributedAction(ContributedActionFacet),
    /// Action-level validation
    ActionValidation(ActionValidationFacet),
    /// Property getter
    PropertyAccessor(PropertyAccessorFacet),
    /// Property setter
    PropertySetter(PropertySetterFacet),
    /// Property clear
    PropertyClear(PropertyClearFacet),
    /// Choices
    Choices(ChoicesFacet),
    /// Default value
    Default(DefaultFacet),
    /// Auto-complete
    AutoComplete(AutoCompleteFacet),
    /// Member value validation
    Validate(ValidateFacet),
    /// Imperative hiding
    HideForContext(HideForContextFacet),
    /// Imperative disabling
    DisableForContext(DisableForContextFacet),
    /// Authorisation
    Authorization(AuthorizationFacet),
    /// Title
    Title(TitleFacet),
    /// Icon
    Icon(IconFacet),
    /// Object validation
    ValidateObject(ValidateObjectFacet),
    /// Menu
    Menu(MenuFacet),
}

impl From<CallbackFacet> for Facet {
    fn from(c: CallbackFacet) -> Self {
        Facet::Callback(c)
    }
}

impl fmt::Display for FacetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacetKind::Callback(event) => write!(f, "Callback({})", event.method_name()),
            other => write!(f, "{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::WhenTo;

    #[test]
    fn test_kind_and_marker() {
        let facet: Facet = HiddenFacet { when: WhenTo::Always }.into();
        assert_eq!(facet.kind(), FacetKind::Hidden);
        assert_eq!(HiddenFacet::KIND, FacetKind::Hidden);
        assert!(HiddenFacet::from_facet(&facet).is_some());
        assert!(DisabledFacet::from_facet(&facet).is_none());
    }

    #[test]
    fn test_callback_kinds_are_per_event() {
        let created: Facet = CallbackFacet::none(LifecycleEvent::Created).into();
        let loaded: Facet = CallbackFacet::none(LifecycleEvent::Loaded).into();
        assert_ne!(created.kind(), loaded.kind());
        assert_eq!(created.kind().to_string(), "Callback(Created)");
    }
}
