//! Declarative annotations carried by reflected elements

use serde::{Deserialize, Serialize};

/// When a hidden/disabled/immutable rule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WhenTo {
    /// Never applies
    #[default]
    Never,
    /// Always applies
    Always,
    /// Applies once the object has been persisted
    OncePersisted,
    /// Applies while the object is still transient
    UntilPersisted,
}

impl WhenTo {
    /// Whether the rule is in force for an object in the given state
    pub fn applies(self, is_persistent: bool) -> bool {
        match self {
            WhenTo::Never => false,
            WhenTo::Always => true,
            WhenTo::OncePersisted => is_persistent,
            WhenTo::UntilPersisted => !is_persistent,
        }
    }
}

/// Where an action is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Where {
    /// Framework decides
    #[default]
    Default,
    /// On the client
    Locally,
    /// On the server
    Remotely,
}

/// What to do eagerly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EagerlyDo {
    /// Render the member eagerly
    #[default]
    Rendering,
}

/// Semantic data type of a string member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Obscured input
    Password,
    /// Phone number
    PhoneNumber,
    /// Email address
    EmailAddress,
    /// Multi-line text
    MultilineText,
    /// Hyperlink
    Url,
    /// Plain text
    Text,
}

/// A recognised annotation on a type, member or parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "attribute")]
pub enum Attribute {
    /// `[Hidden(when)]`
    Hidden {
        /// When hidden
        #[serde(default = "always")]
        when: WhenTo,
    },
    /// `[ScaffoldColumn(bool)]`
    ScaffoldColumn {
        /// Scaffold flag; false hides the member
        scaffold: bool,
    },
    /// `[Disabled(when)]`
    Disabled {
        /// When disabled
        #[serde(default = "always")]
        when: WhenTo,
    },
    /// `[Title]` on a property
    Title,
    /// `[MemberOrder(Sequence, Name)]`
    MemberOrder {
        /// Dewey-decimal sequence, kept as text
        sequence: String,
        /// Optional group name
        #[serde(default)]
        name: String,
    },
    /// `[PageSize(n)]`
    PageSize {
        /// Page size
        value: u32,
    },
    /// `[TypeOf(type)]`
    TypeOf {
        /// Element type full name
        type_name: String,
    },
    /// `[Mask(format)]`
    Mask {
        /// Display mask
        value: String,
    },
    /// `[Range(min, max)]`
    Range {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
    /// `[RegEx(Validation, Message, ...)]`
    RegEx {
        /// Validation pattern
        validation: String,
        /// Failure message
        #[serde(default)]
        message: String,
        /// Case sensitivity
        #[serde(default = "yes")]
        case_sensitive: bool,
        /// Format pattern
        #[serde(default)]
        format: String,
    },
    /// `[RegularExpression(pattern)]`
    RegularExpression {
        /// Validation pattern
        pattern: String,
        /// Failure message
        #[serde(default)]
        error_message: String,
    },
    /// `[DescribedAs(text)]`
    DescribedAs {
        /// Description
        value: String,
    },
    /// `[Description(text)]`
    Description {
        /// Description
        value: String,
    },
    /// `[DisplayName(text)]`
    DisplayName {
        /// Display name
        value: String,
    },
    /// `[Named(text)]`
    Named {
        /// Display name
        value: String,
    },
    /// `[Plural(text)]`
    Plural {
        /// Plural name
        value: String,
    },
    /// `[DataType(kind)]`
    DataType {
        /// Semantic data type
        data_type: DataType,
    },
    /// `[PresentationHint(hint)]`
    PresentationHint {
        /// Hint passed to clients
        value: String,
    },
    /// `[Eagerly(what)]`
    Eagerly {
        /// What to do eagerly
        #[serde(default)]
        what: EagerlyDo,
    },
    /// `[FinderAction(prefix)]`
    FinderAction {
        /// Menu prefix
        #[serde(default)]
        prefix: String,
    },
    /// `[ContributedAction(subMenu, id)]` on a parameter
    ContributedAction {
        /// Sub-menu on the contributee
        #[serde(default)]
        sub_menu: Option<String>,
        /// Contribution id
        #[serde(default)]
        id: Option<String>,
    },
    /// `[Optionally]`
    Optionally,
    /// `[Required]`
    Required,
    /// `[MaxLength(n)]`
    MaxLength {
        /// Maximum length
        value: u32,
    },
    /// `[StringLength(n)]`
    StringLength {
        /// Maximum length
        maximum: u32,
    },
    /// `[NakedObjectsIgnore]`
    NakedObjectsIgnore,
    /// `[Executed(where)]`
    Executed {
        /// Execution location
        location: Where,
    },
    /// `[QueryOnly]`
    QueryOnly,
    /// `[Idempotent]`
    Idempotent,
    /// `[ComplexType]`
    ComplexType,
    /// `[Bounded]`
    Bounded,
    /// `[Immutable(when)]`
    Immutable {
        /// When immutable
        #[serde(default = "always")]
        when: WhenTo,
    },
    /// `[NotPersisted]`
    NotPersisted,
    /// `[ProgramPersistableOnly]`
    ProgramPersistableOnly,
    /// `[ConcurrencyCheck]`
    ConcurrencyCheck,
    /// `[MultiLine(lines, width)]`
    MultiLine {
        /// Visible lines
        #[serde(default = "six")]
        number_of_lines: u32,
        /// Visible width
        #[serde(default)]
        width: u32,
    },
    /// `[TableView(title, columns...)]`
    TableView {
        /// Show the title column
        #[serde(default = "yes")]
        title: bool,
        /// Columns to show
        #[serde(default)]
        columns: Vec<String>,
    },
    /// `[DefaultValue(literal)]`
    DefaultValue {
        /// Literal default, parsed by the value layer
        value: String,
    },
    /// `[Authorize(Roles, Users)]`
    Authorize {
        /// Permitted roles
        #[serde(default)]
        roles: Vec<String>,
        /// Permitted users
        #[serde(default)]
        users: Vec<String>,
    },
}

fn always() -> WhenTo {
    WhenTo::Always
}

fn yes() -> bool {
    true
}

fn six() -> u32 {
    6
}

impl Attribute {
    /// `[Hidden(WhenTo.Always)]`
    pub fn hidden() -> Self {
        Attribute::Hidden { when: WhenTo::Always }
    }

    /// `[MemberOrder(Sequence = seq)]`
    pub fn member_order(sequence: impl Into<String>) -> Self {
        Attribute::MemberOrder {
            sequence: sequence.into(),
            name: String::new(),
        }
    }

    /// `[Named(name)]`
    pub fn named(value: impl Into<String>) -> Self {
        Attribute::Named { value: value.into() }
    }

    /// `[ContributedAction]` with no sub-menu
    pub fn contributed() -> Self {
        Attribute::ContributedAction {
            sub_menu: None,
            id: None,
        }
    }
}

/// Find the first attribute for which `f` yields a value
pub fn find_attribute<'a, T>(
    attributes: &'a [Attribute],
    f: impl Fn(&'a Attribute) -> Option<T>,
) -> Option<T> {
    attributes.iter().find_map(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_when_to_applies() {
        assert!(WhenTo::Always.applies(false));
        assert!(!WhenTo::Never.applies(true));
        assert!(WhenTo::OncePersisted.applies(true));
        assert!(!WhenTo::OncePersisted.applies(false));
        assert!(WhenTo::UntilPersisted.applies(false));
    }

    #[test]
    fn test_attribute_json_defaults() {
        let attr: Attribute = serde_json::from_str(r#"{"attribute":"Hidden"}"#).expect("parse");
        assert_eq!(attr, Attribute::hidden());

        let attr: Attribute =
            serde_json::from_str(r#"{"attribute":"MemberOrder","sequence":"2.1"}"#).expect("parse");
        assert_eq!(attr, Attribute::member_order("2.1"));

        let attr: Attribute = serde_json::from_str(r#"{"attribute":"RegEx","validation":"^a"}"#).expect("parse");
        match attr {
            Attribute::RegEx { case_sensitive, .. } => assert!(case_sensitive),
            other => panic!("unexpected {:?}", other),
        }
    }
}
