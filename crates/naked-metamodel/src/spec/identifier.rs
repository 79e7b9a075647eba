//! Identifiers of specifications

use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualifies a specification: owning type, member, and for actions their
/// parameter types; parameters add their index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    type_name: String,
    member_name: String,
    parameter_types: Vec<String>,
    parameter_index: Option<usize>,
    is_action: bool,
}

impl Identifier {
    /// Identifier of an object type
    pub fn for_type(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            member_name: String::new(),
            parameter_types: Vec::new(),
            parameter_index: None,
            is_action: false,
        }
    }

    /// Identifier of a property or collection
    pub fn for_field(type_name: impl Into<String>, member_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            member_name: member_name.into(),
            parameter_types: Vec::new(),
            parameter_index: None,
            is_action: false,
        }
    }

    /// Identifier of an action
    pub fn for_action(
        type_name: impl Into<String>,
        member_name: impl Into<String>,
        parameter_types: Vec<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            member_name: member_name.into(),
            parameter_types,
            parameter_index: None,
            is_action: true,
        }
    }

    /// Identifier of an action parameter
    pub fn for_parameter(action: &Identifier, index: usize) -> Self {
        let mut id = action.clone();
        id.parameter_index = Some(index);
        id
    }

    /// Owning type
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Member name; empty for types
    pub fn member_name(&self) -> &str {
        &self.member_name
    }

    /// Action parameter types
    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    /// Parameter index, for parameter identifiers
    pub fn parameter_index(&self) -> Option<usize> {
        self.parameter_index
    }

    /// Whether this identifies an object type
    pub fn is_type(&self) -> bool {
        self.member_name.is_empty()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name)?;
        if self.member_name.is_empty() {
            return Ok(());
        }
        write!(f, "#{}", self.member_name)?;
        if self.is_action {
            write!(f, "({})", self.parameter_types.join(","))?;
        }
        if let Some(i) = self.parameter_index {
            write!(f, "[{}]", i)?;
        }
        Ok(())
    }
}
