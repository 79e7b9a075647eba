//! Naming conventions: recognised prefixes, natural names, plurals

use crate::error::ReflectionResult;
use crate::facet::{NamedFacet, PluralFacet};
use crate::metamodel::PartialMetamodel;
use crate::reflect::{MethodInfo, PropertyInfo};
use crate::spec::Specification;

use super::{FacetFactory, FactoryContext, FactoryMeta, FeatureType, MethodRemover};

/// `AutoComplete`
pub const AUTO_COMPLETE_PREFIX: &str = "AutoComplete";
/// `Choices`
pub const CHOICES_PREFIX: &str = "Choices";
/// `Clear`
pub const CLEAR_PREFIX: &str = "Clear";
/// `Default`
pub const DEFAULT_PREFIX: &str = "Default";
/// `Disable`
pub const DISABLE_PREFIX: &str = "Disable";
/// `Hide`
pub const HIDE_PREFIX: &str = "Hide";
/// `Modify`
pub const MODIFY_PREFIX: &str = "Modify";
/// `Validate`
pub const VALIDATE_PREFIX: &str = "Validate";
/// `AddTo`
pub const ADD_TO_PREFIX: &str = "AddTo";
/// `RemoveFrom`
pub const REMOVE_FROM_PREFIX: &str = "RemoveFrom";
/// `get_`
pub const GETTER_PREFIX: &str = "get_";
/// `set_`
pub const SETTER_PREFIX: &str = "set_";
/// `IconName`
pub const ICON_NAME_METHOD: &str = "IconName";
/// `Title`
pub const TITLE_METHOD: &str = "Title";
/// `ToString`
pub const TO_STRING_METHOD: &str = "ToString";
/// `Menu`
pub const MENU_METHOD: &str = "Menu";
/// `DeriveKeys`
pub const DERIVE_KEYS_METHOD: &str = "DeriveKeys";
/// `PopulateUsingKeys`
pub const POPULATE_USING_KEYS_METHOD: &str = "PopulateUsingKeys";

/// Split a camel-case identifier into words: `FirstName` -> `First Name`
///
/// Runs of capitals stay together (`HTMLPage` -> `HTML Page`), underscores
/// become spaces and the first letter is capitalised.
pub fn natural_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
            continue;
        }
        if i > 0 && !out.is_empty() && !out.ends_with(' ') {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map(|n| n.is_lowercase()).unwrap_or(false);
            let boundary = (c.is_uppercase() && (prev.is_lowercase() || prev.is_ascii_digit()))
                || (c.is_uppercase() && prev.is_uppercase() && next_is_lower)
                || (c.is_ascii_digit() && prev.is_alphabetic());
            if boundary {
                out.push(' ');
            }
        }
        if out.is_empty() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
    }
    out.trim_end().to_string()
}

/// English plural of a name
pub fn pluralize(name: &str) -> String {
    let lower = name.to_lowercase();
    if let Some(stem) = name.strip_suffix('y') {
        let before = stem.chars().last().map(|c| c.to_ascii_lowercase());
        if !matches!(before, Some('a' | 'e' | 'i' | 'o' | 'u')) {
            return format!("{}ies", stem);
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        return format!("{}es", name);
    }
    format!("{}s", name)
}

/// Name with a recognised prefix removed, if it had one
pub fn strip_prefix<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    name.strip_prefix(prefix).filter(|rest| !rest.is_empty())
}

static DEFAULT_NAMING_META: FactoryMeta = FactoryMeta {
    name: "DefaultNaming",
    feature_types: FeatureType::EVERYTHING,
    prefixes: &[],
};

/// Infer names (and plurals for objects) where nothing was annotated
pub struct DefaultNamingFacetFactory {
    order: usize,
}

impl DefaultNamingFacetFactory {
    /// Create the factory at a position in the chain
    pub fn new(order: usize) -> Self {
        Self { order }
    }

    fn infer_name(spec: &mut Specification, raw: &str) {
        spec.facets_mut().add_if_absent(NamedFacet {
            value: natural_name(raw),
            inferred: true,
        });
    }
}

impl FacetFactory for DefaultNamingFacetFactory {
    fn meta(&self) -> &FactoryMeta {
        &DEFAULT_NAMING_META
    }

    fn numeric_order(&self) -> usize {
        self.order
    }

    fn process_type(
        &self,
        ctx: &FactoryContext<'_>,
        _remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        let short = ctx.type_info.name();
        Self::infer_name(spec, short);
        let singular = spec.name().to_string();
        spec.facets_mut().add_if_absent(PluralFacet {
            value: pluralize(&singular),
            inferred: true,
        });
        Ok(metamodel)
    }

    fn process_property(
        &self,
        _ctx: &FactoryContext<'_>,
        property: &PropertyInfo,
        _remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        Self::infer_name(spec, &property.name);
        Ok(metamodel)
    }

    fn process_method(
        &self,
        _ctx: &FactoryContext<'_>,
        method: &MethodInfo,
        _remover: &mut dyn MethodRemover,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        Self::infer_name(spec, &method.name);
        Ok(metamodel)
    }

    fn process_params(
        &self,
        _ctx: &FactoryContext<'_>,
        method: &MethodInfo,
        index: usize,
        spec: &mut Specification,
        metamodel: PartialMetamodel,
    ) -> ReflectionResult<PartialMetamodel> {
        if let Some(parameter) = method.parameters.get(index) {
            Self::infer_name(spec, &parameter.name);
        }
        Ok(metamodel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_name() {
        assert_eq!(natural_name("FirstName"), "First Name");
        assert_eq!(natural_name("firstName"), "First Name");
        assert_eq!(natural_name("HTMLPage"), "HTML Page");
        assert_eq!(natural_name("Address2"), "Address 2");
        assert_eq!(natural_name("order_lines"), "Order lines");
        assert_eq!(natural_name("Id"), "Id");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("Customer"), "Customers");
        assert_eq!(pluralize("Category"), "Categories");
        assert_eq!(pluralize("Day"), "Days");
        assert_eq!(pluralize("Address"), "Addresses");
        assert_eq!(pluralize("Box"), "Boxes");
        assert_eq!(pluralize("Branch"), "Branches");
    }

    #[test]
    fn test_strip_prefix_needs_a_rest() {
        assert_eq!(strip_prefix("HideName", HIDE_PREFIX), Some("Name"));
        assert_eq!(strip_prefix("Hide", HIDE_PREFIX), None);
        assert_eq!(strip_prefix("Title", HIDE_PREFIX), None);
    }
}
