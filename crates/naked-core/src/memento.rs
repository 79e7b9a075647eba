//! Collection mementos
//!
//! A collection returned by an action has no identifier of its own. Its
//! memento records the target, the action and the arguments so the
//! collection can be re-created by executing the action again.
//!
//! Encoded form, one string per slot:
//!
//! ```text
//! element spec | action id | target oid | (parameter type | value)*
//! ```
//!
//! Oids and values are JSON; parameter types are their variant names.
//! A selection made from the collection is not encoded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::adapter::{ObjectAdapter, Oid};
use crate::error::{NakedError, NakedResult};
use crate::spec::{ActionSpec, RequestScope};
use crate::value::{DomainValue, ScalarValue};

/// How a parameter is stored in the encoded form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    /// Scalar
    Value,
    /// Reference by oid
    Object,
    /// Collection of scalars
    ValueCollection,
    /// Collection of references
    ObjectCollection,
}

impl ParameterType {
    fn as_str(self) -> &'static str {
        match self {
            ParameterType::Value => "Value",
            ParameterType::Object => "Object",
            ParameterType::ValueCollection => "ValueCollection",
            ParameterType::ObjectCollection => "ObjectCollection",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterType {
    type Err = NakedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Value" => Ok(ParameterType::Value),
            "Object" => Ok(ParameterType::Object),
            "ValueCollection" => Ok(ParameterType::ValueCollection),
            "ObjectCollection" => Ok(ParameterType::ObjectCollection),
            other => Err(NakedError::Memento(format!(
                "Unexpected parameter type value: {}",
                other
            ))),
        }
    }
}

/// One recorded argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MementoParameter {
    /// Scalar, `Null` for a missing argument
    Value(ScalarValue),
    /// Object reference
    Object(Oid),
    /// Scalars
    ValueCollection(Vec<ScalarValue>),
    /// Object references
    ObjectCollection(Vec<Oid>),
}

impl MementoParameter {
    /// Encoded tag
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            MementoParameter::Value(_) => ParameterType::Value,
            MementoParameter::Object(_) => ParameterType::Object,
            MementoParameter::ValueCollection(_) => ParameterType::ValueCollection,
            MementoParameter::ObjectCollection(_) => ParameterType::ObjectCollection,
        }
    }

    fn encode_value(&self) -> NakedResult<String> {
        Ok(match self {
            MementoParameter::Value(v) => serde_json::to_string(finite(v)?)?,
            MementoParameter::Object(oid) => oid.encode()?,
            MementoParameter::ValueCollection(vs) => {
                for v in vs {
                    finite(v)?;
                }
                serde_json::to_string(vs)?
            }
            MementoParameter::ObjectCollection(oids) => serde_json::to_string(oids)?,
        })
    }

    fn decode(tag: ParameterType, value: &str) -> NakedResult<Self> {
        let bad = |e: serde_json::Error| NakedError::Memento(format!("bad {} '{}': {}", tag, value, e));
        Ok(match tag {
            ParameterType::Value => MementoParameter::Value(serde_json::from_str(value).map_err(bad)?),
            ParameterType::Object => MementoParameter::Object(Oid::decode(value)?),
            ParameterType::ValueCollection => {
                MementoParameter::ValueCollection(serde_json::from_str(value).map_err(bad)?)
            }
            ParameterType::ObjectCollection => {
                MementoParameter::ObjectCollection(serde_json::from_str(value).map_err(bad)?)
            }
        })
    }
}

/// Identity of an action result that can be re-created
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionMemento {
    element_spec: String,
    action_id: String,
    target: Oid,
    parameters: Vec<MementoParameter>,
    selected: Option<Vec<Oid>>,
    /// Result was shown a page at a time
    pub is_paged: bool,
    /// Result is not queryable
    pub is_not_queryable: bool,
}

fn object_oid(value: &DomainValue) -> NakedResult<Oid> {
    value
        .as_object()
        .and_then(|h| h.read().oid.clone())
        .ok_or_else(|| NakedError::Memento(format!("argument {} has no object identifier", value)))
}

fn scalar(value: &DomainValue) -> NakedResult<ScalarValue> {
    let scalar = value
        .to_scalar()
        .ok_or_else(|| NakedError::Memento(format!("argument {} is not a scalar", value)))?;
    finite(&scalar)?;
    Ok(scalar)
}

/// JSON has no NaN or infinity, so such floats cannot be recorded
fn finite(value: &ScalarValue) -> NakedResult<&ScalarValue> {
    match value {
        ScalarValue::Float(f) if !f.is_finite() => Err(NakedError::Memento(format!(
            "argument {} cannot be recorded",
            f
        ))),
        other => Ok(other),
    }
}

impl CollectionMemento {
    /// Record an invocation of `action` on `target`
    pub fn new(
        scope: &RequestScope,
        target: &ObjectAdapter,
        action: &ActionSpec<'_>,
        parameters: &[ObjectAdapter],
    ) -> NakedResult<Self> {
        let mut target = target.clone();
        if scope.metamodel().get_specification(target.spec_name()).map(|s| s.is_view_model()) == Some(true)
        {
            scope.lifecycle().populate_view_model_keys(&mut target)?;
        }
        let target = target.require_oid()?.clone();

        let specs = action.parameters();
        let parameters = parameters
            .iter()
            .enumerate()
            .map(|(i, argument)| {
                let value = argument.value();
                let parseable_elements = specs.get(i).map(|p| p.is_parseable());
                Ok(match value {
                    DomainValue::Null => MementoParameter::Value(ScalarValue::Null),
                    DomainValue::Object(_) => MementoParameter::Object(object_oid(value)?),
                    DomainValue::Collection(items) => {
                        let of_values = parseable_elements
                            .unwrap_or_else(|| !items.iter().any(|v| v.as_object().is_some()));
                        if of_values {
                            MementoParameter::ValueCollection(
                                items.iter().map(scalar).collect::<NakedResult<_>>()?,
                            )
                        } else {
                            MementoParameter::ObjectCollection(
                                items.iter().map(object_oid).collect::<NakedResult<_>>()?,
                            )
                        }
                    }
                    _ => MementoParameter::Value(scalar(value)?),
                })
            })
            .collect::<NakedResult<Vec<_>>>()?;

        Ok(Self {
            element_spec: action.element_spec_name(),
            action_id: action.id().to_string(),
            target,
            parameters,
            selected: None,
            is_paged: false,
            is_not_queryable: false,
        })
    }

    /// Element spec name of the collection
    pub fn element_spec(&self) -> &str {
        &self.element_spec
    }

    /// Action that produced the collection
    pub fn action_id(&self) -> &str {
        &self.action_id
    }

    /// Object the action was invoked on
    pub fn target(&self) -> &Oid {
        &self.target
    }

    /// Recorded arguments
    pub fn parameters(&self) -> &[MementoParameter] {
        &self.parameters
    }

    /// Objects selected from the collection, if any
    pub fn selected(&self) -> &[Oid] {
        self.selected.as_deref().unwrap_or(&[])
    }

    /// Same invocation, restricted to a selection
    pub fn new_selection_memento(&self, objects: Vec<Oid>, is_paged: bool) -> Self {
        Self {
            selected: Some(objects),
            is_paged,
            ..self.clone()
        }
    }

    /// Encoded slots
    pub fn to_encoded_strings(&self) -> NakedResult<Vec<String>> {
        let mut slots = vec![
            self.element_spec.clone(),
            self.action_id.clone(),
            self.target.encode()?,
        ];
        for parameter in &self.parameters {
            slots.push(parameter.parameter_type().to_string());
            slots.push(parameter.encode_value()?);
        }
        Ok(slots)
    }

    /// Inverse of `to_encoded_strings`
    pub fn from_encoded_strings(strings: &[String]) -> NakedResult<Self> {
        let [element_spec, action_id, target, rest @ ..] = strings else {
            return Err(NakedError::Memento(format!(
                "expected at least 3 slots, found {}",
                strings.len()
            )));
        };
        if rest.len() % 2 != 0 {
            return Err(NakedError::Memento(
                "parameter type without a value".to_string(),
            ));
        }
        let parameters = rest
            .chunks_exact(2)
            .map(|pair| MementoParameter::decode(pair[0].parse()?, &pair[1]))
            .collect::<NakedResult<Vec<_>>>()?;
        Ok(Self {
            element_spec: element_spec.clone(),
            action_id: action_id.clone(),
            target: Oid::decode(target)?,
            parameters,
            selected: None,
            is_paged: false,
            is_not_queryable: false,
        })
    }

    /// Execute the action again; the result carries this memento as its identity
    pub fn recover_collection(&self, scope: &RequestScope) -> NakedResult<ObjectAdapter> {
        let target = scope.restore_object(&self.target)?;
        let spec = scope.spec_for(&target)?;
        let action = spec.action(&self.action_id).ok_or_else(|| {
            NakedError::Memento(format!("{} has no action {}", spec.full_name(), self.action_id))
        })?;
        let arguments = self
            .parameters
            .iter()
            .map(|p| self.restore_parameter(scope, p))
            .collect::<NakedResult<Vec<_>>>()?;

        let result = action
            .execute(Some(&target), Some(arguments.as_slice()))?
            .ok_or_else(|| NakedError::Memento(format!("{} returned nothing", self.action_id)))?;

        let result = match &self.selected {
            Some(selected) => {
                let items = result.value().as_collection().unwrap_or(&[]);
                let kept = items
                    .iter()
                    .filter(|item| {
                        item.as_object()
                            .and_then(|h| h.read().oid.clone())
                            .map(|oid| selected.contains(&oid))
                            .unwrap_or(false)
                    })
                    .cloned()
                    .collect::<Vec<_>>();
                ObjectAdapter::for_value(DomainValue::Collection(kept), result.spec_name())
            }
            None => result,
        };
        Ok(result.with_memento(self.clone()))
    }

    fn restore_parameter(
        &self,
        scope: &RequestScope,
        parameter: &MementoParameter,
    ) -> NakedResult<ObjectAdapter> {
        Ok(match parameter {
            MementoParameter::Value(v) => ObjectAdapter::for_value(v.clone().into(), ""),
            MementoParameter::Object(oid) => scope.restore_object(oid)?,
            MementoParameter::ValueCollection(vs) => ObjectAdapter::for_value(
                DomainValue::Collection(vs.iter().cloned().map(DomainValue::from).collect()),
                "",
            ),
            MementoParameter::ObjectCollection(oids) => {
                let items = oids
                    .iter()
                    .map(|oid| scope.restore_object(oid).map(ObjectAdapter::into_value))
                    .collect::<NakedResult<Vec<_>>>()?;
                ObjectAdapter::for_value(DomainValue::Collection(items), "")
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn memento(parameters: Vec<MementoParameter>) -> CollectionMemento {
        CollectionMemento {
            element_spec: "Shop.Customer".into(),
            action_id: "FindByName".into(),
            target: Oid::Service {
                type_name: "Shop.CustomerRepository".into(),
            },
            parameters,
            selected: None,
            is_paged: false,
            is_not_queryable: false,
        }
    }

    #[test]
    fn test_encoded_slot_layout() {
        let m = memento(vec![
            MementoParameter::Value(ScalarValue::Str("Al".into())),
            MementoParameter::Object(Oid::Persistent {
                type_name: "Shop.Order".into(),
                key: 4,
            }),
        ]);
        let slots = m.to_encoded_strings().expect("encode");
        assert_eq!(slots.len(), 7);
        assert_eq!(slots[0], "Shop.Customer");
        assert_eq!(slots[1], "FindByName");
        assert_eq!(slots[3], "Value");
        assert_eq!(slots[5], "Object");
        assert_eq!(CollectionMemento::from_encoded_strings(&slots).expect("decode"), m);
    }

    #[test]
    fn test_rejects_malformed_slots() {
        let short = vec!["Shop.Customer".to_string(), "FindByName".to_string()];
        assert!(matches!(
            CollectionMemento::from_encoded_strings(&short),
            Err(NakedError::Memento(_))
        ));

        let mut dangling = memento(vec![]).to_encoded_strings().expect("encode");
        dangling.push("Value".into());
        assert!(CollectionMemento::from_encoded_strings(&dangling).is_err());

        let mut unknown = memento(vec![]).to_encoded_strings().expect("encode");
        unknown.extend(["Mystery".to_string(), "1".to_string()]);
        let err = CollectionMemento::from_encoded_strings(&unknown).expect_err("unknown tag");
        assert!(err.to_string().contains("Mystery"));
    }

    #[test]
    fn test_non_finite_floats_are_not_encoded() {
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let single = memento(vec![MementoParameter::Value(ScalarValue::Float(f))]);
            assert!(matches!(single.to_encoded_strings(), Err(NakedError::Memento(_))));

            let many = memento(vec![MementoParameter::ValueCollection(vec![
                ScalarValue::Int(1),
                ScalarValue::Float(f),
            ])]);
            assert!(matches!(many.to_encoded_strings(), Err(NakedError::Memento(_))));
        }
        assert!(scalar(&DomainValue::Float(f64::NAN)).is_err());
        assert_eq!(scalar(&DomainValue::Float(1.5)).expect("finite"), ScalarValue::Float(1.5));
    }

    #[test]
    fn test_selection_is_not_encoded() {
        let m = memento(vec![]);
        let selection = m.new_selection_memento(
            vec![Oid::Persistent {
                type_name: "Shop.Customer".into(),
                key: 1,
            }],
            true,
        );
        assert_eq!(selection.selected().len(), 1);
        assert!(selection.is_paged);
        assert_eq!(
            selection.to_encoded_strings().expect("encode"),
            m.to_encoded_strings().expect("encode")
        );
    }

    fn scalar_strategy() -> impl Strategy<Value = ScalarValue> {
        prop_oneof![
            Just(ScalarValue::Null),
            any::<bool>().prop_map(ScalarValue::Bool),
            any::<i64>().prop_map(ScalarValue::Int),
            (-4000i32..4000).prop_map(|i| ScalarValue::Float(f64::from(i) / 4.0)),
            "[a-zA-Z0-9 ,|\"]{0,12}".prop_map(ScalarValue::Str),
        ]
    }

    fn oid_strategy() -> impl Strategy<Value = Oid> {
        prop_oneof![
            (0u64..1000).prop_map(|key| Oid::Persistent {
                type_name: "Shop.Order".into(),
                key
            }),
            (0u64..1000).prop_map(|serial| Oid::Transient {
                type_name: "Shop.Order".into(),
                serial
            }),
            prop::collection::vec("[a-z0-9]{1,6}", 1..3).prop_map(|keys| Oid::ViewModel {
                type_name: "Shop.Basket".into(),
                keys
            }),
        ]
    }

    fn parameter_strategy() -> impl Strategy<Value = MementoParameter> {
        prop_oneof![
            scalar_strategy().prop_map(MementoParameter::Value),
            oid_strategy().prop_map(MementoParameter::Object),
            prop::collection::vec(scalar_strategy(), 0..4).prop_map(MementoParameter::ValueCollection),
            prop::collection::vec(oid_strategy(), 0..4).prop_map(MementoParameter::ObjectCollection),
        ]
    }

    proptest! {
        #[test]
        fn test_decoding_restores_every_parameter(parameters in prop::collection::vec(parameter_strategy(), 0..5)) {
            let m = memento(parameters);
            let slots = m.to_encoded_strings().expect("encode");
            prop_assert_eq!(slots.len(), 3 + 2 * m.parameters().len());
            let decoded = CollectionMemento::from_encoded_strings(&slots).expect("decode");
            prop_assert_eq!(decoded, m);
        }
    }
}
