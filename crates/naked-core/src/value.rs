//! Domain values
//!
//! Domain objects are plain field maps shared behind `ObjectHandle`s. Scalars
//! that must cross a process boundary (memento parameters) convert to
//! `ScalarValue`, the serialisable subset of `DomainValue`.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::adapter::Oid;

/// Shared, lockable domain object
pub type ObjectHandle = Arc<RwLock<DomainObject>>;

/// An instance of a domain type
#[derive(Debug, Clone, Default)]
pub struct DomainObject {
    /// Full name of the object's type
    pub type_name: String,
    /// Identity assigned by the lifecycle manager
    pub oid: Option<Oid>,
    fields: FxHashMap<String, DomainValue>,
}

impl DomainObject {
    /// Empty instance of a type
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            oid: None,
            fields: FxHashMap::default(),
        }
    }

    /// Builder-style field assignment
    pub fn with(mut self, field: impl Into<String>, value: impl Into<DomainValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Field value; unset fields read as `Null`
    pub fn get(&self, field: &str) -> DomainValue {
        self.fields.get(field).cloned().unwrap_or(DomainValue::Null)
    }

    /// Assign a field
    pub fn set(&mut self, field: impl Into<String>, value: DomainValue) {
        self.fields.insert(field.into(), value);
    }

    /// Reset a field to `Null`
    pub fn clear(&mut self, field: &str) {
        self.fields.remove(field);
    }

    /// Wrap in a shared handle
    pub fn into_handle(self) -> ObjectHandle {
        Arc::new(RwLock::new(self))
    }
}

/// A value flowing through properties, parameters and action results
#[derive(Debug, Clone, Default)]
pub enum DomainValue {
    /// No value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Any integral number
    Int(i64),
    /// Any floating point or decimal number
    Float(f64),
    /// Text, also used for dates and GUIDs
    Str(String),
    /// Reference to a domain object
    Object(ObjectHandle),
    /// Collection of values or references
    Collection(Vec<DomainValue>),
}

impl DomainValue {
    /// Wrap a new object
    pub fn object(object: DomainObject) -> Self {
        DomainValue::Object(object.into_handle())
    }

    /// Whether this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, DomainValue::Null)
    }

    /// Boolean content
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DomainValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral content
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DomainValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric content, integral values widened
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DomainValue::Int(i) => Some(*i as f64),
            DomainValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text content
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DomainValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Referenced object
    pub fn as_object(&self) -> Option<&ObjectHandle> {
        match self {
            DomainValue::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Collection elements
    pub fn as_collection(&self) -> Option<&[DomainValue]> {
        match self {
            DomainValue::Collection(items) => Some(items),
            _ => None,
        }
    }

    /// Serialisable form of a scalar; `None` for objects and collections
    pub fn to_scalar(&self) -> Option<ScalarValue> {
        match self {
            DomainValue::Null => Some(ScalarValue::Null),
            DomainValue::Bool(b) => Some(ScalarValue::Bool(*b)),
            DomainValue::Int(i) => Some(ScalarValue::Int(*i)),
            DomainValue::Float(f) => Some(ScalarValue::Float(*f)),
            DomainValue::Str(s) => Some(ScalarValue::Str(s.clone())),
            DomainValue::Object(_) | DomainValue::Collection(_) => None,
        }
    }

    /// Text used as a title or validation subject
    pub fn title(&self) -> String {
        match self {
            DomainValue::Null => String::new(),
            DomainValue::Bool(b) => b.to_string(),
            DomainValue::Int(i) => i.to_string(),
            DomainValue::Float(f) => f.to_string(),
            DomainValue::Str(s) => s.clone(),
            DomainValue::Object(o) => {
                let object = o.read();
                match &object.oid {
                    Some(oid) => oid.to_string(),
                    None => object.type_name.clone(),
                }
            }
            DomainValue::Collection(items) => format!("{} items", items.len()),
        }
    }
}

impl PartialEq for DomainValue {
    /// Objects compare by identity, everything else by value
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DomainValue::Null, DomainValue::Null) => true,
            (DomainValue::Bool(a), DomainValue::Bool(b)) => a == b,
            (DomainValue::Int(a), DomainValue::Int(b)) => a == b,
            (DomainValue::Float(a), DomainValue::Float(b)) => a == b,
            (DomainValue::Str(a), DomainValue::Str(b)) => a == b,
            (DomainValue::Object(a), DomainValue::Object(b)) => Arc::ptr_eq(a, b),
            (DomainValue::Collection(a), DomainValue::Collection(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for DomainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title())
    }
}

impl From<bool> for DomainValue {
    fn from(b: bool) -> Self {
        DomainValue::Bool(b)
    }
}

impl From<i64> for DomainValue {
    fn from(i: i64) -> Self {
        DomainValue::Int(i)
    }
}

impl From<i32> for DomainValue {
    fn from(i: i32) -> Self {
        DomainValue::Int(i64::from(i))
    }
}

impl From<f64> for DomainValue {
    fn from(f: f64) -> Self {
        DomainValue::Float(f)
    }
}

impl From<&str> for DomainValue {
    fn from(s: &str) -> Self {
        DomainValue::Str(s.to_string())
    }
}

impl From<String> for DomainValue {
    fn from(s: String) -> Self {
        DomainValue::Str(s)
    }
}

impl From<ObjectHandle> for DomainValue {
    fn from(o: ObjectHandle) -> Self {
        DomainValue::Object(o)
    }
}

impl From<Vec<DomainValue>> for DomainValue {
    fn from(items: Vec<DomainValue>) -> Self {
        DomainValue::Collection(items)
    }
}

/// Serialisable scalar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    /// No value
    Null,
    /// Boolean
    Bool(bool),
    /// Integral number
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Text
    Str(String),
}

impl From<ScalarValue> for DomainValue {
    fn from(s: ScalarValue) -> Self {
        match s {
            ScalarValue::Null => DomainValue::Null,
            ScalarValue::Bool(b) => DomainValue::Bool(b),
            ScalarValue::Int(i) => DomainValue::Int(i),
            ScalarValue::Float(f) => DomainValue::Float(f),
            ScalarValue::Str(s) => DomainValue::Str(s),
        }
    }
}
