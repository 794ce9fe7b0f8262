//! Values an attribute record's property bag can hold.
//!
//! The property bag is schema-less: any JSON-shaped value may appear under
//! any name. Known scalar shapes get their own variant; arrays and objects
//! are kept as [`AttributeValue::Structured`].

use serde::{Deserialize, Serialize};

/// A single property value inside an attribute record.
///
/// Serialized untagged, so a bag reads naturally as JSON:
///
/// ```
/// use orgpolicy::AttributeValue;
///
/// let v: AttributeValue = serde_json::from_str("\"1\"").unwrap();
/// assert_eq!(v.as_string(), Some("1"));
///
/// let v: AttributeValue = serde_json::from_str("42").unwrap();
/// assert_eq!(v.as_int(), Some(42));
/// assert!(v.as_string().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Null,
    Structured(serde_json::Value),
}

impl AttributeValue {
    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float(_))
    }

    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Strict: an `Int` is not a float here.
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_structured(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Structured(v) => Some(v),
            _ => None,
        }
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Null => "null",
            Self::Structured(_) => "structured",
        }
    }

    /// Converts the value into plain JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(v) => serde_json::Value::Bool(*v),
            Self::Int(v) => serde_json::Value::from(*v),
            Self::Float(v) => serde_json::Number::from_f64(*v)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(v) => serde_json::Value::String(v.clone()),
            Self::Null => serde_json::Value::Null,
            Self::Structured(v) => v.clone(),
        }
    }
}

impl Default for AttributeValue {
    fn default() -> Self {
        Self::Null
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Null => write!(f, "null"),
            Self::Structured(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<serde_json::Value> for AttributeValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            other @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Self::Structured(other)
            }
        }
    }
}

/// Types that can be extracted from an [`AttributeValue`].
///
/// Extraction is strict: a value of the wrong shape yields `None` rather than
/// a coerced value.
pub trait FromAttributeValue: Sized {
    /// Attempts the conversion, returning `None` when the shape does not match.
    fn from_attribute_value(value: &AttributeValue) -> Option<Self>;
}

impl FromAttributeValue for String {
    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        value.as_string().map(str::to_string)
    }
}

impl FromAttributeValue for i64 {
    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        value.as_int()
    }
}

impl FromAttributeValue for f64 {
    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        value.as_float()
    }
}

impl FromAttributeValue for bool {
    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        value.as_bool()
    }
}

impl FromAttributeValue for serde_json::Value {
    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        Some(value.to_json())
    }
}

impl FromAttributeValue for AttributeValue {
    fn from_attribute_value(value: &AttributeValue) -> Option<Self> {
        Some(value.clone())
    }
}
