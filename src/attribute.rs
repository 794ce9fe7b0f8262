//! Attribute records: property bags attached to an employee or a position.
//!
//! An owner id alone is not unique; a record is addressed by the pair
//! `(kind, owner_id)`. Hierarchy relationships between positions are
//! expressed here rather than on [`Position`](crate::Position) itself.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::{AttributeValue, FromAttributeValue};

/// Property naming the position whose occupants manage the owning position.
pub const MANAGER_POSITION: &str = "managerPosition";

/// The kind of entity an attribute record is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OwnerKind {
    /// Attached to an employee.
    Employee,
    /// Attached to a position.
    Position,
    /// Any other owner kind a backend chooses to store.
    Other(String),
}

impl OwnerKind {
    /// Returns the wire string for this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Employee => "employee",
            Self::Position => "position",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for OwnerKind {
    fn from(s: &str) -> Self {
        match s {
            "employee" => Self::Employee,
            "position" => Self::Position,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for OwnerKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "employee" => Self::Employee,
            "position" => Self::Position,
            _ => Self::Other(s),
        }
    }
}

impl From<OwnerKind> for String {
    fn from(kind: OwnerKind) -> Self {
        match kind {
            OwnerKind::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// A property bag attached to an `(kind, owner_id)` pair.
///
/// # Examples
///
/// ```
/// use orgpolicy::{AttributeRecord, OwnerKind};
///
/// let record = AttributeRecord::new("2", OwnerKind::Position)
///     .with_property("managerPosition", "1");
///
/// assert_eq!(record.get::<String>("managerPosition").as_deref(), Some("1"));
/// assert_eq!(record.get::<i64>("managerPosition"), None);
/// assert_eq!(record.get::<String>("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRecord {
    /// Id of the owning employee or position.
    pub owner_id: String,
    /// Kind of the owner.
    pub kind: OwnerKind,
    /// Heterogeneous properties keyed by name.
    #[serde(default)]
    pub props: BTreeMap<String, AttributeValue>,
}

impl AttributeRecord {
    /// Creates a record with no properties.
    #[must_use]
    pub fn new(owner_id: impl Into<String>, kind: OwnerKind) -> Self {
        Self {
            owner_id: owner_id.into(),
            kind,
            props: BTreeMap::new(),
        }
    }

    /// An empty record, equivalent to "no record at all" for every lookup.
    #[must_use]
    pub fn empty(kind: OwnerKind) -> Self {
        Self::new(String::new(), kind)
    }

    /// Adds or replaces a property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    /// Returns true if this record is addressed by `(kind, owner_id)`.
    #[must_use]
    pub fn is_owned_by(&self, kind: &OwnerKind, owner_id: &str) -> bool {
        self.kind == *kind && self.owner_id == owner_id
    }

    /// Reads property `name` as a `T`.
    ///
    /// Returns `None` both when the property is missing and when it holds a
    /// value of another shape.
    #[must_use]
    pub fn get<T: FromAttributeValue>(&self, name: &str) -> Option<T> {
        get_attribute(self, name)
    }
}

/// Reads property `name` from `record` as a `T`.
///
/// Absent and incompatible values both yield `None`.
#[must_use]
pub fn get_attribute<T: FromAttributeValue>(record: &AttributeRecord, name: &str) -> Option<T> {
    record.props.get(name).and_then(T::from_attribute_value)
}
