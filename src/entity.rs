//! Employees and positions.
//!
//! Both are plain records owned by whichever source serves them. Ids are
//! opaque strings: the crate never parses them and the empty string is a
//! valid id like any other.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A person occupying exactly one position.
///
/// # Examples
///
/// ```
/// use orgpolicy::Employee;
///
/// let e = Employee::new("2", "John 2", "2");
/// assert_eq!(e.position_id, "2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Opaque employee id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Id of the position this employee currently occupies.
    pub position_id: String,
}

impl Employee {
    /// Creates an employee record.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, position_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position_id: position_id.into(),
        }
    }
}

impl fmt::Display for Employee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.id, self.name, self.position_id)
    }
}

/// A named role that zero or more employees occupy.
///
/// Positions carry no hierarchy of their own; relationships between
/// positions live in attribute records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Opaque position id.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl Position {
    /// Creates a position record.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.name)
    }
}
