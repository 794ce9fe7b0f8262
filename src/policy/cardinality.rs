use std::fmt;

use crate::error::PolicyError;

/// Which singleton lookup a cardinality check guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Lookup of one employee by id.
    Employee,
    /// Lookup of one position by id.
    Position,
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Employee => write!(f, "employee"),
            Self::Position => write!(f, "position"),
        }
    }
}

/// Enforce the one-row contract of a singleton id filter.
///
/// - 0 rows: `*NotFound`
/// - 1 row: the row
/// - more: `Invalid*Response`, since the source returned duplicates for one id
pub fn expect_single<T>(rows: Vec<T>, kind: RowKind, id: &str) -> Result<T, PolicyError> {
    let count = rows.len();
    let mut rows = rows.into_iter();
    match (rows.next(), count) {
        (Some(row), 1) => Ok(row),
        (None, _) => Err(match kind {
            RowKind::Employee => PolicyError::EmployeeNotFound { id: id.to_string() },
            RowKind::Position => PolicyError::PositionNotFound { id: id.to_string() },
        }),
        (Some(_), count) => Err(match kind {
            RowKind::Employee => PolicyError::InvalidEmployeeResponse {
                id: id.to_string(),
                count,
            },
            RowKind::Position => PolicyError::InvalidPositionResponse {
                id: id.to_string(),
                count,
            },
        }),
    }
}
