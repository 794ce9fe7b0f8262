//! Abstract source traits consumed by the policy resolver.
//!
//! These traits define the contract that data backends must implement.
//! They are kept narrow on purpose so that backends can be mixed:
//! employees from a directory service, positions from an HR database,
//! attribute records from a config store.
//!
//! Every operation is a pure read. Implementations must:
//! - return a well-formed (possibly empty) list in their natural order
//! - never emit a row twice because an id was repeated in the filter
//! - treat unknown ids as "no rows", never as an error
//! - be safe to call concurrently from many threads

use thiserror::Error;

use crate::attribute::{AttributeRecord, OwnerKind};
use crate::context::QueryContext;
use crate::entity::{Employee, Position};

/// Errors a source may return. The resolver passes them through unchanged.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Backend failed while serving the read.
    #[error("Source backend error: {0}")]
    Backend(String),

    /// Backend could not be reached.
    #[error("Source connection error: {0}")]
    Connection(String),

    /// The query context was cancelled.
    #[error("Query cancelled")]
    Cancelled,

    /// The query context's deadline passed.
    #[error("Query deadline exceeded")]
    DeadlineExceeded,

    /// A directory snapshot could not be loaded.
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl SourceError {
    /// Returns true if retrying the same read may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::DeadlineExceeded)
    }
}

/// Id selection for list operations.
///
/// `All` is the "no filter" sentinel. `Only` matches ids literally: the
/// empty string matches only rows whose id is the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdFilter {
    /// Every row.
    All,
    /// Rows whose id appears in the list.
    Only(Vec<String>),
}

impl IdFilter {
    /// A filter for exactly one id.
    #[must_use]
    pub fn single(id: impl Into<String>) -> Self {
        Self::Only(vec![id.into()])
    }

    /// Returns true if `id` passes this filter.
    #[must_use]
    pub fn matches(&self, id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(ids) => ids.iter().any(|candidate| candidate == id),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for IdFilter {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::Only(iter.into_iter().map(Into::into).collect())
    }
}

/// Owner-kind selection for attribute listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindFilter {
    /// Records of every kind.
    All,
    /// Records of one kind.
    Kind(OwnerKind),
}

impl KindFilter {
    /// Returns true if `kind` passes this filter.
    #[must_use]
    pub fn matches(&self, kind: &OwnerKind) -> bool {
        match self {
            Self::All => true,
            Self::Kind(expected) => expected == kind,
        }
    }
}

impl From<&str> for KindFilter {
    /// The empty string is reserved for "all kinds".
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Self::All
        } else {
            Self::Kind(OwnerKind::from(s))
        }
    }
}

impl From<OwnerKind> for KindFilter {
    fn from(kind: OwnerKind) -> Self {
        Self::Kind(kind)
    }
}

/// Source of employee rows.
pub trait EmployeeSource: Send + Sync {
    /// List employees whose id passes `ids`.
    fn list_employees(&self, ctx: &QueryContext, ids: &IdFilter) -> Result<Vec<Employee>, SourceError>;

    /// List employees whose position id passes `position_ids`.
    ///
    /// Several employees may share one position.
    fn list_employees_by_position(
        &self,
        ctx: &QueryContext,
        position_ids: &IdFilter,
    ) -> Result<Vec<Employee>, SourceError>;
}

/// Source of position rows.
pub trait PositionSource: Send + Sync {
    /// List positions whose id passes `ids`.
    fn list_positions(&self, ctx: &QueryContext, ids: &IdFilter) -> Result<Vec<Position>, SourceError>;
}

/// Source of attribute records.
pub trait AttributeSource: Send + Sync {
    /// List attribute records whose owner kind passes `kind`.
    fn list_attributes(
        &self,
        ctx: &QueryContext,
        kind: &KindFilter,
    ) -> Result<Vec<AttributeRecord>, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure traits are object-safe
    fn _assert_employee_source_object_safe(_: &dyn EmployeeSource) {}
    fn _assert_position_source_object_safe(_: &dyn PositionSource) {}
    fn _assert_attribute_source_object_safe(_: &dyn AttributeSource) {}

    #[test]
    fn test_source_error_display() {
        let err = SourceError::Backend("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(SourceError::Cancelled.to_string(), "Query cancelled");
    }

    #[test]
    fn test_id_filter_matches_literally() {
        let filter = IdFilter::single("");
        assert!(filter.matches(""));
        assert!(!filter.matches("1"));
        assert!(IdFilter::All.matches("anything"));

        let filter: IdFilter = ["1", "3"].into_iter().collect();
        assert!(filter.matches("3"));
        assert!(!filter.matches("2"));
    }

    #[test]
    fn test_empty_kind_string_means_all() {
        assert_eq!(KindFilter::from(""), KindFilter::All);
        assert_eq!(KindFilter::from("position"), KindFilter::Kind(OwnerKind::Position));
        assert!(KindFilter::All.matches(&OwnerKind::Other("team".into())));
        assert!(!KindFilter::from("employee").matches(&OwnerKind::Position));
    }

    #[test]
    fn test_retryable_source_errors() {
        assert!(SourceError::Connection("down".into()).is_retryable());
        assert!(SourceError::DeadlineExceeded.is_retryable());
        assert!(!SourceError::Cancelled.is_retryable());
        assert!(!SourceError::Backend("bad".into()).is_retryable());
    }
}
