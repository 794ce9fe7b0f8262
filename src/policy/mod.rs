//! Hierarchy policies over pluggable sources.
//!
//! The only policy implemented today is "first managers": the employees
//! occupying the position named by the manager attribute on the queried
//! employee's position.

mod cardinality;
mod resolver;

pub use cardinality::{expect_single, RowKind};
pub use resolver::{PolicyManager, PolicySources};
