//! # orgpolicy - Organizational hierarchy policies over pluggable sources
//!
//! orgpolicy answers hierarchy questions over employees, positions and a
//! schema-less attribute layer attached to either. The resolver never owns
//! data: it composes reads against three narrow source traits, so each
//! source can live in a different backend.
//!
//! ## Core Concepts
//!
//! - **Employee**: a person occupying exactly one position
//! - **Position**: a named role occupied by zero or more employees
//! - **AttributeRecord**: a property bag attached to an `(owner kind, owner id)` pair
//! - **Manager position**: the position named by `managerPosition` on a
//!   position-kind record; its occupants manage holders of the owning position
//!
//! ## Usage
//!
//! ```
//! use orgpolicy::{InMemoryStores, PolicyManager, PolicySources, QueryContext};
//!
//! let stores = InMemoryStores::demo();
//! let manager = PolicyManager::new(PolicySources::from(&stores));
//!
//! let managers = manager.first_managers(&QueryContext::background(), "2")?;
//! let ids: Vec<&str> = managers.iter().map(|e| e.id.as_str()).collect();
//! assert_eq!(ids, ["1", "3"]);
//! # Ok::<(), orgpolicy::PolicyError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod attribute;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod policy;
pub mod runtime;
pub mod storage;
pub mod value;

// Re-export primary types at crate root for convenience
pub use attribute::{get_attribute, AttributeRecord, OwnerKind, MANAGER_POSITION};
pub use config::{OrgPolicyConfig, PolicyConfig, RuntimeConfig};
pub use context::{CancellationToken, QueryContext};
pub use entity::{Employee, Position};
pub use error::{ConfigError, OrgError, OrgResult, PolicyError, RuntimeError};
pub use policy::{PolicyManager, PolicySources};
pub use runtime::{PolicyRuntime, QueryHandle};
pub use storage::{
    AttributeSource, DirectorySnapshot, EmployeeSource, IdFilter, InMemoryAttributeStore,
    InMemoryEmployeeStore, InMemoryPositionStore, InMemoryStores, KindFilter, PositionSource,
    SourceError,
};
pub use value::{AttributeValue, FromAttributeValue};
