//! Source trait definitions and the in-memory backend.
//!
//! The traits define the abstract read interface the policy resolver
//! depends on. Any backend that implements them can be plugged in.

mod memory;
mod traits;

pub use memory::{
    DirectorySnapshot, InMemoryAttributeStore, InMemoryEmployeeStore, InMemoryPositionStore,
    InMemoryStores,
};
pub use traits::{
    AttributeSource, EmployeeSource, IdFilter, KindFilter, PositionSource, SourceError,
};
