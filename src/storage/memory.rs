//! In-memory source backend.
//!
//! This module provides thread-safe in-memory implementations of the source traits.
//! It is intended for embedded usage, tests, demos, and as a reference implementation.
//! Natural order is insertion order; rows are never deduplicated, so a test can
//! push a duplicate on purpose to model a misbehaving backend.

use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::attribute::{AttributeRecord, OwnerKind, MANAGER_POSITION};
use crate::context::QueryContext;
use crate::entity::{Employee, Position};
use crate::storage::traits::{
    AttributeSource, EmployeeSource, IdFilter, KindFilter, PositionSource, SourceError,
};
use crate::value::AttributeValue;

fn lock_err(context: &'static str) -> SourceError {
    SourceError::Backend(format!("poisoned lock: {context}"))
}

/// Thread-safe in-memory employee store.
#[derive(Debug, Default)]
pub struct InMemoryEmployeeStore {
    rows: RwLock<Vec<Employee>>,
}

impl InMemoryEmployeeStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `rows` in the given order.
    #[must_use]
    pub fn from_rows(rows: Vec<Employee>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    /// Append a row verbatim. Duplicate ids are kept.
    pub fn push(&self, employee: Employee) -> Result<(), SourceError> {
        let mut rows = self.rows.write().map_err(|_| lock_err("employee.push"))?;
        rows.push(employee);
        Ok(())
    }

    /// Remove every row with the given id, returning how many were removed.
    pub fn remove(&self, id: &str) -> Result<usize, SourceError> {
        let mut rows = self.rows.write().map_err(|_| lock_err("employee.remove"))?;
        let before = rows.len();
        rows.retain(|e| e.id != id);
        Ok(before - rows.len())
    }

    /// Copy of every row.
    pub fn rows(&self) -> Result<Vec<Employee>, SourceError> {
        let rows = self.rows.read().map_err(|_| lock_err("employee.rows"))?;
        Ok(rows.clone())
    }

    fn select(
        &self,
        ctx: &QueryContext,
        filter: &IdFilter,
        key: impl Fn(&Employee) -> &str,
        context: &'static str,
    ) -> Result<Vec<Employee>, SourceError> {
        ctx.check()?;
        let rows = self.rows.read().map_err(|_| lock_err(context))?;
        Ok(rows.iter().filter(|e| filter.matches(key(*e))).cloned().collect())
    }
}

impl EmployeeSource for InMemoryEmployeeStore {
    fn list_employees(&self, ctx: &QueryContext, ids: &IdFilter) -> Result<Vec<Employee>, SourceError> {
        self.select(ctx, ids, |e| e.id.as_str(), "employee.list")
    }

    fn list_employees_by_position(
        &self,
        ctx: &QueryContext,
        position_ids: &IdFilter,
    ) -> Result<Vec<Employee>, SourceError> {
        self.select(ctx, position_ids, |e| e.position_id.as_str(), "employee.list_by_position")
    }
}

/// Thread-safe in-memory position store.
#[derive(Debug, Default)]
pub struct InMemoryPositionStore {
    rows: RwLock<Vec<Position>>,
}

impl InMemoryPositionStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `rows` in the given order.
    #[must_use]
    pub fn from_rows(rows: Vec<Position>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    /// Append a row verbatim. Duplicate ids are kept.
    pub fn push(&self, position: Position) -> Result<(), SourceError> {
        let mut rows = self.rows.write().map_err(|_| lock_err("position.push"))?;
        rows.push(position);
        Ok(())
    }

    /// Remove every row with the given id, returning how many were removed.
    pub fn remove(&self, id: &str) -> Result<usize, SourceError> {
        let mut rows = self.rows.write().map_err(|_| lock_err("position.remove"))?;
        let before = rows.len();
        rows.retain(|p| p.id != id);
        Ok(before - rows.len())
    }

    /// Copy of every row.
    pub fn rows(&self) -> Result<Vec<Position>, SourceError> {
        let rows = self.rows.read().map_err(|_| lock_err("position.rows"))?;
        Ok(rows.clone())
    }
}

impl PositionSource for InMemoryPositionStore {
    fn list_positions(&self, ctx: &QueryContext, ids: &IdFilter) -> Result<Vec<Position>, SourceError> {
        ctx.check()?;
        let rows = self.rows.read().map_err(|_| lock_err("position.list"))?;
        Ok(rows.iter().filter(|p| ids.matches(&p.id)).cloned().collect())
    }
}

/// Thread-safe in-memory attribute store.
#[derive(Debug, Default)]
pub struct InMemoryAttributeStore {
    rows: RwLock<Vec<AttributeRecord>>,
}

impl InMemoryAttributeStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `rows` in the given order.
    #[must_use]
    pub fn from_rows(rows: Vec<AttributeRecord>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    /// Append a record verbatim, even if `(kind, owner_id)` already has one.
    pub fn push(&self, record: AttributeRecord) -> Result<(), SourceError> {
        let mut rows = self.rows.write().map_err(|_| lock_err("attribute.push"))?;
        rows.push(record);
        Ok(())
    }

    /// Replace the first record addressed by the same `(kind, owner_id)`, or
    /// append if there is none.
    pub fn upsert(&self, record: AttributeRecord) -> Result<(), SourceError> {
        let mut rows = self.rows.write().map_err(|_| lock_err("attribute.upsert"))?;
        match rows
            .iter_mut()
            .find(|r| r.is_owned_by(&record.kind, &record.owner_id))
        {
            Some(existing) => *existing = record,
            None => rows.push(record),
        }
        Ok(())
    }

    /// Set one property on the record for `(kind, owner_id)`, creating the
    /// record if needed.
    pub fn set_property(
        &self,
        kind: OwnerKind,
        owner_id: &str,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Result<(), SourceError> {
        let mut rows = self.rows.write().map_err(|_| lock_err("attribute.set_property"))?;
        let name = name.into();
        let value = value.into();
        match rows.iter_mut().find(|r| r.is_owned_by(&kind, owner_id)) {
            Some(existing) => {
                existing.props.insert(name, value);
            }
            None => {
                let mut record = AttributeRecord::new(owner_id, kind);
                record.props.insert(name, value);
                rows.push(record);
            }
        }
        Ok(())
    }

    /// Copy of every record.
    pub fn rows(&self) -> Result<Vec<AttributeRecord>, SourceError> {
        let rows = self.rows.read().map_err(|_| lock_err("attribute.rows"))?;
        Ok(rows.clone())
    }
}

impl AttributeSource for InMemoryAttributeStore {
    fn list_attributes(
        &self,
        ctx: &QueryContext,
        kind: &KindFilter,
    ) -> Result<Vec<AttributeRecord>, SourceError> {
        ctx.check()?;
        let rows = self.rows.read().map_err(|_| lock_err("attribute.list"))?;
        Ok(rows.iter().filter(|r| kind.matches(&r.kind)).cloned().collect())
    }
}

/// Serializable picture of a whole directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    /// Employee rows in source order.
    #[serde(default)]
    pub employees: Vec<Employee>,
    /// Position rows in source order.
    #[serde(default)]
    pub positions: Vec<Position>,
    /// Attribute records in source order.
    #[serde(default)]
    pub attributes: Vec<AttributeRecord>,
}

impl DirectorySnapshot {
    /// The demonstration directory: a master over two bakers' worth of staff.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            employees: vec![
                Employee::new("1", "John 1", "1"),
                Employee::new("2", "John 2", "2"),
                Employee::new("3", "John 3", "1"),
            ],
            positions: vec![Position::new("1", "Master"), Position::new("2", "Baker")],
            attributes: vec![
                AttributeRecord::new("1", OwnerKind::Employee),
                AttributeRecord::new("2", OwnerKind::Position).with_property(MANAGER_POSITION, "1"),
            ],
        }
    }
}

/// Convenience bundle of in-memory stores.
///
/// Stores are held behind `Arc` so the same store can be handed to a
/// [`PolicyManager`](crate::PolicyManager) and still be edited afterwards.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStores {
    /// Employee store.
    pub employees: Arc<InMemoryEmployeeStore>,
    /// Position store.
    pub positions: Arc<InMemoryPositionStore>,
    /// Attribute store.
    pub attributes: Arc<InMemoryAttributeStore>,
}

impl InMemoryStores {
    /// Create a new empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle seeded with [`DirectorySnapshot::demo`].
    #[must_use]
    pub fn demo() -> Self {
        Self::from_snapshot(DirectorySnapshot::demo())
    }

    /// Bundle holding exactly the rows of `snapshot`.
    #[must_use]
    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        Self {
            employees: Arc::new(InMemoryEmployeeStore::from_rows(snapshot.employees)),
            positions: Arc::new(InMemoryPositionStore::from_rows(snapshot.positions)),
            attributes: Arc::new(InMemoryAttributeStore::from_rows(snapshot.attributes)),
        }
    }

    /// Parse a JSON snapshot.
    pub fn from_json_str(json: &str) -> Result<Self, SourceError> {
        let snapshot: DirectorySnapshot = serde_json::from_str(json)
            .map_err(|e| SourceError::Snapshot(format!("invalid snapshot json: {e}")))?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Read and parse a JSON snapshot file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SourceError::Snapshot(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// Copy the current contents out as a snapshot.
    pub fn snapshot(&self) -> Result<DirectorySnapshot, SourceError> {
        Ok(DirectorySnapshot {
            employees: self.employees.rows()?,
            positions: self.positions.rows()?,
            attributes: self.attributes.rows()?,
        })
    }
}
