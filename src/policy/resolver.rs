use std::fmt;
use std::sync::Arc;

use tracing::{debug, debug_span, warn};

use crate::attribute::{AttributeRecord, OwnerKind};
use crate::config::PolicyConfig;
use crate::context::QueryContext;
use crate::entity::{Employee, Position};
use crate::error::{ConfigError, PolicyError};
use crate::policy::cardinality::{expect_single, RowKind};
use crate::storage::{
    AttributeSource, EmployeeSource, IdFilter, InMemoryStores, KindFilter, PositionSource,
};

/// The three sources a [`PolicyManager`] reads from.
///
/// Each can come from a different backend.
#[derive(Clone)]
pub struct PolicySources {
    /// Employee lookups by id and by position id.
    pub employees: Arc<dyn EmployeeSource>,
    /// Position lookups by id.
    pub positions: Arc<dyn PositionSource>,
    /// Attribute records by owner kind.
    pub attributes: Arc<dyn AttributeSource>,
}

impl PolicySources {
    /// Bundle three sources.
    #[must_use]
    pub fn new(
        employees: Arc<dyn EmployeeSource>,
        positions: Arc<dyn PositionSource>,
        attributes: Arc<dyn AttributeSource>,
    ) -> Self {
        Self {
            employees,
            positions,
            attributes,
        }
    }
}

impl From<&InMemoryStores> for PolicySources {
    fn from(stores: &InMemoryStores) -> Self {
        Self {
            employees: stores.employees.clone(),
            positions: stores.positions.clone(),
            attributes: stores.attributes.clone(),
        }
    }
}

/// Answers hierarchy questions by composing source reads.
///
/// Holds no per-query state: every call is a function of the sources'
/// contents at call time.
#[derive(Clone)]
pub struct PolicyManager {
    sources: PolicySources,
    config: PolicyConfig,
}

impl fmt::Debug for PolicyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PolicyManager {
    /// Create a manager reading the default `managerPosition` attribute.
    #[must_use]
    pub fn new(sources: PolicySources) -> Self {
        Self {
            sources,
            config: PolicyConfig::default(),
        }
    }

    /// Create a manager with an explicit config.
    pub fn with_config(sources: PolicySources, config: PolicyConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            sources,
            config: config.validate()?,
        })
    }

    /// The active config.
    #[must_use]
    pub const fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Get a reference to the sources.
    #[must_use]
    pub const fn sources(&self) -> &PolicySources {
        &self.sources
    }

    /// The immediate managers of `employee_id`.
    ///
    /// Returns the occupants of the position named by the manager attribute
    /// on the employee's position, in the employee source's order. An empty
    /// list means there is no tier above (no attribute record, no usable
    /// manager attribute, or a manager position nobody occupies).
    ///
    /// # Errors
    /// - `EmployeeNotFound` / `InvalidEmployeeResponse`: 0 or >1 rows for the id
    /// - `PositionNotFound` / `InvalidPositionResponse`: 0 or >1 rows for its position
    /// - `Source`: any source error, unchanged
    pub fn first_managers(
        &self,
        ctx: &QueryContext,
        employee_id: &str,
    ) -> Result<Vec<Employee>, PolicyError> {
        let _span = debug_span!(
            "first_managers",
            employee_id,
            request_id = ctx.request_id().unwrap_or_default()
        )
        .entered();

        let employee = self.employee(ctx, employee_id)?;
        let position = self.position(ctx, &employee.position_id)?;
        let attributes = self.position_attributes(ctx, &position.id)?;

        let Some(manager_position) = attributes.get::<String>(&self.config.manager_attribute) else {
            debug!(
                position_id = %position.id,
                attribute = %self.config.manager_attribute,
                "no manager position configured"
            );
            return Ok(Vec::new());
        };

        let managers = self
            .sources
            .employees
            .list_employees_by_position(ctx, &IdFilter::single(manager_position.as_str()))?;
        debug!(
            position_id = %position.id,
            manager_position = %manager_position,
            count = managers.len(),
            "resolved first managers"
        );
        Ok(managers)
    }

    fn employee(&self, ctx: &QueryContext, id: &str) -> Result<Employee, PolicyError> {
        let rows = self.sources.employees.list_employees(ctx, &IdFilter::single(id))?;
        expect_single(rows, RowKind::Employee, id)
    }

    fn position(&self, ctx: &QueryContext, id: &str) -> Result<Position, PolicyError> {
        let rows = self.sources.positions.list_positions(ctx, &IdFilter::single(id))?;
        expect_single(rows, RowKind::Position, id)
    }

    /// The position-kind record for `position_id`, or an empty record.
    ///
    /// Duplicates are a data defect; the last one in source order wins.
    fn position_attributes(
        &self,
        ctx: &QueryContext,
        position_id: &str,
    ) -> Result<AttributeRecord, PolicyError> {
        let records = self
            .sources
            .attributes
            .list_attributes(ctx, &KindFilter::Kind(OwnerKind::Position))?;

        let mut matches = records
            .into_iter()
            .filter(|r| r.owner_id == position_id)
            .collect::<Vec<_>>();
        if matches.len() > 1 {
            warn!(
                position_id,
                count = matches.len(),
                "duplicate position attribute records, using the last one"
            );
        }
        Ok(matches
            .pop()
            .unwrap_or_else(|| AttributeRecord::empty(OwnerKind::Position)))
    }
}
