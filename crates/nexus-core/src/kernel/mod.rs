//! # Kernel
//!
//! The unit of work that keeps units, users, inventory, finance and budgets
//! consistent, and records every successful mutation in the audit trail.
//!
//! ## Operation Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  kernel.record_movement(&actor, movement, link_to_finance)              │
//! │                                                                         │
//! │   1. validate input (validation.rs)            ──► Err, nothing changed │
//! │   2. check against current state (ids, stock)  ──► Err, nothing changed │
//! │   3. mutate collections                                                 │
//! │   4. append exactly one audit entry                                     │
//! │   5. return the created/updated entity                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every check happens before the first mutation, so a failed operation leaves
//! the kernel exactly as it was and emits no audit entry.
//!
//! The kernel is a plain value: no locks, no I/O. `nexus-store` wraps it in a
//! lock and persists [`DomainSnapshot`]s after each write.

mod audit;
mod budget;
mod finance;
mod inventory;
mod seed;
mod units;
mod users;

pub use audit::AuditAction;
pub use budget::BudgetStatus;
pub use seed::SeedData;

use crate::error::{CoreError, CoreResult, EntityKind};
use crate::snapshot::DomainSnapshot;
use crate::types::{Budget, Product, StockMovement, Transaction, Unit, User};
use crate::DEFAULT_AUDIT_RETENTION;

/// Owner of all domain collections.
#[derive(Debug, Clone)]
pub struct Kernel {
    data: DomainSnapshot,
    /// Maximum audit entries kept. `0` keeps everything.
    audit_retention: usize,
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::new(DEFAULT_AUDIT_RETENTION)
    }
}

impl Kernel {
    /// An empty kernel.
    pub fn new(audit_retention: usize) -> Self {
        Kernel::from_snapshot(DomainSnapshot::default(), audit_retention)
    }

    /// Rebuild the kernel from persisted collections.
    pub fn from_snapshot(data: DomainSnapshot, audit_retention: usize) -> Self {
        let mut kernel = Kernel {
            data,
            audit_retention,
        };
        kernel.trim_audit();
        kernel
    }

    pub fn snapshot(&self) -> &DomainSnapshot {
        &self.data
    }

    pub fn into_snapshot(self) -> DomainSnapshot {
        self.data
    }

    pub fn audit_retention(&self) -> usize {
        self.audit_retention
    }

    // =========================================================================
    // Collections
    // =========================================================================

    pub fn units(&self) -> &[Unit] {
        &self.data.units
    }

    pub fn users(&self) -> &[User] {
        &self.data.users
    }

    pub fn products(&self) -> &[Product] {
        &self.data.products
    }

    /// Oldest first.
    pub fn movements(&self) -> &[StockMovement] {
        &self.data.movements
    }

    /// Newest first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.data.transactions
    }

    pub fn budgets(&self) -> &[Budget] {
        &self.data.budgets
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn unit(&self, id: &str) -> CoreResult<&Unit> {
        self.data
            .units
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Unit, id))
    }

    pub fn user(&self, id: &str) -> CoreResult<&User> {
        self.data
            .users
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| CoreError::not_found(EntityKind::User, id))
    }

    pub fn product(&self, id: &str) -> CoreResult<&Product> {
        self.data
            .products
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Product, id))
    }

    pub fn transaction(&self, id: &str) -> CoreResult<&Transaction> {
        self.data
            .transactions
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Transaction, id))
    }

    pub(crate) fn position(&self, entity: EntityKind, id: &str) -> CoreResult<usize> {
        let found = match entity {
            EntityKind::Unit => self.data.units.iter().position(|u| u.id == id),
            EntityKind::User => self.data.users.iter().position(|u| u.id == id),
            EntityKind::Product => self.data.products.iter().position(|p| p.id == id),
            EntityKind::Transaction => self.data.transactions.iter().position(|t| t.id == id),
            EntityKind::Budget => self.data.budgets.iter().position(|b| b.id == id),
        };
        found.ok_or_else(|| CoreError::not_found(entity, id))
    }

    /// Checks that every id names an existing unit.
    pub(crate) fn ensure_units_exist<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a String>,
    ) -> CoreResult<()> {
        for id in ids {
            self.unit(id)?;
        }
        Ok(())
    }
}

/// Fresh entity id (UUID v4).
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Test Fixtures
// =============================================================================


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_lookups_report_entity_and_id() {
        let (kernel, unit_id) = kernel_with_unit();
        assert!(kernel.unit(&unit_id).is_ok());

        let err = kernel.product("nope").unwrap_err();
        assert!(matches!(
            err,
            CoreError::NotFound { entity: EntityKind::Product, ref id } if id == "nope"
        ));
    }

    #[test]
    fn test_from_snapshot_trims_audit_to_retention() {
        let (mut kernel, _) = kernel_with_unit();
        for i in 0..5 {
            kernel
                .create_unit(&admin(), crate::dto::NewUnit::named(format!("Filial {i}")))
                .unwrap();
        }
        assert_eq!(kernel.audit_log().len(), 6);

        let reloaded = Kernel::from_snapshot(kernel.into_snapshot(), 3);
        assert_eq!(reloaded.audit_log().len(), 3);
        assert!(reloaded.audit_log()[0].details.contains("Filial 4"));
    }
}
