//! Unit registry.
//!
//! ## Deletion Guard
//! ```text
//! delete_unit(id)
//!      │
//!      ├── unknown id ───────────────────────► NotFound
//!      ├── referenced by transactions/products ► ReferentialIntegrity
//!      ├── only unit left ─────────────────────► LastUnit
//!      │
//!      └── remove unit
//!          strip id from every user's grants
//!          drop budgets keyed to it
//! ```

use tracing::info;

use super::{new_id, AuditAction, Kernel};
use crate::dto::NewUnit;
use crate::error::{CoreError, CoreResult, EntityKind};
use crate::types::{Identity, Unit};
use crate::validation::validate_name;

impl Kernel {
    /// Create an active unit.
    pub fn create_unit(&mut self, actor: &Identity, new: NewUnit) -> CoreResult<Unit> {
        validate_name("name", &new.name)?;

        let unit = Unit {
            id: new_id(),
            name: new.name.trim().to_string(),
            active: true,
            tax_id: new.tax_id.filter(|t| !t.trim().is_empty()),
        };
        self.data.units.push(unit.clone());

        info!(unit_id = %unit.id, name = %unit.name, "unit created");
        self.record(
            &actor.user_id,
            AuditAction::UnitCreate,
            format!("Created unit {} ({})", unit.name, unit.id),
        );
        Ok(unit)
    }

    /// Replace a unit by id.
    pub fn update_unit(&mut self, actor: &Identity, unit: Unit) -> CoreResult<Unit> {
        let idx = self.position(EntityKind::Unit, &unit.id)?;
        validate_name("name", &unit.name)?;

        self.data.units[idx] = unit.clone();

        info!(unit_id = %unit.id, "unit updated");
        self.record(
            &actor.user_id,
            AuditAction::UnitUpdate,
            format!("Updated unit {} ({})", unit.name, unit.id),
        );
        Ok(unit)
    }

    /// Remove a unit that nothing references. Returns the removed unit.
    pub fn delete_unit(&mut self, actor: &Identity, id: &str) -> CoreResult<Unit> {
        let idx = self.position(EntityKind::Unit, id)?;

        let transactions = self
            .data
            .transactions
            .iter()
            .filter(|t| t.unit_id == id)
            .count();
        let products = self.data.products.iter().filter(|p| p.unit_id == id).count();
        if transactions > 0 || products > 0 {
            return Err(CoreError::ReferentialIntegrity {
                unit_id: id.to_string(),
                transactions,
                products,
            });
        }

        if self.data.units.len() == 1 {
            return Err(CoreError::LastUnit {
                unit_id: id.to_string(),
            });
        }

        let unit = self.data.units.remove(idx);
        for user in &mut self.data.users {
            user.unit_grants.remove(id);
        }
        self.data.budgets.retain(|b| b.unit_id != id);

        info!(unit_id = %unit.id, "unit deleted");
        self.record(
            &actor.user_id,
            AuditAction::UnitDelete,
            format!("Deleted unit {} ({})", unit.name, unit.id),
        );
        Ok(unit)
    }

    /// Flip the `active` flag. Returns the updated unit.
    pub fn toggle_unit(&mut self, actor: &Identity, id: &str) -> CoreResult<Unit> {
        let idx = self.position(EntityKind::Unit, id)?;

        let unit = &mut self.data.units[idx];
        unit.active = !unit.active;
        let unit = unit.clone();

        info!(unit_id = %unit.id, active = unit.active, "unit toggled");
        self.record(
            &actor.user_id,
            AuditAction::UnitToggle,
            format!(
                "Unit {} is now {}",
                unit.name,
                if unit.active { "active" } else { "inactive" }
            ),
        );
        Ok(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::dto::{BudgetKey, NewTransaction};
    use crate::money::Money;
    use crate::types::{Role, TransactionKind};
    use chrono::NaiveDate;

    #[test]
    fn test_create_and_toggle() {
        let (mut kernel, id) = kernel_with_unit();
        assert!(kernel.unit(&id).unwrap().active);

        let toggled = kernel.toggle_unit(&admin(), &id).unwrap();
        assert!(!toggled.active);
        assert!(kernel.toggle_unit(&admin(), &id).unwrap().active);
        assert_eq!(kernel.audit_by_action(AuditAction::UnitToggle).len(), 2);
    }

    #[test]
    fn test_toggle_and_update_unknown_unit() {
        let (mut kernel, _) = kernel_with_unit();
        assert!(matches!(
            kernel.toggle_unit(&admin(), "ghost"),
            Err(CoreError::NotFound { entity: EntityKind::Unit, .. })
        ));

        let ghost = Unit {
            id: "ghost".into(),
            name: "Ghost".into(),
            active: true,
            tax_id: None,
        };
        assert!(kernel.update_unit(&admin(), ghost).is_err());
    }

    #[test]
    fn test_update_replaces_fields() {
        let (mut kernel, id) = kernel_with_unit();
        let mut unit = kernel.unit(&id).unwrap().clone();
        unit.name = "Matriz Centro".into();
        unit.tax_id = Some("12.345.678/0001-90".into());

        kernel.update_unit(&admin(), unit).unwrap();
        let stored = kernel.unit(&id).unwrap();
        assert_eq!(stored.name, "Matriz Centro");
        assert_eq!(stored.tax_id.as_deref(), Some("12.345.678/0001-90"));
    }

    #[test]
    fn test_delete_blocked_by_transaction() {
        let (mut kernel, u1) = kernel_with_unit();
        kernel.create_unit(&admin(), NewUnit::named("Filial")).unwrap();
        kernel
            .create_transaction(
                &admin(),
                NewTransaction {
                    kind: TransactionKind::Expense,
                    amount: Money::from_major(10),
                    date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                    category: "Rent".into(),
                    description: String::new(),
                    payment_method: "Pix".into(),
                    unit_id: u1.clone(),
                    attachment_ref: None,
                },
            )
            .unwrap();
        let audit_before = kernel.audit_log().len();

        let err = kernel.delete_unit(&admin(), &u1).unwrap_err();
        assert!(matches!(
            err,
            CoreError::ReferentialIntegrity { transactions: 1, products: 0, .. }
        ));
        assert!(kernel.unit(&u1).is_ok());
        assert_eq!(kernel.audit_log().len(), audit_before);
    }

    #[test]
    fn test_delete_blocked_by_product() {
        let (mut kernel, u1) = kernel_with_unit();
        kernel.create_unit(&admin(), NewUnit::named("Filial")).unwrap();
        add_product(&mut kernel, &u1, 1, 100);

        assert!(matches!(
            kernel.delete_unit(&admin(), &u1),
            Err(CoreError::ReferentialIntegrity { products: 1, .. })
        ));
    }

    #[test]
    fn test_last_unit_cannot_be_deleted() {
        let (mut kernel, u1) = kernel_with_unit();
        assert!(matches!(
            kernel.delete_unit(&admin(), &u1),
            Err(CoreError::LastUnit { .. })
        ));
        assert_eq!(kernel.units().len(), 1);
    }

    #[test]
    fn test_delete_strips_grants_and_budgets() {
        let (mut kernel, u1) = kernel_with_unit();
        let u2 = kernel.create_unit(&admin(), NewUnit::named("Filial")).unwrap().id;
        let user = kernel
            .create_user(
                &admin(),
                new_user("ana@nexus.com", Role::Employee, &[u1.as_str(), u2.as_str()]),
            )
            .unwrap();
        kernel
            .set_budget(&admin(), BudgetKey::new(&u2, "Rent", "2024-01"), Money::from_major(1))
            .unwrap();

        kernel.delete_unit(&admin(), &u2).unwrap();

        assert!(kernel.unit(&u2).is_err());
        let grants = &kernel.user(&user.id).unwrap().unit_grants;
        assert!(grants.contains(&u1));
        assert!(!grants.contains(&u2));
        assert!(kernel.budgets().is_empty());
        assert_eq!(kernel.audit_log()[0].action, "UNIT_DELETE");
    }
}
