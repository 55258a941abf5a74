//! Budget tracker.
//!
//! ## Revision History
//! ```text
//! set_budget(u1, "Rent", "2024-01", 1000)   amount 1000, revisions []
//! set_budget(u1, "Rent", "2024-01", 1200)   amount 1200, revisions [1000]
//! set_budget(u1, "Rent", "2024-01", 1500)   amount 1500, revisions [1000, 1200]
//! ```
//!
//! Realized spend is never stored: it is summed from approved expenses each
//! time it is asked for.

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use ts_rs::TS;

use super::{new_id, AuditAction, Kernel};
use crate::dto::BudgetKey;
use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{Budget, BudgetRevision, Identity, TransactionKind};
use crate::validation::{validate_month, validate_name, validate_non_negative};
use crate::BUDGET_REVISION_REASON;

/// A budget alongside its realized spend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    pub budget: Budget,
    pub realized: Money,
    /// realized / amount, basis points (10000 = 100%).
    pub utilisation_bps: i64,
    pub over_budget: bool,
}

impl Kernel {
    /// Create the budget for a key, or overwrite it keeping the old amount
    /// as a revision. A zero amount is a valid budget.
    pub fn set_budget(
        &mut self,
        actor: &Identity,
        key: BudgetKey,
        amount: Money,
    ) -> CoreResult<Budget> {
        let key = key.normalized();
        validate_name("category", &key.category)?;
        validate_month(&key.month)?;
        validate_non_negative("amount", amount.cents())?;
        self.unit(&key.unit_id)?;

        let existing = self
            .data
            .budgets
            .iter_mut()
            .find(|b| b.has_key(&key.unit_id, &key.category, &key.month));

        let budget = match existing {
            Some(budget) => {
                budget.revisions.push(BudgetRevision {
                    date: Utc::now(),
                    amount: budget.amount,
                    reason: BUDGET_REVISION_REASON.to_string(),
                });
                budget.amount = amount;
                budget.clone()
            }
            None => {
                let budget = Budget {
                    id: new_id(),
                    unit_id: key.unit_id,
                    category: key.category,
                    month: key.month,
                    amount,
                    revisions: Vec::new(),
                };
                self.data.budgets.push(budget.clone());
                budget
            }
        };

        info!(
            budget_id = %budget.id,
            amount = %budget.amount,
            revisions = budget.revisions.len(),
            "budget set"
        );
        self.record(
            &actor.user_id,
            AuditAction::BudgetSet,
            format!(
                "Budget {} {} for unit {} set to {}",
                budget.category, budget.month, budget.unit_id, budget.amount
            ),
        );
        Ok(budget)
    }

    pub fn budget_for(&self, key: &BudgetKey) -> Option<&Budget> {
        let key = key.normalized();
        self.data
            .budgets
            .iter()
            .find(|b| b.has_key(&key.unit_id, &key.category, &key.month))
    }

    /// Sum of APPROVED EXPENSE transactions matching the budget's key.
    pub fn realized_spend(&self, budget: &Budget) -> Money {
        self.data
            .transactions
            .iter()
            .filter(|t| {
                t.is_approved()
                    && t.kind == TransactionKind::Expense
                    && t.unit_id == budget.unit_id
                    && t.category == budget.category
                    && t.in_month(&budget.month)
            })
            .map(|t| t.amount)
            .sum()
    }

    /// Every budget with its realized spend.
    pub fn budget_statuses(&self) -> Vec<BudgetStatus> {
        self.data
            .budgets
            .iter()
            .map(|budget| {
                let realized = self.realized_spend(budget);
                BudgetStatus {
                    budget: budget.clone(),
                    realized,
                    utilisation_bps: realized.ratio_bps(budget.amount),
                    over_budget: realized > budget.amount,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::error::{CoreError, EntityKind, ValidationError};

    #[test]
    fn test_revisions_accumulate() {
        let (mut kernel, u1) = kernel_with_unit();
        let key = BudgetKey::new(&u1, "Rent", "2024-01");

        let first = kernel
            .set_budget(&admin(), key.clone(), Money::from_major(1000))
            .unwrap();
        assert!(first.revisions.is_empty());

        kernel
            .set_budget(&admin(), key.clone(), Money::from_major(1200))
            .unwrap();
        let third = kernel
            .set_budget(&admin(), key.clone(), Money::from_major(1500))
            .unwrap();

        assert_eq!(third.id, first.id);
        assert_eq!(third.amount, Money::from_major(1500));
        let old: Vec<Money> = third.revisions.iter().map(|r| r.amount).collect();
        assert_eq!(old, [Money::from_major(1000), Money::from_major(1200)]);
        assert!(third.revisions.iter().all(|r| r.reason == BUDGET_REVISION_REASON));
        assert_eq!(kernel.budgets().len(), 1);
        assert_eq!(kernel.audit_by_action(AuditAction::BudgetSet).len(), 3);
    }

    #[test]
    fn test_distinct_keys_are_distinct_budgets() {
        let (mut kernel, u1) = kernel_with_unit();
        kernel
            .set_budget(&admin(), BudgetKey::new(&u1, "Rent", "2024-01"), Money::from_major(1))
            .unwrap();
        kernel
            .set_budget(&admin(), BudgetKey::new(&u1, "Rent", "2024-02"), Money::from_major(1))
            .unwrap();
        kernel
            .set_budget(&admin(), BudgetKey::new(&u1, "Payroll", "2024-01"), Money::from_major(1))
            .unwrap();
        assert_eq!(kernel.budgets().len(), 3);
    }

    #[test]
    fn test_set_budget_validation() {
        let (mut kernel, u1) = kernel_with_unit();
        assert!(kernel
            .set_budget(&admin(), BudgetKey::new(&u1, "Rent", "2024-13"), Money::from_major(1))
            .is_err());
        assert!(matches!(
            kernel.set_budget(&admin(), BudgetKey::new(&u1, "Rent", "2024-01"), Money::from_cents(-1)),
            Err(CoreError::Validation(ValidationError::Negative { .. }))
        ));
        assert!(matches!(
            kernel.set_budget(&admin(), BudgetKey::new("ghost", "Rent", "2024-01"), Money::from_major(1)),
            Err(CoreError::NotFound { entity: EntityKind::Unit, .. })
        ));
        assert!(kernel.budgets().is_empty());
    }

    #[test]
    fn test_zero_budget_is_accepted() {
        let (mut kernel, u1) = kernel_with_unit();
        let budget = kernel
            .set_budget(&admin(), BudgetKey::new(&u1, "Rent", "2024-01"), Money::zero())
            .unwrap();
        assert_eq!(budget.amount, Money::zero());

        let status = &kernel.budget_statuses()[0];
        assert_eq!(status.utilisation_bps, 0);
        assert!(!status.over_budget);

        let tx = kernel
            .create_transaction(&admin(), expense(&u1, "2024-01-03", 10))
            .unwrap();
        kernel.approve_transaction(&admin(), &tx.id, None).unwrap();
        assert!(kernel.budget_statuses()[0].over_budget);
    }

    #[test]
    fn test_padded_key_matches_trimmed_expenses() {
        let (mut kernel, u1) = kernel_with_unit();
        let padded = kernel
            .set_budget(&admin(), BudgetKey::new(&u1, " Rent ", " 2024-01 "), Money::from_major(1000))
            .unwrap();
        assert_eq!(padded.category, "Rent");
        assert_eq!(padded.month, "2024-01");

        let tx = kernel
            .create_transaction(&admin(), expense(&u1, "2024-01-15", 300))
            .unwrap();
        kernel.approve_transaction(&admin(), &tx.id, None).unwrap();
        assert_eq!(kernel.realized_spend(&padded), Money::from_major(300));

        let revised = kernel
            .set_budget(&admin(), BudgetKey::new(&u1, "Rent", "2024-01"), Money::from_major(1200))
            .unwrap();
        assert_eq!(revised.id, padded.id);
        assert_eq!(revised.revisions.len(), 1);
        assert_eq!(kernel.budgets().len(), 1);
        assert_eq!(
            kernel.budget_for(&BudgetKey::new(&u1, "Rent ", "2024-01")).unwrap().id,
            padded.id
        );
    }

    #[test]
    fn test_realized_spend_is_derived() {
        let (mut kernel, u1) = kernel_with_unit();
        let key = BudgetKey::new(&u1, "Rent", "2024-01");
        let budget = kernel
            .set_budget(&admin(), key.clone(), Money::from_major(1000))
            .unwrap();

        for (date, major) in [("2024-01-05", 300), ("2024-01-20", 250)] {
            let tx = kernel
                .create_transaction(&admin(), expense(&u1, date, major))
                .unwrap();
            kernel.approve_transaction(&admin(), &tx.id, None).unwrap();
        }
        // Not counted: pending, other month, rejected.
        kernel
            .create_transaction(&admin(), expense(&u1, "2024-01-07", 99))
            .unwrap();
        let feb = kernel
            .create_transaction(&admin(), expense(&u1, "2024-02-01", 77))
            .unwrap();
        kernel.approve_transaction(&admin(), &feb.id, None).unwrap();
        let rejected = kernel
            .create_transaction(&admin(), expense(&u1, "2024-01-09", 55))
            .unwrap();
        kernel.reject_transaction(&admin(), &rejected.id, None).unwrap();

        assert_eq!(kernel.realized_spend(&budget), Money::from_major(550));

        let status = &kernel.budget_statuses()[0];
        assert_eq!(status.realized, Money::from_major(550));
        assert_eq!(status.utilisation_bps, 5500);
        assert!(!status.over_budget);
        assert_eq!(kernel.budget_for(&key).unwrap().id, budget.id);
    }

    #[test]
    fn test_over_budget_flag() {
        let (mut kernel, u1) = kernel_with_unit();
        kernel
            .set_budget(&admin(), BudgetKey::new(&u1, "Rent", "2024-01"), Money::from_major(100))
            .unwrap();
        let tx = kernel
            .create_transaction(&admin(), expense(&u1, "2024-01-02", 150))
            .unwrap();
        kernel.approve_transaction(&admin(), &tx.id, None).unwrap();

        let status = &kernel.budget_statuses()[0];
        assert!(status.over_budget);
        assert_eq!(status.utilisation_bps, 15000);
    }
}
