//! Transaction ledger and the approval state machine.
//!
//! ```text
//!   create ──► PENDING ──approve──► APPROVED
//!                 │
//!                 └─────reject────► REJECTED
//!
//!   approve/reject on APPROVED or REJECTED ──► InvalidTransition, no change
//! ```

use tracing::{debug, info};

use super::{new_id, AuditAction, Kernel};
use crate::dto::{NewTransaction, TransactionFilter};
use crate::error::{CoreError, CoreResult, EntityKind};
use crate::types::{ApprovalStatus, Identity, Transaction};
use crate::validation::{validate_amount, validate_name};

impl Kernel {
    /// Record a new PENDING transaction, newest first.
    pub fn create_transaction(
        &mut self,
        actor: &Identity,
        new: NewTransaction,
    ) -> CoreResult<Transaction> {
        let tx = self.prepare_transaction(actor, new, None)?;
        self.data.transactions.insert(0, tx.clone());

        info!(transaction_id = %tx.id, kind = %tx.kind, amount = %tx.amount, "transaction created");
        self.record(
            &actor.user_id,
            AuditAction::TransCreate,
            format!("{} {} ({}) for unit {}", tx.kind, tx.amount, tx.category, tx.unit_id),
        );
        Ok(tx)
    }

    /// Build a transaction after checking it against current state.
    ///
    /// Does not mutate, so callers can check every step of a compound
    /// operation before applying any of them.
    pub(crate) fn prepare_transaction(
        &self,
        actor: &Identity,
        new: NewTransaction,
        linked_stock_movement_id: Option<String>,
    ) -> CoreResult<Transaction> {
        validate_amount("amount", new.amount)?;
        validate_name("category", &new.category)?;
        self.unit(&new.unit_id)?;

        Ok(Transaction {
            id: new_id(),
            kind: new.kind,
            amount: new.amount,
            date: new.date,
            category: new.category.trim().to_string(),
            description: new.description,
            payment_method: new.payment_method,
            unit_id: new.unit_id,
            created_by: actor.user_id.clone(),
            status: ApprovalStatus::Pending,
            approval_comment: None,
            attachment_ref: new.attachment_ref.filter(|a| !a.trim().is_empty()),
            linked_stock_movement_id,
        })
    }

    pub fn approve_transaction(
        &mut self,
        actor: &Identity,
        id: &str,
        comment: Option<String>,
    ) -> CoreResult<Transaction> {
        self.decide(actor, id, ApprovalStatus::Approved, comment)
    }

    pub fn reject_transaction(
        &mut self,
        actor: &Identity,
        id: &str,
        comment: Option<String>,
    ) -> CoreResult<Transaction> {
        self.decide(actor, id, ApprovalStatus::Rejected, comment)
    }

    fn decide(
        &mut self,
        actor: &Identity,
        id: &str,
        outcome: ApprovalStatus,
        comment: Option<String>,
    ) -> CoreResult<Transaction> {
        let idx = self.position(EntityKind::Transaction, id)?;

        let tx = &mut self.data.transactions[idx];
        if tx.status.is_terminal() {
            return Err(CoreError::InvalidTransition {
                transaction_id: tx.id.clone(),
                status: tx.status,
            });
        }
        tx.status = outcome;
        tx.approval_comment = comment.filter(|c| !c.trim().is_empty());
        let tx = tx.clone();

        let action = match outcome {
            ApprovalStatus::Rejected => AuditAction::TransReject,
            _ => AuditAction::TransApprove,
        };
        info!(transaction_id = %tx.id, status = ?tx.status, "transaction decided");
        self.record(
            &actor.user_id,
            action,
            format!("{:?} transaction {} ({} {})", outcome, tx.id, tx.kind, tx.amount),
        );
        Ok(tx)
    }

    /// Transactions matching the filter, newest first.
    pub fn query_transactions(&self, filter: &TransactionFilter) -> Vec<Transaction> {
        let found: Vec<Transaction> = self
            .data
            .transactions
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        debug!(count = found.len(), "transactions queried");
        found
    }

    /// Number of transactions awaiting a decision.
    pub fn pending_count(&self) -> usize {
        self.data
            .transactions
            .iter()
            .filter(|t| t.status == ApprovalStatus::Pending)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::error::ValidationError;
    use crate::money::Money;

    #[test]
    fn test_create_forces_pending_newest_first() {
        let (mut kernel, u1) = kernel_with_unit();
        let first = kernel
            .create_transaction(&admin(), expense(&u1, "2024-01-01", 10))
            .unwrap();
        let second = kernel
            .create_transaction(&admin(), expense(&u1, "2024-01-02", 20))
            .unwrap();

        assert_eq!(first.status, ApprovalStatus::Pending);
        assert_eq!(first.created_by, admin().user_id);
        assert_eq!(kernel.transactions()[0].id, second.id);
        assert_eq!(kernel.pending_count(), 2);
    }

    #[test]
    fn test_create_validates_input() {
        let (mut kernel, u1) = kernel_with_unit();

        let mut zero = expense(&u1, "2024-01-01", 0);
        zero.amount = Money::zero();
        assert!(matches!(
            kernel.create_transaction(&admin(), zero),
            Err(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));

        let mut no_category = expense(&u1, "2024-01-01", 5);
        no_category.category = " ".into();
        assert!(kernel.create_transaction(&admin(), no_category).is_err());

        assert!(matches!(
            kernel.create_transaction(&admin(), expense("ghost", "2024-01-01", 5)),
            Err(CoreError::NotFound { entity: EntityKind::Unit, .. })
        ));
        assert!(kernel.transactions().is_empty());
    }

    #[test]
    fn test_approval_is_terminal() {
        let (mut kernel, u1) = kernel_with_unit();
        let tx = kernel
            .create_transaction(&admin(), expense(&u1, "2024-01-01", 10))
            .unwrap();

        let approved = kernel
            .approve_transaction(&admin(), &tx.id, Some("ok".into()))
            .unwrap();
        assert_eq!(approved.status, ApprovalStatus::Approved);
        assert_eq!(approved.approval_comment.as_deref(), Some("ok"));

        let audit_before = kernel.audit_log().len();
        let err = kernel
            .reject_transaction(&admin(), &tx.id, Some("too late".into()))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransition { status: ApprovalStatus::Approved, .. }
        ));
        assert!(kernel
            .approve_transaction(&admin(), &tx.id, None)
            .is_err());

        let stored = kernel.transaction(&tx.id).unwrap();
        assert_eq!(stored.status, ApprovalStatus::Approved);
        assert_eq!(stored.approval_comment.as_deref(), Some("ok"));
        assert_eq!(kernel.audit_log().len(), audit_before);
    }

    #[test]
    fn test_reject_and_unknown_id() {
        let (mut kernel, u1) = kernel_with_unit();
        let tx = kernel
            .create_transaction(&admin(), expense(&u1, "2024-01-01", 10))
            .unwrap();

        kernel.reject_transaction(&admin(), &tx.id, None).unwrap();
        assert_eq!(kernel.audit_log()[0].action, "TRANS_REJECT");
        assert_eq!(kernel.pending_count(), 0);

        assert!(matches!(
            kernel.approve_transaction(&admin(), "ghost", None),
            Err(CoreError::NotFound { entity: EntityKind::Transaction, .. })
        ));
    }

    #[test]
    fn test_query_by_month_and_status() {
        let (mut kernel, u1) = kernel_with_unit();
        let jan = kernel
            .create_transaction(&admin(), expense(&u1, "2024-01-31", 10))
            .unwrap();
        kernel
            .create_transaction(&admin(), expense(&u1, "2024-02-01", 10))
            .unwrap();
        kernel.approve_transaction(&admin(), &jan.id, None).unwrap();

        let filter = TransactionFilter {
            month: Some("2024-01".into()),
            ..Default::default()
        };
        assert_eq!(kernel.query_transactions(&filter).len(), 1);

        let approved = TransactionFilter::with_status(ApprovalStatus::Approved);
        let found = kernel.query_transactions(&approved);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, jan.id);
    }
}
