//! Audit trail: newest first, capped, one entry per successful mutation.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{new_id, Kernel};
use crate::types::AuditLogEntry;

/// Action tags written to [`AuditLogEntry::action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Login,
    Logout,
    SystemSeed,
    UnitCreate,
    UnitUpdate,
    UnitDelete,
    UnitToggle,
    UserCreate,
    UserUpdate,
    UserDelete,
    ProductCreate,
    StockMovement,
    TransCreate,
    TransApprove,
    TransReject,
    BudgetSet,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "LOGIN",
            AuditAction::Logout => "LOGOUT",
            AuditAction::SystemSeed => "SYSTEM_SEED",
            AuditAction::UnitCreate => "UNIT_CREATE",
            AuditAction::UnitUpdate => "UNIT_UPDATE",
            AuditAction::UnitDelete => "UNIT_DELETE",
            AuditAction::UnitToggle => "UNIT_TOGGLE",
            AuditAction::UserCreate => "USER_CREATE",
            AuditAction::UserUpdate => "USER_UPDATE",
            AuditAction::UserDelete => "USER_DELETE",
            AuditAction::ProductCreate => "PRODUCT_CREATE",
            AuditAction::StockMovement => "STOCK_MOVEMENT",
            AuditAction::TransCreate => "TRANS_CREATE",
            AuditAction::TransApprove => "TRANS_APPROVE",
            AuditAction::TransReject => "TRANS_REJECT",
            AuditAction::BudgetSet => "BUDGET_SET",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Kernel {
    /// Prepend an entry and drop the oldest beyond the retention cap.
    pub(crate) fn record(
        &mut self,
        user_id: &str,
        action: AuditAction,
        details: impl Into<String>,
    ) -> &AuditLogEntry {
        let entry = AuditLogEntry {
            id: new_id(),
            user_id: user_id.to_string(),
            action: action.as_str().to_string(),
            details: details.into(),
            timestamp: Utc::now(),
        };
        tracing::debug!(action = %action, user_id, "audit entry recorded");

        self.data.logs.insert(0, entry);
        self.trim_audit();
        &self.data.logs[0]
    }

    pub(crate) fn trim_audit(&mut self) {
        if self.audit_retention > 0 {
            self.data.logs.truncate(self.audit_retention);
        }
    }

    /// Newest first.
    pub fn audit_log(&self) -> &[AuditLogEntry] {
        &self.data.logs
    }

    pub fn audit_by_user(&self, user_id: &str) -> Vec<AuditLogEntry> {
        self.data
            .logs
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn audit_by_action(&self, action: AuditAction) -> Vec<AuditLogEntry> {
        self.data
            .logs
            .iter()
            .filter(|e| e.action == action.as_str())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first_and_capped() {
        let mut kernel = Kernel::new(3);
        for i in 0..5 {
            kernel.record("sys", AuditAction::UnitCreate, format!("entry {i}"));
        }
        let details: Vec<_> = kernel.audit_log().iter().map(|e| e.details.as_str()).collect();
        assert_eq!(details, ["entry 4", "entry 3", "entry 2"]);
    }

    #[test]
    fn test_zero_retention_keeps_everything() {
        let mut kernel = Kernel::new(0);
        for _ in 0..150 {
            kernel.record("sys", AuditAction::Login, "");
        }
        assert_eq!(kernel.audit_log().len(), 150);
    }

    #[test]
    fn test_queries() {
        let mut kernel = Kernel::new(100);
        kernel.record("a", AuditAction::Login, "");
        kernel.record("b", AuditAction::Login, "");
        kernel.record("a", AuditAction::TransCreate, "");

        assert_eq!(kernel.audit_by_user("a").len(), 2);
        assert_eq!(kernel.audit_by_action(AuditAction::Login).len(), 2);
        assert_eq!(kernel.audit_log()[0].action, "TRANS_CREATE");
    }

    #[test]
    fn test_action_serializes_as_tag() {
        let json = serde_json::to_string(&AuditAction::SystemSeed).unwrap();
        assert_eq!(json, format!("\"{}\"", AuditAction::SystemSeed.as_str()));
    }
}
