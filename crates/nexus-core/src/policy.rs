//! # Role Capabilities
//!
//! Which screens each role may reach, and which units a user may see.
//!
//! ```text
//!                 Dashboard  Finance  Inventory  Approvals  Settings
//!   ADMIN            ✓          ✓         ✓          ✓          ✓
//!   MANAGER          ✓          ✓         ✓          ✓
//!   EMPLOYEE         ✓          ✓         ✓
//!   GUEST            ✓
//! ```
//!
//! These are helpers for callers. The kernel itself only enforces the grant
//! invariant (non-GUEST users hold at least one unit).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    Dashboard,
    Finance,
    Inventory,
    Budgets,
    Approvals,
    Reports,
    /// Unit and user administration.
    Settings,
}

impl Role {
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Dashboard => true,
            Capability::Finance
            | Capability::Inventory
            | Capability::Budgets
            | Capability::Reports => !matches!(self, Role::Guest),
            Capability::Approvals => matches!(self, Role::Admin | Role::Manager),
            Capability::Settings => matches!(self, Role::Admin),
        }
    }
}

impl User {
    /// ADMIN sees every unit; everyone else only their grants.
    pub fn can_access_unit(&self, unit_id: &str) -> bool {
        self.role == Role::Admin || self.unit_grants.contains(unit_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_capability_matrix() {
        assert!(Role::Admin.allows(Capability::Settings));
        assert!(!Role::Manager.allows(Capability::Settings));

        assert!(Role::Manager.allows(Capability::Approvals));
        assert!(!Role::Employee.allows(Capability::Approvals));

        assert!(Role::Employee.allows(Capability::Inventory));
        assert!(!Role::Guest.allows(Capability::Finance));
        assert!(Role::Guest.allows(Capability::Dashboard));
    }

    #[test]
    fn test_unit_access() {
        let mut user = User {
            id: "x".into(),
            name: "Bia".into(),
            email: "bia@nexus.com".into(),
            password_hash: None,
            role: Role::Employee,
            unit_grants: BTreeSet::from(["u1".to_string()]),
        };
        assert!(user.can_access_unit("u1"));
        assert!(!user.can_access_unit("u2"));

        user.role = Role::Admin;
        assert!(user.can_access_unit("u2"));
    }
}
