//! First-run seeding.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

use super::{new_id, AuditAction, Kernel};
use crate::credentials::hash_password;
use crate::error::CoreResult;
use crate::types::{Role, Unit, User};
use crate::validation::{validate_email, validate_name};
use crate::SYSTEM_ACTOR_ID;

/// What a fresh installation starts with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedData {
    pub unit_name: String,
    pub admin_name: String,
    pub admin_email: String,
    /// Plaintext; hashed on seed. Empty leaves the admin account open.
    pub admin_password: String,
}

impl Default for SeedData {
    fn default() -> Self {
        SeedData {
            unit_name: "Matriz São Paulo".to_string(),
            admin_name: "Administrator".to_string(),
            admin_email: "admin@nexus.com".to_string(),
            admin_password: "admin123".to_string(),
        }
    }
}

impl Kernel {
    /// Seed one unit and an ADMIN granted to it when there are no users.
    ///
    /// An existing first unit is reused rather than duplicated. Returns
    /// whether anything was seeded.
    pub fn seed_if_empty(&mut self, seed: &SeedData) -> CoreResult<bool> {
        if !self.data.users.is_empty() {
            return Ok(false);
        }
        validate_name("unit_name", &seed.unit_name)?;
        validate_name("admin_name", &seed.admin_name)?;
        validate_email(&seed.admin_email)?;
        let password_hash = if seed.admin_password.is_empty() {
            None
        } else {
            Some(hash_password(&seed.admin_password)?)
        };

        let unit_id = match self.data.units.first() {
            Some(unit) => unit.id.clone(),
            None => {
                let unit = Unit {
                    id: new_id(),
                    name: seed.unit_name.trim().to_string(),
                    active: true,
                    tax_id: None,
                };
                let id = unit.id.clone();
                self.data.units.push(unit);
                id
            }
        };

        let admin = User {
            id: new_id(),
            name: seed.admin_name.trim().to_string(),
            email: seed.admin_email.trim().to_string(),
            password_hash,
            role: Role::Admin,
            unit_grants: BTreeSet::from([unit_id.clone()]),
        };
        let details = format!("Seeded admin {} for unit {}", admin.email, unit_id);
        self.data.users.push(admin);

        info!(unit_id = %unit_id, "seeded empty installation");
        self.record(SYSTEM_ACTOR_ID, AuditAction::SystemSeed, details);
        Ok(true)
    }
}
