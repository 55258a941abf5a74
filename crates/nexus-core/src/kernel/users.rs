//! User directory and authentication.
//!
//! ## Login Flow
//! ```text
//! authenticate(email, password)
//!      │
//!      ├── no user with that email ──► AuthFailed      (after a dummy-hash verify)
//!      ├── stored hash, mismatch ────► AuthFailed      (same error, no hint)
//!      │
//!      └── hash matches, or no hash stored (open account)
//!               │
//!               ▼
//!          LOGIN audit entry, Identity { user_id, role }
//! ```

use std::collections::BTreeSet;
use tracing::{info, warn};

use super::{new_id, AuditAction, Kernel};
use crate::credentials::{hash_password, verify_against_dummy, verify_password};
use crate::dto::{NewUser, UserUpdate};
use crate::error::{CoreError, CoreResult, EntityKind, ValidationError};
use crate::types::{Identity, Role, User};
use crate::validation::{validate_email, validate_grants, validate_name};

impl Kernel {
    /// Create an account. A plaintext password is hashed before storage.
    pub fn create_user(&mut self, actor: &Identity, new: NewUser) -> CoreResult<User> {
        let email = new.email.trim().to_string();
        self.check_profile(None, &new.name, &email, new.role, &new.unit_grants)?;

        let password_hash = match new.password.as_deref() {
            Some(p) if !p.is_empty() => Some(hash_password(p)?),
            _ => None,
        };

        let user = User {
            id: new_id(),
            name: new.name.trim().to_string(),
            email,
            password_hash,
            role: new.role,
            unit_grants: new.unit_grants,
        };
        self.data.users.push(user.clone());

        info!(user_id = %user.id, role = %user.role, "user created");
        self.record(
            &actor.user_id,
            AuditAction::UserCreate,
            format!("Created user {} ({})", user.email, user.role),
        );
        Ok(user)
    }

    /// Replace an account by id. An absent or empty password keeps the stored hash.
    pub fn update_user(&mut self, actor: &Identity, update: UserUpdate) -> CoreResult<User> {
        let idx = self.position(EntityKind::User, &update.id)?;
        let email = update.email.trim().to_string();
        self.check_profile(
            Some(&update.id),
            &update.name,
            &email,
            update.role,
            &update.unit_grants,
        )?;

        let password_hash = match update.password.as_deref() {
            Some(p) if !p.is_empty() => Some(hash_password(p)?),
            _ => self.data.users[idx].password_hash.clone(),
        };

        let user = User {
            id: update.id,
            name: update.name.trim().to_string(),
            email,
            password_hash,
            role: update.role,
            unit_grants: update.unit_grants,
        };
        self.data.users[idx] = user.clone();

        info!(user_id = %user.id, "user updated");
        self.record(
            &actor.user_id,
            AuditAction::UserUpdate,
            format!("Updated user {}", user.email),
        );
        Ok(user)
    }

    /// Remove an account. The caller can never remove themselves.
    pub fn delete_user(&mut self, actor: &Identity, id: &str) -> CoreResult<User> {
        if actor.user_id == id {
            return Err(CoreError::SelfDeletion {
                user_id: id.to_string(),
            });
        }
        let idx = self.position(EntityKind::User, id)?;

        let user = self.data.users.remove(idx);

        info!(user_id = %user.id, "user deleted");
        self.record(
            &actor.user_id,
            AuditAction::UserDelete,
            format!("Deleted user {}", user.email),
        );
        Ok(user)
    }

    /// Verify credentials and return the caller's identity.
    pub fn authenticate(&mut self, email: &str, password: &str) -> CoreResult<Identity> {
        self.switch_session(None, email, password)
    }

    /// Verify credentials; on success end `previous` (LOGOUT) before
    /// recording the LOGIN. A rejected attempt leaves `previous` signed in.
    pub fn switch_session(
        &mut self,
        previous: Option<&Identity>,
        email: &str,
        password: &str,
    ) -> CoreResult<Identity> {
        let email = email.trim();
        let Some(user) = self.data.users.iter().find(|u| u.email == email) else {
            verify_against_dummy(password);
            warn!(email, "login rejected");
            return Err(CoreError::AuthFailed);
        };

        let accepted = match user.password_hash.as_deref() {
            Some(hash) => verify_password(password, hash),
            None => true,
        };
        if !accepted {
            warn!(email, "login rejected");
            return Err(CoreError::AuthFailed);
        }

        let identity = Identity::from(user);
        let details = format!("{} signed in", user.email);

        if let Some(previous) = previous {
            self.end_session(previous);
        }
        info!(user_id = %identity.user_id, "login");
        self.record(&identity.user_id, AuditAction::Login, details);
        Ok(identity)
    }

    /// Record the end of a session.
    pub fn end_session(&mut self, identity: &Identity) {
        info!(user_id = %identity.user_id, "logout");
        self.record(&identity.user_id, AuditAction::Logout, "Signed out");
    }

    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        let email = email.trim();
        self.data.users.iter().find(|u| u.email == email)
    }

    fn check_profile(
        &self,
        own_id: Option<&str>,
        name: &str,
        email: &str,
        role: Role,
        grants: &BTreeSet<String>,
    ) -> CoreResult<()> {
        validate_name("name", name)?;
        validate_email(email)?;
        validate_grants(role, grants)?;
        self.ensure_units_exist(grants)?;

        let taken = self
            .data
            .users
            .iter()
            .any(|u| u.email == email && Some(u.id.as_str()) != own_id);
        if taken {
            return Err(ValidationError::Duplicate {
                field: "email".to_string(),
                value: email.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
