//! Password hashing for user accounts (argon2id, PHC string format).

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use password_hash::{rand_core::OsRng, SaltString};

use crate::error::ValidationError;

/// Well-formed hash with default argon2id parameters that no password
/// matches. Verified against on unknown emails so they cost the same as
/// a wrong password.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$no/T2W9Rr71PZCqCVv7ihA$8jo9S7pDg6IgcQINSShyHK2aoM1u8YcG6Hl2un00l94";

/// Hash a plaintext password for storage.
pub fn hash_password(password: &str) -> Result<String, ValidationError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ValidationError::InvalidFormat {
            field: "password".to_string(),
            reason: e.to_string(),
        })?;

    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored hash.
///
/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Run a full verification that always fails.
pub fn verify_against_dummy(password: &str) {
    let _ = verify_password(password, DUMMY_HASH);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("admin123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("admin123", &hash));
        assert!(!verify_password("admin124", &hash));
    }

    #[test]
    fn test_dummy_hash_parses_and_never_matches() {
        assert!(PasswordHash::new(DUMMY_HASH).is_ok());
        assert!(!verify_password("", DUMMY_HASH));
        assert!(!verify_password("admin123", DUMMY_HASH));
    }

    #[test]
    fn test_malformed_hash_rejects() {
        assert!(!verify_password("admin123", "admin123"));
        assert!(!verify_password("", ""));
    }
}
