//! # Validation Module
//!
//! Boundary checks run before any kernel state is touched.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: View forms                                                   │
//! │  └── Required fields, immediate feedback                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (shape of the input alone)                       │
//! │  ├── Names, emails, months, quantities, amounts                        │
//! │  └── Grant presence for non-GUEST roles                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Kernel (input against current state)                         │
//! │  ├── Referenced ids exist                                              │
//! │  ├── Email uniqueness                                                  │
//! │  └── Stock, referential integrity, approval state                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use nexus_core::validation::{validate_month, validate_name};
//!
//! validate_month("2024-01").unwrap();
//! assert!(validate_name("name", "   ").is_err());
//! ```

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{MovementKind, Role};
use crate::MAX_NAME_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required display string (unit name, product name, category).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_NAME_LEN`] characters
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a SKU.
///
/// ## Example
/// ```rust
/// use nexus_core::validation::validate_sku;
///
/// assert!(validate_sku("CAFE-1KG").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    Ok(())
}

/// Validates a login email.
///
/// Only the shape `local@domain` is checked; deliverability is not our concern.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain".to_string(),
        }),
    }
}

/// Validates a budget month key.
///
/// ## Rules
/// - Exactly `YYYY-MM`
/// - Month between 01 and 12
///
/// ## Example
/// ```rust
/// use nexus_core::validation::validate_month;
///
/// assert!(validate_month("2024-01").is_ok());
/// assert!(validate_month("2024-13").is_err());
/// assert!(validate_month("2024-1").is_err());
/// ```
pub fn validate_month(month: &str) -> ValidationResult<()> {
    let invalid = || ValidationError::InvalidFormat {
        field: "month".to_string(),
        reason: "must be YYYY-MM".to_string(),
    };

    if month.len() != 7 {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").map_err(|_| invalid())?;

    Ok(())
}

/// Validates a search query, returning it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a stock movement quantity.
///
/// ## Rules
/// ```text
///   IN / OUT     quantity > 0          (direction comes from the kind)
///   ADJUSTMENT   quantity != 0         (signed delta)
/// ```
pub fn validate_movement_quantity(kind: MovementKind, quantity: i64) -> ValidationResult<()> {
    match kind {
        MovementKind::In | MovementKind::Out if quantity <= 0 => {
            Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            })
        }
        MovementKind::Adjustment if quantity == 0 => Err(ValidationError::Zero {
            field: "quantity".to_string(),
        }),
        _ => Ok(()),
    }
}

/// Validates a counter that may be zero but not negative (stock levels).
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a price. Zero is allowed (free samples), negatives are not.
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    validate_non_negative(field, price.cents())
}

/// Validates a transaction amount: strictly positive.
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Access Validators
// =============================================================================

/// Every role except GUEST must be granted at least one unit.
///
/// ## Example
/// ```rust
/// use std::collections::BTreeSet;
/// use nexus_core::{validation::validate_grants, Role};
///
/// assert!(validate_grants(Role::Guest, &BTreeSet::new()).is_ok());
/// assert!(validate_grants(Role::Employee, &BTreeSet::new()).is_err());
/// ```
pub fn validate_grants(role: Role, grants: &BTreeSet<String>) -> ValidationResult<()> {
    if role != Role::Guest && grants.is_empty() {
        return Err(ValidationError::Required {
            field: "unit_grants".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Matriz").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"A".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("admin@nexus.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("admin").is_err());
        assert!(validate_email("@nexus.com").is_err());
        assert!(validate_email("admin@").is_err());
    }

    #[test]
    fn test_validate_month() {
        assert!(validate_month("2024-01").is_ok());
        assert!(validate_month("1999-12").is_ok());
        assert!(validate_month("2024-00").is_err());
        assert!(validate_month("2024-13").is_err());
        assert!(validate_month("2024-1").is_err());
        assert!(validate_month("2024/01").is_err());
        assert!(validate_month("2024-01-15").is_err());
    }

    #[test]
    fn test_validate_movement_quantity() {
        assert!(validate_movement_quantity(MovementKind::In, 5).is_ok());
        assert!(validate_movement_quantity(MovementKind::In, 0).is_err());
        assert!(validate_movement_quantity(MovementKind::Out, -3).is_err());
        assert!(validate_movement_quantity(MovementKind::Adjustment, -3).is_ok());
        assert!(matches!(
            validate_movement_quantity(MovementKind::Adjustment, 0),
            Err(ValidationError::Zero { .. })
        ));
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_amount("amount", Money::from_cents(1)).is_ok());
        assert!(validate_amount("amount", Money::zero()).is_err());
        assert!(validate_amount("amount", Money::from_cents(-5)).is_err());
        assert!(validate_price("cost_price", Money::zero()).is_ok());
        assert!(validate_price("cost_price", Money::from_cents(-1)).is_err());
        assert!(validate_non_negative("min_stock", 0).is_ok());
        assert!(validate_non_negative("min_stock", -1).is_err());
    }

    #[test]
    fn test_validate_grants() {
        let one = BTreeSet::from(["u1".to_string()]);
        assert!(validate_grants(Role::Admin, &one).is_ok());
        assert!(validate_grants(Role::Guest, &BTreeSet::new()).is_ok());
        for role in [Role::Admin, Role::Manager, Role::Employee] {
            assert!(matches!(
                validate_grants(role, &BTreeSet::new()),
                Err(ValidationError::Required { ref field }) if field == "unit_grants"
            ));
        }
    }
}
