//! # Error Types
//!
//! Domain-specific error types for nexus-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  nexus-core errors (this file)                                         │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  nexus-store errors (separate crate)                                   │
//! │  └── StoreError       - Persistence / configuration failures           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → View                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Every variant carries the offending id or field
//! 3. Views switch on [`ErrorCode`], never on the message text

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use crate::types::ApprovalStatus;

// =============================================================================
// Entity Kind
// =============================================================================

/// Which collection an id was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Unit,
    User,
    Product,
    Transaction,
    Budget,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Unit => write!(f, "Unit"),
            EntityKind::User => write!(f, "User"),
            EntityKind::Product => write!(f, "Product"),
            EntityKind::Transaction => write!(f, "Transaction"),
            EntityKind::Budget => write!(f, "Budget"),
        }
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors raised by the kernel.
///
/// Every error is surfaced synchronously to the caller of the mutating
/// operation. The kernel never retries: these are logical failures, not
/// transient ones.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced entity id does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    /// An outgoing movement would drive stock below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Record OUT movement (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: current=3
    ///      │
    ///      ▼
    /// InsufficientStock { sku: "CAFE-1KG", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Nothing is mutated; view shows "Only 3 CAFE-1KG in stock"
    /// ```
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Unit deletion blocked by dependent records.
    #[error(
        "Unit {unit_id} is still referenced by {transactions} transaction(s) and {products} product(s)"
    )]
    ReferentialIntegrity {
        unit_id: String,
        transactions: usize,
        products: usize,
    },

    /// Deleting this unit would leave the system without any unit.
    #[error("Unit {unit_id} is the last remaining unit and cannot be deleted")]
    LastUnit { unit_id: String },

    /// The acting user tried to delete their own account.
    #[error("User {user_id} cannot delete their own account")]
    SelfDeletion { user_id: String },

    /// Credentials did not match.
    ///
    /// Deliberately carries no detail: unknown email and wrong password are
    /// indistinguishable to the caller.
    #[error("Invalid email or password")]
    AuthFailed,

    /// Approve/reject called on a transaction that already reached a terminal state.
    #[error("Transaction {transaction_id} is {status:?}, cannot change approval status")]
    InvalidTransition {
        transaction_id: String,
        status: ApprovalStatus,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity kind and id.
    pub fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Machine-readable code for the presentation layer.
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::ReferentialIntegrity { .. } => ErrorCode::ReferentialIntegrity,
            CoreError::LastUnit { .. } => ErrorCode::Invariant,
            CoreError::SelfDeletion { .. } => ErrorCode::SelfDeletion,
            CoreError::AuthFailed => ErrorCode::AuthFailure,
            CoreError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            CoreError::Validation(_) => ErrorCode::ValidationError,
        }
    }
}

/// Error codes for view-facing responses.
///
/// ## Usage in Views
/// ```typescript
/// switch (e.code) {
///   case 'INSUFFICIENT_STOCK': showStockWarning(e); break;
///   case 'REFERENTIAL_INTEGRITY': explainDependents(e); break;
///   default: showError(e.message);
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    InsufficientStock,
    ReferentialIntegrity,
    Invariant,
    SelfDeletion,
    AuthFailure,
    InvalidTransition,
    ValidationError,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised at the facade boundary before any kernel logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value must not be zero.
    #[error("{field} must not be zero")]
    Zero { field: String },

    /// Value would overflow a stock level or an amount.
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// Invalid format (e.g., invalid month, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate email).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "p1".to_string(),
            sku: "CAFE-1KG".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for CAFE-1KG: available 3, requested 5"
        );

        let err = CoreError::not_found(EntityKind::Transaction, "tx-9");
        assert_eq!(err.to_string(), "Transaction not found: tx-9");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CoreError::AuthFailed.code(), ErrorCode::AuthFailure);
        assert_eq!(
            CoreError::LastUnit {
                unit_id: "u1".into()
            }
            .code(),
            ErrorCode::Invariant
        );
        let code = serde_json::to_string(&ErrorCode::ReferentialIntegrity).unwrap();
        assert_eq!(code, "\"REFERENTIAL_INTEGRITY\"");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "unit_grants".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.code(), ErrorCode::ValidationError);
    }
}
