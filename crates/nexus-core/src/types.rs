//! # Domain Types
//!
//! Entities owned by the kernel.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────────┐           │
//! │  │    Unit     │◄────│   Product   │◄────│ StockMovement   │           │
//! │  │  id, name   │     │  unit_id    │     │  product_id     │           │
//! │  │  active     │     │  stock      │     │  linked_tx_id ──┼──┐        │
//! │  └─────▲───────┘     └─────────────┘     └─────────────────┘  │        │
//! │        │                                                      │        │
//! │        │             ┌─────────────┐     ┌─────────────────┐  │        │
//! │        ├─────────────│ Transaction │◄────┼─────────────────┼──┘        │
//! │        │             │  status     │     │     Budget      │           │
//! │        │             │  unit_id    │     │ (unit,cat,month)│           │
//! │        │             └─────────────┘     └─────────────────┘           │
//! │  ┌─────┴───────┐                                                       │
//! │  │    User     │  unit_grants: set<UnitId>                             │
//! │  └─────────────┘                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entities never hold live references to each other: every relation is an id
//! resolved by lookup in the owning collection.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Role
// =============================================================================

/// Access level of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    Employee,
    Guest,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::Manager => write!(f, "MANAGER"),
            Role::Employee => write!(f, "EMPLOYEE"),
            Role::Guest => write!(f, "GUEST"),
        }
    }
}

// =============================================================================
// Unit
// =============================================================================

/// A branch or location of the business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: String,
    pub name: String,
    pub active: bool,
    /// Company registration number. Stored verbatim, never validated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
}

// =============================================================================
// User
// =============================================================================

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    /// Login key, unique across the directory.
    pub email: String,
    /// argon2 PHC string. `None` means an open account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(skip)]
    pub password_hash: Option<String>,
    pub role: Role,
    #[serde(default)]
    #[ts(as = "Vec<String>")]
    pub unit_grants: BTreeSet<String>,
}

impl User {
    /// Returns true if this account has a stored password.
    #[inline]
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

// =============================================================================
// Identity
// =============================================================================

/// The authenticated caller.
///
/// Returned by login and passed explicitly to every mutating operation,
/// so no operation reads an ambient "current user".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Identity {
            user_id: user_id.into(),
            role,
        }
    }

    /// The identity used for kernel-initiated writes (seeding, maintenance).
    pub fn system() -> Self {
        Identity::new(crate::SYSTEM_ACTOR_ID, Role::Admin)
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Identity::new(user.id.clone(), user.role)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A stocked product.
///
/// `current_stock` changes only through [`StockMovement`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub unit_id: String,
    pub min_stock: i64,
    pub current_stock: i64,
    pub cost_price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl Product {
    /// Checks if stock has fallen to or below the minimum.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.min_stock
    }
}

// =============================================================================
// Approval Status
// =============================================================================

/// Approval state of a transaction (and the recorded state of a movement).
///
/// ## State Machine
/// ```text
///            approve
///   PENDING ─────────► APPROVED   (terminal)
///      │
///      │     reject
///      └─────────────► REJECTED   (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    /// Returns true for APPROVED and REJECTED.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    /// Goods received. Quantity must be positive.
    In,
    /// Goods leaving (sale, consumption). Quantity must be positive.
    Out,
    /// Recount correction. Quantity is a signed, non-zero delta.
    Adjustment,
}

impl MovementKind {
    /// The change this movement applies to `current_stock`.
    ///
    /// ```rust
    /// use nexus_core::MovementKind;
    ///
    /// assert_eq!(MovementKind::In.stock_delta(5), 5);
    /// assert_eq!(MovementKind::Out.stock_delta(5), -5);
    /// assert_eq!(MovementKind::Adjustment.stock_delta(-2), -2);
    /// ```
    #[inline]
    pub fn stock_delta(&self, quantity: i64) -> i64 {
        match self {
            MovementKind::In => quantity,
            MovementKind::Out => quantity.saturating_neg(),
            MovementKind::Adjustment => quantity,
        }
    }
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovementKind::In => write!(f, "IN"),
            MovementKind::Out => write!(f, "OUT"),
            MovementKind::Adjustment => write!(f, "ADJUSTMENT"),
        }
    }
}

/// An immutable stock-ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub unit_id: String,
    #[serde(rename = "type")]
    pub kind: MovementKind,
    pub quantity: i64,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub reason: String,
    pub status: ApprovalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_transaction_id: Option<String>,
}

// =============================================================================
// Transaction
// =============================================================================

/// Direction of money flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Income => write!(f, "INCOME"),
            TransactionKind::Expense => write!(f, "EXPENSE"),
        }
    }
}

/// A financial ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Always positive; direction comes from `kind`.
    pub amount: Money,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub category: String,
    pub description: String,
    pub payment_method: String,
    pub unit_id: String,
    pub created_by: String,
    pub status: ApprovalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_stock_movement_id: Option<String>,
}

impl Transaction {
    /// Checks whether the transaction date falls in `month` (`YYYY-MM`).
    ///
    /// Plain prefix match on the ISO date, so `"2024-01"` matches
    /// `2024-01-31` and nothing else.
    pub fn in_month(&self, month: &str) -> bool {
        self.date.format("%Y-%m-%d").to_string().starts_with(month)
    }

    /// Amount with sign: income positive, expense negative.
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }

    #[inline]
    pub fn is_approved(&self) -> bool {
        self.status == ApprovalStatus::Approved
    }
}

// =============================================================================
// Budget
// =============================================================================

/// A superseded budget amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRevision {
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub amount: Money,
    pub reason: String,
}

/// A spending cap for one `(unit, category, month)` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    pub unit_id: String,
    pub category: String,
    /// `YYYY-MM`.
    pub month: String,
    pub amount: Money,
    /// Oldest first.
    #[serde(default)]
    pub revisions: Vec<BudgetRevision>,
}

impl Budget {
    /// Exact-string match on all three key fields.
    pub fn has_key(&self, unit_id: &str, category: &str, month: &str) -> bool {
        self.unit_id == unit_id && self.category == category && self.month == month
    }
}

// =============================================================================
// Audit Log Entry
// =============================================================================

/// One record of the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: String,
    pub user_id: String,
    /// Action tag, e.g. `UNIT_DELETE`, `TRANS_APPROVE`.
    pub action: String,
    pub details: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
