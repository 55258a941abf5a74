//! # Operation Inputs
//!
//! One typed payload per mutating operation, plus the query filters.
//!
//! ```text
//!   View form ──► NewTransaction ──► validation ──► Kernel::create_transaction
//!                                                         │
//!                                                         ▼
//!                                               Transaction (id, PENDING,
//!                                               created_by from Identity)
//! ```
//!
//! Ids, statuses and actors are never part of a creation payload: the kernel
//! assigns them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{ApprovalStatus, MovementKind, Role, Transaction, TransactionKind};

// =============================================================================
// Units & Users
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewUnit {
    pub name: String,
    #[serde(default)]
    pub tax_id: Option<String>,
}

impl NewUnit {
    pub fn named(name: impl Into<String>) -> Self {
        NewUnit {
            name: name.into(),
            tax_id: None,
        }
    }
}

/// Profile for a new account. `password` is plaintext and hashed on create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    pub role: Role,
    #[serde(default)]
    #[ts(as = "Vec<String>")]
    pub unit_grants: BTreeSet<String>,
}

/// Full replacement of an account.
///
/// A `None` or empty `password` keeps the stored hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    pub role: Role,
    #[serde(default)]
    #[ts(as = "Vec<String>")]
    pub unit_grants: BTreeSet<String>,
}

// =============================================================================
// Inventory
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub unit_id: String,
    pub min_stock: i64,
    pub current_stock: i64,
    pub cost_price: Money,
    #[serde(default)]
    pub image_ref: Option<String>,
}

/// A stock change request.
///
/// `quantity` is a positive count for IN and OUT, a signed delta for
/// ADJUSTMENT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewMovement {
    pub product_id: String,
    #[serde(rename = "type")]
    pub kind: MovementKind,
    pub quantity: i64,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub reason: String,
}

// =============================================================================
// Finance
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Money,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub payment_method: String,
    pub unit_id: String,
    #[serde(default)]
    pub attachment_ref: Option<String>,
}

/// Budget key: `(unit, category, month)`, month as `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BudgetKey {
    pub unit_id: String,
    pub category: String,
    pub month: String,
}

impl BudgetKey {
    pub fn new(
        unit_id: impl Into<String>,
        category: impl Into<String>,
        month: impl Into<String>,
    ) -> Self {
        BudgetKey {
            unit_id: unit_id.into(),
            category: category.into(),
            month: month.into(),
        }
    }

    /// The key as budgets store it: category and month trimmed.
    pub fn normalized(&self) -> Self {
        BudgetKey {
            unit_id: self.unit_id.clone(),
            category: self.category.trim().to_string(),
            month: self.month.trim().to_string(),
        }
    }
}

/// Transaction query. Every `None` field matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    #[serde(default)]
    pub status: Option<ApprovalStatus>,
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<TransactionKind>,
    /// `YYYY-MM` prefix of the transaction date.
    #[serde(default)]
    pub month: Option<String>,
}

impl TransactionFilter {
    pub fn with_status(status: ApprovalStatus) -> Self {
        TransactionFilter {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.status.map_or(true, |s| tx.status == s)
            && self.unit_id.as_deref().map_or(true, |u| tx.unit_id == u)
            && self.kind.map_or(true, |k| tx.kind == k)
            && self.month.as_deref().map_or(true, |m| tx.in_month(m))
    }
}
