//! # Domain Snapshot
//!
//! The seven persisted collections, exactly as a persistence backend sees them.
//!
//! ```text
//! {
//!   "users": [...], "units": [...], "transactions": [...],
//!   "products": [...], "movements": [...], "budgets": [...],
//!   "logs": [...]            ← newest first
//! }
//! ```
//!
//! The login session is never part of a snapshot.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{AuditLogEntry, Budget, Product, StockMovement, Transaction, Unit, User};

/// Names of the snapshot collections, in persistence order.
pub const COLLECTIONS: [&str; 7] = [
    "users",
    "units",
    "transactions",
    "products",
    "movements",
    "budgets",
    "logs",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DomainSnapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub units: Vec<Unit>,
    /// Newest first.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub products: Vec<Product>,
    /// Append-only, oldest first.
    #[serde(default)]
    pub movements: Vec<StockMovement>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    /// Newest first, capped by the kernel's audit retention.
    #[serde(default)]
    pub logs: Vec<AuditLogEntry>,
}

impl DomainSnapshot {
    /// Serialise one collection by name, as stored by row-per-collection backends.
    pub fn collection_json(&self, name: &str) -> serde_json::Result<Option<String>> {
        let json = match name {
            "users" => serde_json::to_string(&self.users)?,
            "units" => serde_json::to_string(&self.units)?,
            "transactions" => serde_json::to_string(&self.transactions)?,
            "products" => serde_json::to_string(&self.products)?,
            "movements" => serde_json::to_string(&self.movements)?,
            "budgets" => serde_json::to_string(&self.budgets)?,
            "logs" => serde_json::to_string(&self.logs)?,
            _ => return Ok(None),
        };
        Ok(Some(json))
    }

    /// Inverse of [`collection_json`](Self::collection_json). Unknown names are ignored.
    pub fn set_collection_json(&mut self, name: &str, json: &str) -> serde_json::Result<()> {
        match name {
            "users" => self.users = serde_json::from_str(json)?,
            "units" => self.units = serde_json::from_str(json)?,
            "transactions" => self.transactions = serde_json::from_str(json)?,
            "products" => self.products = serde_json::from_str(json)?,
            "movements" => self.movements = serde_json::from_str(json)?,
            "budgets" => self.budgets = serde_json::from_str(json)?,
            "logs" => self.logs = serde_json::from_str(json)?,
            _ => {}
        }
        Ok(())
    }
}
