//! # nexus-core: Domain Kernel for Nexus ERP
//!
//! Entities, invariants and the audit trail of a multi-unit business
//! management system, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Nexus ERP Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                         Views                                   │   │
//! │  │   Dashboard ─ Finance ─ Inventory ─ Budgets ─ Approvals ─ ...   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             nexus-store (Store facade)                          │   │
//! │  │   RwLock<Kernel> ─ session ─ flush worker ─ PersistencePort     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ nexus-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  kernel   │  │  reports  │  │ validation│  │   │
//! │  │   │   Unit    │  │  units    │  │ dashboard │  │   rules   │  │   │
//! │  │   │   User    │  │  finance  │  │  income   │  │  checks   │  │   │
//! │  │   │   ...     │  │  budget   │  │  forecast │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO LOCKS • NO BACKGROUND TASKS                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Unit, User, Product, Transaction, Budget, ...)
//! - [`dto`] - One input payload per mutating operation, plus query filters
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`kernel`] - The invariant-preserving operations and the audit trail
//! - [`reports`] - Dashboard, income statement, forecast input
//! - [`policy`] - Role capabilities
//! - [`credentials`] - Password hashing
//! - [`snapshot`] - The persisted collections
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use nexus_core::{Identity, Kernel, MovementKind, Money, NewMovement, NewProduct, NewUnit, Role};
//!
//! let admin = Identity::new("admin-1", Role::Admin);
//! let mut kernel = Kernel::default();
//!
//! let unit = kernel.create_unit(&admin, NewUnit::named("Matriz")).unwrap();
//! let product = kernel
//!     .add_product(&admin, NewProduct {
//!         name: "Café 1kg".into(),
//!         sku: "CAFE-1KG".into(),
//!         unit_id: unit.id.clone(),
//!         min_stock: 2,
//!         current_stock: 10,
//!         cost_price: Money::from_cents(2000),
//!         image_ref: None,
//!     })
//!     .unwrap();
//!
//! let sale = NewMovement {
//!     product_id: product.id.clone(),
//!     kind: MovementKind::Out,
//!     quantity: 3,
//!     date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
//!     reason: "counter sale".into(),
//! };
//! let movement = kernel.record_movement(&admin, sale, true).unwrap();
//!
//! assert_eq!(kernel.product(&product.id).unwrap().current_stock, 7);
//! let tx = kernel.transaction(movement.linked_transaction_id.as_deref().unwrap()).unwrap();
//! assert_eq!(tx.amount, Money::from_cents(6000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod credentials;
pub mod dto;
pub mod error;
pub mod kernel;
pub mod money;
pub mod policy;
pub mod reports;
pub mod snapshot;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use dto::*;
pub use error::{CoreError, CoreResult, EntityKind, ErrorCode, ValidationError};
pub use kernel::{AuditAction, BudgetStatus, Kernel, SeedData};
pub use money::Money;
pub use policy::Capability;
pub use reports::{DashboardSummary, ForecastPoint, IncomeStatement};
pub use snapshot::DomainSnapshot;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Actor id recorded when no user is behind a write (seeding, maintenance).
pub const SYSTEM_ACTOR_ID: &str = "sys";

/// Audit entries kept when no retention is configured.
pub const DEFAULT_AUDIT_RETENTION: usize = 100;

/// Category of every transaction generated from a stock movement.
///
/// The income statement counts approved expenses in this category as cost
/// of goods sold.
pub const INVENTORY_CATEGORY: &str = "Inventory";

/// Payment method of every transaction generated from a stock movement.
pub const INVENTORY_PAYMENT_METHOD: &str = "Stock Adjustment";

/// Reason attached to a superseded budget amount.
pub const BUDGET_REVISION_REASON: &str = "revision";

/// Maximum length of names and categories.
pub const MAX_NAME_LEN: usize = 200;
