//! # nexus-store: Facade and Persistence for Nexus ERP
//!
//! Owns the one [`Store`] instance the views talk to, and keeps a storage
//! backend up to date without making any caller wait for it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Nexus ERP Data Flow                              │
//! │                                                                         │
//! │  View (finance screen, approvals, inventory)                           │
//! │       │  store.approve_transaction(&identity, id, comment)             │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    nexus-store (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    Store      │    │  FlushWorker  │    │   Backend    │  │   │
//! │  │   │  (store.rs)   │───►│  (flush.rs)   │───►│ memory/json/ │  │   │
//! │  │   │ RwLock<Kernel>│    │ tokio task,   │    │ sqlite       │  │   │
//! │  │   │ session       │    │ latest wins   │    │ (port.rs)    │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  └───────────┼─────────────────────────────────────────────────────┘   │
//! │              ▼                                                          │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  nexus-core: Kernel (rules, invariants, audit, reports)         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - The facade: locking, session, write path
//! - [`flush`] - Background flush worker and persistence status
//! - [`port`] - The persistence trait
//! - [`memory`], [`file`], [`sqlite`] - Backends
//! - [`backend`] - Backend chosen from configuration
//! - [`config`] - TOML + environment configuration
//! - [`migrations`] - Embedded SQLite migrations
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nexus_store::{Store, StoreConfig};
//!
//! let config = StoreConfig::load(None)?;
//! let store = Store::from_config(&config).await?;
//!
//! let admin = store.login("admin@nexus.com", "admin123")?;
//! let unit = store.create_unit(&admin, NewUnit::named("Filial Campinas"))?;
//!
//! store.shutdown().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod config;
pub mod error;
pub mod file;
pub mod flush;
pub mod memory;
pub mod migrations;
pub mod port;
pub mod sqlite;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::Backend;
pub use config::{BackendKind, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use file::JsonFilePersistence;
pub use flush::{PersistenceState, PersistenceStatus};
pub use memory::MemoryPersistence;
pub use port::PersistencePort;
pub use sqlite::{SqliteOptions, SqlitePersistence};
pub use store::{Store, StoreOptions};
