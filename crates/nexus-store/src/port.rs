//! # Persistence Port
//!
//! The one contract every storage backend implements.
//!
//! ```text
//!                   ┌──────────────────────┐
//!   Store::open ───►│ load() -> Option<..> │  None: nothing stored yet
//!                   └──────────────────────┘
//!                   ┌──────────────────────┐
//!   FlushWorker ───►│ save(&snapshot)      │  whole snapshot, latest wins
//!                   └──────────┬───────────┘
//!                              │
//!          ┌───────────────────┼────────────────────┐
//!          ▼                   ▼                    ▼
//!   MemoryPersistence   JsonFilePersistence   SqlitePersistence
//! ```
//!
//! The kernel never sees which backend is in use.

use std::future::Future;

use nexus_core::DomainSnapshot;

use crate::error::StoreResult;

pub trait PersistencePort: Send + Sync + 'static {
    /// Read the last saved snapshot, if any.
    fn load(&self) -> impl Future<Output = StoreResult<Option<DomainSnapshot>>> + Send;

    /// Replace the stored snapshot.
    fn save(&self, snapshot: &DomainSnapshot) -> impl Future<Output = StoreResult<()>> + Send;
}
