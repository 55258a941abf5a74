//! In-memory backend with save counting and failure injection.
//!
//! Used by tests and by the `memory` backend setting (nothing survives a
//! restart).

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use nexus_core::DomainSnapshot;

use crate::error::{StoreError, StoreResult};
use crate::port::PersistencePort;

#[derive(Debug, Default)]
pub struct MemoryPersistence {
    stored: Mutex<Option<DomainSnapshot>>,
    saves: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a snapshot already stored.
    pub fn with_snapshot(snapshot: DomainSnapshot) -> Self {
        MemoryPersistence {
            stored: Mutex::new(Some(snapshot)),
            ..Self::default()
        }
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every following save fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The last successfully saved snapshot.
    pub fn stored(&self) -> Option<DomainSnapshot> {
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PersistencePort for MemoryPersistence {
    async fn load(&self) -> StoreResult<Option<DomainSnapshot>> {
        Ok(self.stored())
    }

    async fn save(&self, snapshot: &DomainSnapshot) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected save failure".to_string()));
        }
        *self.stored.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
