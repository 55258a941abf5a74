//! # Store Facade
//!
//! The single entry point the views talk to.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Store::write                                  │
//! │                                                                         │
//! │  view ──► store.record_movement(&identity, movement, true)             │
//! │              │                                                          │
//! │              ▼                                                          │
//! │        ┌──────────────┐                                                 │
//! │        │ kernel.write │  one lock for the whole operation              │
//! │        └──────┬───────┘                                                 │
//! │               │                                                         │
//! │        Err ◄──┤──► Ok                                                   │
//! │   (no change, │      │                                                  │
//! │    no enqueue)│      ▼                                                  │
//! │               │  flush.enqueue(snapshot)  ← still under the lock,       │
//! │               │      │                     so queue order = commit order│
//! │               │      ▼                                                  │
//! │               └─► return to caller        ← never waits on storage     │
//! │                                                                         │
//! │  Reads take the read lock and hand back owned clones.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session lives here, outside the kernel, so it is never persisted.

use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use nexus_core::{
    AuditAction, AuditLogEntry, Budget, BudgetKey, BudgetStatus, CoreResult, DashboardSummary,
    DomainSnapshot, ForecastPoint, Identity, IncomeStatement, Kernel, Money, NewMovement,
    NewProduct, NewTransaction, NewUnit, NewUser, Product, SeedData, StockMovement, Transaction,
    TransactionFilter, Unit, User, UserUpdate, DEFAULT_AUDIT_RETENTION,
};

use crate::backend::Backend;
use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::flush::{FlushHandle, FlushWorker, PersistenceStatus};
use crate::port::PersistencePort;

// =============================================================================
// Options
// =============================================================================

#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Newest audit entries kept. 0 keeps everything.
    pub audit_retention: usize,
    /// Seed applied when the loaded snapshot has no users.
    pub seed: Option<SeedData>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            audit_retention: DEFAULT_AUDIT_RETENTION,
            seed: Some(SeedData::default()),
        }
    }
}

impl From<&StoreConfig> for StoreOptions {
    fn from(config: &StoreConfig) -> Self {
        StoreOptions {
            audit_retention: config.audit.retention,
            seed: config.seed.seed_data(),
        }
    }
}

// =============================================================================
// Store
// =============================================================================

pub struct Store<P: PersistencePort = Backend> {
    kernel: RwLock<Kernel>,
    session: RwLock<Option<Identity>>,
    port: Arc<P>,
    flush: FlushHandle,
    status: watch::Receiver<PersistenceStatus>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Store<Backend> {
    /// Build the backend named by `config` and open a store on it.
    pub async fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        let backend = Backend::from_config(config).await?;
        Store::open(backend, StoreOptions::from(config)).await
    }
}

impl<P: PersistencePort> Store<P> {
    /// Load the last snapshot, seed if there are no users, start flushing.
    ///
    /// A load failure is returned; nothing is started.
    pub async fn open(port: P, options: StoreOptions) -> StoreResult<Self> {
        let port = Arc::new(port);

        let snapshot = port.load().await?;
        let fresh = snapshot.is_none();
        let mut kernel = Kernel::from_snapshot(snapshot.unwrap_or_default(), options.audit_retention);

        let seeded = match &options.seed {
            Some(seed) => kernel.seed_if_empty(seed)?,
            None => false,
        };

        info!(
            fresh,
            seeded,
            units = kernel.units().len(),
            users = kernel.users().len(),
            transactions = kernel.transactions().len(),
            "Store opened"
        );

        let (worker, status) = FlushWorker::new(port.clone());
        let (flush, task) = worker.start();
        if seeded {
            flush.enqueue(kernel.snapshot().clone());
        }

        Ok(Store {
            kernel: RwLock::new(kernel),
            session: RwLock::new(None),
            port,
            flush,
            status,
            worker: Mutex::new(Some(task)),
        })
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    // =========================================================================
    // Locking
    // =========================================================================

    fn kernel_read(&self) -> RwLockReadGuard<'_, Kernel> {
        self.kernel.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn kernel_write(&self) -> RwLockWriteGuard<'_, Kernel> {
        self.kernel.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(&self, op: impl FnOnce(&Kernel) -> T) -> T {
        let kernel = self.kernel_read();
        op(&*kernel)
    }

    /// Run one mutation to completion and queue the resulting snapshot.
    fn write<T>(&self, op: impl FnOnce(&mut Kernel) -> CoreResult<T>) -> StoreResult<T> {
        let mut kernel = self.kernel_write();
        let value = op(&mut *kernel)?;
        self.flush.enqueue(kernel.snapshot().clone());
        Ok(value)
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Check credentials and make the user the current session.
    ///
    /// Signing in over an active session logs that session out first. A
    /// rejected attempt keeps the current session.
    pub fn login(&self, email: &str, password: &str) -> StoreResult<Identity> {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        let identity = self.write(|k| k.switch_session(session.as_ref(), email, password))?;
        *session = Some(identity.clone());
        Ok(identity)
    }

    /// End the current session. Returns who was signed in, if anyone.
    pub fn logout(&self) -> Option<Identity> {
        let identity = self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;

        let mut kernel = self.kernel_write();
        kernel.end_session(&identity);
        self.flush.enqueue(kernel.snapshot().clone());
        Some(identity)
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // =========================================================================
    // Units
    // =========================================================================

    pub fn create_unit(&self, actor: &Identity, new: NewUnit) -> StoreResult<Unit> {
        self.write(|k| k.create_unit(actor, new))
    }

    pub fn update_unit(&self, actor: &Identity, unit: Unit) -> StoreResult<Unit> {
        self.write(|k| k.update_unit(actor, unit))
    }

    pub fn delete_unit(&self, actor: &Identity, id: &str) -> StoreResult<Unit> {
        self.write(|k| k.delete_unit(actor, id))
    }

    pub fn toggle_unit(&self, actor: &Identity, id: &str) -> StoreResult<Unit> {
        self.write(|k| k.toggle_unit(actor, id))
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub fn create_user(&self, actor: &Identity, new: NewUser) -> StoreResult<User> {
        self.write(|k| k.create_user(actor, new))
    }

    pub fn update_user(&self, actor: &Identity, update: UserUpdate) -> StoreResult<User> {
        self.write(|k| k.update_user(actor, update))
    }

    pub fn delete_user(&self, actor: &Identity, id: &str) -> StoreResult<User> {
        self.write(|k| k.delete_user(actor, id))
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    pub fn add_product(&self, actor: &Identity, new: NewProduct) -> StoreResult<Product> {
        self.write(|k| k.add_product(actor, new))
    }

    pub fn record_movement(
        &self,
        actor: &Identity,
        movement: NewMovement,
        link_to_finance: bool,
    ) -> StoreResult<StockMovement> {
        self.write(|k| k.record_movement(actor, movement, link_to_finance))
    }

    // =========================================================================
    // Finance
    // =========================================================================

    pub fn create_transaction(
        &self,
        actor: &Identity,
        new: NewTransaction,
    ) -> StoreResult<Transaction> {
        self.write(|k| k.create_transaction(actor, new))
    }

    pub fn approve_transaction(
        &self,
        actor: &Identity,
        id: &str,
        comment: Option<String>,
    ) -> StoreResult<Transaction> {
        self.write(|k| k.approve_transaction(actor, id, comment))
    }

    pub fn reject_transaction(
        &self,
        actor: &Identity,
        id: &str,
        comment: Option<String>,
    ) -> StoreResult<Transaction> {
        self.write(|k| k.reject_transaction(actor, id, comment))
    }

    pub fn set_budget(&self, actor: &Identity, key: BudgetKey, amount: Money) -> StoreResult<Budget> {
        self.write(|k| k.set_budget(actor, key, amount))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Copy of the full persisted state.
    pub fn snapshot(&self) -> DomainSnapshot {
        self.read(|k| k.snapshot().clone())
    }

    pub fn units(&self) -> Vec<Unit> {
        self.read(|k| k.units().to_vec())
    }

    pub fn users(&self) -> Vec<User> {
        self.read(|k| k.users().to_vec())
    }

    pub fn products(&self) -> Vec<Product> {
        self.read(|k| k.products().to_vec())
    }

    pub fn movements(&self) -> Vec<StockMovement> {
        self.read(|k| k.movements().to_vec())
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.read(|k| k.transactions().to_vec())
    }

    pub fn budgets(&self) -> Vec<Budget> {
        self.read(|k| k.budgets().to_vec())
    }

    pub fn unit(&self, id: &str) -> StoreResult<Unit> {
        Ok(self.read(|k| k.unit(id).cloned())?)
    }

    pub fn user(&self, id: &str) -> StoreResult<User> {
        Ok(self.read(|k| k.user(id).cloned())?)
    }

    pub fn product(&self, id: &str) -> StoreResult<Product> {
        Ok(self.read(|k| k.product(id).cloned())?)
    }

    pub fn transaction(&self, id: &str) -> StoreResult<Transaction> {
        Ok(self.read(|k| k.transaction(id).cloned())?)
    }

    pub fn query_transactions(&self, filter: &TransactionFilter) -> Vec<Transaction> {
        self.read(|k| k.query_transactions(filter))
    }

    pub fn pending_count(&self) -> usize {
        self.read(|k| k.pending_count())
    }

    pub fn low_stock(&self, unit_id: Option<&str>) -> Vec<Product> {
        self.read(|k| k.low_stock(unit_id))
    }

    pub fn search_products(&self, unit_id: Option<&str>, query: &str) -> StoreResult<Vec<Product>> {
        Ok(self.read(|k| k.search_products(unit_id, query))?)
    }

    pub fn movements_for(&self, product_id: &str) -> Vec<StockMovement> {
        self.read(|k| k.movements_for(product_id))
    }

    pub fn budget_for(&self, key: &BudgetKey) -> Option<Budget> {
        self.read(|k| k.budget_for(key).cloned())
    }

    pub fn realized_spend(&self, key: &BudgetKey) -> Option<Money> {
        self.read(|k| k.budget_for(key).map(|b| k.realized_spend(b)))
    }

    pub fn budget_statuses(&self) -> Vec<BudgetStatus> {
        self.read(|k| k.budget_statuses())
    }

    pub fn audit_log(&self) -> Vec<AuditLogEntry> {
        self.read(|k| k.audit_log().to_vec())
    }

    pub fn audit_by_user(&self, user_id: &str) -> Vec<AuditLogEntry> {
        self.read(|k| k.audit_by_user(user_id))
    }

    pub fn audit_by_action(&self, action: AuditAction) -> Vec<AuditLogEntry> {
        self.read(|k| k.audit_by_action(action))
    }

    pub fn dashboard_summary(&self, unit_id: Option<&str>) -> DashboardSummary {
        self.read(|k| k.dashboard_summary(unit_id))
    }

    pub fn income_statement(&self, unit_id: Option<&str>) -> IncomeStatement {
        self.read(|k| k.income_statement(unit_id))
    }

    pub fn forecast_input(&self, unit_id: Option<&str>) -> Vec<ForecastPoint> {
        self.read(|k| k.forecast_input(unit_id))
    }

    // =========================================================================
    // Persistence Lifecycle
    // =========================================================================

    pub fn persistence_status(&self) -> PersistenceStatus {
        self.status.borrow().clone()
    }

    /// Receiver that changes whenever a save succeeds or fails.
    pub fn subscribe_status(&self) -> watch::Receiver<PersistenceStatus> {
        self.status.clone()
    }

    /// Wait until every change made so far has been handed to the backend.
    pub async fn flush(&self) -> PersistenceStatus {
        if !self.flush.flush().await {
            debug!("Flush requested after the worker stopped");
        }
        self.persistence_status()
    }

    /// Final flush, then stop the worker. Later writes stay in memory only.
    pub async fn shutdown(&self) -> PersistenceStatus {
        info!("Store shutting down");
        self.flush.shutdown().await;

        let task = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "Flush worker ended abnormally");
            }
        }
        self.persistence_status()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
