//! # SQLite Backend
//!
//! Snapshot persistence on a local SQLite database.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     snapshot_collections                                │
//! │                                                                         │
//! │   name          payload (JSON array)              updated_at           │
//! │   ───────────   ───────────────────────────────   ─────────────────    │
//! │   users         [{"id":"…","email":"…",…}]        2026-10-16T…         │
//! │   units         [{"id":"…","name":"Matriz",…}]    2026-10-16T…         │
//! │   transactions  [...]                             2026-10-16T…         │
//! │   products      [...]                             2026-10-16T…         │
//! │   movements     [...]                             2026-10-16T…         │
//! │   budgets       [...]                             2026-10-16T…         │
//! │   logs          [...]                             2026-10-16T…         │
//! │                                                                         │
//! │   save(): all seven rows upserted in ONE transaction                   │
//! │   load(): zero rows → None (nothing stored yet)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! The file database runs in WAL mode so a reader (load) never blocks the
//! flush worker's writer.

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use nexus_core::snapshot::COLLECTIONS;
use nexus_core::DomainSnapshot;

use crate::error::{StoreError, StoreResult};
use crate::migrations;
use crate::port::PersistencePort;

const MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// SQLite connection settings.
///
/// ## Example
/// ```rust,ignore
/// let options = SqliteOptions::new("/path/to/nexus.db").max_connections(2);
/// let port = SqlitePersistence::connect(options).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    /// Path to the database file. Created if missing.
    pub database_path: PathBuf,

    /// Default: 4. Only the flush worker writes, so few are needed.
    pub max_connections: u32,

    /// Default: 1
    pub min_connections: u32,

    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Default: true
    pub run_migrations: bool,
}

impl SqliteOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SqliteOptions {
            database_path: path.into(),
            max_connections: 4,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Private in-memory database (tests).
    ///
    /// Every connection to `:memory:` is a separate database, so the pool
    /// is pinned to one connection that never expires.
    pub fn in_memory() -> Self {
        SqliteOptions {
            database_path: PathBuf::from(MEMORY_PATH),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }

    fn is_memory(&self) -> bool {
        self.database_path.as_os_str() == MEMORY_PATH
    }
}

// =============================================================================
// Backend
// =============================================================================

#[derive(Debug, Clone)]
pub struct SqlitePersistence {
    pool: SqlitePool,
}

impl SqlitePersistence {
    /// Opens (and creates if needed) the database, then applies migrations.
    pub async fn connect(options: SqliteOptions) -> StoreResult<Self> {
        info!(
            path = %options.database_path.display(),
            "Opening snapshot database"
        );

        let base_options = if options.is_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?
        } else {
            if let Some(parent) = options.database_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            let url = format!("sqlite://{}?mode=rwc", options.database_path.display());
            SqliteConnectOptions::from_str(&url)
                .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?
                .journal_mode(SqliteJournalMode::Wal)
                .create_if_missing(true)
        };
        let connect_options = base_options
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .min_connections(options.min_connections)
            .acquire_timeout(options.connect_timeout)
            .idle_timeout(Some(options.idle_timeout));
        if options.is_memory() {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        debug!(max_connections = options.max_connections, "Snapshot pool created");

        if options.run_migrations {
            migrations::run_migrations(&pool).await?;
        }

        Ok(SqlitePersistence { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        info!("Closing snapshot database");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

impl PersistencePort for SqlitePersistence {
    async fn load(&self) -> StoreResult<Option<DomainSnapshot>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT name, payload FROM snapshot_collections")
                .fetch_all(&self.pool)
                .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut snapshot = DomainSnapshot::default();
        for (name, payload) in rows {
            if !COLLECTIONS.contains(&name.as_str()) {
                debug!(collection = %name, "Skipping unknown snapshot collection");
                continue;
            }
            snapshot.set_collection_json(&name, &payload)?;
        }
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &DomainSnapshot) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for name in COLLECTIONS {
            let Some(payload) = snapshot.collection_json(name)? else {
                continue;
            };
            sqlx::query(
                r#"
                INSERT INTO snapshot_collections (name, payload, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(name) DO UPDATE SET
                    payload = excluded.payload,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(name)
            .bind(payload)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!("Snapshot committed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::{Kernel, SeedData};

    #[tokio::test]
    async fn test_in_memory_database() {
        let port = SqlitePersistence::connect(SqliteOptions::in_memory())
            .await
            .unwrap();
        assert!(port.health_check().await);
        assert!(port.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_options_builder() {
        let options = SqliteOptions::new("/tmp/nexus.db")
            .max_connections(10)
            .min_connections(2)
            .run_migrations(false);

        assert_eq!(options.max_connections, 10);
        assert_eq!(options.min_connections, 2);
        assert!(!options.run_migrations);
        assert!(!options.is_memory());
        assert!(SqliteOptions::in_memory().is_memory());
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let port = SqlitePersistence::connect(SqliteOptions::in_memory())
            .await
            .unwrap();

        let mut kernel = Kernel::default();
        kernel.seed_if_empty(&SeedData::default()).unwrap();
        let snapshot = kernel.into_snapshot();

        port.save(&snapshot).await.unwrap();
        // Second save exercises the upsert path.
        port.save(&snapshot).await.unwrap();

        let loaded = port.load().await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);

        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM snapshot_collections")
            .fetch_one(port.pool())
            .await
            .unwrap();
        assert_eq!(rows as usize, COLLECTIONS.len());
    }

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("nexus.db");

        let mut kernel = Kernel::default();
        kernel.seed_if_empty(&SeedData::default()).unwrap();
        let snapshot = kernel.into_snapshot();

        let port = SqlitePersistence::connect(SqliteOptions::new(&path))
            .await
            .unwrap();
        port.save(&snapshot).await.unwrap();
        port.close().await;

        let reopened = SqlitePersistence::connect(SqliteOptions::new(&path))
            .await
            .unwrap();
        assert_eq!(reopened.load().await.unwrap(), Some(snapshot));
    }
}
