//! # Store Error Types
//!
//! Error types for facade and persistence operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  Kernel rule violation (CoreError)  ──┐                                │
//! │  SQLite error (sqlx::Error)         ──┤                                │
//! │  File I/O (std::io::Error)          ──┼──► StoreError (this module)    │
//! │  Snapshot JSON (serde_json::Error)  ──┤         │                      │
//! │  Config file (toml errors)          ──┘         ▼                      │
//! │                                           View: code() for rule        │
//! │                                           violations, message else     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Persistence errors raised by the background flush worker never reach a
//! caller: they are folded into `PersistenceStatus` instead.

use nexus_core::{CoreError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A domain rule rejected the operation. Nothing was changed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - File permissions issue
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Snapshot file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot payload is not valid JSON for the domain collections.
    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be parsed or failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    /// A backend refused the snapshot (used by test doubles).
    #[error("Persistence backend failed: {0}")]
    Backend(String),

    /// The flush worker is no longer running.
    #[error("Flush worker stopped")]
    WorkerStopped,
}

impl StoreError {
    /// Machine-readable code when the error is a domain rule violation.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            StoreError::Core(e) => Some(e.code()),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => StoreError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => {
                StoreError::ConnectionFailed("Connection pool exhausted".to_string())
            }
            sqlx::Error::PoolClosed => StoreError::ConnectionFailed("Pool is closed".to_string()),
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationFailed(err.to_string())
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        StoreError::InvalidConfig(err.to_string())
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(err: toml::ser::Error) -> Self {
        StoreError::ConfigSaveFailed(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
