//! # Store Configuration
//!
//! Where the snapshot lives, how much audit history is kept, and what the
//! first-run seed looks like.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Load Order (later overrides earlier)                 │
//! │                                                                         │
//! │  1. Defaults          backend = json, retention = 100, seed enabled    │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  2. nexus.toml        platform config dir, or an explicit path         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  3. Environment       NEXUS_BACKEND, NEXUS_DATA_DIR,                   │
//! │        │              NEXUS_AUDIT_RETENTION, NEXUS_ADMIN_EMAIL,        │
//! │        │              NEXUS_ADMIN_PASSWORD                             │
//! │        ▼                                                                │
//! │  4. validate()                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # nexus.toml
//! [storage]
//! backend = "sqlite"          # memory | json | sqlite
//! data_dir = "/var/lib/nexus"
//!
//! [audit]
//! retention = 100             # 0 keeps every entry
//!
//! [seed]
//! enabled = true
//! unit_name = "Matriz São Paulo"
//! admin_email = "admin@nexus.com"
//! admin_password = "admin123"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use nexus_core::{SeedData, DEFAULT_AUDIT_RETENTION};

use crate::error::{StoreError, StoreResult};

pub const CONFIG_FILE_NAME: &str = "nexus.toml";
pub const JSON_FILE_NAME: &str = "nexus.json";
pub const SQLITE_FILE_NAME: &str = "nexus.db";

// =============================================================================
// Backend Kind
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Nothing survives a restart.
    Memory,
    /// One JSON document in the data directory.
    #[default]
    Json,
    /// SQLite database in the data directory.
    Sqlite,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::Json => write!(f, "json"),
            BackendKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(BackendKind::Memory),
            "json" | "file" => Ok(BackendKind::Json),
            "sqlite" | "db" => Ok(BackendKind::Sqlite),
            other => Err(StoreError::InvalidConfig(format!(
                "Unknown backend: '{}'. Valid options: memory, json, sqlite",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: BackendKind,

    /// Directory holding `nexus.json` / `nexus.db`.
    /// Defaults to the platform data dir.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSettings {
    /// Newest entries kept. 0 keeps everything.
    #[serde(default = "default_retention")]
    pub retention: usize,
}

fn default_retention() -> usize {
    DEFAULT_AUDIT_RETENTION
}

impl Default for AuditSettings {
    fn default() -> Self {
        AuditSettings {
            retention: default_retention(),
        }
    }
}

/// First-run data, applied only when the loaded snapshot has no users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_unit_name")]
    pub unit_name: String,

    #[serde(default = "default_admin_name")]
    pub admin_name: String,

    #[serde(default = "default_admin_email")]
    pub admin_email: String,

    /// Empty leaves the seeded admin without a password.
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
}

fn default_true() -> bool {
    true
}

fn default_unit_name() -> String {
    SeedData::default().unit_name
}

fn default_admin_name() -> String {
    SeedData::default().admin_name
}

fn default_admin_email() -> String {
    SeedData::default().admin_email
}

fn default_admin_password() -> String {
    SeedData::default().admin_password
}

impl Default for SeedSettings {
    fn default() -> Self {
        SeedSettings {
            enabled: true,
            unit_name: default_unit_name(),
            admin_name: default_admin_name(),
            admin_email: default_admin_email(),
            admin_password: default_admin_password(),
        }
    }
}

impl SeedSettings {
    /// `None` when seeding is switched off.
    pub fn seed_data(&self) -> Option<SeedData> {
        self.enabled.then(|| SeedData {
            unit_name: self.unit_name.clone(),
            admin_name: self.admin_name.clone(),
            admin_email: self.admin_email.clone(),
            admin_password: self.admin_password.clone(),
        })
    }
}

// =============================================================================
// Store Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub audit: AuditSettings,

    #[serde(default)]
    pub seed: SeedSettings,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config that keeps everything in memory and seeds the default admin.
    pub fn in_memory() -> Self {
        let mut config = Self::default();
        config.storage.backend = BackendKind::Memory;
        config
    }

    /// Loads configuration from file, environment, and defaults.
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading store config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load store config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> StoreResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| StoreError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Store config saved");
        Ok(())
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.storage.backend != BackendKind::Memory && self.resolved_data_dir().is_none() {
            return Err(StoreError::InvalidConfig(
                "No data_dir configured and no platform data directory available".into(),
            ));
        }

        if let Some(dir) = &self.storage.data_dir {
            if dir.as_os_str().is_empty() {
                return Err(StoreError::InvalidConfig("data_dir must not be empty".into()));
            }
        }

        if self.seed.enabled {
            if self.seed.unit_name.trim().is_empty() {
                return Err(StoreError::InvalidConfig(
                    "seed.unit_name must not be empty".into(),
                ));
            }
            if !self.seed.admin_email.contains('@') {
                return Err(StoreError::InvalidConfig(format!(
                    "seed.admin_email is not an email address: {}",
                    self.seed.admin_email
                )));
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(backend) = lookup("NEXUS_BACKEND") {
            match backend.parse() {
                Ok(parsed) => {
                    debug!(backend = %backend, "Overriding backend from environment");
                    self.storage.backend = parsed;
                }
                Err(e) => warn!("Ignoring NEXUS_BACKEND: {}", e),
            }
        }

        if let Some(dir) = lookup("NEXUS_DATA_DIR") {
            debug!(data_dir = %dir, "Overriding data dir from environment");
            self.storage.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(retention) = lookup("NEXUS_AUDIT_RETENTION") {
            if let Ok(r) = retention.parse::<usize>() {
                self.audit.retention = r;
            }
        }

        if let Some(email) = lookup("NEXUS_ADMIN_EMAIL") {
            self.seed.admin_email = email;
        }

        if let Some(password) = lookup("NEXUS_ADMIN_PASSWORD") {
            self.seed.admin_password = password;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "nexus", "erp")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn backend(&self) -> BackendKind {
        self.storage.backend
    }

    /// Configured data dir, or the platform default.
    pub fn resolved_data_dir(&self) -> Option<PathBuf> {
        self.storage.data_dir.clone().or_else(|| {
            directories::ProjectDirs::from("com", "nexus", "erp")
                .map(|dirs| dirs.data_dir().to_path_buf())
        })
    }

    /// Path of the snapshot file or database for the configured backend.
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        let file = match self.storage.backend {
            BackendKind::Memory => return None,
            BackendKind::Json => JSON_FILE_NAME,
            BackendKind::Sqlite => SQLITE_FILE_NAME,
        };
        self.resolved_data_dir().map(|dir| dir.join(file))
    }

    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.storage.data_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.storage.backend = backend;
        self
    }
}
