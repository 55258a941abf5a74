//! Backend selected at startup from [`StoreConfig`].

use tracing::info;

use nexus_core::DomainSnapshot;

use crate::config::{BackendKind, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::file::JsonFilePersistence;
use crate::memory::MemoryPersistence;
use crate::port::PersistencePort;
use crate::sqlite::{SqliteOptions, SqlitePersistence};

#[derive(Debug)]
pub enum Backend {
    Memory(MemoryPersistence),
    JsonFile(JsonFilePersistence),
    Sqlite(SqlitePersistence),
}

impl Backend {
    pub async fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        let kind = config.backend();
        let backend = match kind {
            BackendKind::Memory => Backend::Memory(MemoryPersistence::new()),
            BackendKind::Json => Backend::JsonFile(JsonFilePersistence::new(
                config.snapshot_path().ok_or_else(no_path)?,
            )),
            BackendKind::Sqlite => {
                let path = config.snapshot_path().ok_or_else(no_path)?;
                Backend::Sqlite(SqlitePersistence::connect(SqliteOptions::new(path)).await?)
            }
        };
        info!(backend = %kind, "Persistence backend ready");
        Ok(backend)
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Memory(_) => BackendKind::Memory,
            Backend::JsonFile(_) => BackendKind::Json,
            Backend::Sqlite(_) => BackendKind::Sqlite,
        }
    }
}

fn no_path() -> StoreError {
    StoreError::InvalidConfig("No data directory available for the snapshot".into())
}

impl PersistencePort for Backend {
    async fn load(&self) -> StoreResult<Option<DomainSnapshot>> {
        match self {
            Backend::Memory(port) => port.load().await,
            Backend::JsonFile(port) => port.load().await,
            Backend::Sqlite(port) => port.load().await,
        }
    }

    async fn save(&self, snapshot: &DomainSnapshot) -> StoreResult<()> {
        match self {
            Backend::Memory(port) => port.save(snapshot).await,
            Backend::JsonFile(port) => port.save(snapshot).await,
            Backend::Sqlite(port) => port.save(snapshot).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_backend_from_config() {
        let dir = tempfile::tempdir().unwrap();

        let memory = Backend::from_config(&StoreConfig::in_memory()).await.unwrap();
        assert_eq!(memory.kind(), BackendKind::Memory);

        let json = Backend::from_config(&StoreConfig::default().with_data_dir(dir.path()))
            .await
            .unwrap();
        assert_eq!(json.kind(), BackendKind::Json);

        let sqlite = Backend::from_config(
            &StoreConfig::default()
                .with_backend(BackendKind::Sqlite)
                .with_data_dir(dir.path()),
        )
        .await
        .unwrap();
        assert_eq!(sqlite.kind(), BackendKind::Sqlite);
        assert!(dir.path().join("nexus.db").exists());
    }

    #[tokio::test]
    async fn test_json_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Backend::from_config(&StoreConfig::default().with_data_dir(dir.path()))
            .await
            .unwrap();

        assert!(backend.load().await.unwrap().is_none());
        backend.save(&DomainSnapshot::default()).await.unwrap();
        assert_eq!(backend.load().await.unwrap(), Some(DomainSnapshot::default()));
    }
}
