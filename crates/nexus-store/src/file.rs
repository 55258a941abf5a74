//! # JSON File Backend
//!
//! The whole snapshot as one JSON document on local disk.
//!
//! ```text
//!   save(snapshot)
//!        │
//!        ▼
//!   write  nexus.json.tmp   ← a crash here leaves nexus.json untouched
//!        │
//!        ▼
//!   rename nexus.json.tmp → nexus.json   (atomic on the same filesystem)
//! ```

use std::path::{Path, PathBuf};
use tracing::debug;

use nexus_core::DomainSnapshot;

use crate::error::StoreResult;
use crate::port::PersistencePort;

#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFilePersistence { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PersistencePort for JsonFilePersistence {
    async fn load(&self) -> StoreResult<Option<DomainSnapshot>> {
        if !tokio::fs::try_exists(&self.path).await? {
            debug!(path = %self.path.display(), "no snapshot file yet");
            return Ok(None);
        }
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let snapshot = serde_json::from_str(&contents)?;
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &DomainSnapshot) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let contents = serde_json::to_vec_pretty(snapshot)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, contents).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        debug!(path = %self.path.display(), "snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::Unit;

    #[tokio::test]
    async fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let port = JsonFilePersistence::new(dir.path().join("nexus.json"));
        assert!(port.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_creates_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("nexus.json");
        let port = JsonFilePersistence::new(&path);

        let mut snapshot = DomainSnapshot::default();
        snapshot.units.push(Unit {
            id: "u1".into(),
            name: "Matriz".into(),
            active: true,
            tax_id: None,
        });
        port.save(&snapshot).await.unwrap();

        assert!(path.exists());
        assert!(!port.temp_path().exists());
        assert_eq!(port.load().await.unwrap(), Some(snapshot));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nexus.json");
        std::fs::write(&path, "{ not json").unwrap();

        let port = JsonFilePersistence::new(&path);
        assert!(port.load().await.is_err());
    }
}
