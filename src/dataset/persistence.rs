use std::path::{Path, PathBuf};

use super::model::DatasetSnapshot;
use crate::error::{DashboardError, Result};
use crate::utils::write_atomic;

/// Keeps the last published snapshot in a JSON file.
///
/// Writes are atomic: a crash mid-write leaves the previous file intact.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored snapshot, if there is one.
    pub async fn load(&self) -> Result<Option<DatasetSnapshot>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot = serde_json::from_slice(&raw).map_err(|e| {
            DashboardError::internal(format!(
                "Stored snapshot {} is unreadable: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(Some(snapshot))
    }

    pub async fn save(&self, snapshot: &DatasetSnapshot) -> Result<()> {
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| DashboardError::internal(format!("Snapshot serialization failed: {}", e)))?;

        write_atomic(&self.path, &json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, OutreachRecord, SectorRows};
    use chrono::Utc;

    fn snapshot(version: u64) -> DatasetSnapshot {
        let rows = vec![OutreachRecord {
            source_name: Some("PHC Alpha.xlsx".into()),
            response: Some("Accepted".into()),
            ..Default::default()
        }];
        DatasetSnapshot {
            version,
            published_at: Some(Utc::now()),
            dataset: Dataset::aggregate(
                vec![SectorRows { sheet: "western_sector".into(), rows }],
                Utc::now(),
            ),
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("dashboard_data.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("dashboard_data.json"));

        let saved = snapshot(3);
        store.save(&saved).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();

        assert_eq!(loaded.version, 3);
        assert_eq!(loaded.dataset.sectors, saved.dataset.sectors);
        assert!(!dir.path().join("dashboard_data.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard_data.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = SnapshotStore::new(path);
        assert!(store.load().await.is_err());
    }
}
