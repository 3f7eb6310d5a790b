use std::sync::{Arc, RwLock};

use super::model::{Dataset, DatasetSnapshot};
use super::persistence::SnapshotStore;
use crate::clock::Clock;

/// Holds the snapshot every public read sees.
///
/// `current` clones an `Arc` under a read lock and `publish` swaps the
/// pointer under a write lock; neither lock is held across I/O or an await,
/// so reads never wait on refresh work. Readers that already hold a
/// snapshot keep it after a swap.
pub struct DatasetPublisher {
    current: RwLock<Arc<DatasetSnapshot>>,
    clock: Arc<dyn Clock>,
    store: Option<SnapshotStore>,
}

impl DatasetPublisher {
    /// Start from `seed`, usually the persisted snapshot or an empty one.
    pub fn new(seed: DatasetSnapshot, clock: Arc<dyn Clock>) -> Self {
        Self {
            current: RwLock::new(Arc::new(seed)),
            clock,
            store: None,
        }
    }

    /// Persist every published snapshot to `store`.
    #[must_use]
    pub fn with_store(mut self, store: SnapshotStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Build a publisher seeded from `store`, falling back to an empty
    /// snapshot when nothing usable is stored.
    pub async fn load(store: SnapshotStore, clock: Arc<dyn Clock>) -> Self {
        let seed = match store.load().await {
            Ok(Some(snapshot)) => {
                tracing::info!(
                    path = %store.path().display(),
                    version = snapshot.version,
                    "Loaded stored snapshot"
                );
                snapshot
            }
            Ok(None) => DatasetSnapshot::empty(clock.now()),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring stored snapshot");
                DatasetSnapshot::empty(clock.now())
            }
        };
        Self::new(seed, clock).with_store(store)
    }

    pub fn current(&self) -> Arc<DatasetSnapshot> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Make `dataset` the current snapshot under the next version.
    ///
    /// Persisting happens after the swap; a failed write is logged and the
    /// new snapshot stays published.
    pub async fn publish(&self, dataset: Dataset) -> Arc<DatasetSnapshot> {
        let snapshot = {
            let mut current = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let next = Arc::new(DatasetSnapshot {
                version: current.version + 1,
                published_at: Some(self.clock.now()),
                dataset,
            });
            *current = next.clone();
            next
        };

        tracing::info!(
            version = snapshot.version,
            centers = snapshot.dataset.overview.total_phc_centers,
            "Snapshot published"
        );

        if let Some(store) = &self.store {
            if let Err(e) = store.save(&snapshot).await {
                tracing::error!(error = %e, version = snapshot.version, "Failed to persist snapshot");
            }
        }

        snapshot
    }
}
