use serde::Deserialize;
use std::path::PathBuf;

use crate::utils::get_env_with_prefix;

/// Where the last published snapshot is kept between restarts
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    /// Persist each published snapshot (default: true)
    #[serde(default = "default_persist")]
    pub persist: bool,

    /// JSON file holding the last published snapshot (default: dashboard_data.json)
    #[serde(default = "default_path")]
    pub path: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            persist: default_persist(),
            path: default_path(),
        }
    }
}

fn default_persist() -> bool {
    true
}

fn default_path() -> PathBuf {
    PathBuf::from("dashboard_data.json")
}

impl SnapshotConfig {
    /// Overlay `SNAPSHOT_PERSIST` and `SNAPSHOT_PATH`.
    pub fn apply_env(&mut self) {
        if let Some(persist) = get_env_with_prefix("SNAPSHOT_PERSIST") {
            self.persist = persist.parse().unwrap_or(self.persist);
        }
        if let Some(path) = get_env_with_prefix("SNAPSHOT_PATH") {
            self.path = PathBuf::from(path);
        }
    }
}
