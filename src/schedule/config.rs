use serde::Deserialize;
use std::path::PathBuf;

use crate::utils::get_env_with_prefix;

/// Background task configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// JSON file holding the auto-refresh settings (default: auto_refresh_config.json)
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,

    /// How often expired admin sessions are purged (default: 300)
    #[serde(default = "default_session_purge_interval_seconds")]
    pub session_purge_interval_seconds: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            settings_path: default_settings_path(),
            session_purge_interval_seconds: default_session_purge_interval_seconds(),
        }
    }
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("auto_refresh_config.json")
}

fn default_session_purge_interval_seconds() -> u64 {
    300
}

impl ScheduleConfig {
    /// Overlay `SCHEDULE_SETTINGS_PATH` and `SESSION_PURGE_INTERVAL_SECONDS`.
    pub fn apply_env(&mut self) {
        if let Some(path) = get_env_with_prefix("SCHEDULE_SETTINGS_PATH") {
            self.settings_path = PathBuf::from(path);
        }
        if let Some(seconds) = get_env_with_prefix("SESSION_PURGE_INTERVAL_SECONDS") {
            if let Ok(s) = seconds.parse() {
                self.session_purge_interval_seconds = s;
            }
        }
    }

    pub fn session_purge_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.session_purge_interval_seconds.max(1))
    }
}
