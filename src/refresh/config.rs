use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::DashboardError;
use crate::utils::get_env_with_prefix;

/// How `POST /admin/refresh` runs the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    /// Respond once the refresh has finished.
    #[default]
    Blocking,
    /// Respond as soon as the refresh has started.
    Background,
}

impl std::str::FromStr for RefreshMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blocking" => Ok(Self::Blocking),
            "background" => Ok(Self::Background),
            other => Err(format!("unknown refresh mode: {}", other)),
        }
    }
}

/// Refresh gate configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    /// Minimum time between two granted refresh attempts (default: 10)
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,

    #[serde(default)]
    pub mode: RefreshMode,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: default_cooldown_seconds(),
            mode: RefreshMode::default(),
        }
    }
}

fn default_cooldown_seconds() -> u64 {
    10
}

impl RefreshConfig {
    /// Overlay `REFRESH_COOLDOWN_SECONDS` and `REFRESH_MODE`.
    pub fn apply_env(&mut self) {
        if let Some(cooldown) = get_env_with_prefix("REFRESH_COOLDOWN_SECONDS") {
            if let Ok(c) = cooldown.parse() {
                self.cooldown_seconds = c;
            }
        }
        if let Some(mode) = get_env_with_prefix("REFRESH_MODE") {
            match mode.parse() {
                Ok(m) => self.mode = m,
                Err(e) => tracing::warn!(error = %e, "Ignoring REFRESH_MODE"),
            }
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if self.cooldown_seconds == 0 {
            return Err(DashboardError::bad_request(
                "Refresh cooldown must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RefreshConfig::default();
        assert_eq!(config.cooldown(), Duration::from_secs(10));
        assert_eq!(config.mode, RefreshMode::Blocking);
    }

    #[test]
    fn test_mode_from_json_and_str() {
        let config: RefreshConfig = serde_json::from_str(r#"{"mode": "background"}"#).unwrap();
        assert_eq!(config.mode, RefreshMode::Background);
        assert_eq!(config.cooldown_seconds, 10);

        assert_eq!("Blocking".parse::<RefreshMode>().unwrap(), RefreshMode::Blocking);
        assert!("sometimes".parse::<RefreshMode>().is_err());
    }
}
