use secrecy::SecretString;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

use crate::auth::AdminConfig;
use crate::cors::CorsConfig;
use crate::dataset::SnapshotConfig;
use crate::error::DashboardError;
use crate::ingest::{SourceConfig, ValidationConfig};
use crate::refresh::{RefreshConfig, RefreshMode};
use crate::schedule::ScheduleConfig;
use crate::utils::get_env_with_prefix;

/// Main configuration for the dashboard service
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub admin: AdminConfig,
    #[serde(alias = "onedrive")]
    pub source: SourceConfig,
    pub refresh: RefreshConfig,
    pub validation: ValidationConfig,
    pub snapshot: SnapshotConfig,
    pub schedule: ScheduleConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size in bytes (default: 1MB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Builder for Config with environment variable and file support
///
/// Layers are applied in call order, so the usual chain is
/// defaults, then [`from_file`](Self::from_file), then [`from_env`](Self::from_env).
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Replace the configuration with the contents of a JSON file.
    ///
    /// Missing sections and fields keep their defaults. The legacy
    /// `onedrive` section name is accepted for `source`.
    pub fn from_file(mut self, path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DashboardError::bad_request(format!(
                "Cannot read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        self.config = serde_json::from_str(&raw).map_err(|e| {
            DashboardError::bad_request(format!(
                "Invalid config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(self)
    }

    /// Like [`from_file`](Self::from_file), but a missing file is not an error.
    pub fn from_optional_file(self, path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(self);
        }
        self.from_file(path)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    /// Set the admin password; it is hashed when the service starts.
    pub fn with_admin_password(mut self, password: impl Into<String>) -> Self {
        self.config.admin.password = Some(SecretString::from(password.into()));
        self
    }

    /// Set a pre-computed Argon2id PHC hash for the admin password.
    pub fn with_admin_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.config.admin.password_hash = Some(hash.into());
        self
    }

    pub fn with_session_timeout_minutes(mut self, minutes: u64) -> Self {
        self.config.admin.session_timeout_minutes = minutes;
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.config.source.download_url = Some(url.into());
        self
    }

    pub fn with_alternate_source_url(mut self, url: impl Into<String>) -> Self {
        self.config.source.alternate_url = Some(url.into());
        self
    }

    pub fn with_download_timeout_seconds(mut self, seconds: u64) -> Self {
        self.config.source.timeout_seconds = seconds;
        self
    }

    pub fn with_cooldown_seconds(mut self, seconds: u64) -> Self {
        self.config.refresh.cooldown_seconds = seconds;
        self
    }

    pub fn with_refresh_mode(mut self, mode: RefreshMode) -> Self {
        self.config.refresh.mode = mode;
        self
    }

    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.config.validation = validation;
        self
    }

    pub fn with_snapshot(mut self, snapshot: SnapshotConfig) -> Self {
        self.config.snapshot = snapshot;
        self
    }

    pub fn with_schedule(mut self, schedule: ScheduleConfig) -> Self {
        self.config.schedule = schedule;
        self
    }

    pub fn with_cors(mut self, cors: CorsConfig) -> Self {
        self.config.cors = cors;
        self
    }

    /// Overlay environment variables (`DASHBOARD_` prefix, unprefixed fallback)
    pub fn from_env(mut self) -> Self {
        if let Some(host) = get_env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        if let Some(port) = get_env_with_prefix("PORT") {
            if let Ok(p) = port.parse() {
                self.config.server.port = p;
            }
        }
        if let Some(max_body_size) = get_env_with_prefix("MAX_BODY_SIZE") {
            if let Ok(size) = max_body_size.parse() {
                self.config.server.max_body_size = size;
            }
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }

        self.config.admin.apply_env();
        self.config.source.apply_env();
        self.config.refresh.apply_env();
        self.config.validation.apply_env();
        self.config.snapshot.apply_env();
        self.config.schedule.apply_env();
        self.config.cors.apply_env();

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration is invalid:
    /// - Invalid server address (host:port) or zero port
    /// - Invalid log level
    /// - No admin credential, or a zero session timeout
    /// - Zero refresh cooldown or download timeout
    /// - A source URL that does not parse
    pub fn build(self) -> crate::error::Result<Config> {
        let config = self.config;

        config.server.addr().map_err(|e| {
            DashboardError::bad_request(format!(
                "Invalid server address {}:{} - {}",
                config.server.host, config.server.port, e
            ))
        })?;

        if config.server.port == 0 {
            return Err(DashboardError::bad_request(
                "Server port must be greater than 0",
            ));
        }

        if config.server.max_body_size == 0 {
            return Err(DashboardError::bad_request(
                "Maximum body size must be greater than 0",
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(DashboardError::bad_request(format!(
                "Invalid log level: {}. Must be one of: {}",
                config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        config.admin.validate()?;
        config.source.validate()?;
        config.refresh.validate()?;
        config.validation.validate()?;

        if config.source.download_url.is_none() {
            tracing::warn!("No source download URL configured; refreshes will fail until one is set");
        }

        Ok(config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_builder() -> ConfigBuilder {
        ConfigBuilder::new()
            .with_admin_password("correct horse")
            .with_source_url("https://example.com/outreach.xlsx")
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let config = valid_builder().build().unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.admin.session_timeout_minutes, 30);
        assert_eq!(config.refresh.cooldown_seconds, 10);
        assert_eq!(config.source.timeout_seconds, 30);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let result = valid_builder().with_log_level("verbose").build();
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_zero_port_rejected() {
        let result = valid_builder().with_port(0).build();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Server port must be greater than 0"));
    }

    #[test]
    fn test_invalid_host_rejected() {
        let result = valid_builder().with_host("invalid..host").build();
        assert!(result.unwrap_err().to_string().contains("Invalid server address"));
    }

    #[test]
    fn test_missing_credential_rejected() {
        let result = ConfigBuilder::new().build();
        assert!(result.unwrap_err().to_string().contains("admin"));
    }

    #[test]
    fn test_zero_cooldown_rejected() {
        let result = valid_builder().with_cooldown_seconds(0).build();
        assert!(result.unwrap_err().to_string().contains("cooldown"));
    }

    #[test]
    fn test_unparseable_source_url_rejected() {
        let result = valid_builder().with_source_url("not a url").build();
        assert!(result.unwrap_err().to_string().contains("source URL"));
    }

    #[test]
    fn test_from_file_accepts_legacy_layout() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "admin": {{"password": "from-file", "session_timeout_minutes": 45}},
                "onedrive": {{"download_url": "https://1drv.ms/x/s!abc", "excel_url": "https://example.com/alt.xlsx"}},
                "refresh": {{"cooldown_seconds": 20}}
            }}"#
        )
        .unwrap();

        let config = ConfigBuilder::new()
            .from_file(file.path())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.admin.session_timeout_minutes, 45);
        assert_eq!(config.refresh.cooldown_seconds, 20);
        assert_eq!(
            config.source.download_url.as_deref(),
            Some("https://1drv.ms/x/s!abc")
        );
        assert_eq!(
            config.source.alternate_url.as_deref(),
            Some("https://example.com/alt.xlsx")
        );
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_from_optional_file_missing_is_ok() {
        let builder = ConfigBuilder::new()
            .from_optional_file("/definitely/not/here/config.json")
            .unwrap();
        assert!(builder.with_admin_password("pw").build().is_ok());
    }
}
