use serde::Deserialize;
use std::time::Duration;

use crate::error::DashboardError;
use crate::utils::get_env_with_prefix;

/// Where the outreach workbook is downloaded from
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Primary download URL (a OneDrive share link or any direct link)
    #[serde(default)]
    pub download_url: Option<String>,

    /// Tried once when the primary URL fails
    #[serde(default, alias = "excel_url")]
    pub alternate_url: Option<String>,

    /// Download timeout in seconds (default: 30)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Largest accepted payload in bytes (default: 50MB)
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// OneDrive serves an HTML preview to clients it does not recognise
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            download_url: None,
            alternate_url: None,
            timeout_seconds: default_timeout_seconds(),
            max_bytes: default_max_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string()
}

impl SourceConfig {
    /// Overlay `SOURCE_DOWNLOAD_URL` (or `ONEDRIVE_DOWNLOAD_URL`),
    /// `SOURCE_ALTERNATE_URL` (or `ONEDRIVE_EXCEL_URL`),
    /// `SOURCE_TIMEOUT_SECONDS` and `SOURCE_MAX_BYTES`.
    pub fn apply_env(&mut self) {
        if let Some(url) = get_env_with_prefix("SOURCE_DOWNLOAD_URL")
            .or_else(|| get_env_with_prefix("ONEDRIVE_DOWNLOAD_URL"))
        {
            self.download_url = Some(url);
        }
        if let Some(url) = get_env_with_prefix("SOURCE_ALTERNATE_URL")
            .or_else(|| get_env_with_prefix("ONEDRIVE_EXCEL_URL"))
        {
            self.alternate_url = Some(url);
        }
        if let Some(timeout) = get_env_with_prefix("SOURCE_TIMEOUT_SECONDS") {
            if let Ok(t) = timeout.parse() {
                self.timeout_seconds = t;
            }
        }
        if let Some(max) = get_env_with_prefix("SOURCE_MAX_BYTES") {
            if let Ok(m) = max.parse() {
                self.max_bytes = m;
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if self.timeout_seconds == 0 {
            return Err(DashboardError::bad_request(
                "Download timeout must be greater than 0",
            ));
        }
        if self.max_bytes == 0 {
            return Err(DashboardError::bad_request(
                "Maximum source size must be greater than 0",
            ));
        }
        for url in [&self.download_url, &self.alternate_url].into_iter().flatten() {
            validate_url(url)?;
        }
        Ok(())
    }
}

fn validate_url(raw: &str) -> crate::error::Result<()> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| DashboardError::bad_request(format!("Invalid source URL '{}': {}", raw, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(DashboardError::bad_request(format!(
            "Invalid source URL '{}': unsupported scheme {}",
            raw, other
        ))),
    }
}

/// Sanity limits a parsed dataset must meet before it is published
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    /// Sheets that must be present (default: the four sector sheets)
    #[serde(default = "default_sectors")]
    pub sectors: Vec<String>,

    #[serde(default)]
    pub min_centers: Option<usize>,

    #[serde(default)]
    pub max_centers: Option<usize>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            sectors: default_sectors(),
            min_centers: None,
            max_centers: None,
        }
    }
}

fn default_sectors() -> Vec<String> {
    ["western_sector", "eastern_sector", "northern_sector", "southern_sector"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl ValidationConfig {
    /// Overlay `VALIDATION_SECTORS` (comma separated), `VALIDATION_MIN_CENTERS`
    /// and `VALIDATION_MAX_CENTERS`.
    pub fn apply_env(&mut self) {
        if let Some(sectors) = get_env_with_prefix("VALIDATION_SECTORS") {
            self.sectors = sectors
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(min) = get_env_with_prefix("VALIDATION_MIN_CENTERS") {
            if let Ok(m) = min.parse() {
                self.min_centers = Some(m);
            }
        }
        if let Some(max) = get_env_with_prefix("VALIDATION_MAX_CENTERS") {
            if let Ok(m) = max.parse() {
                self.max_centers = Some(m);
            }
        }
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if self.sectors.is_empty() {
            return Err(DashboardError::bad_request(
                "At least one sector sheet must be configured",
            ));
        }
        if let (Some(min), Some(max)) = (self.min_centers, self.max_centers) {
            if min > max {
                return Err(DashboardError::bad_request(format!(
                    "min_centers ({}) must not exceed max_centers ({})",
                    min, max
                )));
            }
        }
        Ok(())
    }
}
