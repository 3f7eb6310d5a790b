use serde::{Deserialize, Serialize};
use crate::utils::get_env_with_prefix;

/// CORS settings for the dashboard.
///
/// The dashboard page is served from anywhere, so the defaults allow any
/// origin for the read and admin verbs it uses.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Allowed origins; `["*"]` allows any origin
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    #[serde(default = "default_allowed_methods")]
    pub allowed_methods: Vec<String>,

    /// Allowed request headers; `["*"]` allows any header
    #[serde(default = "default_allowed_headers")]
    pub allowed_headers: Vec<String>,

    /// Preflight cache lifetime in seconds
    #[serde(default = "default_max_age")]
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            allowed_origins: default_allowed_origins(),
            allowed_methods: default_allowed_methods(),
            allowed_headers: default_allowed_headers(),
            max_age_seconds: default_max_age(),
        }
    }
}

impl CorsConfig {
    /// Only the listed origins, with the default methods and headers.
    pub fn restricted_to(origins: Vec<String>) -> Self {
        Self {
            allowed_origins: origins,
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Overlay `CORS_*` environment variables (comma-separated lists).
    pub fn apply_env(&mut self) {
        if let Some(enabled) = get_env_with_prefix("CORS_ENABLED") {
            self.enabled = enabled.parse().unwrap_or(true);
        }

        if let Some(origins) = get_env_with_prefix("CORS_ALLOWED_ORIGINS") {
            self.allowed_origins = split_list(&origins);
        }

        if let Some(methods) = get_env_with_prefix("CORS_ALLOWED_METHODS") {
            self.allowed_methods = split_list(&methods);
        }

        if let Some(headers) = get_env_with_prefix("CORS_ALLOWED_HEADERS") {
            self.allowed_headers = split_list(&headers);
        }

        if let Some(max_age) = get_env_with_prefix("CORS_MAX_AGE") {
            if let Ok(val) = max_age.parse() {
                self.max_age_seconds = val;
            }
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn default_enabled() -> bool {
    true
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_allowed_methods() -> Vec<String> {
    vec!["GET".to_string(), "POST".to_string(), "OPTIONS".to_string()]
}

fn default_allowed_headers() -> Vec<String> {
    vec!["content-type".to_string(), "authorization".to_string()]
}

fn default_max_age() -> u64 {
    3600 // 1 hour
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CorsConfig::default();
        assert!(config.enabled);
        assert!(config.allows_any_origin());
        assert_eq!(config.allowed_methods, vec!["GET", "POST", "OPTIONS"]);
        assert_eq!(config.allowed_headers, vec!["content-type", "authorization"]);
    }

    #[test]
    fn test_restricted_to() {
        let config = CorsConfig::restricted_to(vec!["https://dashboard.example.com".into()]);
        assert!(config.enabled);
        assert!(!config.allows_any_origin());
    }

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(split_list("GET, POST,,"), vec!["GET", "POST"]);
    }

    #[test]
    fn test_apply_env_origins() {
        unsafe {
            std::env::set_var("DASHBOARD_CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example");
        }
        let mut config = CorsConfig::default();
        config.apply_env();
        unsafe {
            std::env::remove_var("DASHBOARD_CORS_ALLOWED_ORIGINS");
        }
        assert_eq!(config.allowed_origins, vec!["https://a.example", "https://b.example"]);
    }
}
