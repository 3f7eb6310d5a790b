use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::AuthError;
use super::password::{AdminCredential, PasswordHasher};
use crate::error::DashboardError;
use crate::utils::env::is_placeholder;
use crate::utils::get_env_with_prefix;

/// Admin login configuration
///
/// Either `password` (hashed once at startup) or `password_hash` (an Argon2id
/// PHC string) must be set. When both are present the hash wins.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub password: Option<SecretString>,

    #[serde(default)]
    pub password_hash: Option<String>,

    /// Absolute session lifetime in minutes (default: 30)
    #[serde(default = "default_session_timeout_minutes")]
    pub session_timeout_minutes: u64,

    /// How many audit entries the activity endpoint can show (default: 100)
    #[serde(default = "default_activity_log_capacity")]
    pub activity_log_capacity: usize,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password: None,
            password_hash: None,
            session_timeout_minutes: default_session_timeout_minutes(),
            activity_log_capacity: default_activity_log_capacity(),
        }
    }
}

/// One week.
pub const MAX_SESSION_TIMEOUT_MINUTES: u64 = 7 * 24 * 60;

fn default_session_timeout_minutes() -> u64 {
    30
}

fn default_activity_log_capacity() -> usize {
    100
}

impl AdminConfig {
    /// Overlay `ADMIN_PASSWORD`, `ADMIN_PASSWORD_HASH`,
    /// `SESSION_TIMEOUT_MINUTES` and `ACTIVITY_LOG_CAPACITY`.
    pub fn apply_env(&mut self) {
        if let Some(password) = get_env_with_prefix("ADMIN_PASSWORD") {
            self.password = Some(SecretString::from(password));
        }
        if let Some(hash) = get_env_with_prefix("ADMIN_PASSWORD_HASH") {
            self.password_hash = Some(hash);
        }
        if let Some(minutes) = get_env_with_prefix("SESSION_TIMEOUT_MINUTES") {
            if let Ok(m) = minutes.parse() {
                self.session_timeout_minutes = m;
            }
        }
        if let Some(capacity) = get_env_with_prefix("ACTIVITY_LOG_CAPACITY") {
            if let Ok(c) = capacity.parse() {
                self.activity_log_capacity = c;
            }
        }
    }

    fn configured_password(&self) -> Option<&SecretString> {
        self.password
            .as_ref()
            .filter(|p| !is_placeholder(p.expose_secret()))
    }

    fn configured_hash(&self) -> Option<&str> {
        self.password_hash.as_deref().filter(|h| !is_placeholder(h))
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if self.configured_password().is_none() && self.configured_hash().is_none() {
            return Err(DashboardError::bad_request(
                "No admin credential configured; set ADMIN_PASSWORD or ADMIN_PASSWORD_HASH",
            ));
        }
        if self.session_timeout_minutes == 0 {
            return Err(DashboardError::bad_request(
                "Session timeout must be greater than 0",
            ));
        }
        if self.session_timeout_minutes > MAX_SESSION_TIMEOUT_MINUTES {
            return Err(DashboardError::bad_request(format!(
                "Session timeout must be at most {} minutes",
                MAX_SESSION_TIMEOUT_MINUTES
            )));
        }
        Ok(())
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        let minutes = self.session_timeout_minutes.min(MAX_SESSION_TIMEOUT_MINUTES);
        chrono::Duration::minutes(minutes as i64)
    }

    /// Resolve the credential the authenticator checks against.
    ///
    /// A plaintext password is hashed here with `hasher`; the plaintext is not
    /// kept anywhere else.
    pub fn credential(&self, hasher: &PasswordHasher) -> Result<AdminCredential, AuthError> {
        if let Some(hash) = self.configured_hash() {
            return AdminCredential::from_phc_hash(hash);
        }
        match self.configured_password() {
            Some(password) => AdminCredential::from_plaintext(password, hasher),
            None => Err(AuthError::Credential(
                "no admin password configured".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PasswordConfig;

    #[test]
    fn test_default_config() {
        let config = AdminConfig::default();
        assert_eq!(config.session_timeout_minutes, 30);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_placeholder_password_is_not_a_credential() {
        let config = AdminConfig {
            password: Some(SecretString::from("USE_ENVIRONMENT_VARIABLE".to_string())),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("admin credential"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = AdminConfig {
            password: Some(SecretString::from("pw".to_string())),
            session_timeout_minutes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_upper_bound() {
        let mut config = AdminConfig {
            password: Some(SecretString::from("pw".to_string())),
            session_timeout_minutes: MAX_SESSION_TIMEOUT_MINUTES,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.session_ttl(), chrono::Duration::days(7));

        config.session_timeout_minutes = u64::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at most"));
        assert_eq!(config.session_ttl(), chrono::Duration::days(7));
    }

    #[test]
    fn test_credential_from_plaintext_verifies() {
        let config = AdminConfig {
            password: Some(SecretString::from("s3cret".to_string())),
            ..Default::default()
        };
        let credential = config
            .credential(&PasswordHasher::new(PasswordConfig::fast()))
            .unwrap();
        assert!(credential.verify("s3cret"));
        assert!(!credential.verify("S3cret"));
    }

    #[test]
    fn test_hash_preferred_over_plaintext() {
        let hasher = PasswordHasher::new(PasswordConfig::fast());
        let hash = hasher.hash("from-hash").unwrap();
        let config = AdminConfig {
            password: Some(SecretString::from("from-plaintext".to_string())),
            password_hash: Some(hash),
            ..Default::default()
        };
        let credential = config.credential(&hasher).unwrap();
        assert!(credential.verify("from-hash"));
        assert!(!credential.verify("from-plaintext"));
    }

    #[test]
    fn test_debug_does_not_leak_password() {
        let config = AdminConfig {
            password: Some(SecretString::from("hunter2".to_string())),
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
