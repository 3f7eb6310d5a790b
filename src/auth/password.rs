//! Password hashing and the admin credential.
//!
//! The admin password is only ever held as an Argon2id PHC string. Argon2's
//! verify compares in constant time, so checking a login attempt does not leak
//! how much of the candidate matched.

use super::error::AuthError;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as Argon2Hasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};
use secrecy::{ExposeSecret, SecretString};

/// Configuration for password hashing.
#[derive(Clone, Debug)]
pub struct PasswordConfig {
    /// Memory cost in KiB (default: 19456 = 19MB)
    pub memory_cost: u32,
    /// Time cost / iterations (default: 2)
    pub time_cost: u32,
    /// Parallelism (default: 1)
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        // OWASP recommended minimum for Argon2id
        Self {
            memory_cost: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl PasswordConfig {
    /// Cheap settings for tests. Not for production.
    pub fn fast() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }
}

/// Hashes passwords with Argon2id.
#[derive(Clone, Debug, Default)]
pub struct PasswordHasher {
    config: PasswordConfig,
}

impl PasswordHasher {
    pub fn new(config: PasswordConfig) -> Self {
        Self { config }
    }

    /// Hash a password, returning the PHC-formatted string.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let params = Params::new(
            self.config.memory_cost,
            self.config.time_cost,
            self.config.parallelism,
            None,
        )
        .map_err(|e| AuthError::Credential(format!("Invalid Argon2 params: {}", e)))?;

        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Credential(format!("Password hashing failed: {}", e)))
    }
}

/// The configured admin credential.
#[derive(Clone)]
pub struct AdminCredential {
    phc: String,
}

impl AdminCredential {
    /// Use a pre-computed PHC hash. Fails if the string is not a valid PHC hash.
    pub fn from_phc_hash(hash: &str) -> Result<Self, AuthError> {
        PasswordHash::new(hash)
            .map_err(|e| AuthError::Credential(format!("Invalid password hash format: {}", e)))?;
        Ok(Self {
            phc: hash.to_string(),
        })
    }

    /// Hash a plaintext password once.
    pub fn from_plaintext(password: &SecretString, hasher: &PasswordHasher) -> Result<Self, AuthError> {
        Ok(Self {
            phc: hasher.hash(password.expose_secret())?,
        })
    }

    /// Check a login attempt. Params are read from the stored hash.
    pub fn verify(&self, candidate: &str) -> bool {
        match PasswordHash::new(&self.phc) {
            Ok(parsed) => Argon2::default()
                .verify_password(candidate.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredential")
            .field("phc", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(PasswordConfig::fast())
    }

    #[test]
    fn test_hash_is_argon2id_and_salted() {
        let a = hasher().hash("password").unwrap();
        let b = hasher().hash("password").unwrap();
        assert!(a.starts_with("$argon2id$"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify() {
        let credential =
            AdminCredential::from_plaintext(&SecretString::from("correct".to_string()), &hasher())
                .unwrap();
        assert!(credential.verify("correct"));
        assert!(!credential.verify("incorrect"));
        assert!(!credential.verify(""));
    }

    #[test]
    fn test_from_phc_hash_rejects_garbage() {
        let err = AdminCredential::from_phc_hash("not-a-hash").unwrap_err();
        assert!(matches!(err, AuthError::Credential(_)));
    }

    #[test]
    fn test_from_phc_hash_roundtrip() {
        let hash = hasher().hash("pw").unwrap();
        let credential = AdminCredential::from_phc_hash(&hash).unwrap();
        assert!(credential.verify("pw"));
    }
}
