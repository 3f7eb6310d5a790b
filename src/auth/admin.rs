use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

use super::error::AuthError;
use super::password::AdminCredential;
use super::token::generate_session_token;
use crate::audit::{AuditEntry, AuditEvent, AuditLog, AuditOutcome};
use crate::clock::Clock;
use crate::session::{Session, SessionStore};

/// Actor recorded for everything the admin does.
pub const ADMIN_ACTOR: &str = "admin";

/// Issues and checks admin sessions.
///
/// Every login attempt is appended to the audit log. The candidate password is
/// never logged or stored.
#[derive(Clone)]
pub struct AdminAuthenticator {
    credential: AdminCredential,
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditLog>,
    session_ttl: Duration,
}

impl AdminAuthenticator {
    pub fn new(
        credential: AdminCredential,
        sessions: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        audit: Arc<dyn AuditLog>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            credential,
            sessions,
            clock,
            audit,
            session_ttl,
        }
    }

    /// Check the password and open a new session.
    pub async fn authenticate(&self, password: SecretString) -> Result<Session, AuthError> {
        let credential = self.credential.clone();
        // Argon2 is deliberately slow; keep it off the async workers.
        let matches = tokio::task::spawn_blocking(move || {
            credential.verify(password.expose_secret())
        })
        .await
        .map_err(|e| AuthError::Credential(format!("Password check panicked: {}", e)))?;

        let now = self.clock.now();

        if !matches {
            self.audit.append(
                AuditEntry::new(now, ADMIN_ACTOR, AuditEvent::Login, AuditOutcome::Failed)
                    .with_reason("invalid credentials"),
            );
            return Err(AuthError::InvalidCredentials);
        }

        let session = Session::new(generate_session_token(), now, self.session_ttl);
        self.sessions
            .save(session.clone())
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        self.audit.append(AuditEntry::new(
            now,
            ADMIN_ACTOR,
            AuditEvent::Login,
            AuditOutcome::Success,
        ));
        tracing::debug!(expires_at = %session.expires_at, "Admin session created");

        Ok(session)
    }

    /// Look up a live session by exact token.
    pub async fn validate(&self, token: &str) -> Result<Session, AuthError> {
        if token.is_empty() {
            return Err(AuthError::NotAuthenticated);
        }
        self.sessions
            .load(token, self.clock.now())
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?
            .ok_or(AuthError::NotAuthenticated)
    }

    /// End a session. Unknown tokens are ignored.
    pub async fn invalidate(&self, token: &str) -> Result<(), AuthError> {
        self.sessions
            .delete(token)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        self.audit.append(AuditEntry::new(
            self.clock.now(),
            ADMIN_ACTOR,
            AuditEvent::Logout,
            AuditOutcome::Success,
        ));
        Ok(())
    }

    /// Drop every expired session, returning how many were removed.
    pub async fn purge_expired(&self) -> Result<usize, AuthError> {
        let removed = self
            .sessions
            .cleanup_expired(self.clock.now())
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        if removed > 0 {
            tracing::debug!(removed, "Purged expired admin sessions");
        }
        Ok(removed)
    }
}
