//! Session storage trait
//!
//! This trait abstracts where admin sessions live so the in-memory store can
//! be swapped for a shared one without touching the authenticator.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// The only role the dashboard knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
}

/// An authenticated admin session.
///
/// Expiry is absolute: it is fixed at creation and never extended by
/// activity. A session is valid iff `now < expires_at`.
#[derive(Clone, Serialize)]
pub struct Session {
    #[serde(skip)]
    token: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: String, created_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token,
            role: Role::Admin,
            created_at,
            expires_at: created_at + ttl,
        }
    }

    /// The bearer token identifying this session.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Session storage trait
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session by token.
    ///
    /// Returns `Ok(None)` if the token is unknown or the session has expired
    /// at `now`. Expired sessions are removed as a side effect.
    async fn load(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Session>>;

    /// Store a session under its token.
    async fn save(&self, session: Session) -> Result<()>;

    /// Delete a session. Deleting an unknown token is not an error.
    async fn delete(&self, token: &str) -> Result<()>;

    /// Remove every session expired at `now`, returning how many were removed.
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<usize>;

    /// Number of stored sessions, expired or not.
    async fn len(&self) -> usize;
}
