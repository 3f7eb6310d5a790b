use super::store::{Session, SessionStore};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory session store implementation
///
/// Sessions are lost on restart, which for a single-admin dashboard only
/// means logging in again.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;

        match sessions.get(token) {
            Some(session) if session.is_valid_at(now) => Ok(Some(session.clone())),
            Some(_) => {
                drop(sessions);
                let mut sessions = self.sessions.write().await;
                // Re-check under the write lock; a fresh session may have replaced it.
                if sessions.get(token).is_some_and(|s| !s.is_valid_at(now)) {
                    sessions.remove(token);
                }
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn save(&self, session: Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.token().to_string(), session);
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(token);
        Ok(())
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut sessions = self.sessions.write().await;
        let initial_len = sessions.len();
        sessions.retain(|_, session| session.is_valid_at(now));
        Ok(initial_len - sessions.len())
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
