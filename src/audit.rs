//! Audit trail for admin activity.
//!
//! Every login attempt, logout and terminal refresh outcome produces one
//! [`AuditEntry`]. Entries go to an [`AuditLog`]; the default setup fans out to
//! structured `tracing` events and a bounded in-memory buffer that backs the
//! admin activity endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Audit entry for an admin action.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// Unique identifier for this audit entry.
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Who performed the action (`admin`, `scheduler`, ...).
    pub actor: String,
    pub event: AuditEvent,
    pub outcome: AuditOutcome,
    /// Failure or rejection reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Audit event types.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    Login,
    Logout,
    Refresh,
    ScheduleUpdated,
}

/// How an audited action ended.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failed,
    Rejected,
}

impl std::fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login => write!(f, "login"),
            Self::Logout => write!(f, "logout"),
            Self::Refresh => write!(f, "refresh"),
            Self::ScheduleUpdated => write!(f, "schedule_updated"),
        }
    }
}

impl std::fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl AuditEntry {
    #[must_use]
    pub fn new(
        timestamp: DateTime<Utc>,
        actor: impl Into<String>,
        event: AuditEvent,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            actor: actor.into(),
            event,
            outcome,
            reason: None,
        }
    }

    /// Set the failure or rejection reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Sink for audit entries.
///
/// `append` must not block for long: it is called from request handlers and
/// from the refresh task while holding no locks.
pub trait AuditLog: Send + Sync {
    fn append(&self, entry: AuditEntry);

    /// Most recent entries, newest first. Sinks that keep nothing return an
    /// empty list.
    fn recent(&self, _limit: usize) -> Vec<AuditEntry> {
        Vec::new()
    }
}

/// Writes each entry as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLog;

impl AuditLog for TracingAuditLog {
    fn append(&self, entry: AuditEntry) {
        match entry.outcome {
            AuditOutcome::Success => tracing::info!(
                target: "audit",
                actor = %entry.actor,
                event = %entry.event,
                outcome = %entry.outcome,
                "Admin action"
            ),
            AuditOutcome::Failed | AuditOutcome::Rejected => tracing::warn!(
                target: "audit",
                actor = %entry.actor,
                event = %entry.event,
                outcome = %entry.outcome,
                reason = entry.reason.as_deref().unwrap_or(""),
                "Admin action"
            ),
        }
    }
}

/// Keeps the last `capacity` entries in memory.
#[derive(Debug, Clone)]
pub struct InMemoryAuditLog {
    entries: Arc<Mutex<VecDeque<AuditEntry>>>,
    capacity: usize,
}

impl InMemoryAuditLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<AuditEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self::new(100)
    }
}

impl AuditLog for InMemoryAuditLog {
    fn append(&self, entry: AuditEntry) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        self.lock().iter().rev().take(limit).cloned().collect()
    }
}

/// Fans entries out to several sinks. `recent` reads from the first sink
/// that keeps any.
#[derive(Clone, Default)]
pub struct CompositeAuditLog {
    sinks: Vec<Arc<dyn AuditLog>>,
}

impl CompositeAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, sink: Arc<dyn AuditLog>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl AuditLog for CompositeAuditLog {
    fn append(&self, entry: AuditEntry) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.append(entry.clone());
            }
            last.append(entry);
        }
    }

    fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        self.sinks
            .iter()
            .map(|sink| sink.recent(limit))
            .find(|entries| !entries.is_empty())
            .unwrap_or_default()
    }
}
