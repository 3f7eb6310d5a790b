use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

use super::error::RefreshRejection;
use crate::clock::Clock;

/// How the last finished attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LastOutcome {
    Succeeded,
    Failed,
}

/// Bookkeeping for refresh attempts. One per process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshState {
    pub in_flight: bool,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure_reason: Option<String>,
    pub last_outcome: Option<LastOutcome>,
}

/// A copy of the gate state plus the cooldown left at the time of the call.
#[derive(Debug, Clone, Serialize)]
pub struct GateStatus {
    #[serde(flatten)]
    pub state: RefreshState,
    pub cooldown_remaining_secs: u64,
}

/// Single-flight plus cooldown.
///
/// The in-flight check, the cooldown check and taking the slot all happen
/// under one mutex, so two concurrent callers can never both be granted.
/// Only granted attempts move the cooldown clock; rejected requests leave
/// the state untouched.
#[derive(Clone)]
pub struct RefreshGate {
    state: Arc<Mutex<RefreshState>>,
    cooldown: Duration,
    clock: Arc<dyn Clock>,
}

impl RefreshGate {
    pub fn new(cooldown: std::time::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RefreshState::default())),
            cooldown: Duration::from_std(cooldown).unwrap_or_else(|_| Duration::days(365)),
            clock,
        }
    }

    pub fn try_acquire(&self) -> Result<RefreshPermit, RefreshRejection> {
        let now = self.clock.now();
        let mut state = lock(&self.state);

        if state.in_flight {
            return Err(RefreshRejection::AlreadyInFlight);
        }
        let remaining_secs = self.cooldown_remaining(&state, now);
        if remaining_secs > 0 {
            return Err(RefreshRejection::Cooldown { remaining_secs });
        }

        state.in_flight = true;
        state.last_attempt = Some(now);

        Ok(RefreshPermit {
            state: self.state.clone(),
            clock: self.clock.clone(),
            released: false,
        })
    }

    /// Finish an attempt. `succeeded` also stamps the last success time.
    pub fn release(&self, permit: RefreshPermit, succeeded: bool) {
        if succeeded {
            permit.finish(None);
        } else {
            permit.finish(Some("refresh failed".to_string()));
        }
    }

    /// Finish a failed attempt, keeping the reason for the status endpoint.
    pub fn release_failed(&self, permit: RefreshPermit, reason: impl Into<String>) {
        permit.finish(Some(reason.into()));
    }

    pub fn status(&self) -> GateStatus {
        let now = self.clock.now();
        let state = lock(&self.state);
        GateStatus {
            cooldown_remaining_secs: self.cooldown_remaining(&state, now),
            state: state.clone(),
        }
    }

    /// Whole seconds until the cooldown ends, rounded up; 0 when it has.
    fn cooldown_remaining(&self, state: &RefreshState, now: DateTime<Utc>) -> u64 {
        let Some(last_attempt) = state.last_attempt else {
            return 0;
        };
        let remaining = (self.cooldown - (now - last_attempt)).min(self.cooldown);
        if remaining <= Duration::zero() {
            return 0;
        }
        let millis = remaining.num_milliseconds().max(1);
        ((millis + 999) / 1000) as u64
    }
}

/// The right to run one refresh.
///
/// Consumed by [`RefreshGate::release`]. If it is dropped unreleased (the task
/// panicked or was cancelled) the attempt is recorded as failed, so the gate
/// can never stay stuck in flight.
#[must_use = "dropping a permit ends the refresh attempt as failed"]
pub struct RefreshPermit {
    state: Arc<Mutex<RefreshState>>,
    clock: Arc<dyn Clock>,
    released: bool,
}

impl RefreshPermit {
    fn finish(mut self, failure: Option<String>) {
        self.record(failure);
    }

    fn record(&mut self, failure: Option<String>) {
        if self.released {
            return;
        }
        self.released = true;

        let now = self.clock.now();
        let mut state = lock(&self.state);
        state.in_flight = false;
        match failure {
            None => {
                state.last_success = Some(now);
                state.last_outcome = Some(LastOutcome::Succeeded);
            }
            Some(reason) => {
                state.last_failure_reason = Some(reason);
                state.last_outcome = Some(LastOutcome::Failed);
            }
        }
    }
}

impl Drop for RefreshPermit {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!("Refresh permit dropped without release");
            self.record(Some("refresh ended unexpectedly".to_string()));
        }
    }
}

impl std::fmt::Debug for RefreshPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshPermit")
            .field("released", &self.released)
            .finish()
    }
}

fn lock(state: &Mutex<RefreshState>) -> MutexGuard<'_, RefreshState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
