use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

use super::error::{RefreshError, RefreshRejection};
use super::gate::{GateStatus, RefreshGate, RefreshPermit};
use crate::audit::{AuditEntry, AuditEvent, AuditLog, AuditOutcome};
use crate::clock::Clock;
use crate::dataset::{DatasetPublisher, DatasetSnapshot};
use crate::ingest::{IngestError, IngestionPipeline};

/// Where the most recent refresh run is.
///
/// ```text
/// Idle -> Running -> Failed
///                 -> Publishing -> Done
/// ```
///
/// Acquiring the gate is a single step under the gate's mutex, so it has no
/// phase of its own. A rejected request leaves the phase of the last run in
/// place; the rejection is reported to the caller and audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPhase {
    Idle,
    Running,
    Publishing,
    Done,
    Failed,
}

/// How a finished refresh run went.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub actor: String,
    pub phase: RefreshPhase,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_phc_centers: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Returned when a background refresh has been started.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshTicket {
    pub actor: String,
    pub accepted_at: DateTime<Utc>,
}

/// Gate state, the current phase and the last run, for the admin status view.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshStatus {
    pub phase: RefreshPhase,
    #[serde(flatten)]
    pub gate: GateStatus,
    pub snapshot_version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_report: Option<RefreshReport>,
}

#[derive(Debug)]
struct Progress {
    phase: RefreshPhase,
    last_report: Option<RefreshReport>,
}

/// Runs refresh attempts: gate, pipeline, publish, audit.
///
/// Cloning is cheap and clones share the same gate and progress.
#[derive(Clone)]
pub struct RefreshOrchestrator {
    gate: RefreshGate,
    pipeline: Arc<IngestionPipeline>,
    publisher: Arc<DatasetPublisher>,
    audit: Arc<dyn AuditLog>,
    clock: Arc<dyn Clock>,
    progress: Arc<Mutex<Progress>>,
}

impl RefreshOrchestrator {
    pub fn new(
        gate: RefreshGate,
        pipeline: Arc<IngestionPipeline>,
        publisher: Arc<DatasetPublisher>,
        audit: Arc<dyn AuditLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gate,
            pipeline,
            publisher,
            audit,
            clock,
            progress: Arc::new(Mutex::new(Progress {
                phase: RefreshPhase::Idle,
                last_report: None,
            })),
        }
    }

    /// Run a refresh and wait for it.
    ///
    /// Returns the report of a published refresh, or why nothing was
    /// published. Either way the previous snapshot keeps serving until a new
    /// one is published. The run happens on its own task: dropping the
    /// returned future (a client disconnecting) does not abandon it.
    pub async fn trigger(&self, actor: &str) -> Result<RefreshReport, RefreshError> {
        let permit = self.acquire(actor)?;
        match self.spawn_run(permit, actor).await {
            Ok(result) => Ok(result?),
            Err(e) => Err(RefreshError::Interrupted(e.to_string())),
        }
    }

    /// Start a refresh in the background.
    ///
    /// The gate is consulted before returning, so rejections still reach the
    /// caller; the pipeline then runs in a spawned task that owns the permit.
    pub fn trigger_background(&self, actor: &str) -> Result<RefreshTicket, RefreshRejection> {
        let permit = self.acquire(actor)?;
        let ticket = RefreshTicket {
            actor: actor.to_string(),
            accepted_at: self.clock.now(),
        };
        // Outcome is audited and logged by the run itself.
        drop(self.spawn_run(permit, actor));
        Ok(ticket)
    }

    pub fn status(&self) -> RefreshStatus {
        let progress = self.progress();
        RefreshStatus {
            phase: progress.phase,
            gate: self.gate.status(),
            snapshot_version: self.publisher.current().version,
            last_report: progress.last_report.clone(),
        }
    }

    pub fn gate(&self) -> &RefreshGate {
        &self.gate
    }

    fn acquire(&self, actor: &str) -> Result<RefreshPermit, RefreshRejection> {
        match self.gate.try_acquire() {
            Ok(permit) => {
                self.set_phase(RefreshPhase::Running);
                tracing::info!(actor, "Refresh started");
                Ok(permit)
            }
            Err(rejection) => {
                tracing::info!(actor, reason = %rejection, "Refresh rejected");
                self.audit.append(
                    AuditEntry::new(self.clock.now(), actor, AuditEvent::Refresh, AuditOutcome::Rejected)
                        .with_reason(rejection.to_string()),
                );
                Err(rejection)
            }
        }
    }

    fn spawn_run(
        &self,
        permit: RefreshPermit,
        actor: &str,
    ) -> JoinHandle<Result<RefreshReport, IngestError>> {
        let run = RunGuard {
            orchestrator: self.clone(),
            permit: Some(permit),
            actor: actor.to_string(),
            started_at: self.clock.now(),
        };
        let this = self.clone();
        tokio::spawn(async move { this.run(run).await })
    }

    async fn run(&self, run: RunGuard) -> Result<RefreshReport, IngestError> {
        match self.pipeline.run().await {
            Ok(dataset) => {
                self.set_phase(RefreshPhase::Publishing);
                let snapshot = self.publisher.publish(dataset).await;
                Ok(run.succeed(&snapshot))
            }
            Err(e) => {
                tracing::warn!(actor = %run.actor, stage = e.stage(), error = %e, "Refresh failed");
                run.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// Record the terminal phase and audit entry, then open the gate.
    ///
    /// The gate is released last so a new attempt can never be granted
    /// before this run's bookkeeping is visible.
    fn conclude(&self, report: RefreshReport, permit: RefreshPermit) {
        self.finish(report.clone());

        let entry = AuditEntry::new(
            report.finished_at,
            &report.actor,
            AuditEvent::Refresh,
            if report.error.is_some() {
                AuditOutcome::Failed
            } else {
                AuditOutcome::Success
            },
        );
        match report.error {
            Some(reason) => {
                self.audit.append(entry.with_reason(reason.clone()));
                self.gate.release_failed(permit, reason);
            }
            None => {
                self.audit.append(entry);
                self.gate.release(permit, true);
            }
        }
    }

    fn set_phase(&self, phase: RefreshPhase) {
        self.progress().phase = phase;
    }

    fn finish(&self, report: RefreshReport) {
        let mut progress = self.progress();
        progress.phase = report.phase;
        progress.last_report = Some(report);
    }

    fn progress(&self) -> MutexGuard<'_, Progress> {
        self.progress
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// One granted run and its permit.
///
/// A run that ends without reaching [`succeed`](Self::succeed) or
/// [`fail`](Self::fail), because its task panicked or was aborted, is
/// concluded as failed when the guard drops.
struct RunGuard {
    orchestrator: RefreshOrchestrator,
    permit: Option<RefreshPermit>,
    actor: String,
    started_at: DateTime<Utc>,
}

impl RunGuard {
    fn succeed(mut self, snapshot: &DatasetSnapshot) -> RefreshReport {
        let report = self.report(RefreshPhase::Done, None);
        let report = RefreshReport {
            snapshot_version: Some(snapshot.version),
            total_phc_centers: Some(snapshot.dataset.overview.total_phc_centers),
            ..report
        };
        self.conclude(report.clone());
        report
    }

    fn fail(mut self, reason: String) {
        let report = self.report(RefreshPhase::Failed, Some(reason));
        self.conclude(report);
    }

    fn report(&self, phase: RefreshPhase, error: Option<String>) -> RefreshReport {
        RefreshReport {
            actor: self.actor.clone(),
            phase,
            started_at: self.started_at,
            finished_at: self.orchestrator.clock.now(),
            snapshot_version: None,
            total_phc_centers: None,
            error,
        }
    }

    fn conclude(&mut self, report: RefreshReport) {
        if let Some(permit) = self.permit.take() {
            self.orchestrator.conclude(report, permit);
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.permit.is_some() {
            tracing::error!(actor = %self.actor, "Refresh run ended unexpectedly");
            let report = self.report(
                RefreshPhase::Failed,
                Some("refresh ended unexpectedly".to_string()),
            );
            self.conclude(report);
        }
    }
}
