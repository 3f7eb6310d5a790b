use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, mpsc};
use tokio::time::sleep;

use super::settings::{AutoRefreshSettings, AutoRefreshUpdate, SettingsStore};
use super::task::BackgroundTask;
use crate::audit::{AuditEntry, AuditEvent, AuditLog, AuditOutcome};
use crate::clock::Clock;
use crate::error::Result;
use crate::refresh::{RefreshError, RefreshOrchestrator};

/// Actor recorded for refreshes the scheduler starts.
pub const SCHEDULER_ACTOR: &str = "scheduler";

/// Settings plus what the loop is doing now.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleView {
    pub settings: AutoRefreshSettings,
    pub running: bool,
    pub current_interval_minutes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_refresh_at: Option<DateTime<Utc>>,
}

/// Triggers refreshes on the configured schedule.
pub struct AutoRefreshScheduler {
    orchestrator: RefreshOrchestrator,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditLog>,
    store: SettingsStore,
    settings: Arc<RwLock<AutoRefreshSettings>>,
    next_refresh_at: Arc<RwLock<Option<DateTime<Utc>>>>,
    task: Mutex<Option<BackgroundTask>>,
}

impl AutoRefreshScheduler {
    pub fn new(
        orchestrator: RefreshOrchestrator,
        clock: Arc<dyn Clock>,
        audit: Arc<dyn AuditLog>,
        store: SettingsStore,
        settings: AutoRefreshSettings,
    ) -> Self {
        Self {
            orchestrator,
            clock,
            audit,
            store,
            settings: Arc::new(RwLock::new(settings)),
            next_refresh_at: Arc::new(RwLock::new(None)),
            task: Mutex::new(None),
        }
    }

    /// Build a scheduler from the stored settings, or the defaults when the
    /// file is missing or unusable.
    pub async fn load(
        orchestrator: RefreshOrchestrator,
        clock: Arc<dyn Clock>,
        audit: Arc<dyn AuditLog>,
        store: SettingsStore,
    ) -> Self {
        let settings = match store.load().await {
            Ok(Some(settings)) => match settings.validate() {
                Ok(()) => settings,
                Err(e) => {
                    tracing::warn!(path = %store.path().display(), error = %e, "Stored auto-refresh settings rejected, using defaults");
                    AutoRefreshSettings::default()
                }
            },
            Ok(None) => AutoRefreshSettings::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not load auto-refresh settings, using defaults");
                AutoRefreshSettings::default()
            }
        };
        Self::new(orchestrator, clock, audit, store, settings)
    }

    pub fn settings(&self) -> AutoRefreshSettings {
        self.settings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub async fn view(&self) -> ScheduleView {
        let settings = self.settings();
        let running = self
            .task
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.is_finished());
        let next_refresh_at = if running {
            *self
                .next_refresh_at
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
        } else {
            None
        };
        ScheduleView {
            current_interval_minutes: settings.next_interval_minutes(self.clock.now()),
            settings,
            running,
            next_refresh_at,
        }
    }

    /// Start the loop if auto-refresh is enabled. Does nothing when it is
    /// already running.
    pub async fn start(&self) {
        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }
        *task = self.spawn_loop();
    }

    /// Apply a partial update, persist it and restart the loop.
    pub async fn update(&self, update: AutoRefreshUpdate, actor: &str) -> Result<ScheduleView> {
        let mut next = self.settings();
        next.apply(update);
        self.replace(next, actor).await
    }

    /// Replace the settings wholesale, persist them and restart the loop.
    pub async fn replace(&self, settings: AutoRefreshSettings, actor: &str) -> Result<ScheduleView> {
        if let Err(e) = settings.validate() {
            self.audit.append(
                AuditEntry::new(self.clock.now(), actor, AuditEvent::ScheduleUpdated, AuditOutcome::Rejected)
                    .with_reason(e.to_string()),
            );
            return Err(e);
        }
        {
            let mut task = self.task.lock().await;
            self.store.save(&settings).await?;
            if let Some(running) = task.take() {
                running.stop().await;
            }
            *self
                .settings
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = settings.clone();
            *task = self.spawn_loop();
        }

        tracing::info!(
            actor,
            enabled = settings.enabled,
            mode = ?settings.mode,
            "Auto-refresh settings updated"
        );
        self.audit.append(AuditEntry::new(
            self.clock.now(),
            actor,
            AuditEvent::ScheduleUpdated,
            AuditOutcome::Success,
        ));
        Ok(self.view().await)
    }

    /// Stop the loop. A refresh already running finishes first.
    pub async fn shutdown(&self) {
        if let Some(task) = self.task.lock().await.take() {
            task.stop().await;
        }
    }

    fn spawn_loop(&self) -> Option<BackgroundTask> {
        if !self.settings().enabled {
            tracing::info!("Auto-refresh disabled");
            return None;
        }

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let orchestrator = self.orchestrator.clone();
        let clock = self.clock.clone();
        let settings = self.settings.clone();
        let next_refresh_at = self.next_refresh_at.clone();

        let handle = tokio::spawn(async move {
            tracing::info!("Auto-refresh scheduler started");
            loop {
                let now = clock.now();
                let wait = settings
                    .read()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .next_interval(now);
                let due = chrono::Duration::from_std(wait)
                    .ok()
                    .and_then(|wait| now.checked_add_signed(wait));
                *next_refresh_at
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = due;
                tracing::debug!(wait_secs = wait.as_secs(), "Next automatic refresh scheduled");

                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = sleep(wait) => {
                        match orchestrator.trigger(SCHEDULER_ACTOR).await {
                            Ok(report) => tracing::info!(
                                version = report.snapshot_version,
                                "Automatic refresh published"
                            ),
                            Err(RefreshError::Rejected(rejection)) => tracing::info!(
                                reason = %rejection,
                                "Automatic refresh skipped"
                            ),
                            Err(e) => tracing::warn!(
                                error = %e,
                                "Automatic refresh failed"
                            ),
                        }
                    }
                }
            }
            tracing::info!("Auto-refresh scheduler stopped");
        });

        Some(BackgroundTask::new("auto_refresh", shutdown_tx, handle))
    }
}
