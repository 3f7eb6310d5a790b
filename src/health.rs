use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::app::AppContext;
use crate::dataset::DatasetPublisher;
use crate::refresh::{LastOutcome, RefreshOrchestrator};

/// Health check status
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health check result for a single component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Overall health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: Vec<ComponentHealth>,
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        let status_code = match self.status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        };

        (status_code, Json(self)).into_response()
    }
}

/// Trait for implementing health checks
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;
    fn check(&self) -> ComponentHealth;
}

/// Degraded until a snapshot with data is being served.
pub struct SnapshotHealthCheck {
    publisher: Arc<DatasetPublisher>,
}

impl SnapshotHealthCheck {
    pub fn new(publisher: Arc<DatasetPublisher>) -> Self {
        Self { publisher }
    }
}

impl HealthCheck for SnapshotHealthCheck {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn check(&self) -> ComponentHealth {
        let snapshot = self.publisher.current();
        let (status, message) = if snapshot.has_data() {
            (HealthStatus::Healthy, format!("Serving version {}", snapshot.version))
        } else {
            (HealthStatus::Degraded, "No data published yet".to_string())
        };
        ComponentHealth {
            name: self.name().to_string(),
            status,
            message: Some(message),
        }
    }
}

/// Degraded while the most recent refresh run failed.
pub struct RefreshHealthCheck {
    orchestrator: RefreshOrchestrator,
}

impl RefreshHealthCheck {
    pub fn new(orchestrator: RefreshOrchestrator) -> Self {
        Self { orchestrator }
    }
}

impl HealthCheck for RefreshHealthCheck {
    fn name(&self) -> &str {
        "refresh"
    }

    fn check(&self) -> ComponentHealth {
        let state = self.orchestrator.gate().status().state;
        let (status, message) = match state.last_outcome {
            Some(LastOutcome::Failed) => (
                HealthStatus::Degraded,
                state.last_failure_reason.or_else(|| Some("Last refresh failed".to_string())),
            ),
            _ if state.in_flight => (HealthStatus::Healthy, Some("Refresh in progress".to_string())),
            _ => (HealthStatus::Healthy, None),
        };
        ComponentHealth {
            name: self.name().to_string(),
            status,
            message,
        }
    }
}

/// Health check manager that runs all registered checks
#[derive(Default)]
pub struct HealthChecker {
    checks: Vec<Arc<dyn HealthCheck>>,
}

impl HealthChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// The checks the service registers for its own components.
    pub fn for_context(ctx: &AppContext) -> Self {
        Self::new()
            .with_check(Arc::new(SnapshotHealthCheck::new(ctx.publisher.clone())))
            .with_check(Arc::new(RefreshHealthCheck::new(ctx.orchestrator.clone())))
    }

    pub fn check_health(&self) -> HealthResponse {
        let mut checks = Vec::new();
        let mut overall_status = HealthStatus::Healthy;

        for check in &self.checks {
            let result = check.check();

            match result.status {
                HealthStatus::Unhealthy => overall_status = HealthStatus::Unhealthy,
                HealthStatus::Degraded if overall_status == HealthStatus::Healthy => {
                    overall_status = HealthStatus::Degraded
                }
                _ => {}
            }

            checks.push(result);
        }

        HealthResponse {
            status: overall_status,
            checks,
        }
    }
}

/// Handler for the health endpoint
pub async fn health_handler(State(ctx): State<AppContext>) -> HealthResponse {
    HealthChecker::for_context(&ctx).check_health()
}
