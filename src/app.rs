use std::sync::Arc;

use crate::audit::{AuditLog, CompositeAuditLog, InMemoryAuditLog, TracingAuditLog};
use crate::auth::{AdminAuthenticator, PasswordConfig, PasswordHasher};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::dataset::{DatasetPublisher, DatasetSnapshot, SnapshotStore};
use crate::error::{DashboardError, Result};
use crate::ingest::{
    DatasetValidator, HttpFetcher, IngestionPipeline, SourceFetcher, XlsxParser,
};
use crate::refresh::{RefreshGate, RefreshMode, RefreshOrchestrator};
use crate::schedule::{AutoRefreshScheduler, SettingsStore};
use crate::session::InMemorySessionStore;

/// Shared services handed to every handler.
///
/// Cloning is cheap; every field is a shared handle.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub auth: Arc<AdminAuthenticator>,
    pub publisher: Arc<DatasetPublisher>,
    pub orchestrator: RefreshOrchestrator,
    pub scheduler: Arc<AutoRefreshScheduler>,
    pub audit: Arc<dyn AuditLog>,
    pub clock: Arc<dyn Clock>,
}

impl AppContext {
    /// Builder pattern for constructing AppContext
    pub fn builder(config: Config) -> AppContextBuilder {
        AppContextBuilder::new(config)
    }

    pub fn refresh_mode(&self) -> RefreshMode {
        self.config.refresh.mode
    }
}

/// Builder for AppContext with fluent API
///
/// The fetcher and clock default to `HttpFetcher` and `SystemClock`; tests
/// swap in fakes.
#[must_use = "builder does nothing until you call build()"]
pub struct AppContextBuilder {
    config: Config,
    fetcher: Option<Arc<dyn SourceFetcher>>,
    clock: Option<Arc<dyn Clock>>,
    password: PasswordConfig,
}

impl AppContextBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            fetcher: None,
            clock: None,
            password: PasswordConfig::default(),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn SourceFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Argon2 cost used when hashing a plaintext admin password at startup.
    pub fn with_password_config(mut self, password: PasswordConfig) -> Self {
        self.password = password;
        self
    }

    pub async fn build(self) -> Result<AppContext> {
        let config = self.config;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let activity = Arc::new(InMemoryAuditLog::new(config.admin.activity_log_capacity));
        let audit: Arc<dyn AuditLog> = Arc::new(
            CompositeAuditLog::new()
                .with(Arc::new(TracingAuditLog))
                .with(activity),
        );

        let hasher = PasswordHasher::new(self.password);
        let credential = config.admin.credential(&hasher)?;
        let auth = Arc::new(AdminAuthenticator::new(
            credential,
            Arc::new(InMemorySessionStore::new()),
            clock.clone(),
            audit.clone(),
            config.admin.session_ttl(),
        ));

        let publisher = if config.snapshot.persist {
            let store = SnapshotStore::new(config.snapshot.path.clone());
            DatasetPublisher::load(store, clock.clone()).await
        } else {
            DatasetPublisher::new(DatasetSnapshot::empty(clock.now()), clock.clone())
        };
        let publisher = Arc::new(publisher);

        let fetcher: Arc<dyn SourceFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(
                HttpFetcher::new(&config.source)
                    .map_err(|e| DashboardError::internal(e.to_string()))?,
            ),
        };
        let pipeline = Arc::new(IngestionPipeline::new(
            config.source.clone(),
            fetcher,
            Arc::new(XlsxParser::new(config.validation.sectors.clone())),
            DatasetValidator::new(config.validation.clone()),
            clock.clone(),
        ));

        let orchestrator = RefreshOrchestrator::new(
            RefreshGate::new(config.refresh.cooldown(), clock.clone()),
            pipeline,
            publisher.clone(),
            audit.clone(),
            clock.clone(),
        );

        let scheduler = Arc::new(
            AutoRefreshScheduler::load(
                orchestrator.clone(),
                clock.clone(),
                audit.clone(),
                SettingsStore::new(config.schedule.settings_path.clone()),
            )
            .await,
        );

        Ok(AppContext {
            config: Arc::new(config),
            auth,
            publisher,
            orchestrator,
            scheduler,
            audit,
            clock,
        })
    }
}
