//! Outreach Dashboard - live outreach metrics with an admin-triggered refresh
//!
//! The service serves one immutable dataset snapshot to any number of
//! polling clients and replaces it only when a refresh has downloaded,
//! parsed and validated a new source workbook end to end.
//!
//! # Components
//!
//! - **Sessions**: password login issuing opaque bearer tokens with an absolute expiry
//! - **Refresh gate**: at most one refresh in flight, plus a cooldown between attempts
//! - **Ingestion**: download, parse (calamine) and validate the source workbook
//! - **Publisher**: atomic snapshot swap, persisted to disk
//! - **Scheduler**: automatic refreshes on a simple or work-week schedule
//! - **Testing**: Alba-style HTTP testing and fake source fetchers
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use outreach_dashboard::{App, AppContext, ConfigBuilder};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigBuilder::new()
//!         .from_optional_file("config.json")?
//!         .from_env()
//!         .build()?;
//!     outreach_dashboard::init_tracing_with_config(&config);
//!
//!     let context = AppContext::builder(config).build().await?;
//!     App::new(context).serve().await
//! }
//! ```

mod app;
pub mod audit;
pub mod auth;
pub mod clock;
mod config;
mod core;
pub mod cors;
pub mod dataset;
mod error;
pub mod health;
pub mod http;
pub mod ingest;
mod middleware;
pub mod refresh;
pub mod schedule;
pub mod session;
pub mod testing;
pub mod utils;

// Re-exports for public API
pub use app::{AppContext, AppContextBuilder};
pub use config::{Config, ConfigBuilder, LoggingConfig, ServerConfig};
pub use core::App;
pub use cors::CorsConfig;
pub use error::{DashboardError, ErrorResponse, Result};
pub use health::{ComponentHealth, HealthCheck, HealthChecker, HealthStatus};
pub use http::{ApiResponse, RouteModule};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing from the `logging` section of a [`Config`]
///
/// Call it early in `main`, before building the context. `RUST_LOG`, when
/// set, still wins over `logging.level`.
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
