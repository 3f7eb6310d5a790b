use anyhow::Context;
use outreach_dashboard::{App, AppContext, ConfigBuilder};

/// Config file read before the environment; missing is fine.
const DEFAULT_CONFIG_PATH: &str = "config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var("DASHBOARD_CONFIG")
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let config = ConfigBuilder::new()
        .from_optional_file(&config_path)?
        .from_env()
        .build()
        .context("invalid configuration")?;

    outreach_dashboard::init_tracing_with_config(&config);
    tracing::info!(config = %config_path, "Configuration loaded");

    let context = AppContext::builder(config)
        .build()
        .await
        .context("failed to start dashboard services")?;

    App::new(context).serve().await
}
