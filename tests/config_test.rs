//! Configuration layering and the startup paths it drives.

mod common;

use std::io::Write;
use std::sync::Arc;

use outreach_dashboard::auth::{PasswordConfig, PasswordHasher};
use outreach_dashboard::refresh::RefreshMode;
use outreach_dashboard::testing::{self, StaticFetcher};
use outreach_dashboard::{App, AppContext, ConfigBuilder};
use serde_json::json;

#[test]
fn test_file_then_env_layering() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "admin": {{"password": "USE_ENVIRONMENT_VARIABLE"}},
            "source": {{"download_url": "https://1drv.ms/x/s!file"}},
            "refresh": {{"cooldown_seconds": 30, "mode": "background"}},
            "schedule": {{"settings_path": "/var/lib/dashboard/auto_refresh_config.json"}}
        }}"#
    )
    .unwrap();

    // The placeholder in the file does not count as a credential.
    assert!(
        ConfigBuilder::new()
            .from_file(file.path())
            .unwrap()
            .build()
            .is_err()
    );

    unsafe {
        std::env::set_var("DASHBOARD_ADMIN_PASSWORD", "from-env");
        std::env::set_var("DASHBOARD_REFRESH_COOLDOWN_SECONDS", "15");
    }
    let config = ConfigBuilder::new()
        .from_file(file.path())
        .unwrap()
        .from_env()
        .build();
    unsafe {
        std::env::remove_var("DASHBOARD_ADMIN_PASSWORD");
        std::env::remove_var("DASHBOARD_REFRESH_COOLDOWN_SECONDS");
    }
    let config = config.unwrap();

    assert_eq!(config.refresh.cooldown_seconds, 15);
    assert_eq!(config.refresh.mode, RefreshMode::Background);
    assert_eq!(
        config.schedule.settings_path.to_str(),
        Some("/var/lib/dashboard/auto_refresh_config.json")
    );
}

#[tokio::test]
async fn test_precomputed_hash_credential() {
    let dir = tempfile::tempdir().unwrap();
    let hash = PasswordHasher::new(PasswordConfig::fast())
        .hash("hashed secret")
        .unwrap();

    let mut config = ConfigBuilder::new()
        .with_admin_password_hash(hash)
        .with_source_url("https://example.com/outreach.xlsx")
        .build()
        .unwrap();
    config.snapshot.path = dir.path().join("dashboard_data.json");
    config.schedule.settings_path = dir.path().join("auto_refresh_config.json");

    let context = AppContext::builder(config)
        .with_fetcher(Arc::new(StaticFetcher::new(common::outreach_workbook())))
        .build()
        .await
        .unwrap();
    let app = App::new(context);

    testing::post(app.router(), "/admin/login")
        .json_body(&json!({"password": "hashed secret"}))
        .execute()
        .await
        .assert_ok();

    testing::post(app.router(), "/admin/login")
        .json_body(&json!({"password": "correct horse battery staple"}))
        .execute()
        .await
        .assert_unauthorized();
}

#[tokio::test]
async fn test_snapshot_persistence_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = common::config(&dir, RefreshMode::Blocking);
    config.snapshot.persist = false;
    let path = config.snapshot.path.clone();

    let t = common::test_app_with_config(
        Arc::new(StaticFetcher::new(common::outreach_workbook())),
        config,
        dir,
    )
    .await;
    t.context().orchestrator.trigger("admin").await.unwrap();

    assert_eq!(t.context().publisher.current().version, 1);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_unreadable_snapshot_file_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(&dir, RefreshMode::Blocking);
    std::fs::write(&config.snapshot.path, b"{\"last_updated\": \"2024-01-01 10:00:00\"").unwrap();

    let t = common::test_app_with_config(
        Arc::new(StaticFetcher::new(common::outreach_workbook())),
        config,
        dir,
    )
    .await;

    assert_eq!(t.context().publisher.current().version, 0);
}
