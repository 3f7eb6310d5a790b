//! Shared setup for the integration tests.
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use rust_xlsxwriter::Workbook;
use std::sync::Arc;
use tempfile::TempDir;

use outreach_dashboard::auth::PasswordConfig;
use outreach_dashboard::clock::{Clock, ManualClock};
use outreach_dashboard::ingest::{REQUIRED_COLUMNS, SourceFetcher};
use outreach_dashboard::refresh::RefreshMode;
use outreach_dashboard::testing;
use outreach_dashboard::{App, AppContext, Config, ConfigBuilder};

pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

pub const SECTORS: [&str; 4] = [
    "western_sector",
    "eastern_sector",
    "northern_sector",
    "southern_sector",
];

/// One outreach row: centre file, response, scheduled, arrived, enrollment.
pub type Row<'a> = [&'a str; 5];

/// Build an xlsx workbook with the given sheets. Blank strings stay empty.
pub fn workbook(sheets: &[(&str, Vec<Row<'_>>)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name).unwrap();
        for (col, title) in REQUIRED_COLUMNS.iter().enumerate() {
            sheet.write_string(0, col as u16, *title).unwrap();
        }
        for (r, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    sheet.write_string(r as u32 + 1, col as u16, *value).unwrap();
                }
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

/// A valid source: every sector has two centres.
pub fn outreach_workbook() -> Vec<u8> {
    let sheets: Vec<(&str, Vec<Row<'_>>)> = SECTORS
        .iter()
        .map(|sector| {
            (
                *sector,
                vec![
                    ["PHC Alpha.xlsx", "Accepted", "In-Person", "Yes", "Yes"],
                    ["PHC Alpha.xlsx", "Accepted", "Virtual", "", ""],
                    ["PHC Alpha.xlsx", "No response", "", "", ""],
                    ["PHC Beta.xlsx", "Refused", "", "", ""],
                ],
            )
        })
        .collect();
    workbook(&sheets)
}

/// A workbook missing the southern sector.
pub fn incomplete_workbook() -> Vec<u8> {
    let sheets: Vec<(&str, Vec<Row<'_>>)> = SECTORS[..3]
        .iter()
        .map(|sector| (*sector, vec![["PHC Alpha.xlsx", "Accepted", "", "", ""]]))
        .collect();
    workbook(&sheets)
}

pub fn start_time() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_718_000_000, 0).unwrap()
}

/// A running dashboard wired to fakes and a manual clock.
pub struct TestApp {
    pub app: App,
    pub clock: ManualClock,
    pub dir: TempDir,
}

impl TestApp {
    pub fn context(&self) -> &AppContext {
        self.app.context()
    }

    /// Log in over HTTP and return the bearer token.
    pub async fn login(&self) -> String {
        let body: serde_json::Value = testing::post(self.app.router(), "/admin/login")
            .json_body(&serde_json::json!({ "password": ADMIN_PASSWORD }))
            .execute()
            .await
            .assert_ok()
            .json();
        body["data"]["token"].as_str().unwrap().to_string()
    }
}

pub fn config(dir: &TempDir, mode: RefreshMode) -> Config {
    let mut config = ConfigBuilder::new()
        .with_admin_password(ADMIN_PASSWORD)
        .with_source_url("https://example.com/outreach.xlsx")
        .with_refresh_mode(mode)
        .build()
        .unwrap();
    config.snapshot.path = dir.path().join("dashboard_data.json");
    config.schedule.settings_path = dir.path().join("auto_refresh_config.json");
    config
}

pub async fn test_app(fetcher: Arc<dyn SourceFetcher>, mode: RefreshMode) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    test_app_with_config(fetcher, config(&dir, mode), dir).await
}

pub async fn test_app_with_config(
    fetcher: Arc<dyn SourceFetcher>,
    config: Config,
    dir: TempDir,
) -> TestApp {
    let clock = ManualClock::new(start_time());
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let context = AppContext::builder(config)
        .with_fetcher(fetcher)
        .with_clock(shared)
        .with_password_config(PasswordConfig::fast())
        .build()
        .await
        .unwrap();
    TestApp {
        app: App::new(context),
        clock,
        dir,
    }
}

/// Every sector sheet present but holding only the header row.
pub fn empty_sectors_workbook() -> Vec<u8> {
    let sheets: Vec<(&str, Vec<Row<'_>>)> = SECTORS.iter().map(|sector| (*sector, vec![])).collect();
    workbook(&sheets)
}
