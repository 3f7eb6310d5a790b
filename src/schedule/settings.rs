use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{DashboardError, Result};
use crate::utils::write_atomic;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    /// Always wait `simple_interval_minutes`.
    Simple,
    /// Pick the interval from the work-week schedule.
    #[default]
    Advanced,
}

/// Auto-refresh settings, as stored in `auto_refresh_config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredSettings")]
pub struct AutoRefreshSettings {
    pub enabled: bool,
    pub mode: ScheduleMode,
    pub simple_interval_minutes: u64,
    pub advanced_schedule: AdvancedSchedule,
}

/// Any layout the settings file has had. Files written before the advanced
/// schedule existed carry only `interval_minutes` and always load in simple
/// mode, as does a file with `simple_interval_minutes` but no `mode`.
#[derive(Deserialize)]
struct StoredSettings {
    #[serde(default = "default_enabled")]
    enabled: bool,

    #[serde(default)]
    mode: Option<ScheduleMode>,

    #[serde(default)]
    simple_interval_minutes: Option<u64>,

    #[serde(default)]
    interval_minutes: Option<u64>,

    #[serde(default)]
    advanced_schedule: AdvancedSchedule,
}

impl From<StoredSettings> for AutoRefreshSettings {
    fn from(stored: StoredSettings) -> Self {
        let (mode, simple_interval_minutes) = match stored.simple_interval_minutes {
            Some(minutes) => (stored.mode.unwrap_or(ScheduleMode::Simple), minutes),
            None => (
                ScheduleMode::Simple,
                stored.interval_minutes.unwrap_or_else(default_simple_interval),
            ),
        };
        Self {
            enabled: stored.enabled,
            mode,
            simple_interval_minutes,
            advanced_schedule: stored.advanced_schedule,
        }
    }
}

/// Days are numbered 0 = Sunday through 6 = Saturday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedSchedule {
    #[serde(default)]
    pub work_days: WorkDays,

    #[serde(default)]
    pub weekend_days: WeekendDays,

    /// Display name of the zone the schedule is written in.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Offset of that zone from UTC, used for all day and hour checks.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkDays {
    #[serde(default = "default_work_days")]
    pub days: Vec<u8>,

    #[serde(default)]
    pub work_hours: WorkHours,

    #[serde(default)]
    pub after_hours: AfterHours,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkHours {
    #[serde(default = "default_work_start", with = "hh_mm")]
    pub start: NaiveTime,

    #[serde(default = "default_work_end", with = "hh_mm")]
    pub end: NaiveTime,

    #[serde(default = "default_work_interval")]
    pub interval_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AfterHours {
    #[serde(default = "default_after_hours_interval")]
    pub interval_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekendDays {
    #[serde(default = "default_weekend_days")]
    pub days: Vec<u8>,

    #[serde(default = "default_weekend_interval")]
    pub interval_minutes: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_simple_interval() -> u64 {
    120
}

fn default_timezone() -> String {
    "Asia/Riyadh".to_string()
}

fn default_utc_offset_minutes() -> i32 {
    180
}

fn default_work_days() -> Vec<u8> {
    vec![0, 1, 2, 3, 4]
}

fn default_weekend_days() -> Vec<u8> {
    vec![5, 6]
}

fn default_work_start() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default()
}

fn default_work_end() -> NaiveTime {
    NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default()
}

fn default_work_interval() -> u64 {
    10
}

fn default_after_hours_interval() -> u64 {
    180
}

fn default_weekend_interval() -> u64 {
    240
}

impl Default for AutoRefreshSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            mode: ScheduleMode::default(),
            simple_interval_minutes: default_simple_interval(),
            advanced_schedule: AdvancedSchedule::default(),
        }
    }
}

impl Default for AdvancedSchedule {
    fn default() -> Self {
        Self {
            work_days: WorkDays::default(),
            weekend_days: WeekendDays::default(),
            timezone: default_timezone(),
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}

impl Default for WorkDays {
    fn default() -> Self {
        Self {
            days: default_work_days(),
            work_hours: WorkHours::default(),
            after_hours: AfterHours::default(),
        }
    }
}

impl Default for WorkHours {
    fn default() -> Self {
        Self {
            start: default_work_start(),
            end: default_work_end(),
            interval_minutes: default_work_interval(),
        }
    }
}

impl Default for AfterHours {
    fn default() -> Self {
        Self {
            interval_minutes: default_after_hours_interval(),
        }
    }
}

impl Default for WeekendDays {
    fn default() -> Self {
        Self {
            days: default_weekend_days(),
            interval_minutes: default_weekend_interval(),
        }
    }
}

impl AutoRefreshSettings {
    /// How long to wait before the next automatic refresh, as of `now`.
    ///
    /// Advanced mode reads the weekday and time of day in the schedule's
    /// zone. Weekend days win over work days; work hours include both ends;
    /// a day in neither list falls back to the simple interval.
    pub fn next_interval(&self, now: DateTime<Utc>) -> Duration {
        minutes(self.next_interval_minutes(now))
    }

    pub fn next_interval_minutes(&self, now: DateTime<Utc>) -> u64 {
        if self.mode == ScheduleMode::Simple {
            return self.simple_interval_minutes;
        }

        let schedule = &self.advanced_schedule;
        let local = match FixedOffset::east_opt(schedule.utc_offset_minutes * 60) {
            Some(offset) => now.with_timezone(&offset).naive_local(),
            None => now.naive_utc(),
        };
        let weekday = local.weekday().num_days_from_sunday() as u8;

        if schedule.weekend_days.days.contains(&weekday) {
            return schedule.weekend_days.interval_minutes;
        }
        if schedule.work_days.days.contains(&weekday) {
            let hours = &schedule.work_days.work_hours;
            let time = local.time();
            if hours.start <= time && time <= hours.end {
                return hours.interval_minutes;
            }
            return schedule.work_days.after_hours.interval_minutes;
        }
        self.simple_interval_minutes
    }

    /// Reject settings the scheduler cannot run: zero intervals, day numbers
    /// outside 0..=6, or an offset beyond ±14 hours.
    pub fn validate(&self) -> Result<()> {
        let schedule = &self.advanced_schedule;
        let intervals = [
            ("simple_interval_minutes", self.simple_interval_minutes),
            ("work_hours.interval_minutes", schedule.work_days.work_hours.interval_minutes),
            ("after_hours.interval_minutes", schedule.work_days.after_hours.interval_minutes),
            ("weekend_days.interval_minutes", schedule.weekend_days.interval_minutes),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(DashboardError::bad_request(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        let days = schedule.work_days.days.iter().chain(&schedule.weekend_days.days);
        if let Some(day) = days.into_iter().find(|day| **day > 6) {
            return Err(DashboardError::bad_request(format!(
                "Day {} is out of range; use 0 (Sunday) to 6 (Saturday)",
                day
            )));
        }

        if schedule.utc_offset_minutes.abs() > 14 * 60 {
            return Err(DashboardError::bad_request(format!(
                "utc_offset_minutes {} is out of range",
                schedule.utc_offset_minutes
            )));
        }
        Ok(())
    }

    /// Apply a partial update. The advanced schedule is only replaced when
    /// one is supplied.
    pub fn apply(&mut self, update: AutoRefreshUpdate) {
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(mode) = update.mode {
            self.mode = mode;
        }
        if let Some(interval) = update.simple_interval_minutes {
            self.simple_interval_minutes = interval;
        }
        if let Some(schedule) = update.advanced_schedule {
            self.advanced_schedule = schedule;
        }
    }
}

/// Body of `POST /admin/auto-refresh-settings`. Missing fields keep their
/// current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutoRefreshUpdate {
    pub enabled: Option<bool>,
    pub mode: Option<ScheduleMode>,
    pub simple_interval_minutes: Option<u64>,
    pub advanced_schedule: Option<AdvancedSchedule>,
}

fn minutes(value: u64) -> Duration {
    Duration::from_secs(value.saturating_mul(60))
}

/// Reads and writes the settings file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load stored settings. A missing file yields `None`.
    pub async fn load(&self) -> Result<Option<AutoRefreshSettings>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let settings = serde_json::from_slice(&raw).map_err(|e| {
            DashboardError::internal(format!(
                "Stored auto-refresh settings {} are unreadable: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(Some(settings))
    }

    pub async fn save(&self, settings: &AutoRefreshSettings) -> Result<()> {
        let json = serde_json::to_vec_pretty(settings)
            .map_err(|e| DashboardError::internal(format!("Settings serialization failed: {}", e)))?;
        write_atomic(&self.path, &json).await?;
        Ok(())
    }
}

/// `HH:MM` times, as written in the settings file.
mod hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|_| D::Error::custom(format!("invalid time '{}', expected HH:MM", raw)))
    }
}
