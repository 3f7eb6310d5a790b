//! Automatic refreshes.
//!
//! The scheduler sleeps for the interval its [`AutoRefreshSettings`] give for
//! the current local time, then triggers the orchestrator as the `scheduler`
//! actor. It goes through the same gate as the admin, so it never overlaps a
//! manual refresh.

mod config;
mod scheduler;
mod settings;
mod task;

pub use config::ScheduleConfig;
pub use scheduler::{AutoRefreshScheduler, SCHEDULER_ACTOR, ScheduleView};
pub use settings::{
    AdvancedSchedule, AfterHours, AutoRefreshSettings, AutoRefreshUpdate, ScheduleMode,
    SettingsStore, WeekendDays, WorkDays, WorkHours,
};
pub use task::{BackgroundTask, spawn_session_purge};
