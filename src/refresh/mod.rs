//! Admin-triggered refresh.
//!
//! [`RefreshGate`] enforces single-flight and the cooldown between attempts;
//! [`RefreshOrchestrator`] drives one attempt through the ingestion pipeline
//! and the publisher, auditing how it ended.

mod config;
mod error;
mod gate;
mod orchestrator;

pub use config::{RefreshConfig, RefreshMode};
pub use error::{RefreshError, RefreshRejection};
pub use gate::{GateStatus, LastOutcome, RefreshGate, RefreshPermit, RefreshState};
pub use orchestrator::{RefreshOrchestrator, RefreshPhase, RefreshReport, RefreshStatus, RefreshTicket};
