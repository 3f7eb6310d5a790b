//! The outreach dataset and its published snapshots.
//!
//! [`Dataset`] is the aggregated, immutable result of one ingestion run.
//! [`DatasetPublisher`] holds the snapshot every public read sees and swaps in
//! new ones atomically; [`SnapshotStore`] keeps the last one on disk so a
//! restart serves data immediately.

mod config;
mod model;
mod persistence;
mod publisher;

pub use config::SnapshotConfig;
pub use model::{
    CenterSummary, Dataset, DatasetSnapshot, OutreachRecord, Overview, SectorRows, clean_center_name,
    sector_name,
};
pub use persistence::SnapshotStore;
pub use publisher::DatasetPublisher;
