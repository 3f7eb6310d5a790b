use crate::ingest::IngestError;

/// Why the gate turned a refresh request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RefreshRejection {
    #[error("A refresh is already in progress")]
    AlreadyInFlight,

    #[error("Please wait {remaining_secs} seconds before refreshing again")]
    Cooldown { remaining_secs: u64 },
}

/// A refresh that did not publish.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error(transparent)]
    Rejected(#[from] RefreshRejection),

    #[error(transparent)]
    Failed(#[from] IngestError),

    /// The run's task panicked or was cancelled before it finished.
    #[error("Refresh interrupted: {0}")]
    Interrupted(String),
}
