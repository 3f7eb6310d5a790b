/// Why an ingestion run produced no dataset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error("Download failed: {0}")]
    Download(String),

    #[error("Parse failed: {0}")]
    Parse(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl IngestError {
    /// The step that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Download(_) => "download",
            Self::Parse(_) => "parse",
            Self::Validation(_) => "validation",
        }
    }

    /// The failure reason without the stage prefix.
    pub fn reason(&self) -> &str {
        match self {
            Self::Download(r) | Self::Parse(r) | Self::Validation(r) => r,
        }
    }
}
