use std::sync::Arc;

use super::config::SourceConfig;
use super::error::IngestError;
use super::fetch::{RawSource, SourceFetcher, normalize_download_url};
use super::parse::WorkbookParser;
use super::validate::DatasetValidator;
use crate::clock::Clock;
use crate::dataset::Dataset;

/// Download, parse and validate the source into a [`Dataset`].
///
/// A run reads no shared state and publishes nothing; the caller decides what
/// to do with the result.
pub struct IngestionPipeline {
    source: SourceConfig,
    fetcher: Arc<dyn SourceFetcher>,
    parser: Arc<dyn WorkbookParser>,
    validator: DatasetValidator,
    clock: Arc<dyn Clock>,
}

impl IngestionPipeline {
    pub fn new(
        source: SourceConfig,
        fetcher: Arc<dyn SourceFetcher>,
        parser: Arc<dyn WorkbookParser>,
        validator: DatasetValidator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            fetcher,
            parser,
            validator,
            clock,
        }
    }

    pub async fn run(&self) -> Result<Dataset, IngestError> {
        let raw = self.download().await?;
        tracing::debug!(url = %raw.url, bytes = raw.bytes.len(), "Parsing source workbook");

        let parser = self.parser.clone();
        let sectors = tokio::task::spawn_blocking(move || parser.parse(&raw.bytes))
            .await
            .map_err(|e| IngestError::Parse(format!("parser task failed: {}", e)))??;

        let dataset = Dataset::aggregate(sectors, self.clock.now());
        self.validator.validate(&dataset)?;

        tracing::debug!(
            centers = dataset.overview.total_phc_centers,
            population = dataset.overview.total_population,
            "Source ingested"
        );
        Ok(dataset)
    }

    /// Try the primary URL, then the alternate one if it differs.
    async fn download(&self) -> Result<RawSource, IngestError> {
        let primary = self
            .source
            .download_url
            .as_deref()
            .ok_or_else(|| IngestError::Download("no source URL configured".into()))?;

        let primary_err = match self.download_from(primary).await {
            Ok(raw) => return Ok(raw),
            Err(e) => e,
        };

        match self.source.alternate_url.as_deref() {
            Some(alternate) if alternate != primary => {
                tracing::warn!(
                    error = %primary_err,
                    "Primary source failed, trying alternate URL"
                );
                self.download_from(alternate).await.map_err(|alt_err| {
                    IngestError::Download(format!(
                        "{}; alternate URL: {}",
                        primary_err.reason(),
                        alt_err.reason()
                    ))
                })
            }
            _ => Err(primary_err),
        }
    }

    async fn download_from(&self, url: &str) -> Result<RawSource, IngestError> {
        let url = normalize_download_url(url);
        let timeout = self.source.timeout();

        let raw = tokio::time::timeout(timeout, self.fetcher.fetch(&url, timeout))
            .await
            .map_err(|_| {
                IngestError::Download(format!("timed out after {}s", timeout.as_secs()))
            })??;

        raw.check(self.source.max_bytes)?;
        Ok(raw)
    }
}
