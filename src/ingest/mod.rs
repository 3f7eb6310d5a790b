//! Source ingestion: download, parse, validate.
//!
//! [`IngestionPipeline::run`] turns the remote workbook into a [`Dataset`]
//! (crate::dataset::Dataset) without touching any shared state. Each step
//! sits behind a collaborator so tests can swap the network and the
//! spreadsheet reader out.

mod config;
mod error;
mod fetch;
#[cfg(test)]
pub(crate) mod fixtures;
mod parse;
mod pipeline;
mod validate;

pub use config::{SourceConfig, ValidationConfig};
pub use error::IngestError;
pub use fetch::{HttpFetcher, RawSource, SourceFetcher, normalize_download_url};
pub use parse::{REQUIRED_COLUMNS, WorkbookParser, XlsxParser};
pub use pipeline::IngestionPipeline;
pub use validate::DatasetValidator;
