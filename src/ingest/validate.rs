use super::config::ValidationConfig;
use super::error::IngestError;
use crate::dataset::{CenterSummary, Dataset, sector_name};

/// Checks a freshly aggregated dataset before it may be published.
#[derive(Debug, Clone)]
pub struct DatasetValidator {
    config: ValidationConfig,
}

impl DatasetValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn validate(&self, dataset: &Dataset) -> Result<(), IngestError> {
        for sheet in &self.config.sectors {
            let sector = sector_name(sheet);
            if !dataset.sectors.contains_key(&sector) {
                return Err(IngestError::Validation(format!("sector '{}' is missing", sector)));
            }
        }

        let centers = dataset.overview.total_phc_centers as usize;
        if let Some(min) = self.config.min_centers {
            if centers < min {
                return Err(IngestError::Validation(format!(
                    "{} centres found, expected at least {}",
                    centers, min
                )));
            }
        }
        if let Some(max) = self.config.max_centers {
            if centers > max {
                return Err(IngestError::Validation(format!(
                    "{} centres found, expected at most {}",
                    centers, max
                )));
            }
        }

        if dataset.overview.total_population == 0 {
            return Err(IngestError::Validation("no outreach rows found".into()));
        }

        for (sector, summaries) in &dataset.sectors {
            for center in summaries {
                check_center(sector, center)?;
            }
        }

        Ok(())
    }
}

fn check_center(sector: &str, center: &CenterSummary) -> Result<(), IngestError> {
    if center.phc_name.trim().is_empty() {
        return Err(IngestError::Validation(format!(
            "a centre in sector '{}' has no name",
            sector
        )));
    }
    if center.communicated > center.total_population {
        return Err(IngestError::Validation(format!(
            "centre '{}' reports more contacts than population",
            center.phc_name
        )));
    }
    let outcomes = center.accepted + center.refused + center.wrong_number + center.no_response;
    if outcomes > center.communicated {
        return Err(IngestError::Validation(format!(
            "centre '{}' reports more responses than contacts",
            center.phc_name
        )));
    }
    Ok(())
}
