use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prefixes stripped from centre names, checked in order; only the first
/// match is removed.
const CENTER_NAME_PREFIXES: &[&str] = &[
    "مركز الرعاية الصحية الأولية ب",
    "مركز الرعاية الصحية الأولية",
    "مركز صحي ",
    "Primary Health Care Center",
    "PHC ",
];

/// One outreach row as read from a sector sheet.
///
/// Blank cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutreachRecord {
    /// `Source.Name`: the file the row came from, which names the centre.
    pub source_name: Option<String>,
    /// `Accepted`, `Refused`, `Wrong number` or `No response`
    pub response: Option<String>,
    /// `In-Person` or `Virtual`
    pub scheduled: Option<String>,
    pub arrived: Option<String>,
    pub enrollment: Option<String>,
}

/// All rows of one sector sheet.
#[derive(Debug, Clone, Default)]
pub struct SectorRows {
    /// Sheet name, e.g. `western_sector`.
    pub sheet: String,
    pub rows: Vec<OutreachRecord>,
}

impl SectorRows {
    pub fn sector_name(&self) -> String {
        sector_name(&self.sheet)
    }
}

/// Sector name shown on the dashboard: the sheet name without `_sector`.
pub fn sector_name(sheet: &str) -> String {
    sheet.replace("_sector", "")
}

/// Metrics for one primary health care centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterSummary {
    pub phc_name: String,
    pub total_population: u64,
    pub communicated: u64,
    pub accepted: u64,
    pub refused: u64,
    pub wrong_number: u64,
    pub no_response: u64,
    pub in_person_visits: u64,
    pub virtual_visits: u64,
    pub arrived: u64,
    pub enrolled: u64,
    pub acceptance_rate: f64,
    pub enrollment_rate: f64,
    pub communication_rate: f64,
}

/// Totals across every sector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub total_population: u64,
    pub total_communicated: u64,
    pub total_accepted: u64,
    pub total_refused: u64,
    pub total_wrong_number: u64,
    pub total_no_response: u64,
    pub total_enrolled: u64,
    pub total_phc_centers: u64,
    pub total_arrived: u64,
    pub total_in_person: u64,
    pub total_virtual: u64,
    pub communication_rate: f64,
    pub acceptance_rate: f64,
    pub enrollment_rate: f64,
}

/// The aggregated outreach data produced by one ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// When the source was processed.
    pub last_updated: DateTime<Utc>,
    /// Centre summaries per sector, largest population first.
    pub sectors: BTreeMap<String, Vec<CenterSummary>>,
    pub overview: Overview,
}

/// A published dataset.
///
/// Snapshots are never mutated; a refresh publishes a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    /// 0 for the empty seed, then one higher per publish.
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub dataset: Dataset,
}

impl DatasetSnapshot {
    /// The snapshot served before anything has been published.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            version: 0,
            published_at: None,
            dataset: Dataset::empty(now),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.dataset.is_empty()
    }
}

impl Dataset {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            last_updated: now,
            sectors: BTreeMap::new(),
            overview: Overview::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.values().all(Vec::is_empty)
    }

    /// Aggregate raw sector rows into per-centre summaries and an overview.
    ///
    /// Rows whose cleaned centre name is blank are dropped.
    pub fn aggregate(sectors: Vec<SectorRows>, now: DateTime<Utc>) -> Self {
        let sectors: BTreeMap<String, Vec<CenterSummary>> = sectors
            .into_iter()
            .map(|sector| (sector.sector_name(), summarize_sector(&sector.rows)))
            .collect();
        let overview = Overview::from_sectors(&sectors);

        Self {
            last_updated: now,
            sectors,
            overview,
        }
    }
}

fn summarize_sector(rows: &[OutreachRecord]) -> Vec<CenterSummary> {
    // BTreeMap gives name order, so equal populations keep a stable order.
    let mut groups: BTreeMap<String, Vec<&OutreachRecord>> = BTreeMap::new();
    for row in rows {
        let name = row
            .source_name
            .as_deref()
            .map(clean_center_name)
            .unwrap_or_default();
        if name.is_empty() {
            continue;
        }
        groups.entry(name).or_default().push(row);
    }

    let mut centers: Vec<CenterSummary> = groups
        .into_iter()
        .map(|(name, rows)| CenterSummary::from_rows(name, &rows))
        .collect();
    centers.sort_by(|a, b| b.total_population.cmp(&a.total_population));
    centers
}

impl CenterSummary {
    fn from_rows(phc_name: String, rows: &[&OutreachRecord]) -> Self {
        let total_population = rows.len() as u64;
        let communicated = count(rows, |r| r.response.is_some());
        let accepted = count(rows, |r| cell_is(&r.response, "Accepted"));
        let refused = count(rows, |r| cell_is(&r.response, "Refused"));
        let wrong_number = count(rows, |r| cell_is(&r.response, "Wrong number"));
        let no_response = count(rows, |r| cell_is(&r.response, "No response"));
        let in_person_visits = count(rows, |r| cell_is(&r.scheduled, "In-Person"));
        let virtual_visits = count(rows, |r| cell_is(&r.scheduled, "Virtual"));
        let arrived = count(rows, |r| cell_is(&r.arrived, "Yes"));
        let enrolled = count(rows, |r| cell_is(&r.enrollment, "Yes"));

        Self {
            phc_name,
            total_population,
            communicated,
            accepted,
            refused,
            wrong_number,
            no_response,
            in_person_visits,
            virtual_visits,
            arrived,
            enrolled,
            acceptance_rate: percentage(accepted, communicated, 1),
            enrollment_rate: percentage(enrolled, accepted, 1),
            communication_rate: percentage(communicated, total_population, 1),
        }
    }
}

impl Overview {
    fn from_sectors(sectors: &BTreeMap<String, Vec<CenterSummary>>) -> Self {
        let mut overview = Overview::default();

        for center in sectors.values().flatten() {
            overview.total_phc_centers += 1;
            overview.total_population += center.total_population;
            overview.total_communicated += center.communicated;
            overview.total_accepted += center.accepted;
            overview.total_refused += center.refused;
            overview.total_wrong_number += center.wrong_number;
            overview.total_no_response += center.no_response;
            overview.total_enrolled += center.enrolled;
            overview.total_arrived += center.arrived;
            overview.total_in_person += center.in_person_visits;
            overview.total_virtual += center.virtual_visits;
        }

        overview.communication_rate =
            percentage(overview.total_communicated, overview.total_population, 2);
        overview.acceptance_rate =
            percentage(overview.total_accepted, overview.total_communicated, 2);
        overview.enrollment_rate = percentage(overview.total_enrolled, overview.total_accepted, 2);
        overview
    }
}

fn count(rows: &[&OutreachRecord], predicate: impl Fn(&OutreachRecord) -> bool) -> u64 {
    rows.iter().filter(|r| predicate(r)).count() as u64
}

fn cell_is(cell: &Option<String>, value: &str) -> bool {
    cell.as_deref().map(str::trim) == Some(value)
}

/// `part / whole * 100` rounded to `decimals`; 0 when `whole` is 0.
fn percentage(part: u64, whole: u64, decimals: i32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let factor = 10f64.powi(decimals);
    (part as f64 / whole as f64 * 100.0 * factor).round() / factor
}

/// Turn a `Source.Name` cell into a display name for the centre.
pub fn clean_center_name(source_name: &str) -> String {
    let name = source_name.replace(".xlsx", "");
    let name = CENTER_NAME_PREFIXES
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .unwrap_or(&name);
    name.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(source: &str, response: Option<&str>, scheduled: Option<&str>, arrived: bool, enrolled: bool) -> OutreachRecord {
        OutreachRecord {
            source_name: Some(source.to_string()),
            response: response.map(String::from),
            scheduled: scheduled.map(String::from),
            arrived: arrived.then(|| "Yes".to_string()),
            enrollment: enrolled.then(|| "Yes".to_string()),
        }
    }

    #[test]
    fn test_clean_center_name() {
        assert_eq!(clean_center_name("PHC Alpha.xlsx"), "Alpha");
        assert_eq!(clean_center_name("Primary Health Care Center Beta.xlsx"), "Beta");
        assert_eq!(clean_center_name("مركز صحي النور.xlsx"), "النور");
        assert_eq!(clean_center_name("مركز الرعاية الصحية الأولية بالروضة.xlsx"), "الروضة");
        assert_eq!(clean_center_name("مركز الرعاية الصحية الأولية الشفا"), "الشفا");
        assert_eq!(clean_center_name("  Gamma  "), "Gamma");
        assert_eq!(clean_center_name(".xlsx"), "");
    }

    #[test]
    fn test_only_first_matching_prefix_is_removed() {
        assert_eq!(clean_center_name("PHC PHC Delta"), "PHC Delta");
    }

    #[test]
    fn test_center_summary_counts_and_rates() {
        let rows = vec![
            row("PHC Alpha.xlsx", Some("Accepted"), Some("In-Person"), true, true),
            row("PHC Alpha.xlsx", Some("Accepted"), Some("Virtual"), false, false),
            row("PHC Alpha.xlsx", Some("Refused"), None, false, false),
            row("PHC Alpha.xlsx", Some("Wrong number"), None, false, false),
            row("PHC Alpha.xlsx", Some("No response"), None, false, false),
            row("PHC Alpha.xlsx", None, None, false, false),
        ];
        let dataset = Dataset::aggregate(
            vec![SectorRows { sheet: "western_sector".into(), rows }],
            Utc::now(),
        );

        let alpha = &dataset.sectors["western"][0];
        assert_eq!(alpha.phc_name, "Alpha");
        assert_eq!(alpha.total_population, 6);
        assert_eq!(alpha.communicated, 5);
        assert_eq!(alpha.accepted, 2);
        assert_eq!(alpha.refused, 1);
        assert_eq!(alpha.wrong_number, 1);
        assert_eq!(alpha.no_response, 1);
        assert_eq!(alpha.in_person_visits, 1);
        assert_eq!(alpha.virtual_visits, 1);
        assert_eq!(alpha.arrived, 1);
        assert_eq!(alpha.enrolled, 1);
        assert_eq!(alpha.acceptance_rate, 40.0);
        assert_eq!(alpha.enrollment_rate, 50.0);
        assert_eq!(alpha.communication_rate, 83.3);
    }

    #[test]
    fn test_centers_sorted_by_population_and_blank_names_dropped() {
        let rows = vec![
            row("PHC Small", None, None, false, false),
            row("PHC Big", None, None, false, false),
            row("PHC Big", None, None, false, false),
            OutreachRecord::default(),
            row("   ", None, None, false, false),
        ];
        let dataset = Dataset::aggregate(
            vec![SectorRows { sheet: "eastern_sector".into(), rows }],
            Utc::now(),
        );

        let names: Vec<_> = dataset.sectors["eastern"].iter().map(|c| c.phc_name.as_str()).collect();
        assert_eq!(names, vec!["Big", "Small"]);
        assert_eq!(dataset.overview.total_population, 3);
    }

    #[test]
    fn test_overview_rates_use_two_decimals() {
        let rows = vec![
            row("PHC A", Some("Accepted"), None, false, true),
            row("PHC A", Some("Refused"), None, false, false),
            row("PHC B", Some("Refused"), None, false, false),
        ];
        let dataset = Dataset::aggregate(
            vec![SectorRows { sheet: "northern_sector".into(), rows }],
            Utc::now(),
        );

        assert_eq!(dataset.overview.total_phc_centers, 2);
        assert_eq!(dataset.overview.acceptance_rate, 33.33);
        assert_eq!(dataset.overview.enrollment_rate, 100.0);
        assert_eq!(dataset.overview.communication_rate, 100.0);
    }

    #[test]
    fn test_zero_denominators_give_zero_rates() {
        let dataset = Dataset::aggregate(
            vec![SectorRows { sheet: "southern_sector".into(), rows: vec![row("PHC Z", None, None, false, false)] }],
            Utc::now(),
        );
        let z = &dataset.sectors["southern"][0];
        assert_eq!(z.acceptance_rate, 0.0);
        assert_eq!(z.enrollment_rate, 0.0);
        assert_eq!(z.communication_rate, 0.0);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = DatasetSnapshot::empty(Utc::now());
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["version"], 0);
        assert!(json["published_at"].is_null());
        assert!(json["last_updated"].is_string());
        assert!(json["sectors"].is_object());
        assert_eq!(json["overview"]["total_phc_centers"], 0);
        assert!(!snapshot.has_data());
    }
}
