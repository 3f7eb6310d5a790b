use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use std::io::Cursor;

use super::error::IngestError;
use crate::dataset::{OutreachRecord, SectorRows};

const SOURCE_NAME: &str = "Source.Name";
const RESPONSE: &str = "Response";
const SCHEDULED: &str = "Scheduled";
const ARRIVED: &str = "Arrived";
const ENROLLMENT: &str = "Enrollment";

/// Header names every sector sheet must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = [SOURCE_NAME, RESPONSE, SCHEDULED, ARRIVED, ENROLLMENT];

/// Turns a downloaded workbook into rows, one [`SectorRows`] per sector sheet.
pub trait WorkbookParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<SectorRows>, IngestError>;
}

/// Reads `.xlsx` workbooks with calamine.
///
/// The first row of each sheet is the header; columns are found by name, so
/// their order and any extra columns do not matter.
#[derive(Debug, Clone)]
pub struct XlsxParser {
    sheets: Vec<String>,
}

impl XlsxParser {
    pub fn new(sheets: Vec<String>) -> Self {
        Self { sheets }
    }
}

impl WorkbookParser for XlsxParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<SectorRows>, IngestError> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
            .map_err(|e| IngestError::Parse(format!("unreadable workbook: {}", e)))?;

        let available = workbook.sheet_names();
        let mut sectors = Vec::with_capacity(self.sheets.len());

        for sheet in &self.sheets {
            if !available.iter().any(|name| name == sheet) {
                return Err(IngestError::Parse(format!(
                    "missing sheet '{}' (found: {})",
                    sheet,
                    available.join(", ")
                )));
            }
            let range = workbook
                .worksheet_range(sheet)
                .map_err(|e| IngestError::Parse(format!("cannot read sheet '{}': {}", sheet, e)))?;

            let mut rows = range.rows();
            let header = rows
                .next()
                .ok_or_else(|| IngestError::Parse(format!("sheet '{}' is empty", sheet)))?;
            let columns = ColumnIndex::from_header(sheet, header)?;

            let records = rows.map(|row| columns.record(row)).collect();
            sectors.push(SectorRows {
                sheet: sheet.clone(),
                rows: records,
            });
        }

        Ok(sectors)
    }
}

struct ColumnIndex {
    source_name: usize,
    response: usize,
    scheduled: usize,
    arrived: usize,
    enrollment: usize,
}

impl ColumnIndex {
    fn from_header(sheet: &str, header: &[Data]) -> Result<Self, IngestError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|cell| cell_text(cell).as_deref() == Some(name))
                .ok_or_else(|| {
                    IngestError::Parse(format!("sheet '{}' has no '{}' column", sheet, name))
                })
        };
        Ok(Self {
            source_name: find(SOURCE_NAME)?,
            response: find(RESPONSE)?,
            scheduled: find(SCHEDULED)?,
            arrived: find(ARRIVED)?,
            enrollment: find(ENROLLMENT)?,
        })
    }

    fn record(&self, row: &[Data]) -> OutreachRecord {
        let get = |index: usize| row.get(index).and_then(cell_text);
        OutreachRecord {
            source_name: get(self.source_name),
            response: get(self.response),
            scheduled: get(self.scheduled),
            arrived: get(self.arrived),
            enrollment: get(self.enrollment),
        }
    }
}

/// Cell contents as trimmed text; `None` for blank cells.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        other => Some(other.to_string()),
    }
}
