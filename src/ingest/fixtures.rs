//! In-memory xlsx workbooks for ingestion tests.

use rust_xlsxwriter::Workbook;

use super::parse::REQUIRED_COLUMNS;

pub(crate) struct Sheet<'a> {
    pub name: &'a str,
    pub header: &'a [&'a str],
    pub rows: Vec<Vec<&'a str>>,
}

/// Write `sheets` to an xlsx buffer. Empty strings are left as blank cells.
pub(crate) fn workbook(sheets: &[Sheet<'_>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name).unwrap();
        for (col, title) in sheet.header.iter().enumerate() {
            worksheet.write_string(0, col as u16, *title).unwrap();
        }
        for (r, row) in sheet.rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    worksheet.write_string(r as u32 + 1, col as u16, *value).unwrap();
                }
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

/// All four sector sheets; each holds one centre with two rows.
pub(crate) fn sector_workbook() -> Vec<u8> {
    let sheets: Vec<Sheet<'_>> = [
        ("western_sector", "PHC West.xlsx"),
        ("eastern_sector", "PHC East.xlsx"),
        ("northern_sector", "PHC North.xlsx"),
        ("southern_sector", "PHC South.xlsx"),
    ]
    .into_iter()
    .map(|(name, center)| Sheet {
        name,
        header: &REQUIRED_COLUMNS,
        rows: vec![
            vec![center, "Accepted", "In-Person", "Yes", "Yes"],
            vec![center, "Refused", "", "", ""],
        ],
    })
    .collect();
    workbook(&sheets)
}
