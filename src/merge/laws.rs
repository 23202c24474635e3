//! Loader for the state firearm law database workbook.
//!
//! Reads one named sheet, normalizes its header row to lower-case underscore
//! names and keeps the columns the scoring needs.

use std::ops::RangeInclusive;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::merge::quality::{DataIssue, DataQualityReport};
use crate::merge::states::is_known_name;
use crate::merge::types::{ChangeType, Effect, LawEvent};
use crate::merge::utility::{clean_category, normalize_column_name};

const TABLE: &str = "laws";

static EMPTY: Data = Data::Empty;

/// Effective years outside this range are treated as unreadable.
const EFFECTIVE_YEARS: RangeInclusive<i32> = 1000..=9999;

/// Normalized names of the columns that must be present.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "law_id",
    "state",
    "effective_date_year",
    "law_class_num",
    "law_class",
    "law_class_subtype",
    "effect",
    "type_of_change",
];

struct Columns {
    law_id: usize,
    state: usize,
    effective_year: usize,
    law_class_num: usize,
    law_class: usize,
    law_class_subtype: usize,
    effect: usize,
    type_of_change: usize,
}

impl Columns {
    fn locate(headers: &[String], file: &Path) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PipelineError::MissingColumn {
                    file: file.to_path_buf(),
                    column: name.to_string(),
                })
        };

        Ok(Self {
            law_id: find(REQUIRED_COLUMNS[0])?,
            state: find(REQUIRED_COLUMNS[1])?,
            effective_year: find(REQUIRED_COLUMNS[2])?,
            law_class_num: find(REQUIRED_COLUMNS[3])?,
            law_class: find(REQUIRED_COLUMNS[4])?,
            law_class_subtype: find(REQUIRED_COLUMNS[5])?,
            effect: find(REQUIRED_COLUMNS[6])?,
            type_of_change: find(REQUIRED_COLUMNS[7])?,
        })
    }
}

/// Loads law events from `sheet` of the workbook at `path`.
#[tracing::instrument(skip(report), fields(file = %path.display()))]
pub fn load_laws(
    path: &Path,
    sheet: &str,
    report: &mut DataQualityReport,
) -> Result<Vec<LawEvent>> {
    let mut workbook = open_workbook_auto(path)?;

    let names = workbook.sheet_names();
    if !names.iter().any(|n| n == sheet) {
        return Err(PipelineError::SheetNotFound {
            file: path.to_path_buf(),
            sheet: sheet.to_string(),
            available: names.join(", "),
        });
    }

    let range = workbook.worksheet_range(sheet)?;
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Err(PipelineError::MissingColumn {
            file: path.to_path_buf(),
            column: REQUIRED_COLUMNS[0].to_string(),
        });
    };

    let headers: Vec<String> = header_row.iter().map(cell_text).collect();
    let events = parse_law_rows(&headers, rows, path, report)?;

    info!(events = events.len(), sheet, "Loaded law database");
    Ok(events)
}

/// Builds law events from a header row and data rows of workbook cells.
///
/// Headers are normalized before lookup. Data rows are numbered as the
/// spreadsheet does, so the first one is row 2.
pub fn parse_law_rows<'a>(
    headers: &[String],
    rows: impl Iterator<Item = &'a [Data]>,
    file: &Path,
    report: &mut DataQualityReport,
) -> Result<Vec<LawEvent>> {
    let headers: Vec<String> = headers.iter().map(|h| normalize_column_name(h)).collect();
    let columns = Columns::locate(&headers, file)?;
    let mut events = Vec::new();

    for (idx, row) in rows.enumerate() {
        let row_num = idx as u64 + 2;
        let cell = |i: usize| row.get(i).unwrap_or(&EMPTY);

        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }

        let state_name = cell_text(cell(columns.state)).trim().to_string();
        if !is_known_name(&state_name) {
            report.record(DataIssue::unmapped(TABLE, row_num, "state", state_name.as_str()));
        }

        let effective_year = match cell_integer(cell(columns.effective_year)) {
            Ok(None) => None,
            Ok(Some(year)) => match i32::try_from(year) {
                Ok(year) if EFFECTIVE_YEARS.contains(&year) => Some(year),
                _ => {
                    report.record(DataIssue::parse(
                        TABLE,
                        row_num,
                        "effective_date_year",
                        year.to_string(),
                    ));
                    None
                }
            },
            Err(raw) => {
                report.record(DataIssue::parse(TABLE, row_num, "effective_date_year", raw));
                None
            }
        };

        let law_class_num = match cell_integer(cell(columns.law_class_num)) {
            Ok(num) => num,
            Err(raw) => {
                report.record(DataIssue::parse(TABLE, row_num, "law_class_num", raw));
                None
            }
        };

        let effect_text = clean_category(&cell_text(cell(columns.effect)));
        let effect = Effect::parse(&effect_text);
        if effect.is_none() {
            report.record(DataIssue::unmapped(TABLE, row_num, "effect", effect_text.as_str()));
        }

        let change_text = clean_category(&cell_text(cell(columns.type_of_change)));
        let type_of_change = ChangeType::parse(&change_text);
        if type_of_change.is_none() {
            report.record(DataIssue::unmapped(
                TABLE,
                row_num,
                "type_of_change",
                change_text.as_str(),
            ));
        }

        events.push(LawEvent {
            law_id: cell_text(cell(columns.law_id)).trim().to_string(),
            state_name,
            effective_year,
            law_class_num,
            law_class: clean_category(&cell_text(cell(columns.law_class))),
            law_class_subtype: clean_category(&cell_text(cell(columns.law_class_subtype))),
            effect,
            type_of_change,
        });
    }

    Ok(events)
}

/// Text form of a cell. Whole floats lose their trailing `.0`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Whole-number value of a cell.
///
/// `Ok(None)` for blank cells, `Err(text)` when the cell holds something that
/// is not a whole number.
fn cell_integer(cell: &Data) -> std::result::Result<Option<i64>, String> {
    match cell {
        Data::Empty => Ok(None),
        Data::Int(i) => Ok(Some(*i)),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 => Ok(Some(*f as i64)),
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Some(i));
            }
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() && f.fract() == 0.0 => Ok(Some(f as i64)),
                _ => Err(s.clone()),
            }
        }
        other => Err(other.to_string()),
    }
}
