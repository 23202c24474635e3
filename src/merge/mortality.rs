//! Loader for the CDC firearm mortality CSV.
//!
//! Expects at least the columns `STATE`, `YEAR`, `DEATHS` and `RATE` (header
//! names are case-sensitive). Other columns such as `URL` are ignored.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::merge::quality::{DataIssue, DataQualityReport};
use crate::merge::states::resolve_abbrev;
use crate::merge::types::MortalityRecord;
use crate::merge::utility::parse_count;

const TABLE: &str = "mortality";

struct Columns {
    state: usize,
    year: usize,
    deaths: usize,
    rate: usize,
}

impl Columns {
    fn locate(headers: &StringRecord, file: &Path) -> Result<Self> {
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
            state: find("STATE")?,
            year: find("YEAR")?,
            deaths: find("DEATHS")?,
            rate: find("RATE")?,
        })
    }
}

/// Loads the mortality CSV at `path`.
pub fn load_mortality(path: &Path, report: &mut DataQualityReport) -> Result<Vec<MortalityRecord>> {
    let file = File::open(path)?;
    read_mortality(file, path, report)
}

/// Parses mortality rows from any reader; `file` is only used in messages.
///
/// Rows with an unknown state code are recorded in `report` and left out.
/// Unparsable deaths or rate values become `None` and are recorded too.
///
/// # Errors
///
/// Fails on a missing required column, a non-integer `YEAR`, or a repeated
/// state-year pair.
pub fn read_mortality<R: Read>(
    reader: R,
    file: &Path,
    report: &mut DataQualityReport,
) -> Result<Vec<MortalityRecord>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::Headers).from_reader(reader);
    let columns = Columns::locate(rdr.headers()?, file)?;

    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for result in rdr.records() {
        let row = result?;
        let line = row.position().map_or(0, |p| p.line());
        let field = |idx: usize| row.get(idx).unwrap_or("");

        let raw_year = field(columns.year).trim();
        let year: i32 = raw_year.parse().map_err(|_| PipelineError::InvalidYear {
            file: file.to_path_buf(),
            line,
            value: raw_year.to_string(),
        })?;

        let raw_state = field(columns.state);
        let Some((abbrev, name)) = resolve_abbrev(raw_state) else {
            report.record(DataIssue::unmapped(TABLE, line, "state", raw_state.trim()));
            report.excluded_mortality_rows += 1;
            continue;
        };

        let raw_deaths = field(columns.deaths);
        let deaths = parse_count(raw_deaths);
        if deaths.is_none() {
            report.record(DataIssue::parse(TABLE, line, "deaths", raw_deaths));
        }

        let raw_rate = field(columns.rate);
        let rate = raw_rate.trim().parse::<f64>().ok().filter(|r| r.is_finite());
        if rate.is_none() {
            report.record(DataIssue::parse(TABLE, line, "rate", raw_rate));
        }

        if !seen.insert((name, year)) {
            return Err(PipelineError::DuplicateStateYear {
                file: file.to_path_buf(),
                line,
                state: name.to_string(),
                year,
            });
        }

        debug!(state = abbrev, year, ?deaths, ?rate, "Mortality row");
        records.push(MortalityRecord {
            state_abbrev: abbrev.to_string(),
            state_name: name.to_string(),
            year,
            deaths,
            rate,
        });
    }

    info!(rows = records.len(), file = %file.display(), "Loaded mortality data");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(csv: &str) -> (Result<Vec<MortalityRecord>>, DataQualityReport) {
        let mut report = DataQualityReport::default();
        let result = read_mortality(csv.as_bytes(), Path::new("data-table.csv"), &mut report);
        (result, report)
    }

    #[test]
    fn test_reads_cdc_layout() {
        let csv = "YEAR,STATE,RATE,DEATHS,URL\n\
                   2014,AL,16.9,\"830\",/nchs/al.htm\n\
                   2014,dc,7.7,\"55\",/nchs/dc.htm\n";
        let (result, report) = read(csv);
        let rows = result.unwrap();

        assert!(report.is_clean());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].state_abbrev, "AL");
        assert_eq!(rows[0].state_name, "Alabama");
        assert_eq!(rows[0].deaths, Some(830));
        assert_eq!(rows[0].rate, Some(16.9));
        assert_eq!(rows[1].state_name, "District of Columbia");
    }

    #[test]
    fn test_noisy_deaths_are_cleaned() {
        let csv = "STATE,YEAR,DEATHS,RATE\nTX,2016,\"3,353\",11.8\n";
        let (result, _) = read(csv);
        assert_eq!(result.unwrap()[0].deaths, Some(3353));
    }

    #[test]
    fn test_unparsable_values_become_null_and_are_flagged() {
        let csv = "STATE,YEAR,DEATHS,RATE\nVT,2015,suppressed,\nNH,2015,98,7.4\n";
        let (result, report) = read(csv);
        let rows = result.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].deaths, None);
        assert_eq!(rows[0].rate, None);
        assert_eq!(report.parse_errors, 2);
        assert_eq!(report.for_field("deaths").count(), 1);
        assert_eq!(report.for_field("rate").count(), 1);
    }

    #[test]
    fn test_blank_state_maps_to_dc() {
        let csv = "STATE,YEAR,DEATHS,RATE\n,2016,60,8.9\n";
        let (result, report) = read(csv);
        let rows = result.unwrap();

        assert!(report.is_clean());
        assert_eq!(rows[0].state_abbrev, "DC");
        assert_eq!(rows[0].state_name, "District of Columbia");
    }

    #[test]
    fn test_unmapped_state_is_surfaced_and_excluded() {
        let csv = "STATE,YEAR,DEATHS,RATE\nPR,2016,60,8.9\nOR,2016,480,11.1\n";
        let (result, report) = read(csv);
        let rows = result.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(report.unmapped_categories, 1);
        assert_eq!(report.excluded_mortality_rows, 1);
        assert_eq!(
            report.issues[0],
            DataIssue::unmapped("mortality", 2, "state", "PR")
        );
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let (result, _) = read("STATE,YEAR,RATE\nAL,2014,16.9\n");
        match result {
            Err(PipelineError::MissingColumn { column, .. }) => assert_eq!(column, "DEATHS"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_column_names_are_case_sensitive() {
        let (result, _) = read("state,year,deaths,rate\nAL,2014,830,16.9\n");
        assert!(matches!(result, Err(PipelineError::MissingColumn { .. })));
    }

    #[test]
    fn test_invalid_year_is_fatal() {
        let (result, _) = read("STATE,YEAR,DEATHS,RATE\nAL,twenty,830,16.9\n");
        assert!(matches!(result, Err(PipelineError::InvalidYear { line: 2, .. })));
    }

    #[test]
    fn test_duplicate_state_year_is_fatal() {
        let csv = "STATE,YEAR,DEATHS,RATE\nAL,2014,830,16.9\nal,2014,831,17.0\n";
        let (result, _) = read(csv);
        assert!(matches!(
            result,
            Err(PipelineError::DuplicateStateYear { year: 2014, .. })
        ));
    }
}
