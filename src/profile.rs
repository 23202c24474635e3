//! Descriptive profile of the processed analytic table.
//!
//! Summarizes the key numeric variables, row counts per year and per state,
//! yearly averages, a correlation matrix and the states with the highest and
//! lowest average death rate and law strength.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use csv::StringRecord;
use serde::Serialize;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::output::{print_json, write_json};

/// Numeric columns summarized in every profile.
pub const KEY_VARIABLES: [&str; 6] = [
    "year",
    "rate",
    "deaths",
    "law_strength_score",
    "restrictive_laws",
    "permissive_laws",
];

/// Variables of the correlation matrix, in matrix order.
pub const CORRELATION_VARIABLES: [&str; 5] = [
    "year",
    "rate",
    "law_strength_score",
    "restrictive_laws",
    "permissive_laws",
];

const RANKING_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSummary {
    pub name: String,
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateMean {
    pub state_name: String,
    pub mean: f64,
}

/// States sorted by descending mean; `lowest` keeps that descending order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub highest: Vec<StateMean>,
    pub lowest: Vec<StateMean>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearMeans {
    pub rate: Option<f64>,
    pub law_strength_score: Option<f64>,
}

/// Pearson coefficients over pairwise-complete rows. `values[i][j]` pairs
/// `variables[i]` with `variables[j]`; `None` when the pair has fewer than
/// two rows or one side is constant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub variables: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.variables.iter().position(|v| v == a)?;
        let j = self.variables.iter().position(|v| v == b)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableProfile {
    pub generated_at: DateTime<Utc>,
    pub rows: usize,
    pub variables: Vec<VariableSummary>,
    pub rows_per_year: BTreeMap<i32, usize>,
    pub rows_per_state: BTreeMap<String, usize>,
    pub yearly_means: BTreeMap<i32, YearMeans>,
    pub correlations: CorrelationMatrix,
    pub rate_by_state: Ranking,
    pub law_strength_by_state: Ranking,
}

/// Average of the present values, `None` when there are none.
fn average(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn summarize(name: &str, column: &[Option<f64>]) -> VariableSummary {
    let values: Vec<f64> = column.iter().flatten().copied().collect();
    let mean = average(&values);
    let stddev = mean.and_then(|m| {
        let squares: Vec<f64> = values.iter().map(|v| (v - m).powi(2)).collect();
        average(&squares).map(f64::sqrt)
    });

    VariableSummary {
        name: name.to_string(),
        count: values.len(),
        missing: column.len() - values.len(),
        mean,
        stddev,
        min: values.iter().copied().reduce(f64::min),
        max: values.iter().copied().reduce(f64::max),
    }
}

fn rank(states: &[String], column: &[Option<f64>]) -> Ranking {
    let mut by_state: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (state, value) in states.iter().zip(column) {
        if let Some(v) = value {
            by_state.entry(state.as_str()).or_default().push(*v);
        }
    }

    let mut means: Vec<StateMean> = by_state
        .into_iter()
        .filter_map(|(state, values)| {
            Some(StateMean {
                state_name: state.to_string(),
                mean: average(&values)?,
            })
        })
        .collect();
    means.sort_by(|a, b| b.mean.total_cmp(&a.mean).then_with(|| a.state_name.cmp(&b.state_name)));

    let lowest_start = means.len().saturating_sub(RANKING_SIZE);
    Ranking {
        highest: means.iter().take(RANKING_SIZE).cloned().collect(),
        lowest: means[lowest_start..].to_vec(),
    }
}

fn yearly_means(
    years: &[Option<f64>],
    rate: &[Option<f64>],
    strength: &[Option<f64>],
) -> BTreeMap<i32, YearMeans> {
    let mut by_year: BTreeMap<i32, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for ((year, rate), strength) in years.iter().zip(rate).zip(strength) {
        let Some(year) = year else {
            continue;
        };
        let (rates, strengths) = by_year.entry(*year as i32).or_default();
        rates.extend(*rate);
        strengths.extend(*strength);
    }

    by_year
        .into_iter()
        .map(|(year, (rates, strengths))| {
            let means = YearMeans {
                rate: average(&rates),
                law_strength_score: average(&strengths),
            };
            (year, means)
        })
        .collect()
}

fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let (dx, dy) = (a - mean_x, b - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

fn correlations(columns: &[Vec<Option<f64>>]) -> CorrelationMatrix {
    let values = CORRELATION_VARIABLES
        .iter()
        .map(|a| {
            CORRELATION_VARIABLES
                .iter()
                .map(|b| pearson(key_column(columns, a), key_column(columns, b)))
                .collect()
        })
        .collect();

    CorrelationMatrix {
        variables: CORRELATION_VARIABLES.iter().map(|v| v.to_string()).collect(),
        values,
    }
}

fn key_column<'c>(columns: &'c [Vec<Option<f64>>], name: &str) -> &'c [Option<f64>] {
    let i = KEY_VARIABLES.iter().position(|v| *v == name).unwrap_or(0);
    &columns[i]
}

fn numeric(row: &StringRecord, idx: Option<usize>) -> Option<f64> {
    row.get(idx?)?.trim().parse::<f64>().ok()
}

/// Profiles a processed table read from `reader`; `file` is only used in
/// messages.
pub fn profile_table<R: Read>(reader: R, file: &Path) -> Result<TableProfile> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h == name);

    let state_idx = position("state_name").ok_or_else(|| PipelineError::MissingColumn {
        file: file.to_path_buf(),
        column: "state_name".to_string(),
    })?;
    let key_idx: Vec<Option<usize>> = KEY_VARIABLES.iter().map(|v| position(*v)).collect();

    let mut states = Vec::new();
    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); KEY_VARIABLES.len()];

    for result in rdr.records() {
        let row = result?;
        states.push(row.get(state_idx).unwrap_or_default().to_string());
        for (column, idx) in columns.iter_mut().zip(&key_idx) {
            column.push(numeric(&row, *idx));
        }
    }

    let years = key_column(&columns, "year");
    let mut rows_per_year = BTreeMap::new();
    for year in years.iter().flatten() {
        *rows_per_year.entry(*year as i32).or_insert(0) += 1;
    }

    let mut rows_per_state = BTreeMap::new();
    for state in &states {
        *rows_per_state.entry(state.clone()).or_insert(0) += 1;
    }

    Ok(TableProfile {
        generated_at: Utc::now(),
        rows: states.len(),
        variables: KEY_VARIABLES
            .iter()
            .zip(&columns)
            .map(|(name, column)| summarize(name, column))
            .collect(),
        rows_per_year,
        rows_per_state,
        yearly_means: yearly_means(
            years,
            key_column(&columns, "rate"),
            key_column(&columns, "law_strength_score"),
        ),
        correlations: correlations(&columns),
        rate_by_state: rank(&states, key_column(&columns, "rate")),
        law_strength_by_state: rank(&states, key_column(&columns, "law_strength_score")),
    })
}

/// Runs the profile step on the processed table and writes the JSON report.
#[tracing::instrument(skip(config), fields(data_dir = %config.data_dir.display()))]
pub fn run_profile(config: &PipelineConfig) -> Result<TableProfile> {
    let path = config.output_table();
    if !path.is_file() {
        return Err(PipelineError::MissingInput {
            what: "processed table",
            path,
        });
    }

    let profile = profile_table(File::open(&path)?, &path)?;
    write_json(&config.profile_report(), &profile)?;
    print_json(&profile.variables)?;

    info!(rows = profile.rows, report = %config.profile_report().display(), "Wrote table profile");
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
state,state_name,year,deaths,rate,law_strength_score,restrictive_laws,permissive_laws
AK,Alaska,2014,120,16.0,,,
AK,Alaska,2015,130,18.0,1,1,0
AL,Alabama,2014,800,17.0,-2,0,2
AL,Alabama,2015,850,19.0,-3,0,3
CA,California,2015,3000,7.5,20,20,0
";

    fn profile() -> TableProfile {
        profile_table(TABLE.as_bytes(), Path::new("firearm_data_cleaned.csv")).unwrap()
    }

    #[test]
    fn test_summarize_skips_missing_values() {
        let summary = summarize("rate", &[Some(2.0), None, Some(4.0)]);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.missing, 1);
        assert_eq!(summary.mean, Some(3.0));
        assert_eq!(summary.stddev, Some(1.0));

        let empty = summarize("rate", &[None]);
        assert_eq!(empty.mean, None);
        assert_eq!(empty.stddev, None);
    }

    #[test]
    fn test_variable_summaries() {
        let p = profile();
        assert_eq!(p.rows, 5);

        let strength = p.variables.iter().find(|v| v.name == "law_strength_score").unwrap();
        assert_eq!(strength.count, 4);
        assert_eq!(strength.missing, 1);
        assert_eq!(strength.mean, Some(4.0));
        assert_eq!(strength.min, Some(-3.0));
        assert_eq!(strength.max, Some(20.0));
    }

    #[test]
    fn test_rows_per_year() {
        let p = profile();
        assert_eq!(p.rows_per_year.get(&2014), Some(&2));
        assert_eq!(p.rows_per_year.get(&2015), Some(&3));
    }

    #[test]
    fn test_rows_per_state() {
        let p = profile();
        assert_eq!(p.rows_per_state.get("Alaska"), Some(&2));
        assert_eq!(p.rows_per_state.get("California"), Some(&1));
        assert_eq!(p.rows_per_state.len(), 3);
    }

    #[test]
    fn test_yearly_means() {
        let p = profile();
        let y2014 = &p.yearly_means[&2014];
        assert_eq!(y2014.rate, Some(16.5));
        assert_eq!(y2014.law_strength_score, Some(-2.0));
        assert_eq!(p.yearly_means[&2015].law_strength_score, Some(6.0));
    }

    #[test]
    fn test_correlation_matrix() {
        let table = "\
state_name,year,rate,law_strength_score,restrictive_laws,permissive_laws
Ohio,2014,10.0,1,1,3
Ohio,2015,12.0,2,1,2
Iowa,2016,14.0,3,1,1
";
        let p = profile_table(table.as_bytes(), Path::new("t.csv")).unwrap();
        let c = &p.correlations;
        let close = |v: Option<f64>, want: f64| v.is_some_and(|v| (v - want).abs() < 1e-12);

        assert_eq!(c.variables.len(), 5);
        assert!(close(c.get("year", "year"), 1.0));
        assert!(close(c.get("year", "rate"), 1.0));
        assert!(close(c.get("rate", "permissive_laws"), -1.0));
        assert_eq!(c.get("rate", "law_strength_score"), c.get("law_strength_score", "rate"));
        assert_eq!(c.get("restrictive_laws", "rate"), None);
        assert_eq!(c.get("deaths", "rate"), None);
    }

    #[test]
    fn test_correlation_uses_pairwise_complete_rows() {
        assert_eq!(pearson(&[Some(1.0), None], &[Some(2.0), Some(3.0)]), None);

        let r = pearson(
            &[Some(1.0), Some(2.0), None, Some(3.0)],
            &[Some(2.0), Some(4.0), Some(100.0), Some(6.0)],
        );
        assert!(r.is_some_and(|r| (r - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_state_rankings_descend() {
        let p = profile();
        let names: Vec<_> = p.rate_by_state.highest.iter().map(|s| s.state_name.as_str()).collect();
        assert_eq!(names, vec!["Alabama", "Alaska", "California"]);

        let strength: Vec<_> = p
            .law_strength_by_state
            .highest
            .iter()
            .map(|s| (s.state_name.as_str(), s.mean))
            .collect();
        assert_eq!(strength, vec![("California", 20.0), ("Alaska", 1.0), ("Alabama", -2.5)]);
    }

    #[test]
    fn test_missing_column_yields_empty_summary() {
        let p = profile_table("state_name,rate\nOhio,12.0\n".as_bytes(), Path::new("t.csv")).unwrap();
        let deaths = p.variables.iter().find(|v| v.name == "deaths").unwrap();
        assert_eq!(deaths.count, 0);
        assert_eq!(deaths.missing, 1);
        assert_eq!(deaths.mean, None);
    }

    #[test]
    fn test_requires_state_name() {
        let err = profile_table("state,rate\nOH,12.0\n".as_bytes(), Path::new("t.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { .. }));
    }
}
