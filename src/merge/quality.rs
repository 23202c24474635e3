//! Row-level data problems that do not stop the pipeline.
//!
//! Every issue is logged as a warning when recorded and kept in a
//! [`DataQualityReport`] that is written next to the interim data.

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataIssue {
    /// A numeric field could not be coerced; the value was replaced by null.
    #[error("{table} row {row}: could not parse {field} value '{value}'")]
    DataParse {
        table: &'static str,
        row: u64,
        field: &'static str,
        value: String,
    },

    /// A value falls outside the known vocabulary.
    #[error("{table} row {row}: unmapped {field} value '{value}'")]
    UnmappedCategory {
        table: &'static str,
        row: u64,
        field: &'static str,
        value: String,
    },
}

impl DataIssue {
    pub fn parse(
        table: &'static str,
        row: u64,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        DataIssue::DataParse {
            table,
            row,
            field,
            value: value.into(),
        }
    }

    pub fn unmapped(
        table: &'static str,
        row: u64,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        DataIssue::UnmappedCategory {
            table,
            row,
            field,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataQualityReport {
    pub parse_errors: usize,
    pub unmapped_categories: usize,
    /// Mortality rows left out of the grid because their state code is unknown.
    pub excluded_mortality_rows: usize,
    pub issues: Vec<DataIssue>,
}

impl DataQualityReport {
    pub fn record(&mut self, issue: DataIssue) {
        warn!(issue = %issue, "Data quality issue");
        match issue {
            DataIssue::DataParse { .. } => self.parse_errors += 1,
            DataIssue::UnmappedCategory { .. } => self.unmapped_categories += 1,
        }
        self.issues.push(issue);
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues concerning one field, in the order they were recorded.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a DataIssue> + 'a {
        self.issues.iter().filter(move |issue| match issue {
            DataIssue::DataParse { field: f, .. } | DataIssue::UnmappedCategory { field: f, .. } => {
                *f == field
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_by_kind() {
        let mut report = DataQualityReport::default();
        assert!(report.is_clean());

        report.record(DataIssue::parse("mortality", 3, "deaths", "n/a"));
        report.record(DataIssue::unmapped("mortality", 4, "state", "PR"));
        report.record(DataIssue::unmapped("laws", 9, "effect", "See Note"));

        assert_eq!(report.parse_errors, 1);
        assert_eq!(report.unmapped_categories, 2);
        assert_eq!(report.for_field("effect").count(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_issue_display_names_value() {
        let issue = DataIssue::unmapped("mortality", 4, "state", "PR");
        assert_eq!(issue.to_string(), "mortality row 4: unmapped state value 'PR'");
    }

    #[test]
    fn test_issue_serializes_with_kind_tag() {
        let issue = DataIssue::parse("mortality", 2, "rate", "");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "data_parse");
        assert_eq!(json["field"], "rate");
    }
}
