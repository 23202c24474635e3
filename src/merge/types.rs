//! Data types flowing through the merge pipeline.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// One state-year row of the mortality source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MortalityRecord {
    /// Upper-cased postal code; a blank source value is recorded as `DC`.
    pub state_abbrev: String,
    pub state_name: String,
    pub year: i32,
    /// `None` when the source value could not be parsed.
    pub deaths: Option<u64>,
    /// Deaths per 100,000; `None` when the source value could not be parsed.
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Effect {
    Restrictive,
    Permissive,
}

impl Effect {
    /// Parses an already title-cased value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Restrictive" => Some(Effect::Restrictive),
            "Permissive" => Some(Effect::Permissive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ChangeType {
    Implement,
    Modify,
    Repeal,
}

impl ChangeType {
    /// Parses an already title-cased value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Implement" => Some(ChangeType::Implement),
            "Modify" => Some(ChangeType::Modify),
            "Repeal" => Some(ChangeType::Repeal),
            _ => None,
        }
    }
}

/// One row of the law database after normalization.
///
/// `effect` and `type_of_change` are `None` when the source value is outside
/// the known vocabulary; such events score zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LawEvent {
    pub law_id: String,
    pub state_name: String,
    /// `None` means the source did not record one; the event is then treated
    /// as in force for every year.
    pub effective_year: Option<i32>,
    pub law_class_num: Option<i64>,
    pub law_class: String,
    pub law_class_subtype: String,
    pub effect: Option<Effect>,
    pub type_of_change: Option<ChangeType>,
}

/// A law event with a non-zero score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLawEvent {
    pub event: LawEvent,
    /// Either `1` or `-1`.
    pub score: i8,
}

/// Distinct (state name, year) cells observed in the mortality data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateYearGrid {
    cells: BTreeMap<String, BTreeSet<i32>>,
}

impl StateYearGrid {
    pub fn from_records(records: &[MortalityRecord]) -> Self {
        let mut grid = Self::default();
        for r in records {
            grid.insert(&r.state_name, r.year);
        }
        grid
    }

    pub fn insert(&mut self, state_name: &str, year: i32) {
        self.cells
            .entry(state_name.to_string())
            .or_default()
            .insert(year);
    }

    /// States with their years in ascending order.
    pub fn states(&self) -> impl Iterator<Item = (&str, &BTreeSet<i32>)> {
        self.cells.iter().map(|(s, years)| (s.as_str(), years))
    }

    pub fn contains(&self, state_name: &str, year: i32) -> bool {
        self.cells
            .get(state_name)
            .is_some_and(|years| years.contains(&year))
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Law features for a single state-year cell with at least one law in force.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StateYearFeatures {
    pub law_strength_score: i64,
    pub restrictive_laws: u32,
    pub permissive_laws: u32,
    pub total_law_changes: u32,
    pub unique_law_classes: u32,
    /// Net score per `strength_<class>` column. Classes absent here are zero.
    pub class_strength: BTreeMap<String, i64>,
}

impl StateYearFeatures {
    /// Net score for one per-class column, zero when the class has no law in
    /// force for this cell.
    pub fn strength(&self, column: &str) -> i64 {
        self.class_strength.get(column).copied().unwrap_or(0)
    }

    /// Share of in-force changes that scored +1.
    pub fn restrictive_ratio(&self) -> Option<f64> {
        self.share(self.restrictive_laws)
    }

    /// Share of in-force changes that scored -1.
    pub fn permissive_ratio(&self) -> Option<f64> {
        self.share(self.permissive_laws)
    }

    fn share(&self, count: u32) -> Option<f64> {
        (self.total_law_changes > 0)
            .then(|| f64::from(count) / f64::from(self.total_law_changes))
    }
}

/// Aggregated features for every grid cell that has at least one law in force.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureTable {
    /// Every `strength_<class>` column seen in any cell, sorted.
    pub class_columns: BTreeSet<String>,
    pub cells: BTreeMap<(String, i32), StateYearFeatures>,
}

impl FeatureTable {
    pub fn get(&self, state_name: &str, year: i32) -> Option<&StateYearFeatures> {
        self.cells.get(&(state_name.to_string(), year))
    }
}

/// One row of the final analytic table.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub record: MortalityRecord,
    /// `None` when no law is in force for the cell; written as empty fields,
    /// never as zeros.
    pub features: Option<StateYearFeatures>,
    pub rate_change: Option<f64>,
    pub law_strength_change: Option<i64>,
}

/// The final state-year table, sorted by state then year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelTable {
    pub class_columns: Vec<String>,
    pub rows: Vec<OutputRow>,
}

/// Leading fixed columns of the output table.
pub const LEADING_COLUMNS: [&str; 10] = [
    "state",
    "state_name",
    "year",
    "deaths",
    "rate",
    "law_strength_score",
    "restrictive_laws",
    "permissive_laws",
    "total_law_changes",
    "unique_law_classes",
];

/// Trailing fixed columns of the output table.
pub const TRAILING_COLUMNS: [&str; 4] = [
    "rate_change",
    "law_strength_change",
    "restrictive_ratio",
    "permissive_ratio",
];

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl PanelTable {
    /// Column names in output order.
    pub fn headers(&self) -> Vec<String> {
        LEADING_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.class_columns.iter().cloned())
            .chain(TRAILING_COLUMNS.iter().map(|c| c.to_string()))
            .collect()
    }

    /// Renders each row as CSV fields, with `None` as an empty field.
    pub fn records(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().map(|row| {
            let r = &row.record;
            let f = row.features.as_ref();

            let mut fields = vec![
                r.state_abbrev.clone(),
                r.state_name.clone(),
                r.year.to_string(),
                opt(r.deaths),
                opt(r.rate),
                opt(f.map(|f| f.law_strength_score)),
                opt(f.map(|f| f.restrictive_laws)),
                opt(f.map(|f| f.permissive_laws)),
                opt(f.map(|f| f.total_law_changes)),
                opt(f.map(|f| f.unique_law_classes)),
            ];
            fields.extend(
                self.class_columns
                    .iter()
                    .map(|column| opt(f.map(|f| f.strength(column)))),
            );
            fields.push(opt(row.rate_change));
            fields.push(opt(row.law_strength_change));
            fields.push(opt(f.and_then(StateYearFeatures::restrictive_ratio)));
            fields.push(opt(f.and_then(StateYearFeatures::permissive_ratio)));
            fields
        })
    }

    pub fn row(&self, state_abbrev: &str, year: i32) -> Option<&OutputRow> {
        self.rows
            .iter()
            .find(|r| r.record.state_abbrev == state_abbrev && r.record.year == year)
    }
}
