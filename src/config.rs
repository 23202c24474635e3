//! Data-tree layout and environment-driven settings.
//!
//! Every subcommand works against a single data directory with the layout
//! `raw/`, `interim/` and `processed/`. The directory and the workbook sheet
//! name can be overridden through the environment (or a `.env` file, loaded by
//! the binary before this is read).

use std::path::{Path, PathBuf};

/// Conventional filename of the CDC mortality export.
pub const MORTALITY_FILE: &str = "data-table.csv";
/// Conventional filename of the state firearm law database workbook.
pub const LAWS_FILE: &str = "TL-A243-2-v3 State Firearm Law Database 5.0.xlsx";
/// Final analytic table written by the merge step.
pub const OUTPUT_FILE: &str = "firearm_data_cleaned.csv";
pub const QUALITY_REPORT_FILE: &str = "data_quality.json";
pub const PROFILE_FILE: &str = "firearm_data_profile.json";

pub const DATA_DIR_VAR: &str = "GUN_LAW_DATA_DIR";
pub const SHEET_VAR: &str = "GUN_LAW_SHEET";

const DEFAULT_DATA_DIR: &str = "Data";
const DEFAULT_SHEET: &str = "Database";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub laws_sheet: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            laws_sheet: DEFAULT_SHEET.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Uses `data_dir` as the root of the data tree, keeping the default sheet.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Reads `GUN_LAW_DATA_DIR` and `GUN_LAW_SHEET`, falling back to defaults
    /// when a variable is unset or blank.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            data_dir: non_blank(DATA_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            laws_sheet: non_blank(SHEET_VAR).unwrap_or(defaults.laws_sheet),
        }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn interim_dir(&self) -> PathBuf {
        self.data_dir.join("interim")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join("processed")
    }

    /// Standardized location of the mortality CSV.
    pub fn raw_mortality(&self) -> PathBuf {
        self.raw_dir().join(MORTALITY_FILE)
    }

    /// Standardized location of the law database workbook.
    pub fn raw_laws(&self) -> PathBuf {
        self.raw_dir().join(LAWS_FILE)
    }

    pub fn output_table(&self) -> PathBuf {
        self.processed_dir().join(OUTPUT_FILE)
    }

    pub fn quality_report(&self) -> PathBuf {
        self.interim_dir().join(QUALITY_REPORT_FILE)
    }

    pub fn profile_report(&self) -> PathBuf {
        self.processed_dir().join(PROFILE_FILE)
    }

    /// All three data subdirectories, in creation order.
    pub fn layout(&self) -> [PathBuf; 3] {
        [self.raw_dir(), self.interim_dir(), self.processed_dir()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_paths() {
        let config = PipelineConfig::default();

        assert_eq!(config.raw_mortality(), Path::new("Data/raw/data-table.csv"));
        assert_eq!(
            config.raw_laws(),
            Path::new("Data/raw/TL-A243-2-v3 State Firearm Law Database 5.0.xlsx")
        );
        assert_eq!(
            config.output_table(),
            Path::new("Data/processed/firearm_data_cleaned.csv")
        );
        assert_eq!(
            config.quality_report(),
            Path::new("Data/interim/data_quality.json")
        );
        assert_eq!(config.laws_sheet, "Database");
    }

    #[test]
    fn test_lookup_overrides_defaults() {
        let lookup = lookup_from(&[(DATA_DIR_VAR, "/srv/panel"), (SHEET_VAR, "Laws")]);
        let config = PipelineConfig::from_lookup(lookup);

        assert_eq!(config.data_dir, PathBuf::from("/srv/panel"));
        assert_eq!(config.laws_sheet, "Laws");
        assert_eq!(
            config.profile_report(),
            Path::new("/srv/panel/processed/firearm_data_profile.json")
        );
    }

    #[test]
    fn test_blank_values_fall_back() {
        let lookup = lookup_from(&[(DATA_DIR_VAR, "  "), (SHEET_VAR, "")]);
        assert_eq!(PipelineConfig::from_lookup(lookup), PipelineConfig::default());
    }

    #[test]
    fn test_layout_order() {
        let config = PipelineConfig::new("d");
        let layout = config.layout();
        assert_eq!(layout[0], Path::new("d/raw"));
        assert_eq!(layout[1], Path::new("d/interim"));
        assert_eq!(layout[2], Path::new("d/processed"));
    }
}
