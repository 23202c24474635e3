use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::merge::aggregate::aggregate_features;
use crate::merge::join::join_features;
use crate::merge::laws::load_laws;
use crate::merge::mortality::load_mortality;
use crate::merge::quality::DataQualityReport;
use crate::merge::score::score_events;
use crate::merge::types::{LawEvent, MortalityRecord, PanelTable, StateYearGrid};
use crate::output::{write_json, write_table};

/// Counts describing one merge run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub rows: usize,
    pub grid_cells: usize,
    pub law_events: usize,
    pub scored_events: usize,
    pub cells_with_laws: usize,
    pub class_columns: usize,
    pub parse_errors: usize,
    pub unmapped_categories: usize,
}

/// Pure transform from loaded sources to the final table.
pub fn build_panel(mortality: Vec<MortalityRecord>, laws: Vec<LawEvent>) -> PanelTable {
    build(mortality, laws).table
}

struct Built {
    table: PanelTable,
    grid_cells: usize,
    scored_events: usize,
    cells_with_laws: usize,
}

fn build(mortality: Vec<MortalityRecord>, laws: Vec<LawEvent>) -> Built {
    let grid = StateYearGrid::from_records(&mortality);
    let scored = score_events(laws);
    let features = aggregate_features(&grid, &scored);
    let cells_with_laws = features.cells.len();

    info!(
        grid_cells = grid.len(),
        scored_events = scored.len(),
        cells_with_laws,
        "Expanded law events over state-year grid"
    );

    Built {
        table: join_features(mortality, features),
        grid_cells: grid.len(),
        scored_events: scored.len(),
        cells_with_laws,
    }
}

fn require(what: &'static str, path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::MissingInput {
            what,
            path: path.to_path_buf(),
        })
    }
}

/// Runs the merge step against the standardized raw files and writes the
/// analytic table plus the data-quality report.
///
/// Both inputs are checked before either is read.
#[tracing::instrument(skip(config), fields(data_dir = %config.data_dir.display()))]
pub fn run_merge(config: &PipelineConfig) -> Result<MergeSummary> {
    let mortality_path = config.raw_mortality();
    let laws_path = config.raw_laws();
    require("mortality CSV", &mortality_path)?;
    require("law database", &laws_path)?;

    let mut report = DataQualityReport::default();
    let mortality = load_mortality(&mortality_path, &mut report)?;
    let laws = load_laws(&laws_path, &config.laws_sheet, &mut report)?;
    let law_events = laws.len();

    let Built {
        table,
        grid_cells,
        scored_events,
        cells_with_laws,
    } = build(mortality, laws);

    write_table(&config.output_table(), &table)?;
    write_json(&config.quality_report(), &report)?;

    let summary = MergeSummary {
        rows: table.rows.len(),
        grid_cells,
        law_events,
        scored_events,
        cells_with_laws,
        class_columns: table.class_columns.len(),
        parse_errors: report.parse_errors,
        unmapped_categories: report.unmapped_categories,
    };

    info!(output = %config.output_table().display(), rows = summary.rows, "Wrote analytic table");
    Ok(summary)
}
