use tracing::debug;

use crate::merge::types::{FeatureTable, MortalityRecord, OutputRow, PanelTable};

/// Left-joins mortality rows with the law features and adds year-over-year
/// changes.
///
/// Rows are ordered by state code then year. `rate_change` and
/// `law_strength_change` are the difference from the previous row of the
/// same state and are `None` on each state's first row or when either side
/// is missing.
pub fn join_features(mut records: Vec<MortalityRecord>, features: FeatureTable) -> PanelTable {
    records.sort_by(|a, b| {
        a.state_abbrev
            .cmp(&b.state_abbrev)
            .then(a.year.cmp(&b.year))
    });

    let mut rows: Vec<OutputRow> = Vec::with_capacity(records.len());
    let mut matched = 0usize;

    for record in records {
        let cell = features.get(&record.state_name, record.year).cloned();
        if cell.is_some() {
            matched += 1;
        }

        let previous = rows
            .last()
            .filter(|prev| prev.record.state_abbrev == record.state_abbrev);

        let law_strength = cell.as_ref().map(|f| f.law_strength_score);
        let rate_change = previous.and_then(|prev| Some(record.rate? - prev.record.rate?));
        let law_strength_change = previous.and_then(|prev| {
            let prev_strength = prev.features.as_ref()?.law_strength_score;
            Some(law_strength? - prev_strength)
        });

        rows.push(OutputRow {
            record,
            features: cell,
            rate_change,
            law_strength_change,
        });
    }

    debug!(rows = rows.len(), matched, "Joined mortality with law features");

    PanelTable {
        class_columns: features.class_columns.into_iter().collect(),
        rows,
    }
}
